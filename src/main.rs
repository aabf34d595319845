use clap::Parser;
use gist_relay::domain::ports::ConfigProvider;
use gist_relay::inbound::server::shutdown_signal;
use gist_relay::utils::error::ErrorSeverity;
use gist_relay::utils::logger;
use gist_relay::utils::validation::validate_relay_config;
use gist_relay::{CliConfig, RelayServer, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 有指定設定檔時以檔案為準
    let file_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 建議: {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        },
        None => None,
    };

    let verbose = cli.verbose || file_config.as_ref().is_some_and(|c| c.verbose());
    let log_json = cli.log_json || file_config.as_ref().is_some_and(|c| c.log_json());
    if log_json {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting gist-relay");
    let config: &dyn ConfigProvider = match &file_config {
        Some(config) => {
            tracing::info!("📄 Using configuration file {:?}", cli.config);
            config
        }
        None => &cli,
    };
    if verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = validate_relay_config(config) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let server = match RelayServer::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(
                "❌ Failed to start: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    };

    server.run(shutdown_signal()).await?;
    Ok(())
}
