use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::adapters::github::GithubGistSource;
use crate::core::relay::GistRelay;
use crate::domain::ports::ConfigProvider;
use crate::inbound::http::{router, AppState};
use crate::utils::error::{RelayError, Result};

/// 依設定組出完整的 router：GitHub 來源、relay、分頁預設值
pub fn build_app<C: ConfigProvider + ?Sized>(config: &C) -> Result<Router> {
    let source = GithubGistSource::from_config(config)?;
    let relay = GistRelay::from_config(source, config);
    let state = AppState::new(relay)
        .with_defaults(config.default_page(), config.default_per_page());

    tracing::debug!(
        "relay built: upstream={} cache_ttl={:?} max_concurrent={} retries={}",
        config.upstream_base_url(),
        config.cache_ttl(),
        config.max_concurrent_upstream(),
        config.retry_attempts()
    );
    Ok(router(Arc::new(state)))
}

pub struct RelayServer {
    listener: TcpListener,
    app: Router,
}

impl RelayServer {
    pub async fn bind<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let app = build_app(config)?;
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self { listener, app })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(RelayError::IoError)
    }

    /// 服務請求直到 shutdown 完成，進行中的請求會先處理完
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!("🚀 gist-relay listening on http://{}", addr);

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("gist-relay stopped");
        Ok(())
    }
}

/// Ctrl-C 或 SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
