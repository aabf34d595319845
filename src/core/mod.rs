pub mod cache;
pub mod coalesce;
pub mod relay;

pub use crate::domain::model::{CacheKey, GistPayload, GistQuery};
pub use crate::domain::ports::{ConfigProvider, GistSource};
pub use crate::utils::error::Result;
