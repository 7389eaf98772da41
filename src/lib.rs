pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::chromium::{ChromiumOptions, ChromiumSession};
pub use crate::config::cli::LocalStorage;
pub use crate::config::toml_config::PortalConfig;
pub use crate::core::{engine::CrawlEngine, pipeline::PortalPipeline};
pub use crate::utils::error::{CrawlerError, Result};
