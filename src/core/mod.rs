pub mod engine;
pub mod naming;
pub mod pipeline;

pub use crate::domain::model::{CrawlReport, ExportKind, Period, SelectedPeriod};
pub use crate::domain::ports::{BrowserSession, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
