use crate::domain::model::{ExportKind, Period, SelectedPeriod};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory the browser downloads into.
pub trait Storage: Send + Sync {
    fn root(&self) -> &Path;

    /// Entries currently in the directory, by name, with their size in bytes.
    fn entry_sizes(
        &self,
    ) -> impl std::future::Future<Output = Result<HashMap<String, u64>>> + Send;

    /// Renames the most recently modified entry to `target`.
    fn rename_newest(
        &self,
        target: &Path,
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;

    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn period(&self) -> Period;
    fn output_path(&self) -> &Path;
    fn general_timeout(&self) -> Duration;
    fn time_between_steps(&self) -> Duration;
    fn download_timeout(&self) -> Duration;
    fn screenshot_dir(&self) -> Option<&Path>;
}

/// One browser tab driven over the remote-debugging protocol.
///
/// Locators are XPath expressions.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;
    async fn click(&self, locator: &str) -> Result<()>;
    async fn set_value(&self, locator: &str, value: &str) -> Result<()>;
    /// Polls until the element is visible or `timeout` elapses.
    async fn wait_visible(&self, locator: &str, timeout: Duration) -> Result<()>;
    /// `Ok(None)` when the element exists but lacks the attribute.
    async fn attribute(&self, locator: &str, name: &str) -> Result<Option<String>>;
    /// Full-page JPEG.
    async fn screenshot(&self) -> Result<Vec<u8>>;
    async fn set_download_dir(&self, dir: &Path) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn select_contracheques(&self, period: &Period) -> Result<SelectedPeriod>;
    async fn select_indenizacoes(&self, period: &Period, selected: &SelectedPeriod) -> Result<()>;
    async fn export(&self, kind: ExportKind, target: &Path) -> Result<PathBuf>;
    /// Tears down the browser; called on every exit path.
    async fn shutdown(&mut self) -> Result<()>;
}
