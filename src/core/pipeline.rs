use crate::config::toml_config::PortalConfig;
use crate::core::{BrowserSession, ConfigProvider, ExportKind, Period, Pipeline, SelectedPeriod, Storage};
use crate::utils::error::{CrawlerError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Chrome marks in-flight downloads with these suffixes.
const PARTIAL_SUFFIXES: [&str; 2] = [".crdownload", ".tmp"];

fn is_partial(name: &str) -> bool {
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Drives the transparency portal through the selection and export steps.
pub struct PortalPipeline<B: BrowserSession, S: Storage, C: ConfigProvider> {
    browser: B,
    storage: S,
    config: C,
    portal: PortalConfig,
}

impl<B: BrowserSession, S: Storage, C: ConfigProvider> PortalPipeline<B, S, C> {
    pub fn new(browser: B, storage: S, config: C, portal: PortalConfig) -> Self {
        Self {
            browser,
            storage,
            config,
            portal,
        }
    }

    async fn pause(&self) {
        tokio::time::sleep(self.config.time_between_steps()).await;
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.portal.portal.poll_interval_ms)
    }

    fn download_settle(&self) -> Duration {
        Duration::from_millis(self.portal.portal.download_settle_ms)
    }

    /// Waits for the element to become visible, then clicks it.
    async fn click_visible(&self, locator: &str) -> Result<()> {
        self.browser
            .wait_visible(locator, self.config.general_timeout())
            .await?;
        self.browser.click(locator).await
    }

    async fn read_placeholder(&self, locator: &str) -> Result<String> {
        self.browser
            .attribute(locator, "placeholder")
            .await?
            .ok_or_else(|| CrawlerError::MissingAttribute {
                locator: locator.to_string(),
                attribute: "placeholder".to_string(),
            })
    }

    /// Sets year and month inputs that differ from what the page had selected.
    async fn apply_period(
        &self,
        kind: ExportKind,
        period: &Period,
        selected: &SelectedPeriod,
    ) -> Result<()> {
        let locators = self.portal.locators.for_kind(kind);
        let label = period
            .month_label()
            .ok_or_else(|| CrawlerError::InvalidConfigValueError {
                field: "month".to_string(),
                value: period.month.clone(),
                reason: "Month must be between 01 and 12".to_string(),
            })?;

        if !selected.year_matches(period) {
            tracing::info!("📅 Selecting year {}...", period.year);
            self.browser
                .set_value(locators.year_input, &period.year)
                .await?;
            self.pause().await;
        }

        if !selected.month_matches(period) {
            tracing::info!("📅 Selecting month {}...", label);
            self.browser
                .wait_visible(locators.month_input, self.config.general_timeout())
                .await?;
            self.browser.set_value(locators.month_input, label).await?;
            self.pause().await;
        }

        Ok(())
    }

    /// Optional screenshot, then points browser downloads at the output directory.
    async fn prepare_download(&self, kind: ExportKind) -> Result<()> {
        if let Some(dir) = self.config.screenshot_dir() {
            let image = self.browser.screenshot().await?;
            let path = dir.join(format!("fullScreenshot-{}.jpeg", kind));
            self.storage.write_file(&path, &image).await?;
            tracing::debug!("Screenshot saved to {}", path.display());
        }

        self.browser.set_download_dir(self.storage.root()).await
    }

    /// Polls the download directory until a finished file shows up.
    ///
    /// With `AllowAndName` Chrome writes straight into the final name, so a new
    /// entry only counts once it is non-empty and its size has held for the
    /// settle period across consecutive polls.
    async fn wait_for_download(&self, before: &HashMap<String, u64>, target: &Path) -> Result<()> {
        let timeout = self.config.download_timeout();
        let deadline = Instant::now() + timeout;
        let mut stable: Option<(BTreeMap<String, u64>, Instant)> = None;

        loop {
            let new: BTreeMap<String, u64> = self
                .storage
                .entry_sizes()
                .await?
                .into_iter()
                .filter(|(name, _)| !before.contains_key(name))
                .collect();
            let partial = new.keys().any(|name| is_partial(name));
            let finished = new
                .iter()
                .any(|(name, size)| !is_partial(name) && *size > 0);

            if finished && !partial {
                stable = match stable.take() {
                    Some((seen, since)) if seen == new => {
                        if since.elapsed() >= self.download_settle() {
                            return Ok(());
                        }
                        Some((seen, since))
                    }
                    _ => Some((new, Instant::now())),
                };
            } else {
                stable = None;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "No finished download after {:?} (in progress: {})",
                    timeout,
                    partial || stable.is_some()
                );
                return Err(CrawlerError::DownloadMissing {
                    path: target.to_path_buf(),
                });
            }
            tokio::time::sleep(self.poll_interval()).await;
        }
    }
}

#[async_trait::async_trait]
impl<B: BrowserSession, S: Storage, C: ConfigProvider> Pipeline for PortalPipeline<B, S, C> {
    async fn select_contracheques(&self, period: &Period) -> Result<SelectedPeriod> {
        let locators = self.portal.locators.for_kind(ExportKind::Contracheques);

        tracing::debug!("Navigating to {}", self.portal.portal.url);
        self.browser.navigate(&self.portal.portal.url).await?;
        self.pause().await;

        self.click_visible(locators.menu).await?;
        self.pause().await;

        let month_label = self.read_placeholder(locators.month_input).await?;
        self.pause().await;
        let year = self.read_placeholder(locators.year_input).await?;
        self.pause().await;
        let selected = SelectedPeriod { month_label, year };
        tracing::debug!(
            "Portal shows {}/{}",
            selected.month_label,
            selected.year
        );

        self.apply_period(ExportKind::Contracheques, period, &selected)
            .await?;
        self.prepare_download(ExportKind::Contracheques).await?;

        Ok(selected)
    }

    async fn select_indenizacoes(&self, period: &Period, selected: &SelectedPeriod) -> Result<()> {
        let locators = self.portal.locators.for_kind(ExportKind::Indenizacoes);

        self.click_visible(locators.menu).await?;
        self.pause().await;
        self.browser
            .wait_visible(
                &self.portal.locators.indenizacoes_table,
                self.config.general_timeout(),
            )
            .await?;

        self.apply_period(ExportKind::Indenizacoes, period, selected)
            .await?;
        self.prepare_download(ExportKind::Indenizacoes).await
    }

    async fn export(&self, kind: ExportKind, target: &Path) -> Result<PathBuf> {
        let locators = self.portal.locators.for_kind(kind);
        let before = self.storage.entry_sizes().await?;

        self.click_visible(locators.export).await?;
        self.wait_for_download(&before, target).await?;

        let source = self.storage.rename_newest(target).await?;
        tracing::debug!("Download {} stored as {}", source.display(), target.display());

        if !target.exists() {
            return Err(CrawlerError::DownloadMissing {
                path: target.to_path_buf(),
            });
        }
        Ok(target.to_path_buf())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.browser.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_download_names() {
        assert!(is_partial("6f1c7a.crdownload"));
        assert!(is_partial("report.xls.tmp"));
        assert!(!is_partial("6f1c7a"));
        assert!(!is_partial("membros-ativos-contracheques-05-2021.xls"));
    }
}
