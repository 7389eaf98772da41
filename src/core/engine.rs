use crate::core::naming::export_file_path;
use crate::core::{ConfigProvider, CrawlReport, ExportKind, Period, Pipeline};
use crate::utils::error::{CrawlerError, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Runs both exports in order under one deadline and always shuts the pipeline down.
pub struct CrawlEngine<P: Pipeline> {
    pipeline: P,
    period: Period,
    output: PathBuf,
    timeout: Duration,
}

impl<P: Pipeline> CrawlEngine<P> {
    pub fn new<C: ConfigProvider>(pipeline: P, config: &C) -> Self {
        Self {
            pipeline,
            period: config.period(),
            output: config.output_path().to_path_buf(),
            timeout: config.general_timeout(),
        }
    }

    pub async fn run(&mut self) -> Result<CrawlReport> {
        let started = Instant::now();
        tracing::info!("🚀 Starting crawl for {}", self.period);

        let result = match tokio::time::timeout(self.timeout, self.run_steps()).await {
            Ok(result) => result,
            Err(_) => Err(CrawlerError::Timeout {
                after: self.timeout,
            }),
        };

        // A failed close is logged and never replaces the crawl outcome.
        if let Err(e) = self.pipeline.shutdown().await {
            tracing::warn!("Failed to close browser: {}", e);
        }

        let report = result?;
        tracing::info!(
            "✅ Crawl finished in {:?} ({} files)",
            started.elapsed(),
            report.files.len()
        );
        Ok(report)
    }

    async fn run_steps(&self) -> Result<CrawlReport> {
        let mut report = CrawlReport::default();

        tracing::info!("🔎 Selecting contracheques ({})...", self.period);
        let selected = self
            .pipeline
            .select_contracheques(&self.period)
            .await
            .map_err(|e| e.in_export(ExportKind::Contracheques))?;
        tracing::info!("Selection done");
        report
            .files
            .push(self.download(ExportKind::Contracheques).await?);

        tracing::info!("🔎 Selecting indenizações ({})...", self.period);
        self.pipeline
            .select_indenizacoes(&self.period, &selected)
            .await
            .map_err(|e| e.in_export(ExportKind::Indenizacoes))?;
        tracing::info!("Selection done");
        report
            .files
            .push(self.download(ExportKind::Indenizacoes).await?);

        Ok(report)
    }

    async fn download(&self, kind: ExportKind) -> Result<PathBuf> {
        let target = export_file_path(&self.output, kind, &self.period);
        tracing::info!("📥 Downloading {} ({})...", kind, target.display());
        let path = self
            .pipeline
            .export(kind, &target)
            .await
            .map_err(|e| e.in_export(kind))?;
        tracing::info!("Download done");
        Ok(path)
    }
}
