use clap::Parser;
use payroll_crawler::core::ConfigProvider;
use payroll_crawler::utils::error::{CrawlerError, ErrorSeverity};
use payroll_crawler::utils::{logger, validation::Validate};
use payroll_crawler::{
    ChromiumOptions, ChromiumSession, CliConfig, CrawlEngine, LocalStorage, PortalConfig,
    PortalPipeline,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.json_logs);

    tracing::info!("Starting payroll-crawler");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let portal = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading portal configuration from: {}", path.display());
            match PortalConfig::from_file(path) {
                Ok(portal) => portal,
                Err(e) => fail(&e),
            }
        }
        None => PortalConfig::default(),
    };
    if let Err(e) = portal.validate() {
        fail(&e);
    }

    let browser = match ChromiumSession::launch(ChromiumOptions {
        chrome_path: config.chrome_path.clone(),
        headless: !config.headful,
        user_agent: portal.portal.user_agent.clone(),
        poll_interval: Duration::from_millis(portal.portal.poll_interval_ms),
        screenshot_quality: portal.portal.screenshot_quality,
    })
    .await
    {
        Ok(browser) => browser,
        Err(e) => fail(&e),
    };

    let storage = LocalStorage::new(config.output_path());
    let mut engine = CrawlEngine::new(
        PortalPipeline::new(browser, storage, config.clone(), portal),
        &config,
    );

    match engine.run().await {
        Ok(report) => {
            // stdout carries only the produced files, one per line.
            for file in &report.files {
                println!("{}", file.display());
            }
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

fn fail(e: &CrawlerError) -> ! {
    tracing::error!(
        "❌ Crawl failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
