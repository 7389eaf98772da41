pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::Period;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::time::Duration;

#[cfg(feature = "cli")]
fn duration_arg(value: &str) -> std::result::Result<Duration, String> {
    crate::utils::duration::parse_duration(value).map_err(|e| e.to_string())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "payroll-crawler")]
#[command(about = "Downloads the monthly payroll spreadsheets from the MPPA transparency portal")]
pub struct CliConfig {
    /// Month to download (1-12)
    #[arg(long, env = "MONTH")]
    pub month: String,

    /// Four-digit year to download
    #[arg(long, env = "YEAR")]
    pub year: String,

    /// Directory the spreadsheets are downloaded into
    #[arg(long, env = "OUTPUT_FOLDER", default_value = "/output")]
    pub output_folder: PathBuf,

    /// Deadline for the whole crawl
    #[arg(long, env = "GENERAL_TIMEOUT", default_value = "4m", value_parser = duration_arg)]
    pub general_timeout: Duration,

    /// Fixed pause after each portal interaction
    #[arg(long, env = "TIME_BETWEEN_STEPS", default_value = "10s", value_parser = duration_arg)]
    pub time_between_steps: Duration,

    /// How long to wait for each spreadsheet to land on disk
    #[arg(long, env = "DOWNLOAD_TIMEOUT", default_value = "20s", value_parser = duration_arg)]
    pub download_timeout: Duration,

    /// TOML file overriding the portal URL and element locators
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save a full-page screenshot after each selection into this directory
    #[arg(long, env = "SCREENSHOT_DIR")]
    pub screenshot_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Chrome/Chromium executable
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn period(&self) -> Period {
        Period::new(self.year.clone(), &self.month)
    }

    fn output_path(&self) -> &Path {
        &self.output_folder
    }

    fn general_timeout(&self) -> Duration {
        self.general_timeout
    }

    fn time_between_steps(&self) -> Duration {
        self.time_between_steps
    }

    fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    fn screenshot_dir(&self) -> Option<&Path> {
        self.screenshot_dir.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let period = self.period();
        validation::validate_month("month", &period.month)?;
        validation::validate_year("year", &period.year)?;
        validation::validate_period_not_future(&period.month, &period.year)?;

        validation::validate_existing_dir("output_folder", &self.output_folder)?;
        validation::validate_positive_duration("general_timeout", self.general_timeout)?;
        validation::validate_positive_duration("download_timeout", self.download_timeout)?;

        if let Some(dir) = &self.screenshot_dir {
            validation::validate_existing_dir("screenshot_dir", dir)?;
            // A screenshot in the download directory would be mistaken for the newest download.
            if same_dir(dir, &self.output_folder) {
                return Err(crate::utils::error::CrawlerError::InvalidConfigValueError {
                    field: "screenshot_dir".to_string(),
                    value: dir.display().to_string(),
                    reason: "Must differ from output_folder".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(feature = "cli")]
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["payroll-crawler"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_and_durations() {
        let out = TempDir::new().unwrap();
        let config = parse(&[
            "--month",
            "5",
            "--year",
            "2021",
            "--output-folder",
            out.path().to_str().unwrap(),
            "--time-between-steps",
            "1m30s",
        ]);

        assert_eq!(config.period(), Period::new("2021", "05"));
        assert_eq!(config.general_timeout(), Duration::from_secs(240));
        assert_eq!(config.time_between_steps(), Duration::from_secs(90));
        assert_eq!(config.download_timeout(), Duration::from_secs(20));
        assert!(config.screenshot_dir().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_duration() {
        let result = CliConfig::try_parse_from([
            "payroll-crawler",
            "--month",
            "5",
            "--year",
            "2021",
            "--download-timeout",
            "soon",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_period_and_dirs() {
        let out = TempDir::new().unwrap();
        let out_str = out.path().to_str().unwrap();

        assert!(parse(&["--month", "13", "--year", "2021", "--output-folder", out_str])
            .validate()
            .is_err());
        assert!(parse(&["--month", "1", "--year", "21", "--output-folder", out_str])
            .validate()
            .is_err());

        let missing = out.path().join("missing");
        assert!(parse(&[
            "--month",
            "1",
            "--year",
            "2021",
            "--output-folder",
            missing.to_str().unwrap()
        ])
        .validate()
        .is_err());

        assert!(parse(&[
            "--month",
            "1",
            "--year",
            "2021",
            "--output-folder",
            out_str,
            "--screenshot-dir",
            out_str
        ])
        .validate()
        .is_err());
    }
}
