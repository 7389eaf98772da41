use crate::domain::model::ExportKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch { message: String },

    #[error("Browser {action} failed on '{locator}': {message}")]
    Browser {
        action: String,
        locator: String,
        message: String,
    },

    #[error("Element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("Element '{locator}' not visible after {waited:?}")]
    ElementNotVisible { locator: String, waited: Duration },

    #[error("Element '{locator}' has no \"{attribute}\" attribute")]
    MissingAttribute { locator: String, attribute: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Download directory {} is empty", .dir.display())]
    EmptyDownloadDir { dir: PathBuf },

    #[error("Rename target {} already exists", .path.display())]
    TargetExists { path: PathBuf },

    #[error("Download of {} was not performed", .path.display())]
    DownloadMissing { path: PathBuf },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Crawl timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("{kind} export failed: {source}")]
    Export {
        kind: ExportKind,
        #[source]
        source: Box<CrawlerError>,
    },
}

pub type Result<T> = std::result::Result<T, CrawlerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Browser,
    FileSystem,
    Download,
    Configuration,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl CrawlerError {
    /// Wraps a step failure with the export it belongs to.
    pub fn in_export(self, kind: ExportKind) -> Self {
        match self {
            // Timeouts stay top-level so the caller sees the deadline.
            e @ CrawlerError::Timeout { .. } => e,
            e @ CrawlerError::Export { .. } => e,
            e => CrawlerError::Export {
                kind,
                source: Box::new(e),
            },
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CrawlerError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn browser(action: &str, locator: &str, message: impl std::fmt::Display) -> Self {
        CrawlerError::Browser {
            action: action.to_string(),
            locator: locator.to_string(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CrawlerError::BrowserLaunch { .. }
            | CrawlerError::Browser { .. }
            | CrawlerError::ElementNotFound { .. }
            | CrawlerError::ElementNotVisible { .. }
            | CrawlerError::MissingAttribute { .. }
            | CrawlerError::SerializationError(_) => ErrorCategory::Browser,
            CrawlerError::IoError(_)
            | CrawlerError::Io { .. }
            | CrawlerError::EmptyDownloadDir { .. }
            | CrawlerError::TargetExists { .. } => ErrorCategory::FileSystem,
            CrawlerError::DownloadMissing { .. } => ErrorCategory::Download,
            CrawlerError::ConfigError { .. }
            | CrawlerError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CrawlerError::Timeout { .. } => ErrorCategory::Timeout,
            CrawlerError::Export { source, .. } => source.category(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // The portal is flaky; a later run usually succeeds.
            ErrorCategory::Browser | ErrorCategory::Download | ErrorCategory::Timeout => {
                ErrorSeverity::Medium
            }
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::FileSystem => match self {
                CrawlerError::TargetExists { .. } => ErrorSeverity::High,
                CrawlerError::Export { source, .. } => source.severity(),
                _ => ErrorSeverity::Critical,
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CrawlerError::BrowserLaunch { .. } => {
                "Could not start the headless browser".to_string()
            }
            CrawlerError::Browser { .. }
            | CrawlerError::ElementNotFound { .. }
            | CrawlerError::ElementNotVisible { .. }
            | CrawlerError::MissingAttribute { .. } => {
                format!("The portal page did not behave as expected: {}", self)
            }
            CrawlerError::EmptyDownloadDir { dir } => {
                format!("Nothing was downloaded into {}", dir.display())
            }
            CrawlerError::TargetExists { path } => {
                format!("Output file {} already exists", path.display())
            }
            CrawlerError::DownloadMissing { path } => {
                format!("The spreadsheet {} was not downloaded", path.display())
            }
            CrawlerError::Timeout { after } => {
                format!("The crawl did not finish within {:?}", after)
            }
            CrawlerError::Export { kind, source } => {
                format!("{} export: {}", kind, source.user_friendly_message())
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CrawlerError::BrowserLaunch { .. } => {
                "Install Chrome/Chromium or point CHROME_PATH at the executable"
            }
            CrawlerError::Browser { .. }
            | CrawlerError::ElementNotFound { .. }
            | CrawlerError::ElementNotVisible { .. }
            | CrawlerError::MissingAttribute { .. } => {
                "Retry later; if it keeps failing the portal layout changed and the locator file needs updating"
            }
            CrawlerError::EmptyDownloadDir { .. } | CrawlerError::DownloadMissing { .. } => {
                "Increase DOWNLOAD_TIMEOUT or TIME_BETWEEN_STEPS and retry"
            }
            CrawlerError::TargetExists { .. } => {
                "Remove previous output files or use an empty OUTPUT_FOLDER"
            }
            CrawlerError::IoError(_) | CrawlerError::Io { .. } => {
                "Check that OUTPUT_FOLDER exists and is writable"
            }
            CrawlerError::ConfigError { .. } | CrawlerError::InvalidConfigValueError { .. } => {
                "Check the command line arguments, environment variables and config file"
            }
            CrawlerError::Timeout { .. } => "Increase GENERAL_TIMEOUT and retry",
            CrawlerError::SerializationError(_) => "Retry; the page returned unexpected data",
            CrawlerError::Export { source, .. } => source.recovery_suggestion(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_wrapping_keeps_inner_classification() {
        let inner = CrawlerError::DownloadMissing {
            path: PathBuf::from("/output/x.xls"),
        };
        let err = inner.in_export(ExportKind::Indenizacoes);

        assert!(matches!(err, CrawlerError::Export { kind: ExportKind::Indenizacoes, .. }));
        assert_eq!(err.category(), ErrorCategory::Download);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().starts_with("indenizacoes export failed"));
    }

    #[test]
    fn test_timeout_is_not_wrapped() {
        let err = CrawlerError::Timeout {
            after: Duration::from_secs(1),
        }
        .in_export(ExportKind::Contracheques);
        assert!(matches!(err, CrawlerError::Timeout { .. }));
    }

    #[test]
    fn test_severity_by_category() {
        let config = CrawlerError::ConfigError {
            message: "bad".to_string(),
        };
        assert_eq!(config.severity(), ErrorSeverity::High);

        let io = CrawlerError::io("listing", std::io::Error::other("boom"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);
    }
}
