use crate::domain::model::ExportKind;
use crate::utils::error::{CrawlerError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PORTAL_URL: &str = "http://transparencia.mppa.mp.br/index.htm";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/77.0.3830.0 Safari/537.36";

/// Portal settings and element locators, loadable from a TOML file.
///
/// Every field has a default matching the portal's current markup, so a file
/// only needs the entries that changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub portal: PortalSettings,
    pub locators: Locators,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub url: String,
    pub user_agent: String,
    /// Polling interval for visibility and download waits, in milliseconds.
    pub poll_interval_ms: u64,
    /// How long a new download must keep the same size before it counts as finished.
    pub download_settle_ms: u64,
    /// JPEG quality of step screenshots.
    pub screenshot_quality: i64,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_PORTAL_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            poll_interval_ms: 250,
            download_settle_ms: 1000,
            screenshot_quality: 90,
        }
    }
}

/// XPath of every element the crawl touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locators {
    pub contracheques_menu: String,
    pub contracheques_month_input: String,
    pub contracheques_year_input: String,
    pub contracheques_export: String,
    pub indenizacoes_menu: String,
    pub indenizacoes_table: String,
    pub indenizacoes_month_input: String,
    pub indenizacoes_year_input: String,
    pub indenizacoes_export: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            contracheques_menu: r#"//*[@id="16"]/div[2]/button"#.to_string(),
            contracheques_month_input: r#"//*[@id="49"]/div[2]/input"#.to_string(),
            contracheques_year_input: r#"//*[@id="50"]/div[2]/input"#.to_string(),
            contracheques_export: r#"//*[@id="34"]/div[1]/div[1]/div"#.to_string(),
            indenizacoes_menu: r#"//*[@id="38"]/div[2]/button"#.to_string(),
            indenizacoes_table: r#"//*[@id="111"]/div[1]/div[2]/div"#.to_string(),
            indenizacoes_month_input: r#"//*[@id="106"]/div[2]/input"#.to_string(),
            indenizacoes_year_input: r#"//*[@id="105"]/div[2]/input"#.to_string(),
            indenizacoes_export: r#"//*[@id="111"]/div[1]/div[1]"#.to_string(),
        }
    }
}

/// Locators used for one export.
#[derive(Debug, Clone, Copy)]
pub struct ExportLocators<'a> {
    pub menu: &'a str,
    pub month_input: &'a str,
    pub year_input: &'a str,
    pub export: &'a str,
}

impl Locators {
    pub fn for_kind(&self, kind: ExportKind) -> ExportLocators<'_> {
        match kind {
            ExportKind::Contracheques => ExportLocators {
                menu: &self.contracheques_menu,
                month_input: &self.contracheques_month_input,
                year_input: &self.contracheques_year_input,
                export: &self.contracheques_export,
            },
            ExportKind::Indenizacoes => ExportLocators {
                menu: &self.indenizacoes_menu,
                month_input: &self.indenizacoes_month_input,
                year_input: &self.indenizacoes_year_input,
                export: &self.indenizacoes_export,
            },
        }
    }

    fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("locators.contracheques_menu", self.contracheques_menu.as_str()),
            ("locators.contracheques_month_input", self.contracheques_month_input.as_str()),
            ("locators.contracheques_year_input", self.contracheques_year_input.as_str()),
            ("locators.contracheques_export", self.contracheques_export.as_str()),
            ("locators.indenizacoes_menu", self.indenizacoes_menu.as_str()),
            ("locators.indenizacoes_table", self.indenizacoes_table.as_str()),
            ("locators.indenizacoes_month_input", self.indenizacoes_month_input.as_str()),
            ("locators.indenizacoes_year_input", self.indenizacoes_year_input.as_str()),
            ("locators.indenizacoes_export", self.indenizacoes_export.as_str()),
        ]
    }
}

impl PortalConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CrawlerError::io(format!("reading config {}", path.as_ref().display()), e)
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CrawlerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CrawlerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for PortalConfig {
    fn validate(&self) -> Result<()> {
        validate_url("portal.url", &self.portal.url)?;
        validate_non_empty_string("portal.user_agent", &self.portal.user_agent)?;
        crate::utils::validation::validate_range(
            "portal.screenshot_quality",
            self.portal.screenshot_quality,
            1,
            100,
        )?;
        if self.portal.poll_interval_ms == 0 {
            return Err(CrawlerError::InvalidConfigValueError {
                field: "portal.poll_interval_ms".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }

        for (field, locator) in self.locators.entries() {
            validate_non_empty_string(field, locator)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_current_portal() {
        let config = PortalConfig::default();
        assert_eq!(config.portal.url, DEFAULT_PORTAL_URL);
        assert_eq!(
            config.locators.for_kind(ExportKind::Contracheques).year_input,
            r#"//*[@id="50"]/div[2]/input"#
        );
        assert_eq!(
            config.locators.for_kind(ExportKind::Indenizacoes).export,
            r#"//*[@id="111"]/div[1]/div[1]"#
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let toml_content = r#"
[portal]
url = "https://portal.example.org/app"

[locators]
contracheques_menu = "//button[@id='payroll']"
"#;

        let config = PortalConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.portal.url, "https://portal.example.org/app");
        assert_eq!(config.portal.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.locators.contracheques_menu, "//button[@id='payroll']");
        assert_eq!(
            config.locators.indenizacoes_menu,
            Locators::default().indenizacoes_menu
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PAYROLL_CRAWLER_TEST_URL", "https://mirror.example.org/index.htm");

        let toml_content = r#"
[portal]
url = "${PAYROLL_CRAWLER_TEST_URL}"
"#;

        let config = PortalConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.portal.url, "https://mirror.example.org/index.htm");

        std::env::remove_var("PAYROLL_CRAWLER_TEST_URL");
    }

    #[test]
    fn test_config_validation() {
        let config = PortalConfig::from_toml_str(
            r#"
[portal]
url = "not a url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = PortalConfig::from_toml_str(
            r#"
[locators]
indenizacoes_table = "  "
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = PortalConfig::from_toml_str("[portal\nurl = 1").unwrap_err();
        assert!(matches!(err, CrawlerError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[portal]\npoll_interval_ms = 50\n")
            .unwrap();

        let config = PortalConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.portal.poll_interval_ms, 50);
        assert_eq!(config.portal.download_settle_ms, 1000);
    }
}
