use crate::utils::error::{CrawlerError, Result};
use chrono::Datelike;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CrawlerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let display = path.to_string_lossy();
    if display.is_empty() {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.into_owned(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if display.contains('\0') {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.into_owned(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// The download directory must already exist; the browser will not create it.
pub fn validate_existing_dir(field_name: &str, path: &Path) -> Result<()> {
    validate_path(field_name, path)?;
    if !path.is_dir() {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: "Directory does not exist".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_duration(field_name: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("{:?}", value),
            reason: "Duration must be greater than zero".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Two-digit month, "01" to "12".
pub fn validate_month(field_name: &str, month: &str) -> Result<()> {
    if month.len() != 2 || !month.chars().all(|c| c.is_ascii_digit()) {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: month.to_string(),
            reason: "Month must be a number between 1 and 12".to_string(),
        });
    }
    let value: u32 = month.parse().unwrap_or(0);
    validate_range(field_name, value, 1, 12)
}

/// Four-digit year that is not in the future.
pub fn validate_year(field_name: &str, year: &str) -> Result<()> {
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(CrawlerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: year.to_string(),
            reason: "Year must have four digits".to_string(),
        });
    }
    let value: i32 = year.parse().unwrap_or(0);
    let current = chrono::Local::now().year();
    validate_range(field_name, value, 1, current)
}

/// Rejects a month/year pair that has not started yet.
pub fn validate_period_not_future(month: &str, year: &str) -> Result<()> {
    let (Ok(month_num), Ok(year_num)) = (month.parse::<u32>(), year.parse::<i32>()) else {
        return Ok(());
    };
    let today = chrono::Local::now().date_naive();
    if (year_num, month_num) > (today.year(), today.month()) {
        return Err(CrawlerError::InvalidConfigValueError {
            field: "period".to_string(),
            value: format!("{}/{}", month, year),
            reason: "Period is in the future".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("portal.url", "https://example.com").is_ok());
        assert!(validate_url("portal.url", "http://transparencia.mppa.mp.br/index.htm").is_ok());
        assert!(validate_url("portal.url", "").is_err());
        assert!(validate_url("portal.url", "invalid-url").is_err());
        assert!(validate_url("portal.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month("month", "01").is_ok());
        assert!(validate_month("month", "12").is_ok());
        assert!(validate_month("month", "00").is_err());
        assert!(validate_month("month", "13").is_err());
        assert!(validate_month("month", "5").is_err());
        assert!(validate_month("month", "ab").is_err());
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year("year", "2021").is_ok());
        assert!(validate_year("year", "1999").is_ok());
        assert!(validate_year("year", "0000").is_err());
        assert!(validate_year("year", "21").is_err());
        assert!(validate_year("year", "9999").is_err());
    }

    #[test]
    fn test_validate_period_not_future() {
        assert!(validate_period_not_future("05", "2021").is_ok());
        let next_year = (chrono::Local::now().year() + 1).to_string();
        assert!(validate_period_not_future("01", &next_year).is_err());
    }

    #[test]
    fn test_validate_positive_duration() {
        assert!(validate_positive_duration("download_timeout", Duration::from_secs(1)).is_ok());
        assert!(validate_positive_duration("download_timeout", Duration::ZERO).is_err());
    }
}
