use crate::utils::error::{CrawlerError, Result};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

fn component_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)(ms|h|m|s)").expect("valid duration regex"))
}

/// Parses durations written like `500ms`, `10s`, `4m`, `1h` or `1m30s`.
///
/// A bare number is read as seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let invalid = |reason: &str| CrawlerError::InvalidConfigValueError {
        field: "duration".to_string(),
        value: input.to_string(),
        reason: reason.to_string(),
    };

    if input.is_empty() {
        return Err(invalid("Duration cannot be empty"));
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut consumed = 0;
    for caps in component_regex().captures_iter(input) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        if whole.start != consumed {
            return Err(invalid("Unexpected characters in duration"));
        }
        consumed = whole.end;

        let value: u64 = caps[1]
            .parse()
            .map_err(|_| invalid("Duration component out of range"))?;
        let component = match &caps[2] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            _ => unreachable!("regex only matches known units"),
        };
        total = component
            .and_then(|c| total.checked_add(c))
            .ok_or_else(|| invalid("Duration component out of range"))?;
    }

    if consumed != input.len() {
        return Err(invalid("Expected a duration such as 500ms, 10s, 4m or 1h"));
    }
    Ok(total)
}
