use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Month names as the portal displays them in its selection inputs.
const MONTH_LABELS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Portal label for a two-digit month ("01".."12").
pub fn month_label(month: &str) -> Option<&'static str> {
    let index: usize = month.parse().ok()?;
    if month.len() != 2 || !(1..=12).contains(&index) {
        return None;
    }
    Some(MONTH_LABELS[index - 1])
}

/// The month/year a crawl was asked to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: String,
    pub month: String,
}

impl Period {
    /// Builds a period, zero-padding the month ("5" -> "05").
    pub fn new(year: impl Into<String>, month: impl AsRef<str>) -> Self {
        let month = month.as_ref().trim();
        let month = match month.parse::<u32>() {
            Ok(n) => format!("{:02}", n),
            Err(_) => month.to_string(),
        };
        Self {
            year: year.into().trim().to_string(),
            month,
        }
    }

    pub fn month_label(&self) -> Option<&'static str> {
        month_label(&self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

/// Selection the portal showed before any change, read from input placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPeriod {
    pub month_label: String,
    pub year: String,
}

impl SelectedPeriod {
    pub fn year_matches(&self, period: &Period) -> bool {
        self.year == period.year
    }

    pub fn month_matches(&self, period: &Period) -> bool {
        period.month_label() == Some(self.month_label.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Contracheques,
    Indenizacoes,
}

impl ExportKind {
    /// File name prefix expected by the downstream parser.
    pub fn prefix(&self) -> &'static str {
        match self {
            ExportKind::Contracheques => "contracheques",
            ExportKind::Indenizacoes => "indenizacoes",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Files produced by a successful crawl, contracheques first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlReport {
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_labels() {
        assert_eq!(month_label("01"), Some("Janeiro"));
        assert_eq!(month_label("03"), Some("Março"));
        assert_eq!(month_label("12"), Some("Dezembro"));
        assert_eq!(month_label("13"), None);
        assert_eq!(month_label("00"), None);
        assert_eq!(month_label("5"), None);
        assert_eq!(month_label("maio"), None);
    }

    #[test]
    fn test_period_pads_month() {
        let period = Period::new("2021", "5");
        assert_eq!(period.month, "05");
        assert_eq!(period.month_label(), Some("Maio"));
        assert_eq!(period.to_string(), "05/2021");
    }

    #[test]
    fn test_selected_period_comparison() {
        let selected = SelectedPeriod {
            month_label: "Maio".to_string(),
            year: "2020".to_string(),
        };
        let period = Period::new("2021", "05");
        assert!(selected.month_matches(&period));
        assert!(!selected.year_matches(&period));
    }
}
