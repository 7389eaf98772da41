use crate::domain::model::{ExportKind, Period};
use std::path::{Path, PathBuf};

/// `output/membros-ativos-{prefix}-{MM}-{YYYY}.xls`
///
/// The prefix must match what the spreadsheet parser expects.
pub fn download_file_path(output: &Path, prefix: &str, period: &Period) -> PathBuf {
    output.join(format!(
        "membros-ativos-{}-{}-{}.xls",
        prefix, period.month, period.year
    ))
}

pub fn export_file_path(output: &Path, kind: ExportKind, period: &Period) -> PathBuf {
    download_file_path(output, kind.prefix(), period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_file_path() {
        let period = Period::new("2021", "05");
        let path = download_file_path(Path::new("/output"), "contracheques", &period);
        assert_eq!(
            path,
            PathBuf::from("/output/membros-ativos-contracheques-05-2021.xls")
        );
        // Same inputs, same path.
        assert_eq!(
            path,
            download_file_path(Path::new("/output"), "contracheques", &period)
        );
    }

    #[test]
    fn test_export_file_path_uses_kind_prefix() {
        let period = Period::new("2020", "12");
        assert_eq!(
            export_file_path(Path::new("out"), ExportKind::Indenizacoes, &period),
            PathBuf::from("out/membros-ativos-indenizacoes-12-2020.xls")
        );
    }
}
