use crate::core::Storage;
use crate::utils::error::{CrawlerError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Local download directory shared by the browser and the renamer.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    fn root(&self) -> &Path {
        &self.base_path
    }

    async fn entry_sizes(&self) -> Result<HashMap<String, u64>> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            CrawlerError::io(format!("reading directory {}", self.base_path.display()), e)
        })?;

        let mut sizes = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                CrawlerError::io(format!("reading directory {}", self.base_path.display()), e)
            })?;
            // Chrome may drop a temp file between listing and stat.
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            sizes.insert(entry.file_name().to_string_lossy().into_owned(), metadata.len());
        }
        Ok(sizes)
    }

    async fn rename_newest(&self, target: &Path) -> Result<PathBuf> {
        rename_newest(&self.base_path, target)
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, data)
            .map_err(|e| CrawlerError::io(format!("writing {}", path.display()), e))?;
        Ok(())
    }
}

/// Most recently modified entry of `dir`. Ties keep the first one listed.
pub fn newest_entry(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir)
        .map_err(|e| CrawlerError::io(format!("reading directory {}", dir.display()), e))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry =
            entry.map_err(|e| CrawlerError::io(format!("reading directory {}", dir.display()), e))?;
        let path = entry.path();
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| CrawlerError::io(format!("reading metadata of {}", path.display()), e))?;

        match &newest {
            Some((time, _)) if modified <= *time => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| CrawlerError::EmptyDownloadDir {
            dir: dir.to_path_buf(),
        })
}

/// Renames the newest entry of `dir` to `target` and returns the old path.
pub fn rename_newest(dir: &Path, target: &Path) -> Result<PathBuf> {
    let newest = newest_entry(dir)?;

    if target.exists() && !same_file(&newest, target) {
        return Err(CrawlerError::TargetExists {
            path: target.to_path_buf(),
        });
    }

    fs::rename(&newest, target).map_err(|e| {
        CrawlerError::io(
            format!(
                "renaming newest file ({}) -> ({})",
                newest.display(),
                target.display()
            ),
            e,
        )
    })?;

    tracing::debug!("Renamed {} -> {}", newest.display(), target.display());
    Ok(newest)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn test_newest_entry_picks_max_mtime() {
        for n in 1..=6u64 {
            let dir = TempDir::new().unwrap();
            // The newest file sits in the middle of the name order.
            let newest_index = n / 2;
            for i in 0..n {
                let age = if i == newest_index { 1 } else { 100 + i * 10 };
                touch(dir.path(), &format!("file-{}", i), age);
            }

            let newest = newest_entry(dir.path()).unwrap();
            assert_eq!(
                newest.file_name().unwrap().to_str().unwrap(),
                format!("file-{}", newest_index)
            );
        }
    }

    #[test]
    fn test_rename_newest_moves_only_newest() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "old.xls", 300);
        touch(dir.path(), "3f2a-guid", 5);
        touch(dir.path(), "older.xls", 600);

        let target = dir.path().join("membros-ativos-contracheques-05-2021.xls");
        let moved = rename_newest(dir.path(), &target).unwrap();

        assert_eq!(moved, dir.path().join("3f2a-guid"));
        assert!(target.exists());
        assert!(dir.path().join("old.xls").exists());
        assert!(dir.path().join("older.xls").exists());
        assert!(!dir.path().join("3f2a-guid").exists());
    }

    #[test]
    fn test_rename_newest_fails_on_empty_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.xls");

        let err = rename_newest(dir.path(), &target).unwrap_err();
        assert!(matches!(err, CrawlerError::EmptyDownloadDir { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_rename_newest_fails_on_unwritable_target() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "download", 1);
        let target = dir.path().join("missing-subdir").join("out.xls");

        let err = rename_newest(dir.path(), &target).unwrap_err();
        assert!(matches!(err, CrawlerError::Io { .. }));
        assert!(dir.path().join("download").exists());
    }

    #[test]
    fn test_rename_newest_refuses_to_clobber() {
        let dir = TempDir::new().unwrap();
        let existing = touch(dir.path(), "out.xls", 500);
        touch(dir.path(), "download", 1);

        let err = rename_newest(dir.path(), &existing).unwrap_err();
        assert!(matches!(err, CrawlerError::TargetExists { .. }));
        assert!(dir.path().join("download").exists());
    }

    #[test]
    fn test_rename_newest_fails_on_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = rename_newest(&missing, &dir.path().join("out.xls")).unwrap_err();
        assert!(matches!(err, CrawlerError::Io { .. }));
    }

    #[tokio::test]
    async fn test_entry_sizes_lists_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a", 1);
        fs::write(dir.path().join("b"), b"12345").unwrap();

        let storage = LocalStorage::new(dir.path());
        let sizes = storage.entry_sizes().await.unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes.get("a"), Some(&0));
        assert_eq!(sizes.get("b"), Some(&5));
    }
}
