use crate::utils::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Removes every regular file directly inside `dir`. Subdirectories are left
/// alone; a missing directory counts as already empty.
pub fn delete_all_files(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("The folder '{}' does not exist.", dir.display());
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let mut deleted = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted: {}", path.display());
            deleted += 1;
        }
    }

    tracing::info!("Deleted {} file(s) from {}", deleted, dir.display());
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_all_files_keeps_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tmp"), b"a").unwrap();
        fs::write(dir.path().join("b.tmp"), b"b").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(delete_all_files(dir.path()).unwrap(), 2);
        assert!(dir.path().join("nested").is_dir());
        assert!(!dir.path().join("a.tmp").exists());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(delete_all_files(&dir.path().join("interim")).unwrap(), 0);
    }
}
