//! Atomic write primitives
//!
//! Uses temp→rename so readers never observe a partial file

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{io_error, Result};

/// Atomically replace `target_path` with `content`, creating parent
/// directories as needed
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_dir", parent, e))?;
        }
    }

    let temp_path = temp_path_for(target_path);
    fs::write(&temp_path, content).map_err(|e| io_error("write_temp", &temp_path, e))?;
    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_temp", target_path, e))?;

    Ok(())
}

/// `<name>.tmp` next to the target, keeping the original extension
fn temp_path_for(target_path: &Path) -> PathBuf {
    let mut name = target_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("workspace.json");

        atomic_write(&target, b"hello").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"hello");
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("subdir").join("layout.json");

        atomic_write(&target, b"nested").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"nested");
    }

    #[test]
    fn test_no_tmp_files_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("workspace.json");

        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();

        let tmp_count = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|s| s.ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();

        assert_eq!(tmp_count, 0);
        assert_eq!(fs::read(&target).unwrap(), b"second");
    }
}
