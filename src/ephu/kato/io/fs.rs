use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::ephu::kato::error::Result;

/// Deletes every folder below `root` whose name starts with `prefix`,
/// ignoring case, and returns how many were removed.
///
/// A folder that cannot be deleted is logged and left in place.
#[instrument(level = "info", skip_all, fields(root = %root.display(), prefix = %prefix))]
pub fn delete_prefixed_dirs(root: &Path, prefix: &str) -> Result<usize> {
    let prefix = prefix.to_lowercase();
    let mut deleted = 0;

    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.starts_with(&prefix) {
            continue;
        }

        walker.skip_current_dir();
        match fs::remove_dir_all(entry.path()) {
            Ok(()) => {
                info!(path = %entry.path().display(), "deleted folder");
                deleted += 1;
            }
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "failed to delete folder");
            }
        }
    }

    info!(deleted, "removed stale folders");
    Ok(deleted)
}

/// Lists every file below `root` with the given extension, ignoring case.
///
/// Files are returned in a stable order, sorted by name within each folder.
#[instrument(level = "info", skip_all, fields(root = %root.display(), extension = %extension))]
pub fn find_spreadsheets(root: &Path, extension: &str) -> Vec<PathBuf> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase() == extension)
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    info!(count = files.len(), "discovered spreadsheets");
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prefixed_folders_are_deleted_case_insensitively() {
        let temp = tempdir().expect("temporary directory");
        let root = temp.path();
        fs::create_dir_all(root.join("като_файлы/inner")).expect("dir created");
        fs::create_dir_all(root.join("nested/КАТО_ФАЙЛЫ_old")).expect("dir created");
        fs::create_dir_all(root.join("keep")).expect("dir created");
        fs::write(root.join("като_файлы/inner/a.xlsx"), b"x").expect("file written");

        let deleted = delete_prefixed_dirs(root, "като_файлы").expect("cleanup ran");

        assert_eq!(deleted, 2);
        assert!(!root.join("като_файлы").exists());
        assert!(!root.join("nested/КАТО_ФАЙЛЫ_old").exists());
        assert!(root.join("nested").exists());
        assert!(root.join("keep").exists());
    }

    #[test]
    fn discovery_matches_extension_ignoring_case() {
        let temp = tempdir().expect("temporary directory");
        let root = temp.path();
        fs::create_dir_all(root.join("sub/deeper")).expect("dir created");
        fs::write(root.join("b.xlsx"), b"").expect("file written");
        fs::write(root.join("sub/A.XLSX"), b"").expect("file written");
        fs::write(root.join("sub/deeper/c.xlsx"), b"").expect("file written");
        fs::write(root.join("notes.txt"), b"").expect("file written");
        fs::write(root.join("old.xls"), b"").expect("file written");

        let files = find_spreadsheets(root, "xlsx");
        let names: Vec<String> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"A.XLSX".to_string()));
        assert!(names.contains(&"c.xlsx".to_string()));
        assert!(!names.contains(&"old.xls".to_string()));
    }
}
