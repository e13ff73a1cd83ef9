//! Input file discovery

use std::fs;
use std::path::{Path, PathBuf};

use super::error::IngestError;

/// Find every file under `root` whose extension is `extension`
///
/// Walks all subdirectories. Returned paths are absolute and sorted so two
/// runs over the same tree see the same order. Files whose names start with
/// a dot are skipped. No matches is an empty list, not an error; a missing
/// root is.
pub fn locate(root: &Path, extension: &str) -> Result<Vec<PathBuf>, IngestError> {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return Err(IngestError::InvalidPattern(
            "file extension must not be empty".to_string(),
        ));
    }

    let root = fs::canonicalize(root).map_err(|e| IngestError::SourceNotAccessible {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !root.is_dir() {
        return Err(IngestError::SourceNotAccessible {
            path: root,
            reason: "not a directory".to_string(),
        });
    }

    let full_pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.display().to_string()),
        glob::Pattern::escape(extension)
    );

    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let entries = glob::glob_with(&full_pattern, options)
        .map_err(|e| IngestError::InvalidPattern(format!("{}: {}", full_pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                // Log but continue
                tracing::warn!("Error accessing path: {}", e);
            }
        }
    }

    files.sort();
    tracing::debug!(root = %root.display(), extension, found = files.len(), "Located input files");

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_locate_recurses_and_sorts() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("A").join("B");
        fs::create_dir_all(&nested).unwrap();
        File::create(nested.join("b.json")).unwrap();
        File::create(dir.path().join("A").join("a.json")).unwrap();
        File::create(dir.path().join("z.json")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let files = locate(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|p| p.is_absolute()));
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
        assert!(files.iter().all(|p| p.extension().unwrap() == "json"));
    }

    #[test]
    fn test_locate_accepts_leading_dot() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("x.json")).unwrap();

        assert_eq!(locate(dir.path(), ".json").unwrap().len(), 1);
    }

    #[test]
    fn test_locate_skips_dot_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("A")).unwrap();
        File::create(dir.path().join(".partial.json")).unwrap();
        File::create(dir.path().join("A").join(".cache.json")).unwrap();
        File::create(dir.path().join("A").join("song.json")).unwrap();

        let files = locate(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("A/song.json"));
    }

    #[test]
    fn test_locate_empty_tree() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("readme.md")).unwrap();

        let files = locate(dir.path(), "json").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_locate_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = locate(&dir.path().join("nope"), "json").unwrap_err();
        assert!(matches!(err, IngestError::SourceNotAccessible { .. }));
    }

    #[test]
    fn test_locate_ignores_directories_named_like_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("folder.json")).unwrap();
        File::create(dir.path().join("folder.json").join("inner.json")).unwrap();

        let files = locate(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("folder.json/inner.json"));
    }
}
