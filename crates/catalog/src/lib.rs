//! Video file discovery for batch uploads.
//!
//! Scans a download directory (optionally recursively) for files whose
//! extension is on the video allow-list and returns them in a
//! deterministic order: a case-insensitive lexicographic sort of the
//! full path string, so batch order is reproducible across runs and
//! platforms.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Extensions accepted as video containers (matched case-insensitively).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "webm", "avi", "flv", "m4v", "ts"];

/// Trailing window of the file name used for progress labels.
const LABEL_WIDTH: usize = 60;

/// Errors produced while scanning the download directory.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("download directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file selected for upload.
///
/// The size is read once at discovery time and not re-checked later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute (or root-relative) path of the file.
    pub path: PathBuf,
    /// Size in bytes at discovery time.
    pub size: u64,
    /// File name (basename) for display.
    pub name: String,
}

impl FileEntry {
    /// Display label: the file name truncated to its trailing
    /// [`LABEL_WIDTH`] characters, so long names do not push the rate
    /// columns off screen.
    pub fn label(&self) -> &str {
        let chars = self.name.chars().count();
        if chars <= LABEL_WIDTH {
            return &self.name;
        }
        match self.name.char_indices().nth(chars - LABEL_WIDTH) {
            Some((idx, _)) => &self.name[idx..],
            None => &self.name,
        }
    }
}

/// Scans `root` for video files.
///
/// Returns entries sorted case-insensitively by full path string. When
/// `limit` is set, the sorted sequence is truncated to at most that many
/// entries (the cap applies after sorting, so it is a prefix of the full
/// ordered sequence). A directory with no matching files yields an empty
/// vector, not an error.
pub fn scan(
    root: &Path,
    recursive: bool,
    limit: Option<usize>,
) -> Result<Vec<FileEntry>, CatalogError> {
    if !root.is_dir() {
        return Err(CatalogError::MissingRoot(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    walk_dir(root, recursive, &mut entries)?;

    entries.sort_by_key(|e| e.path.to_string_lossy().to_lowercase());
    if let Some(n) = limit {
        entries.truncate(n);
    }

    debug!(
        root = %root.display(),
        recursive,
        files = entries.len(),
        "catalog scan complete"
    );
    Ok(entries)
}

fn walk_dir(
    dir: &Path,
    recursive: bool,
    entries: &mut Vec<FileEntry>,
) -> Result<(), CatalogError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            if recursive {
                walk_dir(&path, recursive, entries)?;
            }
        } else if metadata.is_file() && has_video_extension(&path) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push(FileEntry {
                size: metadata.len(),
                name,
                path,
            });
        }
    }
    Ok(())
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, len: usize) {
        fs::write(dir.join(name), vec![0u8; len]).unwrap();
    }

    #[test]
    fn scan_filters_by_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.mp4", 10);
        touch(dir.path(), "b.txt", 10);
        touch(dir.path(), "c.mkv", 10);
        touch(dir.path(), "noext", 10);

        let entries = scan(dir.path(), false, None).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp4", "c.mkv"]);
    }

    #[test]
    fn scan_extension_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "upper.MP4", 1);
        touch(dir.path(), "mixed.WebM", 1);

        let entries = scan(dir.path(), false, None).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn scan_sorts_case_insensitively_by_full_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Bravo.mp4", 1);
        touch(dir.path(), "alpha.mp4", 1);
        touch(dir.path(), "Charlie.mp4", 1);

        let entries = scan(dir.path(), false, None).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.mp4", "Bravo.mp4", "Charlie.mp4"]);
    }

    #[test]
    fn scan_limit_is_a_prefix_of_the_sorted_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "d.mp4", 1);
        touch(dir.path(), "a.mp4", 1);
        touch(dir.path(), "c.mp4", 1);
        touch(dir.path(), "b.mp4", 1);

        let all = scan(dir.path(), false, None).unwrap();
        let capped = scan(dir.path(), false, Some(2)).unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[..], all[..2]);

        // A limit above the match count returns everything.
        let oversized = scan(dir.path(), false, Some(100)).unwrap();
        assert_eq!(oversized.len(), 4);
    }

    #[test]
    fn scan_skips_subdirectories_unless_recursive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "top.mp4", 1);
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "nested.mp4", 1);

        let flat = scan(dir.path(), false, None).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = scan(dir.path(), true, None).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn scan_excludes_directories_with_video_names() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("folder.mp4")).unwrap();
        touch(dir.path(), "real.mp4", 1);

        let entries = scan(dir.path(), false, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "real.mp4");
    }

    #[test]
    fn scan_empty_directory_is_ok() {
        let dir = TempDir::new().unwrap();
        let entries = scan(dir.path(), true, None).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn scan_missing_root_is_an_error() {
        let result = scan(Path::new("/nonexistent/fastpush/downloads"), false, None);
        assert!(matches!(result, Err(CatalogError::MissingRoot(_))));
    }

    #[test]
    fn scan_records_file_size() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sized.mp4", 1234);

        let entries = scan(dir.path(), false, None).unwrap();
        assert_eq!(entries[0].size, 1234);
    }

    #[test]
    fn label_keeps_short_names_and_truncates_long_ones() {
        let short = FileEntry {
            path: PathBuf::from("short.mp4"),
            size: 0,
            name: "short.mp4".into(),
        };
        assert_eq!(short.label(), "short.mp4");

        let long_name = format!("{}.mp4", "x".repeat(80));
        let long = FileEntry {
            path: PathBuf::from(&long_name),
            size: 0,
            name: long_name.clone(),
        };
        assert_eq!(long.label().chars().count(), 60);
        assert!(long_name.ends_with(long.label()));
    }

    #[test]
    fn label_truncation_respects_multibyte_boundaries() {
        let name = format!("视频{}.mp4", "龙".repeat(70));
        let entry = FileEntry {
            path: PathBuf::from(&name),
            size: 0,
            name: name.clone(),
        };
        assert_eq!(entry.label().chars().count(), 60);
    }
}
