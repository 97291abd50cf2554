//! Source traversal and the size pass that precedes any copying.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::timestamp;
use crate::zip::ZipFileEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One file or directory found below the source folder.
#[derive(Debug, Clone)]
pub struct TraversalEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Zero for directories
    pub size: u64,
    /// Already clamped to the archive's timestamp range
    pub modified: OffsetDateTime,
    /// Directories only: nothing archivable lives below it
    pub empty: bool,
}

/// Walk everything below `root`, depth first, siblings sorted by name.
///
/// `root` itself is not yielded. Symlinks are followed, so a link to a regular
/// file is archived with its target's contents. Dangling links, link loops and
/// entries that are neither regular files nor directories are skipped, and so
/// is `exclude` (the archive being written, when it lives inside the folder).
/// A directory whose children were all skipped counts as empty.
pub fn walk<'a>(
    root: &Path,
    exclude: Option<&'a Path>,
) -> impl Iterator<Item = Result<TraversalEntry>> + use<'a> {
    let mut entries = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| classify(entry, exclude))
        .peekable();

    // Depth-first order puts a directory's first child right after it
    std::iter::from_fn(move || {
        let mut entry = match entries.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        if entry.kind == EntryKind::Directory {
            entry.empty = !matches!(
                entries.peek(),
                Some(Ok(next)) if next.path.starts_with(&entry.path)
            );
        }
        Some(Ok(entry))
    })
}

fn classify(
    entry: walkdir::Result<DirEntry>,
    exclude: Option<&Path>,
) -> Option<Result<TraversalEntry>> {
    let entry = match entry {
        Ok(entry) => entry,
        Err(e) if e.path().is_some_and(is_symlink) => {
            tracing::debug!("skipping unresolvable link: {e}");
            return None;
        }
        Err(e) => return Some(Err(io::Error::from(e).into())),
    };

    if exclude.is_some_and(|skip| entry.path() == skip) {
        return None;
    }

    let file_type = entry.file_type();
    let kind = if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        tracing::debug!("skipping {}: not a regular file", entry.path().display());
        return None;
    };

    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(e) => return Some(Err(io::Error::from(e).into())),
    };
    let modified = metadata
        .modified()
        .map(timestamp::from_system_time)
        .unwrap_or(timestamp::DOS_EPOCH);

    Some(Ok(TraversalEntry {
        path: entry.into_path(),
        kind,
        size: if kind == EntryKind::File { metadata.len() } else { 0 },
        modified,
        empty: false,
    }))
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Total bytes of all regular files below `root`.
pub fn folder_total_bytes(root: &Path, exclude: Option<&Path>) -> Result<u64> {
    walk(root, exclude).try_fold(0u64, |total, entry| {
        let entry = entry?;
        Ok(total + entry.size)
    })
}

/// Total uncompressed bytes of the file entries of an archive.
pub fn archive_total_bytes(entries: &[ZipFileEntry]) -> u64 {
    entries
        .iter()
        .filter(|e| !e.is_directory)
        .map(|e| e.uncompressed_size)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.bin"), vec![0u8; 234]).unwrap();
        fs::create_dir_all(dir.path().join("a/deeper")).unwrap();
        fs::write(dir.path().join("a/one.txt"), b"1").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();
        dir
    }

    #[test]
    fn walk_is_sorted_depth_first() {
        let dir = fixture();
        let found: Vec<_> = walk(dir.path(), None)
            .map(|e| e.unwrap())
            .map(|e| {
                let rel = e.path.strip_prefix(dir.path()).unwrap().to_path_buf();
                (rel, e.kind)
            })
            .collect();

        assert_eq!(
            found,
            vec![
                (PathBuf::from("a"), EntryKind::Directory),
                (PathBuf::from("a/deeper"), EntryKind::Directory),
                (PathBuf::from("a/one.txt"), EntryKind::File),
                (PathBuf::from("b.bin"), EntryKind::File),
                (PathBuf::from("c"), EntryKind::Directory),
            ]
        );
    }

    #[test]
    fn total_counts_files_only() {
        let dir = fixture();
        assert_eq!(folder_total_bytes(dir.path(), None).unwrap(), 235);

        let skip = dir.path().join("b.bin");
        assert_eq!(folder_total_bytes(dir.path(), Some(&skip)).unwrap(), 1);
    }

    #[test]
    fn empty_folder_totals_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(folder_total_bytes(dir.path(), None).unwrap(), 0);
        assert_eq!(walk(dir.path(), None).count(), 0);
    }

    fn empties(dir: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
        walk(dir, exclude)
            .map(|e| e.unwrap())
            .filter(|e| e.empty)
            .map(|e| e.path.strip_prefix(dir).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn empty_dir_detection() {
        let dir = fixture();
        assert_eq!(
            empties(dir.path(), None),
            [PathBuf::from("a/deeper"), PathBuf::from("c")]
        );
    }

    #[test]
    fn directory_holding_only_the_excluded_file_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();
        let archive = dir.path().join("out/self.zip");
        fs::write(&archive, b"PK").unwrap();

        assert_eq!(empties(dir.path(), Some(&archive)), [PathBuf::from("out")]);
        assert!(empties(dir.path(), None).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn file_symlinks_are_followed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), vec![3u8; 100]).unwrap();
        fs::create_dir(dir.path().join("links")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a.bin"), dir.path().join("links/l.bin"))
            .unwrap();

        let link = walk(dir.path(), None)
            .map(|e| e.unwrap())
            .find(|e| e.path.ends_with("links/l.bin"))
            .unwrap();
        assert_eq!(link.kind, EntryKind::File);
        assert_eq!(link.size, 100);
        assert_eq!(folder_total_bytes(dir.path(), None).unwrap(), 200);
        assert!(empties(dir.path(), None).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_and_loops_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dead")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("dead/link"))
            .unwrap();
        fs::create_dir_all(dir.path().join("loop")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop/up")).unwrap();

        assert_eq!(
            empties(dir.path(), None),
            [PathBuf::from("dead"), PathBuf::from("loop")]
        );
    }
}
