//! Directory tree scanning.
//!
//! Produces the flat pool of candidate files for classification. Hidden
//! entries (name starting with `.`) and the `pantheon2.yml` config file are
//! never yielded, and hidden directories are pruned without being entered.
//! Symlinked directories are treated as leaves: they appear as entries but
//! are not expanded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::load_config::CONFIG_FILE;

/// One scanned file or symlink, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the scan root.
    pub rel_path: PathBuf,
    /// Link target when the entry is a symlink.
    pub symlink_target: Option<PathBuf>,
}

impl FileEntry {
    pub fn is_symlink(&self) -> bool {
        self.symlink_target.is_some()
    }

    /// The relative path joined with `/`, the form patterns are matched
    /// against.
    pub fn rel_str(&self) -> String {
        let segments: Vec<String> = self
            .rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        segments.join("/")
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its extension, used as module title/description.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn excluded(name: &str) -> bool {
    name.starts_with('.') || name == CONFIG_FILE
}

/// Recursively enumerates regular files and symlinks under `root`.
///
/// Restartable: a pure function of the tree at call time. Entry order is
/// walkdir's traversal order, stable within one run.
pub fn scan(root: &Path) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !excluded(&e.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry?;
        // Plain directories are recursed into, not collected. A symlinked
        // directory reports a symlink file type here and is kept as a leaf.
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.into_path();
        let rel_path = match path.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        let symlink_target = if path.is_symlink() {
            Some(fs::read_link(&path)?)
        } else {
            None
        };
        debug!(path = %rel_path.display(), symlink = symlink_target.is_some(), "scanned entry");
        entries.push(FileEntry {
            path,
            rel_path,
            symlink_target,
        });
    }
    Ok(entries)
}
