//! File classification.
//!
//! Each category pass takes ownership of the current pool and returns the
//! bucket of matched entries together with the remaining pool, so a later
//! category can never reconsider a file that was already claimed.

use tracing::debug;

use crate::glob::GlobRule;
use crate::plan::Category;
use crate::scan::FileEntry;

/// The matched entries for one category pass.
#[derive(Debug)]
pub struct ClassificationBucket {
    pub category: Category,
    pub entries: Vec<FileEntry>,
}

/// Partitions `pool` into (matched, remaining) for one category.
///
/// Symlinks match unconditionally, without pattern evaluation. Regular files
/// are tested against the rules in configured order and claimed by the first
/// rule that matches.
pub fn classify(
    pool: Vec<FileEntry>,
    rules: &[GlobRule],
    category: Category,
) -> (ClassificationBucket, Vec<FileEntry>) {
    let mut matched = Vec::new();
    let mut remaining = Vec::new();

    for entry in pool {
        if entry.is_symlink() {
            debug!(category = category.label(), path = %entry.rel_path.display(), "symlink, unconditional match");
            matched.push(entry);
            continue;
        }
        let rel = entry.rel_str();
        match rules.iter().find(|rule| rule.matches(&rel)) {
            Some(rule) => {
                debug!(category = category.label(), pattern = rule.pattern(), path = %rel, "matched");
                matched.push(entry);
            }
            None => remaining.push(entry),
        }
    }

    (
        ClassificationBucket {
            category,
            entries: matched,
        },
        remaining,
    )
}
