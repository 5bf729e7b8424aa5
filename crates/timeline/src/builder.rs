use crate::diff::{all_lines, changed_lines};
use fn_history_entity_locator::EntityLocation;
use fn_history_provider::Commit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Modified,
}

/// The entity as it stood after one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub index: usize,
    pub commit: Commit,
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
    pub change: ChangeKind,
    /// 0-based offsets into the lines of `source`
    pub changed_lines: BTreeSet<usize>,
}

/// Folds commits, oldest first, into the list of distinct entity versions.
///
/// The comparison baseline is always the last retained snapshot: commits
/// where the file or entity is missing leave it untouched.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshots: Vec<Snapshot>,
}

impl SnapshotBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next commit with the entity as located there (`None` when
    /// the file or the entity is absent). Returns the snapshot if one was
    /// retained.
    pub fn observe(&mut self, commit: &Commit, location: Option<EntityLocation>) -> Option<&Snapshot> {
        let Some(location) = location else {
            log::debug!("{}: entity absent", commit.short_hash);
            return None;
        };

        let (change, changed) = match self.snapshots.last() {
            None => (ChangeKind::Created, all_lines(&location.source)),
            Some(prev) if prev.source == location.source => {
                log::debug!("{}: entity unchanged", commit.short_hash);
                return None;
            }
            Some(prev) => (
                ChangeKind::Modified,
                changed_lines(&prev.source, &location.source),
            ),
        };

        log::debug!(
            "{}: entity {:?} ({} lines changed)",
            commit.short_hash,
            change,
            changed.len()
        );
        self.snapshots.push(Snapshot {
            index: self.snapshots.len(),
            commit: commit.clone(),
            source: location.source,
            start_line: location.start_line,
            end_line: location.end_line,
            change,
            changed_lines: changed,
        });
        self.snapshots.last()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn finish(self) -> Vec<Snapshot> {
        self.snapshots
    }
}
