//! Repair pass for parent/child consistency.
//!
//! # Responsibility
//! - Rebuild parent key lists (`notas`, `relatos`) from child collections.
//! - Delete children whose parent no longer exists.
//!
//! # Invariants
//! - Child collections are authoritative; parents are rewritten, never
//!   children.
//! - Both passes are idempotent: a second run right after a first one
//!   changes nothing.

use crate::repo::opinion_repo::{NOTE_REFS_FIELD, REPORT_REFS_FIELD};
use crate::repo::RepoResult;
use crate::store::{Collection, DocumentStore};
use log::info;

/// Children removed by `purge_orphans`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrphanPurge {
    pub notes: usize,
    pub reports: usize,
}

/// Parent/child pairs reconciled by the repair pass.
const PARENT_CHILD_LINKS: [(Collection, Collection, &str); 2] = [
    (Collection::Opinions, Collection::Notes, NOTE_REFS_FIELD),
    (Collection::Dossiers, Collection::Reports, REPORT_REFS_FIELD),
];

pub struct MaintenanceService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> MaintenanceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Rewrites every parent key list that disagrees with its children.
    ///
    /// Returns the number of parent documents rewritten.
    pub fn rebuild_references(&self) -> RepoResult<usize> {
        let mut rewritten = 0;
        for (parent, child, field) in PARENT_CHILD_LINKS {
            for document in self.store.find_all(parent)? {
                let actual: Vec<String> = self
                    .store
                    .find_by_parent(child, &document.key)?
                    .into_iter()
                    .map(|stored| stored.key)
                    .collect();
                let cached: Option<Vec<String>> = document
                    .body
                    .get(field)
                    .and_then(|value| serde_json::from_value(value.clone()).ok());

                if cached.as_ref() == Some(&actual) {
                    continue;
                }

                let value = serde_json::Value::from(actual);
                self.store.set_field(parent, &document.key, field, &value)?;
                rewritten += 1;
            }
        }

        info!("event=repair_references module=maintenance status=ok rewritten={rewritten}");
        Ok(rewritten)
    }

    /// Deletes notes and report entries whose parent is gone.
    pub fn purge_orphans(&self) -> RepoResult<OrphanPurge> {
        let purge = OrphanPurge {
            notes: self.purge_children(Collection::Notes, Collection::Opinions)?,
            reports: self.purge_children(Collection::Reports, Collection::Dossiers)?,
        };

        info!(
            "event=purge_orphans module=maintenance status=ok notes={} reports={}",
            purge.notes, purge.reports
        );
        Ok(purge)
    }

    fn purge_children(&self, child: Collection, parent: Collection) -> RepoResult<usize> {
        let mut removed = 0;
        for orphan in self.store.find_orphans(child, parent)? {
            if self.store.delete_one(child, &orphan.key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
