//! Opinion repository: opinions, their notes, and the dossier cache.
//!
//! # Responsibility
//! - Persist opinions in `pareceres` and their notes in `notas`.
//! - Persist dossiers in `radocs` and their entries in `relatos`.
//! - Remove notes by content of their original item, not by key.
//!
//! # Invariants
//! - `Opinion::notes` and `Dossier::reports` are rebuilt from the child
//!   collections on every read; the parent's key list is never trusted.
//! - A dossier cannot be removed while any opinion lists it in `radocs`.
//!
//! # Crash windows
//! - `add_note`: child inserted, reference not yet pushed. The note is
//!   already visible through `by_id`; only the cached key list lags.
//! - `remove_note`: child deleted, reference not yet pulled. Leaves a
//!   dangling key in the cached list.
//! - `remove` / `remove_dossier`: children deleted, parent not yet deleted.
//! - `persist_dossier`: entries inserted, dossier not yet inserted. Leaves
//!   orphaned entries for `MaintenanceService::purge_orphans`.

use crate::model::dossier::Dossier;
use crate::model::evaluable::{ActivityReport, Evaluable};
use crate::model::opinion::{Note, Opinion};
use crate::repo::{require_arg, RepoError, RepoResult};
use crate::store::{
    from_document, from_keyed_document, to_document, to_keyed_document, Collection,
    DocumentStore, StoreError, StoredDocument,
};
use log::{debug, warn};

/// Opinion field holding cached note keys.
pub const NOTE_REFS_FIELD: &str = "notas";
/// Dossier field holding cached report entry keys.
pub const REPORT_REFS_FIELD: &str = "relatos";
const DOSSIER_IDS_FIELD: &str = "radocs";
const GROUNDING_FIELD: &str = "fundamentacao";
const NOTE_ORIGINAL_FIELD: &str = "original";

/// Repository interface for opinions, notes and dossiers.
pub trait OpinionRepository {
    /// Loads one opinion with every note attached to it.
    fn by_id(&self, id: &str) -> RepoResult<Option<Opinion>>;
    /// Stores a new opinion, then attaches its initial notes one by one.
    fn persist(&self, opinion: &Opinion) -> RepoResult<()>;
    /// Attaches one note. Returns the note's generated storage key.
    ///
    /// Does not replace an existing note for the same original item; see
    /// `OpinionService::record_note` for supersede semantics.
    fn add_note(&self, opinion_id: &str, note: &Note) -> RepoResult<String>;
    /// Removes every note whose original item equals `original`.
    ///
    /// Returns how many notes were removed; zero is not an error.
    fn remove_note(&self, opinion_id: &str, original: &Evaluable) -> RepoResult<usize>;
    /// Replaces the grounding text in place.
    ///
    /// Opinions loaded before this call are stale afterwards.
    fn update_grounding(&self, opinion_id: &str, grounding: &str) -> RepoResult<()>;
    /// Removes an opinion and all of its notes.
    fn remove(&self, opinion_id: &str) -> RepoResult<()>;
    /// Loads one dossier with every report entry attached to it.
    fn dossier_by_id(&self, id: &str) -> RepoResult<Option<Dossier>>;
    /// Stores a dossier and its entries. Returns the dossier id.
    fn persist_dossier(&self, dossier: &Dossier) -> RepoResult<String>;
    /// Removes a dossier and its entries unless an opinion references it.
    fn remove_dossier(&self, id: &str) -> RepoResult<()>;
}

/// Opinion repository backed by any `DocumentStore`.
pub struct DocumentOpinionRepository<S> {
    store: S,
}

impl<S: DocumentStore> DocumentOpinionRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn ensure_opinion_exists(&self, opinion_id: &str) -> RepoResult<()> {
        if self
            .store
            .find_by_key(Collection::Opinions, opinion_id)?
            .is_none()
        {
            return Err(not_found_opinion(opinion_id));
        }
        Ok(())
    }

    fn load_notes(&self, opinion_id: &str) -> RepoResult<Vec<Note>> {
        self.store
            .find_by_parent(Collection::Notes, opinion_id)?
            .into_iter()
            .map(|child| from_document(child.body).map_err(RepoError::from))
            .collect()
    }

    fn load_reports(&self, dossier_id: &str) -> RepoResult<Vec<ActivityReport>> {
        self.store
            .find_by_parent(Collection::Reports, dossier_id)?
            .into_iter()
            .map(|child| from_document(child.body).map_err(RepoError::from))
            .collect()
    }
}

impl<S: DocumentStore> OpinionRepository for DocumentOpinionRepository<S> {
    fn by_id(&self, id: &str) -> RepoResult<Option<Opinion>> {
        require_arg("id", id)?;

        let Some(mut document) = self.store.find_by_key(Collection::Opinions, id)? else {
            return Ok(None);
        };
        document.body.remove(NOTE_REFS_FIELD);

        let mut opinion: Opinion = from_keyed_document(document)?;
        opinion.notes = self.load_notes(id)?;
        Ok(Some(opinion))
    }

    fn persist(&self, opinion: &Opinion) -> RepoResult<()> {
        opinion.validate()?;

        let (key, mut body) = to_keyed_document(opinion)?;
        body.insert(
            NOTE_REFS_FIELD.to_string(),
            serde_json::Value::Array(Vec::new()),
        );
        self.store
            .insert_one(Collection::Opinions, Some(key.as_str()), None, &body)?;

        for note in &opinion.notes {
            self.add_note(&opinion.id, note)?;
        }

        debug!(
            "event=opinion_persist module=repo status=ok opinion_id={} notes={}",
            opinion.id,
            opinion.notes.len()
        );
        Ok(())
    }

    fn add_note(&self, opinion_id: &str, note: &Note) -> RepoResult<String> {
        require_arg("id", opinion_id)?;
        note.validate()?;
        self.ensure_opinion_exists(opinion_id)?;

        let body = to_document(note)?;
        let note_key = self
            .store
            .insert_one(Collection::Notes, None, Some(opinion_id), &body)?;

        if !self.store.push_to_array(
            Collection::Opinions,
            opinion_id,
            NOTE_REFS_FIELD,
            &note_key,
        )? {
            warn!(
                "event=note_add module=repo status=error opinion_id={opinion_id} note_key={note_key} error_code=parent_vanished"
            );
            return Err(not_found_opinion(opinion_id));
        }

        debug!("event=note_add module=repo status=ok opinion_id={opinion_id} note_key={note_key}");
        Ok(note_key)
    }

    fn remove_note(&self, opinion_id: &str, original: &Evaluable) -> RepoResult<usize> {
        require_arg("id", opinion_id)?;
        original.validate()?;
        self.ensure_opinion_exists(opinion_id)?;

        // Every sibling must decode before anything is deleted.
        let mut matching = Vec::new();
        for child in self.store.find_by_parent(Collection::Notes, opinion_id)? {
            if stored_original_matches(&child, original)? {
                matching.push(child.key);
            }
        }

        for key in &matching {
            self.store.delete_one(Collection::Notes, key)?;
            self.store
                .pull_from_array(Collection::Opinions, opinion_id, NOTE_REFS_FIELD, key)?;
        }

        let removed = matching.len();
        debug!("event=note_remove module=repo status=ok opinion_id={opinion_id} removed={removed}");
        Ok(removed)
    }

    fn update_grounding(&self, opinion_id: &str, grounding: &str) -> RepoResult<()> {
        require_arg("parecer", opinion_id)?;

        let matched = self.store.set_field(
            Collection::Opinions,
            opinion_id,
            GROUNDING_FIELD,
            &serde_json::Value::String(grounding.to_string()),
        )?;
        if !matched {
            return Err(not_found_opinion(opinion_id));
        }

        debug!("event=grounding_update module=repo status=ok opinion_id={opinion_id}");
        Ok(())
    }

    fn remove(&self, opinion_id: &str) -> RepoResult<()> {
        require_arg("id", opinion_id)?;
        self.ensure_opinion_exists(opinion_id)?;

        let notes = self.store.delete_by_parent(Collection::Notes, opinion_id)?;
        self.store.delete_one(Collection::Opinions, opinion_id)?;

        debug!("event=opinion_remove module=repo status=ok opinion_id={opinion_id} notes={notes}");
        Ok(())
    }

    fn dossier_by_id(&self, id: &str) -> RepoResult<Option<Dossier>> {
        require_arg("identificador", id)?;

        let Some(mut document) = self.store.find_by_key(Collection::Dossiers, id)? else {
            return Ok(None);
        };
        document.body.remove(REPORT_REFS_FIELD);

        let mut dossier: Dossier = from_keyed_document(document)?;
        dossier.reports = self.load_reports(id)?;
        Ok(Some(dossier))
    }

    fn persist_dossier(&self, dossier: &Dossier) -> RepoResult<String> {
        dossier.validate()?;

        if self
            .store
            .find_by_key(Collection::Dossiers, &dossier.id)?
            .is_some()
        {
            return Err(RepoError::DuplicateId {
                collection: Collection::Dossiers,
                id: dossier.id.clone(),
            });
        }

        let mut report_keys = Vec::with_capacity(dossier.reports.len());
        for report in &dossier.reports {
            let body = to_document(report)?;
            let key = self
                .store
                .insert_one(Collection::Reports, None, Some(&dossier.id), &body)?;
            report_keys.push(serde_json::Value::String(key));
        }

        let (key, mut body) = to_keyed_document(dossier)?;
        body.insert(
            REPORT_REFS_FIELD.to_string(),
            serde_json::Value::Array(report_keys),
        );
        self.store
            .insert_one(Collection::Dossiers, Some(key.as_str()), None, &body)?;

        debug!(
            "event=dossier_persist module=repo status=ok dossier_id={} reports={}",
            dossier.id,
            dossier.reports.len()
        );
        Ok(key)
    }

    fn remove_dossier(&self, id: &str) -> RepoResult<()> {
        require_arg("identificador", id)?;

        if self.store.find_by_key(Collection::Dossiers, id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "dossier",
                id: id.to_string(),
            });
        }

        let referencing = self
            .store
            .find_by_array_member(Collection::Opinions, DOSSIER_IDS_FIELD, id)?;
        if let Some(opinion) = referencing.into_iter().next() {
            warn!(
                "event=dossier_remove module=repo status=blocked dossier_id={id} opinion_id={}",
                opinion.key
            );
            return Err(RepoError::ReferencedByOpinion {
                dossier_id: id.to_string(),
                opinion_id: opinion.key,
            });
        }

        let reports = self.store.delete_by_parent(Collection::Reports, id)?;
        self.store.delete_one(Collection::Dossiers, id)?;

        debug!("event=dossier_remove module=repo status=ok dossier_id={id} reports={reports}");
        Ok(())
    }
}

fn stored_original_matches(child: &StoredDocument, original: &Evaluable) -> RepoResult<bool> {
    let Some(stored) = child.body.get(NOTE_ORIGINAL_FIELD) else {
        return Ok(false);
    };
    let stored: Evaluable = serde_json::from_value(stored.clone()).map_err(StoreError::from)?;
    Ok(&stored == original)
}

fn not_found_opinion(id: &str) -> RepoError {
    RepoError::NotFound {
        entity: "opinion",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentOpinionRepository, OpinionRepository};
    use crate::db::open_db_in_memory;
    use crate::model::evaluable::Score;
    use crate::model::opinion::{Note, Opinion};
    use crate::repo::RepoError;
    use crate::store::{Collection, DocumentStore, SqliteDocumentStore};

    #[test]
    fn stored_opinion_holds_note_keys_not_inline_notes() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteDocumentStore::new(&conn);
        let repo = DocumentOpinionRepository::new(store);

        let mut opinion = Opinion::new("p-1", "r-1");
        opinion
            .notes
            .push(Note::new(Score::new("a", 1), Score::new("a", 2), "j"));
        repo.persist(&opinion).unwrap();

        let raw = store
            .find_by_key(Collection::Opinions, "p-1")
            .unwrap()
            .unwrap();
        let refs = raw.body["notas"].as_array().unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_string());
        assert!(!raw.body.contains_key("id"));
    }

    #[test]
    fn blank_ids_fail_before_store_access() {
        let conn = open_db_in_memory().unwrap();
        let repo = DocumentOpinionRepository::new(SqliteDocumentStore::new(&conn));

        assert!(matches!(repo.by_id(""), Err(RepoError::MissingField("id"))));
        assert!(matches!(
            repo.update_grounding(" ", "x"),
            Err(RepoError::MissingField("parecer"))
        ));
        assert!(matches!(
            repo.remove_dossier(""),
            Err(RepoError::MissingField("identificador"))
        ));
        assert!(matches!(
            repo.persist(&Opinion::new("", "r")),
            Err(RepoError::MissingField("id"))
        ));
    }
}
