//! Resolution repository: resolutions and report types.
//!
//! # Responsibility
//! - Create, read, list and delete resolutions in `resolucoes`.
//! - Create, read, search and delete report types in `tipos`.
//!
//! # Invariants
//! - There is no update path for resolutions; a changed resolution is a
//!   new resolution with a new id.
//! - A report type cannot be removed while any resolution rule targets it
//!   or depends on one of its attributes.

use crate::model::report_type::ReportType;
use crate::model::resolution::Resolution;
use crate::repo::{require_arg, RepoError, RepoResult};
use crate::store::{from_keyed_document, to_keyed_document, Collection, DocumentStore};
use log::{debug, warn};

/// Repository interface for resolutions and report types.
pub trait ResolutionRepository {
    fn by_id(&self, id: &str) -> RepoResult<Option<Resolution>>;
    /// Stores a resolution verbatim. Returns its id.
    fn persist(&self, resolution: &Resolution) -> RepoResult<String>;
    /// Returns whether a resolution was actually deleted.
    fn remove(&self, id: &str) -> RepoResult<bool>;
    /// Ids of every stored resolution, in store order.
    fn list_ids(&self) -> RepoResult<Vec<String>>;
    fn persist_type(&self, report_type: &ReportType) -> RepoResult<()>;
    /// Returns whether a type was actually deleted.
    fn remove_type(&self, code: &str) -> RepoResult<bool>;
    fn type_by_code(&self, code: &str) -> RepoResult<Option<ReportType>>;
    /// Types whose name contains `fragment` (case-sensitive).
    fn types_by_name_containing(&self, fragment: &str) -> RepoResult<Vec<ReportType>>;
}

/// Resolution repository backed by any `DocumentStore`.
pub struct DocumentResolutionRepository<S> {
    store: S,
}

impl<S: DocumentStore> DocumentResolutionRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// First resolution with a rule that uses `report_type`, if any.
    fn resolution_using(&self, report_type: &ReportType) -> RepoResult<Option<String>> {
        for document in self.store.find_all(Collection::Resolutions)? {
            let resolution: Resolution = from_keyed_document(document)?;
            let in_use = resolution
                .rules
                .iter()
                .any(|rule| rule.uses_type(&report_type.id, report_type.attribute_names()));
            if in_use {
                return Ok(Some(resolution.id));
            }
        }
        Ok(None)
    }
}

impl<S: DocumentStore> ResolutionRepository for DocumentResolutionRepository<S> {
    fn by_id(&self, id: &str) -> RepoResult<Option<Resolution>> {
        require_arg("id", id)?;

        self.store
            .find_by_key(Collection::Resolutions, id)?
            .map(|document| from_keyed_document(document).map_err(RepoError::from))
            .transpose()
    }

    fn persist(&self, resolution: &Resolution) -> RepoResult<String> {
        resolution.validate()?;

        let (key, body) = to_keyed_document(resolution)?;
        let key = self
            .store
            .insert_one(Collection::Resolutions, Some(key.as_str()), None, &body)?;

        debug!(
            "event=resolution_persist module=repo status=ok resolution_id={key} rules={}",
            resolution.rules.len()
        );
        Ok(key)
    }

    fn remove(&self, id: &str) -> RepoResult<bool> {
        require_arg("identificador", id)?;

        let removed = self.store.delete_one(Collection::Resolutions, id)?;
        debug!("event=resolution_remove module=repo status=ok resolution_id={id} removed={removed}");
        Ok(removed)
    }

    fn list_ids(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .store
            .find_all(Collection::Resolutions)?
            .into_iter()
            .map(|document| document.key)
            .collect())
    }

    fn persist_type(&self, report_type: &ReportType) -> RepoResult<()> {
        report_type.validate()?;

        let (key, body) = to_keyed_document(report_type)?;
        self.store
            .insert_one(Collection::Types, Some(key.as_str()), None, &body)?;

        debug!("event=type_persist module=repo status=ok type_id={key}");
        Ok(())
    }

    fn remove_type(&self, code: &str) -> RepoResult<bool> {
        require_arg("codigo", code)?;

        let Some(report_type) = self.type_by_code(code)? else {
            return Ok(false);
        };

        if let Some(resolution_id) = self.resolution_using(&report_type)? {
            warn!(
                "event=type_remove module=repo status=blocked type_id={code} resolution_id={resolution_id}"
            );
            return Err(RepoError::InUseByResolution {
                type_id: code.to_string(),
                resolution_id,
            });
        }

        let removed = self.store.delete_one(Collection::Types, code)?;
        debug!("event=type_remove module=repo status=ok type_id={code} removed={removed}");
        Ok(removed)
    }

    fn type_by_code(&self, code: &str) -> RepoResult<Option<ReportType>> {
        require_arg("codigo", code)?;

        self.store
            .find_by_key(Collection::Types, code)?
            .map(|document| from_keyed_document(document).map_err(RepoError::from))
            .transpose()
    }

    fn types_by_name_containing(&self, fragment: &str) -> RepoResult<Vec<ReportType>> {
        let mut matches = Vec::new();
        for document in self.store.find_all(Collection::Types)? {
            let report_type: ReportType = from_keyed_document(document)?;
            if report_type.name.contains(fragment) {
                matches.push(report_type);
            }
        }
        Ok(matches)
    }
}
