//! Repository layer over the document store.
//!
//! # Responsibility
//! - Map domain records onto one or more physical collections.
//! - Keep parent reference lists consistent with child collections.
//! - Translate store failures into semantic errors.
//!
//! # Invariants
//! - Mandatory arguments are checked before any store access.
//! - Reads never fail because an id is unknown; absence is `None`.
//! - Child collections are the source of truth; parent reference lists are
//!   a cache that `MaintenanceService` can rebuild.
//! - Multi-step operations are not atomic. Children are written before the
//!   parent reference is pushed and deleted before the parent, so a crash
//!   leaves at worst an orphaned child or a dangling reference.

use crate::model::{require, ValidationError};
use crate::store::{Collection, StoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod opinion_repo;
pub mod resolution_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// A mandatory argument was blank.
    MissingField(&'static str),
    /// A numeric value cannot be stored; names the offending field.
    NonFiniteNumber(String),
    /// Persist targeted an id already stored in `collection`.
    DuplicateId {
        collection: Collection,
        id: String,
    },
    /// Mutation targeted an id that does not resolve.
    NotFound { entity: &'static str, id: String },
    /// Dossier deletion blocked by an opinion that still covers it.
    ReferencedByOpinion {
        dossier_id: String,
        opinion_id: String,
    },
    /// Type deletion blocked by a resolution rule that uses it.
    InUseByResolution {
        type_id: String,
        resolution_id: String,
    },
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field not supplied: {field}"),
            Self::NonFiniteNumber(field) => write!(f, "non-finite number in field: {field}"),
            Self::DuplicateId { collection, id } => {
                write!(f, "id `{id}` already exists in `{collection}`")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ReferencedByOpinion {
                dossier_id,
                opinion_id,
            } => write!(
                f,
                "dossier `{dossier_id}` is referenced by opinion `{opinion_id}`"
            ),
            Self::InUseByResolution {
                type_id,
                resolution_id,
            } => write!(
                f,
                "type `{type_id}` is used by resolution `{resolution_id}`"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateKey { collection, key } => Self::DuplicateId {
                collection,
                id: key,
            },
            other => Self::Store(other),
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::MissingField(field) => Self::MissingField(field),
            ValidationError::NonFiniteNumber(field) => Self::NonFiniteNumber(field),
        }
    }
}

/// Rejects a blank id argument with `MissingField(field)`.
pub(crate) fn require_arg(field: &'static str, value: &str) -> RepoResult<()> {
    require(field, value)?;
    Ok(())
}
