//! Opinion use-case service.
//!
//! # Responsibility
//! - Give note recording its supersede semantics: a new note for an item
//!   that already has one replaces it.
//! - Return fresh read-backs after mutations so callers never keep a stale
//!   opinion.

use crate::model::opinion::{Note, Opinion};
use crate::repo::opinion_repo::OpinionRepository;
use crate::repo::{RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum OpinionServiceError {
    /// Target opinion does not exist.
    OpinionNotFound(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but the read-back did not find the opinion.
    InconsistentState(&'static str),
}

impl Display for OpinionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpinionNotFound(id) => write!(f, "opinion not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent opinion state: {details}"),
        }
    }
}

impl Error for OpinionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for OpinionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "opinion",
                id,
            } => Self::OpinionNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Opinion service facade over a repository implementation.
pub struct OpinionService<R: OpinionRepository> {
    repo: R,
}

impl<R: OpinionRepository> OpinionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get(&self, opinion_id: &str) -> RepoResult<Option<Opinion>> {
        self.repo.by_id(opinion_id)
    }

    /// Records `note`, replacing any note on the same original item.
    ///
    /// Runs as remove-then-add; a crash in between loses the old note
    /// without recording the new one.
    pub fn record_note(
        &self,
        opinion_id: &str,
        note: &Note,
    ) -> Result<Opinion, OpinionServiceError> {
        self.repo.remove_note(opinion_id, &note.original)?;
        self.repo.add_note(opinion_id, note)?;
        self.read_back(opinion_id, "opinion missing after note record")
    }

    /// Replaces the grounding text and returns the refreshed opinion.
    pub fn amend_grounding(
        &self,
        opinion_id: &str,
        grounding: &str,
    ) -> Result<Opinion, OpinionServiceError> {
        self.repo.update_grounding(opinion_id, grounding)?;
        self.read_back(opinion_id, "opinion missing after grounding update")
    }

    fn read_back(
        &self,
        opinion_id: &str,
        details: &'static str,
    ) -> Result<Opinion, OpinionServiceError> {
        self.repo
            .by_id(opinion_id)?
            .ok_or(OpinionServiceError::InconsistentState(details))
    }
}
