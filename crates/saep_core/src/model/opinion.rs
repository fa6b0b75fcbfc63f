//! Opinion ("parecer") and its notes.
//!
//! # Invariants
//! - `notes` is never stored inline with the opinion; repositories persist
//!   each note as a child document and rebuild the list on read.
//! - `id` is mandatory and is the opinion's storage key.

use crate::model::evaluable::{Evaluable, Score};
use crate::model::{require, ValidationError};
use serde::{Deserialize, Serialize};

/// Recorded change from one evaluable item to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Item as it stood before the change. Removal matches on this field.
    pub original: Evaluable,
    /// Item after the change.
    #[serde(rename = "novo")]
    pub replacement: Evaluable,
    #[serde(rename = "justificativa")]
    pub justification: String,
}

impl Note {
    pub fn new(
        original: impl Into<Evaluable>,
        replacement: impl Into<Evaluable>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            replacement: replacement.into(),
            justification: justification.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.original.validate()?;
        self.replacement.validate()
    }
}

/// Evaluation verdict over a set of dossiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub id: String,
    /// Id of the resolution the opinion was issued under.
    #[serde(rename = "resolucao")]
    pub resolution_id: String,
    /// Ids of the dossiers this opinion covers.
    #[serde(rename = "radocs", default)]
    pub dossier_ids: Vec<String>,
    /// Score adjustments.
    #[serde(rename = "pontuacoes", default)]
    pub scores: Vec<Score>,
    /// Free-text grounding of the verdict.
    #[serde(rename = "fundamentacao", default)]
    pub grounding: String,
    #[serde(rename = "notas", default)]
    pub notes: Vec<Note>,
}

impl Opinion {
    pub fn new(id: impl Into<String>, resolution_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resolution_id: resolution_id.into(),
            dossier_ids: Vec::new(),
            scores: Vec::new(),
            grounding: String::new(),
            notes: Vec::new(),
        }
    }

    /// Checks mandatory fields and numeric values before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        self.scores.iter().try_for_each(Score::validate)?;
        self.notes.iter().try_for_each(Note::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, Opinion};
    use crate::model::evaluable::Score;
    use crate::model::ValidationError;

    #[test]
    fn validate_rejects_blank_id() {
        let opinion = Opinion::new(" ", "r-1");
        assert_eq!(
            opinion.validate(),
            Err(ValidationError::MissingField("id"))
        );
    }

    #[test]
    fn note_serializes_with_original_wire_names() {
        let note = Note::new(Score::new("a", 1), Score::new("a", 2), "revisado");
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("original").is_some());
        assert!(json.get("novo").is_some());
        assert_eq!(json["justificativa"], "revisado");
    }

    #[test]
    fn validate_rejects_non_finite_scores_and_notes() {
        let mut opinion = Opinion::new("p-1", "r-1");
        opinion.scores.push(Score::new("ensino", f64::NAN));
        assert_eq!(
            opinion.validate(),
            Err(ValidationError::NonFiniteNumber("ensino".to_string()))
        );

        let mut opinion = Opinion::new("p-1", "r-1");
        opinion
            .notes
            .push(Note::new(Score::new("a", 1), Score::new("a", f64::INFINITY), "j"));
        assert!(opinion.validate().is_err());
    }
}
