//! Dossier ("radoc"): a locally cached set of activity reports.
//!
//! Dossiers are produced by an external source and copied here so opinions
//! stay reproducible even when the source changes later.

use crate::model::evaluable::ActivityReport;
use crate::model::{require, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    pub id: String,
    #[serde(rename = "anoBase")]
    pub base_year: i32,
    #[serde(rename = "relatos", default)]
    pub reports: Vec<ActivityReport>,
}

impl Dossier {
    pub fn new(id: impl Into<String>, base_year: i32) -> Self {
        Self {
            id: id.into(),
            base_year,
            reports: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        self.reports.iter().try_for_each(ActivityReport::validate)
    }
}
