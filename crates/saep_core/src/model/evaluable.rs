//! Polymorphic evaluable item: a score or an activity report entry.
//!
//! # Invariants
//! - `ActivityReport` documents always carry the `tipo` tag field; `Score`
//!   documents never do. The tag is the only thing decode looks at.
//! - Encode writes the variant's own shape with no wrapper envelope.
//! - Equality is variant-aware: a score never equals a report entry.

use crate::model::value::Value;
use crate::model::ValidationError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Field whose presence marks an activity report document.
pub const REPORT_TAG_FIELD: &str = "tipo";

/// Named score attached to an opinion or recorded in a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(rename = "atributo")]
    pub attribute: String,
    #[serde(rename = "valor")]
    pub value: Value,
}

impl Score {
    pub fn new(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.value.ensure_finite(&self.attribute)
    }
}

/// One activity report entry ("relato") from a dossier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    /// Report type code; doubles as the variant discriminator.
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "valores", default)]
    pub values: BTreeMap<String, Value>,
}

impl ActivityReport {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.values
            .iter()
            .try_for_each(|(field, value)| value.ensure_finite(field))
    }
}

/// Item under evaluation.
///
/// `PartialEq` is the identity used by note removal: report entries compare
/// field for field, scores compare attribute name and value.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluable {
    Score(Score),
    Report(ActivityReport),
}

impl Evaluable {
    pub fn is_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }

    /// Checks that every numeric value can be stored as JSON.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Score(score) => score.validate(),
            Self::Report(report) => report.validate(),
        }
    }
}

impl From<Score> for Evaluable {
    fn from(value: Score) -> Self {
        Self::Score(value)
    }
}

impl From<ActivityReport> for Evaluable {
    fn from(value: ActivityReport) -> Self {
        Self::Report(value)
    }
}

impl Serialize for Evaluable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Score(score) => score.serialize(serializer),
            Self::Report(report) => report.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Evaluable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let is_report = fields.contains_key(REPORT_TAG_FIELD);
        let document = serde_json::Value::Object(fields);

        if is_report {
            serde_json::from_value(document)
                .map(Self::Report)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(document)
                .map(Self::Score)
                .map_err(D::Error::custom)
        }
    }
}
