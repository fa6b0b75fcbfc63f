//! Resolution and its rules.
//!
//! # Invariants
//! - Resolutions are write-once: there is no update path, only create,
//!   read, list and delete.
//! - Rule order is significant and preserved verbatim.

use crate::model::{require, ValidationError};
use serde::{Deserialize, Serialize};

/// Scoring strategy of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Fixed points per matching report entry.
    Points,
    /// Value computed from `expression`.
    Expression,
    /// `then`/`otherwise` outcome chosen by `expression`.
    Conditional,
    /// Average over matching report entries.
    Average,
    /// Sum over matching report entries.
    Sum,
}

/// One scoring or validation clause.
///
/// Stored verbatim; this crate never evaluates rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "variavel")]
    pub variable: String,
    #[serde(rename = "tipo")]
    pub kind: RuleKind,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "valorMaximo")]
    pub max_value: f64,
    #[serde(rename = "valorMinimo")]
    pub min_value: f64,
    #[serde(rename = "expressao", default)]
    pub expression: String,
    #[serde(rename = "entao", default)]
    pub then: String,
    #[serde(rename = "senao", default)]
    pub otherwise: String,
    /// Code of the report type this rule applies to.
    #[serde(rename = "tipoRelato", default)]
    pub report_type: String,
    #[serde(rename = "pontosPorItem")]
    pub points_per_item: f64,
    /// Variable or attribute names this rule depends on.
    #[serde(rename = "dependeDe", default)]
    pub depends_on: Vec<String>,
}

impl Rule {
    /// Rule with empty expressions, no bounds and no dependencies.
    pub fn new(variable: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            variable: variable.into(),
            kind,
            description: String::new(),
            max_value: 0.0,
            min_value: 0.0,
            expression: String::new(),
            then: String::new(),
            otherwise: String::new(),
            report_type: String::new(),
            points_per_item: 0.0,
            depends_on: Vec::new(),
        }
    }

    /// Whether this rule targets the given report type.
    ///
    /// A rule bound to another type never counts, even when it shares an
    /// attribute name. A rule with no `tipoRelato` counts when it depends on
    /// any of the type's attribute names.
    pub fn uses_type<'a>(
        &self,
        type_code: &str,
        mut attribute_names: impl Iterator<Item = &'a str>,
    ) -> bool {
        if self.report_type == type_code {
            return true;
        }
        self.report_type.trim().is_empty()
            && attribute_names.any(|name| self.depends_on.iter().any(|dep| dep == name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    /// Effective date, unix epoch milliseconds.
    #[serde(rename = "dataAprovacao")]
    pub approved_at: i64,
    #[serde(rename = "regras", default)]
    pub rules: Vec<Rule>,
}

impl Resolution {
    pub fn new(id: impl Into<String>, name: impl Into<String>, approved_at: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            approved_at,
            rules: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)
    }
}
