//! Report type ("tipo") schema and its attributes.

use crate::model::{require, ValidationError};
use serde::{Deserialize, Serialize};

/// Primitive kind of one report attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Real,
    Boolean,
    Text,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "tipo")]
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }
}

/// Schema of activity report entries sharing one type code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportType {
    /// Type code; matches `ActivityReport::kind` of conforming entries.
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "atributos", default)]
    pub attributes: Vec<Attribute>,
}

impl ReportType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            attributes: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|attribute| attribute.name.as_str())
    }
}
