//! Scalar field value used by scores and activity reports.

use crate::model::ValidationError;
use serde::{Deserialize, Serialize};

/// Tagged scalar holding exactly one payload.
///
/// Encoded as a single-key object: `{"string": "x"}`, `{"logico": true}` or
/// `{"real": 1.5}`.
///
/// # Invariants
/// - Equality is structural: payload kind first, then payload. A text value
///   never equals a numeric or boolean one, whatever the payloads look like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "string")]
    Text(String),
    #[serde(rename = "logico")]
    Bool(bool),
    #[serde(rename = "real")]
    Number(f64),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Rejects NaN and infinities, which would be stored as `null`.
    pub fn ensure_finite(&self, field: &str) -> Result<(), ValidationError> {
        match self {
            Self::Number(value) if !value.is_finite() => {
                Err(ValidationError::NonFiniteNumber(field.to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use crate::model::ValidationError;

    #[test]
    fn text_never_equals_number_or_bool() {
        assert_ne!(Value::text("0"), Value::Number(0.0));
        assert_ne!(Value::text("false"), Value::Bool(false));
        assert_ne!(Value::Bool(false), Value::Number(0.0));
    }

    #[test]
    fn text_mismatch_is_decisive() {
        assert_ne!(Value::text("a"), Value::text("b"));
        assert_eq!(Value::text("a"), Value::text("a"));
    }

    #[test]
    fn wire_shape_is_single_key_object() {
        let json = serde_json::to_value(Value::Number(2.5)).unwrap();
        assert_eq!(json, serde_json::json!({ "real": 2.5 }));

        let json = serde_json::to_value(Value::text("x")).unwrap();
        assert_eq!(json, serde_json::json!({ "string": "x" }));

        let decoded: Value = serde_json::from_value(serde_json::json!({ "logico": true })).unwrap();
        assert_eq!(decoded.as_bool(), Some(true));
    }

    #[test]
    fn ensure_finite_rejects_nan_and_infinities() {
        assert!(Value::Number(12.874560591713891).ensure_finite("media").is_ok());
        assert!(Value::text("NaN").ensure_finite("media").is_ok());
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                Value::Number(bad).ensure_finite("media"),
                Err(ValidationError::NonFiniteNumber("media".to_string()))
            );
        }
    }
}
