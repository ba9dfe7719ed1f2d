//! Declarative form schemas and the generic routine that evaluates them.
//!
//! A schema is an ordered slice of [`FieldSpec`]s. Evaluating it against raw
//! submitted values yields a [`FormView`]: the values echoed back in schema
//! order, each annotated with the first rule it failed. Fields absent from the
//! schema are dropped, so clients cannot smuggle extra columns in.

use std::collections::HashMap;

use serde::Serialize;

/// Input widget kind, used by clients to render the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Float,
    Integer,
}

/// A single validation rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Value must contain something other than whitespace.
    NotEmpty,
    /// Finite float with `min <= v <= max`.
    FloatInRange { min: f64, max: f64 },
    /// Integer with `min <= v < max`.
    IntInRange { min: i64, max: i64 },
}

impl Rule {
    /// Check a trimmed raw value, returning the error message on failure.
    pub fn check(&self, value: &str) -> Result<(), String> {
        match *self {
            Rule::NotEmpty => {
                if value.is_empty() {
                    Err("Enter a value".into())
                } else {
                    Ok(())
                }
            }
            Rule::FloatInRange { min, max } => match value.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= min && v <= max => Ok(()),
                _ => Err(format!("Enter a number between {min} and {max}")),
            },
            Rule::IntInRange { min, max } => match value.parse::<i64>() {
                Ok(v) if v >= min && v < max => Ok(()),
                _ => Err(format!("Enter an integer between {min} and {}", max - 1)),
            },
        }
    }
}

/// Declaration of one form field and the rules it must satisfy, in order.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
}

/// One rendered field: its current value and, after a rejected post, its error.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct FormField {
    #[schema(example = "species_name")]
    pub name: String,
    #[schema(example = "Species")]
    pub label: String,
    pub kind: FieldKind,
    #[schema(example = "Sparrow")]
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Enter a value")]
    pub error: Option<String>,
}

/// A form ready to be rendered: blank, pre-filled from a record, or echoed back
/// after validation.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct FormView {
    /// True when every field passed its rules.
    pub accepted: bool,
    pub fields: Vec<FormField>,
}

impl FormView {
    /// Empty form for inserts.
    pub fn blank(schema: &[FieldSpec]) -> Self {
        Self::prefilled(schema, |_| String::new())
    }

    /// Form pre-filled with current values, e.g. from a stored record.
    pub fn prefilled(schema: &[FieldSpec], value_of: impl Fn(&str) -> String) -> Self {
        let fields = schema
            .iter()
            .map(|spec| FormField {
                name: spec.name.to_string(),
                label: spec.label.to_string(),
                kind: spec.kind,
                value: value_of(spec.name),
                error: None,
            })
            .collect();
        Self {
            accepted: false,
            fields,
        }
    }

    /// Value of a field by name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Error annotation of a field by name.
    pub fn error(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.error.as_deref())
    }
}

/// Evaluate `schema` against submitted values.
///
/// Values are trimmed before checking and echoed back trimmed. Each field
/// reports only the first rule it fails. A missing field is treated as empty.
pub fn validate(schema: &[FieldSpec], submitted: &HashMap<String, String>) -> FormView {
    let mut accepted = true;
    let fields = schema
        .iter()
        .map(|spec| {
            let value = submitted
                .get(spec.name)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            let error = spec.rules.iter().find_map(|rule| rule.check(&value).err());
            if error.is_some() {
                accepted = false;
            }
            FormField {
                name: spec.name.to_string(),
                label: spec.label.to_string(),
                kind: spec.kind,
                value,
                error,
            }
        })
        .collect();

    FormView { accepted, fields }
}
