//! Field-by-field evaluation of submitted form data against a [`Schema`].
//!
//! Within a field, rules are checked in a fixed order. Structural rules
//! (type, length, custom predicate) accumulate; if any of them fail, the
//! pattern is not consulted for that field. The pattern runs last and only
//! on values that passed everything else. Fields are independent of each
//! other.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};

use super::schema::{FieldType, RuleSet, Schema, SchemaError};

/// Which length bound a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthBound {
    Min(usize),
    Max(usize),
}

/// A single user-facing rule failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingRequiredField,
    TypeMismatch(FieldType),
    LengthViolation(LengthBound),
    CustomRuleViolation(String),
    PatternMismatch,
}

impl Violation {
    /// Render the message shown to end users for a field with this label.
    pub fn message(&self, label: &str) -> String {
        match self {
            Violation::MissingRequiredField => format!("{} is required.", label),
            Violation::TypeMismatch(kind) => format!("{} must be a {}.", label, kind),
            Violation::LengthViolation(LengthBound::Min(min)) => {
                format!("{} must be at least {} characters long.", label, min)
            }
            Violation::LengthViolation(LengthBound::Max(max)) => {
                format!("{} cannot be more than {} characters long.", label, max)
            }
            Violation::CustomRuleViolation(message) => message.clone(),
            Violation::PatternMismatch => format!("Invalid {}", label),
        }
    }
}

/// Outcome of validating one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    errors: BTreeMap<String, String>,
}

impl Verdict {
    /// True when no field produced a message.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Field name to message, for failing fields only.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// `Ok(())` when valid, otherwise the error map.
    pub fn into_result(self) -> Result<(), BTreeMap<String, String>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Validate the fields present in `data`.
///
/// Fields declared in the schema but absent from `data` are not checked.
/// A key in `data` that the schema does not declare is a programmer error
/// and aborts with [`SchemaError::UnknownField`].
pub fn validate(schema: &Schema, data: &Map<String, Value>) -> Result<Verdict, SchemaError> {
    let mut errors = BTreeMap::new();

    for (field, value) in data {
        let rules = schema
            .get(field)
            .ok_or_else(|| SchemaError::UnknownField(field.clone()))?;

        if let Some(message) = evaluate_field(&field_label(field), rules, value) {
            errors.insert(field.clone(), message);
        }
    }

    Ok(Verdict { errors })
}

/// Validate a full record: required schema fields missing from `data` are
/// treated as explicitly null before running [`validate`].
pub fn validate_complete(
    schema: &Schema,
    data: &Map<String, Value>,
) -> Result<Verdict, SchemaError> {
    let mut complete = data.clone();
    for (field, rules) in schema.fields() {
        if rules.required && !complete.contains_key(field) {
            complete.insert(field.to_string(), Value::Null);
        }
    }
    validate(schema, &complete)
}

fn evaluate_field(label: &str, rules: &RuleSet, value: &Value) -> Option<String> {
    if value.is_null() {
        return rules
            .required
            .then(|| Violation::MissingRequiredField.message(label));
    }

    let mut violations = Vec::new();

    if !rules.kind.matches(value) {
        violations.push(Violation::TypeMismatch(rules.kind));
    }

    // Length and custom rules only apply to text.
    if let Some(text) = value.as_str() {
        let length = text.chars().count();

        if let Some(min) = rules.min_length {
            if length < min {
                violations.push(Violation::LengthViolation(LengthBound::Min(min)));
            }
        }

        if let Some(max) = rules.max_length {
            if length > max {
                violations.push(Violation::LengthViolation(LengthBound::Max(max)));
            }
        }

        if let Some(custom) = &rules.custom {
            if let Err(message) = (custom.check)(text) {
                tracing::debug!(rule = %custom.name, "Custom rule rejected value");
                violations.push(Violation::CustomRuleViolation(message));
            }
        }
    }

    if !violations.is_empty() {
        let messages: Vec<String> = violations.iter().map(|v| v.message(label)).collect();
        return Some(messages.join("\n"));
    }

    match (&rules.pattern, value.as_str()) {
        (Some(pattern), Some(text)) if !matches_at_start(pattern, text) => {
            Some(Violation::PatternMismatch.message(label))
        }
        _ => None,
    }
}

/// Match anchored at the start of the value, unanchored at the end.
fn matches_at_start(pattern: &Regex, text: &str) -> bool {
    pattern.find(text).is_some_and(|m| m.start() == 0)
}

/// Display form of a field name: first letter upper-cased, the rest lower-cased.
fn field_label(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
