//! Validation schema types.
//!
//! [`FieldRules`] is the declarative, deserializable form of a field's rules
//! as it appears in configuration. [`Schema::compile`] turns a set of them
//! into immutable [`RuleSet`]s with patterns compiled and custom predicates
//! resolved, so every configuration mistake surfaces at startup.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::predicates::{Predicate, PredicateRegistry};

/// Programmer/configuration errors raised by the validation layer.
///
/// These are never returned to end users as field messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Field '{0}' is not declared in the validation schema")]
    UnknownField(String),

    #[error("Field '{field}' references unknown custom rule '{predicate}'")]
    UnknownPredicate { field: String, predicate: String },

    #[error("Field '{field}' has an invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("Field '{field}' has min_length {min} greater than max_length {max}")]
    InvertedLengthBounds {
        field: String,
        min: usize,
        max: usize,
    },
}

/// Expected runtime type of a submitted value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
}

impl FieldType {
    /// Check whether a JSON value has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Declarative rules for one field, as written in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldRules {
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
    /// Name of a predicate in the [`PredicateRegistry`].
    #[serde(default)]
    pub custom: Option<String>,
}

#[cfg(test)]
impl FieldRules {
    /// Rules for an optional string field with no further constraints.
    pub fn string() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn custom(mut self, name: impl Into<String>) -> Self {
        self.custom = Some(name.into());
        self
    }
}

/// A custom predicate resolved from the registry, kept with its name for logs.
#[derive(Clone)]
pub struct NamedPredicate {
    pub name: String,
    pub check: Predicate,
}

impl std::fmt::Debug for NamedPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NamedPredicate").field(&self.name).finish()
    }
}

/// Compiled, immutable rules for one field.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub required: bool,
    pub kind: FieldType,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub custom: Option<NamedPredicate>,
}

impl RuleSet {
    fn compile(
        field: &str,
        rules: FieldRules,
        registry: &PredicateRegistry,
    ) -> Result<Self, SchemaError> {
        if let (Some(min), Some(max)) = (rules.min_length, rules.max_length) {
            if min > max {
                return Err(SchemaError::InvertedLengthBounds {
                    field: field.to_string(),
                    min,
                    max,
                });
            }
        }

        let pattern = rules
            .pattern
            .map(|p| {
                Regex::new(&p).map_err(|e| SchemaError::InvalidPattern {
                    field: field.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let custom = rules
            .custom
            .map(|name| match registry.get(&name) {
                Some(check) => Ok(NamedPredicate { name, check }),
                None => Err(SchemaError::UnknownPredicate {
                    field: field.to_string(),
                    predicate: name,
                }),
            })
            .transpose()?;

        Ok(Self {
            required: rules.required,
            kind: rules.kind,
            min_length: rules.min_length,
            max_length: rules.max_length,
            pattern,
            custom,
        })
    }
}

/// Immutable mapping of field name to compiled rules.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, RuleSet>,
}

impl Schema {
    /// Compile declarative field rules against a predicate registry.
    pub fn compile<I, K>(rules: I, registry: &PredicateRegistry) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, FieldRules)>,
        K: Into<String>,
    {
        let mut fields = BTreeMap::new();
        for (name, field_rules) in rules {
            let name = name.into();
            let compiled = RuleSet::compile(&name, field_rules, registry)?;
            fields.insert(name, compiled);
        }
        Ok(Self { fields })
    }

    /// Rules for a field, if declared.
    pub fn get(&self, field: &str) -> Option<&RuleSet> {
        self.fields.get(field)
    }

    /// Iterate over declared fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &RuleSet)> {
        self.fields.iter().map(|(name, rules)| (name.as_str(), rules))
    }
}
