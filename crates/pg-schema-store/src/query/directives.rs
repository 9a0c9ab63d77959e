//! Per-statement directives: field overrides and upsert conflict handling.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-field directive applied when building a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOverride {
    /// Leave the field out of the statement.
    Omit,
    /// Use the server's current timestamp (`now()`). Date fields only.
    Now,
}

/// Field overrides keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    fields: HashMap<String, FieldOverride>,
}

impl Overrides {
    /// No overrides.
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn omit(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), FieldOverride::Omit);
        self
    }

    #[must_use]
    pub fn now(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), FieldOverride::Now);
        self
    }

    pub fn get(&self, field: &str) -> Option<FieldOverride> {
        self.fields.get(field).copied()
    }

    pub fn is_omitted(&self, field: &str) -> bool {
        self.get(field) == Some(FieldOverride::Omit)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldOverride)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// How a conflicting row is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Overwrite every non-key column with the incoming value.
    Replace,
    /// Keep existing non-null values, fill nulls from the incoming row.
    ReplaceIfNull,
    /// Keep the existing row untouched.
    Ignore,
}

/// Conflict key plus the policy applied when it collides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertDirective {
    /// Field names (not columns) identifying a row, in key order.
    pub conflict_key: Vec<String>,
    pub policy: ConflictPolicy,
}

impl UpsertDirective {
    pub fn new<I, S>(conflict_key: I, policy: ConflictPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            conflict_key: conflict_key.into_iter().map(Into::into).collect(),
            policy,
        }
    }

    pub fn replace<I, S>(conflict_key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(conflict_key, ConflictPolicy::Replace)
    }

    pub fn replace_if_null<I, S>(conflict_key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(conflict_key, ConflictPolicy::ReplaceIfNull)
    }

    pub fn ignore<I, S>(conflict_key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(conflict_key, ConflictPolicy::Ignore)
    }
}
