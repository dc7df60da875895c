//! Partial update payloads.

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while validating a client payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The update carries no field at all.
    #[error("no fields to update")]
    Empty,

    /// The field is not one of the updatable task fields.
    #[error("unknown field name {0}")]
    UnknownField(String),

    /// The value cannot be coerced to a string.
    #[error("value for field {0} not castable to string")]
    NotAString(String),

    /// A required value is empty.
    #[error("field {0} is required")]
    EmptyValue(&'static str),
}

/// Task fields a client may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Description,
    Status,
}

impl TaskField {
    /// Column / document key used by every backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskField {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "description" => Ok(Self::Description),
            "status" => Ok(Self::Status),
            other => Err(PayloadError::UnknownField(other.to_string())),
        }
    }
}

/// A validated, ordered set of field changes.
///
/// Each field appears at most once; setting a field twice keeps its first
/// position and the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    changes: Vec<(TaskField, String)>,
}

impl TaskUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description.
    pub fn description(self, value: impl Into<String>) -> Self {
        self.with(TaskField::Description, value)
    }

    /// Sets the status.
    pub fn status(self, value: impl Into<String>) -> Self {
        self.with(TaskField::Status, value)
    }

    /// Sets an arbitrary field.
    pub fn with(mut self, field: TaskField, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.changes.iter_mut().find(|(f, _)| *f == field) {
            Some(change) => change.1 = value,
            None => self.changes.push((field, value)),
        }
        self
    }

    /// Returns the changes in the order they were given.
    pub fn changes(&self) -> &[(TaskField, String)] {
        &self.changes
    }

    /// Returns the names of the changed fields.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.changes.iter().map(|(f, _)| f.as_str()).collect()
    }

    /// Returns the new value of `field`, if it is part of this update.
    pub fn get(&self, field: TaskField) -> Option<&str> {
        self.changes
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Checks the update is non-empty and that no value is blank.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.changes.is_empty() {
            return Err(PayloadError::Empty);
        }
        if let Some((field, _)) = self.changes.iter().find(|(_, v)| v.is_empty()) {
            return Err(PayloadError::EmptyValue(field.as_str()));
        }
        Ok(())
    }
}

impl TryFrom<Map<String, Value>> for TaskUpdate {
    type Error = PayloadError;

    fn try_from(body: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut update = TaskUpdate::new();
        for (key, value) in body {
            let field: TaskField = key.parse()?;
            let Value::String(value) = value else {
                return Err(PayloadError::NotAString(key));
            };
            update = update.with(field, value);
        }
        update.validate()?;
        Ok(update)
    }
}
