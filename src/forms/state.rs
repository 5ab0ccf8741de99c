/// Immutable form snapshot and its transitions
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{FieldValue, FormErrors, FormValues};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormState {
    pub values: FormValues,
    pub errors: FormErrors,
    pub touched: BTreeSet<String>,
    pub is_submitting: bool,
}

impl FormState {
    pub fn new(values: FormValues) -> Self {
        FormState {
            values,
            ..FormState::default()
        }
    }

    /// Overwrite one value; any stored error for the field is dropped
    pub fn with_value(&self, field: &str, value: FieldValue) -> Self {
        let mut next = self.clone();
        next.values.insert(field.to_string(), value);
        next.errors.remove(field);
        next
    }

    pub fn with_touched(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.touched.insert(field.to_string());
        next
    }

    pub fn with_all_touched(&self) -> Self {
        let mut next = self.clone();
        next.touched.extend(self.values.keys().cloned());
        next
    }

    /// Store or clear a single field's error
    pub fn with_field_error(&self, field: &str, error: Option<String>) -> Self {
        let mut next = self.clone();
        match error {
            Some(message) if self.values.contains_key(field) => {
                next.errors.insert(field.to_string(), message);
            }
            _ => {
                next.errors.remove(field);
            }
        }
        next
    }

    /// Replace every error. Entries for unknown fields are dropped.
    pub fn with_errors(&self, errors: FormErrors) -> Self {
        let mut next = self.clone();
        next.errors = errors
            .into_iter()
            .filter(|(field, _)| self.values.contains_key(field))
            .collect();
        next
    }

    pub fn with_submitting(&self, is_submitting: bool) -> Self {
        FormState {
            is_submitting,
            ..self.clone()
        }
    }

    /// Stored error, surfaced only once the field has been touched
    pub fn field_error(&self, field: &str) -> Option<&str> {
        if !self.touched.contains(field) {
            return None;
        }
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
