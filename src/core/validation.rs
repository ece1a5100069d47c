//! Form field validation
//!
//! Errors are collected in submission order so a re-rendered form can list
//! every problem at once.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Form field name
    pub param: String,
    /// Human-readable message
    pub msg: String,
    /// Submitted value (blank for secrets)
    pub value: String,
}

impl FieldError {
    pub fn new(param: impl Into<String>, msg: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            msg: msg.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of field errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether any error names the given field
    pub fn has_field(&self, param: &str) -> bool {
        self.0.iter().any(|e| e.param == param)
    }

    /// Record an error when `value` is blank
    pub fn require(&mut self, param: &str, value: &str, msg: &str) {
        if value.trim().is_empty() {
            self.push(FieldError::new(param, msg, value));
        }
    }

    /// Convert into a result, failing when any error was collected
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.msg.as_str()).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok()
        })
        .as_ref()
}

/// Check that an address has the `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email.trim()))
}
