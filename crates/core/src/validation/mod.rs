//! Field-level input validation.
//!
//! Request bodies are validated in full before any database or payment call,
//! and every failing field is reported rather than just the first. Handlers
//! turn [`ValidationErrors`] into a `422` response listing the fields.
//!
//! ```
//! use modvault_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .length("title", "Hi", 3, 120)
//!     .email("support_email", "nobody@example.com")
//!     .finish();
//!
//! let errors = result.unwrap_err();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors.iter().next().unwrap().field, "title");
//! ```

mod inputs;

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::Email;

pub use inputs::{
    ForumPostInput, ForumThreadInput, ModInput, RoleInput, SiteSettings, TicketInput,
};

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every failing field of an input, in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// A single error, for checks made outside a [`Validator`].
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether `field` has at least one error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when empty.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Input types that can check themselves.
pub trait Validate {
    /// # Errors
    ///
    /// Returns every failing field.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Builder that accumulates field errors.
#[derive(Debug, Default)]
#[must_use]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blank after trimming.
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.errors.push(field, "is required");
        }
        self
    }

    /// Trimmed character count within `min..=max`.
    pub fn length(mut self, field: &str, value: &str, min: usize, max: usize) -> Self {
        let len = value.trim().chars().count();
        if len == 0 && min > 0 {
            self.errors.push(field, "is required");
        } else if len < min {
            self.errors
                .push(field, format!("must be at least {min} characters"));
        } else if len > max {
            self.errors
                .push(field, format!("must be at most {max} characters"));
        }
        self
    }

    /// Like [`Self::length`], but `None` passes.
    pub fn optional_length(
        self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> Self {
        match value {
            Some(v) => self.length(field, v, min, max),
            None => self,
        }
    }

    /// Value within `min..=max`.
    pub fn range(mut self, field: &str, value: Decimal, min: Decimal, max: Decimal) -> Self {
        if value < min || value > max {
            self.errors
                .push(field, format!("must be between {min} and {max}"));
        }
        self
    }

    /// Absolute `http` or `https` URL.
    pub fn url(mut self, field: &str, value: &str) -> Self {
        match url::Url::parse(value.trim()) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(_) => self.errors.push(field, "must be an http or https URL"),
            Err(_) => self.errors.push(field, "must be a valid URL"),
        }
        self
    }

    pub fn email(mut self, field: &str, value: &str) -> Self {
        if let Err(e) = Email::parse(value) {
            self.errors.push(field, e.to_string());
        }
        self
    }

    /// Value is one of `allowed` (case-sensitive).
    pub fn one_of(mut self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            self.errors
                .push(field, format!("must be one of: {}", allowed.join(", ")));
        }
        self
    }

    /// Arbitrary check; `check` returns the message on failure.
    pub fn custom(mut self, field: &str, check: impl FnOnce() -> Option<String>) -> Self {
        if let Some(message) = check() {
            self.errors.push(field, message);
        }
        self
    }

    /// # Errors
    ///
    /// Returns the accumulated errors if any check failed.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }
}
