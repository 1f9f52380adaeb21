//! Action boundary helpers shared by every transport.
//!
//! # Responsibility
//! - Convert service results into the uniform `{success, data}` /
//!   `{error}` envelope.
//! - Parse loosely typed form fields.
//!
//! # Invariants
//! - A failed action never carries data; a successful one never carries an
//!   error.

use crate::logging::sanitize_message;
use crate::model::tag::normalize_tags;
use log::warn;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::Display;

const MAX_LOGGED_ERROR_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult<T> {
    Success(T),
    Failure(String),
}

impl<T> ActionResult<T> {
    /// Wraps a result, logging failures under `action`.
    pub fn from_result<E: Display>(action: &'static str, result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(err) => {
                let message = err.to_string();
                warn!(
                    "event=action_failed module=action status=error action={action} error={}",
                    sanitize_message(&message, MAX_LOGGED_ERROR_CHARS)
                );
                Self::Failure(message)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            Self::Success(data) => ActionResult::Success(f(data)),
            Self::Failure(message) => ActionResult::Failure(message),
        }
    }
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(data) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
                map.end()
            }
            Self::Failure(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

/// Accepts either a JSON string array or comma-separated text.
pub fn parse_tags_field(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(tags) = serde_json::from_str::<Vec<String>>(trimmed) {
            return normalize_tags(&tags);
        }
    }
    let parts = trimmed.split(',').map(str::to_string).collect::<Vec<_>>();
    normalize_tags(&parts)
}
