//! Recipient and identity types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One addressee of a batch, built from a single table row
///
/// Cells are trimmed at ingestion. `email` may be empty or malformed here;
/// the dispatch loop decides whether the recipient is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recipient {
    /// Salutation, e.g. "Dr" (may be empty)
    pub title: String,

    /// Display name (may be empty)
    pub name: String,

    /// Destination address
    pub email: String,
}

impl Recipient {
    pub fn new(title: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Operator submitting a batch
///
/// Passed explicitly with every batch and copied into each delivery record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderIdentity {
    user_name: String,
}

impl SenderIdentity {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }
}

impl fmt::Display for SenderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_name)
    }
}

/// Opaque identifier shared by all delivery records of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    /// Generate a fresh random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
