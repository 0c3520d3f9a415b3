//! Person domain model.
//!
//! # Responsibility
//! - Define the tracked-contact record shared by all read/write paths.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and never reused.
//! - `last_contact_time` is epoch milliseconds; `0` means "never
//!   contacted".

use serde::{Deserialize, Serialize};

/// Storage-assigned identifier for a person row.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PersonId = i64;

/// A tracked relationship/contact.
///
/// `category` is a free-text grouping label chosen by the user; the
/// empty string means "uncategorized". It is unrelated to
/// [`ConversationCategory`](crate::model::conversation::ConversationCategory),
/// which classifies individual interactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Storage-assigned id; `0` on records not yet inserted.
    pub id: PersonId,
    pub name: String,
    /// Free text, empty when unset.
    pub impression: String,
    /// Free text, empty when unset.
    pub interests: String,
    /// Free text, empty when unset.
    pub goals: String,
    /// Free-text grouping label; empty string means uncategorized.
    pub category: String,
    /// Epoch milliseconds of the most recent conversation; `0` when
    /// never contacted.
    pub last_contact_time: i64,
}

impl Person {
    /// Creates a not-yet-persisted person with no contact history.
    pub fn new(
        name: impl Into<String>,
        impression: impl Into<String>,
        interests: impl Into<String>,
        goals: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            impression: impression.into(),
            interests: interests.into(),
            goals: goals.into(),
            category: category.into(),
            last_contact_time: 0,
        }
    }

    /// Returns whether any conversation has ever been recorded.
    pub fn has_contact_history(&self) -> bool {
        self.last_contact_time != 0
    }
}
