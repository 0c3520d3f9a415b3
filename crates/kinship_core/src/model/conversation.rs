//! Conversation domain model and category enumeration.
//!
//! # Responsibility
//! - Define the logged-interaction record.
//! - Centralize the label<->category mapping table used by both the
//!   live-add path and CSV import.
//!
//! # Invariants
//! - `person_id` references an existing person at insert time
//!   (enforced by the storage foreign key).
//! - Unrecognized or absent labels always map to `Casual`.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};

/// Storage-assigned identifier for a conversation row.
pub type ConversationId = i64;

/// Closed classification for a logged interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationCategory {
    Emotional,
    Practical,
    Validation,
    Share,
    Information,
    Casual,
}

/// Single source of truth for display-label <-> category pairs.
///
/// Both `TrackerService::add_conversation` and the CSV import path go
/// through this table; keeping one copy prevents the mapping drift
/// seen across historical revisions.
const CATEGORY_LABELS: [(ConversationCategory, &str); 6] = [
    (ConversationCategory::Emotional, "Emotional"),
    (ConversationCategory::Practical, "Practical"),
    (ConversationCategory::Validation, "Validation"),
    (ConversationCategory::Share, "Share"),
    (ConversationCategory::Information, "Information"),
    (ConversationCategory::Casual, "Casual"),
];

impl ConversationCategory {
    /// All categories in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Emotional,
        Self::Practical,
        Self::Validation,
        Self::Share,
        Self::Information,
        Self::Casual,
    ];

    /// Maps a display label to its category.
    ///
    /// Unrecognized labels (including the empty string) map to
    /// `Casual`. Matching is exact; no trimming or case folding.
    pub fn from_label(label: &str) -> Self {
        CATEGORY_LABELS
            .iter()
            .find(|(_, name)| *name == label)
            .map(|(category, _)| *category)
            .unwrap_or(Self::Casual)
    }

    /// Returns the display label ("Emotional", "Casual", ...).
    pub fn label(self) -> &'static str {
        CATEGORY_LABELS
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, name)| *name)
            .unwrap_or("Casual")
    }

    /// Returns the storage/enumeration name ("EMOTIONAL", ...).
    ///
    /// This is also the rendering used by CSV export.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Emotional => "EMOTIONAL",
            Self::Practical => "PRACTICAL",
            Self::Validation => "VALIDATION",
            Self::Share => "SHARE",
            Self::Information => "INFORMATION",
            Self::Casual => "CASUAL",
        }
    }

    /// Parses a storage/enumeration name back into a category.
    pub fn parse_db_str(value: &str) -> Option<Self> {
        match value {
            "EMOTIONAL" => Some(Self::Emotional),
            "PRACTICAL" => Some(Self::Practical),
            "VALIDATION" => Some(Self::Validation),
            "SHARE" => Some(Self::Share),
            "INFORMATION" => Some(Self::Information),
            "CASUAL" => Some(Self::Casual),
            _ => None,
        }
    }
}

/// A single logged interaction with a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Storage-assigned id; `0` on records not yet inserted.
    pub id: ConversationId,
    pub person_id: PersonId,
    pub content: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub category: ConversationCategory,
    /// Display label stored redundantly alongside `category` for
    /// import compatibility; `None` when never provided.
    pub tag: Option<String>,
}

impl Conversation {
    /// Creates a not-yet-persisted conversation.
    pub fn new(
        person_id: PersonId,
        content: impl Into<String>,
        timestamp: i64,
        category: ConversationCategory,
        tag: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            person_id,
            content: content.into(),
            timestamp,
            category,
            tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Conversation, ConversationCategory};
    use serde_json::json;

    #[test]
    fn every_label_round_trips_through_the_mapping_table() {
        for category in ConversationCategory::ALL {
            assert_eq!(ConversationCategory::from_label(category.label()), category);
        }
    }

    #[test]
    fn unknown_and_empty_labels_fall_back_to_casual() {
        assert_eq!(
            ConversationCategory::from_label("Gossip"),
            ConversationCategory::Casual
        );
        assert_eq!(
            ConversationCategory::from_label(""),
            ConversationCategory::Casual
        );
        // Exact matching only; case variants are unrecognized.
        assert_eq!(
            ConversationCategory::from_label("emotional"),
            ConversationCategory::Casual
        );
    }

    #[test]
    fn conversation_wire_shape_is_stable() {
        let conversation = Conversation::new(
            7,
            "caught up",
            1_700_000_000_000,
            ConversationCategory::Emotional,
            Some("Emotional".to_string()),
        );

        let value = serde_json::to_value(&conversation).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 0,
                "person_id": 7,
                "content": "caught up",
                "timestamp": 1_700_000_000_000_i64,
                "category": "emotional",
                "tag": "Emotional",
            })
        );

        let back: Conversation = serde_json::from_value(value).unwrap();
        assert_eq!(back, conversation);
    }

    #[test]
    fn db_names_round_trip() {
        for category in ConversationCategory::ALL {
            assert_eq!(
                ConversationCategory::parse_db_str(category.as_db_str()),
                Some(category)
            );
        }
        assert_eq!(ConversationCategory::parse_db_str("Emotional"), None);
    }
}
