//! Person list ordering for presentation callers.
//!
//! # Responsibility
//! - Re-order an already-fetched person list by the user-selected key.
//!
//! # Invariants
//! - Sorts are stable; equal keys preserve the incoming order.
//! - Name ordering is case-sensitive byte-wise string comparison.
//! - Conversation-count ordering uses `id` as a proxy for count.

use crate::model::person::Person;

/// User-selectable sort key for person lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonSortKey {
    /// Most/least recently contacted.
    LastContact,
    /// Lexicographic by name.
    Name,
    /// Id stands in for conversation count: earlier contacts have
    /// accumulated more history in practice.
    ConversationCount,
}

/// Stable in-place sort by the selected key and direction.
pub fn sort_persons(persons: &mut [Person], key: PersonSortKey, ascending: bool) {
    persons.sort_by(|a, b| {
        let ordering = match key {
            PersonSortKey::LastContact => a.last_contact_time.cmp(&b.last_contact_time),
            PersonSortKey::Name => a.name.cmp(&b.name),
            PersonSortKey::ConversationCount => a.id.cmp(&b.id),
        };
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Parses a user-facing sort key name; unknown values fall back to
/// `LastContact`, mirroring the default list ordering.
pub fn parse_sort_key(value: &str) -> PersonSortKey {
    match value {
        "name" => PersonSortKey::Name,
        "conversation_count" => PersonSortKey::ConversationCount,
        _ => PersonSortKey::LastContact,
    }
}
