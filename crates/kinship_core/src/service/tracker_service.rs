//! Relationship-tracking use-case service.
//!
//! # Responsibility
//! - Provide the single point of mutation enforcing cross-entity
//!   consistency (conversation writes keep person bookkeeping current).
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - `add_conversation` overwrites the owning person's
//!   `last_contact_time` with the new conversation's timestamp; the
//!   latest add wins even when its timestamp is older than the stored
//!   value. CSV import uses max semantics instead; the two policies
//!   are deliberately kept distinct.
//! - `delete_conversation` leaves `last_contact_time` untouched.
//! - Service layer remains storage-agnostic.

use crate::model::conversation::{Conversation, ConversationCategory, ConversationId};
use crate::model::person::{Person, PersonId};
use crate::repo::conversation_repo::{CategoryStats, ConversationRepository, ConversationWithPerson};
use crate::repo::person_repo::PersonRepository;
use crate::repo::RepoResult;
use log::{debug, info};

/// Use-case service owning both repositories.
pub struct TrackerService<P: PersonRepository, C: ConversationRepository> {
    persons: P,
    conversations: C,
    /// Whether `update_conversation` re-applies the last-contact
    /// overwrite. Historical revisions disagree on this step, so it
    /// stays configurable.
    refresh_last_contact_on_update: bool,
}

impl<P: PersonRepository, C: ConversationRepository> TrackerService<P, C> {
    /// Creates a service using the provided repository implementations.
    pub fn new(persons: P, conversations: C) -> Self {
        Self {
            persons,
            conversations,
            refresh_last_contact_on_update: true,
        }
    }

    /// Disables or re-enables last-contact bookkeeping on
    /// `update_conversation`.
    pub fn with_update_refresh(mut self, enabled: bool) -> Self {
        self.refresh_last_contact_on_update = enabled;
        self
    }

    /// Adds a person with no contact history.
    pub fn add_person(
        &self,
        name: impl Into<String>,
        impression: impl Into<String>,
        interests: impl Into<String>,
        goals: impl Into<String>,
        category: impl Into<String>,
    ) -> RepoResult<PersonId> {
        let person = Person::new(name, impression, interests, goals, category);
        let id = self.persons.insert(&person)?;
        info!("event=person_add module=service status=ok person_id={id}");
        Ok(id)
    }

    /// Full-record replace by id; reports `NotFound` for absent ids.
    pub fn update_person(&self, person: &Person) -> RepoResult<()> {
        self.persons.update(person)
    }

    /// Removes a person; the storage cascade removes all owned
    /// conversations. Absent ids are a no-op.
    pub fn delete_person(&self, id: PersonId) -> RepoResult<()> {
        self.persons.delete(id)?;
        info!("event=person_delete module=service status=ok person_id={id}");
        Ok(())
    }

    pub fn person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.persons.get(id)
    }

    /// All persons, most recently contacted first.
    pub fn persons(&self) -> RepoResult<Vec<Person>> {
        self.persons.list_all()
    }

    /// Persons filtered by category labels; an empty set returns all.
    pub fn persons_by_categories(&self, categories: &[String]) -> RepoResult<Vec<Person>> {
        self.persons.list_by_categories(categories)
    }

    /// Logs a conversation and refreshes the owning person's
    /// last-contact bookkeeping.
    ///
    /// The tag label is mapped to a category through the central
    /// mapping table; unrecognized or absent labels become `Casual`,
    /// and the stored tag falls back to `"Casual"` when absent.
    pub fn add_conversation(
        &self,
        person_id: PersonId,
        content: impl Into<String>,
        tag_label: Option<&str>,
        timestamp: i64,
    ) -> RepoResult<ConversationId> {
        let label = tag_label.unwrap_or("Casual");
        let conversation = Conversation::new(
            person_id,
            content,
            timestamp,
            ConversationCategory::from_label(label),
            Some(label.to_string()),
        );

        let id = self.conversations.insert(&conversation)?;
        self.overwrite_last_contact(person_id, timestamp)?;
        info!(
            "event=conversation_add module=service status=ok conversation_id={id} person_id={person_id} category={}",
            conversation.category.as_db_str()
        );
        Ok(id)
    }

    /// Full-record replace by id; reports `NotFound` for absent ids.
    ///
    /// When update refresh is enabled, applies the same last-contact
    /// overwrite as `add_conversation`.
    pub fn update_conversation(&self, conversation: &Conversation) -> RepoResult<()> {
        self.conversations.update(conversation)?;
        if self.refresh_last_contact_on_update {
            self.overwrite_last_contact(conversation.person_id, conversation.timestamp)?;
        }
        Ok(())
    }

    /// Removes a conversation by id; absent ids are a no-op.
    ///
    /// The owning person's `last_contact_time` is not recomputed and
    /// may go stale when the most recent conversation is deleted.
    pub fn delete_conversation(&self, id: ConversationId) -> RepoResult<()> {
        self.conversations.delete(id)?;
        debug!("event=conversation_delete module=service status=ok conversation_id={id}");
        Ok(())
    }

    pub fn conversation(&self, id: ConversationId) -> RepoResult<Option<Conversation>> {
        self.conversations.get(id)
    }

    /// Conversations for one person, newest first, optionally
    /// restricted to one tag.
    pub fn conversations_for_person(
        &self,
        person_id: PersonId,
        tag: Option<&str>,
    ) -> RepoResult<Vec<Conversation>> {
        self.conversations.list_for_person(person_id, tag)
    }

    /// All conversations, newest first, optionally restricted to one
    /// tag.
    pub fn all_conversations(&self, tag: Option<&str>) -> RepoResult<Vec<Conversation>> {
        self.conversations.list_all(tag)
    }

    /// Joined variant carrying the owning person's name.
    pub fn conversations_with_person(
        &self,
        person_id: PersonId,
        tag: Option<&str>,
    ) -> RepoResult<Vec<ConversationWithPerson>> {
        self.conversations.list_for_person_with_person(person_id, tag)
    }

    /// Joined variant over all conversations.
    pub fn all_conversations_with_person(
        &self,
        tag: Option<&str>,
    ) -> RepoResult<Vec<ConversationWithPerson>> {
        self.conversations.list_all_with_person(tag)
    }

    /// Conversation counts grouped by category for one person.
    pub fn stats_for_person(&self, person_id: PersonId) -> RepoResult<CategoryStats> {
        self.conversations.stats_for_person(person_id)
    }

    /// Global conversation counts grouped by category.
    pub fn overall_stats(&self) -> RepoResult<CategoryStats> {
        self.conversations.stats_all()
    }

    /// Overwrite policy: the timestamp of the write that just happened
    /// wins unconditionally. Skips silently when the person vanished
    /// between the conversation write and this read-back.
    fn overwrite_last_contact(&self, person_id: PersonId, timestamp: i64) -> RepoResult<()> {
        if let Some(mut person) = self.persons.get(person_id)? {
            person.last_contact_time = timestamp;
            self.persons.update(&person)?;
        }
        Ok(())
    }
}
