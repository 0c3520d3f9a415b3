//! Domain model for tracked relationships.
//!
//! # Responsibility
//! - Define the canonical records used by core business logic.
//! - Own the closed conversation-category enumeration and its single
//!   label mapping table.
//!
//! # Invariants
//! - Identifiers are storage-assigned integers, immutable after insert.
//! - `Person::last_contact_time == 0` means "never contacted".

pub mod conversation;
pub mod person;
