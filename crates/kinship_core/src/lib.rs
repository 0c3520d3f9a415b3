//! Core domain logic for Kinship, a personal relationship tracker.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod interchange;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod watch;

pub use interchange::{
    export_csv, export_csv_to_path, import_csv, import_csv_from_path, ImportSummary,
    InterchangeError, InterchangeResult,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::conversation::{Conversation, ConversationCategory, ConversationId};
pub use model::person::{Person, PersonId};
pub use repo::conversation_repo::{
    CategoryStats, ConversationRepository, ConversationWithPerson, SqliteConversationRepository,
};
pub use repo::person_repo::{PersonRepository, SqlitePersonRepository};
pub use repo::{RepoError, RepoResult};
pub use service::sort::{parse_sort_key, sort_persons, PersonSortKey};
pub use service::tracker_service::TrackerService;
pub use watch::{QueryHub, SubscriptionId};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
