//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple for early-stage UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Return values are UTF-8 strings with stable meaning.

use kinship_core::db::open_db;
use kinship_core::{
    core_version as core_version_inner, export_csv_to_path, import_csv_from_path,
    init_logging as init_logging_inner, parse_sort_key, ping as ping_inner, sort_persons,
    Conversation, ConversationWithPerson, Person, SqliteConversationRepository,
    SqlitePersonRepository, TrackerService,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const TRACKER_DB_FILE_NAME: &str = "kinship.sqlite3";
static TRACKER_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Person record crossing the FFI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonView {
    pub id: i64,
    pub name: String,
    pub impression: String,
    pub interests: String,
    pub goals: String,
    pub category: String,
    pub last_contact_time: i64,
}

/// Conversation record crossing the FFI boundary, carrying the owning
/// person's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationView {
    pub id: i64,
    pub person_id: i64,
    pub person_name: String,
    pub content: String,
    pub timestamp: i64,
    pub category: String,
    pub tag: Option<String>,
}

/// One category bucket in a statistics response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    /// Display label of the category (`Emotional`, `Casual`, ...).
    pub category: String,
    pub count: i64,
}

/// Generic action response envelope for command flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Optional created record ID.
    pub record_id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TrackerActionResponse {
    fn success(message: impl Into<String>, record_id: Option<i64>) -> Self {
        Self {
            ok: true,
            record_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

/// Import outcome envelope mirroring the core batch counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub ok: bool,
    pub imported: u64,
    pub skipped: u64,
    pub persons_created: u64,
    pub message: String,
}

/// Adds a person with no contact history.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the created person ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn person_add(
    name: String,
    impression: String,
    interests: String,
    goals: String,
    category: String,
) -> TrackerActionResponse {
    match with_service(|service| service.add_person(name, impression, interests, goals, category)) {
        Ok(id) => TrackerActionResponse::success("Person added.", Some(id)),
        Err(err) => TrackerActionResponse::failure(format!("person_add failed: {err}")),
    }
}

/// Replaces a person record by ID.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Fails when the ID does not exist.
#[flutter_rust_bridge::frb(sync)]
pub fn person_update(person: PersonView) -> TrackerActionResponse {
    let id = person.id;
    let record = from_person_view(person);
    match with_service(|service| service.update_person(&record)) {
        Ok(()) => TrackerActionResponse::success("Person updated.", Some(id)),
        Err(err) => TrackerActionResponse::failure(format!("person_update failed: {err}")),
    }
}

/// Deletes a person and, through the storage cascade, all of their
/// conversations. Absent IDs are a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn person_delete(id: i64) -> TrackerActionResponse {
    match with_service(|service| service.delete_person(id)) {
        Ok(()) => TrackerActionResponse::success("Person deleted.", Some(id)),
        Err(err) => TrackerActionResponse::failure(format!("person_delete failed: {err}")),
    }
}

/// Lists persons, optionally filtered by category labels and re-sorted
/// by a caller-chosen key.
///
/// Input semantics:
/// - `categories`: empty means no filter.
/// - `sort_key`: `last_contact|name|conversation_count`; unknown values
///   fall back to `last_contact`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; returns an empty list on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn person_list(
    categories: Vec<String>,
    sort_key: String,
    ascending: bool,
) -> Vec<PersonView> {
    let result = with_service(|service| service.persons_by_categories(&categories));
    match result {
        Ok(mut persons) => {
            sort_persons(&mut persons, parse_sort_key(&sort_key), ascending);
            persons.into_iter().map(to_person_view).collect()
        }
        Err(err) => {
            log::warn!("event=person_list module=ffi status=error error={err}");
            Vec::new()
        }
    }
}

/// Logs a conversation against a person.
///
/// Input semantics:
/// - `tag`: free-form label; `None` stores `"Casual"` and maps to the
///   casual category.
/// - `timestamp`: epoch milliseconds; it overwrites the person's
///   last-contact marker unconditionally.
#[flutter_rust_bridge::frb(sync)]
pub fn conversation_add(
    person_id: i64,
    content: String,
    tag: Option<String>,
    timestamp: i64,
) -> TrackerActionResponse {
    match with_service(|service| {
        service.add_conversation(person_id, content, tag.as_deref(), timestamp)
    }) {
        Ok(id) => TrackerActionResponse::success("Conversation added.", Some(id)),
        Err(err) => TrackerActionResponse::failure(format!("conversation_add failed: {err}")),
    }
}

/// Replaces a conversation record by ID and refreshes the owning
/// person's last-contact marker.
#[flutter_rust_bridge::frb(sync)]
pub fn conversation_update(conversation: ConversationView) -> TrackerActionResponse {
    let id = conversation.id;
    let record = from_conversation_view(conversation);
    match with_service(|service| service.update_conversation(&record)) {
        Ok(()) => TrackerActionResponse::success("Conversation updated.", Some(id)),
        Err(err) => TrackerActionResponse::failure(format!("conversation_update failed: {err}")),
    }
}

/// Deletes a conversation. The owning person's last-contact marker is
/// left as-is.
#[flutter_rust_bridge::frb(sync)]
pub fn conversation_delete(id: i64) -> TrackerActionResponse {
    match with_service(|service| service.delete_conversation(id)) {
        Ok(()) => TrackerActionResponse::success("Conversation deleted.", Some(id)),
        Err(err) => TrackerActionResponse::failure(format!("conversation_delete failed: {err}")),
    }
}

/// Lists conversations newest first, optionally scoped to one person
/// and/or one exact tag.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; returns an empty list on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn conversation_list(person_id: Option<i64>, tag: Option<String>) -> Vec<ConversationView> {
    let result = with_service(|service| match person_id {
        Some(person_id) => service.conversations_with_person(person_id, tag.as_deref()),
        None => service.all_conversations_with_person(tag.as_deref()),
    });
    match result {
        Ok(rows) => rows.into_iter().map(to_conversation_view).collect(),
        Err(err) => {
            log::warn!("event=conversation_list module=ffi status=error error={err}");
            Vec::new()
        }
    }
}

/// Conversation counts per category, scoped to one person when
/// `person_id` is set.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; returns an empty list on failure.
/// - Categories with zero conversations are omitted.
#[flutter_rust_bridge::frb(sync)]
pub fn category_stats(person_id: Option<i64>) -> Vec<CategoryCount> {
    let result = with_service(|service| match person_id {
        Some(person_id) => service.stats_for_person(person_id),
        None => service.overall_stats(),
    });
    match result {
        Ok(stats) => stats
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.label().to_string(),
                count,
            })
            .collect(),
        Err(err) => {
            log::warn!("event=category_stats module=ffi status=error error={err}");
            Vec::new()
        }
    }
}

/// Exports the full dataset as CSV to `path`.
#[flutter_rust_bridge::frb(sync)]
pub fn export_database(path: String) -> TrackerActionResponse {
    let result = with_repos(|persons, conversations| {
        export_csv_to_path(persons, conversations, &path).map_err(|err| err.to_string())
    });
    match result {
        Ok(()) => TrackerActionResponse::success("Export complete.", None),
        Err(err) => TrackerActionResponse::failure(format!("export_database failed: {err}")),
    }
}

/// Imports a third-party interaction log from `path`.
///
/// Bad rows are skipped; a wrong header aborts with zero rows written.
#[flutter_rust_bridge::frb(sync)]
pub fn import_interaction_log(path: String) -> ImportResponse {
    let result = with_repos(|persons, conversations| {
        import_csv_from_path(persons, conversations, &path).map_err(|err| err.to_string())
    });
    match result {
        Ok(summary) => ImportResponse {
            ok: true,
            imported: summary.imported as u64,
            skipped: summary.skipped as u64,
            persons_created: summary.persons_created as u64,
            message: format!(
                "Imported {} row(s), skipped {}.",
                summary.imported, summary.skipped
            ),
        },
        Err(err) => ImportResponse {
            ok: false,
            imported: 0,
            skipped: 0,
            persons_created: 0,
            message: format!("import_interaction_log failed: {err}"),
        },
    }
}

fn resolve_tracker_db_path() -> PathBuf {
    TRACKER_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("KINSHIP_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TRACKER_DB_FILE_NAME)
        })
        .clone()
}

fn with_service<T>(
    f: impl FnOnce(
        &TrackerService<SqlitePersonRepository<'_>, SqliteConversationRepository<'_>>,
    ) -> kinship_core::RepoResult<T>,
) -> Result<T, String> {
    let db_path = resolve_tracker_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("tracker DB open failed: {err}"))?;
    let persons = SqlitePersonRepository::try_new(&conn)
        .map_err(|err| format!("tracker repo init failed: {err}"))?;
    let conversations = SqliteConversationRepository::try_new(&conn)
        .map_err(|err| format!("tracker repo init failed: {err}"))?;
    let service = TrackerService::new(persons, conversations);
    f(&service).map_err(|err| err.to_string())
}

fn with_repos<T>(
    f: impl FnOnce(
        &SqlitePersonRepository<'_>,
        &SqliteConversationRepository<'_>,
    ) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_tracker_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("tracker DB open failed: {err}"))?;
    let persons = SqlitePersonRepository::try_new(&conn)
        .map_err(|err| format!("tracker repo init failed: {err}"))?;
    let conversations = SqliteConversationRepository::try_new(&conn)
        .map_err(|err| format!("tracker repo init failed: {err}"))?;
    f(&persons, &conversations)
}

fn to_person_view(person: Person) -> PersonView {
    PersonView {
        id: person.id,
        name: person.name,
        impression: person.impression,
        interests: person.interests,
        goals: person.goals,
        category: person.category,
        last_contact_time: person.last_contact_time,
    }
}

fn from_person_view(view: PersonView) -> Person {
    Person {
        id: view.id,
        name: view.name,
        impression: view.impression,
        interests: view.interests,
        goals: view.goals,
        category: view.category,
        last_contact_time: view.last_contact_time,
    }
}

fn to_conversation_view(row: ConversationWithPerson) -> ConversationView {
    ConversationView {
        id: row.conversation.id,
        person_id: row.conversation.person_id,
        person_name: row.person_name,
        content: row.conversation.content,
        timestamp: row.conversation.timestamp,
        category: row.conversation.category.label().to_string(),
        tag: row.conversation.tag,
    }
}

fn from_conversation_view(view: ConversationView) -> Conversation {
    Conversation {
        id: view.id,
        person_id: view.person_id,
        content: view.content,
        timestamp: view.timestamp,
        category: kinship_core::ConversationCategory::from_label(&view.category),
        tag: view.tag,
    }
}
