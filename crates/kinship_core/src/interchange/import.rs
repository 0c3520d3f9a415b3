//! Tolerant CSV import of third-party interaction logs.
//!
//! # Responsibility
//! - Validate the fixed external header, then process each row
//!   independently with skip-on-error semantics.
//!
//! # Invariants
//! - A header mismatch aborts before any row is processed.
//! - A bad row is skipped, never aborts the batch.
//! - Import updates `last_contact_time` with max semantics, unlike the
//!   live-add overwrite policy. The two are deliberately distinct.

use super::{parse_import_timestamp, InterchangeError, InterchangeResult};
use crate::model::conversation::{Conversation, ConversationCategory};
use crate::model::person::Person;
use crate::repo::conversation_repo::ConversationRepository;
use crate::repo::person_repo::PersonRepository;
use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const EXPECTED_HEADER: [&str; 5] = ["FeatureName", "Timestamp", "Value", "Label", "Note"];
const IMPORTED_PERSON_CATEGORY: &str = "Imported";

/// Emoji prefixes seen on feature names in third-party exports.
static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[\u{1F62D}\u{1F91D}\u{1F389}\u{1F381}\u{2139}\u{FE0F}]")
        .expect("valid emoji regex")
});

/// Outcome counters exposed for callers and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows converted into a conversation.
    pub imported: usize,
    /// Rows rejected by row-level validation.
    pub skipped: usize,
    /// Persons created because no exact name match existed.
    pub persons_created: usize,
}

/// Imports an interaction log from `path`.
///
/// The file handle is scoped to this call and released on every exit
/// path.
pub fn import_csv_from_path<P, C>(
    persons: &P,
    conversations: &C,
    path: impl AsRef<Path>,
) -> InterchangeResult<ImportSummary>
where
    P: PersonRepository,
    C: ConversationRepository,
{
    let file = File::open(path.as_ref())?;
    import_csv(persons, conversations, file)
}

/// Imports an interaction log from an arbitrary byte source.
pub fn import_csv<P, C, R>(persons: &P, conversations: &C, source: R) -> InterchangeResult<ImportSummary>
where
    P: PersonRepository,
    C: ConversationRepository,
    R: Read,
{
    match read_document(persons, conversations, source) {
        Ok(summary) => {
            info!(
                "event=csv_import module=interchange status=ok imported={} skipped={} persons_created={}",
                summary.imported, summary.skipped, summary.persons_created
            );
            Ok(summary)
        }
        Err(err) => {
            error!("event=csv_import module=interchange status=error error={err}");
            Err(err)
        }
    }
}

fn read_document<P, C, R>(persons: &P, conversations: &C, source: R) -> InterchangeResult<ImportSummary>
where
    P: PersonRepository,
    C: ConversationRepository,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(InterchangeError::HeaderMismatch(String::from("<empty>"))),
    };
    verify_header(&header)?;

    let mut summary = ImportSummary::default();
    for record in records {
        let record = record?;
        import_row(persons, conversations, &record, &mut summary)?;
    }

    Ok(summary)
}

fn verify_header(header: &csv::StringRecord) -> InterchangeResult<()> {
    let matches = header.len() >= EXPECTED_HEADER.len()
        && EXPECTED_HEADER
            .iter()
            .enumerate()
            .all(|(index, expected)| header.get(index) == Some(expected));

    if matches {
        Ok(())
    } else {
        Err(InterchangeError::HeaderMismatch(
            header.iter().collect::<Vec<_>>().join(","),
        ))
    }
}

/// Processes one data row, updating the batch counters.
///
/// Row-level validation failures only increment `skipped`; storage
/// failures abort the batch.
fn import_row<P, C>(
    persons: &P,
    conversations: &C,
    record: &csv::StringRecord,
    summary: &mut ImportSummary,
) -> InterchangeResult<()>
where
    P: PersonRepository,
    C: ConversationRepository,
{
    if record.len() < EXPECTED_HEADER.len() {
        debug!("event=csv_import_row module=interchange status=skip reason=short_record");
        summary.skipped += 1;
        return Ok(());
    }

    let feature_name = EMOJI_RE
        .replace_all(record[0].trim(), "")
        .trim()
        .to_string();
    let timestamp_text = record[1].trim();
    let value_text = record[2].trim();
    let label = record[3].trim();
    let note = record[4].trim();

    if label.is_empty() || note.is_empty() {
        debug!("event=csv_import_row module=interchange status=skip reason=blank_label_or_note");
        summary.skipped += 1;
        return Ok(());
    }

    if value_text.parse::<f64>() != Ok(1.0) {
        debug!("event=csv_import_row module=interchange status=skip reason=value_not_one");
        summary.skipped += 1;
        return Ok(());
    }

    let timestamp = match parse_import_timestamp(timestamp_text) {
        Some(timestamp) => timestamp,
        None => {
            debug!(
                "event=csv_import_row module=interchange status=skip reason=bad_timestamp value={timestamp_text}"
            );
            summary.skipped += 1;
            return Ok(());
        }
    };

    let person = match persons.find_by_name(label)? {
        Some(person) => person,
        None => {
            let new_person = Person::new(label, "", "", "", IMPORTED_PERSON_CATEGORY);
            let id = persons.insert(&new_person)?;
            summary.persons_created += 1;
            persons.get(id)?.ok_or_else(|| {
                InterchangeError::Repo(crate::repo::RepoError::NotFound {
                    entity: "person",
                    id,
                })
            })?
        }
    };

    let conversation = Conversation::new(
        person.id,
        note,
        timestamp,
        ConversationCategory::from_label(&feature_name),
        Some(feature_name),
    );
    conversations.insert(&conversation)?;

    // Max policy: an out-of-order backfill never rewinds the person's
    // last-contact marker.
    if timestamp > person.last_contact_time {
        let mut updated = person;
        updated.last_contact_time = timestamp;
        persons.update(&updated)?;
    }

    summary.imported += 1;
    Ok(())
}
