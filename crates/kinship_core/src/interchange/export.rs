//! Full-dataset CSV export.
//!
//! # Responsibility
//! - Serialize every person and conversation into the fixed two-table
//!   export layout.
//!
//! # Invariants
//! - Rows are written in storage (insertion) order, not display order.
//! - Any failure aborts with an error; the caller must treat the
//!   destination as unreliable and re-attempt the whole export.

use super::{format_export_timestamp, InterchangeResult};
use crate::repo::conversation_repo::ConversationRepository;
use crate::repo::person_repo::PersonRepository;
use log::{error, info};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const PERSONS_BANNER: &str = "Persons Table";
const PERSONS_HEADER: [&str; 7] = [
    "id",
    "name",
    "impression",
    "interests",
    "goals",
    "category",
    "lastContactTime",
];
const CONVERSATIONS_BANNER: &str = "Conversations Table";
const CONVERSATIONS_HEADER: [&str; 6] = ["id", "personId", "content", "tag", "timestamp", "category"];

/// Writes the full dataset to `path` as one CSV document.
///
/// The file handle is scoped to this call and released on every exit
/// path. A partial file may remain after an error; it is reported as
/// a failure, never as silently truncated output.
pub fn export_csv_to_path<P, C>(
    persons: &P,
    conversations: &C,
    path: impl AsRef<Path>,
) -> InterchangeResult<()>
where
    P: PersonRepository,
    C: ConversationRepository,
{
    let file = File::create(path.as_ref())?;
    export_csv(persons, conversations, file)
}

/// Writes the full dataset to an arbitrary byte sink.
pub fn export_csv<P, C, W>(persons: &P, conversations: &C, sink: W) -> InterchangeResult<()>
where
    P: PersonRepository,
    C: ConversationRepository,
    W: Write,
{
    match write_document(persons, conversations, sink) {
        Ok((person_count, conversation_count)) => {
            info!(
                "event=csv_export module=interchange status=ok persons={person_count} conversations={conversation_count}"
            );
            Ok(())
        }
        Err(err) => {
            error!("event=csv_export module=interchange status=error error={err}");
            Err(err)
        }
    }
}

fn write_document<P, C, W>(
    persons: &P,
    conversations: &C,
    sink: W,
) -> InterchangeResult<(usize, usize)>
where
    P: PersonRepository,
    C: ConversationRepository,
    W: Write,
{
    let person_rows = persons.list_in_storage_order()?;
    let conversation_rows = conversations.list_in_storage_order()?;

    // The document mixes 1-, 6- and 7-field rows, so the writer must
    // not enforce a uniform record length.
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(sink);

    writer.write_record([PERSONS_BANNER])?;
    writer.write_record(PERSONS_HEADER)?;
    for person in &person_rows {
        writer.write_record([
            person.id.to_string(),
            person.name.clone(),
            person.impression.clone(),
            person.interests.clone(),
            person.goals.clone(),
            person.category.clone(),
            format_export_timestamp(person.last_contact_time)?,
        ])?;
    }

    writer.write_record([""])?;
    writer.write_record([CONVERSATIONS_BANNER])?;
    writer.write_record(CONVERSATIONS_HEADER)?;
    for conversation in &conversation_rows {
        writer.write_record([
            conversation.id.to_string(),
            conversation.person_id.to_string(),
            conversation.content.clone(),
            conversation.tag.clone().unwrap_or_default(),
            format_export_timestamp(conversation.timestamp)?,
            conversation.category.as_db_str().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok((person_rows.len(), conversation_rows.len()))
}
