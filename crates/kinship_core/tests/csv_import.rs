use kinship_core::db::open_db_in_memory;
use kinship_core::interchange::{import_csv, import_csv_from_path, InterchangeError};
use kinship_core::{
    ConversationCategory, ConversationRepository, PersonRepository, SqliteConversationRepository,
    SqlitePersonRepository,
};
use rusqlite::Connection;
use std::io::Cursor;

const HEADER: &str = "FeatureName,Timestamp,Value,Label,Note";

fn repos(conn: &Connection) -> (SqlitePersonRepository<'_>, SqliteConversationRepository<'_>) {
    (
        SqlitePersonRepository::try_new(conn).unwrap(),
        SqliteConversationRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn import_creates_person_and_conversation_from_a_valid_row() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let document = format!(
        "{HEADER}\nEmotional,2024-01-15T10:30:00.000-08:00,1.0,Alice,Had a long talk\n"
    );
    let summary = import_csv(&persons, &conversations, Cursor::new(document)).unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.persons_created, 1);

    let alice = persons.find_by_name("Alice").unwrap().unwrap();
    assert_eq!(alice.category, "Imported");
    assert_eq!(alice.impression, "");
    assert_eq!(alice.interests, "");
    assert_eq!(alice.goals, "");
    assert_eq!(alice.last_contact_time, 1_705_343_400_000);

    let rows = conversations.list_for_person(alice.id, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, ConversationCategory::Emotional);
    assert_eq!(rows[0].tag.as_deref(), Some("Emotional"));
    assert_eq!(rows[0].content, "Had a long talk");
    assert_eq!(rows[0].timestamp, 1_705_343_400_000);
}

#[test]
fn import_reuses_an_existing_person_for_the_same_label() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let document = format!(
        "{HEADER}\n\
         Emotional,2024-01-15T10:30:00.000-08:00,1.0,Alice,Had a long talk\n\
         Practical,2024-01-16T09:00:00.000-08:00,1.0,Alice,Helped with taxes\n"
    );
    let summary = import_csv(&persons, &conversations, Cursor::new(document)).unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.persons_created, 1);

    let matches: Vec<_> = persons
        .list_in_storage_order()
        .unwrap()
        .into_iter()
        .filter(|p| p.name == "Alice")
        .collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(
        conversations.list_for_person(matches[0].id, None).unwrap().len(),
        2
    );
}

#[test]
fn import_updates_last_contact_with_max_semantics() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    // Newer row first; the older backfill must not rewind the marker.
    let document = format!(
        "{HEADER}\n\
         Share,2024-03-01T12:00:00.000Z,1.0,Alice,March news\n\
         Share,2024-01-01T12:00:00.000Z,1.0,Alice,January news\n"
    );
    import_csv(&persons, &conversations, Cursor::new(document)).unwrap();

    let alice = persons.find_by_name("Alice").unwrap().unwrap();
    let march: i64 = 1_709_294_400_000;
    assert_eq!(alice.last_contact_time, march);
    assert_eq!(conversations.list_for_person(alice.id, None).unwrap().len(), 2);
}

#[test]
fn emoji_prefixes_are_stripped_from_feature_names() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let document = format!(
        "{HEADER}\n\u{1F62D}Emotional,2024-01-15T10:30:00.000-08:00,1.0,Alice,Rough day\n"
    );
    import_csv(&persons, &conversations, Cursor::new(document)).unwrap();

    let alice = persons.find_by_name("Alice").unwrap().unwrap();
    let rows = conversations.list_for_person(alice.id, None).unwrap();
    assert_eq!(rows[0].tag.as_deref(), Some("Emotional"));
    assert_eq!(rows[0].category, ConversationCategory::Emotional);
}

#[test]
fn bad_rows_are_skipped_without_affecting_their_neighbors() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let document = format!(
        "{HEADER}\n\
         Share,2024-01-01T12:00:00.000Z,1.0,Alice,before the bad rows\n\
         Share,2024-01-02T12:00:00.000Z,0.5,Alice,value is not one\n\
         Share,2024-01-03T12:00:00.000Z,1.0,Alice,\n\
         Share,2024-01-04T12:00:00.000Z,1.0,,missing label\n\
         Share,not-a-timestamp,1.0,Alice,bad timestamp\n\
         Share,2024-01-06T12:00:00.000Z,1.0,Alice,after the bad rows\n"
    );
    let summary = import_csv(&persons, &conversations, Cursor::new(document)).unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped, 4);

    let alice = persons.find_by_name("Alice").unwrap().unwrap();
    let contents: Vec<String> = conversations
        .list_for_person(alice.id, None)
        .unwrap()
        .into_iter()
        .map(|c| c.content)
        .collect();
    assert_eq!(contents, vec!["after the bad rows", "before the bad rows"]);
}

#[test]
fn unknown_feature_names_map_to_casual() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let document = format!("{HEADER}\nGaming,2024-01-15T10:30:00.000Z,1.0,Alice,Played co-op\n");
    import_csv(&persons, &conversations, Cursor::new(document)).unwrap();

    let alice = persons.find_by_name("Alice").unwrap().unwrap();
    let rows = conversations.list_for_person(alice.id, None).unwrap();
    assert_eq!(rows[0].category, ConversationCategory::Casual);
    assert_eq!(rows[0].tag.as_deref(), Some("Gaming"));
}

#[test]
fn header_mismatch_aborts_before_any_row_is_processed() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let document = "Feature,When,Value,Label,Note\nShare,2024-01-01T12:00:00.000Z,1.0,Alice,hi\n";
    let err = import_csv(&persons, &conversations, Cursor::new(document)).unwrap_err();
    assert!(matches!(err, InterchangeError::HeaderMismatch(_)));

    assert!(persons.list_in_storage_order().unwrap().is_empty());
    assert!(conversations.list_in_storage_order().unwrap().is_empty());
}

#[test]
fn empty_document_is_a_header_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let err = import_csv(&persons, &conversations, Cursor::new("")).unwrap_err();
    assert!(matches!(err, InterchangeError::HeaderMismatch(_)));
}

#[test]
fn extra_header_columns_beyond_the_first_five_are_tolerated() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let document = "FeatureName,Timestamp,Value,Label,Note,Extra\n\
                    Share,2024-01-01T12:00:00.000Z,1.0,Alice,hello,ignored\n";
    let summary = import_csv(&persons, &conversations, Cursor::new(document)).unwrap();
    assert_eq!(summary.imported, 1);
}

#[test]
fn import_from_path_reads_the_same_document() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = repos(&conn);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    std::fs::write(
        &path,
        format!("{HEADER}\nShare,2024-01-01T12:00:00.000Z,1.0,Alice,from disk\n"),
    )
    .unwrap();

    let summary = import_csv_from_path(&persons, &conversations, &path).unwrap();
    assert_eq!(summary.imported, 1);
    assert!(persons.find_by_name("Alice").unwrap().is_some());
}
