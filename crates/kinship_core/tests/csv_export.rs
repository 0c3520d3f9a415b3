use kinship_core::db::open_db_in_memory;
use kinship_core::interchange::{
    export_csv, export_csv_to_path, parse_export_timestamp, InterchangeError,
};
use kinship_core::{
    Conversation, ConversationCategory, ConversationRepository, Person, PersonRepository,
    SqliteConversationRepository, SqlitePersonRepository,
};
use rusqlite::Connection;

fn seed(conn: &Connection) -> (SqlitePersonRepository<'_>, SqliteConversationRepository<'_>) {
    let persons = SqlitePersonRepository::try_new(conn).unwrap();
    let conversations = SqliteConversationRepository::try_new(conn).unwrap();

    let mut alice = Person::new("Alice", "warm, \"direct\"", "climbing", "keep close", "Friends");
    alice.last_contact_time = 1_705_343_400_789;
    let alice_id = persons.insert(&alice).unwrap();

    let bob = Person::new("Bob, Jr.", "", "chess\ngo", "", "");
    let bob_id = persons.insert(&bob).unwrap();

    conversations
        .insert(&Conversation::new(
            alice_id,
            "long talk, about \"life\"",
            1_705_343_400_789,
            ConversationCategory::Emotional,
            Some("Emotional".to_string()),
        ))
        .unwrap();
    conversations
        .insert(&Conversation::new(
            bob_id,
            "untagged chat",
            1_700_000_000_000,
            ConversationCategory::Casual,
            None,
        ))
        .unwrap();

    (persons, conversations)
}

fn records_from(bytes: &[u8]) -> Vec<csv::StringRecord> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes)
        .records()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn export_layout_matches_the_two_table_document() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = seed(&conn);

    let mut buffer = Vec::new();
    export_csv(&persons, &conversations, &mut buffer).unwrap();

    let records = records_from(&buffer);
    assert_eq!(records[0].get(0), Some("Persons Table"));
    assert_eq!(
        records[1].iter().collect::<Vec<_>>(),
        vec!["id", "name", "impression", "interests", "goals", "category", "lastContactTime"]
    );
    // Two person rows, separator, banner, header, two conversation rows.
    assert_eq!(records.len(), 9);
    assert_eq!(records[4].get(0), Some(""));
    assert_eq!(records[5].get(0), Some("Conversations Table"));
    assert_eq!(
        records[6].iter().collect::<Vec<_>>(),
        vec!["id", "personId", "content", "tag", "timestamp", "category"]
    );
}

#[test]
fn export_rows_are_in_storage_order_not_display_order() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = seed(&conn);

    // Alice has the most recent contact and would sort first in the UI;
    // storage order keeps insertion order regardless.
    let mut buffer = Vec::new();
    export_csv(&persons, &conversations, &mut buffer).unwrap();

    let records = records_from(&buffer);
    assert_eq!(records[2].get(1), Some("Alice"));
    assert_eq!(records[3].get(1), Some("Bob, Jr."));
}

#[test]
fn export_round_trips_every_field_with_second_precision_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = seed(&conn);

    let mut buffer = Vec::new();
    export_csv(&persons, &conversations, &mut buffer).unwrap();
    let records = records_from(&buffer);

    for (row, person) in records[2..4].iter().zip(persons.list_in_storage_order().unwrap()) {
        assert_eq!(row.get(0), Some(person.id.to_string().as_str()));
        assert_eq!(row.get(1), Some(person.name.as_str()));
        assert_eq!(row.get(2), Some(person.impression.as_str()));
        assert_eq!(row.get(3), Some(person.interests.as_str()));
        assert_eq!(row.get(4), Some(person.goals.as_str()));
        assert_eq!(row.get(5), Some(person.category.as_str()));

        let recovered = parse_export_timestamp(row.get(6).unwrap()).unwrap();
        assert_eq!(recovered, person.last_contact_time - person.last_contact_time % 1000);
    }

    for (row, conversation) in records[7..9]
        .iter()
        .zip(conversations.list_in_storage_order().unwrap())
    {
        assert_eq!(row.get(0), Some(conversation.id.to_string().as_str()));
        assert_eq!(row.get(1), Some(conversation.person_id.to_string().as_str()));
        assert_eq!(row.get(2), Some(conversation.content.as_str()));
        assert_eq!(row.get(3), Some(conversation.tag.as_deref().unwrap_or("")));
        assert_eq!(row.get(5), Some(conversation.category.as_db_str()));

        let recovered = parse_export_timestamp(row.get(4).unwrap()).unwrap();
        assert_eq!(
            recovered,
            conversation.timestamp - conversation.timestamp % 1000
        );
    }
}

#[test]
fn export_to_path_writes_the_same_document() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = seed(&conn);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");
    export_csv_to_path(&persons, &conversations, &path).unwrap();

    let mut buffer = Vec::new();
    export_csv(&persons, &conversations, &mut buffer).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), buffer);
}

#[test]
fn export_to_unwritable_path_aborts_with_io_error() {
    let conn = open_db_in_memory().unwrap();
    let (persons, conversations) = seed(&conn);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-subdir").join("export.csv");
    let err = export_csv_to_path(&persons, &conversations, &path).unwrap_err();
    assert!(matches!(err, InterchangeError::Io(_)), "got {err}");
}

#[test]
fn export_aborts_when_a_timestamp_is_not_representable() {
    let conn = open_db_in_memory().unwrap();
    let persons = SqlitePersonRepository::try_new(&conn).unwrap();
    let conversations = SqliteConversationRepository::try_new(&conn).unwrap();

    let mut person = Person::new("Overflow", "", "", "", "");
    person.last_contact_time = i64::MAX;
    persons.insert(&person).unwrap();

    let mut buffer = Vec::new();
    let err = export_csv(&persons, &conversations, &mut buffer).unwrap_err();
    assert!(
        matches!(err, InterchangeError::TimestampOutOfRange(ms) if ms == i64::MAX),
        "got {err}"
    );
}

#[test]
fn export_of_empty_database_still_produces_the_skeleton() {
    let conn = open_db_in_memory().unwrap();
    let persons = SqlitePersonRepository::try_new(&conn).unwrap();
    let conversations = SqliteConversationRepository::try_new(&conn).unwrap();

    let mut buffer = Vec::new();
    export_csv(&persons, &conversations, &mut buffer).unwrap();

    let records = records_from(&buffer);
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].get(0), Some("Persons Table"));
    assert_eq!(records[3].get(0), Some("Conversations Table"));
}
