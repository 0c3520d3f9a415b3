//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD and list APIs over the `persons` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Default list ordering is `last_contact_time DESC, id ASC`.
//! - `delete` is a no-op for absent ids; `update` reports `NotFound`.
//! - Deleting a person cascades to its conversations via the storage
//!   foreign key.

use crate::model::person::{Person, PersonId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    name,
    impression,
    interests,
    goals,
    category,
    last_contact_time
FROM persons";

const PERSON_COLUMNS: &[&str] = &[
    "id",
    "name",
    "impression",
    "interests",
    "goals",
    "category",
    "last_contact_time",
];

/// Repository interface for person CRUD and list operations.
pub trait PersonRepository {
    /// Inserts a person and returns the storage-assigned id. The
    /// record's own `id` field is ignored.
    fn insert(&self, person: &Person) -> RepoResult<PersonId>;
    /// Full-record replace by id.
    fn update(&self, person: &Person) -> RepoResult<()>;
    /// Removes a person (and, via cascade, its conversations).
    /// Deleting an absent id is a no-op.
    fn delete(&self, id: PersonId) -> RepoResult<()>;
    fn get(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Exact-match lookup by name; the earliest inserted row wins.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Person>>;
    /// All persons, most recently contacted first.
    fn list_all(&self) -> RepoResult<Vec<Person>>;
    /// Persons whose `category` is in the given set; an empty set
    /// means no filter.
    fn list_by_categories(&self, categories: &[String]) -> RepoResult<Vec<Person>>;
    /// All persons in insertion order, for export.
    fn list_in_storage_order(&self) -> RepoResult<Vec<Person>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "persons", PERSON_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn insert(&self, person: &Person) -> RepoResult<PersonId> {
        self.conn.execute(
            "INSERT INTO persons (
                name,
                impression,
                interests,
                goals,
                category,
                last_contact_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                person.name.as_str(),
                person.impression.as_str(),
                person.interests.as_str(),
                person.goals.as_str(),
                person.category.as_str(),
                person.last_contact_time,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, person: &Person) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE persons
             SET
                name = ?1,
                impression = ?2,
                interests = ?3,
                goals = ?4,
                category = ?5,
                last_contact_time = ?6
             WHERE id = ?7;",
            params![
                person.name.as_str(),
                person.impression.as_str(),
                person.interests.as_str(),
                person.goals.as_str(),
                person.category.as_str(),
                person.last_contact_time,
                person.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person",
                id: person.id,
            });
        }

        Ok(())
    }

    fn delete(&self, id: PersonId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM persons WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn get(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL} WHERE name = ?1 ORDER BY id ASC LIMIT 1;"
        ))?;

        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn list_all(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL} ORDER BY last_contact_time DESC, id ASC;"
        ))?;
        let rows = stmt.query([])?;
        collect_persons(rows)
    }

    fn list_by_categories(&self, categories: &[String]) -> RepoResult<Vec<Person>> {
        if categories.is_empty() {
            return self.list_all();
        }

        let placeholders = vec!["?"; categories.len()].join(", ");
        let sql = format!(
            "{PERSON_SELECT_SQL}
             WHERE category IN ({placeholders})
             ORDER BY last_contact_time DESC, id ASC;"
        );
        let bind_values: Vec<Value> = categories
            .iter()
            .map(|category| Value::Text(category.clone()))
            .collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_persons(rows)
    }

    fn list_in_storage_order(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query([])?;
        collect_persons(rows)
    }
}

fn collect_persons(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Person>> {
    let mut persons = Vec::new();
    while let Some(row) = rows.next()? {
        persons.push(parse_person_row(row)?);
    }
    Ok(persons)
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    Ok(Person {
        id: row.get("id")?,
        name: row.get("name")?,
        impression: row.get("impression")?,
        interests: row.get("interests")?,
        goals: row.get("goals")?,
        category: row.get("category")?,
        last_contact_time: row.get("last_contact_time")?,
    })
}
