//! Conversation repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, filtered-list, joined and aggregated APIs over the
//!   `conversations` table.
//!
//! # Invariants
//! - List ordering is `timestamp DESC, id ASC`.
//! - Tag filters are exact matches; rows with a NULL tag never match.
//! - Category is persisted as its enumeration name; unknown persisted
//!   values are rejected as `InvalidData` instead of masked.

use crate::model::conversation::{Conversation, ConversationCategory, ConversationId};
use crate::model::person::PersonId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeMap;

const CONVERSATION_SELECT_SQL: &str = "SELECT
    id,
    person_id,
    content,
    timestamp,
    category,
    tag
FROM conversations";

const CONVERSATION_COLUMNS: &[&str] =
    &["id", "person_id", "content", "timestamp", "category", "tag"];

/// Joined read model: a conversation together with its owning
/// person's name, so list screens need no second lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationWithPerson {
    pub conversation: Conversation,
    pub person_name: String,
}

/// Per-category conversation counts.
pub type CategoryStats = BTreeMap<ConversationCategory, i64>;

/// Repository interface for conversation operations.
pub trait ConversationRepository {
    /// Inserts a conversation and returns the storage-assigned id.
    /// Fails when `person_id` references no existing person.
    fn insert(&self, conversation: &Conversation) -> RepoResult<ConversationId>;
    /// Full-record replace by id.
    fn update(&self, conversation: &Conversation) -> RepoResult<()>;
    /// Removes by id; absent ids are a no-op.
    fn delete(&self, id: ConversationId) -> RepoResult<()>;
    fn get(&self, id: ConversationId) -> RepoResult<Option<Conversation>>;
    /// Conversations for one person, newest first, optionally
    /// restricted to one tag.
    fn list_for_person(
        &self,
        person_id: PersonId,
        tag: Option<&str>,
    ) -> RepoResult<Vec<Conversation>>;
    /// All conversations, newest first, optionally restricted to one
    /// tag.
    fn list_all(&self, tag: Option<&str>) -> RepoResult<Vec<Conversation>>;
    /// Joined variant of `list_for_person`.
    fn list_for_person_with_person(
        &self,
        person_id: PersonId,
        tag: Option<&str>,
    ) -> RepoResult<Vec<ConversationWithPerson>>;
    /// Joined variant of `list_all`.
    fn list_all_with_person(&self, tag: Option<&str>) -> RepoResult<Vec<ConversationWithPerson>>;
    /// Conversation counts grouped by category for one person.
    fn stats_for_person(&self, person_id: PersonId) -> RepoResult<CategoryStats>;
    /// Global conversation counts grouped by category.
    fn stats_all(&self) -> RepoResult<CategoryStats>;
    /// All conversations in insertion order, for export.
    fn list_in_storage_order(&self) -> RepoResult<Vec<Conversation>>;
}

/// SQLite-backed conversation repository.
pub struct SqliteConversationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConversationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "conversations", CONVERSATION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ConversationRepository for SqliteConversationRepository<'_> {
    fn insert(&self, conversation: &Conversation) -> RepoResult<ConversationId> {
        self.conn.execute(
            "INSERT INTO conversations (
                person_id,
                content,
                timestamp,
                category,
                tag
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                conversation.person_id,
                conversation.content.as_str(),
                conversation.timestamp,
                conversation.category.as_db_str(),
                conversation.tag.as_deref(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, conversation: &Conversation) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE conversations
             SET
                person_id = ?1,
                content = ?2,
                timestamp = ?3,
                category = ?4,
                tag = ?5
             WHERE id = ?6;",
            params![
                conversation.person_id,
                conversation.content.as_str(),
                conversation.timestamp,
                conversation.category.as_db_str(),
                conversation.tag.as_deref(),
                conversation.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "conversation",
                id: conversation.id,
            });
        }

        Ok(())
    }

    fn delete(&self, id: ConversationId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM conversations WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn get(&self, id: ConversationId) -> RepoResult<Option<Conversation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONVERSATION_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_conversation_row(row)?));
        }

        Ok(None)
    }

    fn list_for_person(
        &self,
        person_id: PersonId,
        tag: Option<&str>,
    ) -> RepoResult<Vec<Conversation>> {
        let mut sql = format!("{CONVERSATION_SELECT_SQL} WHERE person_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(person_id)];
        push_tag_filter(&mut sql, &mut bind_values, tag);
        sql.push_str(" ORDER BY timestamp DESC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_conversations(rows)
    }

    fn list_all(&self, tag: Option<&str>) -> RepoResult<Vec<Conversation>> {
        let mut sql = format!("{CONVERSATION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        push_tag_filter(&mut sql, &mut bind_values, tag);
        sql.push_str(" ORDER BY timestamp DESC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_conversations(rows)
    }

    fn list_for_person_with_person(
        &self,
        person_id: PersonId,
        tag: Option<&str>,
    ) -> RepoResult<Vec<ConversationWithPerson>> {
        let mut sql = String::from(
            "SELECT
                c.id,
                c.person_id,
                c.content,
                c.timestamp,
                c.category,
                c.tag,
                p.name AS person_name
             FROM conversations c
             INNER JOIN persons p ON c.person_id = p.id
             WHERE c.person_id = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Integer(person_id)];
        push_joined_tag_filter(&mut sql, &mut bind_values, tag);
        sql.push_str(" ORDER BY c.timestamp DESC, c.id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_joined(rows)
    }

    fn list_all_with_person(&self, tag: Option<&str>) -> RepoResult<Vec<ConversationWithPerson>> {
        let mut sql = String::from(
            "SELECT
                c.id,
                c.person_id,
                c.content,
                c.timestamp,
                c.category,
                c.tag,
                p.name AS person_name
             FROM conversations c
             INNER JOIN persons p ON c.person_id = p.id
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();
        push_joined_tag_filter(&mut sql, &mut bind_values, tag);
        sql.push_str(" ORDER BY c.timestamp DESC, c.id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_joined(rows)
    }

    fn stats_for_person(&self, person_id: PersonId) -> RepoResult<CategoryStats> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS count
             FROM conversations
             WHERE person_id = ?1
             GROUP BY category;",
        )?;
        let rows = stmt.query([person_id])?;
        collect_stats(rows)
    }

    fn stats_all(&self) -> RepoResult<CategoryStats> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS count
             FROM conversations
             GROUP BY category;",
        )?;
        let rows = stmt.query([])?;
        collect_stats(rows)
    }

    fn list_in_storage_order(&self) -> RepoResult<Vec<Conversation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONVERSATION_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query([])?;
        collect_conversations(rows)
    }
}

fn push_tag_filter(sql: &mut String, bind_values: &mut Vec<Value>, tag: Option<&str>) {
    if let Some(tag) = tag {
        sql.push_str(" AND tag = ?");
        bind_values.push(Value::Text(tag.to_string()));
    }
}

fn push_joined_tag_filter(sql: &mut String, bind_values: &mut Vec<Value>, tag: Option<&str>) {
    if let Some(tag) = tag {
        sql.push_str(" AND c.tag = ?");
        bind_values.push(Value::Text(tag.to_string()));
    }
}

fn collect_conversations(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Conversation>> {
    let mut conversations = Vec::new();
    while let Some(row) = rows.next()? {
        conversations.push(parse_conversation_row(row)?);
    }
    Ok(conversations)
}

fn collect_joined(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<ConversationWithPerson>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(ConversationWithPerson {
            conversation: parse_conversation_row(row)?,
            person_name: row.get("person_name")?,
        });
    }
    Ok(items)
}

fn collect_stats(mut rows: rusqlite::Rows<'_>) -> RepoResult<CategoryStats> {
    let mut stats = CategoryStats::new();
    while let Some(row) = rows.next()? {
        let category_text: String = row.get("category")?;
        let category = parse_category(&category_text)?;
        let count: i64 = row.get("count")?;
        stats.insert(category, count);
    }
    Ok(stats)
}

fn parse_conversation_row(row: &Row<'_>) -> RepoResult<Conversation> {
    let category_text: String = row.get("category")?;
    Ok(Conversation {
        id: row.get("id")?,
        person_id: row.get("person_id")?,
        content: row.get("content")?,
        timestamp: row.get("timestamp")?,
        category: parse_category(&category_text)?,
        tag: row.get("tag")?,
    })
}

fn parse_category(value: &str) -> RepoResult<ConversationCategory> {
    ConversationCategory::parse_db_str(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category value `{value}` in conversations.category"
        ))
    })
}
