//! Row mapping shared by the `messages` and `system_log` tables.

use chatpartner_types::error::RepositoryError;
use chatpartner_types::message::{Message, MessageCategory, MessageRole};
use chrono::{DateTime, Utc};
use sqlx::Row;

/// Column list in insert order.
pub(super) const COLUMNS: &str =
    "chat_id, content, sender, receiver, role, category, token_count, created_at";

/// Internal row type for mapping SQLite rows to domain Message.
pub(super) struct MessageRow {
    id: i64,
    chat_id: String,
    content: String,
    sender: String,
    receiver: String,
    role: String,
    category: String,
    token_count: i64,
    created_at: String,
}

impl MessageRow {
    pub(super) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            content: row.try_get("content")?,
            sender: row.try_get("sender")?,
            receiver: row.try_get("receiver")?,
            role: row.try_get("role")?,
            category: row.try_get("category")?,
            token_count: row.try_get("token_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub(super) fn into_message(self) -> Result<Message, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let category: MessageCategory = self
            .category
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Message {
            id: Some(self.id),
            chat_id: self.chat_id,
            content: self.content,
            sender: self.sender,
            receiver: self.receiver,
            role,
            category,
            token_count: self.token_count.max(0) as u32,
            created_at,
        })
    }
}

pub(super) fn rows_to_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    rows.iter()
        .map(|row| {
            MessageRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_message()
        })
        .collect()
}

/// Insert statement for `table` using [`COLUMNS`].
pub(super) fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)")
}

/// Bind a message's columns in [`COLUMNS`] order.
pub(super) fn bind_message<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    message: &'q Message,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&message.chat_id)
        .bind(&message.content)
        .bind(&message.sender)
        .bind(&message.receiver)
        .bind(message.role.to_string())
        .bind(message.category.to_string())
        .bind(message.token_count as i64)
        .bind(format_datetime(&message.created_at))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
