//! SQLite audit-trail implementation.
//!
//! Implements `SystemLogRepository` from `chatpartner-core` on the
//! append-only `system_log` table.

use chatpartner_core::conversation::repository::SystemLogRepository;
use chatpartner_types::error::RepositoryError;
use chatpartner_types::message::Message;

use super::message_row::{bind_message, insert_sql, rows_to_messages};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `SystemLogRepository`.
#[derive(Clone)]
pub struct SqliteSystemLog {
    pool: DatabasePool,
}

impl SqliteSystemLog {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl SystemLogRepository for SqliteSystemLog {
    async fn log(&self, entry: &Message) -> Result<(), RepositoryError> {
        let sql = insert_sql("system_log");
        bind_message(sqlx::query(&sql), entry)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn entries(&self, chat_id: Option<&str>, limit: u32) -> Result<Vec<Message>, RepositoryError> {
        let rows = match chat_id {
            Some(chat_id) => {
                sqlx::query("SELECT * FROM system_log WHERE chat_id = ? ORDER BY id DESC LIMIT ?")
                    .bind(chat_id)
                    .bind(limit as i64)
                    .fetch_all(&self.pool.reader)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM system_log ORDER BY id DESC LIMIT ?")
                    .bind(limit as i64)
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_messages(&rows)
    }
}
