//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `chatpartner-core` on the
//! `messages` table. Reads go to the reader pool; multi-statement writes run
//! in one transaction on the writer.

use chatpartner_core::conversation::Conversation;
use chatpartner_core::conversation::repository::ConversationRepository;
use chatpartner_types::error::RepositoryError;
use chatpartner_types::message::{Message, MessageCategory};

use super::message_row::{MessageRow, bind_message, insert_sql, rows_to_messages};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl ConversationRepository for SqliteConversationRepository {
    async fn load(&self, chat_id: &str) -> Result<Conversation, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE chat_id = ? ORDER BY id ASC")
            .bind(chat_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Conversation::from_messages(chat_id, rows_to_messages(&rows)?))
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("DELETE FROM messages WHERE chat_id = ?")
            .bind(conversation.chat_id())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let sql = insert_sql("messages");
        for message in conversation.full_messages() {
            bind_message(sqlx::query(&sql), message)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn append(&self, message: &Message) -> Result<i64, RepositoryError> {
        let sql = insert_sql("messages");
        let result = bind_message(sqlx::query(&sql), message)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn remove_last(&self, chat_id: &str) -> Result<Option<Message>, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT * FROM messages WHERE chat_id = ? ORDER BY id DESC LIMIT 1")
            .bind(chat_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let message = MessageRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_message()?;

        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Some(message))
    }

    async fn delete(&self, chat_id: &str) -> Result<Vec<Message>, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let rows = sqlx::query("SELECT * FROM messages WHERE chat_id = ? ORDER BY id ASC")
            .bind(chat_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let removed = rows_to_messages(&rows)?;

        sqlx::query("DELETE FROM messages WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(removed)
    }

    async fn last_messages(&self, chat_id: &str, limit: u32) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE chat_id = ? ORDER BY id DESC LIMIT ?")
            .bind(chat_id)
            .bind(limit as i64)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_messages(&rows)
    }

    async fn update_token_count(&self, message_id: i64, token_count: u32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE messages SET token_count = ? WHERE id = ?")
            .bind(token_count as i64)
            .bind(message_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn config_exists(&self, chat_id: &str) -> Result<bool, RepositoryError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE chat_id = ? AND category = ?)",
        )
        .bind(chat_id)
        .bind(MessageCategory::Config.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(row.0 != 0)
    }
}
