use crate::types::{ChatSummary, UsageStats};
use rand::RngCore;
use rusqlite::{params, Connection, Result};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id);

-- Usage analytics keyed by pseudonymous id, hour-rounded timestamps
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    anon_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    occurred_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_kind ON events(kind);
"#;

/// A stored message row. Content is ciphertext; decryption happens a
/// layer up.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// Chat store backed by SQLite
pub struct ChatStore {
    conn: Connection,
}

impl ChatStore {
    /// Open or create the chat database
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -------------------------------------------------------------------------
    // Chat operations
    // -------------------------------------------------------------------------

    /// Create a new chat, returns its opaque id
    pub fn create_chat(&self) -> Result<String> {
        let id = new_chat_id();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO chats (id, created_at, updated_at) VALUES (?1, ?2, ?3)",
            params![id, now, now],
        )?;

        Ok(id)
    }

    pub fn chat_exists(&self, chat_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chats WHERE id = ?1",
            params![chat_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Append a message to a chat and bump the chat's updated_at
    pub fn add_message(&self, chat_id: &str, role: &str, content: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO messages (chat_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![chat_id, role, content, now],
        )?;
        let id = self.conn.last_insert_rowid();

        self.conn.execute(
            "UPDATE chats SET updated_at = ?1 WHERE id = ?2",
            params![now, chat_id],
        )?;

        Ok(id)
    }

    /// All messages of a chat, oldest first
    pub fn get_history(&self, chat_id: &str) -> Result<Vec<StoredMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT role, content, created_at FROM messages WHERE chat_id = ?1 ORDER BY id",
        )?;

        let mut results = Vec::new();
        let mut rows = stmt.query(params![chat_id])?;

        while let Some(row) = rows.next()? {
            results.push(StoredMessage {
                role: row.get(0)?,
                content: row.get(1)?,
                created_at: row.get(2)?,
            });
        }

        Ok(results)
    }

    /// List chats, most recently active first
    pub fn list_chats(&self, limit: usize) -> Result<Vec<ChatSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.created_at, c.updated_at,
                    (SELECT COUNT(*) FROM messages m WHERE m.chat_id = c.id)
             FROM chats c
             ORDER BY c.updated_at DESC, c.created_at DESC
             LIMIT ?1",
        )?;

        let mut results = Vec::new();
        let mut rows = stmt.query(params![limit as i64])?;

        while let Some(row) = rows.next()? {
            results.push(ChatSummary {
                id: row.get(0)?,
                created_at: row.get(1)?,
                updated_at: row.get(2)?,
                message_count: row.get::<_, i64>(3)? as usize,
            });
        }

        Ok(results)
    }

    /// Delete a chat and its messages
    pub fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        // Messages go via ON DELETE CASCADE
        let count = self
            .conn
            .execute("DELETE FROM chats WHERE id = ?1", params![chat_id])?;
        Ok(count > 0)
    }

    // -------------------------------------------------------------------------
    // Analytics
    // -------------------------------------------------------------------------

    /// Record a usage event under a pseudonymous id
    pub fn record_event(&self, anon_id: &str, kind: &str, occurred_at: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO events (anon_id, kind, occurred_at) VALUES (?1, ?2, ?3)",
            params![anon_id, kind, occurred_at],
        )?;
        Ok(())
    }

    /// Aggregate usage statistics, optionally limited to messages at or
    /// after `since` (RFC 3339 UTC; lexicographic comparison is safe).
    pub fn stats(&self, since: Option<&str>) -> Result<UsageStats> {
        let floor = since.unwrap_or("");

        let total_chats: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chats WHERE updated_at >= ?1",
            params![floor],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT role, COUNT(*) FROM messages WHERE created_at >= ?1 GROUP BY role",
        )?;
        let mut user_messages = 0usize;
        let mut assistant_messages = 0usize;
        let mut rows = stmt.query(params![floor])?;
        while let Some(row) = rows.next()? {
            let role: String = row.get(0)?;
            let count = row.get::<_, i64>(1)? as usize;
            match role.as_str() {
                "user" => user_messages = count,
                "assistant" => assistant_messages = count,
                _ => {}
            }
        }

        let recommendations_served: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE kind = 'recommendation' AND occurred_at >= ?1",
            params![floor],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT substr(created_at, 1, 10) AS day, COUNT(*)
             FROM messages
             WHERE created_at >= ?1
             GROUP BY day
             ORDER BY day",
        )?;
        let mut daily_activity = Vec::new();
        let mut rows = stmt.query(params![floor])?;
        while let Some(row) = rows.next()? {
            daily_activity.push((row.get(0)?, row.get::<_, i64>(1)? as usize));
        }

        let total_messages = user_messages + assistant_messages;
        let avg_messages_per_chat = if total_chats > 0 {
            total_messages as f64 / total_chats as f64
        } else {
            0.0
        };

        Ok(UsageStats {
            total_chats: total_chats as usize,
            total_messages,
            user_messages,
            assistant_messages,
            recommendations_served: recommendations_served as usize,
            avg_messages_per_chat,
            daily_activity,
        })
    }
}

/// Opaque 24-hex-char chat identifier
fn new_chat_id() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_list_chats() {
        let store = ChatStore::in_memory().unwrap();

        let id = store.create_chat().unwrap();
        assert_eq!(id.len(), 24);
        assert!(store.chat_exists(&id).unwrap());

        let chats = store.list_chats(10).unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, id);
        assert_eq!(chats[0].message_count, 0);
    }

    #[test]
    fn test_add_and_get_messages() {
        let store = ChatStore::in_memory().unwrap();
        let id = store.create_chat().unwrap();

        store.add_message(&id, "user", "ciphertext-1").unwrap();
        store.add_message(&id, "assistant", "ciphertext-2").unwrap();

        let history = store.get_history(&id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "ciphertext-1");
        assert_eq!(history[1].role, "assistant");
    }

    #[test]
    fn test_delete_chat_cascades() {
        let store = ChatStore::in_memory().unwrap();
        let id = store.create_chat().unwrap();
        store.add_message(&id, "user", "ct").unwrap();

        assert!(store.delete_chat(&id).unwrap());
        assert!(!store.chat_exists(&id).unwrap());
        assert!(store.get_history(&id).unwrap().is_empty());
        assert!(!store.delete_chat(&id).unwrap());
    }

    #[test]
    fn test_stats_counts() {
        let store = ChatStore::in_memory().unwrap();
        let id = store.create_chat().unwrap();

        store.add_message(&id, "user", "ct").unwrap();
        store.add_message(&id, "assistant", "ct").unwrap();
        store.add_message(&id, "user", "ct").unwrap();
        store
            .record_event("anon", "recommendation", "2024-03-01T14:00:00+00:00")
            .unwrap();

        let stats = store.stats(None).unwrap();
        assert_eq!(stats.total_chats, 1);
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.user_messages, 2);
        assert_eq!(stats.assistant_messages, 1);
        assert_eq!(stats.avg_messages_per_chat, 3.0);
        assert_eq!(stats.daily_activity.len(), 1);
    }

    #[test]
    fn test_stats_window_excludes_old_rows() {
        let store = ChatStore::in_memory().unwrap();
        let id = store.create_chat().unwrap();
        store.add_message(&id, "user", "ct").unwrap();

        // A floor in the far future excludes everything
        let stats = store.stats(Some("9999-01-01T00:00:00+00:00")).unwrap();
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.total_chats, 0);
    }

    #[test]
    fn test_recommendation_events_counted() {
        let store = ChatStore::in_memory().unwrap();
        store
            .record_event("anon", "recommendation", "2024-03-01T14:00:00+00:00")
            .unwrap();
        store
            .record_event("anon", "recommendation", "2024-03-01T15:00:00+00:00")
            .unwrap();

        let stats = store.stats(None).unwrap();
        assert_eq!(stats.recommendations_served, 2);
    }
}
