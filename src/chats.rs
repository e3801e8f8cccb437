use crate::auth::TokenVerifier;
use crate::config::{self, find_haven_path, HavenConfig};
use crate::corpus;
use crate::crypto::{anonymize_hour, anonymous_id, MessageCipher};
use crate::error::{HavenError, Result};
use crate::llm::SupportClient;
use crate::matcher::{MoodMatcher, DEFAULT_K};
use crate::store::ChatStore;
use crate::types::{ChatMessage, ChatSummary, Recommendation, Role, UsageStats};
use std::fs;
use std::path::{Path, PathBuf};

/// Marker shown for a message whose ciphertext cannot be decrypted.
/// Undecryptable content is never passed off as plaintext.
pub const UNDECRYPTABLE: &str = "[undecryptable]";

/// The main application interface: chat store, message cipher, LLM client
/// and the mood matcher, behind one handle.
///
/// Everything is wired once at open time; afterwards the matcher and
/// cipher are read-only.
pub struct Chats {
    haven_path: PathBuf,
    store: ChatStore,
    cipher: MessageCipher,
    matcher: MoodMatcher,
    llm: Option<SupportClient>,
    anon_id: String,
}

impl Chats {
    /// Open an existing haven
    pub fn open() -> Result<Self> {
        let haven_path = find_haven_path().ok_or_else(|| {
            HavenError::Config("No .haven directory found. Run 'haven init' first.".to_string())
        })?;
        Self::open_at(haven_path)
    }

    /// Open a haven at a specific path
    pub fn open_at(haven_path: PathBuf) -> Result<Self> {
        if !haven_path.exists() {
            return Err(HavenError::Config(format!(
                "Path does not exist: {}",
                haven_path.display()
            )));
        }

        let store = ChatStore::open(&haven_path.join("chats.db"))?;
        let cfg = HavenConfig::new(haven_path.clone());

        let corpus = match cfg.corpus_file() {
            Some(ref file) => corpus::load_file(file)?,
            None => corpus::builtin(),
        };
        let matcher = MoodMatcher::fit(corpus, &cfg.strategy())?;

        let cipher = MessageCipher::from_hex(&config::encryption_key())?;

        let user_id = match config::session_token() {
            Some(token) => TokenVerifier::new(&config::token_secret()).verify(&token)?,
            None => "local".to_string(),
        };
        let anon_id = anonymous_id(&user_id, &config::anon_salt());

        let llm = match config::api_key() {
            Some(key) => Some(SupportClient::new(
                &cfg.llm_base_url(),
                &cfg.llm_model(),
                &key,
            )?),
            None => None,
        };

        Ok(Self {
            haven_path,
            store,
            cipher,
            matcher,
            llm,
            anon_id,
        })
    }

    /// Initialize a new haven
    pub fn init(path: &Path) -> Result<Self> {
        let haven_path = path.join(".haven");
        fs::create_dir_all(&haven_path)
            .map_err(|e| HavenError::Config(format!("Failed to create .haven: {}", e)))?;

        Self::open_at(haven_path)
    }

    pub fn haven_path(&self) -> &Path {
        &self.haven_path
    }

    pub fn matcher(&self) -> &MoodMatcher {
        &self.matcher
    }

    pub fn online(&self) -> bool {
        self.llm.is_some()
    }

    // =========================================================================
    // Chat operations
    // =========================================================================

    pub fn create_chat(&self) -> Result<String> {
        Ok(self.store.create_chat()?)
    }

    pub fn chat_exists(&self, chat_id: &str) -> Result<bool> {
        Ok(self.store.chat_exists(chat_id)?)
    }

    /// Encrypt and store a message, recording an anonymized usage event
    pub fn add_message(&self, chat_id: &str, role: Role, content: &str) -> Result<()> {
        let ciphertext = self.cipher.encrypt(content)?;
        self.store.add_message(chat_id, role.as_str(), &ciphertext)?;

        let kind = match role {
            Role::User => "message_user",
            Role::Assistant => "message_assistant",
        };
        self.store
            .record_event(&self.anon_id, kind, &anonymize_hour(chrono::Utc::now()))?;

        Ok(())
    }

    /// Decrypted history of a chat, oldest first. A message that fails to
    /// decrypt is surfaced with the `UNDECRYPTABLE` marker instead of
    /// being silently passed through.
    pub fn history(&self, chat_id: &str) -> Result<Vec<ChatMessage>> {
        let rows = self.store.get_history(chat_id)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(role) = Role::parse(&row.role) else {
                continue;
            };

            let content = match self.cipher.decrypt(&row.content) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(chat_id, error = %e, "message failed to decrypt");
                    UNDECRYPTABLE.to_string()
                }
            };

            messages.push(ChatMessage {
                role,
                content,
                timestamp: row.created_at,
            });
        }

        Ok(messages)
    }

    pub fn list_chats(&self, limit: usize) -> Result<Vec<ChatSummary>> {
        Ok(self.store.list_chats(limit)?)
    }

    pub fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        Ok(self.store.delete_chat(chat_id)?)
    }

    /// Record the user turn, produce a reply (LLM when configured,
    /// recommendation fallback otherwise), and record the assistant turn.
    pub fn respond(&self, chat_id: &str, user_input: &str) -> Result<String> {
        let history = self.history(chat_id)?;
        self.add_message(chat_id, Role::User, user_input)?;

        let reply = match &self.llm {
            Some(client) => match client.chat(&history, user_input) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "llm request failed, using offline reply");
                    self.offline_reply(user_input)
                }
            },
            None => self.offline_reply(user_input),
        };

        self.add_message(chat_id, Role::Assistant, &reply)?;
        Ok(reply)
    }

    /// Compose a supportive reply from the matcher alone. Any failure in
    /// the recommendation path degrades to a generic message rather than
    /// an error in the user's face.
    fn offline_reply(&self, user_input: &str) -> String {
        match self.matcher.recommend(user_input, DEFAULT_K) {
            Ok(recs) if recs.iter().any(|r| r.score > 0.0) => {
                let mut reply = String::from(
                    "Thank you for sharing that. A few things that might help:\n",
                );
                for (i, rec) in recs.iter().enumerate() {
                    reply.push_str(&format!("{}. {}\n", i + 1, rec.tip));
                }
                reply.push_str("Be gentle with yourself and take things one step at a time.");
                reply
            }
            Ok(_) => {
                "I'm here with you. Could you tell me a little more about how you're feeling?"
                    .to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not generate a recommendation");
                "I could not come up with a suggestion just now, but I'm here to listen."
                    .to_string()
            }
        }
    }

    // =========================================================================
    // Recommendations and analytics
    // =========================================================================

    /// Rank coping tips against free-text input
    pub fn recommend(&self, text: &str, k: usize) -> Result<Vec<Recommendation>> {
        let recs = self.matcher.recommend(text, k)?;
        self.store.record_event(
            &self.anon_id,
            "recommendation",
            &anonymize_hour(chrono::Utc::now()),
        )?;
        Ok(recs)
    }

    /// Usage statistics, optionally over the trailing `days` window
    pub fn stats(&self, days: Option<u32>) -> Result<UsageStats> {
        let since = days.map(|d| {
            (chrono::Utc::now() - chrono::Duration::days(i64::from(d))).to_rfc3339()
        });
        Ok(self.store.stats(since.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_haven(tag: &str) -> Chats {
        let dir = std::env::temp_dir().join(format!(
            "haven-chats-test-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Chats::init(&dir).unwrap()
    }

    #[test]
    fn test_init_and_create_chat() {
        let chats = temp_haven("init");
        let id = chats.create_chat().unwrap();

        assert!(chats.chat_exists(&id).unwrap());
        assert_eq!(chats.list_chats(10).unwrap().len(), 1);
    }

    #[test]
    fn test_messages_round_trip_through_cipher() {
        let chats = temp_haven("roundtrip");
        let id = chats.create_chat().unwrap();

        chats
            .add_message(&id, Role::User, "I feel anxious today")
            .unwrap();

        let history = chats.history(&id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "I feel anxious today");
    }

    #[test]
    fn test_offline_reply_suggests_tips() {
        let chats = temp_haven("offline");
        let reply = chats.offline_reply("I feel anxious today");
        assert!(reply.contains("1."));
    }

    #[test]
    fn test_offline_reply_generic_on_no_overlap() {
        let chats = temp_haven("generic");
        let reply = chats.offline_reply("zzz qqq www");
        assert!(!reply.contains("1."));
    }

    #[test]
    fn test_recommend_records_event() {
        let chats = temp_haven("events");
        let recs = chats.recommend("I feel anxious", 2).unwrap();

        assert_eq!(recs.len(), 2);
        let stats = chats.stats(None).unwrap();
        assert_eq!(stats.recommendations_served, 1);
    }

    #[test]
    fn test_stats_counts_roles() {
        let chats = temp_haven("stats");
        let id = chats.create_chat().unwrap();

        chats.add_message(&id, Role::User, "hello").unwrap();
        chats.add_message(&id, Role::Assistant, "hi there").unwrap();

        let stats = chats.stats(None).unwrap();
        assert_eq!(stats.total_messages, 2);
        assert_eq!(stats.user_messages, 1);
        assert_eq!(stats.assistant_messages, 1);
    }
}
