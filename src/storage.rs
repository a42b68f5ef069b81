//! Persistence contract for topics, questions and sessions, plus an in-memory adapter.
//!
//! The in-memory adapter owns:
//!   - the question bank (by id, plus a per-topic index in insertion order)
//!   - persisted sessions (by session id)
//!
//! The question bank is fixed at construction and shared without locking. Only the
//! session map sits behind a lock; each insert happens under one write guard, so
//! readers see a session either fully stored or not at all.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::domain::{Question, QuestionId, Session};
use crate::error::{Error, Result};

#[async_trait]
pub trait Storage: Send + Sync {
    /// All known topic names, sorted and unique.
    async fn get_topics(&self) -> Result<Vec<String>>;

    /// Questions belonging to any of `topics`.
    async fn get_questions(&self, topics: &[String]) -> Result<Vec<Question>>;

    /// Persist a session. All-or-nothing.
    async fn store_session(&self, session: &Session) -> Result<()>;

    /// Load a stored session, or `NotFound`.
    async fn get_session_by_session_id(&self, session_id: &str) -> Result<Session>;
}

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    by_id: Arc<HashMap<QuestionId, Question>>,
    by_topic: Arc<HashMap<String, Vec<QuestionId>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    questions_per_topic: Option<usize>,
}

impl InMemoryStorage {
    /// Build storage from a question list. Later duplicates of an id are dropped.
    pub fn new(questions: Vec<Question>, questions_per_topic: Option<usize>) -> Self {
        let mut id_map = HashMap::<QuestionId, Question>::new();
        let mut topic_map = HashMap::<String, Vec<QuestionId>>::new();

        for q in questions {
            let id = q.id();
            if id_map.contains_key(&id) {
                debug!(target: "kvs_quiz", %id, "Duplicate question id ignored");
                continue;
            }
            topic_map.entry(q.topic().to_string()).or_default().push(id);
            id_map.insert(id, q);
        }

        for (topic, ids) in &topic_map {
            info!(target: "kvs_quiz", %topic, count = ids.len(), "Startup question inventory");
        }

        Self {
            by_id: Arc::new(id_map),
            by_topic: Arc::new(topic_map),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            questions_per_topic,
        }
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    #[instrument(level = "debug", skip(self))]
    async fn get_topics(&self) -> Result<Vec<String>> {
        let mut topics: Vec<String> = self.by_topic.keys().cloned().collect();
        topics.sort();
        Ok(topics)
    }

    #[instrument(level = "debug", skip(self), fields(topics = ?topics))]
    async fn get_questions(&self, topics: &[String]) -> Result<Vec<Question>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for topic in topics {
            if !seen.insert(topic.as_str()) {
                continue;
            }
            let Some(ids) = self.by_topic.get(topic) else {
                debug!(target: "kvs_quiz", %topic, "No questions for topic");
                continue;
            };
            let picked: Vec<&QuestionId> = match self.questions_per_topic {
                Some(cap) if cap < ids.len() => ids.choose_multiple(&mut rand::thread_rng(), cap).collect(),
                _ => ids.iter().collect(),
            };
            for id in picked {
                if let Some(q) = self.by_id.get(id) {
                    out.push(q.clone());
                }
            }
        }
        Ok(out)
    }

    #[instrument(level = "debug", skip(self, session), fields(session_id = %session.session_id()))]
    async fn store_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.session_id()) {
            return Err(Error::Conflict(format!("session {} already stored", session.session_id())));
        }
        sessions.insert(session.session_id().to_string(), session.clone());
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(%session_id))]
    async fn get_session_by_session_id(&self, session_id: &str) -> Result<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))
    }
}
