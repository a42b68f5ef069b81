//! Application state shared by all handlers: the session service and the introspector.
//!
//! Built once at startup from `AppConfig`:
//!   - question bank = TOML bank (if any) followed by built-in seeds; bank ids win
//!   - in-memory storage over that bank
//!   - HTTP introspection when INTROSPECT_URL is set, static tokens otherwise

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{load_question_bank, AppConfig};
use crate::error::Result;
use crate::introspect::{HttpIntrospector, Introspector, StaticTokenIntrospector};
use crate::seeds::seed_questions;
use crate::service::SessionService;
use crate::storage::{InMemoryStorage, Storage};

#[derive(Clone)]
pub struct AppState {
    pub service: SessionService,
    pub introspector: Arc<dyn Introspector>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, introspector: Arc<dyn Introspector>, pass_threshold: f64) -> Self {
        Self {
            service: SessionService::new(storage).with_pass_threshold(pass_threshold),
            introspector,
        }
    }

    /// Build state from config: load bank + seeds, build storage and introspector.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let mut questions = cfg
            .question_bank_path
            .as_deref()
            .and_then(load_question_bank)
            .unwrap_or_default();
        questions.extend(seed_questions()?);

        let storage = InMemoryStorage::new(questions, cfg.questions_per_topic);

        let introspector: Arc<dyn Introspector> = match &cfg.introspect_url {
            Some(url) => {
                info!(target: "kvs_quiz", %url, timeout = ?cfg.introspect_timeout, "Token introspection via identity service");
                Arc::new(HttpIntrospector::new(url.clone(), cfg.introspect_timeout)?)
            }
            None => {
                warn!(target: "kvs_quiz", tokens = cfg.static_tokens.len(), "INTROSPECT_URL not set; using static token list");
                Arc::new(StaticTokenIntrospector::new(cfg.static_tokens.clone()))
            }
        };

        info!(target: "kvs_quiz", pass_threshold = cfg.pass_threshold, "Grading policy");
        Ok(Self::new(Arc::new(storage), introspector, cfg.pass_threshold))
    }
}
