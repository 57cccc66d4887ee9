//! `ChatEngine`: the stateful conversational orchestrator. Holds one
//! `parking_lot::Mutex`-guarded session table so concurrent
//! `send_message` calls on the same session id serialize, matching the
//! teacher's fine-grained-lock idiom already used by `SqliteVectorIndex`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::domain::{ChatSession, RetrievalHit, Turn, TurnMetadata};
use crate::error::{ChatError, Error, Result};
use crate::hallucination::{self, HallucinationAuditLog, HallucinationAuditRecord, HallucinationReport};
use crate::llm::{CompletionRequest, LlmClient};
use crate::objectstore::ObjectStore;
use crate::prompt::{self, ContextEntry};
use crate::search::{Retriever, SimilarityEngine};
use crate::security::SecurityEnforcer;

/// Number of hits pulled for chat-turn retrieval context.
const CHAT_RAG_HIT_LIMIT: usize = 5;
/// Max excerpt length fetched per hit from the source document.
const EXCERPT_CHAR_BOUND: usize = 1000;
/// LLM timeout for chat turns.
const CHAT_LLM_TIMEOUT: Duration = Duration::from_secs(180);

static SESSION_SEQUENCE: AtomicU32 = AtomicU32::new(0);

fn next_session_id(now: i64) -> String {
    let seq = SESSION_SEQUENCE.fetch_add(1, Ordering::SeqCst);
    format!("SESS_{}_{seq:06}", crate::timestamp::format_compact(now))
}

/// Result of a successful `send_message` call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub response_text: String,
    pub cited_precedents: Vec<RetrievalHit>,
    pub follow_up_questions: Vec<String>,
    pub hallucination_report: Option<HallucinationReport>,
    pub degraded: bool,
}

/// `send_message` failure: either the session was invalid, or the
/// input was rejected by the Security Enforcer (not an `Error`, since
/// a validation rejection is an expected outcome, not a fault).
#[derive(Debug, Clone)]
pub enum SendMessageError {
    SessionNotFound,
    SessionTerminated,
    ValidationFailed { violations: Vec<String> },
    Internal(String),
}

impl From<Error> for SendMessageError {
    fn from(err: Error) -> Self {
        Self::Internal(err.to_string())
    }
}

struct SessionEntry {
    session: Mutex<ChatSession>,
    /// Top-N hits captured at `start_session`, retained so a session
    /// carries forward its originating case's retrieval context even
    /// after later turns narrow the conversation.
    initial_hits: Vec<RetrievalHit>,
}

/// Orchestrates session state plus the per-turn security, retrieval,
/// excerpt-enrichment, prompt-assembly, completion, and annotation
/// pipeline.
pub struct ChatEngine {
    sessions: Mutex<HashMap<String, Arc<SessionEntry>>>,
    similarity: SimilarityEngine,
    retriever: Arc<dyn Retriever>,
    object_store: Arc<dyn ObjectStore>,
    llm: Box<dyn LlmClient>,
    security: SecurityEnforcer,
    hallucination_log: HallucinationAuditLog,
}

impl ChatEngine {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        object_store: Arc<dyn ObjectStore>,
        llm: Box<dyn LlmClient>,
        security: SecurityEnforcer,
        config: &Config,
    ) -> Result<Self> {
        let hallucination_log =
            HallucinationAuditLog::open(&config.audit_log_dir.join("hallucination.jsonl"))?;
        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            similarity: SimilarityEngine::new(retriever.clone()),
            retriever,
            object_store,
            llm,
            security,
            hallucination_log,
        })
    }

    /// Opens a session anchored to `case_text`, capturing the top-5
    /// Mode A hits for the originating case as its initial context.
    pub fn start_session(
        &self,
        user_id: &str,
        case_text: &str,
        case_title: &str,
        now: i64,
    ) -> Result<String> {
        let initial_hits = self.similarity.deduped_cases(case_text, 5)?;
        let session_id = next_session_id(now);
        let session = ChatSession::new(session_id.clone(), user_id, case_text, case_title, now);

        self.sessions.lock().insert(
            session_id.clone(),
            Arc::new(SessionEntry {
                session: Mutex::new(session),
                initial_hits,
            }),
        );
        Ok(session_id)
    }

    /// Permanently terminates a session. Idempotent.
    pub fn delete_session(&self, session_id: &str, now: i64) -> Result<()> {
        let entry = self.session_entry(session_id)?;
        entry.session.lock().terminate(now);
        Ok(())
    }

    fn session_entry(&self, session_id: &str) -> Result<Arc<SessionEntry>> {
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::Chat(ChatError::SessionNotFound {
                session_id: session_id.to_string(),
            }))
    }

    /// Runs one chat turn end to end: security gate, case retrieval,
    /// excerpt enrichment, prompt assembly, LLM completion, then
    /// hallucination annotation, then appends both turns to the
    /// session.
    pub fn send_message(
        &self,
        session_id: &str,
        user_id: &str,
        ip: &str,
        user_message: &str,
        use_rag: bool,
        now: i64,
    ) -> std::result::Result<ChatResponse, SendMessageError> {
        let entry = self
            .session_entry(session_id)
            .map_err(|_| SendMessageError::SessionNotFound)?;

        // Per-session lock: concurrent calls on the same session
        // serialize for the remainder of this function.
        let mut session = entry.session.lock();
        if session.is_terminated() {
            return Err(SendMessageError::SessionTerminated);
        }

        let enforcement = self
            .security
            .process(user_message, user_id, ip, now)
            .map_err(SendMessageError::from)?;
        if !enforcement.success {
            return Err(SendMessageError::ValidationFailed {
                violations: enforcement.violations,
            });
        }
        let sanitized_input = enforcement.processed_text;

        let hits = if use_rag {
            let query = format!("{} {}", session.case_context_text, sanitized_input);
            self.similarity
                .deduped_cases(&query, CHAT_RAG_HIT_LIMIT)?
        } else {
            entry.initial_hits.clone()
        };

        let excerpts: Vec<Option<String>> = hits
            .iter()
            .map(|hit| fetch_excerpt(self.object_store.as_ref(), hit, EXCERPT_CHAR_BOUND))
            .collect();
        let entries: Vec<ContextEntry<'_>> = hits
            .iter()
            .zip(excerpts.iter())
            .map(|(hit, excerpt)| ContextEntry {
                hit,
                excerpt: excerpt.clone(),
            })
            .collect();

        let built = prompt::build_chat_prompt(
            &sanitized_input,
            &entries,
            &session.turns,
            prompt::DEFAULT_HISTORY_WINDOW,
        );

        let citations_used: Vec<String> = hits.iter().map(|h| h.case_key().as_str().to_string()).collect();

        let completion = self.llm.complete(&CompletionRequest {
            system: built.system,
            user_message: built.user_message,
            max_tokens: 1024,
            temperature: 0.2,
            timeout: CHAT_LLM_TIMEOUT,
        });

        let (response_text, hallucination_report, degraded) = match completion {
            Ok(text) => {
                let report = hallucination::check(&text, self.retriever.as_ref())?;
                self.hallucination_log.append(&HallucinationAuditRecord::new(
                    now,
                    user_id,
                    &sanitized_input,
                    &text,
                    &report,
                ))?;
                (text, Some(report), false)
            }
            Err(_) => (fallback_response(&hits), None, true),
        };

        let follow_up_questions = extract_follow_up_questions(&response_text);

        let metadata = TurnMetadata {
            citations_used,
            hallucination_warnings: hallucination_report
                .as_ref()
                .map(|r| r.suspected_fake_refs.clone())
                .unwrap_or_default(),
            degraded,
        };

        session
            .push_turn(Turn::user(sanitized_input, now), now)
            .map_err(|e| SendMessageError::Internal(e.to_string()))?;
        session
            .push_turn(Turn::assistant(response_text.clone(), now, metadata), now)
            .map_err(|e| SendMessageError::Internal(e.to_string()))?;

        Ok(ChatResponse {
            response_text,
            cited_precedents: hits,
            follow_up_questions,
            hallucination_report,
            degraded,
        })
    }
}

/// Fetches a page excerpt from the source document, bounded to
/// `max_chars`. Errors degrade the turn silently by omitting the
/// excerpt.
fn fetch_excerpt(store: &dyn ObjectStore, hit: &RetrievalHit, max_chars: usize) -> Option<String> {
    match crate::pdf::extract_page_content(store, &hit.chunk.document_url, hit.chunk.page_number) {
        Ok(text) if !text.is_empty() => Some(text.chars().take(max_chars).collect()),
        _ => None,
    }
}

/// Structured fallback enumerating the retrieval hits without
/// synthesis, used when the LLM call times out or errors.
fn fallback_response(hits: &[RetrievalHit]) -> String {
    if hits.is_empty() {
        return "## Current Case Summary\n\nThe assistant is temporarily unavailable and no precedents were retrieved for this query.".to_string();
    }
    let mut out = String::from(
        "## Current Case Summary\n\nThe assistant is temporarily unavailable. Below are the retrieved precedents without synthesis.\n\n## Similar Precedents Found\n\n",
    );
    for (i, hit) in hits.iter().enumerate() {
        let chunk = &hit.chunk;
        out.push_str(&format!(
            "{}. {} — {} — page {} — {}\n",
            i + 1,
            chunk.case_title,
            chunk.citation,
            chunk.page_number,
            chunk.document_url,
        ));
    }
    out
}

/// Parses a "## Suggested Follow-up Questions" section into a flat
/// list, one question per bulleted or numbered line. Absent section
/// yields an empty list.
fn extract_follow_up_questions(response_text: &str) -> Vec<String> {
    let marker = "## Suggested Follow-up Questions";
    let Some(start) = response_text.find(marker) else {
        return Vec::new();
    };
    let after = &response_text[start + marker.len()..];
    let section_end = after.find("\n## ").unwrap_or(after.len());
    after[..section_end]
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start_matches(['-', '*', ' ']).trim();
            let trimmed = trimmed.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ');
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chunk;
    use crate::embedding::FallbackEmbedder;
    use crate::llm::OfflineLlmClient;
    use crate::objectstore::LocalFsObjectStore;
    use crate::search::DefaultRetriever;
    use crate::storage::{SqliteVectorIndex, VectorIndex};
    use tempfile::tempdir;

    fn engine() -> (ChatEngine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let embedder = Arc::new(FallbackEmbedder::new(32));
        let index = Arc::new(SqliteVectorIndex::in_memory().unwrap());

        let mut chunk = Chunk::new(
            "cite-1".to_string(),
            "State v. Singh".to_string(),
            "CA 1".to_string(),
            "Held".to_string(),
            0,
            "the appellant was convicted of theft".to_string(),
            1,
            3,
            "s3://bucket/a.pdf".to_string(),
            "a.pdf".to_string(),
        );
        chunk.embedding = embedder.embed(&chunk.content).unwrap();
        index.insert_chunk(&chunk).unwrap();

        let retriever: Arc<dyn Retriever> = Arc::new(DefaultRetriever::with_index(embedder, index));
        let object_store: Arc<dyn ObjectStore> = Arc::new(LocalFsObjectStore::new(dir.path().join("objects"), "bucket"));
        let llm: Box<dyn LlmClient> = Box::new(OfflineLlmClient);

        let mut config = crate::config::Config::default();
        config.audit_log_dir = dir.path().join("audit");
        let security = SecurityEnforcer::new(config.clone()).unwrap();

        (
            ChatEngine::new(retriever, object_store, llm, security, &config).unwrap(),
            dir,
        )
    }

    #[test]
    fn test_start_session_is_fresh_until_first_message() {
        let (engine, _dir) = engine();
        let session_id = engine
            .start_session("user-1", "theft conviction case", "State v. Singh", 1_700_000_000)
            .unwrap();
        assert!(session_id.starts_with("SESS_"));
    }

    #[test]
    fn test_send_message_rejects_invalid_input() {
        let (engine, _dir) = engine();
        let session_id = engine
            .start_session("user-1", "theft conviction case", "State v. Singh", 1_700_000_000)
            .unwrap();
        let result = engine.send_message(&session_id, "user-1", "127.0.0.1", "short", true, 1_700_000_001);
        assert!(matches!(result, Err(SendMessageError::ValidationFailed { .. })));
    }

    #[test]
    fn test_send_message_succeeds_and_appends_turns() {
        let (engine, _dir) = engine();
        let session_id = engine
            .start_session("user-1", "theft conviction case", "State v. Singh", 1_700_000_000)
            .unwrap();
        let response = engine
            .send_message(
                &session_id,
                "user-1",
                "127.0.0.1",
                "What was the outcome of the theft conviction appeal?",
                true,
                1_700_000_001,
            )
            .unwrap();
        assert!(!response.response_text.is_empty());
        assert!(!response.degraded);
    }

    #[test]
    fn test_send_message_on_terminated_session_fails() {
        let (engine, _dir) = engine();
        let session_id = engine
            .start_session("user-1", "theft conviction case", "State v. Singh", 1_700_000_000)
            .unwrap();
        engine.delete_session(&session_id, 1_700_000_001).unwrap();
        let result = engine.send_message(
            &session_id,
            "user-1",
            "127.0.0.1",
            "What was the outcome of the theft conviction appeal?",
            true,
            1_700_000_002,
        );
        assert!(matches!(result, Err(SendMessageError::SessionTerminated)));
    }

    #[test]
    fn test_send_message_on_unknown_session_fails() {
        let (engine, _dir) = engine();
        let result = engine.send_message(
            "SESS_does_not_exist",
            "user-1",
            "127.0.0.1",
            "What was the outcome of the theft conviction appeal?",
            true,
            1_700_000_000,
        );
        assert!(matches!(result, Err(SendMessageError::SessionNotFound)));
    }

    #[test]
    fn test_extract_follow_up_questions_parses_bulleted_list() {
        let text = "## Strategic Recommendations\n\nDo X.\n\n## Suggested Follow-up Questions\n\n- What is the limitation period?\n- Was bail granted?\n\n## All References\n\nNone.";
        let questions = extract_follow_up_questions(text);
        assert_eq!(questions, vec!["What is the limitation period?", "Was bail granted?"]);
    }

    #[test]
    fn test_extract_follow_up_questions_absent_section_is_empty() {
        assert!(extract_follow_up_questions("## Current Case Summary\n\nNo follow-ups here.").is_empty());
    }
}
