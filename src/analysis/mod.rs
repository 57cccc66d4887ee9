//! One-shot analysis pipeline: the non-conversational half of the
//! query flow — security screening, similarity retrieval, prompt
//! assembly, LLM completion, then hallucination annotation before
//! returning to the caller. The chat engine runs the same pipeline per
//! turn with session history and document excerpts layered on top;
//! this module is the plain, single-question entry point.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hallucination::{self, HallucinationAuditLog, HallucinationAuditRecord, HallucinationReport};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::{self, ContextEntry};
use crate::search::{Retriever, SimilarityEngine};
use crate::security::SecurityEnforcer;

/// LLM timeout for one-shot analysis: up to 180s, same ceiling the
/// chat path uses.
const ANALYSIS_LLM_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(180);

/// Result of a successful `AnalysisEngine::analyze` call.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub response_text: String,
    pub cited_precedents: Vec<crate::domain::RetrievalHit>,
    pub hallucination_report: Option<HallucinationReport>,
    pub degraded: bool,
}

/// `analyze` failure: either the input was rejected by the Security
/// Enforcer, or a fault occurred (retrieval/storage).
#[derive(Debug, Clone)]
pub enum AnalysisError {
    ValidationFailed { violations: Vec<String> },
    Internal(String),
}

impl From<Error> for AnalysisError {
    fn from(err: Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Orchestrates security screening, retrieval, prompt assembly, and
/// completion for a single query, with no session state kept (as
/// opposed to the chat flow layered on top of it).
pub struct AnalysisEngine {
    similarity: SimilarityEngine,
    retriever: Arc<dyn Retriever>,
    llm: Box<dyn LlmClient>,
    security: SecurityEnforcer,
    hallucination_log: HallucinationAuditLog,
}

impl AnalysisEngine {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Box<dyn LlmClient>,
        security: SecurityEnforcer,
        config: &Config,
    ) -> Result<Self> {
        let hallucination_log =
            HallucinationAuditLog::open(&config.audit_log_dir.join("hallucination.jsonl"))?;
        Ok(Self {
            similarity: SimilarityEngine::new(retriever.clone()),
            retriever,
            llm,
            security,
            hallucination_log,
        })
    }

    /// Runs one analysis end to end: security gate, case retrieval over
    /// the sanitized input, prompt assembly, LLM completion, then
    /// hallucination annotation plus audit-log write.
    pub fn analyze(
        &self,
        query_text: &str,
        user_id: &str,
        ip: &str,
        k: usize,
        now: i64,
    ) -> std::result::Result<AnalysisOutcome, AnalysisError> {
        let enforcement = self.security.process(query_text, user_id, ip, now)?;
        if !enforcement.success {
            return Err(AnalysisError::ValidationFailed {
                violations: enforcement.violations,
            });
        }
        let sanitized_input = enforcement.processed_text;

        let hits = self.similarity.deduped_cases(&sanitized_input, k)?;
        let entries: Vec<ContextEntry<'_>> = hits
            .iter()
            .map(|hit| ContextEntry { hit, excerpt: None })
            .collect();
        let built = prompt::build_query_prompt(&sanitized_input, &entries);

        let completion = self.llm.complete(&CompletionRequest {
            system: built.system,
            user_message: built.user_message,
            max_tokens: 1024,
            temperature: 0.2,
            timeout: ANALYSIS_LLM_TIMEOUT,
        });

        let (response_text, hallucination_report, degraded) = match completion {
            Ok(text) => {
                let report = hallucination::check(&text, self.retriever.as_ref())?;
                self.hallucination_log.append(&HallucinationAuditRecord::new(
                    now,
                    user_id,
                    query_text,
                    &text,
                    &report,
                ))?;
                (text, Some(report), false)
            }
            Err(_) => (fallback_response(&hits), None, true),
        };

        Ok(AnalysisOutcome {
            response_text,
            cited_precedents: hits,
            hallucination_report,
            degraded,
        })
    }
}

/// Structured fallback enumerating the retrieval hits without
/// synthesis, used when the LLM call times out or errors: falls back
/// to a deterministic listing of retrieval hits labeled degraded,
/// never blocks the user.
fn fallback_response(hits: &[crate::domain::RetrievalHit]) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chunk;
    use crate::embedding::FallbackEmbedder;
    use crate::llm::OfflineLlmClient;
    use crate::search::DefaultRetriever;
    use crate::storage::{SqliteVectorIndex, VectorIndex};
    use tempfile::tempdir;

    fn engine() -> (AnalysisEngine, tempfile::TempDir) {
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
        let llm: Box<dyn LlmClient> = Box::new(OfflineLlmClient);

        let mut config = Config::default();
        config.audit_log_dir = dir.path().join("audit");
        let security = SecurityEnforcer::new(config.clone()).unwrap();

        (
            AnalysisEngine::new(retriever, llm, security, &config).unwrap(),
            dir,
        )
    }

    #[test]
    fn test_analyze_rejects_invalid_input() {
        let (engine, _dir) = engine();
        let result = engine.analyze("short", "user-1", "127.0.0.1", 5, 1_700_000_000);
        assert!(matches!(result, Err(AnalysisError::ValidationFailed { .. })));
    }

    #[test]
    fn test_analyze_returns_grounded_response() {
        let (engine, _dir) = engine();
        let response = engine
            .analyze(
                "What precedents discuss theft conviction appeals?",
                "user-1",
                "127.0.0.1",
                5,
                1_700_000_000,
            )
            .unwrap();
        assert!(!response.response_text.is_empty());
        assert!(!response.degraded);
        assert!(!response.cited_precedents.is_empty());
    }

    #[test]
    fn test_analyze_writes_hallucination_audit_record() {
        let (engine, dir) = engine();
        engine
            .analyze(
                "What precedents discuss theft conviction appeals?",
                "user-1",
                "127.0.0.1",
                5,
                1_700_000_000,
            )
            .unwrap();
        let log_path = dir.path().join("audit").join("hallucination.jsonl");
        let contents = std::fs::read_to_string(log_path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
