//! End-to-end integration tests exercising the public API across
//! module boundaries: ingestion into a real SQLite-backed index,
//! retrieval through all three similarity modes, PII redaction,
//! input validation, and hallucination detection.

use std::sync::Arc;

use legal_research_engine::config::Config;
use legal_research_engine::domain::Chunk;
use legal_research_engine::embedding::{Embedder, FallbackEmbedder};
use legal_research_engine::hallucination::{check, null_retriever};
use legal_research_engine::objectstore::{canonicalize, ObjectUrl};
use legal_research_engine::search::{DefaultRetriever, Retriever, SimilarityEngine};
use legal_research_engine::security::{redact, validate_text};
use legal_research_engine::storage::{SqliteVectorIndex, VectorIndex};
use tempfile::TempDir;

/// Builds a populated in-memory vector index plus the embedder that
/// produced its vectors, so queries embed with the same function used
/// at insert time.
fn seeded_index() -> (Arc<SqliteVectorIndex>, Arc<FallbackEmbedder>) {
    let embedder = Arc::new(FallbackEmbedder::new(64));
    let index = Arc::new(SqliteVectorIndex::in_memory().expect("open in-memory index"));

    let cases = [
        ("[2025] 9 S.C.R. 100", "State v. Rao", "CA 10 of 2024", "the appellant was convicted of theft and sentenced"),
        ("[2025] 9 S.C.R. 200", "State v. Rao", "CA 10 of 2024", "on appeal the conviction for theft was upheld"),
        ("[2024] 3 S.C.R. 55", "Union of India v. Mehta", "WP 4 of 2023", "the writ petition concerns a contractual dispute"),
    ];

    for (ordinal, (citation, title, number, body)) in cases.iter().enumerate() {
        let mut chunk = Chunk::new(
            (*citation).to_string(),
            (*title).to_string(),
            (*number).to_string(),
            "Held".to_string(),
            ordinal,
            (*body).to_string(),
            1,
            5,
            "s3://cases-bucket/sample.pdf".to_string(),
            "sample.pdf".to_string(),
        );
        chunk.embedding = embedder.embed(body).expect("embed body");
        index.insert_chunk(&chunk).expect("insert chunk");
    }

    (index, embedder)
}

#[test]
fn test_index_persists_and_reopens_from_disk() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("index.sqlite3");

    {
        let index = SqliteVectorIndex::open(&path).expect("create index");
        let mut chunk = Chunk::new(
            "[2025] 9 S.C.R. 100".to_string(),
            "State v. Rao".to_string(),
            "CA 10 of 2024".to_string(),
            "Held".to_string(),
            0,
            "the appeal is dismissed".to_string(),
            1,
            2,
            "s3://cases-bucket/sample.pdf".to_string(),
            "sample.pdf".to_string(),
        );
        chunk.embedding = vec![1.0, 0.0, 0.0];
        index.insert_chunk(&chunk).expect("insert chunk");
    }

    let reopened = SqliteVectorIndex::open(&path).expect("reopen index");
    assert_eq!(reopened.chunk_count().expect("chunk_count"), 1);
}

#[test]
fn test_similarity_engine_deduped_cases_groups_by_case_key() {
    let (index, embedder) = seeded_index();
    let retriever = Arc::new(DefaultRetriever::with_index(embedder, index));
    let engine = SimilarityEngine::new(retriever);

    let hits = engine.deduped_cases("theft conviction appeal", 10).expect("deduped_cases");
    let unique_cases: std::collections::HashSet<_> =
        hits.iter().map(|h| h.chunk.case_key()).collect();
    assert_eq!(unique_cases.len(), hits.len(), "deduped mode must return at most one hit per case");
}

#[test]
fn test_similarity_engine_grouped_bundles_chunks_per_case() {
    let (index, embedder) = seeded_index();
    let retriever = Arc::new(DefaultRetriever::with_index(embedder, index));
    let engine = SimilarityEngine::new(retriever);

    let groups = engine.grouped("theft conviction appeal", 10, 5).expect("grouped");
    let rao_group = groups
        .iter()
        .find(|g| g.case_key.as_str().contains("S.C.R. 100") || g.case_key.as_str().contains("S.C.R. 200"))
        .expect("State v. Rao group present");
    assert!(rao_group.hits.len() >= 1);
}

#[test]
fn test_similarity_engine_raw_chunks_returns_ungrouped_hits() {
    let (index, embedder) = seeded_index();
    let retriever = Arc::new(DefaultRetriever::with_index(embedder, index));
    let engine = SimilarityEngine::new(retriever);

    let hits = engine.raw_chunks("theft conviction appeal", 10).expect("raw_chunks");
    assert!(hits.len() >= 2, "raw chunk mode should not dedupe across the same case");
}

#[test]
fn test_retriever_sees_only_sqlite_backed_index() {
    let (index, embedder) = seeded_index();
    let retriever = DefaultRetriever::with_index(embedder, index);

    let hits = retriever.retrieve("writ petition contractual dispute", 1).expect("retrieve");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.case_title, "Union of India v. Mehta");
}

#[test]
fn test_validator_then_redactor_pipeline() {
    let text = "Please review the dispute involving john.doe@example.com and Section 302 IPC.";
    let validation = validate_text(text, &Config::default());
    assert!(validation.is_valid);

    let redaction = redact(text, 0.7);
    assert!(!redaction.redacted_text.contains("john.doe@example.com"));
    assert!(redaction.redacted_text.contains("Section 302 IPC"));
}

#[test]
fn test_hallucination_check_over_synthesized_answer() {
    let answer = "The appellant relies on Section 302 of IPC and the fabricated Section 9999 of CrPC.";
    let report = check(answer, null_retriever().as_ref()).expect("check");
    assert!(report.has_hallucinations);
    assert_eq!(report.num_suspected, 1);
}

#[test]
fn test_object_url_round_trips_through_upload_and_canonicalize() {
    let s3_url = "s3://cases-bucket/state-v-rao.pdf";
    let https_url = ObjectUrl::parse(s3_url).expect("parse s3 url").to_https();
    let back = canonicalize(&https_url).expect("canonicalize https url");
    assert_eq!(back, s3_url);
}

mod property_tests {
    use proptest::prelude::*;

    use legal_research_engine::chunking::chunk_legal_text;
    use legal_research_engine::objectstore::{canonicalize, ObjectUrl};
    use legal_research_engine::security::redact;

    proptest! {
        #[test]
        fn chunk_bodies_never_exceed_max_size(
            body in "[a-zA-Z .]{1,4000}",
            max_size in 50usize..500,
        ) {
            let text = format!("Facts\n{body}");
            let pieces = chunk_legal_text(&text, max_size);
            for piece in &pieces {
                prop_assert!(piece.body.len() <= max_size);
            }
        }

        #[test]
        fn chunk_bodies_are_never_empty(body in "[a-zA-Z0-9 .\n]{0,2000}") {
            let pieces = chunk_legal_text(&body, 500);
            for piece in &pieces {
                prop_assert!(!piece.body.trim().is_empty());
            }
        }

        #[test]
        fn object_url_round_trip_law(
            bucket in "[a-z][a-z0-9-]{2,20}",
            key in "[a-z0-9/_.-]{1,40}",
        ) {
            // canonicalize(to_https(canonicalize(url))) == canonicalize(url)
            let original = format!("s3://{bucket}/{key}");
            if let Ok(first) = canonicalize(&original) {
                let https = ObjectUrl::parse(&first).unwrap().to_https();
                let second = canonicalize(&https).unwrap();
                prop_assert_eq!(first, second);
            }
        }

        #[test]
        fn redaction_is_idempotent(text in "[a-zA-Z0-9@. ]{0,200}") {
            let once = redact(&text, 0.7);
            let twice = redact(&once.redacted_text, 0.7);
            prop_assert_eq!(once.redacted_text, twice.redacted_text);
        }
    }
}
