//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;

use crate::analysis::AnalysisOutcome;
use crate::chat::ChatResponse;
use crate::domain::{GroupedCaseHit, RetrievalHit};
use crate::ingestion::IngestionReport;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string, defaulting to text for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Formats an ingestion report.
#[must_use]
pub fn format_ingestion_report(report: &IngestionReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&SerializableReport::from(report)),
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "Documents processed: {}", report.documents_processed);
            let _ = writeln!(out, "Chunks indexed:      {}", report.chunks_indexed);
            if !report.warnings.is_empty() {
                let _ = writeln!(out, "Warnings:");
                for warning in &report.warnings {
                    let _ = writeln!(out, "  - {warning}");
                }
            }
            out
        }
    }
}

#[derive(Serialize)]
struct SerializableReport<'a> {
    documents_processed: usize,
    chunks_indexed: usize,
    warnings: &'a [String],
}

impl<'a> From<&'a IngestionReport> for SerializableReport<'a> {
    fn from(report: &'a IngestionReport) -> Self {
        Self {
            documents_processed: report.documents_processed,
            chunks_indexed: report.chunks_indexed,
            warnings: &report.warnings,
        }
    }
}

/// Formats a list of deduped-case or raw-chunk hits.
#[must_use]
pub fn format_hits(hits: &[RetrievalHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&hits),
        OutputFormat::Text => {
            if hits.is_empty() {
                return "No matching precedents found.\n".to_string();
            }
            let mut out = String::new();
            for (i, hit) in hits.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. [{:.4}] {} — {} (page {}/{})",
                    i + 1,
                    hit.distance,
                    non_empty_or(&hit.chunk.case_title, "(untitled case)"),
                    non_empty_or(&hit.chunk.citation, "(no citation)"),
                    hit.chunk.page_number,
                    hit.chunk.total_pages,
                );
                let _ = writeln!(out, "   {}", hit.chunk.document_url);
            }
            out
        }
    }
}

/// Formats per-case grouped bundles (Mode C).
#[must_use]
pub fn format_grouped(groups: &[GroupedCaseHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&groups),
        OutputFormat::Text => {
            if groups.is_empty() {
                return "No matching precedents found.\n".to_string();
            }
            let mut out = String::new();
            for (i, group) in groups.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} [best {:.4}, {} chunk(s)]",
                    i + 1,
                    group.case_key.as_str(),
                    group.best_distance,
                    group.hits.len(),
                );
                for hit in &group.hits {
                    let _ = writeln!(
                        out,
                        "     - page {} ({}): {}",
                        hit.chunk.page_number,
                        hit.chunk.section,
                        truncate_preview(&hit.chunk.content, 80),
                    );
                }
            }
            out
        }
    }
}

/// Formats one chat turn's response.
#[must_use]
pub fn format_chat_response(response: &ChatResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&SerializableChatResponse::from(response)),
        OutputFormat::Text => {
            let mut out = response.response_text.clone();
            if response.degraded {
                out.push_str("\n\n(response degraded: the language model was unavailable)");
            }
            if let Some(report) = &response.hallucination_report {
                if report.has_hallucinations {
                    let _ = write!(
                        out,
                        "\n\nWarning: {} suspected unverifiable reference(s) detected.",
                        report.num_suspected
                    );
                }
            }
            out
        }
    }
}

#[derive(Serialize)]
struct SerializableChatResponse<'a> {
    response_text: &'a str,
    cited_precedents: &'a [RetrievalHit],
    follow_up_questions: &'a [String],
    degraded: bool,
}

impl<'a> From<&'a ChatResponse> for SerializableChatResponse<'a> {
    fn from(response: &'a ChatResponse) -> Self {
        Self {
            response_text: &response.response_text,
            cited_precedents: &response.cited_precedents,
            follow_up_questions: &response.follow_up_questions,
            degraded: response.degraded,
        }
    }
}

/// Formats a one-shot analysis outcome.
#[must_use]
pub fn format_analysis_response(outcome: &AnalysisOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&SerializableAnalysisOutcome::from(outcome)),
        OutputFormat::Text => {
            let mut out = outcome.response_text.clone();
            if outcome.degraded {
                out.push_str("\n\n(response degraded: the language model was unavailable)");
            }
            if let Some(report) = &outcome.hallucination_report {
                if report.has_hallucinations {
                    let _ = write!(
                        out,
                        "\n\nWarning: {} suspected unverifiable reference(s) detected.",
                        report.num_suspected
                    );
                }
            }
            out
        }
    }
}

#[derive(Serialize)]
struct SerializableAnalysisOutcome<'a> {
    response_text: &'a str,
    cited_precedents: &'a [RetrievalHit],
    degraded: bool,
}

impl<'a> From<&'a AnalysisOutcome> for SerializableAnalysisOutcome<'a> {
    fn from(outcome: &'a AnalysisOutcome) -> Self {
        Self {
            response_text: &outcome.response_text,
            cited_precedents: &outcome.cited_precedents,
            degraded: outcome.degraded,
        }
    }
}

/// Formats a top-level error for display, honoring the output format.
#[must_use]
pub fn format_error(error: &crate::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format!("{{\"error\": {:?}}}", error.to_string()),
        OutputFormat::Text => error.to_string(),
    }
}

fn non_empty_or<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.is_empty() { fallback } else { s }
}

fn truncate_preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim().replace('\n', " ");
    if trimmed.chars().count() <= max_chars {
        return trimmed;
    }
    let end = trimmed.char_indices().nth(max_chars).map_or(trimmed.len(), |(i, _)| i);
    format!("{}…", &trimmed[..end])
}
