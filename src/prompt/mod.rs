//! Prompt builder: assembles a grounded LLM request out of a fixed
//! system instruction, a retrieval-context block, and the sanitized
//! user input (plus, in chat, prior turns).
//!
//! Token-budget trimming follows a fixed priority order: trim excerpt
//! bodies before dropping hits, drop whole hits before dropping
//! metadata. Citation and URL fields are never truncated.

use std::fmt::Write as _;

use crate::domain::{RetrievalHit, Turn, TurnRole};

/// Fixed system instruction describing the assistant's role and the
/// required Markdown output shape.
pub const SYSTEM_INSTRUCTION: &str = r"You are a legal research assistant for Indian case law. You are given a set of retrieved precedent excerpts and a user question. Answer strictly from the provided excerpts and conversation history; never invent citations, section numbers, or case facts not present in the context.

Respond in Markdown with exactly these sections, omitting a section only if you have nothing to put in it:

## Current Case Summary
A concise restatement of the case under discussion.

## Similar Precedents Found
A numbered list. Each entry must carry: case title, citation, page number, a one-sentence relevance explanation, a direct quote from the excerpt, and the document URL.

## Strategic Recommendations
Actionable guidance grounded in the precedents above.

## All References
Every statute section, constitutional article, and case citation mentioned above, listed once each.

Do not fabricate a reference that does not appear in the retrieval context or conversation history.";

/// One hit formatted for inclusion in the retrieval-context block,
/// alongside its optional page excerpt pulled from the source
/// document.
pub struct ContextEntry<'a> {
    pub hit: &'a RetrievalHit,
    /// Full-page excerpt text, if fetched. `None` when the fetch was
    /// skipped or failed (degrades silently).
    pub excerpt: Option<String>,
}

/// Maximum excerpt length kept per hit before truncation, in bytes —
/// bounded to roughly 1000 chars per hit.
pub const MAX_EXCERPT_LEN: usize = 1000;

/// Assembled prompt ready for the LLM client: a system instruction and
/// a user-role message combining the retrieval context, prior turns,
/// and the sanitized new input.
pub struct BuiltPrompt {
    pub system: String,
    pub user_message: String,
}

/// Builds the retrieval-context block for one hit:
/// `<index>. <case_title> — <citation> — page <n> — section <header>`
/// followed by the excerpt (or chunk content if no excerpt was
/// fetched) and the document URL.
fn format_entry(index: usize, entry: &ContextEntry<'_>) -> String {
    let chunk = &entry.hit.chunk;
    let body = entry
        .excerpt
        .as_deref()
        .unwrap_or(chunk.content.as_str());
    let truncated = truncate_excerpt(body, MAX_EXCERPT_LEN);

    format!(
        "{index}. {title} — {citation} — page {page} — section {section}\n{body}\n{url}",
        index = index + 1,
        title = non_empty_or(&chunk.case_title, "Untitled case"),
        citation = non_empty_or(&chunk.citation, "no citation"),
        page = chunk.page_number,
        section = chunk.section,
        body = truncated,
        url = chunk.document_url,
    )
}

fn non_empty_or<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.trim().is_empty() {
        fallback
    } else {
        s
    }
}

/// Truncates an excerpt body to at most `max_len` bytes on a char
/// boundary, appending an ellipsis marker when truncated.
fn truncate_excerpt(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut boundary = max_len;
    while boundary > 0 && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    format!("{}…", &text[..boundary])
}

/// Renders the retrieval-context block from a list of entries, trimming
/// to fit `max_chars`. Trimming order: shrink excerpt bodies first, then
/// drop whole trailing entries. Case title/citation/URL are never
/// shortened.
#[must_use]
pub fn build_context_block(entries: &[ContextEntry<'_>], max_chars: usize) -> String {
    let mut excerpt_budget = MAX_EXCERPT_LEN;

    loop {
        let rendered: Vec<String> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let chunk = &entry.hit.chunk;
                let body = entry.excerpt.as_deref().unwrap_or(chunk.content.as_str());
                let truncated = truncate_excerpt(body, excerpt_budget);
                format!(
                    "{index}. {title} — {citation} — page {page} — section {section}\n{body}\n{url}",
                    index = i + 1,
                    title = non_empty_or(&chunk.case_title, "Untitled case"),
                    citation = non_empty_or(&chunk.citation, "no citation"),
                    page = chunk.page_number,
                    section = chunk.section,
                    body = truncated,
                    url = chunk.document_url,
                )
            })
            .collect();

        let block = rendered.join("\n\n");
        if block.len() <= max_chars || excerpt_budget == 0 {
            return block;
        }
        // Shrink excerpt bodies first.
        if excerpt_budget > 100 {
            excerpt_budget /= 2;
            continue;
        }
        // Excerpts are as small as we'll make them; drop the last hit
        // and retry with the full remaining list re-rendered.
        if entries.len() <= 1 {
            return block;
        }
        return build_context_block(&entries[..entries.len() - 1], max_chars);
    }
}

/// Renders a prior turn as a `Role: content` line for inclusion in the
/// user message, capped to `window` most recent turns.
fn render_history(turns: &[Turn], window: usize) -> String {
    let start = turns.len().saturating_sub(window);
    turns[start..]
        .iter()
        .map(|turn| {
            let role = match turn.role {
                TurnRole::User => "User",
                TurnRole::Assistant => "Assistant",
            };
            format!("{role}: {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default number of prior turns included in chat prompts, capped at
/// a fixed window.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Builds a one-shot query prompt: retrieval context plus the sanitized
/// user input, no conversation history.
#[must_use]
pub fn build_query_prompt(sanitized_input: &str, entries: &[ContextEntry<'_>]) -> BuiltPrompt {
    let context_block = build_context_block(entries, 20_000);
    let mut user_message = String::new();
    let _ = write!(
        user_message,
        "## Retrieved precedents\n\n{context_block}\n\n## Question\n\n{sanitized_input}"
    );
    BuiltPrompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user_message,
    }
}

/// Builds a chat-turn prompt: retrieval context, prior turn history
/// (capped at `history_window`), and the sanitized new message.
#[must_use]
pub fn build_chat_prompt(
    sanitized_input: &str,
    entries: &[ContextEntry<'_>],
    prior_turns: &[Turn],
    history_window: usize,
) -> BuiltPrompt {
    let context_block = build_context_block(entries, 20_000);
    let history = render_history(prior_turns, history_window);

    let mut user_message = String::new();
    let _ = write!(user_message, "## Retrieved precedents\n\n{context_block}\n\n");
    if !history.is_empty() {
        let _ = write!(user_message, "## Conversation so far\n\n{history}\n\n");
    }
    let _ = write!(user_message, "## New message\n\n{sanitized_input}");

    BuiltPrompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chunk;

    fn hit(citation: &str, title: &str, content: &str) -> RetrievalHit {
        RetrievalHit {
            chunk: Chunk::new(
                citation.to_string(),
                title.to_string(),
                "CA 1 of 2024".to_string(),
                "Held".to_string(),
                0,
                content.to_string(),
                3,
                10,
                "s3://bucket/a.pdf".to_string(),
                "a.pdf".to_string(),
            ),
            distance: 0.1,
            query: "q".to_string(),
        }
    }

    #[test]
    fn test_format_entry_includes_all_fields() {
        let h = hit("[2025] 9 S.C.R. 585", "State v. Singh", "The appeal is allowed.");
        let entry = ContextEntry {
            hit: &h,
            excerpt: None,
        };
        let rendered = format_entry(0, &entry);
        assert!(rendered.contains("State v. Singh"));
        assert!(rendered.contains("[2025] 9 S.C.R. 585"));
        assert!(rendered.contains("page 3"));
        assert!(rendered.contains("section Held"));
        assert!(rendered.contains("s3://bucket/a.pdf"));
    }

    #[test]
    fn test_truncate_excerpt_preserves_short_text() {
        assert_eq!(truncate_excerpt("short", 1000), "short");
    }

    #[test]
    fn test_truncate_excerpt_shortens_long_text() {
        let long = "a".repeat(2000);
        let truncated = truncate_excerpt(&long, 1000);
        assert!(truncated.len() <= 1001); // 1000 bytes + ellipsis char bytes
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_context_block_never_truncates_citation_or_url() {
        let h = hit("[2025] 9 S.C.R. 585", "State v. Singh", &"x".repeat(5000));
        let entries = vec![ContextEntry {
            hit: &h,
            excerpt: None,
        }];
        let block = build_context_block(&entries, 200);
        assert!(block.contains("[2025] 9 S.C.R. 585"));
        assert!(block.contains("s3://bucket/a.pdf"));
    }

    #[test]
    fn test_context_block_drops_hits_before_dropping_metadata() {
        let h1 = hit("cite-1", "Case One", &"x".repeat(50));
        let h2 = hit("cite-2", "Case Two", &"y".repeat(50));
        let entries = vec![
            ContextEntry { hit: &h1, excerpt: None },
            ContextEntry { hit: &h2, excerpt: None },
        ];
        // Budget too small to fit both even with minimal excerpts, but
        // large enough for the first entry's metadata.
        let block = build_context_block(&entries, 150);
        assert!(block.contains("cite-1"));
    }

    #[test]
    fn test_build_query_prompt_contains_system_instruction_and_input() {
        let h = hit("cite-1", "Case One", "body text");
        let entries = vec![ContextEntry { hit: &h, excerpt: None }];
        let prompt = build_query_prompt("what is the holding?", &entries);
        assert_eq!(prompt.system, SYSTEM_INSTRUCTION);
        assert!(prompt.user_message.contains("what is the holding?"));
        assert!(prompt.user_message.contains("cite-1"));
    }

    #[test]
    fn test_build_chat_prompt_includes_history_window() {
        let turns: Vec<Turn> = (0..20)
            .map(|i| Turn::user(format!("turn {i}"), i as i64))
            .collect();
        let prompt = build_chat_prompt("new message", &[], &turns, 3);
        assert!(prompt.user_message.contains("turn 17"));
        assert!(prompt.user_message.contains("turn 19"));
        assert!(!prompt.user_message.contains("turn 0\n"));
        assert!(prompt.user_message.contains("new message"));
    }

    #[test]
    fn test_excerpt_preferred_over_chunk_content_when_present() {
        let h = hit("cite-1", "Case One", "fallback content");
        let entries = vec![ContextEntry {
            hit: &h,
            excerpt: Some("full page excerpt".to_string()),
        }];
        let block = build_context_block(&entries, 20_000);
        assert!(block.contains("full page excerpt"));
        assert!(!block.contains("fallback content"));
    }
}
