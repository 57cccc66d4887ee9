//! Chat session state: the chat engine's persisted unit of
//! conversation history.

use serde::{Deserialize, Serialize};

use super::Reference;

/// Lifecycle state of a `ChatSession` (`Fresh -> Active
/// -> ... -> Terminated`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, no turns exchanged yet.
    Fresh,
    /// At least one turn has been exchanged.
    Active,
    /// Deleted; no further turns may be appended.
    Terminated,
}

/// Who produced a `Turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Metadata attached to an assistant `Turn`: the citations it grounded
/// its answer in, and any hallucination warnings raised against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnMetadata {
    /// Citations (case keys as strings) of retrieval hits used to
    /// ground this turn's answer.
    pub citations_used: Vec<String>,
    /// References flagged by the hallucination detector for this
    /// turn's content, if any.
    pub hallucination_warnings: Vec<Reference>,
    /// True when the LLM call timed out and a fallback response was
    /// substituted.
    pub degraded: bool,
}

/// One message in a `ChatSession`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// Unix-seconds timestamp.
    pub timestamp: i64,
    pub metadata: TurnMetadata,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp,
            metadata: TurnMetadata::default(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>, timestamp: i64, metadata: TurnMetadata) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp,
            metadata,
        }
    }
}

/// A chat session anchored to a case context, holding ordered turns.
///
/// Mutation goes through `ChatEngine`, which holds a per-session lock so
/// concurrent `send_message` calls on the same session serialize
/// .
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    /// The case text the session was opened against.
    pub case_context_text: String,
    /// The case title the session was opened against, if known.
    pub case_context_title: String,
    pub turns: Vec<Turn>,
    pub created_at: i64,
    pub updated_at: i64,
    pub state: SessionState,
}

impl ChatSession {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        case_context_text: impl Into<String>,
        case_context_title: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            case_context_text: case_context_text.into(),
            case_context_title: case_context_title.into(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
            state: SessionState::Fresh,
        }
    }

    /// Appends a turn, transitioning `Fresh -> Active` on the first
    /// append. Returns an error description if the session is already
    /// `Terminated`.
    pub fn push_turn(&mut self, turn: Turn, now: i64) -> Result<(), &'static str> {
        if self.state == SessionState::Terminated {
            return Err("cannot append a turn to a terminated session");
        }
        self.turns.push(turn);
        self.updated_at = now;
        self.state = SessionState::Active;
        Ok(())
    }

    /// Marks the session `Terminated`. Idempotent.
    pub fn terminate(&mut self, now: i64) {
        self.state = SessionState::Terminated;
        self.updated_at = now;
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }
}
