//! Error types for the legal research engine.
//!
//! A comprehensive error hierarchy using `thiserror`, mirroring the
//! component boundaries of the system: storage, ingestion, security,
//! hallucination detection, LLM orchestration, and chat.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the legal research engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors (vector index, audit logs, session store).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// PDF parsing and excerpt extraction errors.
    #[error("pdf error: {0}")]
    Pdf(#[from] PdfError),

    /// Chunking errors.
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Object store errors.
    #[error("object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),

    /// Ingestion pipeline errors.
    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    /// Retrieval / similarity engine errors.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Security pipeline errors (validator, redactor, enforcer).
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// LLM client errors.
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// Chat engine errors.
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Vector index not loaded / not ready for queries.
    #[error("vector index not ready: {reason}")]
    IndexNotReady {
        /// Why the index is not ready.
        reason: String,
    },

    /// Chunk not found by id.
    #[error("chunk not found: {id}")]
    ChunkNotFound {
        /// Chunk id that was not found.
        id: i64,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Audit log write failure.
    #[error("audit log write failed: {0}")]
    AuditWrite(String),

    /// Atomic index swap failed; previous index left intact.
    #[error("index swap failed: {0}")]
    SwapFailed(String),
}

/// PDF parsing errors.
#[derive(Error, Debug)]
pub enum PdfError {
    /// PDF could not be parsed.
    #[error("failed to parse pdf {path}: {reason}")]
    ParseError {
        /// Path to the PDF.
        path: String,
        /// Reason parsing failed.
        reason: String,
    },

    /// PDF parsed but contained no extractable text.
    #[error("empty document: {path}")]
    EmptyDocument {
        /// Path to the PDF.
        path: String,
    },
}

/// Object store errors.
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// Upload failed.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// URL could not be canonicalized.
    #[error("invalid object url: {0}")]
    InvalidUrl(String),

    /// Download of an object failed.
    #[error("download failed: {0}")]
    DownloadFailed(String),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid chunker configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// A single unit of text could not be split below the hard size limit.
    #[error("chunk size {size} exceeds maximum {max} and could not be subdivided")]
    ChunkTooLarge {
        /// Actual chunk size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// Ingestion pipeline errors.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// Embedding provider unavailable during ingestion.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Source directory could not be read.
    #[error("source directory error: {0}")]
    SourceDirectory(String),
}

/// Retrieval / similarity engine errors.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding provider unavailable during a query (fatal to that query).
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),
}

/// Security pipeline errors.
#[derive(Error, Debug)]
pub enum SecurityError {
    /// Input failed validation; violations are categorical only, never
    /// disclosing the exact pattern matched.
    #[error("validation failed: {violations:?}")]
    ValidationFailed {
        /// Violation categories.
        violations: Vec<String>,
    },
}

/// LLM client errors.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The provider timed out or otherwise failed; callers must fall back.
    #[error("llm unavailable: {0}")]
    Unavailable(String),
}

/// Chat engine errors.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Operation attempted on a terminated session.
    #[error("session terminated: {session_id}")]
    SessionTerminated {
        /// The terminated session id.
        session_id: String,
    },

    /// Session id not found.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session id that was not found.
        session_id: String,
    },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config {
            message: "bad config".to_string(),
        };
        assert_eq!(err.to_string(), "configuration error: bad config");
    }

    #[test]
    fn test_storage_error_index_not_ready() {
        let err = StorageError::IndexNotReady {
            reason: "not loaded".to_string(),
        };
        assert!(err.to_string().contains("not loaded"));
    }

    #[test]
    fn test_chat_error_terminated() {
        let err = ChatError::SessionTerminated {
            session_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "session terminated: abc");
    }

    #[test]
    fn test_from_rusqlite_error() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: Error = rusqlite_err.into();
        assert!(matches!(err, Error::Storage(StorageError::Database(_))));
    }

    #[test]
    fn test_security_error_does_not_disclose_pattern() {
        let err = SecurityError::ValidationFailed {
            violations: vec!["prompt_injection".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("prompt_injection"));
        assert!(!msg.contains("ignore previous instructions"));
    }
}
