//! Process-wide configuration, constructed once at startup.
//!
//! Centralizes the environment-derived settings so that components
//! receive configuration as an injected capability rather than reading
//! the environment themselves.

use std::path::PathBuf;

/// Chat session storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStorageBackend {
    /// Sessions live only in process memory.
    InMemory,
    /// Sessions are persisted by an external service (interface-only;
    /// no concrete backend is wired up yet).
    Remote,
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the vector index artifact.
    pub vector_index_dir: PathBuf,
    /// Directory to scan for source PDFs during ingestion.
    pub pdf_source_dir: PathBuf,
    /// Directory append-only audit logs are written into.
    pub audit_log_dir: PathBuf,
    /// Object store bucket name.
    pub object_store_bucket: String,
    /// Object store base URL (used for HTTPS canonicalization).
    pub object_store_region: String,
    /// PII redaction confidence threshold (default 0.7).
    pub pii_confidence_threshold: f32,
    /// Minimum accepted input length (default 10).
    pub input_min_length: usize,
    /// Maximum accepted input length (default 50_000).
    pub input_max_length: usize,
    /// Maximum accepted file upload size in bytes (default 10 MiB).
    pub file_upload_limit_bytes: u64,
    /// Maximum fraction of non-alphanumeric characters tolerated in
    /// free-text input before the special-character ratio guard trips
    /// (default 0.5).
    pub special_char_ratio: f32,
    /// Chat session storage backend.
    pub chat_storage_backend: ChatStorageBackend,
    /// Embedding vector dimensionality.
    pub embedding_dimensions: usize,
    /// Default top-k cases returned by Mode A.
    pub default_top_k_cases: usize,
    /// Default max chunks per case in Mode C.
    pub default_max_chunks_per_case: usize,
}

/// Default PII confidence threshold.
pub const DEFAULT_PII_CONFIDENCE_THRESHOLD: f32 = 0.7;
/// Default minimum input length.
pub const DEFAULT_INPUT_MIN_LENGTH: usize = 10;
/// Default maximum input length.
pub const DEFAULT_INPUT_MAX_LENGTH: usize = 50_000;
/// Default file upload size limit, 10 MiB.
pub const DEFAULT_FILE_UPLOAD_LIMIT_BYTES: u64 = 10 * 1024 * 1024;
/// Default special-character ratio guard threshold.
pub const DEFAULT_SPECIAL_CHAR_RATIO: f32 = 0.5;
/// Default embedding dimensionality.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
/// Default number of cases Mode A returns when unspecified.
pub const DEFAULT_TOP_K_CASES: usize = 10;
/// Default max chunks per case in Mode C.
pub const DEFAULT_MAX_CHUNKS_PER_CASE: usize = 5;

impl Default for Config {
    fn default() -> Self {
        Self {
            vector_index_dir: PathBuf::from("./data/vector-index"),
            pdf_source_dir: PathBuf::from("./data/pdfs"),
            audit_log_dir: PathBuf::from("./data/audit"),
            object_store_bucket: "legal-research-corpus".to_string(),
            object_store_region: "us-east-1".to_string(),
            pii_confidence_threshold: DEFAULT_PII_CONFIDENCE_THRESHOLD,
            input_min_length: DEFAULT_INPUT_MIN_LENGTH,
            input_max_length: DEFAULT_INPUT_MAX_LENGTH,
            file_upload_limit_bytes: DEFAULT_FILE_UPLOAD_LIMIT_BYTES,
            special_char_ratio: DEFAULT_SPECIAL_CHAR_RATIO,
            chat_storage_backend: ChatStorageBackend::InMemory,
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            default_top_k_cases: DEFAULT_TOP_K_CASES,
            default_max_chunks_per_case: DEFAULT_MAX_CHUNKS_PER_CASE,
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults
    /// for any key that is unset or fails to parse.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        // LEGAL_RESEARCH_DATA_DIR is a convenience root: when set, it
        // supplies the default for any of the three path variables
        // below that isn't itself set.
        let data_dir = std::env::var("LEGAL_RESEARCH_DATA_DIR").ok().map(PathBuf::from);
        let path_default = |sub: &str, fallback: PathBuf| {
            data_dir.as_ref().map_or(fallback, |root| root.join(sub))
        };

        Self {
            vector_index_dir: env_path(
                "VECTOR_INDEX_DIR",
                path_default("vector-index", defaults.vector_index_dir),
            ),
            pdf_source_dir: env_path("PDF_SOURCE_DIR", path_default("pdfs", defaults.pdf_source_dir)),
            audit_log_dir: env_path("AUDIT_LOG_DIR", path_default("audit", defaults.audit_log_dir)),
            object_store_bucket: env_string("OBJECT_STORE_BUCKET", defaults.object_store_bucket),
            object_store_region: env_string("OBJECT_STORE_REGION", defaults.object_store_region),
            pii_confidence_threshold: env_f32(
                "PII_CONFIDENCE_THRESHOLD",
                defaults.pii_confidence_threshold,
            ),
            input_min_length: env_usize("INPUT_MIN_LENGTH", defaults.input_min_length),
            input_max_length: env_usize("INPUT_MAX_LENGTH", defaults.input_max_length),
            file_upload_limit_bytes: env_u64(
                "FILE_UPLOAD_LIMIT_BYTES",
                defaults.file_upload_limit_bytes,
            ),
            special_char_ratio: env_f32("SPECIAL_CHAR_RATIO", defaults.special_char_ratio),
            chat_storage_backend: match std::env::var("CHAT_STORAGE_BACKEND").as_deref() {
                Ok("remote") => ChatStorageBackend::Remote,
                _ => ChatStorageBackend::InMemory,
            },
            embedding_dimensions: env_usize(
                "EMBEDDING_DIMENSIONS",
                defaults.embedding_dimensions,
            ),
            default_top_k_cases: defaults.default_top_k_cases,
            default_max_chunks_per_case: defaults.default_max_chunks_per_case,
        }
    }

    /// Initializes the global tracing subscriber from `RUST_LOG`, falling
    /// back to an `info`-level default filter. Safe to call once at
    /// process startup; subsequent calls are no-ops if a subscriber is
    /// already set.
    pub fn init_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init();
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.input_min_length, 10);
        assert_eq!(cfg.input_max_length, 50_000);
        assert_eq!(cfg.file_upload_limit_bytes, 10 * 1024 * 1024);
        assert!((cfg.pii_confidence_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.chat_storage_backend, ChatStorageBackend::InMemory);
    }

    #[test]
    fn test_env_usize_parses_valid_value() {
        // SAFETY: test-only, single-threaded env mutation scoped to this test.
        unsafe {
            std::env::set_var("LRE_TEST_USIZE", "42");
        }
        assert_eq!(env_usize("LRE_TEST_USIZE", 1), 42);
        unsafe {
            std::env::remove_var("LRE_TEST_USIZE");
        }
    }

    #[test]
    fn test_env_usize_falls_back_on_missing() {
        assert_eq!(env_usize("LRE_TEST_MISSING_KEY", 7), 7);
    }

    #[test]
    fn test_data_dir_supplies_path_defaults() {
        // SAFETY: test-only, single-threaded env mutation scoped to this test.
        unsafe {
            std::env::remove_var("VECTOR_INDEX_DIR");
            std::env::remove_var("PDF_SOURCE_DIR");
            std::env::remove_var("AUDIT_LOG_DIR");
            std::env::set_var("LEGAL_RESEARCH_DATA_DIR", "/srv/legal-research");
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.vector_index_dir, PathBuf::from("/srv/legal-research/vector-index"));
        assert_eq!(cfg.pdf_source_dir, PathBuf::from("/srv/legal-research/pdfs"));
        assert_eq!(cfg.audit_log_dir, PathBuf::from("/srv/legal-research/audit"));
        unsafe {
            std::env::remove_var("LEGAL_RESEARCH_DATA_DIR");
        }
    }

    #[test]
    fn test_explicit_path_var_overrides_data_dir() {
        // SAFETY: test-only, single-threaded env mutation scoped to this test.
        unsafe {
            std::env::set_var("LEGAL_RESEARCH_DATA_DIR", "/srv/legal-research");
            std::env::set_var("AUDIT_LOG_DIR", "/custom/audit");
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.audit_log_dir, PathBuf::from("/custom/audit"));
        unsafe {
            std::env::remove_var("LEGAL_RESEARCH_DATA_DIR");
            std::env::remove_var("AUDIT_LOG_DIR");
        }
    }
}
