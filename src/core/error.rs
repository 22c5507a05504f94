use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the resolver crate.
/// Every fallible module returns `Result<T, ResolverError>`.
#[derive(Debug, Error)]
pub enum ResolverError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    ApiStatus { endpoint: String, status: u16 },

    #[error("No API key configured (set CFMETA_API_KEY or pass --api-key)")]
    MissingApiKey,

    #[error("Invalid API key header value")]
    InvalidApiKey,

    // ── Integrity ───────────────────────────────────────
    #[error("{format} mismatch for {path:?}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        format: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported hash format: {0}")]
    UnsupportedHashFormat(String),

    // ── Index ───────────────────────────────────────────
    #[error("Index path escapes the pack folder: {0}")]
    InvalidIndexPath(String),

    #[error("TOML parse error in {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type ResolverResult<T> = Result<T, ResolverError>;
