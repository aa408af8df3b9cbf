//! Error taxonomy for the report view engine.
//!
//! Three kinds of failure exist here: a payload that cannot be recognized as
//! a report (`Validation`), a failed analyze/clean call (`Transport`), and
//! local file I/O (`Io`). Best-effort conveniences (clipboard copy, download
//! trigger) never produce a `ViewError`; call sites swallow those and log
//! at debug level.

fn transport_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("service returned HTTP {code}: {body}"),
        None => format!("network failure: {body}"),
    }
}

/// View-engine errors.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Payload was not a recognizable report shape. Recoverable: the caller
    /// keeps the previous report (if any) and surfaces the reason inline.
    #[error("invalid report payload: {reason}")]
    Validation { reason: String },

    /// Analyze/clean call failed. Carries the HTTP status when a response
    /// was received, plus the raw body text. Never retried automatically;
    /// retry requires an explicit user action.
    #[error("{}", transport_message(.status, .body))]
    Transport { status: Option<u16>, body: String },

    /// Local file read/write failure outside the best-effort set.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Exit code for CLI surfacing.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 1,
            Self::Transport { .. } => 5,
            Self::Io(_) => 6,
        }
    }

    /// Whether the failure came from the network boundary rather than the
    /// payload or the local machine.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for ViewError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

/// Result type for view-engine operations.
pub type ViewResult<T> = Result<T, ViewError>;
