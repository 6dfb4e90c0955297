use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to load configuration: {0}")]
    Config(String),

    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Failures of a single audit. Each variant maps to one HTTP status in the
/// handler layer.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Missing domain parameter")]
    MissingDomain,

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Invalid audit target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Audit engine {engine} is unavailable: {source}")]
    EngineUnavailable {
        engine: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Audit of {target} timed out after {seconds}s")]
    Timeout { target: String, seconds: u64 },

    #[error("Audit engine {engine} exited with status {status}: {stderr}")]
    EngineFailed {
        engine: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Audit engine {engine} produced malformed output: {source}")]
    MalformedOutput {
        engine: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

impl AuditError {
    /// Message safe to return to clients. Process output and OS errors stay
    /// in the logs.
    #[must_use]
    pub fn external_message(&self) -> String {
        match self {
            Self::MissingDomain => "missing domain parameter".to_string(),
            Self::MalformedRequest(detail) => format!("malformed request body: {detail}"),
            Self::InvalidTarget { target, reason } => {
                format!("invalid domain {target:?}: {reason}")
            }
            Self::EngineUnavailable { engine, .. } => {
                format!("audit engine {engine} is unavailable")
            }
            Self::Timeout { target, seconds } => {
                format!("audit of {target} timed out after {seconds}s")
            }
            Self::EngineFailed { engine, .. } | Self::MalformedOutput { engine, .. } => {
                format!("audit engine {engine} failed")
            }
            Self::Fetch { url, .. } => format!("failed to fetch {url}"),
        }
    }
}
