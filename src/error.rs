use std::time::Duration;

/// Every failure the library can surface to the command layer
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The embedded env payload is malformed
    #[error("invalid env payload: line {line}: {reason}")]
    Config { line: usize, reason: String },
    /// The caller token is missing or not on the allowlist
    #[error("{0}")]
    Auth(String),
    /// The service account key could not be read or exchanged for a token
    #[error("credential error: {0}")]
    Credential(String),
    /// A local file could not be opened, statted or read
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    /// The object insert failed for a reason other than the create-only precondition
    #[error("upload failed: {0}")]
    Upload(String),
    /// The metadata query failed for a reason other than the object being absent
    #[error("failed to get object: {0}")]
    Fetch(String),
    /// A remote call did not complete within its deadline
    #[error("{operation} timed out after {deadline:?}")]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },
    /// A bucket or object name was rejected by the GCS naming rules
    #[error("invalid {kind} name '{name}': {source}")]
    InvalidName {
        kind: &'static str,
        name: String,
        #[source]
        source: tame_gcs::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
