use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single generation job.
///
/// Every variant reaches the caller as-is: nothing in the job client retries.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The remote service answered with a non-success HTTP status.
    #[error("Failed to {operation}: {status_text}{}", body_suffix(.body))]
    Transport {
        operation: &'static str,
        status: u16,
        status_text: String,
        body: Option<String>,
    },

    /// The request never produced an HTTP response.
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The job reached the FAILED state.
    #[error("{0}")]
    RemoteFailure(String),

    /// A success response that does not honour the wire contract.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Video generation timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("{action} {}: {source}", .path.display())]
    LocalIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(text) if !text.is_empty() => format!(" - {text}"),
        _ => String::new(),
    }
}

impl GenerationError {
    pub(crate) fn local_io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            action,
            path: path.into(),
            source,
        }
    }
}
