use reqwest::StatusCode;
use std::error::Error as _;
use thiserror::Error;

/// Prefix shown in front of every failed submission.
pub const SUBMISSION_ERROR_PREFIX: &str = "Error processing query";

/// Fallback when neither the server nor the transport said anything useful.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// A failed call to one of the memory backends.
///
/// Callers never learn which backend failed; the first failure of a joined
/// submission is all that surfaces.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{}", transport_message(.0))]
    Transport(#[from] reqwest::Error),

    #[error("Http failure response for {url}: {status}")]
    Status {
        url: String,
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    /// The server-supplied `detail`, if the failing response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Status { detail: Some(detail), .. } if !detail.trim().is_empty() => {
                Some(detail.as_str())
            }
            _ => None,
        }
    }

    /// Text to show the user: server detail, then the error's own message,
    /// then a generic fallback.
    pub fn display_text(&self) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_string();
        }

        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        }
    }

    pub fn submission_message(&self) -> String {
        format!("{}: {}", SUBMISSION_ERROR_PREFIX, self.display_text())
    }
}

/// reqwest's own message plus the innermost cause, e.g. `Connection refused`.
fn transport_message(err: &reqwest::Error) -> String {
    let message = err.to_string();
    let mut root = None;
    let mut source = err.source();
    while let Some(cause) = source {
        root = Some(cause);
        source = cause.source();
    }

    match root.map(|cause| cause.to_string()) {
        Some(cause) if !cause.is_empty() && !message.contains(&cause) => {
            format!("{}: {}", message, cause)
        }
        _ => message,
    }
}

/// Pull a top-level `detail` out of an error body.
///
/// Non-string details (validation error arrays, for instance) are kept as
/// compact JSON so the user still sees something.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
