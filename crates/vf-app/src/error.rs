use std::path::PathBuf;

use thiserror::Error;
use vf_core::progress::FALLBACK_ERROR_MESSAGE;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Could not reach backend: {0}")]
    Transport(String),

    #[error("Backend did not answer before the client timeout")]
    Timeout,

    #[error("Backend responded with HTTP {0}")]
    Status(u16),

    #[error("Malformed backend response: {0}")]
    Decode(String),

    /// Non-2xx with a `detail` body. The detail is for the log only.
    #[error("Backend responded with HTTP {status}: {detail}")]
    BackendError { status: u16, detail: String },

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("No finished video to save")]
    NoArtifact,

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// Message safe to put in front of the user. The raw cause goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => {
                "Could not reach the video service. Check the connection and try again.".into()
            }
            Self::Timeout => "The video service took too long to respond. Please try again.".into(),
            Self::Status(code) | Self::BackendError { status: code, .. } => {
                format!("Failed to generate video (HTTP {code}). Please try again.")
            }
            Self::Decode(_) => "The video service sent an unexpected response.".into(),
            _ => FALLBACK_ERROR_MESSAGE.into(),
        }
    }
}
