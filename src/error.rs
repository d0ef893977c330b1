use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Every way a mashup request can fail. A failure on any single track
/// aborts the whole request.
#[derive(Debug, Error)]
pub enum MashupError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("failed to fetch {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("failed to decode '{track}': {reason}")]
    Decode { track: String, reason: String },

    #[error("render failed: {0}")]
    Render(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("mashup cancelled")]
    Cancelled,
}

impl MashupError {
    pub(crate) fn decode(track: &str, reason: impl ToString) -> Self {
        MashupError::Decode {
            track: track.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for MashupError {
    fn from(e: reqwest::Error) -> Self {
        MashupError::Network {
            url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MashupError>;

/// Bail out with [`MashupError::Cancelled`] once the flag has been raised.
pub(crate) fn check_cancelled(cancel_flag: &AtomicBool) -> Result<()> {
    if cancel_flag.load(Ordering::Relaxed) {
        return Err(MashupError::Cancelled);
    }
    Ok(())
}
