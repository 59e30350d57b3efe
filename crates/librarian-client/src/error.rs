use thiserror::Error;

/// Everything that can go wrong talking to the backend.
///
/// The `Display` output of each variant is what the UI shows to the user, so
/// the mapping from failure to message is fixed here.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response, or its body could not be read
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("{status} {body}")]
    HttpStatus { status: u16, body: String },

    /// The body was not the JSON shape we expected
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request task died before producing a result
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl ApiError {
    /// HTTP status code, when the failure came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Aborted(_) => None,
        }
    }
}
