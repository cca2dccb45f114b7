use std::path::PathBuf;

use thiserror::Error;

/// Failures of the credential manager and the OAuth flows behind it.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(
        "client secret file {} not found. Please download it from Google Cloud Console",
        .0.display()
    )]
    MissingClientSecret(PathBuf),

    #[error("unable to read client secret file {}: {source}", .path.display())]
    ClientSecret {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("authorization flow failed: {0}")]
    Authorization(String),

    #[error("unable to write credential cache {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to serialize credential record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures of a single generative-language request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to generative-language service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generative-language service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("generative-language service returned an unreadable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("generative-language service returned no text")]
    EmptyResponse,
}
