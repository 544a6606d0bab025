//! Error types for runbun
//!
//! Every fallible operation in the crate returns [`Result`]. The HTTP layer
//! turns an [`Error`] into a status code with [`Error::status`].

/// All errors that can occur while handling a run update.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing, outdated or malformed payload fields.
    #[error("{0}")]
    Validation(String),

    /// Missing or incorrect bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Failure reported by the spreadsheet backend.
    #[error("Sheets API error: {0}")]
    RemoteApi(String),

    /// A relative rectangle that does not fit its card.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Unreadable or malformed configuration file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A handler panicked; the request was answered anyway.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status code reported to the companion app.
    pub fn status(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::Json(_) => 400,
            Error::Unauthorized => 401,
            Error::RemoteApi(_)
            | Error::InvalidGeometry(_)
            | Error::Config(_)
            | Error::Internal(_)
            | Error::Io(_) => 500,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RemoteApi(e.to_string())
    }
}
