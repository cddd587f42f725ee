use axum::http::Method;
use thiserror::Error;

/// Failures starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A request that could not be served. The display string is what the
/// client sees in the envelope's `error` field.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request method: '{got}' (need '{need}')")]
    WrongMethod { got: Method, need: Method },

    #[error("cannot unmarshal request json: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("required data is missing")]
    MissingData,

    #[error("invalid note id")]
    InvalidId(i64),

    #[error("cannot find note with id {0}")]
    NoteNotFound(i64),

    #[error("cannot update non-existing note with id {0}")]
    UpdateMissing(i64),

    #[error("note with this ID doesn't exist: {0}")]
    DeleteMissing(i64),

    #[error("no records found")]
    NoRecords,

    #[error("cannot add note: {0}")]
    AddRejected(nts_store::StoreError),

    /// Details go to the log only.
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    /// Whether the fault lies with the server rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::AddRejected(_) | Self::Internal(_))
    }

    /// Record the failure: internal faults at `error`, client faults at
    /// `warn`. `op` names the endpoint.
    pub fn log(&self, op: &str) {
        match self {
            Self::Internal(detail) => tracing::error!(op, %detail, "internal server error"),
            Self::InvalidId(id) => tracing::warn!(op, id, "{self}"),
            _ if self.is_internal() => tracing::error!(op, "{self}"),
            _ => tracing::warn!(op, "{self}"),
        }
    }
}
