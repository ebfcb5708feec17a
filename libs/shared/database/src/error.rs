use serde_json::Value;
use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Store returned no rows for {0}")]
    EmptyResponse(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DatabaseError {
    /// PostgREST answers 409 for both unique and foreign key violations, so
    /// the SQLSTATE in the body decides before the status does.
    pub fn from_status(status: u16, body: String) -> Self {
        match (sqlstate(&body).as_deref(), status) {
            (Some(UNIQUE_VIOLATION), _) => DatabaseError::Conflict(body),
            (Some(FOREIGN_KEY_VIOLATION), _) => DatabaseError::MissingReference(body),
            (_, 401 | 403) => DatabaseError::Auth(body),
            (_, 404) => DatabaseError::NotFound(body),
            (_, 409) => DatabaseError::Conflict(body),
            _ => DatabaseError::Api { status, message: body },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }
}

fn sqlstate(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("code")?.as_str().map(str::to_owned)
}
