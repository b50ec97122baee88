//! Domain error types.

/// Top-level error type for tradejournal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("field {field} must be a finite number")]
    InvalidNumber { field: String },

    #[error("field {field} must be a valid date or timestamp")]
    InvalidDate { field: String },

    #[error("field {field} has the wrong type")]
    InvalidField { field: String },

    #[error("exitDate and exitPrice must be provided together")]
    IncompleteExit,

    #[error("exitDate must not be earlier than entryDate")]
    ExitBeforeEntry,

    #[error("invalid query parameter {param}: {reason}")]
    InvalidQuery { param: String, reason: String },

    #[error("trade {id} not found")]
    NotFound { id: String },

    #[error("user {username} not found")]
    UserNotFound { username: String },

    #[error("user {username} already exists")]
    DuplicateUser { username: String },

    #[error("password hashing failed: {reason}")]
    PasswordHash { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("background task failed: {reason}")]
    Task { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JournalError {
    pub fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid_number(field: &str) -> Self {
        Self::InvalidNumber {
            field: field.to_string(),
        }
    }

    /// True for errors caused by the submitted request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JournalError::MissingField { .. }
                | JournalError::InvalidNumber { .. }
                | JournalError::InvalidDate { .. }
                | JournalError::InvalidField { .. }
                | JournalError::IncompleteExit
                | JournalError::ExitBeforeEntry
                | JournalError::InvalidQuery { .. }
        )
    }
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) | JournalError::PasswordHash { .. } | JournalError::Task { .. } => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Database { .. } | JournalError::DatabaseQuery { .. } => 3,
            JournalError::MissingField { .. }
            | JournalError::InvalidNumber { .. }
            | JournalError::InvalidDate { .. }
            | JournalError::InvalidField { .. }
            | JournalError::IncompleteExit
            | JournalError::ExitBeforeEntry
            | JournalError::InvalidQuery { .. } => 4,
            JournalError::NotFound { .. }
            | JournalError::UserNotFound { .. }
            | JournalError::DuplicateUser { .. } => 5,
            JournalError::Unauthenticated | JournalError::InvalidCredentials => 6,
        };
        std::process::ExitCode::from(code)
    }
}
