//! Error types for warehouse statements

use thiserror::Error;

/// Errors raised while talking to the target database
#[derive(Error, Debug)]
pub enum LoadError {
    /// Could not open or keep the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// A key or NOT NULL constraint rejected the row
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Any other database-side failure
    #[error("Database error: {0}")]
    Database(String),

    /// A value could not be bound or read back
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// The backend is not compiled in
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),
}

impl LoadError {
    /// Classify a DuckDB error by its leading type label
    ///
    /// DuckDB messages start with `<Type> Error:`. Only that label is
    /// inspected; hints later in the message can mention unrelated words.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let label = message
            .split_once(':')
            .map(|(label, _)| label.trim())
            .unwrap_or_default();
        match label {
            "Constraint Error" => LoadError::Constraint(message),
            "Connection Error" => LoadError::Connection(message),
            _ => LoadError::Database(message),
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Connection(msg) => {
                format!(
                    "Cannot reach the database: {msg}\n\n\
                    Hint: Check the [database] section of your configuration."
                )
            }
            LoadError::Constraint(msg) => {
                format!(
                    "A row was rejected by the target schema: {msg}\n\n\
                    Hint: Run 'create-tables' to reset the schema, or check the input data."
                )
            }
            LoadError::UnsupportedBackend(backend) => {
                format!(
                    "Backend '{backend}' is not available in this build.\n\n\
                    Hint: Rebuild with --features {backend}-backend."
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(feature = "duckdb-backend")]
impl From<duckdb::Error> for LoadError {
    fn from(err: duckdb::Error) -> Self {
        LoadError::from_message(err.to_string())
    }
}

#[cfg(feature = "postgres-backend")]
impl From<tokio_postgres::Error> for LoadError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return LoadError::Connection(err.to_string());
        }
        match err.code() {
            Some(code) if code.code().starts_with("23") => LoadError::Constraint(err.to_string()),
            Some(code) if code.code().starts_with("08") => LoadError::Connection(err.to_string()),
            _ => LoadError::Database(err.to_string()),
        }
    }
}
