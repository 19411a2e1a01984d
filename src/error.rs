use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpensesError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for field '{field}': '{value}'")]
    InvalidField { field: String, value: String },

    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, ExpensesError>;
