use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// A market data call kept failing after every retry.
    #[error("{what} failed after {attempts} attempts: {last_error}")]
    FetchExhausted {
        what: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The signal detector panicked on one pair's candles.
    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
