use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("The change you're trying to make to `table_config` has the wrong format. {0}")]
    Format(String),

    #[error("{0}")]
    Illegal(String),

    #[error("{0}")]
    NameCollision(String),

    #[error("When generating configuration for new table: {0}")]
    Generation(String),

    #[error("{0}")]
    SplitPoints(String),

    #[error("{0}")]
    Database(String),

    #[error("interrupted")]
    Interrupted,

    #[error("Table config coordinator is unavailable: {0}")]
    Coordinator(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, AdminError>;

impl<T> From<std::sync::PoisonError<T>> for AdminError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}
