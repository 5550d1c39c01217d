use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid rate: {0}")]
    InvalidRate(String),

    #[error("invalid term: {0}")]
    InvalidTerm(String),

    #[error("invalid balance: {0}")]
    InvalidBalance(String),

    #[error("loan {0:?} already exists")]
    DuplicateLoan(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("database schema is not initialized; run `init` first")]
    SchemaNotInitialized,

    #[error("storage failure: {0}")]
    StorageFailure(#[from] rusqlite::Error),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidRate(_) | Error::InvalidTerm(_) | Error::InvalidBalance(_)
        )
    }
}
