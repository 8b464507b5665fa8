use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("group owner cannot leave")]
    OwnerCannotLeave,
    #[error("conflict")]
    Conflict,
    #[error("expired: {0}")]
    Expired(String),
}
