pub mod storage;
pub mod checkout;
pub mod network;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Checkout service error: {0}")]
    GatewayError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
