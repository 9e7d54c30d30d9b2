use thiserror::Error as ThisError;

use crate::store::StoreError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed input rejected before anything is written or scanned.
    #[error("validation error: {0}")]
    Validation(String),
    /// Any failure reported by the underlying sorted store.
    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
    /// A computed key component does not have the width the codec mandates.
    #[error("encoding invariant violated: {0}")]
    EncodingInvariant(String),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Error::EncodingInvariant(msg.into())
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        Error::Storage(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
