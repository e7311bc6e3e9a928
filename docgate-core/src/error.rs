//! Error taxonomy for facade operations.
//!
//! Every fallible operation in this crate returns [`DocGateResult<T>`]. The
//! variants map store-level failure conditions onto a small, stable set of
//! application error codes exposed through [`FacadeError::code`].

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Failure conditions surfaced by the data-access facade.
///
/// Driver implementations report the raw condition (`DuplicateKey`,
/// `Backend`); the facade normalizes the recognized ones and passes the
/// rest through unchanged.
#[derive(Error, Debug)]
pub enum FacadeError {
    /// An operation required a bound collection and no collection name was
    /// ever declared. Surfaced before any driver call is issued.
    #[error("no collection name declared before initialization")]
    NoCollectionName,
    /// A document with the given identifier already exists in the collection.
    /// Normalized from a primary-key [`FacadeError::DuplicateKey`] during
    /// insertion. The first argument is the identifier, the second the
    /// collection name.
    #[error("document {0} already exists in collection {1}")]
    AlreadyExists(String, String),
    /// Raw driver-reported uniqueness violation. `key` is the offending
    /// primary-key value as reported by the store.
    #[error("duplicate key {key}: {message}")]
    DuplicateKey {
        /// The conflicting primary-key value.
        key: String,
        /// The store's original error text.
        message: String,
    },
    /// Serialization/deserialization error when converting between document
    /// formats (BSON, JSON).
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Any other failure reported by the underlying store driver, preserved
    /// verbatim.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for facade operations.
pub type DocGateResult<T> = Result<T, FacadeError>;

impl FacadeError {
    /// Stable application error code for this failure.
    ///
    /// Callers branching on failure kind should match on this rather than
    /// the message text.
    pub fn code(&self) -> &'static str {
        match self {
            FacadeError::NoCollectionName => "NO_COLLECTION_NAME",
            FacadeError::AlreadyExists(..) => "ALREADY_EXISTS",
            FacadeError::DuplicateKey { .. } => "DUPLICATE_KEY",
            FacadeError::Serialization(_) => "SERIALIZATION",
            FacadeError::Backend(_) => "BACKEND",
        }
    }
}

impl From<BsonError> for FacadeError {
    fn from(err: BsonError) -> Self {
        FacadeError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for FacadeError {
    fn from(err: SerdeJsonError) -> Self {
        FacadeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(FacadeError::NoCollectionName.code(), "NO_COLLECTION_NAME");
        assert_eq!(
            FacadeError::AlreadyExists("x".into(), "users".into()).code(),
            "ALREADY_EXISTS"
        );
        assert_eq!(
            FacadeError::DuplicateKey { key: "x".into(), message: "dup".into() }.code(),
            "DUPLICATE_KEY"
        );
        assert_eq!(FacadeError::Backend("boom".into()).code(), "BACKEND");
    }

    #[test]
    fn already_exists_message_carries_identifier() {
        let err = FacadeError::AlreadyExists("abc-123".into(), "users".into());
        assert!(err.to_string().contains("abc-123"));
        assert!(err.to_string().contains("users"));
    }
}
