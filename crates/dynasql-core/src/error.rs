//! Error types for statement parsing and execution.

use dynasql_model::{StoreError, StoreErrorCode};

use crate::expression::ParseError;
use crate::storage::StorageError;

/// Errors raised by the SQL layer.
///
/// Everything except [`SqlError::Store`] is raised before any store call is
/// made. Store errors are passed through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SqlError {
    /// A WHERE/ON clause could not be parsed.
    #[error("Failed to parse {clause} clause: {source}")]
    Parse {
        /// The clause text that failed to parse.
        clause: String,
        /// The underlying parse error.
        source: ParseError,
    },
    /// The statement uses a verb or feature outside the supported subset.
    #[error("Unsupported statement: {message} (near '{fragment}')")]
    UnsupportedStatement {
        /// What is unsupported.
        message: String,
        /// The offending statement fragment.
        fragment: String,
    },
    /// The statement is missing a required clause or is otherwise ill-formed.
    #[error("Malformed statement: {message} (near '{fragment}')")]
    MalformedStatement {
        /// What is wrong.
        message: String,
        /// The offending statement fragment.
        fragment: String,
    },
    /// UPDATE/DELETE did not fix every key attribute by equality.
    #[error("Incomplete key for table '{table}': missing equality on {missing}")]
    IncompleteKey {
        /// The target table.
        table: String,
        /// Comma-separated names of the key attributes without an equality.
        missing: String,
    },
    /// An error returned by the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for the SQL layer.
pub type SqlResult<T> = Result<T, SqlError>;

impl SqlError {
    /// Build a [`SqlError::Parse`] for `clause`.
    #[must_use]
    pub fn parse(clause: impl Into<String>, source: ParseError) -> Self {
        Self::Parse {
            clause: clause.into(),
            source,
        }
    }

    /// Build a [`SqlError::UnsupportedStatement`].
    #[must_use]
    pub fn unsupported(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::UnsupportedStatement {
            message: message.into(),
            fragment: fragment.into(),
        }
    }

    /// Build a [`SqlError::MalformedStatement`].
    #[must_use]
    pub fn malformed(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::MalformedStatement {
            message: message.into(),
            fragment: fragment.into(),
        }
    }

    /// Returns the store error code if this error came from the store.
    #[must_use]
    pub fn store_code(&self) -> Option<StoreErrorCode> {
        match self {
            Self::Store(e) => Some(e.code),
            _ => None,
        }
    }
}

/// Convert a storage error into a store error.
///
/// Takes `e` by value because this is used as a closure argument to `.map_err()`.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn storage_error_to_store(e: StorageError) -> StoreError {
    match e {
        StorageError::ConditionFailed => {
            StoreError::conditional_check_failed("The conditional request failed")
        }
        StorageError::DuplicateKey => StoreError::duplicate_key(e.to_string()),
        _ => StoreError::validation(e.to_string()),
    }
}
