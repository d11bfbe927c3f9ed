//! Mapping from SQLx errors to the crate error taxonomy.

use crate::error::LinkError;

/// Returns true when the error is a unique-constraint violation, the signal
/// the code allocation retry loop keys off.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Maps a SQLx error to [`LinkError`].
///
/// Connection-class failures become the retryable [`LinkError::StoreUnavailable`];
/// everything else is an internal [`LinkError::Store`].
pub fn map_sqlx_error(e: sqlx::Error) -> LinkError {
    let message = e.to_string();

    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => LinkError::StoreUnavailable(message),
        _ => LinkError::Store(message),
    }
}
