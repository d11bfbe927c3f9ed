//! Error taxonomy for the link lifecycle core.
//!
//! Every operation returns a typed [`LinkError`] variant so callers can branch
//! on semantics (expired vs. not-found vs. forbidden are never conflated).
//! The boundary layer that maps errors to a transport is out of scope here;
//! [`LinkError::status_hint`] provides the stable numeric status it should use.

use thiserror::Error;

/// Typed failure modes of the link lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// No live record matches the given code or alias.
    #[error("no live link matches '{0}'")]
    NotFound(String),

    /// A record exists but its expiry deadline has passed.
    #[error("link '{0}' has expired")]
    Expired(String),

    /// The caller is not the owner of the link.
    #[error("caller does not own link '{0}'")]
    Forbidden(String),

    /// The requested alias (or generated code) collides with an existing
    /// live record, on either the code or alias field.
    #[error("alias or code '{0}' already resolves to a link")]
    AliasConflict(String),

    /// Custom alias failed validation (must be non-empty alphanumeric).
    #[error("invalid alias '{0}': aliases must be 1-64 alphanumeric characters")]
    InvalidAlias(String),

    /// `expires_at` was not strictly in the future at creation time.
    #[error("expiration time must be in the future")]
    InvalidExpiration,

    /// The destination address is not an absolute http(s) URL.
    #[error("invalid destination URL: {0}")]
    InvalidUrl(String),

    /// The generator could not find a free code within the retry bound.
    /// Expected only under adversarial load; surfaced as a server error.
    #[error("could not allocate a free short code within {0} attempts")]
    AllocationExhausted(u32),

    /// The durable store is unreachable. Retryable by the caller.
    #[error("link store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other durable store failure. Not retryable.
    #[error("link store error: {0}")]
    Store(String),
}

impl LinkError {
    /// Returns true when the caller may retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Stable status code for the transport boundary.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Expired(_) => 410,
            Self::Forbidden(_) => 403,
            Self::AliasConflict(_) => 409,
            Self::InvalidAlias(_) | Self::InvalidExpiration | Self::InvalidUrl(_) => 400,
            Self::AllocationExhausted(_) | Self::Store(_) => 500,
            Self::StoreUnavailable(_) => 503,
        }
    }
}
