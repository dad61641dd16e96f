//! The error taxonomy shared by every operation.

use thiserror::Error;

use crate::policy::Action;
use crate::types::WishlistId;

/// Why an operation could not be carried out.
///
/// All four variants are recoverable at the boundary; the transport layer
/// maps them onto status codes. `Unauthenticated` and `NotAuthorized` are the
/// only variants that invalidate the caller's transient session context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No identity, or an identity whose session has lapsed.
    #[error("authentication required")]
    Unauthenticated,

    /// Identity known, action denied.
    #[error("you do not have permission to {0}")]
    NotAuthorized(Action),

    /// The id does not resolve to a visible record. Deliberately kept
    /// distinct from `NotAuthorized`, including in logs.
    #[error("wishlist {0} was not found")]
    NotFound(WishlistId),

    /// The request is missing or malforms a required argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Whether this failure must tear down the caller's transient session
    /// context. True exactly for the authorization failures.
    #[must_use]
    pub const fn resets_context(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::NotAuthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_authorization_failures_reset_context() {
        assert!(Error::Unauthenticated.resets_context());
        assert!(Error::NotAuthorized(Action::Export).resets_context());
        assert!(!Error::NotFound(WishlistId::new(1)).resets_context());
        assert!(!Error::InvalidArgument("no product list".to_owned()).resets_context());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::NotAuthorized(Action::Write).to_string(),
            "you do not have permission to write"
        );
        assert_eq!(
            Error::NotFound(WishlistId::new(9)).to_string(),
            "wishlist 9 was not found"
        );
    }
}
