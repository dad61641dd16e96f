//! The access policy: who may do what, evaluated rule by rule.
//!
//! Rules are checked in order, first match wins:
//!
//! 1. A caller with no usable identity is denied everything.
//! 2. `export` requires the distinct export capability.
//! 3. `read`/`write` on a record defers to the record's own access check
//!    ([`crate::wishlist::RecordAccess`]); the policy composes with it, it
//!    does not duplicate it.
//! 4. A missing record is `NotFound`, never dressed up as `NotAuthorized`.
//!
//! Authorization failures — and only failures — trip the [`ContextReset`]
//! hook exactly once, so a stale elevated identity cannot leak into a later
//! call on the same connection.

use core::fmt;

use crate::caller::CallerContext;
use crate::error::Error;
use crate::wishlist::Wishlist;

/// The operations the policy knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// View a record or its items.
    Read,
    /// Update, delete, add or remove items.
    Write,
    /// Bulk read across all owners.
    Export,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Export => "export",
        };
        f.write_str(s)
    }
}

/// Rule 1: any operation requires a usable identity.
///
/// # Errors
///
/// Returns [`Error::Unauthenticated`] for callers with no identity or an
/// expired guest session.
pub fn authorize_identified(caller: &CallerContext) -> Result<(), Error> {
    if caller.is_identified() {
        Ok(())
    } else {
        Err(Error::Unauthenticated)
    }
}

/// Rules 1–2 for the export operation.
///
/// # Errors
///
/// Returns [`Error::Unauthenticated`] for unidentified callers and
/// [`Error::NotAuthorized`] for identified callers without the export
/// capability.
pub fn authorize_export(caller: &CallerContext) -> Result<(), Error> {
    authorize_identified(caller)?;

    if caller.can_export() {
        Ok(())
    } else {
        Err(Error::NotAuthorized(Action::Export))
    }
}

/// Rules 1 and 3 for a read or write on a specific record.
///
/// # Errors
///
/// Returns [`Error::Unauthenticated`] for unidentified callers and
/// [`Error::NotAuthorized`] when the record's own access check denies the
/// action.
pub fn authorize_record(
    caller: &CallerContext,
    action: Action,
    record: &Wishlist,
) -> Result<(), Error> {
    authorize_identified(caller)?;

    let permitted = match action {
        Action::Read => record.access().can_view(caller),
        Action::Write => record.access().can_write(caller),
        // Export is collection-level; it never grants record access here.
        Action::Export => false,
    };

    if permitted {
        Ok(())
    } else {
        Err(Error::NotAuthorized(action))
    }
}

/// Hook invalidating the caller's transient session context.
pub trait ContextReset {
    /// Tear down the transient context. Called at most once per decision.
    fn reset(&self);
}

/// Policy entry point that wires decisions to the reset side effect.
///
/// Embedders that keep authentication state outside the request (a session
/// cookie, a connection-scoped login) pass their reset hook here; the gate
/// fires it on every authorization failure and never on success.
pub struct PolicyGate<'a, R: ContextReset> {
    reset: &'a R,
}

impl<'a, R: ContextReset> PolicyGate<'a, R> {
    /// Build a gate around a reset hook.
    #[must_use]
    pub const fn new(reset: &'a R) -> Self {
        Self { reset }
    }

    /// Gate-checked [`authorize_identified`].
    ///
    /// # Errors
    ///
    /// Propagates the policy error after firing the reset hook.
    pub fn identified(&self, caller: &CallerContext) -> Result<(), Error> {
        self.settle(authorize_identified(caller))
    }

    /// Gate-checked [`authorize_export`].
    ///
    /// # Errors
    ///
    /// Propagates the policy error after firing the reset hook.
    pub fn export(&self, caller: &CallerContext) -> Result<(), Error> {
        self.settle(authorize_export(caller))
    }

    /// Gate-checked [`authorize_record`].
    ///
    /// # Errors
    ///
    /// Propagates the policy error after firing the reset hook.
    pub fn record(
        &self,
        caller: &CallerContext,
        action: Action,
        record: &Wishlist,
    ) -> Result<(), Error> {
        self.settle(authorize_record(caller, action, record))
    }

    fn settle(&self, decision: Result<(), Error>) -> Result<(), Error> {
        if let Err(error) = &decision
            && error.resets_context()
        {
            self.reset.reset();
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::Utc;

    use super::*;
    use crate::caller::Capability;
    use crate::types::{ShareToken, Slug, UserId, Visibility, WishlistId};
    use crate::wishlist::Owner;

    #[derive(Default)]
    struct CountingReset {
        hits: Cell<u32>,
    }

    impl ContextReset for CountingReset {
        fn reset(&self) {
            self.hits.set(self.hits.get() + 1);
        }
    }

    fn record(owner_id: i64, visibility: Visibility) -> Wishlist {
        Wishlist {
            id: WishlistId::new(10),
            owner: Owner::User(UserId::new(owner_id)),
            slug: Slug::new("gifts"),
            name: "Gifts".to_owned(),
            share_token: ShareToken::new("SHARETOK1234"),
            visibility,
            is_default: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unauthenticated_denied_everything() {
        let caller = CallerContext::unidentified(Utc::now());
        let target = record(5, Visibility::Public);

        assert_eq!(authorize_export(&caller), Err(Error::Unauthenticated));
        assert_eq!(
            authorize_record(&caller, Action::Read, &target),
            Err(Error::Unauthenticated)
        );
        assert_eq!(
            authorize_record(&caller, Action::Write, &target),
            Err(Error::Unauthenticated)
        );
    }

    #[test]
    fn test_export_requires_capability_and_resets_once_on_denial() {
        let reset = CountingReset::default();
        let gate = PolicyGate::new(&reset);

        let denied = CallerContext::user(UserId::new(5), [], Utc::now());
        assert_eq!(
            gate.export(&denied),
            Err(Error::NotAuthorized(Action::Export))
        );
        assert_eq!(reset.hits.get(), 1);

        let allowed = CallerContext::user(UserId::new(5), [Capability::ExportWishlists], Utc::now());
        assert_eq!(gate.export(&allowed), Ok(()));
        assert_eq!(reset.hits.get(), 1, "success must not reset");
    }

    #[test]
    fn test_record_check_is_delegated() {
        let owner = CallerContext::user(UserId::new(5), [], Utc::now());
        let stranger = CallerContext::user(UserId::new(6), [], Utc::now());
        let target = record(5, Visibility::Private);

        assert_eq!(authorize_record(&owner, Action::Write, &target), Ok(()));
        assert_eq!(
            authorize_record(&stranger, Action::Read, &target),
            Err(Error::NotAuthorized(Action::Read))
        );
    }

    #[test]
    fn test_export_capability_grants_no_record_write() {
        let exporter = CallerContext::user(UserId::new(7), [Capability::ExportWishlists], Utc::now());
        let target = record(5, Visibility::Private);

        assert_eq!(authorize_export(&exporter), Ok(()));
        assert_eq!(
            authorize_record(&exporter, Action::Write, &target),
            Err(Error::NotAuthorized(Action::Write))
        );
    }

    #[test]
    fn test_gate_resets_on_unauthenticated_but_not_on_success() {
        let reset = CountingReset::default();
        let gate = PolicyGate::new(&reset);
        let target = record(5, Visibility::Private);

        let guest = CallerContext::unidentified(Utc::now());
        assert!(gate.record(&guest, Action::Read, &target).is_err());
        assert_eq!(reset.hits.get(), 1);

        let owner = CallerContext::user(UserId::new(5), [], Utc::now());
        assert!(gate.record(&owner, Action::Read, &target).is_ok());
        assert_eq!(reset.hits.get(), 1);
    }
}
