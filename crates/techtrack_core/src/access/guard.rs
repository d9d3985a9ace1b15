//! Authentication capability declarations and checks.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Operations that require an authenticated session.
///
/// The store enforces the bulk members itself; `Export` and `RandomPick` are
/// checked by front ends through `TechnologyStore::check_access`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatedOperation {
    BulkStatusUpdate,
    MarkAllComplete,
    ResetAll,
    Export,
    RandomPick,
}

impl GatedOperation {
    /// Stable id used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BulkStatusUpdate => "bulk_status_update",
            Self::MarkAllComplete => "mark_all_complete",
            Self::ResetAll => "reset_all",
            Self::Export => "export",
            Self::RandomPick => "random_pick",
        }
    }
}

/// Answers whether the current session is authenticated.
pub trait AccessGuard {
    fn is_authenticated(&self) -> bool;
}

impl<F: Fn() -> bool> AccessGuard for F {
    fn is_authenticated(&self) -> bool {
        self()
    }
}

/// Guard that admits every caller. Used for local single-user setups.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessGuard for AllowAll {
    fn is_authenticated(&self) -> bool {
        true
    }
}

/// Guard that rejects every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl AccessGuard for DenyAll {
    fn is_authenticated(&self) -> bool {
        false
    }
}

/// Gated operation refused for an unauthenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDenied {
    pub operation: GatedOperation,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "operation `{}` requires an authenticated session",
            self.operation.as_str()
        )
    }
}

impl Error for AccessDenied {}

/// Checks `guard` for `operation`.
pub fn assert_access(
    guard: &dyn AccessGuard,
    operation: GatedOperation,
) -> Result<(), AccessDenied> {
    if guard.is_authenticated() {
        Ok(())
    } else {
        Err(AccessDenied { operation })
    }
}

#[cfg(test)]
mod tests {
    use super::{assert_access, AccessDenied, AllowAll, DenyAll, GatedOperation};
    use std::cell::Cell;

    #[test]
    fn allow_and_deny_guards() {
        assert!(assert_access(&AllowAll, GatedOperation::ResetAll).is_ok());
        assert_eq!(
            assert_access(&DenyAll, GatedOperation::ResetAll),
            Err(AccessDenied {
                operation: GatedOperation::ResetAll
            })
        );
    }

    #[test]
    fn closure_guard_is_consulted_on_every_call() {
        let signed_in = Cell::new(false);
        let guard = || signed_in.get();

        assert!(assert_access(&guard, GatedOperation::MarkAllComplete).is_err());
        signed_in.set(true);
        assert!(assert_access(&guard, GatedOperation::MarkAllComplete).is_ok());
    }

    #[test]
    fn denial_message_names_operation() {
        let err = assert_access(&DenyAll, GatedOperation::BulkStatusUpdate).unwrap_err();
        assert!(err.to_string().contains("bulk_status_update"));

        let err = assert_access(&DenyAll, GatedOperation::RandomPick).unwrap_err();
        assert_eq!(
            err.to_string(),
            "operation `random_pick` requires an authenticated session"
        );
        assert_eq!(GatedOperation::Export.as_str(), "export");
    }
}
