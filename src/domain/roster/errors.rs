//! Roster-specific error types.
//!
//! The idempotent variants (`AlreadyBooked`, `AlreadyCheckedIn`) are not
//! failures from the member's point of view; handlers surface them as
//! success-with-notice. `CapacityExceeded` means a race was lost at
//! commit time and the caller should re-offer the waitlist rather than
//! blindly retry.

use crate::domain::admission::DenialReason;
use crate::domain::foundation::{DomainError, ErrorCode, MemberId, RosterEntryId, SessionId};

/// Errors raised by booking, cancellation and check-in operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterError {
    /// A business rule rejected the booking. Surfaced verbatim for UI
    /// display; never retried.
    AdmissionDenied(DenialReason),

    /// The member already has a non-cancelled entry for this session.
    AlreadyBooked {
        session: SessionId,
        member: MemberId,
    },

    /// An attendance fact already exists for this (session, member).
    AlreadyCheckedIn {
        session: SessionId,
        member: MemberId,
    },

    /// The seat count check failed inside the commit transaction.
    CapacityExceeded { session: SessionId },

    /// No prior booking exists and walk-ins are disabled.
    WalkInNotPermitted { session: SessionId },

    /// Roster entry was not found.
    EntryNotFound(RosterEntryId),

    /// Session was not found.
    SessionNotFound(SessionId),

    /// Member is unknown to the membership system.
    MemberNotFound(MemberId),

    /// No attendance fact exists for this (session, member).
    AttendanceNotFound {
        session: SessionId,
        member: MemberId,
    },

    /// Invalid state for the requested operation.
    InvalidState { current: String, attempted: String },

    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl RosterError {
    pub fn admission_denied(reason: DenialReason) -> Self {
        RosterError::AdmissionDenied(reason)
    }

    pub fn already_booked(session: SessionId, member: MemberId) -> Self {
        RosterError::AlreadyBooked { session, member }
    }

    pub fn already_checked_in(session: SessionId, member: MemberId) -> Self {
        RosterError::AlreadyCheckedIn { session, member }
    }

    pub fn capacity_exceeded(session: SessionId) -> Self {
        RosterError::CapacityExceeded { session }
    }

    pub fn walk_in_not_permitted(session: SessionId) -> Self {
        RosterError::WalkInNotPermitted { session }
    }

    pub fn entry_not_found(id: RosterEntryId) -> Self {
        RosterError::EntryNotFound(id)
    }

    pub fn session_not_found(id: SessionId) -> Self {
        RosterError::SessionNotFound(id)
    }

    pub fn member_not_found(id: MemberId) -> Self {
        RosterError::MemberNotFound(id)
    }

    pub fn attendance_not_found(session: SessionId, member: MemberId) -> Self {
        RosterError::AttendanceNotFound { session, member }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        RosterError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RosterError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        RosterError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RosterError::AdmissionDenied(_) => ErrorCode::AdmissionDenied,
            RosterError::AlreadyBooked { .. } => ErrorCode::AlreadyBooked,
            RosterError::AlreadyCheckedIn { .. } => ErrorCode::AlreadyCheckedIn,
            RosterError::CapacityExceeded { .. } => ErrorCode::SessionFull,
            RosterError::WalkInNotPermitted { .. } => ErrorCode::WalkInNotPermitted,
            RosterError::EntryNotFound(_) => ErrorCode::RosterEntryNotFound,
            RosterError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            RosterError::MemberNotFound(_) => ErrorCode::MemberNotFound,
            RosterError::AttendanceNotFound { .. } => ErrorCode::RosterEntryNotFound,
            RosterError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            RosterError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            RosterError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            RosterError::AdmissionDenied(reason) => reason.user_message(),
            RosterError::AlreadyBooked { member, session } => {
                format!("Member {} already has a booking for session {}", member, session)
            }
            RosterError::AlreadyCheckedIn { member, session } => {
                format!("Member {} is already checked in to session {}", member, session)
            }
            RosterError::CapacityExceeded { session } => {
                format!("Session {} is full", session)
            }
            RosterError::WalkInNotPermitted { session } => {
                format!("Walk-in check-ins are not permitted for session {}", session)
            }
            RosterError::EntryNotFound(id) => format!("Roster entry not found: {}", id),
            RosterError::SessionNotFound(id) => format!("Session not found: {}", id),
            RosterError::MemberNotFound(id) => format!("Member not found: {}", id),
            RosterError::AttendanceNotFound { member, session } => {
                format!("No attendance recorded for member {} in session {}", member, session)
            }
            RosterError::InvalidState { current, attempted } => {
                format!("Cannot {} roster entry in {} state", attempted, current)
            }
            RosterError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            RosterError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// True for the idempotent no-op variants that callers should treat
    /// as success with a notice.
    pub fn is_idempotent_noop(&self) -> bool {
        matches!(
            self,
            RosterError::AlreadyBooked { .. } | RosterError::AlreadyCheckedIn { .. }
        )
    }
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for RosterError {}

impl From<DomainError> for RosterError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => RosterError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.to_string(),
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => RosterError::ValidationFailed {
                field: "unknown".to_string(),
                message: err.to_string(),
            },
            _ => RosterError::Infrastructure(err.to_string()),
        }
    }
}

impl From<RosterError> for DomainError {
    fn from(err: RosterError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> MemberId {
        MemberId::new("m-1").unwrap()
    }

    #[test]
    fn codes_map_to_error_categories() {
        assert_eq!(
            RosterError::already_booked(SessionId::new(), member()).code(),
            ErrorCode::AlreadyBooked
        );
        assert_eq!(
            RosterError::admission_denied(DenialReason::NoActiveSubscription).code(),
            ErrorCode::AdmissionDenied
        );
        assert_eq!(
            RosterError::capacity_exceeded(SessionId::new()).code(),
            ErrorCode::SessionFull
        );
    }

    #[test]
    fn idempotent_noops_are_flagged() {
        assert!(RosterError::already_booked(SessionId::new(), member()).is_idempotent_noop());
        assert!(RosterError::already_checked_in(SessionId::new(), member()).is_idempotent_noop());
        assert!(!RosterError::capacity_exceeded(SessionId::new()).is_idempotent_noop());
    }

    #[test]
    fn admission_denied_surfaces_reason_message() {
        let err = RosterError::admission_denied(DenialReason::NoActiveSubscription);
        assert!(err.message().contains("subscription"));
    }
}
