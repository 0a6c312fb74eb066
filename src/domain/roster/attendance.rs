//! Attendance fact - the append-only record of a realized check-in.
//!
//! Decoupled from the roster entry so historical attendance survives
//! roster edits. Exactly one fact may exist per (session, member);
//! creating one increments the member's attendance counter, and an
//! administrative removal must decrement it symmetrically.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AttendanceId, MemberId, SessionId, Timestamp};

use super::BookingSource;

/// Immutable record that a member attended a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceFact {
    /// Unique identifier.
    pub id: AttendanceId,

    /// Session attended.
    pub session: SessionId,

    /// Member who attended.
    pub member: MemberId,

    /// When the check-in happened.
    pub checked_in_at: Timestamp,

    /// Entry point that produced the check-in.
    pub source: BookingSource,
}

impl AttendanceFact {
    /// Records a new attendance fact.
    pub fn record(
        id: AttendanceId,
        session: SessionId,
        member: MemberId,
        source: BookingSource,
        checked_in_at: Timestamp,
    ) -> Self {
        Self {
            id,
            session,
            member,
            checked_in_at,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_captures_all_fields() {
        let session = SessionId::new();
        let member = MemberId::new("m-1").unwrap();
        let now = Timestamp::now();
        let fact = AttendanceFact::record(
            AttendanceId::new(),
            session,
            member.clone(),
            BookingSource::Kiosk,
            now,
        );
        assert_eq!(fact.session, session);
        assert_eq!(fact.member, member);
        assert_eq!(fact.checked_in_at, now);
        assert_eq!(fact.source, BookingSource::Kiosk);
    }
}
