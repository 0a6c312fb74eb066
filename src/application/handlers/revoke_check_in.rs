//! RevokeCheckInHandler - administrative removal of an attendance fact.
//!
//! The counterpart of check-in for data corrections (wrong member, wrong
//! session). Removing the fact decrements the member's attendance counter
//! by exactly one, keeping fact table and counter symmetric. The roster
//! entry is left untouched as history.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{MemberId, SessionId};
use crate::domain::roster::{AttendanceFact, RosterError};
use crate::ports::{AttendanceCounter, RosterStore};

/// Command to revoke a recorded attendance.
#[derive(Debug, Clone)]
pub struct RevokeCheckInCommand {
    pub member: MemberId,
    pub session: SessionId,
}

/// Handler for attendance corrections.
pub struct RevokeCheckInHandler {
    roster: Arc<dyn RosterStore>,
    counter: Arc<dyn AttendanceCounter>,
}

impl RevokeCheckInHandler {
    pub fn new(roster: Arc<dyn RosterStore>, counter: Arc<dyn AttendanceCounter>) -> Self {
        Self { roster, counter }
    }

    pub async fn handle(&self, cmd: RevokeCheckInCommand) -> Result<AttendanceFact, RosterError> {
        let fact = self
            .roster
            .remove_attendance(&cmd.session, &cmd.member)
            .await?;

        self.counter
            .increment(&cmd.member, -1)
            .await
            .map_err(|e| RosterError::infrastructure(e.to_string()))?;

        info!(member = %cmd.member, session = %cmd.session, "attendance revoked");
        Ok(fact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAttendanceCounter, InMemoryStore};
    use crate::domain::foundation::{AttendanceId, Timestamp};
    use crate::domain::roster::BookingSource;
    use crate::ports::AttendanceCounter as _;
    use chrono::{NaiveDate, NaiveTime};

    fn ts(day: u32, hour: u32) -> Timestamp {
        Timestamp::from_date_time(
            NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        )
    }

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    #[tokio::test]
    async fn revoking_decrements_counter_symmetrically() {
        let store = Arc::new(InMemoryStore::new());
        let counter = Arc::new(InMemoryAttendanceCounter::new());
        let session = SessionId::new();

        let fact = AttendanceFact::record(
            AttendanceId::new(),
            session,
            member("m-1"),
            BookingSource::Kiosk,
            ts(11, 18),
        );
        assert!(store.record_attendance(&fact).await.unwrap());
        counter.increment(&member("m-1"), 1).await.unwrap();
        assert_eq!(counter.count(&member("m-1")), 1);

        let handler = RevokeCheckInHandler::new(store.clone(), counter.clone());
        let removed = handler
            .handle(RevokeCheckInCommand {
                member: member("m-1"),
                session,
            })
            .await
            .unwrap();

        assert_eq!(removed.id, fact.id);
        assert_eq!(counter.count(&member("m-1")), 0);
        assert!(store
            .find_attendance(&session, &member("m-1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn revoking_missing_attendance_fails() {
        let store = Arc::new(InMemoryStore::new());
        let counter = Arc::new(InMemoryAttendanceCounter::new());

        let handler = RevokeCheckInHandler::new(store, counter.clone());
        let result = handler
            .handle(RevokeCheckInCommand {
                member: member("m-1"),
                session: SessionId::new(),
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            RosterError::AttendanceNotFound { .. }
        ));
        assert_eq!(counter.count(&member("m-1")), 0);
    }
}
