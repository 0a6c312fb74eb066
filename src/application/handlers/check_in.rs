//! CheckInHandler - Command handler turning a booking (or a walk-in) into
//! an attendance fact, exactly once.
//!
//! Every entry point lands here: staff desk, self-service portal and the
//! unattended kiosk. The handler is idempotent; a repeat call for the
//! same (session, member) returns `AlreadyCheckedIn` without a second
//! attendance fact or counter increment. Concurrent calls converge on
//! the attendance store's uniqueness guard.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{AttendanceId, Clock, MemberId, RosterEntryId, SessionId};
use crate::domain::roster::{AttendanceFact, BookingSource, RosterEntry, RosterError, RosterStatus};
use crate::domain::scheduling::SessionStatus;
use crate::ports::{AttendanceCounter, RosterStore, SessionRepository};

/// Command to check a member in to a session.
#[derive(Debug, Clone)]
pub struct CheckInCommand {
    pub member: MemberId,
    pub session: SessionId,
    pub source: BookingSource,
}

/// How the check-in concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// A new attendance fact was recorded.
    CheckedIn,

    /// Attendance was already on record; nothing changed.
    AlreadyCheckedIn,
}

/// Result of a check-in request.
#[derive(Debug, Clone)]
pub struct CheckInResult {
    pub outcome: CheckInOutcome,

    /// The roster entry backing the attendance, when one exists.
    pub entry: Option<RosterEntry>,

    /// True when this check-in moved the session from `Open` to
    /// `InProgress`.
    pub session_started: bool,
}

/// Handler for check-ins from kiosk, portal and staff flows.
pub struct CheckInHandler {
    sessions: Arc<dyn SessionRepository>,
    roster: Arc<dyn RosterStore>,
    counter: Arc<dyn AttendanceCounter>,
    clock: Arc<dyn Clock>,
    allow_walk_in: bool,
}

impl CheckInHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        roster: Arc<dyn RosterStore>,
        counter: Arc<dyn AttendanceCounter>,
        clock: Arc<dyn Clock>,
        allow_walk_in: bool,
    ) -> Self {
        Self {
            sessions,
            roster,
            counter,
            clock,
            allow_walk_in,
        }
    }

    pub async fn handle(&self, cmd: CheckInCommand) -> Result<CheckInResult, RosterError> {
        let mut session = self
            .sessions
            .find_by_id(&cmd.session)
            .await
            .map_err(|e| RosterError::infrastructure(e.to_string()))?
            .ok_or(RosterError::SessionNotFound(cmd.session))?;

        // No attendance may be recorded against a cancelled session.
        if session.is_cancelled() {
            return Err(RosterError::invalid_state("cancelled", "check in to"));
        }

        // Idempotence: attendance already on record is a notice, not an error.
        if self
            .roster
            .find_attendance(&cmd.session, &cmd.member)
            .await?
            .is_some()
        {
            let entry = self
                .roster
                .find_active_entry(&cmd.session, &cmd.member)
                .await?;
            return Ok(CheckInResult {
                outcome: CheckInOutcome::AlreadyCheckedIn,
                entry,
                session_started: false,
            });
        }

        let now = self.clock.now();
        let entry = self.resolve_entry(&cmd, now).await?;

        // Record the fact; the uniqueness constraint converges races.
        let fact = AttendanceFact::record(
            AttendanceId::new(),
            cmd.session,
            cmd.member.clone(),
            cmd.source,
            now,
        );
        let created = self.roster.record_attendance(&fact).await?;
        if !created {
            return Ok(CheckInResult {
                outcome: CheckInOutcome::AlreadyCheckedIn,
                entry: Some(entry),
                session_started: false,
            });
        }

        self.counter
            .increment(&cmd.member, 1)
            .await
            .map_err(|e| RosterError::infrastructure(e.to_string()))?;

        // The first check-in starts the class.
        let mut session_started = false;
        if session.status == SessionStatus::Open {
            session.start_class(now)?;
            self.sessions
                .update(&session)
                .await
                .map_err(|e| RosterError::infrastructure(e.to_string()))?;
            session_started = true;
        }

        info!(
            member = %cmd.member,
            session = %cmd.session,
            source = ?cmd.source,
            session_started,
            "member checked in"
        );

        Ok(CheckInResult {
            outcome: CheckInOutcome::CheckedIn,
            entry: Some(entry),
            session_started,
        })
    }

    /// Finds the entry to attend, or synthesizes a walk-in.
    async fn resolve_entry(
        &self,
        cmd: &CheckInCommand,
        now: crate::domain::foundation::Timestamp,
    ) -> Result<RosterEntry, RosterError> {
        match self
            .roster
            .find_active_entry(&cmd.session, &cmd.member)
            .await?
        {
            Some(mut entry) if entry.status.is_active() => {
                entry.check_in(now)?;
                self.roster.update_entry(&entry).await?;
                Ok(entry)
            }
            // An attended entry without a fact: fall through and let the
            // fact recording repair the gap.
            Some(entry) if entry.status == RosterStatus::Attended => Ok(entry),
            Some(entry) => Err(RosterError::invalid_state(
                format!("{:?}", entry.status),
                "check in",
            )),
            None if self.allow_walk_in => {
                // A walk-in is a fait accompli; it bypasses capacity and
                // the waitlist entirely.
                let entry = RosterEntry::walk_in(
                    RosterEntryId::new(),
                    cmd.session,
                    cmd.member.clone(),
                    cmd.source,
                    now,
                );
                match self.roster.insert_walk_in(&entry).await {
                    Ok(()) => Ok(entry),
                    // A concurrent walk-in won the insert; adopt its entry
                    // so the fact recording converges.
                    Err(RosterError::AlreadyBooked { .. }) => self
                        .roster
                        .find_active_entry(&cmd.session, &cmd.member)
                        .await?
                        .ok_or(RosterError::AlreadyBooked {
                            session: cmd.session,
                            member: cmd.member.clone(),
                        }),
                    Err(e) => Err(e),
                }
            }
            None => Err(RosterError::walk_in_not_permitted(cmd.session)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAttendanceCounter, InMemoryStore};
    use crate::domain::foundation::{FixedClock, TemplateId, Timestamp};
    use crate::domain::scheduling::Session;
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

    struct Fixture {
        store: Arc<InMemoryStore>,
        counter: Arc<InMemoryAttendanceCounter>,
        handler: CheckInHandler,
        session: SessionId,
    }

    fn fixture(allow_walk_in: bool) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let counter = Arc::new(InMemoryAttendanceCounter::new());

        let mut session = Session::new(
            SessionId::new(),
            TemplateId::new(),
            ts(11, 18),
            ts(11, 19),
            5,
            ts(1, 0),
        )
        .unwrap();
        session.open(ts(1, 0)).unwrap();
        let session_id = session.id;
        store.seed_session(session);

        let handler = CheckInHandler::new(
            store.clone(),
            store.clone(),
            counter.clone(),
            Arc::new(FixedClock(ts(11, 18))),
            allow_walk_in,
        );
        Fixture {
            store,
            counter,
            handler,
            session: session_id,
        }
    }

    fn cmd(f: &Fixture, member_id: &str) -> CheckInCommand {
        CheckInCommand {
            member: member(member_id),
            session: f.session,
            source: BookingSource::Kiosk,
        }
    }

    #[tokio::test]
    async fn checks_in_booked_member_and_increments_counter() {
        let f = fixture(false);
        f.store
            .book(&f.session, &member("m-1"), BookingSource::SelfService, ts(2, 9))
            .await
            .unwrap();

        let result = f.handler.handle(cmd(&f, "m-1")).await.unwrap();

        assert_eq!(result.outcome, CheckInOutcome::CheckedIn);
        let entry = result.entry.unwrap();
        assert_eq!(entry.status, RosterStatus::Attended);
        assert!(entry.checked_in_at.is_some());
        assert_eq!(f.counter.count(&member("m-1")), 1);
        assert!(f
            .store
            .find_attendance(&f.session, &member("m-1"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn repeat_check_in_is_idempotent() {
        let f = fixture(false);
        f.store
            .book(&f.session, &member("m-1"), BookingSource::SelfService, ts(2, 9))
            .await
            .unwrap();

        f.handler.handle(cmd(&f, "m-1")).await.unwrap();
        let second = f.handler.handle(cmd(&f, "m-1")).await.unwrap();

        assert_eq!(second.outcome, CheckInOutcome::AlreadyCheckedIn);
        assert_eq!(f.counter.count(&member("m-1")), 1);
    }

    #[tokio::test]
    async fn waitlisted_member_can_check_in() {
        let f = fixture(false);
        // Fill the session so the next booking lands on the waitlist.
        for i in 0..5 {
            f.store
                .book(
                    &f.session,
                    &member(&format!("filler-{}", i)),
                    BookingSource::SelfService,
                    ts(2, 9),
                )
                .await
                .unwrap();
        }
        let waitlisted = f
            .store
            .book(&f.session, &member("m-w"), BookingSource::SelfService, ts(2, 10))
            .await
            .unwrap();
        assert_eq!(waitlisted.status, RosterStatus::Waitlisted);

        let result = f.handler.handle(cmd(&f, "m-w")).await.unwrap();
        assert_eq!(result.outcome, CheckInOutcome::CheckedIn);
        assert_eq!(result.entry.unwrap().status, RosterStatus::Attended);
    }

    #[tokio::test]
    async fn first_check_in_starts_open_session() {
        let f = fixture(true);

        let first = f.handler.handle(cmd(&f, "m-1")).await.unwrap();
        assert!(first.session_started);
        assert_eq!(
            f.store.session(&f.session).unwrap().status,
            SessionStatus::InProgress
        );

        let second = f.handler.handle(cmd(&f, "m-2")).await.unwrap();
        assert!(!second.session_started);
    }

    #[tokio::test]
    async fn walk_in_synthesizes_attended_entry_when_allowed() {
        let f = fixture(true);

        let result = f.handler.handle(cmd(&f, "m-walkin")).await.unwrap();

        assert_eq!(result.outcome, CheckInOutcome::CheckedIn);
        let entry = result.entry.unwrap();
        assert_eq!(entry.status, RosterStatus::Attended);
        assert_eq!(entry.source, BookingSource::Kiosk);
        assert_eq!(f.counter.count(&member("m-walkin")), 1);
    }

    #[tokio::test]
    async fn walk_in_rejected_when_disabled() {
        let f = fixture(false);

        let result = f.handler.handle(cmd(&f, "m-walkin")).await;
        assert_eq!(
            result.unwrap_err(),
            RosterError::WalkInNotPermitted { session: f.session }
        );
        assert_eq!(f.counter.count(&member("m-walkin")), 0);
    }

    #[tokio::test]
    async fn walk_in_bypasses_capacity() {
        let f = fixture(true);
        for i in 0..5 {
            f.store
                .book(
                    &f.session,
                    &member(&format!("filler-{}", i)),
                    BookingSource::SelfService,
                    ts(2, 9),
                )
                .await
                .unwrap();
        }

        // Session is full, but the walk-in is already on the mat.
        let result = f.handler.handle(cmd(&f, "m-extra")).await.unwrap();
        assert_eq!(result.outcome, CheckInOutcome::CheckedIn);
    }

    #[tokio::test]
    async fn cannot_check_in_to_cancelled_session() {
        let f = fixture(true);
        let mut session = f.store.session(&f.session).unwrap();
        session.cancel(ts(3, 0)).unwrap();
        f.store.seed_session(session);

        let result = f.handler.handle(cmd(&f, "m-1")).await;
        assert!(matches!(
            result.unwrap_err(),
            RosterError::InvalidState { .. }
        ));
        assert_eq!(f.counter.count(&member("m-1")), 0);
    }

    #[tokio::test]
    async fn no_show_member_cannot_check_in() {
        let f = fixture(true);
        let mut entry = f
            .store
            .book(&f.session, &member("m-1"), BookingSource::SelfService, ts(2, 9))
            .await
            .unwrap();
        entry.mark_no_show().unwrap();
        f.store.update_entry(&entry).await.unwrap();

        let result = f.handler.handle(cmd(&f, "m-1")).await;
        assert!(matches!(
            result.unwrap_err(),
            RosterError::InvalidState { .. }
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let f = fixture(true);
        let missing = SessionId::new();
        let result = f
            .handler
            .handle(CheckInCommand {
                member: member("m-1"),
                session: missing,
                source: BookingSource::Kiosk,
            })
            .await;
        assert_eq!(result.unwrap_err(), RosterError::SessionNotFound(missing));
    }
}
