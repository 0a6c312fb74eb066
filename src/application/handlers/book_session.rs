//! BookSessionHandler - Command handler for booking a member onto a session.
//!
//! Runs the admission policy as an advisory pre-check, then hands the
//! authoritative capacity/uniqueness decision to the roster store's
//! booking transaction. A concurrent duplicate booking surfaces as
//! success-with-notice, not a failure.

use std::sync::Arc;

use tracing::info;

use crate::domain::admission::{AdmissionContext, AdmissionPolicy, Course};
use crate::domain::foundation::{Clock, MemberId, SessionId};
use crate::domain::roster::{BookingSource, RosterEntry, RosterError, RosterStatus};
use crate::ports::{
    CourseCatalog, EntitlementProvider, MemberDirectory, RosterStore, SessionRepository,
};

/// Command to book a member onto a session.
#[derive(Debug, Clone)]
pub struct BookSessionCommand {
    pub member: MemberId,
    pub session: SessionId,
    pub source: BookingSource,
}

/// How the booking landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    /// A seat was available; the entry is `Booked`.
    Booked,

    /// The session was full; the entry is `Waitlisted`.
    Waitlisted,

    /// A non-cancelled entry already existed; nothing was created.
    AlreadyBooked,
}

/// Result of a successful booking request.
#[derive(Debug, Clone)]
pub struct BookSessionResult {
    pub entry: RosterEntry,
    pub outcome: BookingOutcome,
}

/// Handler for booking requests from every entry point (portal, staff
/// desk, kiosk).
pub struct BookSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    roster: Arc<dyn RosterStore>,
    entitlements: Arc<dyn EntitlementProvider>,
    directory: Arc<dyn MemberDirectory>,
    catalog: Arc<dyn CourseCatalog>,
    clock: Arc<dyn Clock>,
}

impl BookSessionHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        roster: Arc<dyn RosterStore>,
        entitlements: Arc<dyn EntitlementProvider>,
        directory: Arc<dyn MemberDirectory>,
        catalog: Arc<dyn CourseCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            roster,
            entitlements,
            directory,
            catalog,
            clock,
        }
    }

    pub async fn handle(&self, cmd: BookSessionCommand) -> Result<BookSessionResult, RosterError> {
        // 1. Resolve the session
        let session = self
            .sessions
            .find_by_id(&cmd.session)
            .await
            .map_err(|e| RosterError::infrastructure(e.to_string()))?
            .ok_or(RosterError::SessionNotFound(cmd.session))?;

        // 2. Assemble the admission context from the collaborators
        let rank = self
            .directory
            .rank_of(&cmd.member)
            .await
            .map_err(|e| RosterError::infrastructure(e.to_string()))?
            .ok_or_else(|| RosterError::member_not_found(cmd.member.clone()))?;

        let course = self.resolve_course(&session.course).await?;

        let entitlements = self
            .entitlements
            .active_entitlements(&cmd.member)
            .await
            .map_err(|e| RosterError::infrastructure(e.to_string()))?;

        let existing_bookings = self
            .roster
            .booked_snapshots_for_member(&cmd.member, &cmd.session)
            .await?;

        let ctx = AdmissionContext {
            session,
            member: cmd.member.clone(),
            rank,
            course,
            entitlements,
            existing_bookings,
        };

        // 3. Advisory admission check; the store re-decides capacity and
        //    uniqueness inside its transaction.
        let plan = AdmissionPolicy::evaluate(&ctx)
            .into_result()
            .map_err(RosterError::admission_denied)?;

        // 4. Commit the booking
        match self
            .roster
            .book(&cmd.session, &cmd.member, cmd.source, self.clock.now())
            .await
        {
            Ok(entry) => {
                let outcome = match entry.status {
                    RosterStatus::Waitlisted => BookingOutcome::Waitlisted,
                    _ => BookingOutcome::Booked,
                };
                info!(
                    member = %cmd.member,
                    session = %cmd.session,
                    plan = %plan,
                    outcome = ?outcome,
                    "booking committed"
                );
                Ok(BookSessionResult { entry, outcome })
            }
            // Idempotent no-op: surface the existing entry with a notice.
            Err(RosterError::AlreadyBooked { .. }) => {
                let entry = self
                    .roster
                    .find_active_entry(&cmd.session, &cmd.member)
                    .await?
                    .ok_or(RosterError::AlreadyBooked {
                        session: cmd.session,
                        member: cmd.member.clone(),
                    })?;
                Ok(BookSessionResult {
                    entry,
                    outcome: BookingOutcome::AlreadyBooked,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn resolve_course(
        &self,
        course_id: &Option<crate::domain::foundation::CourseId>,
    ) -> Result<Option<Course>, RosterError> {
        match course_id {
            None => Ok(None),
            Some(id) => self
                .catalog
                .course(id)
                .await
                .map_err(|e| RosterError::infrastructure(e.to_string()))?
                .map(Some)
                .ok_or_else(|| {
                    RosterError::validation("course", format!("Unknown course: {}", id))
                }),
        }
    }
}
