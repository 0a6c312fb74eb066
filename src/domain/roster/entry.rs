//! Roster entry aggregate - one member's booking on one session.
//!
//! A roster entry is created when a member books (or walks in) and is
//! never deleted; cancellation is a terminal state so booking history
//! survives. At most one non-cancelled entry exists per (session, member)
//! pair, enforced by the roster store.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, MemberId, RosterEntryId, SessionId, StateMachine, Timestamp,
};

/// Where a booking came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    /// Member booked through the self-service portal or app.
    SelfService,

    /// Staff booked on the member's behalf at the desk.
    Staff,

    /// Booked or checked in at the unattended kiosk.
    Kiosk,

    /// Synthesized at check-in time for a member with no prior booking.
    WalkIn,
}

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    /// Holds a seat against session capacity.
    Booked,

    /// Queued for a seat; promoted FIFO when one frees up.
    Waitlisted,

    /// Member checked in. Terminal.
    Attended,

    /// Member was expected but never checked in. Terminal.
    NoShow,

    /// Booking withdrawn by member or staff. Terminal.
    Cancelled,
}

impl RosterStatus {
    /// True if the entry still occupies the booking pipeline.
    pub fn is_active(&self) -> bool {
        matches!(self, RosterStatus::Booked | RosterStatus::Waitlisted)
    }
}

impl StateMachine for RosterStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use RosterStatus::*;
        matches!(
            (self, target),
            (Booked, Attended)
                | (Booked, NoShow)
                | (Booked, Cancelled)
                // Promotion is the only path out of the waitlist into a seat;
                // Booked never moves back to Waitlisted.
                | (Waitlisted, Booked)
                | (Waitlisted, Attended)
                | (Waitlisted, NoShow)
                | (Waitlisted, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RosterStatus::*;
        match self {
            Booked => vec![Attended, NoShow, Cancelled],
            Waitlisted => vec![Booked, Attended, NoShow, Cancelled],
            Attended => vec![],
            NoShow => vec![],
            Cancelled => vec![],
        }
    }
}

/// One (session, member) booking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Unique identifier.
    pub id: RosterEntryId,

    /// Session the booking is against.
    pub session: SessionId,

    /// The booked member.
    pub member: MemberId,

    /// Current lifecycle status.
    pub status: RosterStatus,

    /// Where the booking came from.
    pub source: BookingSource,

    /// When the booking was made. Waitlist promotion orders by this.
    pub booked_at: Timestamp,

    /// When the member checked in, once attended.
    pub checked_in_at: Option<Timestamp>,

    /// When the member checked out, if they did.
    pub checked_out_at: Option<Timestamp>,
}

impl RosterEntry {
    /// Creates an entry holding a seat.
    pub fn booked(
        id: RosterEntryId,
        session: SessionId,
        member: MemberId,
        source: BookingSource,
        booked_at: Timestamp,
    ) -> Self {
        Self {
            id,
            session,
            member,
            status: RosterStatus::Booked,
            source,
            booked_at,
            checked_in_at: None,
            checked_out_at: None,
        }
    }

    /// Creates an entry on the waitlist.
    pub fn waitlisted(
        id: RosterEntryId,
        session: SessionId,
        member: MemberId,
        source: BookingSource,
        booked_at: Timestamp,
    ) -> Self {
        Self {
            status: RosterStatus::Waitlisted,
            ..Self::booked(id, session, member, source, booked_at)
        }
    }

    /// Creates an entry directly in `Attended` for a walk-in check-in.
    ///
    /// Walk-ins bypass capacity and the waitlist: the member is already
    /// on the mat, so the entry records the fact rather than reserving a
    /// seat.
    pub fn walk_in(
        id: RosterEntryId,
        session: SessionId,
        member: MemberId,
        source: BookingSource,
        now: Timestamp,
    ) -> Self {
        Self {
            status: RosterStatus::Attended,
            checked_in_at: Some(now),
            ..Self::booked(id, session, member, source, now)
        }
    }

    /// Promotes a waitlisted entry into a seat. Only valid from
    /// `Waitlisted`; this is the single path back to `Booked`.
    ///
    /// # Errors
    ///
    /// Returns error if the entry is not waitlisted.
    pub fn promote(&mut self) -> Result<(), DomainError> {
        if self.status != RosterStatus::Waitlisted {
            return Err(invalid_transition(self.status, RosterStatus::Booked));
        }
        self.status = RosterStatus::Booked;
        Ok(())
    }

    /// Records the member's check-in.
    ///
    /// # Errors
    ///
    /// Returns error unless the entry is `Booked` or `Waitlisted`.
    pub fn check_in(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(RosterStatus::Attended)?;
        self.checked_in_at = Some(now);
        Ok(())
    }

    /// Records the member's check-out. Requires a prior check-in; the
    /// status stays `Attended`.
    ///
    /// # Errors
    ///
    /// Returns error if the member never checked in.
    pub fn check_out(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status != RosterStatus::Attended {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Member must be checked in to check out",
            ));
        }
        self.checked_out_at = Some(now);
        Ok(())
    }

    /// Marks the member a no-show.
    ///
    /// # Errors
    ///
    /// Returns error unless the entry is `Booked` or `Waitlisted`.
    pub fn mark_no_show(&mut self) -> Result<(), DomainError> {
        self.transition_to(RosterStatus::NoShow)
    }

    /// Cancels the booking. Terminal.
    ///
    /// # Errors
    ///
    /// Returns error if the entry is already terminal.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition_to(RosterStatus::Cancelled)
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: RosterStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| invalid_transition(self.status, target))?;
        Ok(())
    }
}

fn invalid_transition(current: RosterStatus, target: RosterStatus) -> DomainError {
    DomainError::new(
        ErrorCode::InvalidStateTransition,
        format!(
            "Cannot transition roster entry from {:?} to {:?}",
            current, target
        ),
    )
}
