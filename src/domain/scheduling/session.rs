//! Session aggregate - one concrete class occurrence.
//!
//! Sessions are created by the recurrence generator (or manually by staff)
//! and carry their own capacity so that staff can override the template
//! default for a single date. A session is never physically removed once
//! bookings exist; cancellation is a terminal state.
//!
//! # Invariants
//!
//! - `end > start`
//! - Status transitions follow the state machine rules
//! - Generated sessions carry the calendar `occurrence_date` used for
//!   duplicate detection by the generator

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CourseId, DomainError, ErrorCode, InstructorId, SessionId, StateMachine, TemplateId,
    Timestamp, ValidationError,
};

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Manually staged, not yet bookable.
    Draft,

    /// Published and accepting bookings.
    Open,

    /// Class is underway. Entered by staff or by the first check-in.
    InProgress,

    /// Class finished.
    Done,

    /// Called off. Bookings are preserved but frozen.
    Cancelled,
}

impl SessionStatus {
    /// True if members may book or check in to a session in this status.
    pub fn accepts_members(&self) -> bool {
        matches!(self, SessionStatus::Open | SessionStatus::InProgress)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Draft, Open)
                | (Draft, Cancelled)
                | (Open, InProgress)
                | (Open, Done)
                | (Open, Cancelled)
                | (InProgress, Done)
                | (InProgress, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Draft => vec![Open, Cancelled],
            Open => vec![InProgress, Done, Cancelled],
            InProgress => vec![Done, Cancelled],
            Done => vec![],
            Cancelled => vec![],
        }
    }
}

/// One concrete, time-boxed class occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,

    /// Template this session was spawned from.
    pub template_id: TemplateId,

    /// Course the class belongs to, copied from the template.
    pub course: Option<CourseId>,

    /// Instructor leading the session.
    pub instructor: Option<InstructorId>,

    /// When the class starts.
    pub start: Timestamp,

    /// When the class ends.
    pub end: Timestamp,

    /// Seat capacity. Copied from the template at creation; staff may
    /// override per session.
    pub capacity: u32,

    /// Lifecycle status.
    pub status: SessionStatus,

    /// Calendar date of the occurrence when generated from a recurrence.
    /// Duplicate detection keys on (template_id, occurrence_date).
    pub occurrence_date: Option<NaiveDate>,

    /// When the session record was created.
    pub created_at: Timestamp,

    /// When the session record was last updated.
    pub updated_at: Timestamp,
}

impl Session {
    /// Creates a manually staged session in `Draft`.
    pub fn new(
        id: SessionId,
        template_id: TemplateId,
        start: Timestamp,
        end: Timestamp,
        capacity: u32,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::invalid_format(
                "end",
                "End time must be after start time",
            ));
        }
        Ok(Self {
            id,
            template_id,
            course: None,
            instructor: None,
            start,
            end,
            capacity,
            status: SessionStatus::Draft,
            occurrence_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a generated occurrence, immediately `Open` for booking.
    #[allow(clippy::too_many_arguments)]
    pub fn generated_occurrence(
        id: SessionId,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
        start: Timestamp,
        end: Timestamp,
        capacity: u32,
        instructor: Option<InstructorId>,
        course: Option<CourseId>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let mut session = Self::new(id, template_id, start, end, capacity, now)?;
        session.status = SessionStatus::Open;
        session.occurrence_date = Some(occurrence_date);
        session.instructor = instructor;
        session.course = course;
        Ok(session)
    }

    /// Publishes a draft session for booking.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn open(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SessionStatus::Open, now)
    }

    /// Marks the class as underway (staff action or first check-in).
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn start_class(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SessionStatus::InProgress, now)
    }

    /// Marks the class as finished.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SessionStatus::Done, now)
    }

    /// Calls the session off. Terminal; bookings are frozen, not deleted.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SessionStatus::Cancelled, now)
    }

    /// True if the session is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == SessionStatus::Cancelled
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: SessionStatus, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition session from {:?} to {:?}",
                    self.status, target
                ),
            )
        })?;
        self.updated_at = now;
        Ok(())
    }
}
