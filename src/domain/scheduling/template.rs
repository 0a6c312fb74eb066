//! Recurring class template.
//!
//! A template is the staff-configured definition of a weekly class:
//! level, duration, capacity, active weekdays and time-of-day. The
//! generator expands it into concrete [`Session`](super::Session) records;
//! the template itself is never bookable.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CourseId, InstructorId, MemberId, TemplateId, Timestamp, ValidationError,
};

/// Audience level of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassLevel {
    Beginner,
    Intermediate,
    Advanced,
    All,
}

impl Default for ClassLevel {
    fn default() -> Self {
        ClassLevel::All
    }
}

/// Set of active weekdays, Monday through Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdaySet([bool; 7]);

impl WeekdaySet {
    /// Creates an empty set.
    pub fn empty() -> Self {
        Self([false; 7])
    }

    /// Creates a set from a slice of weekdays.
    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = Self::empty();
        for day in days {
            set.0[day.num_days_from_monday() as usize] = true;
        }
        set
    }

    /// Returns a copy of this set with the given day enabled.
    pub fn with(mut self, day: Weekday) -> Self {
        self.0[day.num_days_from_monday() as usize] = true;
        self
    }

    /// Checks whether the given weekday is active.
    pub fn contains(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_monday() as usize]
    }

    /// True if no weekday is active.
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&d| d)
    }
}

/// Weekly recurrence settings of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Weekdays on which a session occurs.
    pub weekdays: WeekdaySet,

    /// Time of day every occurrence starts.
    pub time_of_day: NaiveTime,

    /// First date the recurrence is effective (open-ended if absent).
    pub start_date: Option<NaiveDate>,

    /// Last date the recurrence is effective (open-ended if absent).
    pub end_date: Option<NaiveDate>,
}

/// A recurring class definition.
///
/// # Invariants
///
/// - `duration_minutes > 0`
/// - `name` is non-empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTemplate {
    /// Unique identifier.
    pub id: TemplateId,

    /// Display name, e.g. "Adult BJJ Fundamentals".
    pub name: String,

    /// Audience level.
    pub level: ClassLevel,

    /// Length of each session in minutes.
    pub duration_minutes: u32,

    /// Default seat capacity copied onto generated sessions.
    pub capacity: u32,

    /// Instructor assigned to generated sessions.
    pub instructor: Option<InstructorId>,

    /// Course this class belongs to, if any. Drives admission rules.
    pub course: Option<CourseId>,

    /// Members enrolled at course level; each generated session gets a
    /// booked roster entry for every one of them.
    pub enrolled_members: Vec<MemberId>,

    /// Weekly recurrence settings; templates without one are only
    /// scheduled manually.
    pub recurrence: Option<Recurrence>,

    /// Inactive templates are skipped by the generator.
    pub active: bool,

    /// When the template was created.
    pub created_at: Timestamp,

    /// When the template was last updated.
    pub updated_at: Timestamp,
}

impl ClassTemplate {
    /// Creates a new template with no recurrence and an empty roster.
    pub fn new(
        id: TemplateId,
        name: impl Into<String>,
        level: ClassLevel,
        duration_minutes: u32,
        capacity: u32,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if duration_minutes == 0 {
            return Err(ValidationError::out_of_range(
                "duration_minutes",
                1,
                i32::MAX,
                0,
            ));
        }
        Ok(Self {
            id,
            name,
            level,
            duration_minutes,
            capacity,
            instructor: None,
            course: None,
            enrolled_members: Vec::new(),
            recurrence: None,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sets the weekly recurrence.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Links the template to a course.
    pub fn with_course(mut self, course: CourseId) -> Self {
        self.course = Some(course);
        self
    }

    /// Assigns the recurring instructor.
    pub fn with_instructor(mut self, instructor: InstructorId) -> Self {
        self.instructor = Some(instructor);
        self
    }

    /// Sets the course-level member roster.
    pub fn with_enrolled_members(mut self, members: Vec<MemberId>) -> Self {
        self.enrolled_members = members;
        self
    }

    /// True if the generator should expand this template.
    pub fn is_generatable(&self) -> bool {
        self.active
            && self
                .recurrence
                .as_ref()
                .map(|r| !r.weekdays.is_empty())
                .unwrap_or(false)
    }
}
