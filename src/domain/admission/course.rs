//! Course metadata consumed from the course catalog.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, MemberId};

use super::BeltRank;

/// Read-only view of a course, as supplied by the external catalog.
///
/// A course may gate admission two ways: a minimum belt rank, and (when
/// `open_enrollment` is off) an explicit roster of enrolled members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,

    /// Minimum rank required to join sessions of this course.
    pub min_rank: Option<BeltRank>,

    /// When true, any member meeting the rank requirement may book;
    /// when false, only members on the explicit roster.
    pub open_enrollment: bool,

    /// Explicitly enrolled members. Consulted only when enrollment is
    /// closed.
    pub enrolled_members: Vec<MemberId>,
}

impl Course {
    /// True if the member is on the explicit course roster.
    pub fn is_enrolled(&self, member: &MemberId) -> bool {
        self.enrolled_members.contains(member)
    }
}
