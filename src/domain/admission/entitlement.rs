//! Subscription entitlements consumed from the billing system.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, PlanId, SessionId, Timestamp};

/// One active subscription's grant of class access, read-only to this core.
///
/// `allowed_courses` empty means the plan is unrestricted. Caps are
/// optional; a plan with no caps admits unlimited bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEntitlement {
    pub plan: PlanId,
    pub plan_name: String,

    /// Courses this plan covers; empty = every course.
    pub allowed_courses: Vec<CourseId>,

    /// Maximum `Booked` entries per Monday-Sunday week, if capped.
    pub weekly_cap: Option<u32>,

    /// Maximum `Booked` entries per billing period, if capped.
    pub period_cap: Option<u32>,

    /// Start of the current billing period.
    pub period_start: Option<NaiveDate>,

    /// First day of the next billing period (exclusive bound).
    pub next_billing_date: Option<NaiveDate>,
}

impl SubscriptionEntitlement {
    /// True if this plan permits booking sessions of the given course.
    ///
    /// A restricted plan never covers a session without a course, since
    /// the allow-list can only name courses.
    pub fn covers(&self, course: Option<&CourseId>) -> bool {
        if self.allowed_courses.is_empty() {
            return true;
        }
        match course {
            Some(id) => self.allowed_courses.contains(id),
            None => false,
        }
    }

    /// True if the billing-period cap is actually enforceable: it needs
    /// the cap itself plus both period bounds.
    pub fn period_cap_window(&self) -> Option<(u32, NaiveDate, NaiveDate)> {
        match (self.period_cap, self.period_start, self.next_billing_date) {
            (Some(cap), Some(start), Some(next)) if cap > 0 => Some((cap, start, next)),
            _ => None,
        }
    }
}

/// Snapshot of one of the member's other `Booked` entries, used as input
/// to frequency-cap counting. Assembled by the booking handler from the
/// roster store; the policy itself never queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSnapshot {
    pub session: SessionId,
    pub starts_at: Timestamp,
    pub course: Option<CourseId>,
}
