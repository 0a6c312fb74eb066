//! Admission policy - the ordered, explainable booking rule check.
//!
//! The policy is a pure function over a pre-assembled context: the
//! booking handler gathers the session, course metadata, member rank,
//! entitlements and the member's other booked sessions, then asks for a
//! decision. Nothing here touches a datastore, which keeps every rule
//! unit-testable in isolation.
//!
//! Checks run in a fixed order and the first failing check wins, so a
//! rejection is always deterministic and maps to a single reason code:
//!
//! 1. session availability (not cancelled)
//! 2. course eligibility (minimum rank, closed-enrollment roster)
//! 3. subscription entitlement (active plan covering the course)
//! 4. frequency caps (weekly and billing-period, per plan)
//!
//! The result is advisory: capacity and uniqueness are re-decided inside
//! the roster store's booking transaction.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, MemberId, PlanId, Timestamp};
use crate::domain::scheduling::Session;

use super::{BeltRank, BookingSnapshot, Course, SubscriptionEntitlement};

/// Everything the policy needs to decide one (member, session) admission.
#[derive(Debug, Clone)]
pub struct AdmissionContext {
    /// The session being booked.
    pub session: Session,

    /// The member requesting a seat.
    pub member: MemberId,

    /// The member's current rank.
    pub rank: BeltRank,

    /// Metadata of the session's course, when it has one.
    pub course: Option<Course>,

    /// The member's active entitlements; empty means no subscription.
    pub entitlements: Vec<SubscriptionEntitlement>,

    /// The member's *other* `Booked` entries (candidate session excluded),
    /// used for cap counting.
    pub existing_bookings: Vec<BookingSnapshot>,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Admission granted, satisfied by the given plan.
    Allowed { plan: PlanId },

    /// Admission denied with a specific reason.
    Denied(DenialReason),
}

impl AdmissionDecision {
    /// Returns true if admission was granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed { .. })
    }

    /// Converts the decision to a Result type, with denial becoming an error.
    pub fn into_result(self) -> Result<PlanId, DenialReason> {
        match self {
            AdmissionDecision::Allowed { plan } => Ok(plan),
            AdmissionDecision::Denied(reason) => Err(reason),
        }
    }
}

/// Reason why admission was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DenialReason {
    /// The session is cancelled.
    SessionUnavailable,

    /// The course requires a higher belt rank.
    RankTooLow {
        required: BeltRank,
        actual: BeltRank,
    },

    /// The course is closed enrollment and the member is not on its roster.
    NotOnCourseRoster { course: CourseId },

    /// The member has no active subscription.
    NoActiveSubscription,

    /// No active plan's allow-list covers this session's course.
    CourseNotCovered { course: Option<CourseId> },

    /// Weekly session cap reached on the reported plan.
    WeeklyCapReached {
        plan: PlanId,
        cap: u32,
        booked: u32,
    },

    /// Billing-period session cap reached on the reported plan.
    PeriodCapReached {
        plan: PlanId,
        cap: u32,
        booked: u32,
    },
}

impl DenialReason {
    /// Get a user-facing message for the denial reason.
    pub fn user_message(&self) -> String {
        match self {
            DenialReason::SessionUnavailable => {
                "This session has been cancelled and cannot be booked.".to_string()
            }
            DenialReason::RankTooLow { required, actual } => {
                format!(
                    "This class requires {} or above; current rank is {}.",
                    required.display_name(),
                    actual.display_name()
                )
            }
            DenialReason::NotOnCourseRoster { .. } => {
                "Enrollment in this course is required before booking its sessions.".to_string()
            }
            DenialReason::NoActiveSubscription => {
                "An active subscription is required to book sessions.".to_string()
            }
            DenialReason::CourseNotCovered { .. } => {
                "This class is not included in the current subscription plan.".to_string()
            }
            DenialReason::WeeklyCapReached { cap, booked, .. } => {
                format!(
                    "Weekly limit reached: the plan allows {} session(s) per week and {} are already booked this week.",
                    cap, booked
                )
            }
            DenialReason::PeriodCapReached { cap, booked, .. } => {
                format!(
                    "Period limit reached: the plan allows {} session(s) per billing period and {} are already booked.",
                    cap, booked
                )
            }
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Ordered admission rule evaluation.
pub struct AdmissionPolicy;

impl AdmissionPolicy {
    /// Evaluates whether the member may be admitted to the session.
    ///
    /// First failing check wins. Cap checks treat each entitling plan
    /// independently: a single plan passing both its caps admits, and
    /// when every plan fails, the reported reason is the first evaluated
    /// plan's first failing cap.
    pub fn evaluate(ctx: &AdmissionContext) -> AdmissionDecision {
        // 1. Session availability
        if ctx.session.is_cancelled() {
            return AdmissionDecision::Denied(DenialReason::SessionUnavailable);
        }

        // 2. Course eligibility
        if let Some(course) = &ctx.course {
            if let Some(required) = course.min_rank {
                if !ctx.rank.meets(required) {
                    return AdmissionDecision::Denied(DenialReason::RankTooLow {
                        required,
                        actual: ctx.rank,
                    });
                }
            }
            if !course.open_enrollment && !course.is_enrolled(&ctx.member) {
                return AdmissionDecision::Denied(DenialReason::NotOnCourseRoster {
                    course: course.id.clone(),
                });
            }
        }

        // 3. Subscription entitlement
        if ctx.entitlements.is_empty() {
            return AdmissionDecision::Denied(DenialReason::NoActiveSubscription);
        }
        let session_course = ctx.session.course.as_ref();
        let permitting: Vec<&SubscriptionEntitlement> = ctx
            .entitlements
            .iter()
            .filter(|e| e.covers(session_course))
            .collect();
        if permitting.is_empty() {
            return AdmissionDecision::Denied(DenialReason::CourseNotCovered {
                course: ctx.session.course.clone(),
            });
        }

        // 4. Frequency caps, per plan; any one plan passing both admits
        let mut first_failure: Option<DenialReason> = None;
        for plan in &permitting {
            match Self::check_caps(plan, ctx) {
                Ok(()) => {
                    return AdmissionDecision::Allowed {
                        plan: plan.plan.clone(),
                    }
                }
                Err(reason) => {
                    first_failure.get_or_insert(reason);
                }
            }
        }

        // Every permitting plan hit at least one cap
        AdmissionDecision::Denied(
            first_failure.unwrap_or(DenialReason::NoActiveSubscription),
        )
    }

    /// Checks both caps for one plan against the member's other bookings,
    /// scoped to the courses the plan covers.
    fn check_caps(
        plan: &SubscriptionEntitlement,
        ctx: &AdmissionContext,
    ) -> Result<(), DenialReason> {
        if let Some(cap) = plan.weekly_cap.filter(|c| *c > 0) {
            let (week_start, week_end) = Timestamp::week_bounds(ctx.session.start.date());
            let booked = ctx
                .existing_bookings
                .iter()
                .filter(|b| {
                    let date = b.starts_at.date();
                    date >= week_start && date <= week_end && plan.covers(b.course.as_ref())
                })
                .count() as u32;
            if booked >= cap {
                return Err(DenialReason::WeeklyCapReached {
                    plan: plan.plan.clone(),
                    cap,
                    booked,
                });
            }
        }

        if let Some((cap, period_start, next_billing)) = plan.period_cap_window() {
            let booked = ctx
                .existing_bookings
                .iter()
                .filter(|b| {
                    let date = b.starts_at.date();
                    date >= period_start && date < next_billing && plan.covers(b.course.as_ref())
                })
                .count() as u32;
            if booked >= cap {
                return Err(DenialReason::PeriodCapReached {
                    plan: plan.plan.clone(),
                    cap,
                    booked,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, TemplateId};
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

    fn course_id(id: &str) -> CourseId {
        CourseId::new(id).unwrap()
    }

    fn plan_id(id: &str) -> PlanId {
        PlanId::new(id).unwrap()
    }

    /// Open session on Wednesday 2026-03-11, 18:00-19:00.
    fn open_session(course: Option<CourseId>) -> Session {
        let mut session = Session::new(
            SessionId::new(),
            TemplateId::new(),
            ts(11, 18),
            ts(11, 19),
            20,
            ts(1, 0),
        )
        .unwrap();
        session.open(ts(1, 0)).unwrap();
        session.course = course;
        session
    }

    fn unrestricted_plan(id: &str) -> SubscriptionEntitlement {
        SubscriptionEntitlement {
            plan: plan_id(id),
            plan_name: id.to_string(),
            allowed_courses: vec![],
            weekly_cap: None,
            period_cap: None,
            period_start: None,
            next_billing_date: None,
        }
    }

    fn base_ctx() -> AdmissionContext {
        AdmissionContext {
            session: open_session(None),
            member: member("m-1"),
            rank: BeltRank::White,
            course: None,
            entitlements: vec![unrestricted_plan("plan-a")],
            existing_bookings: vec![],
        }
    }

    fn booking(day: u32, course: Option<CourseId>) -> BookingSnapshot {
        BookingSnapshot {
            session: SessionId::new(),
            starts_at: ts(day, 18),
            course,
        }
    }

    // Check 1: session availability

    #[test]
    fn cancelled_session_is_unavailable() {
        let mut ctx = base_ctx();
        ctx.session.cancel(ts(2, 0)).unwrap();
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::SessionUnavailable)
        );
    }

    // Check 2: course eligibility

    #[test]
    fn rank_below_course_minimum_is_denied() {
        let mut ctx = base_ctx();
        ctx.course = Some(Course {
            id: course_id("advanced"),
            name: "Advanced Sparring".to_string(),
            min_rank: Some(BeltRank::Blue),
            open_enrollment: true,
            enrolled_members: vec![],
        });
        ctx.rank = BeltRank::Green;
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::RankTooLow {
                required: BeltRank::Blue,
                actual: BeltRank::Green,
            })
        );
    }

    #[test]
    fn rank_at_minimum_passes() {
        let mut ctx = base_ctx();
        ctx.course = Some(Course {
            id: course_id("advanced"),
            name: "Advanced Sparring".to_string(),
            min_rank: Some(BeltRank::Blue),
            open_enrollment: true,
            enrolled_members: vec![],
        });
        ctx.rank = BeltRank::Blue;
        assert!(AdmissionPolicy::evaluate(&ctx).is_allowed());
    }

    #[test]
    fn closed_enrollment_requires_roster_membership() {
        let mut ctx = base_ctx();
        ctx.course = Some(Course {
            id: course_id("comp-team"),
            name: "Competition Team".to_string(),
            min_rank: None,
            open_enrollment: false,
            enrolled_members: vec![member("m-2")],
        });
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::NotOnCourseRoster {
                course: course_id("comp-team"),
            })
        );
    }

    #[test]
    fn closed_enrollment_admits_roster_member() {
        let mut ctx = base_ctx();
        ctx.course = Some(Course {
            id: course_id("comp-team"),
            name: "Competition Team".to_string(),
            min_rank: None,
            open_enrollment: false,
            enrolled_members: vec![member("m-1")],
        });
        assert!(AdmissionPolicy::evaluate(&ctx).is_allowed());
    }

    // Check 3: subscription entitlement

    #[test]
    fn no_subscription_is_denied() {
        let mut ctx = base_ctx();
        ctx.entitlements.clear();
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::NoActiveSubscription)
        );
    }

    #[test]
    fn restricted_plan_not_covering_course_is_denied() {
        let mut ctx = base_ctx();
        ctx.session = open_session(Some(course_id("karate")));
        let mut plan = unrestricted_plan("plan-bjj");
        plan.allowed_courses = vec![course_id("bjj")];
        ctx.entitlements = vec![plan];
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::CourseNotCovered {
                course: Some(course_id("karate")),
            })
        );
    }

    #[test]
    fn allowed_reports_the_satisfying_plan() {
        let ctx = base_ctx();
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Allowed {
                plan: plan_id("plan-a"),
            }
        );
    }

    // Check 4: frequency caps

    #[test]
    fn weekly_cap_counts_same_week_bookings() {
        let mut ctx = base_ctx();
        let mut plan = unrestricted_plan("plan-1wk");
        plan.weekly_cap = Some(1);
        ctx.entitlements = vec![plan];
        // Candidate is Wed 2026-03-11; Mon 2026-03-09 is the same week.
        ctx.existing_bookings = vec![booking(9, None)];
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::WeeklyCapReached {
                plan: plan_id("plan-1wk"),
                cap: 1,
                booked: 1,
            })
        );
    }

    #[test]
    fn weekly_cap_ignores_other_weeks() {
        let mut ctx = base_ctx();
        let mut plan = unrestricted_plan("plan-1wk");
        plan.weekly_cap = Some(1);
        ctx.entitlements = vec![plan];
        // Mon 2026-03-16 is the following week.
        ctx.existing_bookings = vec![booking(16, None)];
        assert!(AdmissionPolicy::evaluate(&ctx).is_allowed());
    }

    #[test]
    fn weekly_cap_scopes_to_plan_courses() {
        let mut ctx = base_ctx();
        ctx.session = open_session(Some(course_id("bjj")));
        let mut plan = unrestricted_plan("plan-bjj");
        plan.allowed_courses = vec![course_id("bjj")];
        plan.weekly_cap = Some(1);
        ctx.entitlements = vec![plan];
        // Same week, but a karate booking does not count against a
        // bjj-restricted plan.
        ctx.existing_bookings = vec![booking(9, Some(course_id("karate")))];
        assert!(AdmissionPolicy::evaluate(&ctx).is_allowed());
    }

    #[test]
    fn period_cap_counts_bookings_inside_billing_window() {
        let mut ctx = base_ctx();
        let mut plan = unrestricted_plan("plan-8mo");
        plan.period_cap = Some(2);
        plan.period_start = NaiveDate::from_ymd_opt(2026, 3, 1);
        plan.next_billing_date = NaiveDate::from_ymd_opt(2026, 4, 1);
        ctx.entitlements = vec![plan];
        ctx.existing_bookings = vec![booking(2, None), booking(20, None)];
        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::PeriodCapReached {
                plan: plan_id("plan-8mo"),
                cap: 2,
                booked: 2,
            })
        );
    }

    #[test]
    fn period_cap_excludes_next_billing_date() {
        let mut ctx = base_ctx();
        let mut plan = unrestricted_plan("plan-8mo");
        plan.period_cap = Some(1);
        plan.period_start = NaiveDate::from_ymd_opt(2026, 3, 1);
        plan.next_billing_date = NaiveDate::from_ymd_opt(2026, 3, 20);
        ctx.entitlements = vec![plan];
        // Booking on the next billing date itself is outside the window.
        ctx.existing_bookings = vec![booking(20, None)];
        assert!(AdmissionPolicy::evaluate(&ctx).is_allowed());
    }

    #[test]
    fn any_one_plan_passing_both_caps_admits() {
        let mut ctx = base_ctx();
        let mut capped = unrestricted_plan("plan-capped");
        capped.weekly_cap = Some(1);
        let open = unrestricted_plan("plan-open");
        ctx.entitlements = vec![capped, open];
        ctx.existing_bookings = vec![booking(9, None)];

        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Allowed {
                plan: plan_id("plan-open"),
            }
        );
    }

    #[test]
    fn all_plans_failing_reports_first_plans_cap() {
        let mut ctx = base_ctx();
        let mut first = unrestricted_plan("plan-first");
        first.weekly_cap = Some(1);
        let mut second = unrestricted_plan("plan-second");
        second.weekly_cap = Some(1);
        ctx.entitlements = vec![first, second];
        ctx.existing_bookings = vec![booking(9, None)];

        assert_eq!(
            AdmissionPolicy::evaluate(&ctx),
            AdmissionDecision::Denied(DenialReason::WeeklyCapReached {
                plan: plan_id("plan-first"),
                cap: 1,
                booked: 1,
            })
        );
    }

    #[test]
    fn denial_reason_serializes_with_type_tag() {
        let reason = DenialReason::WeeklyCapReached {
            plan: plan_id("plan-1wk"),
            cap: 1,
            booked: 1,
        };
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("\"type\":\"weekly_cap_reached\""));
        assert!(json.contains("\"cap\":1"));
    }

    #[test]
    fn into_result_splits_decision() {
        let allowed = AdmissionDecision::Allowed {
            plan: plan_id("p"),
        };
        assert!(allowed.into_result().is_ok());

        let denied = AdmissionDecision::Denied(DenialReason::NoActiveSubscription);
        assert_eq!(
            denied.into_result().unwrap_err(),
            DenialReason::NoActiveSubscription
        );
    }
}
