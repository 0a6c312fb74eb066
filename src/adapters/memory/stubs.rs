//! Static stub implementations of the collaborator ports.
//!
//! The real implementations live in the surrounding membership, billing
//! and messaging systems; these stubs serve tests, demos and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::admission::{BeltRank, Course, SubscriptionEntitlement};
use crate::domain::foundation::{CourseId, DomainError, ErrorCode, MemberId, SessionId};
use crate::ports::{
    AbsenceNotifier, AttendanceCounter, CourseCatalog, EntitlementProvider, MemberDirectory,
};

/// Member directory backed by a fixed rank table.
#[derive(Default)]
pub struct StaticMemberDirectory {
    ranks: HashMap<MemberId, BeltRank>,
}

impl StaticMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a member with the given rank.
    pub fn insert(&mut self, member: MemberId, rank: BeltRank) {
        self.ranks.insert(member, rank);
    }
}

#[async_trait]
impl MemberDirectory for StaticMemberDirectory {
    async fn rank_of(&self, member: &MemberId) -> Result<Option<BeltRank>, DomainError> {
        Ok(self.ranks.get(member).copied())
    }
}

/// Entitlement provider backed by a fixed per-member table.
#[derive(Default)]
pub struct StaticEntitlementProvider {
    entitlements: HashMap<MemberId, Vec<SubscriptionEntitlement>>,
}

impl StaticEntitlementProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the member's active entitlements.
    pub fn insert(&mut self, member: MemberId, entitlements: Vec<SubscriptionEntitlement>) {
        self.entitlements.insert(member, entitlements);
    }
}

#[async_trait]
impl EntitlementProvider for StaticEntitlementProvider {
    async fn active_entitlements(
        &self,
        member: &MemberId,
    ) -> Result<Vec<SubscriptionEntitlement>, DomainError> {
        Ok(self.entitlements.get(member).cloned().unwrap_or_default())
    }
}

/// Course catalog backed by a fixed course table.
#[derive(Default)]
pub struct StaticCourseCatalog {
    courses: HashMap<CourseId, Course>,
}

impl StaticCourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a course.
    pub fn insert(&mut self, course: Course) {
        self.courses.insert(course.id.clone(), course);
    }
}

#[async_trait]
impl CourseCatalog for StaticCourseCatalog {
    async fn course(&self, id: &CourseId) -> Result<Option<Course>, DomainError> {
        Ok(self.courses.get(id).cloned())
    }
}

/// Absence notifier that records calls for assertions.
pub struct RecordingAbsenceNotifier {
    notifications: Mutex<Vec<(MemberId, SessionId)>>,
    fail: bool,
}

impl RecordingAbsenceNotifier {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A notifier whose every call fails, for error-path tests.
    pub fn failing() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns all recorded notifications.
    pub fn notifications(&self) -> Vec<(MemberId, SessionId)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Default for RecordingAbsenceNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AbsenceNotifier for RecordingAbsenceNotifier {
    async fn notify_absence(
        &self,
        member: &MemberId,
        session: &SessionId,
    ) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Simulated notification failure",
            ));
        }
        self.notifications
            .lock()
            .unwrap()
            .push((member.clone(), *session));
        Ok(())
    }
}

/// Attendance counter keeping per-member totals in memory.
#[derive(Default)]
pub struct InMemoryAttendanceCounter {
    counts: Mutex<HashMap<MemberId, i64>>,
}

impl InMemoryAttendanceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter value for a member.
    pub fn count(&self, member: &MemberId) -> i64 {
        self.counts.lock().unwrap().get(member).copied().unwrap_or(0)
    }
}

#[async_trait]
impl AttendanceCounter for InMemoryAttendanceCounter {
    async fn increment(&self, member: &MemberId, delta: i64) -> Result<(), DomainError> {
        let mut counts = self.counts.lock().unwrap();
        *counts.entry(member.clone()).or_insert(0) += delta;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    #[tokio::test]
    async fn directory_returns_none_for_unknown_member() {
        let mut directory = StaticMemberDirectory::new();
        directory.insert(member("m-1"), BeltRank::Blue);

        assert_eq!(
            directory.rank_of(&member("m-1")).await.unwrap(),
            Some(BeltRank::Blue)
        );
        assert_eq!(directory.rank_of(&member("ghost")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn provider_defaults_to_no_entitlements() {
        let provider = StaticEntitlementProvider::new();
        assert!(provider
            .active_entitlements(&member("m-1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn counter_accumulates_deltas() {
        let counter = InMemoryAttendanceCounter::new();
        counter.increment(&member("m-1"), 1).await.unwrap();
        counter.increment(&member("m-1"), 1).await.unwrap();
        counter.increment(&member("m-1"), -1).await.unwrap();
        assert_eq!(counter.count(&member("m-1")), 1);
        assert_eq!(counter.count(&member("other")), 0);
    }

    #[tokio::test]
    async fn failing_notifier_errors_without_recording() {
        let notifier = RecordingAbsenceNotifier::failing();
        let result = notifier
            .notify_absence(&member("m-1"), &SessionId::new())
            .await;
        assert!(result.is_err());
        assert!(notifier.notifications().is_empty());
    }
}
