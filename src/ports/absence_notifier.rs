//! Absence notification hook.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MemberId, SessionId};

/// Port fired when a member is marked a no-show. The delivery channel
/// (guardian email, SMS, push) is a collaborator concern.
#[async_trait]
pub trait AbsenceNotifier: Send + Sync {
    /// Notify the member's contacts about the missed session.
    async fn notify_absence(
        &self,
        member: &MemberId,
        session: &SessionId,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absence_notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn AbsenceNotifier) {}
    }
}
