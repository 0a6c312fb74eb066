//! Entitlement lookup port.
//!
//! Subscriptions and billing live outside this core; all the admission
//! policy needs is the member's active entitlements with their course
//! allow-lists and cap windows.

use async_trait::async_trait;

use crate::domain::admission::SubscriptionEntitlement;
use crate::domain::foundation::{DomainError, MemberId};

/// Port for reading a member's active subscription entitlements.
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    /// Returns every active entitlement for the member. An empty vec
    /// means the member has no active subscription.
    async fn active_entitlements(
        &self,
        member: &MemberId,
    ) -> Result<Vec<SubscriptionEntitlement>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entitlement_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn EntitlementProvider) {}
    }
}
