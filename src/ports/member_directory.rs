//! Member directory port.

use async_trait::async_trait;

use crate::domain::admission::BeltRank;
use crate::domain::foundation::{DomainError, MemberId};

/// Port for reading member facts owned by the external membership system.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// The member's current belt rank.
    ///
    /// Returns `None` when the member is unknown to the directory;
    /// callers treat that as member-not-found.
    async fn rank_of(&self, member: &MemberId) -> Result<Option<BeltRank>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_directory_is_object_safe() {
        fn _accepts_dyn(_directory: &dyn MemberDirectory) {}
    }
}
