//! Attendance counter sink.
//!
//! The member record keeps a denormalised count of attended classes.
//! Every increment and decrement here is tied 1:1 to an attendance fact
//! being created or removed, so the counter can always be recomputed
//! from the fact table as a consistency check.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MemberId};

/// Port updating the member's cumulative attendance counter.
#[async_trait]
pub trait AttendanceCounter: Send + Sync {
    /// Adjust the member's counter by `delta` (+1 on check-in, -1 on
    /// administrative attendance removal).
    async fn increment(&self, member: &MemberId, delta: i64) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_counter_is_object_safe() {
        fn _accepts_dyn(_counter: &dyn AttendanceCounter) {}
    }
}
