//! Session repository port.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, SessionId, TemplateId, Timestamp};
use crate::domain::scheduling::Session;

/// Repository port for Session persistence.
///
/// Implementations must ensure `generated_dates` reflects committed
/// sessions only, since the generator's duplicate detection depends on it.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    /// Update an existing session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &Session) -> Result<(), DomainError>;

    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Calendar dates in `[from, to]` for which a generated session of
    /// this template already exists. Keyed by occurrence date, not exact
    /// timestamp, since time-of-day is fixed per template.
    async fn generated_dates(
        &self,
        template: &TemplateId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DomainError>;

    /// Sessions starting inside `[from, to]`, ordered by start time.
    /// Day views (kiosk welcome screen, staff panel) read from this and
    /// filter by status themselves.
    async fn find_in_window(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Session>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SessionRepository) {}
    }
}
