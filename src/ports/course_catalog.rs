//! Course catalog port.

use async_trait::async_trait;

use crate::domain::admission::Course;
use crate::domain::foundation::{CourseId, DomainError};

/// Port for reading course metadata (rank requirements, enrollment mode,
/// explicit roster).
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    /// Find a course by its ID. Returns `None` if the catalog doesn't
    /// know it.
    async fn course(&self, id: &CourseId) -> Result<Option<Course>, DomainError>;
}
