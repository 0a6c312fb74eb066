//! Class template repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TemplateId};
use crate::domain::scheduling::ClassTemplate;

/// Repository port for ClassTemplate persistence.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Save a new template.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, template: &ClassTemplate) -> Result<(), DomainError>;

    /// Update an existing template.
    ///
    /// # Errors
    ///
    /// - `TemplateNotFound` if the template doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, template: &ClassTemplate) -> Result<(), DomainError>;

    /// Find a template by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<ClassTemplate>, DomainError>;

    /// List every active template with a recurrence, i.e. the generator's
    /// work list.
    async fn list_generatable(&self) -> Result<Vec<ClassTemplate>, DomainError>;
}
