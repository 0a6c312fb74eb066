//! PostgreSQL adapters backed by sqlx.

mod roster_store;
mod session_repository;
mod template_repository;

pub use roster_store::PostgresRosterStore;
pub use session_repository::PostgresSessionRepository;
pub use template_repository::PostgresTemplateRepository;
