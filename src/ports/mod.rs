//! Ports layer - contracts between the application core and the outside.
//!
//! Repository ports are implemented by the adapters in this crate;
//! collaborator ports (entitlements, ranks, courses, notifications,
//! counters) are implemented by the surrounding systems.

mod absence_notifier;
mod attendance_counter;
mod course_catalog;
mod entitlement_provider;
mod member_directory;
mod roster_store;
mod session_repository;
mod template_repository;

pub use absence_notifier::AbsenceNotifier;
pub use attendance_counter::AttendanceCounter;
pub use course_catalog::CourseCatalog;
pub use entitlement_provider::EntitlementProvider;
pub use member_directory::MemberDirectory;
pub use roster_store::{CancellationOutcome, RosterStore};
pub use session_repository::SessionRepository;
pub use template_repository::TemplateRepository;
