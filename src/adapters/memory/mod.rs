//! In-memory adapters for tests, demos and local runs.

mod store;
mod stubs;

pub use store::InMemoryStore;
pub use stubs::{
    InMemoryAttendanceCounter, RecordingAbsenceNotifier, StaticCourseCatalog,
    StaticEntitlementProvider, StaticMemberDirectory,
};
