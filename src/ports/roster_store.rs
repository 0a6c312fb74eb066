//! Roster store port - the serialization point for bookings.
//!
//! The admission policy's checks are advisory pre-checks; the operations
//! on this port make the authoritative decisions. Implementations must
//! guarantee, per session:
//!
//! - "count booked seats, then insert" is atomic with respect to other
//!   bookings (no in-memory pre-validation counts);
//! - at most one non-cancelled entry per (session, member), enforced by
//!   a storage-level uniqueness constraint;
//! - at most one attendance fact per (session, member), same mechanism;
//! - a cancellation and the waitlist promotion it triggers are observably
//!   atomic to readers.
//!
//! All operations are short single-record transactions; nothing blocks
//! indefinitely or holds a lock across a network call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::admission::BookingSnapshot;
use crate::domain::foundation::{MemberId, RosterEntryId, SessionId, Timestamp};
use crate::domain::roster::{AttendanceFact, BookingSource, RosterEntry, RosterError};

/// Result of a cancellation, including the promotion it may have caused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationOutcome {
    /// The entry that was cancelled.
    pub cancelled: RosterEntry,

    /// The waitlisted entry promoted into the freed seat, if any.
    /// At most one entry is promoted per cancellation.
    pub promoted: Option<RosterEntry>,
}

/// Store port owning booking/waitlist/attendance state.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Book a member onto a session.
    ///
    /// Inside one transaction: verify the session is not cancelled, count
    /// current `Booked` entries, and insert the new entry as `Booked` when
    /// under capacity or `Waitlisted` otherwise.
    ///
    /// # Errors
    ///
    /// - `AlreadyBooked` if a non-cancelled entry exists for the pair
    /// - `SessionNotFound` / `AdmissionDenied(SessionUnavailable)` as applicable
    /// - `Infrastructure` on persistence failure
    async fn book(
        &self,
        session: &SessionId,
        member: &MemberId,
        source: BookingSource,
        booked_at: Timestamp,
    ) -> Result<RosterEntry, RosterError>;

    /// Insert a walk-in entry directly in `Attended`.
    ///
    /// Bypasses capacity and the waitlist; still subject to the
    /// (session, member) uniqueness constraint.
    ///
    /// # Errors
    ///
    /// - `AlreadyBooked` if a non-cancelled entry exists for the pair
    async fn insert_walk_in(&self, entry: &RosterEntry) -> Result<(), RosterError>;

    /// Cancel an entry and promote the earliest-created `Waitlisted`
    /// entry of the same session (FIFO by `booked_at`), provided a
    /// vacancy exists after the cancellation. Both writes happen in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound` if the entry doesn't exist
    /// - `InvalidState` if the entry is already terminal
    async fn cancel_and_promote(
        &self,
        entry: &RosterEntryId,
    ) -> Result<CancellationOutcome, RosterError>;

    /// Persist a state change made on an already-loaded entry.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound` if the entry doesn't exist
    async fn update_entry(&self, entry: &RosterEntry) -> Result<(), RosterError>;

    /// Find an entry by its ID. Returns `None` if not found.
    async fn find_entry(&self, id: &RosterEntryId) -> Result<Option<RosterEntry>, RosterError>;

    /// Find the member's non-cancelled entry for a session, if any.
    async fn find_active_entry(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<RosterEntry>, RosterError>;

    /// Count of `Booked` entries for a session.
    async fn booked_count(&self, session: &SessionId) -> Result<u32, RosterError>;

    /// Snapshots of the member's `Booked` entries on *other* sessions,
    /// as cap-counting input for the admission policy.
    async fn booked_snapshots_for_member(
        &self,
        member: &MemberId,
        exclude_session: &SessionId,
    ) -> Result<Vec<BookingSnapshot>, RosterError>;

    /// Record an attendance fact exactly once.
    ///
    /// Returns `true` when the fact was created, `false` when one already
    /// existed for the (session, member) pair; concurrent check-ins must
    /// converge through this uniqueness guard, and only a `true` return
    /// may increment the attendance counter.
    async fn record_attendance(&self, fact: &AttendanceFact) -> Result<bool, RosterError>;

    /// Find the attendance fact for a (session, member) pair.
    async fn find_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<AttendanceFact>, RosterError>;

    /// Remove an attendance fact (administrative correction only).
    ///
    /// # Errors
    ///
    /// - `AttendanceNotFound` if no fact exists for the pair
    async fn remove_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<AttendanceFact, RosterError>;
}
