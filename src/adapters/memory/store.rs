//! In-memory store implementing the repository and roster ports.
//!
//! A single mutex serializes every operation, which gives the same
//! observable atomicity the Postgres adapter gets from transactions:
//! "count seats, then insert" never interleaves, and a cancellation plus
//! its promotion is one critical section.
//!
//! # Security Note
//!
//! This adapter is for **testing and demos only**. It uses `.unwrap()`
//! on lock operations which will panic if locks are poisoned. Production
//! deployments use the Postgres adapters.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::admission::{BookingSnapshot, DenialReason};
use crate::domain::foundation::{
    DomainError, ErrorCode, MemberId, RosterEntryId, SessionId, TemplateId, Timestamp,
};
use crate::domain::roster::{
    AttendanceFact, BookingSource, RosterEntry, RosterError, RosterStatus,
};
use crate::domain::scheduling::{ClassTemplate, Session};
use crate::ports::{
    CancellationOutcome, RosterStore, SessionRepository, TemplateRepository,
};

#[derive(Default)]
struct State {
    templates: HashMap<TemplateId, ClassTemplate>,
    sessions: HashMap<SessionId, Session>,
    entries: Vec<RosterEntry>,
    facts: Vec<AttendanceFact>,
    failing_session_templates: HashSet<TemplateId>,
}

impl State {
    fn booked_count(&self, session: &SessionId) -> u32 {
        self.entries
            .iter()
            .filter(|e| &e.session == session && e.status == RosterStatus::Booked)
            .count() as u32
    }

    fn active_entry(&self, session: &SessionId, member: &MemberId) -> Option<&RosterEntry> {
        self.entries
            .iter()
            .find(|e| &e.session == session && &e.member == member && e.status != RosterStatus::Cancelled)
    }

    fn has_vacancy(&self, session: &Session) -> bool {
        // Capacity zero means unlimited seats.
        session.capacity == 0 || self.booked_count(&session.id) < session.capacity
    }
}

/// In-memory implementation of the template, session and roster ports.
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    // === Seeding / inspection helpers (for tests and demos) ===

    /// Inserts or replaces a template.
    pub fn seed_template(&self, template: ClassTemplate) {
        self.state
            .lock()
            .unwrap()
            .templates
            .insert(template.id, template);
    }

    /// Inserts or replaces a session.
    pub fn seed_session(&self, session: Session) {
        self.state
            .lock()
            .unwrap()
            .sessions
            .insert(session.id, session);
    }

    /// Returns a session by id.
    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.state.lock().unwrap().sessions.get(id).cloned()
    }

    /// Returns every session spawned from the given template.
    pub fn sessions_for_template(&self, template: &TemplateId) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .state
            .lock()
            .unwrap()
            .sessions
            .values()
            .filter(|s| &s.template_id == template)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.start);
        sessions
    }

    /// Returns every roster entry of a session, in booking order.
    pub fn entries_for_session(&self, session: &SessionId) -> Vec<RosterEntry> {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| &e.session == session)
            .cloned()
            .collect()
    }

    /// Makes every future session save for the given template fail, to
    /// exercise per-template failure isolation.
    pub fn fail_session_saves_for(&self, template: TemplateId) {
        self.state
            .lock()
            .unwrap()
            .failing_session_templates
            .insert(template);
    }

    // === Roster operations (delegated to by the trait impl) ===

    /// See [`RosterStore::book`].
    pub async fn book(
        &self,
        session_id: &SessionId,
        member: &MemberId,
        source: BookingSource,
        booked_at: Timestamp,
    ) -> Result<RosterEntry, RosterError> {
        let mut state = self.state.lock().unwrap();

        let session = state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(RosterError::SessionNotFound(*session_id))?;
        if session.is_cancelled() {
            return Err(RosterError::admission_denied(DenialReason::SessionUnavailable));
        }
        if state.active_entry(session_id, member).is_some() {
            return Err(RosterError::already_booked(*session_id, member.clone()));
        }

        let entry = if state.has_vacancy(&session) {
            RosterEntry::booked(RosterEntryId::new(), *session_id, member.clone(), source, booked_at)
        } else {
            RosterEntry::waitlisted(RosterEntryId::new(), *session_id, member.clone(), source, booked_at)
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    /// See [`RosterStore::insert_walk_in`].
    pub async fn insert_walk_in(&self, entry: &RosterEntry) -> Result<(), RosterError> {
        let mut state = self.state.lock().unwrap();
        if state.active_entry(&entry.session, &entry.member).is_some() {
            return Err(RosterError::already_booked(entry.session, entry.member.clone()));
        }
        state.entries.push(entry.clone());
        Ok(())
    }

    /// See [`RosterStore::cancel_and_promote`].
    pub async fn cancel_and_promote(
        &self,
        entry_id: &RosterEntryId,
    ) -> Result<CancellationOutcome, RosterError> {
        let mut state = self.state.lock().unwrap();

        let position = state
            .entries
            .iter()
            .position(|e| &e.id == entry_id)
            .ok_or(RosterError::EntryNotFound(*entry_id))?;
        let mut cancelled = state.entries[position].clone();
        cancelled
            .cancel()
            .map_err(|_| RosterError::invalid_state(format!("{:?}", cancelled.status), "cancel"))?;
        state.entries[position] = cancelled.clone();

        // Promote the earliest waitlisted entry iff a seat is free now.
        let mut promoted = None;
        if let Some(session) = state.sessions.get(&cancelled.session).cloned() {
            if state.has_vacancy(&session) {
                let candidate = state
                    .entries
                    .iter()
                    .filter(|e| e.session == cancelled.session && e.status == RosterStatus::Waitlisted)
                    .min_by_key(|e| e.booked_at)
                    .map(|e| e.id);
                if let Some(id) = candidate {
                    let index = state
                        .entries
                        .iter()
                        .position(|e| e.id == id)
                        .ok_or_else(|| RosterError::infrastructure("waitlist entry vanished"))?;
                    let mut entry = state.entries[index].clone();
                    entry
                        .promote()
                        .map_err(|e| RosterError::infrastructure(e.to_string()))?;
                    state.entries[index] = entry.clone();
                    promoted = Some(entry);
                }
            }
        }

        Ok(CancellationOutcome { cancelled, promoted })
    }

    /// See [`RosterStore::update_entry`].
    pub async fn update_entry(&self, entry: &RosterEntry) -> Result<(), RosterError> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .entries
            .iter()
            .position(|e| e.id == entry.id)
            .ok_or(RosterError::EntryNotFound(entry.id))?;
        state.entries[position] = entry.clone();
        Ok(())
    }

    /// See [`RosterStore::find_entry`].
    pub async fn find_entry(&self, id: &RosterEntryId) -> Result<Option<RosterEntry>, RosterError> {
        let state = self.state.lock().unwrap();
        Ok(state.entries.iter().find(|e| &e.id == id).cloned())
    }

    /// See [`RosterStore::find_active_entry`].
    pub async fn find_active_entry(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<RosterEntry>, RosterError> {
        let state = self.state.lock().unwrap();
        Ok(state.active_entry(session, member).cloned())
    }

    /// See [`RosterStore::booked_count`].
    pub async fn booked_count(&self, session: &SessionId) -> Result<u32, RosterError> {
        let state = self.state.lock().unwrap();
        Ok(state.booked_count(session))
    }

    /// See [`RosterStore::booked_snapshots_for_member`].
    pub async fn booked_snapshots_for_member(
        &self,
        member: &MemberId,
        exclude_session: &SessionId,
    ) -> Result<Vec<BookingSnapshot>, RosterError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .iter()
            .filter(|e| {
                &e.member == member
                    && &e.session != exclude_session
                    && e.status == RosterStatus::Booked
            })
            .filter_map(|e| {
                state.sessions.get(&e.session).map(|s| BookingSnapshot {
                    session: s.id,
                    starts_at: s.start,
                    course: s.course.clone(),
                })
            })
            .collect())
    }

    /// See [`RosterStore::record_attendance`].
    pub async fn record_attendance(&self, fact: &AttendanceFact) -> Result<bool, RosterError> {
        let mut state = self.state.lock().unwrap();
        let exists = state
            .facts
            .iter()
            .any(|f| f.session == fact.session && f.member == fact.member);
        if exists {
            return Ok(false);
        }
        state.facts.push(fact.clone());
        Ok(true)
    }

    /// See [`RosterStore::find_attendance`].
    pub async fn find_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<AttendanceFact>, RosterError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .facts
            .iter()
            .find(|f| &f.session == session && &f.member == member)
            .cloned())
    }

    /// See [`RosterStore::remove_attendance`].
    pub async fn remove_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<AttendanceFact, RosterError> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .facts
            .iter()
            .position(|f| &f.session == session && &f.member == member)
            .ok_or_else(|| RosterError::attendance_not_found(*session, member.clone()))?;
        Ok(state.facts.remove(position))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryStore {
    async fn save(&self, template: &ClassTemplate) -> Result<(), DomainError> {
        self.seed_template(template.clone());
        Ok(())
    }

    async fn update(&self, template: &ClassTemplate) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if !state.templates.contains_key(&template.id) {
            return Err(DomainError::new(
                ErrorCode::TemplateNotFound,
                format!("Template not found: {}", template.id),
            ));
        }
        state.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<ClassTemplate>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.templates.get(id).cloned())
    }

    async fn list_generatable(&self) -> Result<Vec<ClassTemplate>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut templates: Vec<ClassTemplate> = state
            .templates
            .values()
            .filter(|t| t.is_generatable())
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.created_at);
        Ok(templates)
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_session_templates.contains(&session.template_id) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated session save failure",
            ));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if !state.sessions.contains_key(&session.id) {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id),
            ));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.session(id))
    }

    async fn generated_dates(
        &self,
        template: &TemplateId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut dates: Vec<NaiveDate> = state
            .sessions
            .values()
            .filter(|s| &s.template_id == template)
            .filter_map(|s| s.occurrence_date)
            .filter(|d| *d >= from && *d <= to)
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    async fn find_in_window(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Session>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| s.start >= from && s.start <= to)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.start);
        Ok(sessions)
    }
}

#[async_trait]
impl RosterStore for InMemoryStore {
    async fn book(
        &self,
        session: &SessionId,
        member: &MemberId,
        source: BookingSource,
        booked_at: Timestamp,
    ) -> Result<RosterEntry, RosterError> {
        InMemoryStore::book(self, session, member, source, booked_at).await
    }

    async fn insert_walk_in(&self, entry: &RosterEntry) -> Result<(), RosterError> {
        InMemoryStore::insert_walk_in(self, entry).await
    }

    async fn cancel_and_promote(
        &self,
        entry: &RosterEntryId,
    ) -> Result<CancellationOutcome, RosterError> {
        InMemoryStore::cancel_and_promote(self, entry).await
    }

    async fn update_entry(&self, entry: &RosterEntry) -> Result<(), RosterError> {
        InMemoryStore::update_entry(self, entry).await
    }

    async fn find_entry(&self, id: &RosterEntryId) -> Result<Option<RosterEntry>, RosterError> {
        InMemoryStore::find_entry(self, id).await
    }

    async fn find_active_entry(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<RosterEntry>, RosterError> {
        InMemoryStore::find_active_entry(self, session, member).await
    }

    async fn booked_count(&self, session: &SessionId) -> Result<u32, RosterError> {
        InMemoryStore::booked_count(self, session).await
    }

    async fn booked_snapshots_for_member(
        &self,
        member: &MemberId,
        exclude_session: &SessionId,
    ) -> Result<Vec<BookingSnapshot>, RosterError> {
        InMemoryStore::booked_snapshots_for_member(self, member, exclude_session).await
    }

    async fn record_attendance(&self, fact: &AttendanceFact) -> Result<bool, RosterError> {
        InMemoryStore::record_attendance(self, fact).await
    }

    async fn find_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<AttendanceFact>, RosterError> {
        InMemoryStore::find_attendance(self, session, member).await
    }

    async fn remove_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<AttendanceFact, RosterError> {
        InMemoryStore::remove_attendance(self, session, member).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use chrono::{NaiveDate, NaiveTime};

    fn ts(day: u32, hour: u32) -> Timestamp {
        Timestamp::from_date_time(
            NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        )
    }

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    fn open_session(capacity: u32) -> Session {
        let mut session = Session::new(
            SessionId::new(),
            TemplateId::new(),
            ts(11, 18),
            ts(11, 19),
            capacity,
            ts(1, 0),
        )
        .unwrap();
        session.open(ts(1, 0)).unwrap();
        session
    }

    #[tokio::test]
    async fn booked_count_never_exceeds_capacity() {
        let store = InMemoryStore::new();
        let session = open_session(2);
        let id = session.id;
        store.seed_session(session);

        for i in 0..6 {
            store
                .book(&id, &member(&format!("m-{}", i)), BookingSource::SelfService, ts(2, 9 + i))
                .await
                .unwrap();
        }
        assert_eq!(store.booked_count(&id).await.unwrap(), 2);
        assert_eq!(store.entries_for_session(&id).len(), 6);
    }

    #[tokio::test]
    async fn duplicate_booking_is_rejected_by_uniqueness() {
        let store = InMemoryStore::new();
        let session = open_session(5);
        let id = session.id;
        store.seed_session(session);

        store
            .book(&id, &member("m-1"), BookingSource::SelfService, ts(2, 9))
            .await
            .unwrap();
        let second = store
            .book(&id, &member("m-1"), BookingSource::Staff, ts(2, 10))
            .await;
        assert!(matches!(second, Err(RosterError::AlreadyBooked { .. })));
    }

    #[tokio::test]
    async fn cancelled_entry_frees_the_pair_for_rebooking() {
        let store = InMemoryStore::new();
        let session = open_session(5);
        let id = session.id;
        store.seed_session(session);

        let entry = store
            .book(&id, &member("m-1"), BookingSource::SelfService, ts(2, 9))
            .await
            .unwrap();
        store.cancel_and_promote(&entry.id).await.unwrap();

        // History is preserved, but the pair may book again.
        let again = store
            .book(&id, &member("m-1"), BookingSource::SelfService, ts(2, 11))
            .await
            .unwrap();
        assert_eq!(again.status, RosterStatus::Booked);
        assert_eq!(store.entries_for_session(&id).len(), 2);
    }

    #[tokio::test]
    async fn booking_cancelled_session_is_denied() {
        let store = InMemoryStore::new();
        let mut session = open_session(5);
        session.cancel(ts(2, 0)).unwrap();
        let id = session.id;
        store.seed_session(session);

        let result = store
            .book(&id, &member("m-1"), BookingSource::SelfService, ts(2, 9))
            .await;
        assert_eq!(
            result.unwrap_err(),
            RosterError::AdmissionDenied(DenialReason::SessionUnavailable)
        );
    }

    #[tokio::test]
    async fn zero_capacity_means_unlimited_seats() {
        let store = InMemoryStore::new();
        let session = open_session(0);
        let id = session.id;
        store.seed_session(session);

        for i in 0..30 {
            let entry = store
                .book(&id, &member(&format!("m-{}", i)), BookingSource::SelfService, ts(2, 9))
                .await
                .unwrap();
            assert_eq!(entry.status, RosterStatus::Booked);
        }
    }

    #[tokio::test]
    async fn promotion_is_fifo_by_booked_at() {
        let store = InMemoryStore::new();
        let session = open_session(1);
        let id = session.id;
        store.seed_session(session);

        let seat = store
            .book(&id, &member("seat"), BookingSource::SelfService, ts(2, 9))
            .await
            .unwrap();
        store
            .book(&id, &member("a"), BookingSource::SelfService, ts(2, 10))
            .await
            .unwrap();
        store
            .book(&id, &member("b"), BookingSource::SelfService, ts(2, 11))
            .await
            .unwrap();

        let outcome = store.cancel_and_promote(&seat.id).await.unwrap();
        assert_eq!(outcome.promoted.unwrap().member, member("a"));
    }

    #[tokio::test]
    async fn attendance_facts_are_unique_per_pair() {
        let store = InMemoryStore::new();
        let session = SessionId::new();

        let fact = AttendanceFact::record(
            crate::domain::foundation::AttendanceId::new(),
            session,
            member("m-1"),
            BookingSource::Kiosk,
            ts(11, 18),
        );
        assert!(store.record_attendance(&fact).await.unwrap());

        let duplicate = AttendanceFact::record(
            crate::domain::foundation::AttendanceId::new(),
            session,
            member("m-1"),
            BookingSource::Staff,
            ts(11, 19),
        );
        assert!(!store.record_attendance(&duplicate).await.unwrap());
    }

    #[tokio::test]
    async fn find_in_window_returns_sessions_ordered_by_start() {
        let store = InMemoryStore::new();
        let mut evening = open_session(10);
        evening.start = ts(11, 18);
        evening.end = ts(11, 19);
        let mut morning = open_session(10);
        morning.start = ts(11, 9);
        morning.end = ts(11, 10);
        let mut next_day = open_session(10);
        next_day.start = ts(12, 9);
        next_day.end = ts(12, 10);
        store.seed_session(evening.clone());
        store.seed_session(morning.clone());
        store.seed_session(next_day);

        let day = SessionRepository::find_in_window(&store, ts(11, 0), ts(11, 23))
            .await
            .unwrap();
        assert_eq!(
            day.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![morning.id, evening.id]
        );
    }

    #[tokio::test]
    async fn generated_dates_filters_by_template_and_range() {
        let store = InMemoryStore::new();
        let template = TemplateId::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

        let session = Session::generated_occurrence(
            SessionId::new(),
            template,
            date,
            ts(9, 18),
            ts(9, 19),
            10,
            None,
            None,
            ts(1, 0),
        )
        .unwrap();
        store.seed_session(session);

        let dates = SessionRepository::generated_dates(
            &store,
            &template,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(dates, vec![date]);

        let other = SessionRepository::generated_dates(
            &store,
            &TemplateId::new(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        )
        .await
        .unwrap();
        assert!(other.is_empty());
    }
}
