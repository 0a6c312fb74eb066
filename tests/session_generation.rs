//! Integration tests for recurring session generation.
//!
//! Covers the generator's contract end-to-end over the in-memory
//! adapters: idempotence by (template, occurrence date), horizon
//! clamping, capacity/instructor copying, course-roster seeding, and
//! the follow-on check-in flow against a generated session.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

use dojoflow::adapters::memory::{InMemoryAttendanceCounter, InMemoryStore};
use dojoflow::application::handlers::{
    CheckInCommand, CheckInHandler, CheckInOutcome, GenerateSessionsHandler,
};
use dojoflow::domain::foundation::{FixedClock, MemberId, TemplateId, Timestamp};
use dojoflow::domain::roster::{BookingSource, RosterStatus};
use dojoflow::domain::scheduling::{
    ClassLevel, ClassTemplate, Recurrence, SessionStatus, WeekdaySet,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Monday used as "today" throughout.
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Timestamp::from_date_time(
        today(),
        NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    )))
}

fn member(id: &str) -> MemberId {
    MemberId::new(id).unwrap()
}

fn template(days: &[Weekday]) -> ClassTemplate {
    ClassTemplate::new(
        TemplateId::new(),
        "Adult BJJ Fundamentals",
        ClassLevel::All,
        90,
        16,
        Timestamp::from_date_time(today(), NaiveTime::from_hms_opt(6, 0, 0).unwrap()),
    )
    .unwrap()
    .with_recurrence(Recurrence {
        weekdays: WeekdaySet::from_days(days),
        time_of_day: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        start_date: None,
        end_date: None,
    })
}

fn generator(store: &Arc<InMemoryStore>, horizon: u32) -> GenerateSessionsHandler {
    GenerateSessionsHandler::new(
        store.clone(),
        store.clone(),
        store.clone(),
        clock(),
        horizon,
    )
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn mondays_only_horizon_fourteen_generated_twice_creates_nothing_new() {
    // A template active on Mondays only, horizon 14 days, generated
    // twice in a row: the second run creates zero new sessions.
    let store = Arc::new(InMemoryStore::new());
    let tmpl = template(&[Weekday::Mon]);
    store.seed_template(tmpl.clone());

    let handler = generator(&store, 14);

    let first = handler.generate_all().await.unwrap();
    assert_eq!(first.sessions_created, 3);

    let second = handler.generate_all().await.unwrap();
    assert_eq!(second.sessions_created, 0);
    assert!(second.failures.is_empty());
    assert_eq!(store.sessions_for_template(&tmpl.id).len(), 3);
}

#[tokio::test]
async fn regeneration_fills_only_missing_dates() {
    // Widening the horizon after a first run only creates the tail.
    let store = Arc::new(InMemoryStore::new());
    let tmpl = template(&[Weekday::Mon]);
    store.seed_template(tmpl.clone());

    let short = generator(&store, 7);
    assert_eq!(short.generate_all().await.unwrap().sessions_created, 2);

    let long = generator(&store, 21);
    assert_eq!(long.generate_all().await.unwrap().sessions_created, 2);
    assert_eq!(store.sessions_for_template(&tmpl.id).len(), 4);
}

// =============================================================================
// Generated session shape
// =============================================================================

#[tokio::test]
async fn generated_sessions_copy_template_settings() {
    let store = Arc::new(InMemoryStore::new());
    let tmpl = template(&[Weekday::Mon, Weekday::Wed]);
    store.seed_template(tmpl.clone());

    generator(&store, 7).generate_all().await.unwrap();

    let sessions = store.sessions_for_template(&tmpl.id);
    assert_eq!(sessions.len(), 3); // Mon 9th, Wed 11th, Mon 16th

    for session in &sessions {
        assert_eq!(session.status, SessionStatus::Open);
        assert_eq!(session.capacity, 16);
        assert_eq!(
            session.start.as_datetime().format("%H:%M").to_string(),
            "18:30"
        );
        assert_eq!(
            session.end.duration_since(&session.start),
            chrono::Duration::minutes(90)
        );
        let date = session.occurrence_date.unwrap();
        assert!(matches!(date.weekday(), Weekday::Mon | Weekday::Wed));
        assert_eq!(session.start.date(), date);
    }
}

#[tokio::test]
async fn effective_window_limits_generation() {
    let store = Arc::new(InMemoryStore::new());
    let mut tmpl = template(&[Weekday::Mon]);
    if let Some(rec) = tmpl.recurrence.as_mut() {
        rec.end_date = NaiveDate::from_ymd_opt(2026, 3, 10);
    }
    store.seed_template(tmpl.clone());

    generator(&store, 60).generate_all().await.unwrap();

    // Only the Monday on or before the recurrence end survives.
    let sessions = store.sessions_for_template(&tmpl.id);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].occurrence_date, NaiveDate::from_ymd_opt(2026, 3, 9));
}

// =============================================================================
// Course roster seeding + end-to-end check-in
// =============================================================================

#[tokio::test]
async fn enrolled_members_are_seeded_and_can_check_in() {
    let store = Arc::new(InMemoryStore::new());
    let tmpl = template(&[Weekday::Mon])
        .with_enrolled_members(vec![member("m-1"), member("m-2")]);
    store.seed_template(tmpl.clone());

    generator(&store, 3).generate_all().await.unwrap();

    let sessions = store.sessions_for_template(&tmpl.id);
    assert_eq!(sessions.len(), 1);
    let session = &sessions[0];

    // Both course members hold booked entries on the generated session.
    let entries = store.entries_for_session(&session.id);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.status == RosterStatus::Booked));

    // One of them checks in: attendance recorded once, session starts.
    let counter = Arc::new(InMemoryAttendanceCounter::new());
    let check_in = CheckInHandler::new(
        store.clone(),
        store.clone(),
        counter.clone(),
        clock(),
        false,
    );

    let result = check_in
        .handle(CheckInCommand {
            member: member("m-1"),
            session: session.id,
            source: BookingSource::Kiosk,
        })
        .await
        .unwrap();

    assert_eq!(result.outcome, CheckInOutcome::CheckedIn);
    assert!(result.session_started);
    assert_eq!(counter.count(&member("m-1")), 1);
    assert_eq!(
        store.session(&session.id).unwrap().status,
        SessionStatus::InProgress
    );
}
