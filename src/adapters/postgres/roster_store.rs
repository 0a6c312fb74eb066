//! PostgreSQL implementation of RosterStore.
//!
//! This adapter is where the concurrency contract of the booking engine
//! is actually enforced:
//!
//! - `book` and `cancel_and_promote` take a `FOR UPDATE` lock on the
//!   session row, so "count booked seats, then write" is serialized per
//!   session;
//! - the partial unique index on non-cancelled (session_id, member_id)
//!   backs the at-most-one-booking invariant, and the unique constraint
//!   on attendance_facts backs check-in idempotence;
//! - every operation is one short transaction, never spanning a network
//!   call beyond the database itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::admission::{BookingSnapshot, DenialReason};
use crate::domain::foundation::{
    AttendanceId, CourseId, DomainError, ErrorCode, MemberId, RosterEntryId, SessionId, Timestamp,
};
use crate::domain::roster::{
    AttendanceFact, BookingSource, RosterEntry, RosterError, RosterStatus,
};
use crate::ports::{CancellationOutcome, RosterStore};

/// Constraint backing the at-most-one non-cancelled entry invariant.
const ACTIVE_PAIR_INDEX: &str = "uq_roster_entries_active_pair";

/// PostgreSQL implementation of the RosterStore port.
pub struct PostgresRosterStore {
    pool: PgPool,
}

impl PostgresRosterStore {
    /// Creates a new PostgresRosterStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, RosterError> {
        self.pool.begin().await.map_err(|e| {
            RosterError::infrastructure(format!("Failed to begin transaction: {}", e))
        })
    }
}

/// Database row representation of a roster entry.
#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    session_id: Uuid,
    member_id: String,
    status: String,
    source: String,
    booked_at: DateTime<Utc>,
    checked_in_at: Option<DateTime<Utc>>,
    checked_out_at: Option<DateTime<Utc>>,
}

impl TryFrom<EntryRow> for RosterEntry {
    type Error = DomainError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(RosterEntry {
            id: RosterEntryId::from_uuid(row.id),
            session: SessionId::from_uuid(row.session_id),
            member: MemberId::new(row.member_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid member id: {}", e))
            })?,
            status: parse_entry_status(&row.status)?,
            source: parse_source(&row.source)?,
            booked_at: Timestamp::from_datetime(row.booked_at),
            checked_in_at: row.checked_in_at.map(Timestamp::from_datetime),
            checked_out_at: row.checked_out_at.map(Timestamp::from_datetime),
        })
    }
}

/// Database row representation of an attendance fact.
#[derive(Debug, sqlx::FromRow)]
struct FactRow {
    id: Uuid,
    session_id: Uuid,
    member_id: String,
    checked_in_at: DateTime<Utc>,
    source: String,
}

impl TryFrom<FactRow> for AttendanceFact {
    type Error = DomainError;

    fn try_from(row: FactRow) -> Result<Self, Self::Error> {
        Ok(AttendanceFact {
            id: AttendanceId::from_uuid(row.id),
            session: SessionId::from_uuid(row.session_id),
            member: MemberId::new(row.member_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid member id: {}", e))
            })?,
            checked_in_at: Timestamp::from_datetime(row.checked_in_at),
            source: parse_source(&row.source)?,
        })
    }
}

fn parse_entry_status(s: &str) -> Result<RosterStatus, DomainError> {
    match s {
        "booked" => Ok(RosterStatus::Booked),
        "waitlisted" => Ok(RosterStatus::Waitlisted),
        "attended" => Ok(RosterStatus::Attended),
        "no_show" => Ok(RosterStatus::NoShow),
        "cancelled" => Ok(RosterStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid roster status value: {}", s),
        )),
    }
}

fn entry_status_to_string(status: RosterStatus) -> &'static str {
    match status {
        RosterStatus::Booked => "booked",
        RosterStatus::Waitlisted => "waitlisted",
        RosterStatus::Attended => "attended",
        RosterStatus::NoShow => "no_show",
        RosterStatus::Cancelled => "cancelled",
    }
}

fn parse_source(s: &str) -> Result<BookingSource, DomainError> {
    match s {
        "self_service" => Ok(BookingSource::SelfService),
        "staff" => Ok(BookingSource::Staff),
        "kiosk" => Ok(BookingSource::Kiosk),
        "walk_in" => Ok(BookingSource::WalkIn),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid booking source value: {}", s),
        )),
    }
}

fn source_to_string(source: BookingSource) -> &'static str {
    match source {
        BookingSource::SelfService => "self_service",
        BookingSource::Staff => "staff",
        BookingSource::Kiosk => "kiosk",
        BookingSource::WalkIn => "walk_in",
    }
}

/// Session seat data read under lock during booking decisions.
#[derive(Debug, sqlx::FromRow)]
struct SeatRow {
    capacity: i32,
    status: String,
}

const ENTRY_COLUMNS: &str =
    "id, session_id, member_id, status, source, booked_at, checked_in_at, checked_out_at";

async fn lock_session(
    tx: &mut Transaction<'_, Postgres>,
    session: &SessionId,
) -> Result<Option<SeatRow>, RosterError> {
    sqlx::query_as::<_, SeatRow>(
        "SELECT capacity, status FROM class_sessions WHERE id = $1 FOR UPDATE",
    )
    .bind(session.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| RosterError::infrastructure(format!("Failed to lock session: {}", e)))
}

async fn booked_count_tx(
    tx: &mut Transaction<'_, Postgres>,
    session: &SessionId,
) -> Result<i64, RosterError> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM roster_entries WHERE session_id = $1 AND status = 'booked'",
    )
    .bind(session.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| RosterError::infrastructure(format!("Failed to count bookings: {}", e)))
}

async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    entry: &RosterEntry,
) -> Result<(), RosterError> {
    sqlx::query(
        r#"
        INSERT INTO roster_entries (
            id, session_id, member_id, status, source, booked_at,
            checked_in_at, checked_out_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.session.as_uuid())
    .bind(entry.member.as_str())
    .bind(entry_status_to_string(entry.status))
    .bind(source_to_string(entry.source))
    .bind(entry.booked_at.as_datetime())
    .bind(entry.checked_in_at.as_ref().map(|t| *t.as_datetime()))
    .bind(entry.checked_out_at.as_ref().map(|t| *t.as_datetime()))
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.constraint() == Some(ACTIVE_PAIR_INDEX) {
                return RosterError::already_booked(entry.session, entry.member.clone());
            }
        }
        RosterError::infrastructure(format!("Failed to insert roster entry: {}", e))
    })?;
    Ok(())
}

fn commit_error(e: sqlx::Error) -> RosterError {
    RosterError::infrastructure(format!("Failed to commit transaction: {}", e))
}

#[async_trait]
impl RosterStore for PostgresRosterStore {
    async fn book(
        &self,
        session: &SessionId,
        member: &MemberId,
        source: BookingSource,
        booked_at: Timestamp,
    ) -> Result<RosterEntry, RosterError> {
        let mut tx = self.begin().await?;

        let seat = lock_session(&mut tx, session)
            .await?
            .ok_or(RosterError::SessionNotFound(*session))?;
        if seat.status == "cancelled" {
            return Err(RosterError::admission_denied(DenialReason::SessionUnavailable));
        }

        let booked = booked_count_tx(&mut tx, session).await?;
        let has_vacancy = seat.capacity == 0 || booked < i64::from(seat.capacity);
        let entry = if has_vacancy {
            RosterEntry::booked(RosterEntryId::new(), *session, member.clone(), source, booked_at)
        } else {
            RosterEntry::waitlisted(RosterEntryId::new(), *session, member.clone(), source, booked_at)
        };

        insert_entry(&mut tx, &entry).await?;
        tx.commit().await.map_err(commit_error)?;
        Ok(entry)
    }

    async fn insert_walk_in(&self, entry: &RosterEntry) -> Result<(), RosterError> {
        let mut tx = self.begin().await?;
        insert_entry(&mut tx, entry).await?;
        tx.commit().await.map_err(commit_error)?;
        Ok(())
    }

    async fn cancel_and_promote(
        &self,
        entry_id: &RosterEntryId,
    ) -> Result<CancellationOutcome, RosterError> {
        let mut tx = self.begin().await?;

        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM roster_entries WHERE id = $1 FOR UPDATE",
            ENTRY_COLUMNS
        ))
        .bind(entry_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to load entry: {}", e)))?;

        let mut cancelled: RosterEntry = row
            .ok_or(RosterError::EntryNotFound(*entry_id))?
            .try_into()?;
        cancelled
            .cancel()
            .map_err(|_| RosterError::invalid_state(format!("{:?}", cancelled.status), "cancel"))?;

        sqlx::query("UPDATE roster_entries SET status = 'cancelled' WHERE id = $1")
            .bind(entry_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| RosterError::infrastructure(format!("Failed to cancel entry: {}", e)))?;

        // Promote the earliest waitlisted entry iff a seat is free now.
        let mut promoted = None;
        if let Some(seat) = lock_session(&mut tx, &cancelled.session).await? {
            let booked = booked_count_tx(&mut tx, &cancelled.session).await?;
            if seat.capacity == 0 || booked < i64::from(seat.capacity) {
                let next: Option<EntryRow> = sqlx::query_as(&format!(
                    r#"
                    SELECT {} FROM roster_entries
                    WHERE session_id = $1 AND status = 'waitlisted'
                    ORDER BY booked_at ASC
                    LIMIT 1
                    FOR UPDATE
                    "#,
                    ENTRY_COLUMNS
                ))
                .bind(cancelled.session.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    RosterError::infrastructure(format!("Failed to read waitlist: {}", e))
                })?;

                if let Some(next_row) = next {
                    let mut entry: RosterEntry = next_row.try_into()?;
                    entry
                        .promote()
                        .map_err(|e| RosterError::infrastructure(e.to_string()))?;
                    sqlx::query("UPDATE roster_entries SET status = 'booked' WHERE id = $1")
                        .bind(entry.id.as_uuid())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| {
                            RosterError::infrastructure(format!("Failed to promote entry: {}", e))
                        })?;
                    promoted = Some(entry);
                }
            }
        }

        tx.commit().await.map_err(commit_error)?;
        Ok(CancellationOutcome { cancelled, promoted })
    }

    async fn update_entry(&self, entry: &RosterEntry) -> Result<(), RosterError> {
        let result = sqlx::query(
            r#"
            UPDATE roster_entries SET
                status = $2,
                checked_in_at = $3,
                checked_out_at = $4
            WHERE id = $1
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry_status_to_string(entry.status))
        .bind(entry.checked_in_at.as_ref().map(|t| *t.as_datetime()))
        .bind(entry.checked_out_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to update entry: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RosterError::EntryNotFound(entry.id));
        }
        Ok(())
    }

    async fn find_entry(&self, id: &RosterEntryId) -> Result<Option<RosterEntry>, RosterError> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM roster_entries WHERE id = $1",
            ENTRY_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to load entry: {}", e)))?;

        row.map(RosterEntry::try_from).transpose().map_err(Into::into)
    }

    async fn find_active_entry(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<RosterEntry>, RosterError> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM roster_entries
            WHERE session_id = $1 AND member_id = $2 AND status <> 'cancelled'
            "#,
            ENTRY_COLUMNS
        ))
        .bind(session.as_uuid())
        .bind(member.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to load entry: {}", e)))?;

        row.map(RosterEntry::try_from).transpose().map_err(Into::into)
    }

    async fn booked_count(&self, session: &SessionId) -> Result<u32, RosterError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM roster_entries WHERE session_id = $1 AND status = 'booked'",
        )
        .bind(session.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to count bookings: {}", e)))?;

        Ok(count.max(0) as u32)
    }

    async fn booked_snapshots_for_member(
        &self,
        member: &MemberId,
        exclude_session: &SessionId,
    ) -> Result<Vec<BookingSnapshot>, RosterError> {
        #[derive(sqlx::FromRow)]
        struct SnapshotRow {
            session_id: Uuid,
            start_at: DateTime<Utc>,
            course_id: Option<String>,
        }

        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT r.session_id, s.start_at, s.course_id
            FROM roster_entries r
            JOIN class_sessions s ON s.id = r.session_id
            WHERE r.member_id = $1 AND r.status = 'booked' AND r.session_id <> $2
            "#,
        )
        .bind(member.as_str())
        .bind(exclude_session.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to load bookings: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let course = row
                    .course_id
                    .map(CourseId::new)
                    .transpose()
                    .map_err(|e| RosterError::infrastructure(format!("Invalid course id: {}", e)))?;
                Ok(BookingSnapshot {
                    session: SessionId::from_uuid(row.session_id),
                    starts_at: Timestamp::from_datetime(row.start_at),
                    course,
                })
            })
            .collect()
    }

    async fn record_attendance(&self, fact: &AttendanceFact) -> Result<bool, RosterError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_facts (id, session_id, member_id, checked_in_at, source)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT uq_attendance_facts_pair DO NOTHING
            "#,
        )
        .bind(fact.id.as_uuid())
        .bind(fact.session.as_uuid())
        .bind(fact.member.as_str())
        .bind(fact.checked_in_at.as_datetime())
        .bind(source_to_string(fact.source))
        .execute(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to record attendance: {}", e)))?;

        // Zero rows affected means the conflict target fired: a fact for
        // this (session, member) already exists.
        Ok(result.rows_affected() == 1)
    }

    async fn find_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<Option<AttendanceFact>, RosterError> {
        let row: Option<FactRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, member_id, checked_in_at, source
            FROM attendance_facts
            WHERE session_id = $1 AND member_id = $2
            "#,
        )
        .bind(session.as_uuid())
        .bind(member.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to load attendance: {}", e)))?;

        row.map(AttendanceFact::try_from)
            .transpose()
            .map_err(Into::into)
    }

    async fn remove_attendance(
        &self,
        session: &SessionId,
        member: &MemberId,
    ) -> Result<AttendanceFact, RosterError> {
        let row: Option<FactRow> = sqlx::query_as(
            r#"
            DELETE FROM attendance_facts
            WHERE session_id = $1 AND member_id = $2
            RETURNING id, session_id, member_id, checked_in_at, source
            "#,
        )
        .bind(session.as_uuid())
        .bind(member.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RosterError::infrastructure(format!("Failed to remove attendance: {}", e)))?;

        let fact: AttendanceFact = row
            .ok_or_else(|| RosterError::attendance_not_found(*session, member.clone()))?
            .try_into()?;
        Ok(fact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_status_roundtrips_through_strings() {
        for status in [
            RosterStatus::Booked,
            RosterStatus::Waitlisted,
            RosterStatus::Attended,
            RosterStatus::NoShow,
            RosterStatus::Cancelled,
        ] {
            assert_eq!(
                parse_entry_status(entry_status_to_string(status)).unwrap(),
                status
            );
        }
        assert!(parse_entry_status("ghosted").is_err());
    }

    #[test]
    fn source_roundtrips_through_strings() {
        for source in [
            BookingSource::SelfService,
            BookingSource::Staff,
            BookingSource::Kiosk,
            BookingSource::WalkIn,
        ] {
            assert_eq!(parse_source(source_to_string(source)).unwrap(), source);
        }
        assert!(parse_source("carrier_pigeon").is_err());
    }
}
