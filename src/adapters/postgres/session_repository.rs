//! PostgreSQL implementation of SessionRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CourseId, DomainError, ErrorCode, InstructorId, SessionId, TemplateId, Timestamp,
};
use crate::domain::scheduling::{Session, SessionStatus};
use crate::ports::SessionRepository;

/// PostgreSQL implementation of the SessionRepository port.
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a new PostgresSessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a session.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    template_id: Uuid,
    course_id: Option<String>,
    instructor_id: Option<Uuid>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    capacity: i32,
    status: String,
    occurrence_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let course = row
            .course_id
            .map(CourseId::new)
            .transpose()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid course id: {}", e))
            })?;

        Ok(Session {
            id: SessionId::from_uuid(row.id),
            template_id: TemplateId::from_uuid(row.template_id),
            course,
            instructor: row.instructor_id.map(InstructorId::from_uuid),
            start: Timestamp::from_datetime(row.start_at),
            end: Timestamp::from_datetime(row.end_at),
            capacity: row.capacity.max(0) as u32,
            status: parse_status(&row.status)?,
            occurrence_date: row.occurrence_date,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SessionStatus, DomainError> {
    match s {
        "draft" => Ok(SessionStatus::Draft),
        "open" => Ok(SessionStatus::Open),
        "in_progress" => Ok(SessionStatus::InProgress),
        "done" => Ok(SessionStatus::Done),
        "cancelled" => Ok(SessionStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid session status value: {}", s),
        )),
    }
}

fn status_to_string(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Draft => "draft",
        SessionStatus::Open => "open",
        SessionStatus::InProgress => "in_progress",
        SessionStatus::Done => "done",
        SessionStatus::Cancelled => "cancelled",
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO class_sessions (
                id, template_id, course_id, instructor_id, start_at, end_at,
                capacity, status, occurrence_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.template_id.as_uuid())
        .bind(session.course.as_ref().map(|c| c.as_str().to_string()))
        .bind(session.instructor.as_ref().map(|i| *i.as_uuid()))
        .bind(session.start.as_datetime())
        .bind(session.end.as_datetime())
        .bind(session.capacity as i32)
        .bind(status_to_string(session.status))
        .bind(session.occurrence_date)
        .bind(session.created_at.as_datetime())
        .bind(session.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to save session: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE class_sessions SET
                course_id = $2,
                instructor_id = $3,
                start_at = $4,
                end_at = $5,
                capacity = $6,
                status = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.course.as_ref().map(|c| c.as_str().to_string()))
        .bind(session.instructor.as_ref().map(|i| *i.as_uuid()))
        .bind(session.start.as_datetime())
        .bind(session.end.as_datetime())
        .bind(session.capacity as i32)
        .bind(status_to_string(session.status))
        .bind(session.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to update session: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, template_id, course_id, instructor_id, start_at, end_at,
                   capacity, status, occurrence_date, created_at, updated_at
            FROM class_sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to load session: {}", e))
        })?;

        row.map(Session::try_from).transpose()
    }

    async fn generated_dates(
        &self,
        template: &TemplateId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DomainError> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT occurrence_date
            FROM class_sessions
            WHERE template_id = $1
              AND occurrence_date IS NOT NULL
              AND occurrence_date BETWEEN $2 AND $3
            ORDER BY occurrence_date
            "#,
        )
        .bind(template.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load generated dates: {}", e),
            )
        })?;

        Ok(dates)
    }

    async fn find_in_window(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Session>, DomainError> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, template_id, course_id, instructor_id, start_at, end_at,
                   capacity, status, occurrence_date, created_at, updated_at
            FROM class_sessions
            WHERE start_at BETWEEN $1 AND $2
            ORDER BY start_at
            "#,
        )
        .bind(from.as_datetime())
        .bind(to.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to load sessions: {}", e))
        })?;

        rows.into_iter().map(Session::try_from).collect()
    }
}
