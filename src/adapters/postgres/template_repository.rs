//! PostgreSQL implementation of TemplateRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CourseId, DomainError, ErrorCode, InstructorId, MemberId, TemplateId, Timestamp,
};
use crate::domain::scheduling::{ClassLevel, ClassTemplate, Recurrence, WeekdaySet};
use crate::ports::TemplateRepository;

/// PostgreSQL implementation of the TemplateRepository port.
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    /// Creates a new PostgresTemplateRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a class template.
#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    level: String,
    duration_minutes: i32,
    capacity: i32,
    instructor_id: Option<Uuid>,
    course_id: Option<String>,
    enrolled_members: Vec<String>,
    recurrence_active: bool,
    rec_mon: bool,
    rec_tue: bool,
    rec_wed: bool,
    rec_thu: bool,
    rec_fri: bool,
    rec_sat: bool,
    rec_sun: bool,
    time_of_day: Option<NaiveTime>,
    recurrence_start: Option<NaiveDate>,
    recurrence_end: Option<NaiveDate>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for ClassTemplate {
    type Error = DomainError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let recurrence = match (row.recurrence_active, row.time_of_day) {
            (true, Some(time_of_day)) => {
                let mut weekdays = WeekdaySet::empty();
                for (flag, day) in [
                    (row.rec_mon, Weekday::Mon),
                    (row.rec_tue, Weekday::Tue),
                    (row.rec_wed, Weekday::Wed),
                    (row.rec_thu, Weekday::Thu),
                    (row.rec_fri, Weekday::Fri),
                    (row.rec_sat, Weekday::Sat),
                    (row.rec_sun, Weekday::Sun),
                ] {
                    if flag {
                        weekdays = weekdays.with(day);
                    }
                }
                Some(Recurrence {
                    weekdays,
                    time_of_day,
                    start_date: row.recurrence_start,
                    end_date: row.recurrence_end,
                })
            }
            _ => None,
        };

        let enrolled_members = row
            .enrolled_members
            .into_iter()
            .map(MemberId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid member id: {}", e))
            })?;

        let course = row
            .course_id
            .map(CourseId::new)
            .transpose()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid course id: {}", e))
            })?;

        Ok(ClassTemplate {
            id: TemplateId::from_uuid(row.id),
            name: row.name,
            level: parse_level(&row.level)?,
            duration_minutes: row.duration_minutes.max(0) as u32,
            capacity: row.capacity.max(0) as u32,
            instructor: row.instructor_id.map(InstructorId::from_uuid),
            course,
            enrolled_members,
            recurrence,
            active: row.active,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_level(s: &str) -> Result<ClassLevel, DomainError> {
    match s {
        "beginner" => Ok(ClassLevel::Beginner),
        "intermediate" => Ok(ClassLevel::Intermediate),
        "advanced" => Ok(ClassLevel::Advanced),
        "all" => Ok(ClassLevel::All),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid level value: {}", s),
        )),
    }
}

fn level_to_string(level: ClassLevel) -> &'static str {
    match level {
        ClassLevel::Beginner => "beginner",
        ClassLevel::Intermediate => "intermediate",
        ClassLevel::Advanced => "advanced",
        ClassLevel::All => "all",
    }
}

fn weekday_flags(template: &ClassTemplate) -> [bool; 7] {
    match &template.recurrence {
        Some(rec) => [
            rec.weekdays.contains(Weekday::Mon),
            rec.weekdays.contains(Weekday::Tue),
            rec.weekdays.contains(Weekday::Wed),
            rec.weekdays.contains(Weekday::Thu),
            rec.weekdays.contains(Weekday::Fri),
            rec.weekdays.contains(Weekday::Sat),
            rec.weekdays.contains(Weekday::Sun),
        ],
        None => [false; 7],
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, level, duration_minutes, capacity, instructor_id, course_id,
           enrolled_members, recurrence_active, rec_mon, rec_tue, rec_wed, rec_thu,
           rec_fri, rec_sat, rec_sun, time_of_day, recurrence_start, recurrence_end,
           active, created_at, updated_at
    FROM class_templates
"#;

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn save(&self, template: &ClassTemplate) -> Result<(), DomainError> {
        let flags = weekday_flags(template);
        let members: Vec<String> = template
            .enrolled_members
            .iter()
            .map(|m| m.as_str().to_string())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO class_templates (
                id, name, level, duration_minutes, capacity, instructor_id, course_id,
                enrolled_members, recurrence_active, rec_mon, rec_tue, rec_wed, rec_thu,
                rec_fri, rec_sat, rec_sun, time_of_day, recurrence_start, recurrence_end,
                active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                      $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(template.id.as_uuid())
        .bind(&template.name)
        .bind(level_to_string(template.level))
        .bind(template.duration_minutes as i32)
        .bind(template.capacity as i32)
        .bind(template.instructor.as_ref().map(|i| *i.as_uuid()))
        .bind(template.course.as_ref().map(|c| c.as_str().to_string()))
        .bind(&members)
        .bind(template.recurrence.is_some())
        .bind(flags[0])
        .bind(flags[1])
        .bind(flags[2])
        .bind(flags[3])
        .bind(flags[4])
        .bind(flags[5])
        .bind(flags[6])
        .bind(template.recurrence.as_ref().map(|r| r.time_of_day))
        .bind(template.recurrence.as_ref().and_then(|r| r.start_date))
        .bind(template.recurrence.as_ref().and_then(|r| r.end_date))
        .bind(template.active)
        .bind(template.created_at.as_datetime())
        .bind(template.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to save template: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, template: &ClassTemplate) -> Result<(), DomainError> {
        let flags = weekday_flags(template);
        let members: Vec<String> = template
            .enrolled_members
            .iter()
            .map(|m| m.as_str().to_string())
            .collect();

        let result = sqlx::query(
            r#"
            UPDATE class_templates SET
                name = $2,
                level = $3,
                duration_minutes = $4,
                capacity = $5,
                instructor_id = $6,
                course_id = $7,
                enrolled_members = $8,
                recurrence_active = $9,
                rec_mon = $10, rec_tue = $11, rec_wed = $12, rec_thu = $13,
                rec_fri = $14, rec_sat = $15, rec_sun = $16,
                time_of_day = $17,
                recurrence_start = $18,
                recurrence_end = $19,
                active = $20,
                updated_at = $21
            WHERE id = $1
            "#,
        )
        .bind(template.id.as_uuid())
        .bind(&template.name)
        .bind(level_to_string(template.level))
        .bind(template.duration_minutes as i32)
        .bind(template.capacity as i32)
        .bind(template.instructor.as_ref().map(|i| *i.as_uuid()))
        .bind(template.course.as_ref().map(|c| c.as_str().to_string()))
        .bind(&members)
        .bind(template.recurrence.is_some())
        .bind(flags[0])
        .bind(flags[1])
        .bind(flags[2])
        .bind(flags[3])
        .bind(flags[4])
        .bind(flags[5])
        .bind(flags[6])
        .bind(template.recurrence.as_ref().map(|r| r.time_of_day))
        .bind(template.recurrence.as_ref().and_then(|r| r.start_date))
        .bind(template.recurrence.as_ref().and_then(|r| r.end_date))
        .bind(template.active)
        .bind(template.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to update template: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::TemplateNotFound,
                format!("Template not found: {}", template.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<ClassTemplate>, DomainError> {
        let row: Option<TemplateRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to load template: {}", e),
                    )
                })?;

        row.map(ClassTemplate::try_from).transpose()
    }

    async fn list_generatable(&self) -> Result<Vec<ClassTemplate>, DomainError> {
        let rows: Vec<TemplateRow> = sqlx::query_as(&format!(
            "{} WHERE active AND recurrence_active ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list templates: {}", e),
            )
        })?;

        rows.into_iter()
            .map(ClassTemplate::try_from)
            .filter(|t| t.as_ref().map(|t| t.is_generatable()).unwrap_or(true))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_roundtrips_through_strings() {
        for level in [
            ClassLevel::Beginner,
            ClassLevel::Intermediate,
            ClassLevel::Advanced,
            ClassLevel::All,
        ] {
            assert_eq!(parse_level(level_to_string(level)).unwrap(), level);
        }
        assert!(parse_level("ninja").is_err());
    }
}
