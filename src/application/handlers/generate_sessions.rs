//! GenerateSessionsHandler - expands recurring templates into bookable
//! sessions over a rolling horizon.
//!
//! Designed to run repeatedly (a daily batch job or a manual trigger)
//! and concurrently across templates: generation is idempotent by
//! (template, occurrence date), and generation for the *same* template
//! is serialized through a per-template lock so two runs never race the
//! duplicate-detection check. One template's failure is logged and
//! reported in the summary; the batch keeps going.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::domain::foundation::{Clock, SessionId, TemplateId, Timestamp};
use crate::domain::roster::BookingSource;
use crate::domain::scheduling::{recurrence, ClassTemplate, SchedulingError, Session};
use crate::ports::{RosterStore, SessionRepository, TemplateRepository};

/// Outcome of one generation batch.
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// Templates the batch attempted.
    pub templates_processed: usize,

    /// New sessions created across all templates.
    pub sessions_created: usize,

    /// Per-template failures; the rest of the batch still ran.
    pub failures: Vec<SchedulingError>,
}

/// Handler expanding recurring templates into concrete sessions.
pub struct GenerateSessionsHandler {
    templates: Arc<dyn TemplateRepository>,
    sessions: Arc<dyn SessionRepository>,
    roster: Arc<dyn RosterStore>,
    clock: Arc<dyn Clock>,
    horizon_days: u32,

    /// One lock per template; generation for the same template must not
    /// run concurrently.
    template_locks: std::sync::Mutex<HashMap<TemplateId, Arc<AsyncMutex<()>>>>,
}

impl GenerateSessionsHandler {
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        sessions: Arc<dyn SessionRepository>,
        roster: Arc<dyn RosterStore>,
        clock: Arc<dyn Clock>,
        horizon_days: u32,
    ) -> Self {
        Self {
            templates,
            sessions,
            roster,
            clock,
            horizon_days,
            template_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Runs generation for every active recurring template.
    ///
    /// Unrecoverable per-template errors are isolated: logged, collected
    /// into the summary, and the batch continues with the next template.
    ///
    /// # Errors
    ///
    /// Only fails outright when the template list itself cannot be read.
    pub async fn generate_all(&self) -> Result<GenerationSummary, SchedulingError> {
        let templates = self
            .templates
            .list_generatable()
            .await
            .map_err(|e| SchedulingError::infrastructure(e.to_string()))?;

        let mut summary = GenerationSummary::default();
        for template in templates {
            summary.templates_processed += 1;
            match self.generate_for(&template).await {
                Ok(created) => summary.sessions_created += created,
                Err(e) => {
                    let failure = SchedulingError::generation(template.id, e.to_string());
                    warn!(template = %template.id, error = %e, "session generation failed");
                    summary.failures.push(failure);
                }
            }
        }

        info!(
            templates = summary.templates_processed,
            created = summary.sessions_created,
            failed = summary.failures.len(),
            "session generation batch finished"
        );
        Ok(summary)
    }

    /// Runs generation for a single template by id (the manual trigger).
    pub async fn generate_for_template(
        &self,
        id: &TemplateId,
    ) -> Result<usize, SchedulingError> {
        let template = self
            .templates
            .find_by_id(id)
            .await
            .map_err(|e| SchedulingError::infrastructure(e.to_string()))?
            .ok_or(SchedulingError::TemplateNotFound(*id))?;
        self.generate_for(&template).await
    }

    /// Expands one template. Returns the number of sessions created.
    async fn generate_for(&self, template: &ClassTemplate) -> Result<usize, SchedulingError> {
        let lock = self.lock_for(template.id);
        let _guard = lock.lock().await;

        if !template.is_generatable() {
            return Ok(0);
        }
        let rec = match &template.recurrence {
            Some(rec) => rec,
            None => return Ok(0),
        };

        let today = self.clock.today();
        let candidates = recurrence::occurrence_dates(rec, today, self.horizon_days);
        if candidates.is_empty() {
            return Ok(0);
        }

        let horizon_end = today + Duration::days(i64::from(self.horizon_days));
        let existing: HashSet<_> = self
            .sessions
            .generated_dates(&template.id, today, horizon_end)
            .await
            .map_err(|e| SchedulingError::infrastructure(e.to_string()))?
            .into_iter()
            .collect();

        let now = self.clock.now();
        let mut created = 0;
        for date in candidates {
            if existing.contains(&date) {
                continue;
            }

            let start = Timestamp::from_date_time(date, rec.time_of_day);
            let end = start.add_minutes(i64::from(template.duration_minutes));
            let session = Session::generated_occurrence(
                SessionId::new(),
                template.id,
                date,
                start,
                end,
                template.capacity,
                template.instructor,
                template.course.clone(),
                now,
            )
            .map_err(|e| SchedulingError::validation("session", e.to_string()))?;

            self.sessions
                .save(&session)
                .await
                .map_err(|e| SchedulingError::infrastructure(e.to_string()))?;

            // Course-level enrollment: every explicitly enrolled member
            // gets a booked entry on the new session.
            for member in &template.enrolled_members {
                self.roster
                    .book(&session.id, member, BookingSource::Staff, now)
                    .await
                    .map_err(|e| SchedulingError::infrastructure(e.to_string()))?;
            }

            created += 1;
        }

        if created > 0 {
            info!(template = %template.id, created, "generated sessions");
        }
        Ok(created)
    }

    fn lock_for(&self, template: TemplateId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .template_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(template)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
