//! TransitionSessionHandler - staff lifecycle actions on a session.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{Clock, SessionId};
use crate::domain::scheduling::{SchedulingError, Session};
use crate::ports::SessionRepository;

/// Staff/system action on a session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Publish a draft session for booking.
    Open,

    /// Mark the class as underway.
    Start,

    /// Mark the class as finished.
    Complete,

    /// Call the session off.
    Cancel,
}

/// Command to transition a session.
#[derive(Debug, Clone)]
pub struct TransitionSessionCommand {
    pub session: SessionId,
    pub action: SessionAction,
}

/// Handler for session lifecycle transitions.
pub struct TransitionSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
}

impl TransitionSessionHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    pub async fn handle(&self, cmd: TransitionSessionCommand) -> Result<Session, SchedulingError> {
        let mut session = self
            .sessions
            .find_by_id(&cmd.session)
            .await
            .map_err(|e| SchedulingError::infrastructure(e.to_string()))?
            .ok_or(SchedulingError::SessionNotFound(cmd.session))?;

        let now = self.clock.now();
        let current = format!("{:?}", session.status);
        let result = match cmd.action {
            SessionAction::Open => session.open(now),
            SessionAction::Start => session.start_class(now),
            SessionAction::Complete => session.complete(now),
            SessionAction::Cancel => session.cancel(now),
        };
        result.map_err(|_| SchedulingError::invalid_state(current, action_verb(cmd.action)))?;

        self.sessions
            .update(&session)
            .await
            .map_err(|e| SchedulingError::infrastructure(e.to_string()))?;

        info!(session = %cmd.session, action = ?cmd.action, status = ?session.status, "session transitioned");
        Ok(session)
    }
}

fn action_verb(action: SessionAction) -> &'static str {
    match action {
        SessionAction::Open => "open",
        SessionAction::Start => "start",
        SessionAction::Complete => "complete",
        SessionAction::Cancel => "cancel",
    }
}
