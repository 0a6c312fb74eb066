//! CheckOutHandler - Command handler stamping a member's departure time.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{Clock, MemberId, SessionId};
use crate::domain::roster::{RosterEntry, RosterError};
use crate::ports::RosterStore;

/// Command to check a member out of a session.
#[derive(Debug, Clone)]
pub struct CheckOutCommand {
    pub member: MemberId,
    pub session: SessionId,
}

/// Handler for check-outs. Requires a prior check-in; the entry stays
/// `Attended` and only gains a departure timestamp.
pub struct CheckOutHandler {
    roster: Arc<dyn RosterStore>,
    clock: Arc<dyn Clock>,
}

impl CheckOutHandler {
    pub fn new(roster: Arc<dyn RosterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { roster, clock }
    }

    pub async fn handle(&self, cmd: CheckOutCommand) -> Result<RosterEntry, RosterError> {
        let mut entry = self
            .roster
            .find_active_entry(&cmd.session, &cmd.member)
            .await?
            .ok_or_else(|| {
                RosterError::attendance_not_found(cmd.session, cmd.member.clone())
            })?;

        entry.check_out(self.clock.now()).map_err(|_| {
            RosterError::invalid_state(format!("{:?}", entry.status), "check out")
        })?;
        self.roster.update_entry(&entry).await?;

        info!(member = %cmd.member, session = %cmd.session, "member checked out");
        Ok(entry)
    }
}
