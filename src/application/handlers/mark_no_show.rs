//! MarkNoShowHandler - Command handler for marking a member absent.
//!
//! The state change is the source of truth; the absence notification is
//! a best-effort collaborator hook. A failed notification is logged and
//! does not roll back the no-show.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::foundation::RosterEntryId;
use crate::domain::roster::{RosterEntry, RosterError};
use crate::ports::{AbsenceNotifier, RosterStore};

/// Command to mark a roster entry as a no-show.
#[derive(Debug, Clone)]
pub struct MarkNoShowCommand {
    pub entry: RosterEntryId,
}

/// Handler for no-show marking.
pub struct MarkNoShowHandler {
    roster: Arc<dyn RosterStore>,
    notifier: Arc<dyn AbsenceNotifier>,
}

impl MarkNoShowHandler {
    pub fn new(roster: Arc<dyn RosterStore>, notifier: Arc<dyn AbsenceNotifier>) -> Self {
        Self { roster, notifier }
    }

    pub async fn handle(&self, cmd: MarkNoShowCommand) -> Result<RosterEntry, RosterError> {
        let mut entry = self
            .roster
            .find_entry(&cmd.entry)
            .await?
            .ok_or(RosterError::EntryNotFound(cmd.entry))?;

        entry.mark_no_show().map_err(|_| {
            RosterError::invalid_state(format!("{:?}", entry.status), "mark no-show")
        })?;
        self.roster.update_entry(&entry).await?;

        info!(member = %entry.member, session = %entry.session, "member marked no-show");

        if let Err(e) = self
            .notifier
            .notify_absence(&entry.member, &entry.session)
            .await
        {
            warn!(
                member = %entry.member,
                session = %entry.session,
                error = %e,
                "absence notification failed"
            );
        }

        Ok(entry)
    }
}
