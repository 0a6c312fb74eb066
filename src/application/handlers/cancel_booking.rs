//! CancelBookingHandler - Command handler for cancelling a booking.
//!
//! Cancellation and the waitlist promotion it may trigger are one atomic
//! store operation, so readers never observe a freed seat without its
//! promoted occupant.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::RosterEntryId;
use crate::domain::roster::RosterError;
use crate::ports::{CancellationOutcome, RosterStore};

/// Command to cancel a roster entry.
#[derive(Debug, Clone)]
pub struct CancelBookingCommand {
    pub entry: RosterEntryId,
}

/// Handler for booking cancellations.
pub struct CancelBookingHandler {
    roster: Arc<dyn RosterStore>,
}

impl CancelBookingHandler {
    pub fn new(roster: Arc<dyn RosterStore>) -> Self {
        Self { roster }
    }

    pub async fn handle(
        &self,
        cmd: CancelBookingCommand,
    ) -> Result<CancellationOutcome, RosterError> {
        let outcome = self.roster.cancel_and_promote(&cmd.entry).await?;

        if let Some(promoted) = &outcome.promoted {
            info!(
                session = %outcome.cancelled.session,
                cancelled = %outcome.cancelled.member,
                promoted = %promoted.member,
                "booking cancelled, waitlist entry promoted"
            );
        } else {
            info!(
                session = %outcome.cancelled.session,
                cancelled = %outcome.cancelled.member,
                "booking cancelled"
            );
        }

        Ok(outcome)
    }
}
