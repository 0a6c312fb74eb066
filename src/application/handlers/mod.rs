//! Command handlers orchestrating domain logic over the ports.

mod book_session;
mod cancel_booking;
mod check_in;
mod check_out;
mod generate_sessions;
mod mark_no_show;
mod revoke_check_in;
mod transition_session;

pub use book_session::{BookSessionCommand, BookSessionHandler, BookSessionResult, BookingOutcome};
pub use cancel_booking::{CancelBookingCommand, CancelBookingHandler};
pub use check_in::{CheckInCommand, CheckInHandler, CheckInOutcome, CheckInResult};
pub use check_out::{CheckOutCommand, CheckOutHandler};
pub use generate_sessions::{GenerateSessionsHandler, GenerationSummary};
pub use mark_no_show::{MarkNoShowCommand, MarkNoShowHandler};
pub use revoke_check_in::{RevokeCheckInCommand, RevokeCheckInHandler};
pub use transition_session::{SessionAction, TransitionSessionCommand, TransitionSessionHandler};
