//! Admission domain: who may book which session, and why not.

mod course;
mod entitlement;
mod policy;
mod rank;

pub use course::Course;
pub use entitlement::{BookingSnapshot, SubscriptionEntitlement};
pub use policy::{AdmissionContext, AdmissionDecision, AdmissionPolicy, DenialReason};
pub use rank::BeltRank;
