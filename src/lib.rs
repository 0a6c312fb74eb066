//! Dojoflow - class scheduling, booking and attendance engine for
//! membership-based studios.
//!
//! Expands recurring class templates into bookable sessions, enforces
//! capacity and plan-based admission rules, manages a FIFO waitlist with
//! automatic promotion, and converts bookings into idempotent attendance
//! records from staff, portal and kiosk entry points.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
