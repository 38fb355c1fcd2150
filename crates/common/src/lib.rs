//! Shared identifier types used across the booking workflow crates.

mod types;

pub use types::{AppointmentId, CustomerId, PaymentIntentId, ServiceId};
