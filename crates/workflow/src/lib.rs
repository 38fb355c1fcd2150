//! The barbershop booking workflow.
//!
//! This crate orchestrates one booking session end to end:
//! - [`SlotBoard`] and [`AvailabilityResolver`] — debounced availability
//!   fetching where only the latest request's response is ever applied
//! - [`ReservationCreator`] — client-side validation, then appointment
//!   creation
//! - [`PaymentOrchestrator`] — the online checkout state machine with status
//!   polling and a compensating cancellation when intent creation fails
//! - [`SessionStore`] — the two pointers needed to resume after a checkout
//!   redirect
//! - [`BookingFlow`] — the step-gated controller with cascade invalidation
//!
//! Everything clock-dependent takes its time from an injectable [`Clock`],
//! and all remote traffic goes through the `client` crate's `BookingApi`
//! trait, so the whole workflow runs deterministically under test.

pub mod availability;
pub mod config;
pub mod controller;
pub mod error;
pub mod payment;
pub mod reservation;
pub mod session;
pub mod slots;

pub use availability::AvailabilityResolver;
pub use config::{DeviceContext, WorkflowConfig};
pub use controller::{AppointmentsView, BookingFlow, Clock, StepGates};
pub use error::WorkflowError;
pub use payment::{
    CheckoutState, PaymentLaunch, PaymentOrchestrator, PaymentOutcome, RedirectTarget,
};
pub use reservation::ReservationCreator;
pub use session::{InMemorySessionStore, PendingPayment, SessionStore};
pub use slots::{RequestTag, SlotApply, SlotBoard};
