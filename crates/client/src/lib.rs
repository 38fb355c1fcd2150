//! The remote booking API boundary.
//!
//! This crate defines the contract the workflow consumes:
//! - [`BookingApi`] — the async trait covering every remote operation
//! - Wire DTOs with the backend's camelCase JSON shapes
//! - [`HttpBookingApi`] — the `reqwest`-backed implementation
//! - [`InMemoryBookingApi`] — a test double with failure injection and
//!   call counters
//!
//! Transport mechanics beyond status-to-error mapping (token refresh,
//! request signing) are out of scope and live with the embedding
//! application.

pub mod api;
pub mod dto;
pub mod error;
pub mod http;
pub mod memory;

pub use api::BookingApi;
pub use dto::{
    AppointmentRecord, CreateAppointmentRequest, CreateAppointmentResponse,
    CreatePaymentIntentRequest, PaymentIntentDto, PaymentIntentSnapshot, PaymentIntentStatus,
    PaymentStrategy, ServiceDto, ServiceSnapshotDto, SlotsRequest, SlotsResponse,
};
pub use error::ApiError;
pub use http::{HttpBookingApi, HttpConfig};
pub use memory::InMemoryBookingApi;
