//! The booking API trait.

use async_trait::async_trait;
use common::{AppointmentId, PaymentIntentId};

use crate::dto::{
    AppointmentRecord, CreateAppointmentRequest, CreatePaymentIntentRequest, PaymentIntentDto,
    PaymentIntentSnapshot, ServiceDto, SlotsRequest, SlotsResponse,
};
use crate::error::ApiError;

/// Everything the booking workflow asks of the remote backend.
///
/// The server is authoritative for slot availability and appointment state;
/// this client never asserts either locally before the server confirms.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Lists the services currently offered.
    async fn list_active_services(&self) -> Result<Vec<ServiceDto>, ApiError>;

    /// Returns the bookable start times for a date and set of services.
    async fn available_slots(&self, request: &SlotsRequest) -> Result<SlotsResponse, ApiError>;

    /// Creates an appointment, reserving its slot.
    async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<AppointmentId, ApiError>;

    /// Cancels an appointment. The record is status-transitioned, never
    /// deleted.
    async fn cancel_appointment(&self, id: AppointmentId) -> Result<(), ApiError>;

    /// Marks an appointment as completed. Staff only.
    async fn complete_appointment(&self, id: AppointmentId) -> Result<(), ApiError>;

    /// Creates a payment intent for an appointment.
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentDto, ApiError>;

    /// Fetches a payment intent's current status.
    async fn get_payment_intent(
        &self,
        id: PaymentIntentId,
    ) -> Result<PaymentIntentSnapshot, ApiError>;

    /// Lists the calling customer's appointments.
    async fn list_my_appointments(&self) -> Result<Vec<AppointmentRecord>, ApiError>;
}
