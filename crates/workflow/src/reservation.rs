//! Appointment creation with client-side precondition checks.

use std::sync::Arc;

use client::{BookingApi, CreateAppointmentRequest};
use common::AppointmentId;
use domain::{AppointmentDraft, SlotList};

use crate::error::WorkflowError;

/// Turns a validated draft into a reserved appointment.
#[derive(Clone)]
pub struct ReservationCreator {
    api: Arc<dyn BookingApi>,
}

impl ReservationCreator {
    /// Creates a reservation creator over the given API.
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self { api }
    }

    /// Validates the draft against the last-fetched slot list and creates
    /// the appointment. A draft that fails validation never reaches the
    /// network.
    #[tracing::instrument(skip_all, fields(date = %draft.date, slot = %draft.slot))]
    pub async fn create(
        &self,
        draft: &AppointmentDraft,
        slots: &SlotList,
    ) -> Result<AppointmentId, WorkflowError> {
        draft.validate(slots).map_err(WorkflowError::from)?;

        let request = CreateAppointmentRequest::from_draft(draft);
        let id = self.api.create_appointment(&request).await?;

        metrics::counter!("appointments_created_total").increment(1);
        tracing::info!(appointment_id = %id, "appointment created");
        Ok(id)
    }
}
