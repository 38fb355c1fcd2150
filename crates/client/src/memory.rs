//! In-memory booking API for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{AppointmentId, PaymentIntentId};

use crate::api::BookingApi;
use crate::dto::{
    AppointmentRecord, CreateAppointmentRequest, CreatePaymentIntentRequest, PaymentIntentDto,
    PaymentIntentSnapshot, PaymentIntentStatus, ServiceDto, SlotsRequest, SlotsResponse,
};
use crate::error::ApiError;

#[derive(Debug, Default)]
struct InMemoryState {
    services: Vec<ServiceDto>,
    slots: HashMap<NaiveDate, Vec<String>>,
    records: Vec<AppointmentRecord>,

    created: Vec<(AppointmentId, CreateAppointmentRequest)>,
    canceled: Vec<AppointmentId>,
    completed: Vec<AppointmentId>,
    intents: HashMap<PaymentIntentId, AppointmentId>,

    intent_script: VecDeque<PaymentIntentStatus>,
    last_intent_status: Option<PaymentIntentStatus>,
    checkout_url: Option<String>,

    fail_on_slots: bool,
    fail_on_create_appointment: bool,
    conflict_on_create: bool,
    fail_on_create_intent: bool,
    fail_on_cancel: bool,

    slots_requests: u32,
    intent_gets: u32,
}

/// In-memory booking backend for tests.
///
/// Supports failure injection per operation, a scripted sequence of payment
/// intent statuses, and call counters so tests can assert exactly which
/// requests were made.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingApi {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryBookingApi {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active service catalog.
    pub fn set_services(&self, services: Vec<ServiceDto>) {
        self.state.write().unwrap().services = services;
    }

    /// Sets the available times for a date.
    pub fn set_slots(&self, date: NaiveDate, times: &[&str]) {
        self.state
            .write()
            .unwrap()
            .slots
            .insert(date, times.iter().map(|s| s.to_string()).collect());
    }

    /// Replaces the records returned by `list_my_appointments`.
    pub fn set_records(&self, records: Vec<AppointmentRecord>) {
        self.state.write().unwrap().records = records;
    }

    /// Scripts the statuses returned by successive `get_payment_intent`
    /// calls. Once the script runs out, the last status repeats.
    pub fn script_intent_statuses(&self, statuses: &[PaymentIntentStatus]) {
        let mut state = self.state.write().unwrap();
        state.intent_script = statuses.iter().copied().collect();
        state.last_intent_status = None;
    }

    /// Makes created intents carry a hosted checkout URL instead of the
    /// direct Pix payload.
    pub fn set_checkout_url(&self, url: Option<&str>) {
        self.state.write().unwrap().checkout_url = url.map(str::to_string);
    }

    /// Registers an intent-to-appointment association, as if a previous
    /// session had created it.
    pub fn register_intent(&self, intent: PaymentIntentId, appointment: AppointmentId) {
        self.state.write().unwrap().intents.insert(intent, appointment);
    }

    /// Configures `available_slots` to fail.
    pub fn set_fail_on_slots(&self, fail: bool) {
        self.state.write().unwrap().fail_on_slots = fail;
    }

    /// Configures `create_appointment` to fail with a network error.
    pub fn set_fail_on_create_appointment(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create_appointment = fail;
    }

    /// Configures `create_appointment` to reject with a slot conflict.
    pub fn set_conflict_on_create(&self, conflict: bool) {
        self.state.write().unwrap().conflict_on_create = conflict;
    }

    /// Configures `create_payment_intent` to fail.
    pub fn set_fail_on_create_intent(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create_intent = fail;
    }

    /// Configures `cancel_appointment` to fail.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cancel = fail;
    }

    /// Returns the number of appointments created.
    pub fn created_count(&self) -> usize {
        self.state.read().unwrap().created.len()
    }

    /// Returns every created appointment id, in call order.
    pub fn created_ids(&self) -> Vec<AppointmentId> {
        self.state
            .read()
            .unwrap()
            .created
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns the creation request for the most recent appointment.
    pub fn last_created_request(&self) -> Option<CreateAppointmentRequest> {
        self.state
            .read()
            .unwrap()
            .created
            .last()
            .map(|(_, req)| req.clone())
    }

    /// Returns how many times the given appointment was canceled.
    pub fn cancel_count_for(&self, id: AppointmentId) -> usize {
        self.state
            .read()
            .unwrap()
            .canceled
            .iter()
            .filter(|c| **c == id)
            .count()
    }

    /// Returns every canceled appointment id, in call order.
    pub fn canceled_ids(&self) -> Vec<AppointmentId> {
        self.state.read().unwrap().canceled.clone()
    }

    /// Returns every completed appointment id, in call order.
    pub fn completed_ids(&self) -> Vec<AppointmentId> {
        self.state.read().unwrap().completed.clone()
    }

    /// Returns the number of payment intents created.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Returns how many `get_payment_intent` calls were made.
    pub fn intent_get_count(&self) -> u32 {
        self.state.read().unwrap().intent_gets
    }

    /// Returns how many `available_slots` calls were made.
    pub fn slots_request_count(&self) -> u32 {
        self.state.read().unwrap().slots_requests
    }

    fn next_intent_status(state: &mut InMemoryState) -> PaymentIntentStatus {
        if let Some(status) = state.intent_script.pop_front() {
            state.last_intent_status = Some(status);
            status
        } else {
            state.last_intent_status.unwrap_or(PaymentIntentStatus::Pending)
        }
    }
}

#[async_trait]
impl BookingApi for InMemoryBookingApi {
    async fn list_active_services(&self) -> Result<Vec<ServiceDto>, ApiError> {
        Ok(self.state.read().unwrap().services.clone())
    }

    async fn available_slots(&self, request: &SlotsRequest) -> Result<SlotsResponse, ApiError> {
        let mut state = self.state.write().unwrap();
        state.slots_requests += 1;

        if state.fail_on_slots {
            return Err(ApiError::Network("injected slot failure".to_string()));
        }

        Ok(SlotsResponse {
            date: request.date,
            times: state.slots.get(&request.date).cloned().unwrap_or_default(),
        })
    }

    async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<AppointmentId, ApiError> {
        let mut state = self.state.write().unwrap();

        if state.conflict_on_create {
            return Err(ApiError::Conflict("slot already taken".to_string()));
        }
        if state.fail_on_create_appointment {
            return Err(ApiError::Network("injected create failure".to_string()));
        }

        let id = AppointmentId::new();
        state.created.push((id, request.clone()));
        Ok(id)
    }

    async fn cancel_appointment(&self, id: AppointmentId) -> Result<(), ApiError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_cancel {
            return Err(ApiError::Network("injected cancel failure".to_string()));
        }
        state.canceled.push(id);
        Ok(())
    }

    async fn complete_appointment(&self, id: AppointmentId) -> Result<(), ApiError> {
        self.state.write().unwrap().completed.push(id);
        Ok(())
    }

    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentDto, ApiError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create_intent {
            return Err(ApiError::Rejected {
                status: 502,
                message: "payment gateway unavailable".to_string(),
            });
        }

        let id = PaymentIntentId::new();
        state.intents.insert(id, request.appointment_id);

        let (qr, copy_paste) = if state.checkout_url.is_some() {
            (None, None)
        } else {
            (
                Some("aGVsbG8=".to_string()),
                Some("00020126pix-copy-paste".to_string()),
            )
        };

        Ok(PaymentIntentDto {
            payment_intent_id: id,
            appointment_id: request.appointment_id,
            status: PaymentIntentStatus::Pending,
            qr_code_image: qr,
            copy_paste_code: copy_paste,
            checkout_url: state.checkout_url.clone(),
        })
    }

    async fn get_payment_intent(
        &self,
        id: PaymentIntentId,
    ) -> Result<PaymentIntentSnapshot, ApiError> {
        let mut state = self.state.write().unwrap();
        state.intent_gets += 1;

        let appointment_id = state
            .intents
            .get(&id)
            .copied()
            .ok_or_else(|| ApiError::NotFound(format!("payment intent {id}")))?;
        let status = Self::next_intent_status(&mut state);

        Ok(PaymentIntentSnapshot {
            payment_intent_id: id,
            appointment_id,
            status,
        })
    }

    async fn list_my_appointments(&self) -> Result<Vec<AppointmentRecord>, ApiError> {
        Ok(self.state.read().unwrap().records.clone())
    }
}
