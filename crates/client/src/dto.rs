//! Wire DTOs for the booking backend.
//!
//! Field names follow the backend's camelCase JSON. Money travels as
//! integer cents; times travel as `"HH:MM"` strings (the backend sometimes
//! appends seconds).

use chrono::{NaiveDate, NaiveDateTime};
use common::{AppointmentId, CustomerId, PaymentIntentId, ServiceId};
use domain::{
    Appointment, AppointmentDraft, AppointmentStatus, CustomerRef, Money, PaymentKind, PaymentMode,
    Service, ServiceSnapshot, TimeSlot,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A catalog service as the backend sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDto {
    pub id: ServiceId,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: u32,
}

impl From<ServiceDto> for Service {
    fn from(dto: ServiceDto) -> Self {
        Service::new(
            dto.id,
            dto.name,
            Money::from_cents(dto.price_cents),
            dto.duration_minutes,
        )
    }
}

impl From<&Service> for ServiceDto {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id,
            name: service.name.clone(),
            price_cents: service.price.cents(),
            duration_minutes: service.duration_minutes,
        }
    }
}

/// Availability query for one (date, services) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsRequest {
    pub date: NaiveDate,
    pub service_ids: Vec<ServiceId>,
}

/// Bookable start times for the requested date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub times: Vec<String>,
}

/// Appointment creation payload.
///
/// The customer fields are staff-only: a matched customer id, or free-text
/// name/phone for walk-ins. Customer self-booking leaves them empty and the
/// backend resolves identity from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub service_ids: Vec<ServiceId>,
    pub date: NaiveDate,
    pub start_time: String,
    pub payment_type: PaymentKind,
    pub payment_mode: PaymentMode,
    pub reminder_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid: Option<bool>,
}

impl CreateAppointmentRequest {
    /// Builds the wire payload from a validated draft.
    pub fn from_draft(draft: &AppointmentDraft) -> Self {
        let (customer_id, customer_name, customer_phone, paid) = match &draft.staff {
            Some(staff) => {
                let (id, name, phone) = match &staff.customer {
                    CustomerRef::Known(id) => (Some(*id), None, None),
                    CustomerRef::WalkIn { name, phone } => {
                        (None, Some(name.clone()), phone.clone())
                    }
                };
                (id, name, phone, Some(staff.paid))
            }
            None => (None, None, None, None),
        };

        Self {
            service_ids: draft.services.iter().map(|s| s.service_id).collect(),
            date: draft.date.date(),
            start_time: draft.slot.to_string(),
            payment_type: draft.payment_kind,
            payment_mode: draft.payment_mode,
            reminder_minutes: draft.reminder.minutes(),
            customer_id,
            customer_name,
            customer_phone,
            paid,
        }
    }
}

/// The backend's reply to appointment creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentResponse {
    pub id: AppointmentId,
}

/// Which gateway flow to use for an online payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStrategy {
    /// Direct Pix charge: QR code plus copy-paste code, confirmed by polling.
    PixDirect,
    /// Hosted checkout page: redirect out, confirm on return.
    CheckoutPro,
}

impl PaymentStrategy {
    /// Maps a payment kind to its gateway strategy. Cash has none.
    pub fn for_kind(kind: PaymentKind) -> Option<Self> {
        match kind {
            PaymentKind::Pix => Some(PaymentStrategy::PixDirect),
            PaymentKind::Card => Some(PaymentStrategy::CheckoutPro),
            PaymentKind::Cash => None,
        }
    }
}

/// Status of a payment intent at the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentIntentStatus {
    /// Waiting for the customer to pay.
    Pending,
    /// Confirmed (terminal).
    Paid,
    /// Canceled at the gateway (terminal).
    Canceled,
    /// Rejected or errored (terminal).
    Failed,
}

impl PaymentIntentStatus {
    /// Returns true if no further status changes can happen.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentIntentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentIntentStatus::Pending => "Pending",
            PaymentIntentStatus::Paid => "Paid",
            PaymentIntentStatus::Canceled => "Canceled",
            PaymentIntentStatus::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

/// Payment intent creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub appointment_id: AppointmentId,
    pub payment_type: PaymentKind,
    pub strategy: PaymentStrategy,
}

/// A freshly created payment intent with its method-specific payload.
///
/// Exactly one of the payload shapes is populated: QR code and copy-paste
/// code for direct Pix, or a checkout URL for the hosted flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentDto {
    pub payment_intent_id: PaymentIntentId,
    pub appointment_id: AppointmentId,
    pub status: PaymentIntentStatus,
    #[serde(default)]
    pub qr_code_image: Option<String>,
    #[serde(default)]
    pub copy_paste_code: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
}

/// A payment intent's current status, as returned by the poll endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentSnapshot {
    pub payment_intent_id: PaymentIntentId,
    pub appointment_id: AppointmentId,
    pub status: PaymentIntentStatus,
}

/// A stored appointment as the backend lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub services: Vec<ServiceSnapshotDto>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub payment_type: PaymentKind,
    pub payment_mode: PaymentMode,
    pub reminder_minutes: u32,
    pub status: AppointmentStatus,
    pub paid: bool,
}

/// A snapshotted service inside an [`AppointmentRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshotDto {
    pub service_id: ServiceId,
    pub name: String,
    pub duration_minutes: u32,
    pub price_cents: i64,
}

impl From<ServiceSnapshotDto> for ServiceSnapshot {
    fn from(dto: ServiceSnapshotDto) -> Self {
        ServiceSnapshot {
            service_id: dto.service_id,
            name: dto.name,
            duration_minutes: dto.duration_minutes,
            price: Money::from_cents(dto.price_cents),
        }
    }
}

impl AppointmentRecord {
    /// Combined date and start time, when the time string parses.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let slot = TimeSlot::parse(&self.start_time).ok()?;
        Some(self.date.and_time(slot.time()))
    }

    /// Converts the record into the domain appointment model.
    pub fn into_appointment(self) -> Result<Appointment, ApiError> {
        let start = TimeSlot::parse(&self.start_time)
            .map_err(|e| ApiError::Payload(e.to_string()))?
            .time();
        let end = TimeSlot::parse(&self.end_time)
            .map_err(|e| ApiError::Payload(e.to_string()))?
            .time();

        Appointment::hydrate(
            self.id,
            self.customer_id,
            self.customer_name,
            self.services.into_iter().map(Into::into).collect(),
            self.date,
            start,
            end,
            self.payment_type,
            self.payment_mode,
            self.paid,
            self.status,
            self.reminder_minutes,
        )
        .map_err(|e| ApiError::Payload(e.to_string()))
    }
}
