//! The appointment model and its status machine.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::{AppointmentId, CustomerId, ServiceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::Money;

/// The status of an appointment in its lifecycle.
///
/// Appointments are never deleted; they only transition status:
/// ```text
/// Scheduled ──┬──► Completed
///             └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    /// The slot is reserved and the appointment is upcoming.
    #[default]
    Scheduled,

    /// The service was delivered (terminal state).
    Completed,

    /// The appointment was canceled (terminal state).
    Canceled,
}

impl AppointmentStatus {
    /// Returns true if the appointment can still be canceled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled)
    }

    /// Returns true if the appointment can be completed in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Canceled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    /// Instant bank transfer.
    Pix,
    /// Credit or debit card.
    Card,
    /// Cash, collected in person.
    Cash,
}

impl PaymentKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Pix => "Pix",
            PaymentKind::Card => "Card",
            PaymentKind::Cash => "Cash",
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether payment happens online up front or in person at the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Paid through the payment gateway before the visit.
    Online,
    /// Paid at the shop.
    PayOnSite,
}

impl PaymentMode {
    /// Returns the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Online => "Online",
            PaymentMode::PayOnSite => "PayOnSite",
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A service as it was at booking time.
///
/// Snapshotted so later catalog edits never change what was sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    /// The catalog service this snapshot was taken from.
    pub service_id: ServiceId,

    /// Service name at booking time.
    pub name: String,

    /// Duration at booking time, in minutes.
    pub duration_minutes: u32,

    /// Price at booking time.
    pub price: Money,
}

/// Errors that can occur during appointment operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppointmentError {
    /// An appointment must reference at least one service.
    #[error("Appointment has no services")]
    NoServices,

    /// The appointment is not in the expected status.
    #[error("Invalid status transition: cannot {action} from {current_status} status")]
    InvalidStatusTransition {
        current_status: AppointmentStatus,
        action: &'static str,
    },
}

/// The durable reservation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique appointment identifier.
    id: AppointmentId,

    /// Registered customer, when known.
    customer_id: Option<CustomerId>,

    /// Display name shown on schedules; walk-ins carry only this.
    customer_name: String,

    /// Services snapshotted at booking time. Never empty.
    services: Vec<ServiceSnapshot>,

    /// The booked calendar date.
    date: NaiveDate,

    /// Start of the reserved interval.
    start_time: NaiveTime,

    /// End of the reserved interval; fixed at creation.
    end_time: NaiveTime,

    /// How the customer pays.
    payment_kind: PaymentKind,

    /// Online up-front or in person.
    payment_mode: PaymentMode,

    /// Whether payment has been confirmed.
    paid: bool,

    /// Current lifecycle status.
    status: AppointmentStatus,

    /// Reminder lead time in minutes; 0 disables the reminder.
    reminder_minutes: u32,
}

impl Appointment {
    /// Creates a scheduled appointment.
    ///
    /// The end time is computed here, once, as start plus the combined
    /// duration of the snapshotted services; it is never recomputed even if
    /// catalog durations change later.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AppointmentId,
        customer_id: Option<CustomerId>,
        customer_name: impl Into<String>,
        services: Vec<ServiceSnapshot>,
        date: NaiveDate,
        start_time: NaiveTime,
        payment_kind: PaymentKind,
        payment_mode: PaymentMode,
        paid: bool,
        reminder_minutes: u32,
    ) -> Result<Self, AppointmentError> {
        if services.is_empty() {
            return Err(AppointmentError::NoServices);
        }

        let end_time = Self::end_for(start_time, &services);

        Ok(Self {
            id,
            customer_id,
            customer_name: customer_name.into(),
            services,
            date,
            start_time,
            end_time,
            payment_kind,
            payment_mode,
            paid,
            status: AppointmentStatus::Scheduled,
            reminder_minutes,
        })
    }

    /// Rebuilds an appointment from a record fetched from the backend.
    ///
    /// Unlike [`Appointment::new`] this trusts the stored end time and
    /// status instead of recomputing them; the backend is the system of
    /// record for bookings it already holds.
    #[allow(clippy::too_many_arguments)]
    pub fn hydrate(
        id: AppointmentId,
        customer_id: Option<CustomerId>,
        customer_name: impl Into<String>,
        services: Vec<ServiceSnapshot>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        payment_kind: PaymentKind,
        payment_mode: PaymentMode,
        paid: bool,
        status: AppointmentStatus,
        reminder_minutes: u32,
    ) -> Result<Self, AppointmentError> {
        if services.is_empty() {
            return Err(AppointmentError::NoServices);
        }

        Ok(Self {
            id,
            customer_id,
            customer_name: customer_name.into(),
            services,
            date,
            start_time,
            end_time,
            payment_kind,
            payment_mode,
            paid,
            status,
            reminder_minutes,
        })
    }

    /// Computes the end of the reserved interval for a start time and a set
    /// of snapshotted services.
    pub fn end_for(start_time: NaiveTime, services: &[ServiceSnapshot]) -> NaiveTime {
        let total: i64 = services.iter().map(|s| i64::from(s.duration_minutes)).sum();
        start_time + chrono::Duration::minutes(total)
    }

    /// Returns the appointment ID.
    pub fn id(&self) -> AppointmentId {
        self.id
    }

    /// Returns the registered customer, if any.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the customer display name.
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Returns the snapshotted services.
    pub fn services(&self) -> &[ServiceSnapshot] {
        &self.services
    }

    /// Returns the booked date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the start of the reserved interval.
    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    /// Returns the end of the reserved interval.
    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    /// Returns the booked date and start time combined.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// Returns the payment kind.
    pub fn payment_kind(&self) -> PaymentKind {
        self.payment_kind
    }

    /// Returns the payment mode.
    pub fn payment_mode(&self) -> PaymentMode {
        self.payment_mode
    }

    /// Returns true if payment has been confirmed.
    pub fn paid(&self) -> bool {
        self.paid
    }

    /// Returns the current status.
    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    /// Returns the reminder lead time in minutes.
    pub fn reminder_minutes(&self) -> u32 {
        self.reminder_minutes
    }

    /// Returns the total price of the snapshotted services.
    pub fn total_price(&self) -> Money {
        self.services.iter().map(|s| s.price).sum()
    }

    /// Cancels the appointment.
    pub fn cancel(&mut self) -> Result<(), AppointmentError> {
        if !self.status.can_cancel() {
            return Err(AppointmentError::InvalidStatusTransition {
                current_status: self.status,
                action: "cancel",
            });
        }
        self.status = AppointmentStatus::Canceled;
        Ok(())
    }

    /// Marks the appointment as completed.
    pub fn complete(&mut self) -> Result<(), AppointmentError> {
        if !self.status.can_complete() {
            return Err(AppointmentError::InvalidStatusTransition {
                current_status: self.status,
                action: "complete",
            });
        }
        self.status = AppointmentStatus::Completed;
        Ok(())
    }

    /// Marks payment as confirmed.
    pub fn mark_paid(&mut self) {
        self.paid = true;
    }
}

/// Orders appointments for an "upcoming" view: soonest first.
pub fn sort_upcoming(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| a.starts_at());
}

/// Orders appointments for a history view: most recent first.
pub fn sort_history(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| std::cmp::Reverse(a.starts_at()));
}
