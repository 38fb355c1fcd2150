//! Draft validation for appointment creation.
//!
//! A draft collects everything the booking flow has gathered so far and is
//! checked client-side before any network request is made.

use common::CustomerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::appointment::{PaymentKind, PaymentMode, ServiceSnapshot};
use super::schedule::{BookingDate, SlotList, TimeSlot};

/// Preset reminder lead times offered by the flow, in minutes.
pub const REMINDER_PRESETS_MINUTES: [u32; 6] = [0, 15, 30, 60, 120, 1440];

/// Reminder lead time before the appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderChoice {
    /// One of the preset lead times.
    Preset(u32),
    /// A free-form lead time in minutes.
    Custom(u32),
}

impl ReminderChoice {
    /// Returns the lead time in minutes; 0 means no reminder.
    pub fn minutes(&self) -> u32 {
        match *self {
            ReminderChoice::Preset(m) | ReminderChoice::Custom(m) => m,
        }
    }
}

impl Default for ReminderChoice {
    fn default() -> Self {
        ReminderChoice::Preset(30)
    }
}

/// Who the appointment is for when staff books it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerRef {
    /// A registered customer matched by search.
    Known(CustomerId),
    /// A walk-in without a customer record.
    WalkIn {
        /// Name as given at the counter.
        name: String,
        /// Contact phone, when provided.
        phone: Option<String>,
    },
}

/// Staff-only booking extras: explicit customer identity and a direct
/// paid flag, since staff collects cash or card in person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffBooking {
    /// Who the appointment is for.
    pub customer: CustomerRef,
    /// Set when payment was already collected.
    pub paid: bool,
}

/// Errors raised by draft validation. None of these ever reach the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    /// At least one service must be selected.
    #[error("No services selected")]
    NoServices,

    /// A date must be chosen before a time.
    #[error("No date selected")]
    NoDate,

    /// A start time must be chosen.
    #[error("No time slot selected")]
    NoSlot,

    /// The chosen slot is not in the current availability list.
    #[error("Selected slot {slot} is not in the available list")]
    SlotNotAvailable { slot: TimeSlot },

    /// The availability list was fetched for a different date.
    #[error("Available slots are for {fetched}, not {chosen}")]
    SlotsOutOfDate {
        fetched: chrono::NaiveDate,
        chosen: chrono::NaiveDate,
    },

    /// Cash cannot be paid online.
    #[error("Online payment is not available for cash; pick Pix or card")]
    CashNotPayableOnline,

    /// Walk-in bookings need a customer name.
    #[error("Walk-in bookings need a customer name")]
    MissingCustomerName,
}

/// A fully specified booking request, validated but not yet submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    /// Services snapshotted from the catalog at selection time.
    pub services: Vec<ServiceSnapshot>,

    /// The validated booking date.
    pub date: BookingDate,

    /// The chosen start time.
    pub slot: TimeSlot,

    /// How the customer pays.
    pub payment_kind: PaymentKind,

    /// Online up-front or in person.
    pub payment_mode: PaymentMode,

    /// Reminder lead time.
    pub reminder: ReminderChoice,

    /// Present only for staff-entered bookings.
    pub staff: Option<StaffBooking>,
}

impl AppointmentDraft {
    /// Validates the draft against the last-fetched slot list.
    ///
    /// All preconditions must hold before any request is sent: non-empty
    /// services, slot present in the list fetched for this exact date, and a
    /// payment kind compatible with the mode.
    pub fn validate(&self, slots: &SlotList) -> Result<(), DraftError> {
        if self.services.is_empty() {
            return Err(DraftError::NoServices);
        }

        if slots.date() != self.date.date() {
            return Err(DraftError::SlotsOutOfDate {
                fetched: slots.date(),
                chosen: self.date.date(),
            });
        }

        if !slots.contains(self.slot) {
            return Err(DraftError::SlotNotAvailable { slot: self.slot });
        }

        if self.payment_mode == PaymentMode::Online && self.payment_kind == PaymentKind::Cash {
            return Err(DraftError::CashNotPayableOnline);
        }

        if let Some(staff) = &self.staff {
            if let CustomerRef::WalkIn { name, .. } = &staff.customer {
                if name.trim().is_empty() {
                    return Err(DraftError::MissingCustomerName);
                }
            }
        }

        Ok(())
    }

    /// Combined duration of the drafted services, in minutes.
    pub fn combined_duration(&self) -> u32 {
        self.services.iter().map(|s| s.duration_minutes).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use common::ServiceId;

    use super::*;
    use crate::booking::Money;

    fn snapshot(minutes: u32) -> ServiceSnapshot {
        ServiceSnapshot {
            service_id: ServiceId::new(),
            name: "Corte".to_string(),
            duration_minutes: minutes,
            price: Money::from_reais(45),
        }
    }

    fn slots_for(date: &str, times: &[&str]) -> SlotList {
        let times: Vec<String> = times.iter().map(|s| s.to_string()).collect();
        SlotList::from_times(
            date.parse().unwrap(),
            &times,
            "2025-06-01T08:00:00".parse().unwrap(),
            0,
        )
        .unwrap()
    }

    fn draft(date: &str, slot: &str) -> AppointmentDraft {
        let date: chrono::NaiveDate = date.parse().unwrap();
        AppointmentDraft {
            services: vec![snapshot(30)],
            date: BookingDate::try_new(date, "2025-06-02".parse().unwrap(), Weekday::Sun).unwrap(),
            slot: TimeSlot::parse(slot).unwrap(),
            payment_kind: PaymentKind::Pix,
            payment_mode: PaymentMode::PayOnSite,
            reminder: ReminderChoice::default(),
            staff: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        let d = draft("2025-06-10", "10:00");
        let slots = slots_for("2025-06-10", &["09:00", "10:00"]);
        assert!(d.validate(&slots).is_ok());
    }

    #[test]
    fn test_empty_services_rejected() {
        let mut d = draft("2025-06-10", "10:00");
        d.services.clear();
        let slots = slots_for("2025-06-10", &["10:00"]);
        assert_eq!(d.validate(&slots), Err(DraftError::NoServices));
    }

    #[test]
    fn test_slot_must_be_in_current_list() {
        let d = draft("2025-06-10", "10:30");
        let slots = slots_for("2025-06-10", &["09:00", "10:00"]);
        assert!(matches!(
            d.validate(&slots),
            Err(DraftError::SlotNotAvailable { .. })
        ));
    }

    #[test]
    fn test_slots_fetched_for_other_date_rejected() {
        let d = draft("2025-06-10", "10:00");
        let slots = slots_for("2025-06-11", &["10:00"]);
        assert!(matches!(
            d.validate(&slots),
            Err(DraftError::SlotsOutOfDate { .. })
        ));
    }

    #[test]
    fn test_cash_online_rejected() {
        let mut d = draft("2025-06-10", "10:00");
        d.payment_kind = PaymentKind::Cash;
        d.payment_mode = PaymentMode::Online;
        let slots = slots_for("2025-06-10", &["10:00"]);
        assert_eq!(d.validate(&slots), Err(DraftError::CashNotPayableOnline));
    }

    #[test]
    fn test_walk_in_needs_name() {
        let mut d = draft("2025-06-10", "10:00");
        d.staff = Some(StaffBooking {
            customer: CustomerRef::WalkIn {
                name: "  ".to_string(),
                phone: None,
            },
            paid: true,
        });
        let slots = slots_for("2025-06-10", &["10:00"]);
        assert_eq!(d.validate(&slots), Err(DraftError::MissingCustomerName));
    }

    #[test]
    fn test_reminder_default_and_presets() {
        assert_eq!(ReminderChoice::default().minutes(), 30);
        assert!(REMINDER_PRESETS_MINUTES.contains(&1440));
        assert_eq!(ReminderChoice::Custom(45).minutes(), 45);
    }
}
