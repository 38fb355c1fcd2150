//! Booking domain for the barbershop workflow.
//!
//! This crate provides the pure domain layer:
//! - Service catalog types and the toggle-based service selection
//! - Booking dates, time slots, and the slot list with today filtering
//! - The appointment model with its status machine
//! - Draft validation for appointment creation
//! - The cancellation policy engine
//!
//! Nothing in this crate performs I/O; all clock-dependent logic takes `now`
//! explicitly so it can be tested against fixed instants.

pub mod booking;

pub use booking::{
    ActorRole, Appointment, AppointmentDraft, AppointmentError, AppointmentStatus, BookingDate,
    CancellationDecision, CancellationPolicy, CustomerRef, DenialReason, DraftError, Money,
    PaymentKind, PaymentMode, REMINDER_PRESETS_MINUTES, ReminderChoice, ScheduleError, Service,
    ServiceSelection, ServiceSnapshot, SlotList, StaffBooking, TimeSlot, sort_history,
    sort_upcoming,
};
