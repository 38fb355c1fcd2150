//! Booking domain types.

mod appointment;
mod cancellation;
mod catalog;
mod draft;
mod money;
mod schedule;

pub use appointment::{
    Appointment, AppointmentError, AppointmentStatus, PaymentKind, PaymentMode, ServiceSnapshot,
    sort_history, sort_upcoming,
};
pub use cancellation::{ActorRole, CancellationDecision, CancellationPolicy, DenialReason};
pub use catalog::{Service, ServiceSelection};
pub use draft::{
    AppointmentDraft, CustomerRef, DraftError, REMINDER_PRESETS_MINUTES, ReminderChoice,
    StaffBooking,
};
pub use money::Money;
pub use schedule::{BookingDate, ScheduleError, SlotList, TimeSlot};
