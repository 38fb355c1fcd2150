//! Cancellation policy engine.
//!
//! Pure and deterministic: every decision takes `now` explicitly so the
//! rules can be unit-tested against fixed clocks. Staff and customers get
//! different rules; the same engine serves both so the two screens cannot
//! drift apart.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::appointment::{Appointment, AppointmentStatus};

/// Who is asking to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    /// The customer who owns the appointment.
    Customer,
    /// Shop staff.
    Staff,
}

/// Why a cancellation was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Only scheduled appointments can be canceled.
    NotCancellable(AppointmentStatus),

    /// The appointment's date/time could not be validated.
    UnverifiableTiming,

    /// The start time is already in the past.
    AlreadyPassed,

    /// Too close to the start time.
    InsideWindow {
        /// The policy window in hours.
        window_hours: i64,
    },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::NotCancellable(status) => {
                write!(f, "appointment is {status}, not in a cancellable state")
            }
            DenialReason::UnverifiableTiming => {
                write!(f, "could not validate the appointment date and time")
            }
            DenialReason::AlreadyPassed => write!(f, "the appointment time has already passed"),
            DenialReason::InsideWindow { window_hours } => write!(
                f,
                "cancellation is allowed only up to {window_hours} hours before the start time"
            ),
        }
    }
}

/// The outcome of a cancellation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationDecision {
    /// Whether cancellation is currently allowed.
    pub allowed: bool,

    /// Why it is denied, when it is.
    pub reason: Option<DenialReason>,

    /// Advisory only: the appointment is paid, so canceling requires a
    /// manual refund through the shop. Never blocks the cancellation.
    pub refund_notice: bool,
}

impl CancellationDecision {
    fn allowed(refund_notice: bool) -> Self {
        Self {
            allowed: true,
            reason: None,
            refund_notice,
        }
    }

    fn denied(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            refund_notice: false,
        }
    }
}

/// The cancellation rules for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    window_hours: i64,
}

impl CancellationPolicy {
    /// Creates a policy with the given customer cancellation window.
    pub fn with_window_hours(window_hours: i64) -> Self {
        Self { window_hours }
    }

    /// Returns the customer cancellation window in hours.
    pub fn window_hours(&self) -> i64 {
        self.window_hours
    }

    /// Decides whether `role` may cancel `appointment` at instant `now`.
    pub fn decide(
        &self,
        appointment: &Appointment,
        role: ActorRole,
        now: NaiveDateTime,
    ) -> CancellationDecision {
        self.decide_at(
            appointment.status(),
            appointment.paid(),
            Some(appointment.starts_at()),
            role,
            now,
        )
    }

    /// Rule evaluation against bare parts, for records whose date/time may
    /// have failed to parse (`starts_at = None`).
    ///
    /// Rules, in order: non-scheduled status denies for everyone; staff may
    /// cancel any scheduled appointment regardless of timing; customers are
    /// denied for unverifiable timing, past start times, and start times
    /// closer than the window. Exactly the window before the start is still
    /// allowed.
    pub fn decide_at(
        &self,
        status: AppointmentStatus,
        paid: bool,
        starts_at: Option<NaiveDateTime>,
        role: ActorRole,
        now: NaiveDateTime,
    ) -> CancellationDecision {
        if !status.can_cancel() {
            return CancellationDecision::denied(DenialReason::NotCancellable(status));
        }

        if role == ActorRole::Staff {
            return CancellationDecision::allowed(paid);
        }

        let Some(starts_at) = starts_at else {
            return CancellationDecision::denied(DenialReason::UnverifiableTiming);
        };

        if starts_at <= now {
            return CancellationDecision::denied(DenialReason::AlreadyPassed);
        }

        if starts_at - now < chrono::Duration::hours(self.window_hours) {
            return CancellationDecision::denied(DenialReason::InsideWindow {
                window_hours: self.window_hours,
            });
        }

        CancellationDecision::allowed(paid)
    }
}

impl Default for CancellationPolicy {
    /// The default customer window is two hours.
    fn default() -> Self {
        Self::with_window_hours(2)
    }
}
