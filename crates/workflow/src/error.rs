//! The workflow error taxonomy.
//!
//! Every boundary error — draft validation, schedule rules, API failures —
//! is converted into [`WorkflowError`] so the controller has exactly one
//! vocabulary to surface.

use client::ApiError;
use domain::{DenialReason, DraftError, ScheduleError};
use thiserror::Error;

/// Errors surfaced by the booking workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A client-side precondition failed; nothing was sent to the network.
    #[error("{0}")]
    Validation(DraftError),

    /// A date or time failed the schedule rules.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// The chosen payment kind cannot be charged online.
    #[error("Online payment requires Pix or card")]
    IncompatiblePayment,

    /// The slot was taken between the availability check and the booking.
    #[error("Slot no longer available: {0}")]
    Conflict(String),

    /// The payment reached a failed terminal state.
    #[error("Payment was declined")]
    PaymentFailed,

    /// The payment was canceled at the gateway.
    #[error("Payment was canceled")]
    PaymentCanceled,

    /// A transient transport or backend failure; retryable.
    #[error("Network error: {0}")]
    Network(String),

    /// No payment is in progress to poll, check, or resume.
    #[error("No payment in progress")]
    NoActivePayment,

    /// The cancellation policy denied the request.
    #[error("Cancellation denied: {0}")]
    CancellationDenied(DenialReason),

    /// Online payment is selected; the reservation must go through the
    /// payment flow instead of a plain confirmation.
    #[error("Online payment selected; confirm through the payment flow")]
    OnlineModeSelected,
}

impl From<ApiError> for WorkflowError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Conflict(message) => WorkflowError::Conflict(message),
            other => WorkflowError::Network(other.to_string()),
        }
    }
}

impl From<DraftError> for WorkflowError {
    fn from(error: DraftError) -> Self {
        match error {
            DraftError::CashNotPayableOnline => WorkflowError::IncompatiblePayment,
            other => WorkflowError::Validation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_preserved() {
        let error = WorkflowError::from(ApiError::Conflict("slot taken".to_string()));
        assert!(matches!(error, WorkflowError::Conflict(m) if m == "slot taken"));
    }

    #[test]
    fn test_other_api_errors_become_network() {
        let error = WorkflowError::from(ApiError::Unauthorized);
        assert!(matches!(error, WorkflowError::Network(_)));
    }

    #[test]
    fn test_cash_online_maps_to_incompatible_payment() {
        let error = WorkflowError::from(DraftError::CashNotPayableOnline);
        assert!(matches!(error, WorkflowError::IncompatiblePayment));
    }

    #[test]
    fn test_draft_errors_stay_validation() {
        let error = WorkflowError::from(DraftError::NoServices);
        assert!(matches!(
            error,
            WorkflowError::Validation(DraftError::NoServices)
        ));
    }
}
