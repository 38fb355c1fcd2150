//! The online payment orchestrator.
//!
//! Online bookings are a two-step transaction: the appointment is created
//! first as a reservation hold, then the payment intent is created against
//! it. When the second step fails the hold is released by a compensating
//! cancellation, so no unpaid reservation blocks the slot.
//!
//! ```text
//! Idle ──► Creating ──► AwaitingPayment ──► Paid
//!             │                │
//!             └────────────────┴──► Idle (failure / cancel / reset)
//! ```

use std::sync::Arc;
use std::time::Duration;

use client::{BookingApi, CreatePaymentIntentRequest, PaymentIntentStatus, PaymentStrategy};
use common::{AppointmentId, PaymentIntentId};
use domain::{AppointmentDraft, SlotList};

use crate::config::{DeviceContext, WorkflowConfig};
use crate::error::WorkflowError;
use crate::reservation::ReservationCreator;
use crate::session::{PendingPayment, SessionStore};

/// Where a checkout redirect should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Open a new tab and keep the flow on screen.
    NewTab,
    /// Replace the current page; the resume flow takes over on return.
    SameTab,
}

impl RedirectTarget {
    /// Picks the target for the device the flow runs on.
    pub fn for_device(device: DeviceContext) -> Self {
        match device {
            DeviceContext::Desktop => RedirectTarget::NewTab,
            DeviceContext::Mobile => RedirectTarget::SameTab,
        }
    }
}

/// Where the orchestrator is in the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    /// No payment in progress.
    #[default]
    Idle,
    /// Creating the appointment hold and the payment intent.
    Creating,
    /// Intent created; waiting for the gateway to confirm.
    AwaitingPayment,
    /// Payment confirmed (terminal).
    Paid,
}

impl CheckoutState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "Idle",
            CheckoutState::Creating => "Creating",
            CheckoutState::AwaitingPayment => "AwaitingPayment",
            CheckoutState::Paid => "Paid",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The gateway confirmed the payment.
    Paid,
    /// The intent was canceled at the gateway.
    Canceled,
    /// The payment was rejected or errored.
    Failed,
}

/// What the actor needs to actually pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLaunch {
    pub appointment_id: AppointmentId,
    pub intent_id: PaymentIntentId,
    /// Base64 QR code image for direct Pix.
    pub qr_code_image: Option<String>,
    /// Pix copy-paste code.
    pub copy_paste_code: Option<String>,
    /// Hosted checkout URL and where to open it, for the redirect flow.
    pub redirect: Option<(String, RedirectTarget)>,
}

/// Drives an online payment from draft to terminal status.
///
/// At most one polling loop can run per orchestrator: polling takes
/// `&mut self`, so a second loop cannot start while one is live, and
/// dropping the future tears the loop down.
pub struct PaymentOrchestrator {
    api: Arc<dyn BookingApi>,
    session: Arc<dyn SessionStore>,
    reservations: ReservationCreator,
    poll_interval: Duration,
    device: DeviceContext,
    state: CheckoutState,
    intent_id: Option<PaymentIntentId>,
    appointment_id: Option<AppointmentId>,
}

impl PaymentOrchestrator {
    /// Creates an idle orchestrator.
    pub fn new(
        api: Arc<dyn BookingApi>,
        session: Arc<dyn SessionStore>,
        config: &WorkflowConfig,
    ) -> Self {
        Self {
            reservations: ReservationCreator::new(Arc::clone(&api)),
            api,
            session,
            poll_interval: config.poll_interval,
            device: config.device,
            state: CheckoutState::Idle,
            intent_id: None,
            appointment_id: None,
        }
    }

    /// Returns the current checkout state.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Returns the in-flight intent id, if any.
    pub fn intent_id(&self) -> Option<PaymentIntentId> {
        self.intent_id
    }

    /// Returns the appointment held for this payment, if any.
    pub fn appointment_id(&self) -> Option<AppointmentId> {
        self.appointment_id
    }

    /// Starts an online payment for the drafted booking.
    ///
    /// Cash is rejected before any request is made. The appointment is
    /// created first as a hold; if the intent cannot be created afterwards
    /// the hold is canceled best-effort and the original error is returned.
    #[tracing::instrument(skip_all, fields(kind = %draft.payment_kind))]
    pub async fn start(
        &mut self,
        draft: &AppointmentDraft,
        slots: &SlotList,
    ) -> Result<PaymentLaunch, WorkflowError> {
        let Some(strategy) = PaymentStrategy::for_kind(draft.payment_kind) else {
            return Err(WorkflowError::IncompatiblePayment);
        };

        self.state = CheckoutState::Creating;
        let appointment_id = match self.reservations.create(draft, slots).await {
            Ok(id) => id,
            Err(error) => {
                self.state = CheckoutState::Idle;
                return Err(error);
            }
        };
        self.appointment_id = Some(appointment_id);

        let request = CreatePaymentIntentRequest {
            appointment_id,
            payment_type: draft.payment_kind,
            strategy,
        };
        let intent = match self.api.create_payment_intent(&request).await {
            Ok(intent) => intent,
            Err(error) => {
                self.compensate(appointment_id).await;
                self.state = CheckoutState::Idle;
                self.appointment_id = None;
                return Err(error.into());
            }
        };

        self.intent_id = Some(intent.payment_intent_id);
        self.session
            .save_pending(PendingPayment {
                intent_id: intent.payment_intent_id,
                appointment_id,
            })
            .await;
        self.state = CheckoutState::AwaitingPayment;

        metrics::counter!("payment_intents_created_total").increment(1);
        tracing::info!(
            intent_id = %intent.payment_intent_id,
            appointment_id = %appointment_id,
            "payment intent created"
        );

        let redirect = intent
            .checkout_url
            .map(|url| (url, RedirectTarget::for_device(self.device)));
        Ok(PaymentLaunch {
            appointment_id,
            intent_id: intent.payment_intent_id,
            qr_code_image: intent.qr_code_image,
            copy_paste_code: intent.copy_paste_code,
            redirect,
        })
    }

    /// Polls the intent status until it reaches a terminal state.
    ///
    /// A failed poll is logged and retried on the next cycle; only the
    /// status itself ends the loop. Dropping the returned future stops
    /// polling without touching the intent.
    pub async fn poll_until_terminal(&mut self) -> Result<PaymentOutcome, WorkflowError> {
        if self.state == CheckoutState::Paid {
            return Ok(PaymentOutcome::Paid);
        }
        let intent_id = self.intent_id.ok_or(WorkflowError::NoActivePayment)?;

        let mut ticker = tokio::time::interval(self.poll_interval);
        // the first tick completes immediately; consume it so every poll
        // waits a full interval
        ticker.tick().await;

        loop {
            ticker.tick().await;
            metrics::counter!("payment_poll_cycles_total").increment(1);

            match self.api.get_payment_intent(intent_id).await {
                Ok(snapshot) => {
                    if let Some(outcome) = self.settle(snapshot.status).await {
                        return Ok(outcome);
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "payment status poll failed, retrying next cycle");
                }
            }
        }
    }

    /// Checks the intent status once, on demand.
    ///
    /// After a known terminal state this short-circuits without a request.
    /// Returns `None` while the payment is still pending.
    pub async fn check_now(&mut self) -> Result<Option<PaymentOutcome>, WorkflowError> {
        if self.state == CheckoutState::Paid {
            return Ok(Some(PaymentOutcome::Paid));
        }
        let intent_id = self.intent_id.ok_or(WorkflowError::NoActivePayment)?;

        let snapshot = self.api.get_payment_intent(intent_id).await?;
        Ok(self.settle(snapshot.status).await)
    }

    /// Picks up a payment recorded in the session store, checks its status
    /// once, and settles it the same way the poller would.
    pub async fn resume(&mut self) -> Result<Option<PaymentOutcome>, WorkflowError> {
        let pending = self
            .session
            .pending()
            .await
            .ok_or(WorkflowError::NoActivePayment)?;

        tracing::info!(intent_id = %pending.intent_id, "resuming payment from session");
        self.intent_id = Some(pending.intent_id);
        self.appointment_id = Some(pending.appointment_id);
        self.state = CheckoutState::AwaitingPayment;
        self.check_now().await
    }

    /// Discards the in-flight payment without canceling anything remotely.
    ///
    /// Used by cascade invalidation: the backend reaps unpaid holds, so the
    /// stale intent is simply forgotten.
    pub async fn reset(&mut self) {
        if self.state != CheckoutState::Idle {
            tracing::debug!(state = %self.state, "discarding in-flight payment");
        }
        self.state = CheckoutState::Idle;
        self.intent_id = None;
        self.appointment_id = None;
        self.session.clear_pending().await;
    }

    async fn settle(&mut self, status: PaymentIntentStatus) -> Option<PaymentOutcome> {
        match status {
            PaymentIntentStatus::Pending => None,
            PaymentIntentStatus::Paid => {
                self.state = CheckoutState::Paid;
                self.session.clear_pending().await;
                metrics::counter!("payments_confirmed_total").increment(1);
                tracing::info!("payment confirmed");
                Some(PaymentOutcome::Paid)
            }
            PaymentIntentStatus::Canceled => {
                self.fail_over().await;
                Some(PaymentOutcome::Canceled)
            }
            PaymentIntentStatus::Failed => {
                self.fail_over().await;
                Some(PaymentOutcome::Failed)
            }
        }
    }

    async fn fail_over(&mut self) {
        tracing::warn!(intent_id = ?self.intent_id, "payment ended without confirmation");
        self.state = CheckoutState::Idle;
        self.intent_id = None;
        self.appointment_id = None;
        self.session.clear_pending().await;
    }

    /// Releases the reservation hold after a failed intent creation.
    /// Best-effort: a failure here is logged, never surfaced over the
    /// original error.
    async fn compensate(&self, appointment_id: AppointmentId) {
        metrics::counter!("payment_compensations_total").increment(1);
        tracing::warn!(appointment_id = %appointment_id, "releasing reservation hold");

        if let Err(error) = self.api.cancel_appointment(appointment_id).await {
            tracing::error!(
                appointment_id = %appointment_id,
                error = %error,
                "compensating cancellation failed"
            );
        }
    }
}
