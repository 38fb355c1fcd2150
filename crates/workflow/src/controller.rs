//! The booking flow controller.
//!
//! Drives the linear steps `Services → Date → Time → (Reminder) → Payment`
//! and owns the cascade rules between them: changing services or the date
//! throws away the slot list, the chosen slot, and any in-flight payment;
//! changing the slot, payment selection, or reminder resets only the
//! payment. One error message is visible at a time; every new action clears
//! the previous one.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use client::{AppointmentRecord, BookingApi};
use common::{AppointmentId, ServiceId};
use domain::{
    ActorRole, Appointment, AppointmentDraft, AppointmentStatus, BookingDate, CancellationDecision,
    CancellationPolicy, DraftError, PaymentKind, PaymentMode, ReminderChoice, Service,
    ServiceSelection, ServiceSnapshot, SlotList, StaffBooking, TimeSlot, sort_history,
    sort_upcoming,
};
use tokio::sync::Mutex;

use crate::availability::AvailabilityResolver;
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::payment::{CheckoutState, PaymentLaunch, PaymentOrchestrator, PaymentOutcome};
use crate::reservation::ReservationCreator;
use crate::session::SessionStore;
use crate::slots::{SlotApply, SlotBoard};

/// The time source for every date/time rule in the flow.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Which steps the actor may currently take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepGates {
    /// At least one service is selected.
    pub can_pick_date: bool,
    /// A date is chosen and the board holds a non-empty slot list.
    pub can_pick_slot: bool,
    /// A slot is chosen; the booking can be confirmed or paid.
    pub can_confirm: bool,
}

/// The actor's appointments, split and ordered for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppointmentsView {
    /// Scheduled appointments that have not started yet, soonest first.
    pub upcoming: Vec<Appointment>,
    /// Everything else, most recent first.
    pub history: Vec<Appointment>,
}

/// One booking session from catalog load to confirmation.
pub struct BookingFlow {
    api: Arc<dyn BookingApi>,
    config: WorkflowConfig,
    clock: Clock,
    policy: CancellationPolicy,

    catalog: Vec<Service>,
    selection: ServiceSelection,
    date: Option<BookingDate>,
    board: Arc<Mutex<SlotBoard>>,
    resolver: AvailabilityResolver,
    reservations: ReservationCreator,
    payment: PaymentOrchestrator,

    payment_kind: PaymentKind,
    payment_mode: PaymentMode,
    reminder: ReminderChoice,
    staff: Option<StaffBooking>,

    error: Option<String>,
}

impl BookingFlow {
    /// Creates a flow over the given API and session store, using the
    /// system clock.
    pub fn new(
        api: Arc<dyn BookingApi>,
        session: Arc<dyn SessionStore>,
        config: WorkflowConfig,
    ) -> Self {
        Self::with_clock(
            api,
            session,
            config,
            Arc::new(|| chrono::Local::now().naive_local()),
        )
    }

    /// Creates a flow with an explicit time source.
    pub fn with_clock(
        api: Arc<dyn BookingApi>,
        session: Arc<dyn SessionStore>,
        config: WorkflowConfig,
        clock: Clock,
    ) -> Self {
        let board = Arc::new(Mutex::new(SlotBoard::new()));
        Self {
            resolver: AvailabilityResolver::new(Arc::clone(&api), Arc::clone(&board), &config),
            reservations: ReservationCreator::new(Arc::clone(&api)),
            payment: PaymentOrchestrator::new(Arc::clone(&api), session, &config),
            policy: CancellationPolicy::with_window_hours(config.cancellation_window_hours),
            board,
            api,
            clock,
            config,
            catalog: Vec::new(),
            selection: ServiceSelection::new(),
            date: None,
            payment_kind: PaymentKind::Pix,
            payment_mode: PaymentMode::PayOnSite,
            reminder: ReminderChoice::default(),
            staff: None,
            error: None,
        }
    }

    /// The currently visible error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The loaded service catalog.
    pub fn catalog(&self) -> &[Service] {
        &self.catalog
    }

    /// The current service selection.
    pub fn selection(&self) -> &ServiceSelection {
        &self.selection
    }

    /// The chosen booking date, if any.
    pub fn chosen_date(&self) -> Option<NaiveDate> {
        self.date.map(|d| d.date())
    }

    /// The current checkout state.
    pub fn payment_state(&self) -> CheckoutState {
        self.payment.state()
    }

    /// Which steps are currently open.
    pub async fn gates(&self) -> StepGates {
        let board = self.board.lock().await;
        let has_slots = board.available().is_some_and(|list| !list.is_empty());
        StepGates {
            can_pick_date: !self.selection.is_empty(),
            can_pick_slot: self.date.is_some() && has_slots,
            can_confirm: board.selected().is_some(),
        }
    }

    /// Loads the active service catalog.
    pub async fn load_catalog(&mut self) -> Result<&[Service], WorkflowError> {
        self.error = None;
        match self.api.list_active_services().await {
            Ok(dtos) => {
                self.catalog = dtos.into_iter().map(Service::from).collect();
                tracing::info!(services = self.catalog.len(), "catalog loaded");
                Ok(&self.catalog)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// Toggles a service and invalidates everything downstream.
    ///
    /// When a date is already chosen and the selection is still non-empty,
    /// the slot list is re-fetched for the new selection.
    pub async fn toggle_service(&mut self, id: ServiceId) -> Result<bool, WorkflowError> {
        self.error = None;
        let selected = self.selection.toggle(id);
        self.invalidate_downstream().await;

        if self.date.is_some() && !self.selection.is_empty() {
            self.refresh_slots().await?;
        }
        Ok(selected)
    }

    /// Chooses the booking date and fetches its availability.
    pub async fn choose_date(&mut self, date: NaiveDate) -> Result<(), WorkflowError> {
        self.error = None;
        if self.selection.is_empty() {
            return Err(self.surface(WorkflowError::Validation(DraftError::NoServices)));
        }

        let today = self.now().date();
        let date = BookingDate::try_new(date, today, self.config.closed_weekday)
            .map_err(WorkflowError::from);
        let date = match date {
            Ok(date) => date,
            Err(error) => return Err(self.surface(error)),
        };

        self.date = Some(date);
        self.invalidate_downstream().await;
        self.refresh_slots().await?;
        Ok(())
    }

    /// Re-fetches the slot list for the current date and selection.
    pub async fn refresh_slots(&mut self) -> Result<SlotApply, WorkflowError> {
        self.error = None;
        let Some(date) = self.date else {
            return Err(self.surface(WorkflowError::Validation(DraftError::NoDate)));
        };

        let service_ids: Vec<ServiceId> = self.selection.ids().collect();
        let now = self.now();
        match self.resolver.refresh(date.date(), service_ids, now).await {
            Ok(apply) => Ok(apply),
            Err(error) => Err(self.surface(error)),
        }
    }

    /// The currently visible slot list.
    pub async fn available_slots(&self) -> Option<SlotList> {
        self.board.lock().await.available().cloned()
    }

    /// The chosen slot, when one is chosen and still valid.
    pub async fn chosen_slot(&self) -> Option<TimeSlot> {
        self.board.lock().await.selected()
    }

    /// Chooses a start time from the visible list.
    pub async fn choose_slot(&mut self, slot: TimeSlot) -> Result<(), WorkflowError> {
        self.error = None;
        let selected = self.board.lock().await.select(slot);
        if let Err(error) = selected {
            return Err(self.surface(error.into()));
        }
        self.payment.reset().await;
        Ok(())
    }

    /// Sets how the booking is paid. Resets any in-flight payment.
    pub async fn set_payment(&mut self, kind: PaymentKind, mode: PaymentMode) {
        self.error = None;
        self.payment_kind = kind;
        self.payment_mode = mode;
        self.payment.reset().await;
    }

    /// Sets the reminder lead time. Resets any in-flight payment.
    pub async fn set_reminder(&mut self, reminder: ReminderChoice) {
        self.error = None;
        self.reminder = reminder;
        self.payment.reset().await;
    }

    /// Sets or clears the staff booking extras (explicit customer, direct
    /// paid flag).
    pub fn set_staff_booking(&mut self, staff: Option<StaffBooking>) {
        self.staff = staff;
    }

    /// Confirms a pay-on-site booking (customer or staff).
    ///
    /// A slot conflict forces a fresh availability fetch so the actor picks
    /// from a current list.
    pub async fn confirm_on_site(&mut self) -> Result<AppointmentId, WorkflowError> {
        self.error = None;
        if self.payment_mode == PaymentMode::Online {
            return Err(self.surface(WorkflowError::OnlineModeSelected));
        }

        let (draft, slots) = match self.build_draft().await {
            Ok(parts) => parts,
            Err(error) => return Err(self.surface(error)),
        };
        match self.reservations.create(&draft, &slots).await {
            Ok(id) => {
                metrics::counter!("bookings_confirmed_total").increment(1);
                Ok(id)
            }
            Err(error) => Err(self.after_create_failure(error).await),
        }
    }

    /// Starts the online payment for the drafted booking.
    pub async fn start_online_payment(&mut self) -> Result<PaymentLaunch, WorkflowError> {
        self.error = None;
        if self.payment_mode != PaymentMode::Online {
            return Err(self.surface(WorkflowError::IncompatiblePayment));
        }

        let (draft, slots) = match self.build_draft().await {
            Ok(parts) => parts,
            Err(error) => return Err(self.surface(error)),
        };
        match self.payment.start(&draft, &slots).await {
            Ok(launch) => Ok(launch),
            Err(error) => Err(self.after_create_failure(error).await),
        }
    }

    /// Polls the in-flight payment until it ends. `Failed` and `Canceled`
    /// terminals surface as errors.
    pub async fn await_payment(&mut self) -> Result<PaymentOutcome, WorkflowError> {
        self.error = None;
        match self.payment.poll_until_terminal().await {
            Ok(PaymentOutcome::Paid) => {
                metrics::counter!("bookings_confirmed_total").increment(1);
                Ok(PaymentOutcome::Paid)
            }
            Ok(PaymentOutcome::Failed) => Err(self.surface(WorkflowError::PaymentFailed)),
            Ok(PaymentOutcome::Canceled) => Err(self.surface(WorkflowError::PaymentCanceled)),
            Err(error) => Err(self.surface(error)),
        }
    }

    /// Checks the in-flight payment once, on demand.
    pub async fn check_payment_now(&mut self) -> Result<Option<PaymentOutcome>, WorkflowError> {
        self.error = None;
        let checked = self.payment.check_now().await;
        self.settle_manual(checked)
    }

    /// Resumes a payment recorded in the session store, as after a checkout
    /// redirect return.
    pub async fn resume_payment(&mut self) -> Result<Option<PaymentOutcome>, WorkflowError> {
        self.error = None;
        let resumed = self.payment.resume().await;
        self.settle_manual(resumed)
    }

    /// Cancels a booked appointment, subject to the cancellation policy.
    ///
    /// The returned decision carries the advisory refund flag for paid
    /// appointments.
    pub async fn cancel_booking(
        &mut self,
        record: &AppointmentRecord,
        role: ActorRole,
    ) -> Result<CancellationDecision, WorkflowError> {
        self.error = None;
        let decision =
            self.policy
                .decide_at(record.status, record.paid, record.starts_at(), role, self.now());

        if let Some(reason) = decision.reason {
            return Err(self.surface(WorkflowError::CancellationDenied(reason)));
        }

        if let Err(error) = self.api.cancel_appointment(record.id).await {
            return Err(self.surface(error.into()));
        }
        metrics::counter!("appointments_canceled_total").increment(1);
        tracing::info!(appointment_id = %record.id, role = ?role, "appointment canceled");
        Ok(decision)
    }

    /// Marks an appointment as completed. Staff only; the backend enforces
    /// the role.
    pub async fn complete_booking(&mut self, id: AppointmentId) -> Result<(), WorkflowError> {
        self.error = None;
        if let Err(error) = self.api.complete_appointment(id).await {
            return Err(self.surface(error.into()));
        }
        Ok(())
    }

    /// Fetches the actor's appointments, split into upcoming and history.
    ///
    /// Records that fail to parse are skipped with a warning rather than
    /// failing the whole listing.
    pub async fn my_appointments(&mut self) -> Result<AppointmentsView, WorkflowError> {
        self.error = None;
        let records = match self.api.list_my_appointments().await {
            Ok(records) => records,
            Err(error) => return Err(self.surface(error.into())),
        };

        let now = self.now();
        let mut view = AppointmentsView::default();
        for record in records {
            let id = record.id;
            match record.into_appointment() {
                Ok(appointment) => {
                    let upcoming = appointment.status() == AppointmentStatus::Scheduled
                        && appointment.starts_at() >= now;
                    if upcoming {
                        view.upcoming.push(appointment);
                    } else {
                        view.history.push(appointment);
                    }
                }
                Err(error) => {
                    tracing::warn!(appointment_id = %id, error = %error, "skipping unparsable record");
                }
            }
        }

        sort_upcoming(&mut view.upcoming);
        sort_history(&mut view.history);
        Ok(view)
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn surface(&mut self, error: WorkflowError) -> WorkflowError {
        self.error = Some(error.to_string());
        error
    }

    /// Clears the board and discards any in-flight payment.
    async fn invalidate_downstream(&mut self) {
        self.board.lock().await.clear();
        self.payment.reset().await;
    }

    async fn after_create_failure(&mut self, error: WorkflowError) -> WorkflowError {
        if matches!(error, WorkflowError::Conflict(_)) {
            // the slot was taken under us; show a current list
            self.board.lock().await.clear();
            if let Err(refresh_error) = self.refresh_slots().await {
                tracing::warn!(error = %refresh_error, "slot re-fetch after conflict failed");
            }
        }
        self.surface(error)
    }

    fn settle_manual(
        &mut self,
        checked: Result<Option<PaymentOutcome>, WorkflowError>,
    ) -> Result<Option<PaymentOutcome>, WorkflowError> {
        match checked {
            Ok(Some(PaymentOutcome::Failed)) => Err(self.surface(WorkflowError::PaymentFailed)),
            Ok(Some(PaymentOutcome::Canceled)) => Err(self.surface(WorkflowError::PaymentCanceled)),
            Ok(other) => Ok(other),
            Err(error) => Err(self.surface(error)),
        }
    }

    async fn build_draft(&self) -> Result<(AppointmentDraft, SlotList), WorkflowError> {
        let date = self
            .date
            .ok_or(WorkflowError::Validation(DraftError::NoDate))?;

        let board = self.board.lock().await;
        let slots = board
            .available()
            .cloned()
            .ok_or(WorkflowError::Validation(DraftError::NoSlot))?;
        let slot = board
            .selected()
            .ok_or(WorkflowError::Validation(DraftError::NoSlot))?;
        drop(board);

        let services: Vec<ServiceSnapshot> = self
            .selection
            .resolve(&self.catalog)
            .into_iter()
            .map(|service| ServiceSnapshot {
                service_id: service.id,
                name: service.name.clone(),
                duration_minutes: service.duration_minutes,
                price: service.price,
            })
            .collect();

        Ok((
            AppointmentDraft {
                services,
                date,
                slot,
                payment_kind: self.payment_kind,
                payment_mode: self.payment_mode,
                reminder: self.reminder,
                staff: self.staff.clone(),
            },
            slots,
        ))
    }
}
