//! End-to-end booking flow tests against the in-memory backend.

use std::sync::Arc;

use client::{
    AppointmentRecord, InMemoryBookingApi, PaymentIntentStatus, ServiceDto, ServiceSnapshotDto,
};
use common::{AppointmentId, ServiceId};
use domain::{
    ActorRole, AppointmentStatus, CustomerRef, DenialReason, PaymentKind, PaymentMode,
    ReminderChoice, StaffBooking, TimeSlot,
};
use workflow::{
    BookingFlow, CheckoutState, Clock, InMemorySessionStore, PaymentOutcome, SessionStore,
    WorkflowConfig, WorkflowError,
};

// Monday morning; 2025-06-08 is a Sunday, 2025-06-10 a Tuesday.
const NOW: &str = "2025-06-02T08:00:00";

fn fixed_clock() -> Clock {
    Arc::new(|| NOW.parse().unwrap())
}

struct Harness {
    api: InMemoryBookingApi,
    session: Arc<InMemorySessionStore>,
    flow: BookingFlow,
    services: Vec<ServiceDto>,
}

fn harness() -> Harness {
    let api = InMemoryBookingApi::new();
    let services = vec![
        ServiceDto {
            id: ServiceId::new(),
            name: "Corte".to_string(),
            price_cents: 4500,
            duration_minutes: 30,
        },
        ServiceDto {
            id: ServiceId::new(),
            name: "Barba".to_string(),
            price_cents: 3000,
            duration_minutes: 20,
        },
    ];
    api.set_services(services.clone());
    api.set_slots("2025-06-10".parse().unwrap(), &["09:00", "10:00"]);

    let session = Arc::new(InMemorySessionStore::new());
    let flow = BookingFlow::with_clock(
        Arc::new(api.clone()),
        Arc::clone(&session) as Arc<dyn SessionStore>,
        WorkflowConfig::default(),
        fixed_clock(),
    );

    Harness {
        api,
        session,
        flow,
        services,
    }
}

/// Walks the flow to a chosen slot: one service, 2025-06-10, 10:00.
async fn to_chosen_slot(h: &mut Harness) {
    h.flow.load_catalog().await.unwrap();
    h.flow.toggle_service(h.services[0].id).await.unwrap();
    h.flow.choose_date("2025-06-10".parse().unwrap()).await.unwrap();
    h.flow
        .choose_slot(TimeSlot::parse("10:00").unwrap())
        .await
        .unwrap();
}

fn record(
    date: &str,
    start: &str,
    end: &str,
    status: AppointmentStatus,
    paid: bool,
) -> AppointmentRecord {
    AppointmentRecord {
        id: AppointmentId::new(),
        customer_id: None,
        customer_name: "Maria".to_string(),
        services: vec![ServiceSnapshotDto {
            service_id: ServiceId::new(),
            name: "Corte".to_string(),
            duration_minutes: 30,
            price_cents: 4500,
        }],
        date: date.parse().unwrap(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        payment_type: PaymentKind::Pix,
        payment_mode: PaymentMode::PayOnSite,
        reminder_minutes: 30,
        status,
        paid,
    }
}

#[tokio::test(start_paused = true)]
async fn test_pay_on_site_happy_path() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Cash, PaymentMode::PayOnSite).await;
    h.flow.set_reminder(ReminderChoice::Custom(60)).await;

    let id = h.flow.confirm_on_site().await.unwrap();

    assert_eq!(h.api.created_ids(), vec![id]);
    assert_eq!(h.api.intent_count(), 0);
    assert!(h.flow.error().is_none());

    let request = h.api.last_created_request().unwrap();
    assert_eq!(request.date, "2025-06-10".parse().unwrap());
    assert_eq!(request.start_time, "10:00");
    assert_eq!(request.payment_type, PaymentKind::Cash);
    assert_eq!(request.reminder_minutes, 60);
    assert!(request.customer_id.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_online_pix_payment_polls_to_paid() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Pix, PaymentMode::Online).await;

    let launch = h.flow.start_online_payment().await.unwrap();
    assert!(launch.qr_code_image.is_some());
    assert!(launch.redirect.is_none());
    assert_eq!(h.flow.payment_state(), CheckoutState::AwaitingPayment);

    h.api.script_intent_statuses(&[
        PaymentIntentStatus::Pending,
        PaymentIntentStatus::Pending,
        PaymentIntentStatus::Paid,
    ]);

    let outcome = h.flow.await_payment().await.unwrap();
    assert_eq!(outcome, PaymentOutcome::Paid);
    assert_eq!(h.flow.payment_state(), CheckoutState::Paid);
    assert_eq!(h.api.intent_get_count(), 3);
    assert!(h.session.pending().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_intent_failure_cancels_the_held_appointment() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Pix, PaymentMode::Online).await;
    h.api.set_fail_on_create_intent(true);

    let result = h.flow.start_online_payment().await;
    assert!(matches!(result, Err(WorkflowError::Network(_))));

    let created = h.api.created_ids();
    assert_eq!(created.len(), 1);
    assert_eq!(h.api.cancel_count_for(created[0]), 1);
    assert_eq!(h.flow.payment_state(), CheckoutState::Idle);
    assert!(h.flow.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_cash_cannot_be_paid_online() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Cash, PaymentMode::Online).await;

    let result = h.flow.start_online_payment().await;

    assert!(matches!(result, Err(WorkflowError::IncompatiblePayment)));
    assert_eq!(h.api.created_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_online_mode_blocks_plain_confirmation() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Pix, PaymentMode::Online).await;

    let result = h.flow.confirm_on_site().await;

    assert!(matches!(result, Err(WorkflowError::OnlineModeSelected)));
    assert_eq!(h.api.created_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slot_conflict_forces_a_fresh_list() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    let fetches_before = h.api.slots_request_count();
    h.api.set_conflict_on_create(true);

    let result = h.flow.confirm_on_site().await;

    assert!(matches!(result, Err(WorkflowError::Conflict(_))));
    assert_eq!(h.api.slots_request_count(), fetches_before + 1);
    assert!(h.flow.error().unwrap().contains("no longer available"));
    // the stale selection was dropped with the old list
    assert!(h.flow.chosen_slot().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_changing_services_invalidates_downstream_state() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Pix, PaymentMode::Online).await;
    h.flow.start_online_payment().await.unwrap();
    assert_eq!(h.flow.payment_state(), CheckoutState::AwaitingPayment);

    h.flow.toggle_service(h.services[1].id).await.unwrap();

    assert_eq!(h.flow.payment_state(), CheckoutState::Idle);
    assert!(h.flow.chosen_slot().await.is_none());
    assert!(h.session.pending().await.is_none());
    assert!(matches!(
        h.flow.resume_payment().await,
        Err(WorkflowError::NoActivePayment)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_changing_slot_resets_payment_only() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Pix, PaymentMode::Online).await;
    h.flow.start_online_payment().await.unwrap();

    h.flow
        .choose_slot(TimeSlot::parse("09:00").unwrap())
        .await
        .unwrap();

    assert_eq!(h.flow.payment_state(), CheckoutState::Idle);
    assert_eq!(h.flow.chosen_date(), Some("2025-06-10".parse().unwrap()));
    assert!(h.flow.available_slots().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_step_gates_open_in_order() {
    let mut h = harness();
    h.flow.load_catalog().await.unwrap();

    let gates = h.flow.gates().await;
    assert!(!gates.can_pick_date && !gates.can_pick_slot && !gates.can_confirm);

    h.flow.toggle_service(h.services[0].id).await.unwrap();
    assert!(h.flow.gates().await.can_pick_date);
    assert!(!h.flow.gates().await.can_pick_slot);

    h.flow.choose_date("2025-06-10".parse().unwrap()).await.unwrap();
    let gates = h.flow.gates().await;
    assert!(gates.can_pick_slot && !gates.can_confirm);

    h.flow
        .choose_slot(TimeSlot::parse("10:00").unwrap())
        .await
        .unwrap();
    assert!(h.flow.gates().await.can_confirm);
}

#[tokio::test(start_paused = true)]
async fn test_date_rules_are_enforced() {
    let mut h = harness();
    h.flow.load_catalog().await.unwrap();
    h.flow.toggle_service(h.services[0].id).await.unwrap();

    let past = h.flow.choose_date("2025-06-01".parse().unwrap()).await;
    assert!(matches!(past, Err(WorkflowError::Schedule(_))));

    let sunday = h.flow.choose_date("2025-06-08".parse().unwrap()).await;
    assert!(matches!(sunday, Err(WorkflowError::Schedule(_))));
    assert!(h.flow.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_todays_passed_slots_are_hidden() {
    let mut h = harness();
    // now is 08:00; 07:00 has already passed
    h.api
        .set_slots("2025-06-02".parse().unwrap(), &["07:00", "09:00"]);
    h.flow.load_catalog().await.unwrap();
    h.flow.toggle_service(h.services[0].id).await.unwrap();
    h.flow.choose_date("2025-06-02".parse().unwrap()).await.unwrap();

    let slots = h.flow.available_slots().await.unwrap();
    let times: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
    assert_eq!(times, ["09:00"]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_availability_keeps_slot_step_closed() {
    let mut h = harness();
    h.api.set_slots("2025-06-11".parse().unwrap(), &[]);
    h.flow.load_catalog().await.unwrap();
    h.flow.toggle_service(h.services[0].id).await.unwrap();
    h.flow.choose_date("2025-06-11".parse().unwrap()).await.unwrap();

    assert!(!h.flow.gates().await.can_pick_slot);
}

#[tokio::test(start_paused = true)]
async fn test_staff_walk_in_booking_carries_identity_and_paid() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Cash, PaymentMode::PayOnSite).await;
    h.flow.set_staff_booking(Some(StaffBooking {
        customer: CustomerRef::WalkIn {
            name: "Zé".to_string(),
            phone: Some("11 99999-0000".to_string()),
        },
        paid: true,
    }));

    h.flow.confirm_on_site().await.unwrap();

    let request = h.api.last_created_request().unwrap();
    assert_eq!(request.customer_name.as_deref(), Some("Zé"));
    assert_eq!(request.paid, Some(true));
    assert_eq!(h.api.intent_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_redirect_payment_resumes_in_a_new_flow() {
    let mut h = harness();
    h.api.set_checkout_url(Some("https://pay.example.test/c/1"));
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Card, PaymentMode::Online).await;

    let launch = h.flow.start_online_payment().await.unwrap();
    assert!(launch.redirect.is_some());
    drop(h.flow);

    // a fresh flow over the same session store, as after the redirect return
    let mut returned = BookingFlow::with_clock(
        Arc::new(h.api.clone()),
        Arc::clone(&h.session) as Arc<dyn SessionStore>,
        WorkflowConfig::default(),
        fixed_clock(),
    );
    h.api.script_intent_statuses(&[PaymentIntentStatus::Paid]);

    let outcome = returned.resume_payment().await.unwrap();
    assert_eq!(outcome, Some(PaymentOutcome::Paid));
    assert_eq!(returned.payment_state(), CheckoutState::Paid);
}

#[tokio::test(start_paused = true)]
async fn test_manual_check_after_paid_makes_no_request() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Pix, PaymentMode::Online).await;
    h.flow.start_online_payment().await.unwrap();
    h.api.script_intent_statuses(&[PaymentIntentStatus::Paid]);

    assert_eq!(
        h.flow.check_payment_now().await.unwrap(),
        Some(PaymentOutcome::Paid)
    );
    let requests = h.api.intent_get_count();

    assert_eq!(
        h.flow.check_payment_now().await.unwrap(),
        Some(PaymentOutcome::Paid)
    );
    assert_eq!(h.api.intent_get_count(), requests);
}

#[tokio::test(start_paused = true)]
async fn test_failed_payment_surfaces_and_resets() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.flow.set_payment(PaymentKind::Pix, PaymentMode::Online).await;
    h.flow.start_online_payment().await.unwrap();
    h.api.script_intent_statuses(&[PaymentIntentStatus::Failed]);

    let result = h.flow.await_payment().await;

    assert!(matches!(result, Err(WorkflowError::PaymentFailed)));
    assert_eq!(h.flow.payment_state(), CheckoutState::Idle);
    assert!(h.flow.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_customer_cancellation_window() {
    let mut h = harness();

    // now is 08:00; 10:00 is exactly two hours away, the boundary passes
    let boundary = record("2025-06-02", "10:00", "10:30", AppointmentStatus::Scheduled, false);
    let decision = h
        .flow
        .cancel_booking(&boundary, ActorRole::Customer)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(h.api.cancel_count_for(boundary.id), 1);

    // 09:30 is inside the window
    let inside = record("2025-06-02", "09:30", "10:00", AppointmentStatus::Scheduled, false);
    let result = h.flow.cancel_booking(&inside, ActorRole::Customer).await;
    assert!(matches!(
        result,
        Err(WorkflowError::CancellationDenied(
            DenialReason::InsideWindow { window_hours: 2 }
        ))
    ));
    assert_eq!(h.api.cancel_count_for(inside.id), 0);

    // staff ignores the window
    let decision = h
        .flow
        .cancel_booking(&inside, ActorRole::Staff)
        .await
        .unwrap();
    assert!(decision.allowed);
}

#[tokio::test(start_paused = true)]
async fn test_unverifiable_timing_denies_customer_cancellation() {
    let mut h = harness();
    let broken = record("2025-06-10", "not-a-time", "10:00", AppointmentStatus::Scheduled, false);

    let result = h.flow.cancel_booking(&broken, ActorRole::Customer).await;

    assert!(matches!(
        result,
        Err(WorkflowError::CancellationDenied(
            DenialReason::UnverifiableTiming
        ))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_paid_cancellation_carries_refund_notice() {
    let mut h = harness();
    let paid = record("2025-06-10", "10:00", "10:30", AppointmentStatus::Scheduled, true);

    let decision = h
        .flow
        .cancel_booking(&paid, ActorRole::Customer)
        .await
        .unwrap();

    assert!(decision.allowed);
    assert!(decision.refund_notice);
}

#[tokio::test(start_paused = true)]
async fn test_my_appointments_are_split_and_ordered() {
    let mut h = harness();
    let far = record("2025-06-20", "09:00", "09:30", AppointmentStatus::Scheduled, false);
    let soon = record("2025-06-10", "10:00", "10:30", AppointmentStatus::Scheduled, false);
    let past = record("2025-05-20", "10:00", "10:30", AppointmentStatus::Completed, true);
    let older = record("2025-04-01", "10:00", "10:30", AppointmentStatus::Canceled, false);
    let broken = record("2025-06-15", "oops", "10:30", AppointmentStatus::Scheduled, false);
    h.api
        .set_records(vec![far.clone(), past.clone(), soon.clone(), older.clone(), broken]);

    let view = h.flow.my_appointments().await.unwrap();

    let upcoming: Vec<AppointmentId> = view.upcoming.iter().map(|a| a.id()).collect();
    assert_eq!(upcoming, vec![soon.id, far.id]);

    let history: Vec<AppointmentId> = view.history.iter().map(|a| a.id()).collect();
    assert_eq!(history, vec![past.id, older.id]);
}

#[tokio::test(start_paused = true)]
async fn test_one_error_at_a_time() {
    let mut h = harness();
    to_chosen_slot(&mut h).await;
    h.api.set_conflict_on_create(true);

    let _ = h.flow.confirm_on_site().await;
    assert!(h.flow.error().is_some());

    h.api.set_conflict_on_create(false);
    h.flow.refresh_slots().await.unwrap();
    assert!(h.flow.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_complete_booking_reaches_the_backend() {
    let mut h = harness();
    let id = AppointmentId::new();

    h.flow.complete_booking(id).await.unwrap();

    assert_eq!(h.api.completed_ids(), vec![id]);
}
