//! Debounced availability fetching.
//!
//! Each call takes a tag from the shared [`SlotBoard`], waits out the
//! debounce, and only then goes to the network; the board decides whether
//! the response is still the one the actor is waiting for.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use client::{BookingApi, SlotsRequest};
use common::ServiceId;
use domain::{DraftError, SlotList};
use tokio::sync::Mutex;

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::slots::{SlotApply, SlotBoard};

/// Fetches slot availability into a shared board.
#[derive(Clone)]
pub struct AvailabilityResolver {
    api: Arc<dyn BookingApi>,
    board: Arc<Mutex<SlotBoard>>,
    debounce: Duration,
    request_timeout: Duration,
    tolerance_minutes: u32,
}

impl AvailabilityResolver {
    /// Creates a resolver over the given API and board.
    pub fn new(
        api: Arc<dyn BookingApi>,
        board: Arc<Mutex<SlotBoard>>,
        config: &WorkflowConfig,
    ) -> Self {
        Self {
            api,
            board,
            debounce: config.slot_debounce,
            request_timeout: config.request_timeout,
            tolerance_minutes: config.slot_tolerance_minutes,
        }
    }

    /// Fetches availability for one (date, services) pair.
    ///
    /// Debounces before sending; a request superseded while debouncing never
    /// reaches the network. A timed-out request counts as a retryable
    /// network failure. Returns [`SlotApply::Stale`] when a newer request
    /// won the board in the meantime.
    #[tracing::instrument(skip(self, service_ids), fields(date = %date))]
    pub async fn refresh(
        &self,
        date: NaiveDate,
        service_ids: Vec<ServiceId>,
        now: NaiveDateTime,
    ) -> Result<SlotApply, WorkflowError> {
        if service_ids.is_empty() {
            return Err(WorkflowError::Validation(DraftError::NoServices));
        }

        let tag = self.board.lock().await.begin();

        tokio::time::sleep(self.debounce).await;
        if !self.board.lock().await.is_current(tag) {
            tracing::debug!("superseded while debouncing, skipping the request");
            return Ok(SlotApply::Stale);
        }

        let request = SlotsRequest { date, service_ids };
        let response = match tokio::time::timeout(
            self.request_timeout,
            self.api.available_slots(&request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                if self.board.lock().await.fail(tag) == SlotApply::Stale {
                    return Ok(SlotApply::Stale);
                }
                return Err(error.into());
            }
            Err(_) => {
                if self.board.lock().await.fail(tag) == SlotApply::Stale {
                    return Ok(SlotApply::Stale);
                }
                return Err(WorkflowError::Network(
                    "availability request timed out".to_string(),
                ));
            }
        };

        let list = SlotList::from_times(response.date, &response.times, now, self.tolerance_minutes)?;
        tracing::debug!(slots = list.len(), "availability fetched");
        Ok(self.board.lock().await.apply(tag, list))
    }
}
