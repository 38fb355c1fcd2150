//! Workflow configuration loaded from environment variables.

use std::time::Duration;

use chrono::Weekday;

/// Where the flow is running; decides how checkout redirects open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceContext {
    /// A regular browser window with room for a second tab.
    #[default]
    Desktop,
    /// A mobile or embedded webview; redirects replace the current page.
    Mobile,
}

/// Workflow tuning knobs with sensible defaults.
///
/// Reads from environment variables:
/// - `SLOT_DEBOUNCE_MS` — delay before an availability fetch (default: `180`)
/// - `SLOT_TOLERANCE_MINUTES` — how close to now a slot may still be offered
///   today (default: `0`)
/// - `REQUEST_TIMEOUT_MS` — availability request timeout (default: `10000`)
/// - `PAYMENT_POLL_INTERVAL_MS` — payment status poll cadence (default: `4000`)
/// - `CANCEL_WINDOW_HOURS` — customer cancellation window (default: `2`)
/// - `CLOSED_WEEKDAY` — the shop's closed day (default: `"Sunday"`)
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub slot_debounce: Duration,
    pub slot_tolerance_minutes: u32,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub cancellation_window_hours: i64,
    pub closed_weekday: Weekday,
    pub device: DeviceContext,
}

impl WorkflowConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// The device context has no environment form; callers set it from
    /// whatever the embedding application knows about its runtime.
    pub fn from_env() -> Self {
        Self {
            slot_debounce: Duration::from_millis(env_u64("SLOT_DEBOUNCE_MS", 180)),
            slot_tolerance_minutes: env_u64("SLOT_TOLERANCE_MINUTES", 0) as u32,
            request_timeout: Duration::from_millis(env_u64("REQUEST_TIMEOUT_MS", 10_000)),
            poll_interval: Duration::from_millis(env_u64("PAYMENT_POLL_INTERVAL_MS", 4_000)),
            cancellation_window_hours: env_u64("CANCEL_WINDOW_HOURS", 2) as i64,
            closed_weekday: std::env::var("CLOSED_WEEKDAY")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(Weekday::Sun),
            device: DeviceContext::default(),
        }
    }

    /// Sets the device context.
    pub fn with_device(mut self, device: DeviceContext) -> Self {
        self.device = device;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            slot_debounce: Duration::from_millis(180),
            slot_tolerance_minutes: 0,
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(4),
            cancellation_window_hours: 2,
            closed_weekday: Weekday::Sun,
            device: DeviceContext::Desktop,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
