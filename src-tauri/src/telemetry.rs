use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Usage events for one window session. Each window builds its own context
/// when it starts and hands it to whatever records events.
#[derive(Debug)]
pub struct TelemetryContext {
    window: String,
    session_id: Uuid,
    recorded_events: AtomicU64,
}

impl TelemetryContext {
    pub fn new(window: impl Into<String>) -> Self {
        let context = Self {
            window: window.into(),
            session_id: Uuid::new_v4(),
            recorded_events: AtomicU64::new(0),
        };

        tracing::debug!(
            target: "telemetry",
            window = %context.window,
            session_id = %context.session_id,
            "Telemetry session started"
        );

        context
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn recorded_events(&self) -> u64 {
        self.recorded_events.load(Ordering::Relaxed)
    }

    pub fn app_opened(&self) {
        self.record("init", None);
    }

    pub fn settings_opened(&self) {
        self.record("settings", None);
    }

    pub fn settings_changed(&self, setting: &str) {
        self.record("settings_changed", Some(setting));
    }

    pub fn patch_timeline_viewed(&self, patch_count: usize) {
        self.recorded_events.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            target: "telemetry",
            window = %self.window,
            session_id = %self.session_id,
            event = "patch_timeline",
            patch_count,
            "Recorded usage event"
        );
    }

    fn record(&self, event: &'static str, detail: Option<&str>) {
        self.recorded_events.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            target: "telemetry",
            window = %self.window,
            session_id = %self.session_id,
            event,
            detail = detail.unwrap_or_default(),
            "Recorded usage event"
        );
    }
}
