// Dashboard event loop - refresh timer interleaved with live stream events
use crate::application::tracker::TrackerService;
use crate::infrastructure::stream::StreamEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

pub struct DashboardApp {
    tracker: TrackerService,
    events: mpsc::Receiver<StreamEvent>,
    status: String,
}

impl DashboardApp {
    pub fn new(tracker: TrackerService, events: mpsc::Receiver<StreamEvent>) -> Self {
        Self {
            tracker,
            events,
            status: "Starting".to_string(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Runs forever: refresh ticks and stream events share one cooperative
    /// loop, so registry mutation has a single owner per callback turn.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The immediate first tick; startup already did the initial load
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh_once().await;
                }
                Some(event) = self.events.recv() => {
                    self.apply(event).await;
                }
            }
        }
    }

    /// A failed cycle only moves the status line; it never halts the loop.
    async fn refresh_once(&mut self) {
        match self.tracker.refresh_all().await {
            Ok(count) => {
                self.status = format!("Auto-refreshed ({count} devices)");
            }
            Err(error) => {
                tracing::warn!(%error, "refresh cycle failed");
                self.status = "Failed to load devices".to_string();
            }
        }
    }

    async fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected => {
                self.status = "Live stream connected".to_string();
            }
            StreamEvent::Position(update) => {
                self.tracker.apply_stream_update(update).await;
            }
            StreamEvent::Disconnected => {
                self.status = "Live stream disconnected".to_string();
            }
        }
    }
}
