// Playback engine - timed replay of a cached position history
use crate::application::device_api::DeviceApi;
use crate::application::registry::DeviceRegistry;
use crate::application::render_surface::RenderSurface;
use crate::domain::device::{status_for_speed, Position};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Marker key for the transient playback marker, distinct from any device id
/// namespace the backend could produce.
pub const PLAYBACK_MARKER: &str = "__playback";

/// Advance one fix per step.
pub const STEP_INTERVAL: Duration = Duration::from_millis(600);

/// Window fetched when the cached history is too small to replay.
const BACKFILL_LIMIT: usize = 50;

const PLAYBACK_ZOOM: f64 = 14.0;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("device {0} has fewer than two recorded positions")]
    NotEnoughHistory(String),
}

struct PlaybackSession {
    device_id: String,
    task: JoinHandle<()>,
}

/// At most one session is live at a time; starting a new one tears the
/// previous one down first.
pub struct PlaybackEngine {
    api: Arc<dyn DeviceApi>,
    registry: Arc<Mutex<DeviceRegistry>>,
    surface: Arc<dyn RenderSurface>,
    session: Option<PlaybackSession>,
}

impl PlaybackEngine {
    pub fn new(
        api: Arc<dyn DeviceApi>,
        registry: Arc<Mutex<DeviceRegistry>>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            api,
            registry,
            surface,
            session: None,
        }
    }

    /// Replay a device's history oldest to newest. Needs at least two cached
    /// fixes; a short cache triggers one backfill fetch before refusing. The
    /// path overlay keeps the caller's label preference.
    pub async fn start(&mut self, device_id: &str, with_labels: bool) -> Result<(), PlaybackError> {
        self.stop().await;

        let mut path: Vec<Position> = self.registry.lock().await.history(device_id).to_vec();
        if path.len() < 2 {
            let fixes = self.api.get_positions(device_id, BACKFILL_LIMIT).await;
            if !fixes.is_empty() {
                path = fixes.clone();
                self.registry.lock().await.replace_history(device_id, fixes);
            }
        }
        if path.len() < 2 {
            return Err(PlaybackError::NotEnoughHistory(device_id.to_string()));
        }

        // Cached history is newest-first; playback runs the other way
        path.reverse();

        let first = &path[0];
        self.surface.draw_history_trail(&path, with_labels);
        self.surface.upsert_marker(
            PLAYBACK_MARKER,
            first.lat,
            first.lng,
            status_for_speed(first.speed),
        );
        self.surface.focus_on(first.lat, first.lng, PLAYBACK_ZOOM);

        let surface = self.surface.clone();
        let steps = path.len() - 1;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STEP_INTERVAL);
            ticker.tick().await;
            for fix in path.into_iter().skip(1) {
                ticker.tick().await;
                surface.upsert_marker(
                    PLAYBACK_MARKER,
                    fix.lat,
                    fix.lng,
                    status_for_speed(fix.speed),
                );
                surface.focus_on(fix.lat, fix.lng, PLAYBACK_ZOOM);
            }
            tracing::debug!(steps, "playback finished");
        });

        self.session = Some(PlaybackSession {
            device_id: device_id.to_string(),
            task,
        });
        Ok(())
    }

    /// Cancel the step timer and remove the transient marker. By the time
    /// this returns no further update from the session can land. A no-op
    /// without an active session.
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.task.abort();
            let _ = session.task.await;
            self.surface.remove_marker(PLAYBACK_MARKER);
        }
    }

    pub fn active_device(&self) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|s| !s.task.is_finished())
            .map(|s| s.device_id.as_str())
    }
}
