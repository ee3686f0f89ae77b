// UI panel controller - device list, detail tabs, and user actions
use crate::application::device_api::{ApiError, DeviceApi};
use crate::application::playback::{PlaybackEngine, PlaybackError};
use crate::application::registry::DeviceRegistry;
use crate::application::render_surface::{BaseStyle, RenderSurface};
use crate::application::tracker::TrackerService;
use crate::domain::device::{DeviceDetail, DeviceStatus};
use crate::domain::diagnostics::{battery_display, compass_point, location_source};
use crate::infrastructure::config::SettingsStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Window fetched when a detail panel opens.
pub const HISTORY_LIMIT: usize = 100;

const LOCATE_ZOOM: f64 = 14.0;
const PLACEHOLDER: &str = "\u{2013}";

pub trait Clipboard: Send {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Headless fallback; copying always fails so links surface as notices.
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn set_text(&mut self, _text: &str) -> anyhow::Result<()> {
        anyhow::bail!("clipboard unavailable")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Overview,
    History,
    Diagnostics,
}

#[derive(Debug, Clone)]
pub struct DeviceRow {
    pub id: String,
    pub name: String,
    pub status: DeviceStatus,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct OverviewView {
    pub name: String,
    pub status: DeviceStatus,
    pub last_seen: String,
    pub asset_type: String,
    pub description: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub ts: String,
    pub speed: String,
}

/// Content for a device pin popup. The battery line is omitted when the
/// backend has no reading.
#[derive(Debug, Clone)]
pub struct PopupView {
    pub name: String,
    pub id: String,
    pub status: DeviceStatus,
    pub battery: Option<String>,
    pub last_seen: String,
}

#[derive(Debug, Clone)]
pub struct DiagnosticsView {
    pub battery: String,
    pub heading: &'static str,
    pub location_source: &'static str,
}

struct OpenPanel {
    device_id: String,
    tab: DetailTab,
    detail: Option<DeviceDetail>,
}

pub struct PanelController {
    api: Arc<dyn DeviceApi>,
    tracker: TrackerService,
    registry: Arc<Mutex<DeviceRegistry>>,
    surface: Arc<dyn RenderSurface>,
    playback: PlaybackEngine,
    clipboard: Box<dyn Clipboard>,
    settings: SettingsStore,
    show_labels: bool,
    panel: Option<OpenPanel>,
    notice: Option<String>,
}

impl PanelController {
    pub fn new(
        api: Arc<dyn DeviceApi>,
        tracker: TrackerService,
        surface: Arc<dyn RenderSurface>,
        playback: PlaybackEngine,
        clipboard: Box<dyn Clipboard>,
        settings: SettingsStore,
        show_labels: bool,
    ) -> Self {
        let registry = tracker.registry();
        Self {
            api,
            tracker,
            registry,
            surface,
            playback,
            clipboard,
            settings,
            show_labels,
            panel: None,
            notice: None,
        }
    }

    pub async fn device_rows(&self) -> Vec<DeviceRow> {
        self.registry
            .lock()
            .await
            .devices()
            .map(|d| DeviceRow {
                id: d.id.clone(),
                name: d.display_name().to_string(),
                status: d.status,
                last_seen: d.last_seen,
            })
            .collect()
    }

    /// Open the detail panel for a device: stop any playback, pull a full
    /// history window, draw the trail, focus the map, land on Overview.
    pub async fn select_device(&mut self, device_id: &str) {
        self.playback.stop().await;
        self.notice = None;

        self.tracker.refresh_history(device_id, HISTORY_LIMIT).await;
        let detail = self.api.get_detail(device_id).await;

        {
            let registry = self.registry.lock().await;
            let history = registry.history(device_id);
            if let Some(latest) = history.first() {
                self.surface.draw_history_trail(history, self.show_labels);
                self.surface.focus_on(latest.lat, latest.lng, LOCATE_ZOOM);
            }
        }

        self.panel = Some(OpenPanel {
            device_id: device_id.to_string(),
            tab: DetailTab::Overview,
            detail,
        });
    }

    pub async fn close_panel(&mut self) {
        self.playback.stop().await;
        self.surface.clear_history_trail();
        self.panel = None;
        self.notice = None;
    }

    pub fn set_tab(&mut self, tab: DetailTab) {
        if let Some(panel) = &mut self.panel {
            panel.tab = tab;
        }
    }

    pub fn selected_tab(&self) -> Option<DetailTab> {
        self.panel.as_ref().map(|p| p.tab)
    }

    pub fn selected_device(&self) -> Option<&str> {
        self.panel.as_ref().map(|p| p.device_id.as_str())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Re-center the map on the selected device's last-known fix.
    pub async fn locate(&self) -> bool {
        let Some(panel) = &self.panel else {
            return false;
        };
        let registry = self.registry.lock().await;
        match registry.latest(&panel.device_id) {
            Some(fix) => {
                self.surface.focus_on(fix.lat, fix.lng, LOCATE_ZOOM);
                true
            }
            None => false,
        }
    }

    /// Issue a recovery link and copy it to the clipboard. When the copy
    /// fails the link is surfaced in a visible notice instead; an API
    /// failure propagates since this is a user-initiated action.
    pub async fn create_recovery_link(
        &mut self,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<String>, ApiError> {
        let Some(panel) = &self.panel else {
            return Ok(None);
        };
        let url = self
            .api
            .create_recovery_link(&panel.device_id, expires_at)
            .await?;

        match self.clipboard.set_text(&url) {
            Ok(()) => self.notice = Some("Recovery link copied to clipboard".to_string()),
            Err(error) => {
                tracing::debug!(%error, "clipboard copy failed, showing link instead");
                self.notice = Some(format!("Copy failed, recovery link: {url}"));
            }
        }
        Ok(Some(url))
    }

    pub async fn play(&mut self) -> Result<(), PlaybackError> {
        let Some(device_id) = self.selected_device().map(str::to_string) else {
            return Ok(());
        };
        self.playback.start(&device_id, self.show_labels).await
    }

    pub async fn stop_playback(&mut self) {
        self.playback.stop().await;
    }

    pub fn playback_device(&self) -> Option<&str> {
        self.playback.active_device()
    }

    /// Toggle trail/style labels and persist the preference so it survives
    /// a restart. A failed write only costs the persistence, not the toggle.
    pub fn set_show_labels(&mut self, show: bool) {
        self.show_labels = show;
        self.surface.set_label_visibility(show);
        if let Err(error) = self.settings.set_show_labels(show) {
            tracing::warn!(%error, "failed to persist label preference");
        }
    }

    /// Streets/satellite toggle; the surface ignores redundant swaps.
    pub fn set_base_style(&self, style: BaseStyle) {
        self.surface.set_base_style(style);
    }

    /// Popup content for a device pin. Battery comes from the open panel's
    /// cached detail when the pin is the selected device, otherwise from a
    /// fresh detail fetch.
    pub async fn marker_popup(&self, device_id: &str) -> Option<PopupView> {
        let (name, status, last_seen) = {
            let registry = self.registry.lock().await;
            let device = registry.device(device_id)?;
            (
                device.display_name().to_string(),
                device.status,
                device.last_seen,
            )
        };

        let detail = match &self.panel {
            Some(panel) if panel.device_id == device_id => panel.detail.clone(),
            _ => self.api.get_detail(device_id).await,
        };
        let battery = detail
            .and_then(|d| d.battery)
            .map(|level| battery_display(Some(level)));

        Some(PopupView {
            name,
            id: device_id.to_string(),
            status,
            battery,
            last_seen: last_seen
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        })
    }

    pub async fn overview(&self) -> Option<OverviewView> {
        let panel = self.panel.as_ref()?;
        let registry = self.registry.lock().await;
        let device = registry.device(&panel.device_id);
        let detail = panel.detail.clone().unwrap_or_default();

        let last_seen = device
            .and_then(|d| d.last_seen)
            .or(detail.last_seen)
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        Some(OverviewView {
            name: device
                .map(|d| d.display_name().to_string())
                .unwrap_or_else(|| panel.device_id.clone()),
            status: device.map(|d| d.status).unwrap_or_default(),
            last_seen,
            asset_type: detail.asset_type.unwrap_or_else(|| PLACEHOLDER.to_string()),
            description: detail
                .description
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            photo_url: detail.photo_url,
        })
    }

    /// Raw position rows, newest-first as cached.
    pub async fn history_rows(&self) -> Vec<HistoryRow> {
        let Some(panel) = &self.panel else {
            return Vec::new();
        };
        let registry = self.registry.lock().await;
        registry
            .history(&panel.device_id)
            .iter()
            .map(|fix| HistoryRow {
                ts: fix
                    .ts
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                speed: fix
                    .speed
                    .map(|s| format!("{s:.1}"))
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            })
            .collect()
    }

    pub async fn diagnostics(&self) -> Option<DiagnosticsView> {
        let panel = self.panel.as_ref()?;
        let registry = self.registry.lock().await;
        let latest = registry.latest(&panel.device_id);

        let battery = battery_display(panel.detail.as_ref().and_then(|d| d.battery));
        let heading = latest
            .and_then(|fix| fix.heading)
            .map(|deg| compass_point(deg).arrow())
            .unwrap_or(PLACEHOLDER);
        let source = latest
            .map(|fix| location_source(fix).as_str())
            .unwrap_or("unknown");

        Some(DiagnosticsView {
            battery,
            heading,
            location_source: source,
        })
    }
}
