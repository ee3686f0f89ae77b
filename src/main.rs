// Main entry point - Dependency injection and dashboard startup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::device_api::DeviceApi;
use crate::application::playback::PlaybackEngine;
use crate::application::registry::DeviceRegistry;
use crate::application::render_surface::RenderSurface;
use crate::application::tracker::TrackerService;
use crate::infrastructure::config::SettingsStore;
use crate::infrastructure::http_api::HttpDeviceApi;
use crate::infrastructure::map_scene::MapScene;
use crate::infrastructure::stream::spawn_stream;
use crate::presentation::app::DashboardApp;
use crate::presentation::panel::{NoClipboard, PanelController};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let store = SettingsStore::default_location();
    let loaded = store.load()?;
    if !loaded.configured {
        tracing::warn!("no saved settings found, using the default backend until settings are saved");
    }
    let settings = loaded.settings;

    // Create adapters (infrastructure layer)
    let api: Arc<dyn DeviceApi> = Arc::new(HttpDeviceApi::new(&settings));
    let surface: Arc<dyn RenderSurface> = Arc::new(MapScene::new());
    surface.set_label_visibility(settings.show_labels);

    // Create services (application layer)
    let registry = Arc::new(Mutex::new(DeviceRegistry::default()));
    let tracker = TrackerService::new(api.clone(), registry.clone(), surface.clone());
    let playback = PlaybackEngine::new(api.clone(), registry.clone(), surface.clone());
    let mut panel = PanelController::new(
        api.clone(),
        tracker.clone(),
        surface.clone(),
        playback,
        Box::new(NoClipboard),
        store,
        settings.show_labels,
    );

    // First load before the refresh timer starts ticking
    match tracker.refresh_all().await {
        Ok(count) => tracing::info!(devices = count, "initial device load complete"),
        Err(error) => tracing::warn!(%error, "initial device load failed"),
    }

    // Open the first device so a headless run still reports something useful
    let first = registry.lock().await.devices().next().map(|d| d.id.clone());
    if let Some(device_id) = first {
        panel.select_device(&device_id).await;
        if let Some(view) = panel.overview().await {
            tracing::info!(
                device = %device_id,
                status = view.status.as_str(),
                last_seen = %view.last_seen,
                "selected device"
            );
        }
        if let Some(diag) = panel.diagnostics().await {
            tracing::info!(
                battery = %diag.battery,
                heading = diag.heading,
                source = diag.location_source,
                "diagnostics"
            );
        }
        tracing::info!(rows = panel.history_rows().await.len(), "history cached");
    }

    // Live stream and refresh loop share one cooperative event loop
    let events = spawn_stream(settings.ws_endpoint());
    DashboardApp::new(tracker, events).run().await
}
