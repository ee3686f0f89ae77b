// Tracker service - polling refresh and marker reconciliation
use crate::application::device_api::{ApiError, DeviceApi};
use crate::application::registry::DeviceRegistry;
use crate::application::render_surface::RenderSurface;
use crate::domain::device::status_for_speed;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One live position event, as delivered by the stream or synthesized by
/// tests.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub device_id: String,
    pub lat: f64,
    pub lng: f64,
    pub speed: Option<f64>,
    pub ts: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct TrackerService {
    api: Arc<dyn DeviceApi>,
    registry: Arc<Mutex<DeviceRegistry>>,
    surface: Arc<dyn RenderSurface>,
}

impl TrackerService {
    pub fn new(
        api: Arc<dyn DeviceApi>,
        registry: Arc<Mutex<DeviceRegistry>>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            api,
            registry,
            surface,
        }
    }

    pub fn registry(&self) -> Arc<Mutex<DeviceRegistry>> {
        self.registry.clone()
    }

    /// One refresh cycle: device list, then the latest fix per device, with
    /// the marker reconciled as each device lands. A device whose position
    /// fetch fails keeps its previous marker and history; only a failed
    /// device list aborts the cycle.
    pub async fn refresh_all(&self) -> Result<usize, ApiError> {
        let devices = self.api.list_devices().await?;
        let count = devices.len();

        for device in devices {
            let device_id = device.id.clone();
            self.registry.lock().await.upsert_device(device);

            let fixes = self.api.get_positions(&device_id, 1).await;
            let Some(fix) = fixes.into_iter().next() else {
                continue;
            };

            let status = status_for_speed(fix.speed);
            let (lat, lng) = (fix.lat, fix.lng);
            self.registry.lock().await.merge_latest(&device_id, fix);
            self.surface.upsert_marker(&device_id, lat, lng, status);
        }

        tracing::debug!(devices = count, "refresh cycle complete");
        Ok(count)
    }

    /// Replace one device's cached history window. Returns how many fixes
    /// were fetched; zero leaves the cache untouched.
    pub async fn refresh_history(&self, device_id: &str, limit: usize) -> usize {
        let fixes = self.api.get_positions(device_id, limit).await;
        let fetched = fixes.len();
        self.registry
            .lock()
            .await
            .replace_history(device_id, fixes);
        fetched
    }

    /// Apply one live stream event to the registry and the marker.
    pub async fn apply_stream_update(&self, update: PositionUpdate) {
        let status = self.registry.lock().await.apply_stream_update(
            &update.device_id,
            update.lat,
            update.lng,
            update.speed,
            update.ts,
        );
        self.surface
            .upsert_marker(&update.device_id, update.lat, update.lng, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device_api::ApiError;
    use crate::domain::device::{Device, DeviceDetail, DeviceStatus, Position};
    use crate::infrastructure::map_scene::MapScene;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeApi {
        devices: Vec<Device>,
        positions: HashMap<String, Vec<Position>>,
    }

    #[async_trait]
    impl DeviceApi for FakeApi {
        async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
            Ok(self.devices.clone())
        }

        async fn get_positions(&self, device_id: &str, limit: usize) -> Vec<Position> {
            let mut fixes = self.positions.get(device_id).cloned().unwrap_or_default();
            fixes.truncate(limit);
            fixes
        }

        async fn get_detail(&self, _device_id: &str) -> Option<DeviceDetail> {
            None
        }

        async fn create_recovery_link(
            &self,
            _device_id: &str,
            _expires_at: DateTime<Utc>,
        ) -> Result<String, ApiError> {
            Err(ApiError::Transport("not under test".to_string()))
        }
    }

    fn idle_device(id: &str) -> Device {
        Device {
            id: id.to_string(),
            name: None,
            status: DeviceStatus::Idle,
            last_seen: None,
        }
    }

    fn tracker_with(api: FakeApi) -> (TrackerService, Arc<MapScene>) {
        let scene = Arc::new(MapScene::new());
        let tracker = TrackerService::new(
            Arc::new(api),
            Arc::new(Mutex::new(DeviceRegistry::default())),
            scene.clone(),
        );
        (tracker, scene)
    }

    #[tokio::test]
    async fn test_refresh_places_marker_with_derived_status() {
        let mut fix = Position::at(1.0, 2.0);
        fix.speed = Some(5.0);

        let (tracker, scene) = tracker_with(FakeApi {
            devices: vec![idle_device("d1")],
            positions: HashMap::from([("d1".to_string(), vec![fix])]),
        });

        tracker.refresh_all().await.unwrap();

        let marker = scene.marker("d1").unwrap();
        assert_eq!((marker.lat, marker.lng), (1.0, 2.0));
        assert_eq!(marker.status, DeviceStatus::Moving);
    }

    #[tokio::test]
    async fn test_repeated_refresh_keeps_one_marker_per_device() {
        let (tracker, scene) = tracker_with(FakeApi {
            devices: vec![idle_device("d1"), idle_device("d2")],
            positions: HashMap::from([
                ("d1".to_string(), vec![Position::at(1.0, 1.0)]),
                ("d2".to_string(), vec![Position::at(2.0, 2.0)]),
            ]),
        });

        for _ in 0..5 {
            tracker.refresh_all().await.unwrap();
        }
        assert_eq!(scene.marker_count(), 2);
    }

    #[tokio::test]
    async fn test_device_without_positions_keeps_no_marker() {
        let (tracker, scene) = tracker_with(FakeApi {
            devices: vec![idle_device("d1")],
            positions: HashMap::new(),
        });

        tracker.refresh_all().await.unwrap();
        assert!(scene.marker("d1").is_none());
    }

    #[tokio::test]
    async fn test_stream_update_moves_only_the_target_marker() {
        let (tracker, scene) = tracker_with(FakeApi {
            devices: vec![idle_device("d1"), idle_device("d2")],
            positions: HashMap::from([
                ("d1".to_string(), vec![Position::at(1.0, 1.0)]),
                ("d2".to_string(), vec![Position::at(2.0, 2.0)]),
            ]),
        });
        tracker.refresh_all().await.unwrap();

        tracker
            .apply_stream_update(PositionUpdate {
                device_id: "d1".to_string(),
                lat: 3.0,
                lng: 4.0,
                speed: Some(0.0),
                ts: None,
            })
            .await;

        let moved = scene.marker("d1").unwrap();
        assert_eq!((moved.lat, moved.lng), (3.0, 4.0));
        assert_eq!(moved.status, DeviceStatus::Idle);

        let untouched = scene.marker("d2").unwrap();
        assert_eq!((untouched.lat, untouched.lng), (2.0, 2.0));
    }
}
