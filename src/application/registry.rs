// In-memory device registry - last-known metadata plus cached history
use crate::domain::device::{status_for_speed, Device, DeviceStatus, Position};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub device: Device,
    /// Newest-first; index 0 is the most recent cached fix.
    pub history: Vec<Position>,
}

/// Keyed by device id; iteration order is stable for list rendering.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: BTreeMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    /// Refresh device metadata, keeping any cached history.
    pub fn upsert_device(&mut self, device: Device) {
        match self.entries.get_mut(&device.id) {
            Some(entry) => entry.device = device,
            None => {
                self.entries.insert(
                    device.id.clone(),
                    DeviceEntry {
                        device,
                        history: Vec::new(),
                    },
                );
            }
        }
    }

    /// Merge a single-fix poll sample. A 1-element sample must never
    /// truncate a longer cached history: with more than one fix cached, the
    /// sample either replaces the head (same or unknown timestamp) or is
    /// prepended (genuinely newer).
    pub fn merge_latest(&mut self, device_id: &str, fix: Position) {
        let Some(entry) = self.entries.get_mut(device_id) else {
            return;
        };

        if entry.history.len() <= 1 {
            entry.history = vec![fix];
            return;
        }

        let head_ts = entry.history[0].ts;
        match (fix.ts, head_ts) {
            (Some(new), Some(head)) if new > head => entry.history.insert(0, fix),
            _ => entry.history[0] = fix,
        }
    }

    /// Full replacement of one device's cached history (detail panel open,
    /// playback backfill). Leaves the cache untouched when the fetch came
    /// back empty.
    pub fn replace_history(&mut self, device_id: &str, positions: Vec<Position>) {
        if positions.is_empty() {
            return;
        }
        let Some(entry) = self.entries.get_mut(device_id) else {
            return;
        };
        entry.history = positions;
    }

    /// Upsert a synthetic single-point update from the live stream. Returns
    /// the derived status so the caller can restyle the marker.
    pub fn apply_stream_update(
        &mut self,
        device_id: &str,
        lat: f64,
        lng: f64,
        speed: Option<f64>,
        ts: Option<DateTime<Utc>>,
    ) -> DeviceStatus {
        let status = status_for_speed(speed);

        if !self.entries.contains_key(device_id) {
            self.upsert_device(Device {
                id: device_id.to_string(),
                name: None,
                status,
                last_seen: ts,
            });
        }

        if let Some(entry) = self.entries.get_mut(device_id) {
            entry.device.status = status;
            entry.device.last_seen = ts;
        }

        let mut fix = Position::at(lat, lng);
        fix.speed = speed;
        fix.ts = ts;
        self.merge_latest(device_id, fix);

        status
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.entries.get(device_id).map(|e| &e.device)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.entries.values().map(|e| &e.device)
    }

    pub fn history(&self, device_id: &str) -> &[Position] {
        self.entries
            .get(device_id)
            .map(|e| e.history.as_slice())
            .unwrap_or(&[])
    }

    pub fn latest(&self, device_id: &str) -> Option<&Position> {
        self.history(device_id).first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn device(id: &str) -> Device {
        Device {
            id: id.to_string(),
            name: None,
            status: DeviceStatus::Idle,
            last_seen: None,
        }
    }

    fn fix_at(lat: f64, lng: f64, secs: i64) -> Position {
        let mut fix = Position::at(lat, lng);
        fix.ts = Some(Utc.timestamp_opt(secs, 0).unwrap());
        fix
    }

    #[test]
    fn test_merge_latest_never_truncates_longer_history() {
        let mut registry = DeviceRegistry::default();
        registry.upsert_device(device("d1"));
        registry.replace_history(
            "d1",
            vec![fix_at(3.0, 3.0, 300), fix_at(2.0, 2.0, 200), fix_at(1.0, 1.0, 100)],
        );

        // Same timestamp as the head: refresh tick re-sampled the same fix
        registry.merge_latest("d1", fix_at(3.0, 3.5, 300));
        assert_eq!(registry.history("d1").len(), 3);
        assert_eq!(registry.latest("d1").unwrap().lng, 3.5);

        // Newer fix gets prepended
        registry.merge_latest("d1", fix_at(4.0, 4.0, 400));
        assert_eq!(registry.history("d1").len(), 4);
        assert_eq!(registry.latest("d1").unwrap().lat, 4.0);
    }

    #[test]
    fn test_merge_latest_replaces_short_history() {
        let mut registry = DeviceRegistry::default();
        registry.upsert_device(device("d1"));

        registry.merge_latest("d1", fix_at(1.0, 1.0, 100));
        registry.merge_latest("d1", fix_at(2.0, 2.0, 200));
        assert_eq!(registry.history("d1").len(), 1);
        assert_eq!(registry.latest("d1").unwrap().lat, 2.0);
    }

    #[test]
    fn test_replace_history_ignores_empty_fetch() {
        let mut registry = DeviceRegistry::default();
        registry.upsert_device(device("d1"));
        registry.replace_history("d1", vec![fix_at(1.0, 1.0, 100)]);

        registry.replace_history("d1", Vec::new());
        assert_eq!(registry.history("d1").len(), 1);
    }

    #[test]
    fn test_upsert_device_keeps_history() {
        let mut registry = DeviceRegistry::default();
        registry.upsert_device(device("d1"));
        registry.replace_history("d1", vec![fix_at(1.0, 1.0, 100)]);

        registry.upsert_device(device("d1"));
        assert_eq!(registry.history("d1").len(), 1);
    }

    #[test]
    fn test_apply_stream_update_creates_unknown_device() {
        let mut registry = DeviceRegistry::default();
        let ts = Utc.timestamp_opt(500, 0).unwrap();

        let status = registry.apply_stream_update("ghost", 3.0, 4.0, Some(0.0), Some(ts));
        assert_eq!(status, DeviceStatus::Idle);

        let dev = registry.device("ghost").unwrap();
        assert_eq!(dev.status, DeviceStatus::Idle);
        assert_eq!(dev.last_seen, Some(ts));
        assert_eq!(registry.latest("ghost").unwrap().lat, 3.0);
    }

    #[test]
    fn test_apply_stream_update_leaves_other_devices_alone() {
        let mut registry = DeviceRegistry::default();
        registry.upsert_device(device("d1"));
        registry.upsert_device(device("d2"));
        registry.replace_history("d2", vec![fix_at(9.0, 9.0, 900)]);

        registry.apply_stream_update("d1", 3.0, 4.0, Some(5.0), None);

        assert_eq!(registry.device("d1").unwrap().status, DeviceStatus::Moving);
        assert_eq!(registry.device("d2").unwrap().status, DeviceStatus::Idle);
        assert_eq!(registry.latest("d2").unwrap().lat, 9.0);
    }
}
