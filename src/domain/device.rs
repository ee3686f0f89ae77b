// Device and position domain models
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Coarse device state shown on markers and list badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Moving,
    #[default]
    Idle,
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Moving => "moving",
            DeviceStatus::Idle => "idle",
            DeviceStatus::Offline => "offline",
        }
    }
}

/// Status derivation from speed. Applied identically in polling, stream
/// updates, and playback; a missing speed counts as 0.
pub fn status_for_speed(speed: Option<f64>) -> DeviceStatus {
    if speed.unwrap_or(0.0) > 2.0 {
        DeviceStatus::Moving
    } else {
        DeviceStatus::Idle
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    /// Display name falls back to the id when the backend sends none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One GPS fix. The trailing optional fields are raw hints used only by the
/// best-effort location-source heuristic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub satellites: Option<u32>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Position {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            speed: None,
            heading: None,
            ts: None,
            satellites: None,
            accuracy: None,
            network: None,
            source: None,
        }
    }
}

/// Extended metadata from `/devices/{id}/detail`; every field is optional
/// and the panel falls back to placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceDetail {
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub battery: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photo_url: Option<String>,
}
