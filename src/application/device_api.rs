// API client seam for the tracking backend
use crate::domain::device::{Device, DeviceDetail, Position};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// List all known devices. A failure means "no devices available this
    /// cycle" to the caller, never a fatal condition.
    async fn list_devices(&self) -> Result<Vec<Device>, ApiError>;

    /// Position history for one device, newest-first, bounded by `limit`.
    /// Failures are swallowed and yield an empty sequence so that one bad
    /// device cannot block a polling cycle.
    async fn get_positions(&self, device_id: &str, limit: usize) -> Vec<Position>;

    /// Extended metadata; `None` on any failure, the panel shows placeholders.
    async fn get_detail(&self, device_id: &str) -> Option<DeviceDetail>;

    /// Issue a public recovery link. User-initiated, so failures propagate
    /// for display.
    async fn create_recovery_link(
        &self,
        device_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, ApiError>;
}
