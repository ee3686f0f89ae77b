// HTTP device API - reqwest adapter for the tracking backend
use crate::application::device_api::{ApiError, DeviceApi};
use crate::domain::device::{Device, DeviceDetail, Position};
use crate::domain::settings::Settings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub struct HttpDeviceApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct RecoveryLinkRequest {
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RecoveryLinkResponse {
    token: String,
}

impl HttpDeviceApi {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-Key", key),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.with_key(self.client.get(self.endpoint(path)));
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DeviceApi for HttpDeviceApi {
    async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
        self.get_json("/devices").await
    }

    async fn get_positions(&self, device_id: &str, limit: usize) -> Vec<Position> {
        let path = format!(
            "/devices/{}/positions?limit={}",
            urlencoding::encode(device_id),
            limit
        );
        match self.get_json::<Vec<Position>>(&path).await {
            Ok(fixes) => fixes,
            Err(error) => {
                tracing::warn!(device_id, %error, "position fetch failed, treating as empty");
                Vec::new()
            }
        }
    }

    async fn get_detail(&self, device_id: &str) -> Option<DeviceDetail> {
        let path = format!("/devices/{}/detail", urlencoding::encode(device_id));
        match self.get_json::<DeviceDetail>(&path).await {
            Ok(detail) => Some(detail),
            Err(error) => {
                tracing::debug!(device_id, %error, "detail fetch failed");
                None
            }
        }
    }

    async fn create_recovery_link(
        &self,
        device_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let path = format!(
            "/devices/{}/recovery-link",
            urlencoding::encode(device_id)
        );
        let request = self
            .with_key(self.client.post(self.endpoint(&path)))
            .json(&RecoveryLinkRequest { expires_at });
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<RecoveryLinkResponse>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(format!(
            "{}/public/recovery/{}/map",
            self.base_url, parsed.token
        ))
    }
}
