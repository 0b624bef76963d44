//! Clients for the device APIs the generated scripts target
//!
//! These mirror the calls the agents most often generate: reading a
//! camera's signal strength and configuring doorbell notifications. Both use
//! bearer authentication and report failures as `None` / `false` with a log
//! line rather than a typed error.

use std::time::Duration;

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

pub const DEFAULT_CAMERA_API_URL: &str = "https://api.smarthomesecurity.example.com";
pub const DEFAULT_DOORBELL_API_URL: &str = "https://api.doorbellservice.com";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EmailNotifications {
    pub deliveries: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PushNotifications {
    pub doorbell_ring: bool,
}

/// Body of the notification configuration call
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NotificationPreferences {
    pub email_notifications: EmailNotifications,
    pub push_notifications: PushNotifications,
}

/// Bearer-authenticated client for one device API
#[derive(Clone)]
pub struct DeviceApiClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl DeviceApiClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. [`DEFAULT_CAMERA_API_URL`]
    /// * `token` - Bearer token
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// `base_url` with `segments` appended, each one percent-encoded
    fn url(&self, segments: &[&str]) -> Option<Url> {
        let mut url = match Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "Invalid device API URL");
                return None;
            }
        };
        url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
        Some(url)
    }

    /// `signalStrength` of a camera, or `None` on any failure
    pub async fn camera_signal_strength(&self, device_id: &str) -> Option<Value> {
        let url = self.url(&["v1", "devices", "cameras", device_id, "status"])?;
        let response = match self.client.get(url).bearer_auth(&self.token).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(device_id, error = %e, "Camera status request failed");
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(device_id, status = status.as_u16(), "Camera status request rejected");
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => {
                let strength = body.get("signalStrength").cloned();
                info!(device_id, signal_strength = ?strength, "Camera status read");
                strength
            }
            Err(e) => {
                warn!(device_id, error = %e, "Camera status was not JSON");
                None
            }
        }
    }

    /// Configure notification preferences; `true` when the API accepts them
    pub async fn configure_notifications(&self, preferences: &NotificationPreferences) -> bool {
        let Some(url) = self.url(&["v1", "notifications", "configure"]) else {
            return false;
        };
        let result = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(preferences)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                info!("Notifications configured successfully");
                true
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                warn!(status, body = %body, "Failed to configure notifications");
                false
            }
            Err(e) => {
                warn!(error = %e, "Notification request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> DeviceApiClient {
        DeviceApiClient::new(server.uri(), "tok", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_signal_strength_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/devices/cameras/porch/status"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "signalStrength": 78, "online": true })),
            )
            .mount(&server)
            .await;

        let strength = client(&server).camera_signal_strength("porch").await;
        assert_eq!(strength, Some(serde_json::json!(78)));
    }

    #[tokio::test]
    async fn test_device_id_is_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/devices/cameras/front%20door%2F2/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "signalStrength": -40 })),
            )
            .mount(&server)
            .await;

        let strength = client(&server).camera_signal_strength("front door/2").await;
        assert_eq!(strength, Some(serde_json::json!(-40)));
    }

    #[tokio::test]
    async fn test_signal_strength_none_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert_eq!(client(&server).camera_signal_strength("porch").await, None);
    }

    #[tokio::test]
    async fn test_configure_notifications() {
        let server = MockServer::start().await;
        let preferences = NotificationPreferences {
            email_notifications: EmailNotifications { deliveries: true },
            push_notifications: PushNotifications { doorbell_ring: true },
        };
        Mock::given(method("POST"))
            .and(path("/v1/notifications/configure"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(serde_json::json!({
                "email_notifications": { "deliveries": true },
                "push_notifications": { "doorbell_ring": true }
            })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client(&server).configure_notifications(&preferences).await);
    }

    #[tokio::test]
    async fn test_configure_notifications_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let ok = client(&server)
            .configure_notifications(&NotificationPreferences::default())
            .await;
        assert!(!ok);
    }
}
