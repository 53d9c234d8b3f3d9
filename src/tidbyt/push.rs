//! Client for the display device push API.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tracing::info;

use crate::error::{ConfigError, PushError};
use crate::fetch::auth::ApiKey;
use crate::fetch::{HttpClient, post_json};

pub const TIDBYT_API_URL: &str = "https://api.tidbyt.com";

/// Sends rendered images to a display.
#[async_trait]
pub trait DisplayDevice: Send + Sync {
    /// Pushes `image`. Background pushes update the installation without
    /// bringing it to the foreground.
    async fn push(&self, image: &[u8], background: bool) -> Result<(), PushError>;
}

#[derive(Serialize)]
struct PushRequest<'a> {
    #[serde(rename = "deviceID")]
    device_id: &'a str,
    /// Base64 encoded.
    image: String,
    #[serde(rename = "installationID")]
    installation_id: &'a str,
    background: bool,
}

pub struct TidbytClient<C> {
    client: ApiKey<C>,
    base_url: String,
    device_id: String,
    installation_id: String,
}

impl<C: HttpClient> TidbytClient<C> {
    pub fn new(
        inner: C,
        api_key: &str,
        device_id: impl Into<String>,
        installation_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: ApiKey::bearer(inner, api_key)?,
            base_url: TIDBYT_API_URL.to_string(),
            device_id: device_id.into(),
            installation_id: installation_id.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn push_url(&self) -> String {
        format!("{}/v0/devices/{}/push", self.base_url, self.device_id)
    }
}

#[async_trait]
impl<C: HttpClient> DisplayDevice for TidbytClient<C> {
    #[tracing::instrument(skip(self, image), fields(device_id = %self.device_id, bytes = image.len()))]
    async fn push(&self, image: &[u8], background: bool) -> Result<(), PushError> {
        let body = PushRequest {
            device_id: &self.device_id,
            image: STANDARD.encode(image),
            installation_id: &self.installation_id,
            background,
        };

        post_json(&self.client, &self.push_url(), &body)
            .await
            .map_err(|source| PushError {
                device_id: self.device_id.clone(),
                source,
            })?;

        info!("pushed image to display");
        Ok(())
    }
}
