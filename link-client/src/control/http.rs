//! HTTP control channel using the controller's JSON API.

use async_trait::async_trait;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use wled_link_types::{RemoteIdentity, SyncSettings};

use super::{ControlChannel, ControlConnector, ControlError};

/// Port the controller serves its JSON API on.
pub const DEFAULT_CONTROL_PORT: u16 = 80;

const INFO_PATH: &str = "/json/info";
const CONFIG_PATH: &str = "/json/cfg";

/// Opens [`HttpControlChannel`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
    port: u16,
}

impl HttpConnector {
    /// Create a connector with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            port: DEFAULT_CONTROL_PORT,
        }
    }

    /// Use a non-standard API port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl ControlConnector for HttpConnector {
    type Channel = HttpControlChannel;

    fn open(&self, destination: IpAddr) -> Result<HttpControlChannel, ControlError> {
        HttpControlChannel::new(SocketAddr::new(destination, self.port), self.timeout)
    }
}

/// `/json/info` response, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct InfoResponse {
    name: Option<String>,
    ver: Option<String>,
    leds: Option<LedsInfo>,
}

#[derive(Debug, Deserialize)]
struct LedsInfo {
    count: Option<u32>,
    #[serde(default)]
    rgbw: bool,
}

impl InfoResponse {
    fn into_identity(self) -> Result<RemoteIdentity, ControlError> {
        let leds = self.leds.ok_or(ControlError::MissingField("leds"))?;
        Ok(RemoteIdentity {
            name: self.name.ok_or(ControlError::MissingField("name"))?,
            pixel_count: leds.count.ok_or(ControlError::MissingField("leds.count"))?,
            rgbw: leds.rgbw,
            firmware_version: self.ver.ok_or(ControlError::MissingField("ver"))?,
        })
    }
}

/// Control channel over the controller's HTTP JSON API.
#[derive(Debug, Clone)]
pub struct HttpControlChannel {
    base_url: String,
    http: reqwest::Client,
}

impl HttpControlChannel {
    /// Create a channel to the API served at `address`.
    pub fn new(address: SocketAddr, timeout: Duration) -> Result<Self, ControlError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: format!("http://{address}"),
            http,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(path: &str, response: reqwest::Response) -> Result<reqwest::Response, ControlError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ControlChannel for HttpControlChannel {
    async fn fetch_device_config(&self) -> Result<RemoteIdentity, ControlError> {
        let response = self.http.get(self.url(INFO_PATH)).send().await?;
        let info: InfoResponse = Self::check(INFO_PATH, response)?.json().await?;
        info.into_identity()
    }

    async fn fetch_sync_settings(&self) -> Result<SyncSettings, ControlError> {
        let response = self.http.get(self.url(CONFIG_PATH)).send().await?;
        let value: serde_json::Value = Self::check(CONFIG_PATH, response)?.json().await?;
        if !value.is_object() {
            return Err(ControlError::Decode(format!(
                "{CONFIG_PATH} is not a JSON object"
            )));
        }
        Ok(SyncSettings::from_value(value))
    }

    async fn commit_sync_settings(&self, settings: &SyncSettings) -> Result<(), ControlError> {
        let response = self
            .http
            .post(self.url(CONFIG_PATH))
            .json(settings.as_value())
            .send()
            .await?;
        Self::check(CONFIG_PATH, response)?;
        tracing::debug!("committed sync settings to {}", self.base_url);
        Ok(())
    }
}
