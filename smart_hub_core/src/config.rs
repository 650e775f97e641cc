// config.rs
use anyhow::{anyhow, ensure};
use serde::Deserialize;

/// Largest UTC offset in use anywhere (UTC+14 / UTC-12), in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Defines the structure for the secrets.
#[derive(Deserialize, Debug, Clone)]
pub struct Secrets {
    /// Wi-Fi configuration.
    pub wifi: WiFiConfig,
    /// Control endpoint configuration.
    pub hub: HubConfig,
}

/// Defines the structure for the Wi-Fi configuration.
#[derive(Deserialize, Debug, Clone)]
pub struct WiFiConfig {
    /// The SSID of the Wi-Fi network.
    pub ssid: String,
    /// The password of the Wi-Fi network. Empty for an open network.
    #[serde(default)]
    pub password: String,
}

/// Defines the structure for the control endpoint configuration.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HubConfig {
    /// Base URL the readings are sent to, e.g. `http://192.168.1.20:8000/control`.
    pub endpoint: String,
    /// Offset added to UTC before the time-of-day is sent.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// HTTP timeout. The platform default applies when unset.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

impl Secrets {
    /// Parses and validates the contents of `secrets.toml`.
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        let secrets: Secrets = toml::from_str(source)
            .map_err(|e| anyhow!("Error parsing secrets.toml: {}", e))?;
        secrets.validate()?;
        Ok(secrets)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.wifi.ssid.is_empty(), "wifi.ssid must not be empty");
        ensure!(
            self.hub.endpoint.starts_with("http://") || self.hub.endpoint.starts_with("https://"),
            "hub.endpoint must start with http:// or https://, got {:?}",
            self.hub.endpoint
        );
        ensure!(
            (-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES)
                .contains(&self.hub.utc_offset_minutes),
            "hub.utc_offset_minutes out of range: {}",
            self.hub.utc_offset_minutes
        );
        Ok(())
    }
}
