// wifi.rs
use anyhow::anyhow;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::modem::Modem;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use log::*;
use smart_hub_core::{NetworkLink, ReconnectPolicy, WiFiConfig};

/// Pause between two association attempts during bring-up.
const CONNECT_RETRY_MS: u32 = 500;

/// Station-mode Wi-Fi, owned by the report loop.
pub struct EspWifiLink {
    wifi: BlockingWifi<EspWifi<'static>>,
    reconnect: ReconnectPolicy,
}

impl EspWifiLink {
    /// Starts the station and blocks until the network interface is up.
    pub fn connect(
        modem: impl Peripheral<P = Modem> + 'static,
        config: &WiFiConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing WiFi...");

        let sys_loop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        let mut wifi =
            BlockingWifi::wrap(EspWifi::new(modem, sys_loop.clone(), Some(nvs))?, sys_loop)?;

        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("SSID too long: {}", config.ssid))?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("WiFi password too long"))?,
            auth_method: if config.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });

        wifi.set_configuration(&wifi_config)?;
        wifi.start()?;

        // Keep trying until the access point answers; there is nothing to report without it.
        let mut attempt = 1u32;
        while let Err(e) = wifi.connect() {
            warn!("WiFi connect attempt {} to {} failed: {}", attempt, config.ssid, e);
            attempt += 1;
            FreeRtos::delay_ms(CONNECT_RETRY_MS);
        }
        wifi.wait_netif_up()?;

        let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
        info!("Connected to the WiFi network with IP address: {}", ip_info.ip);

        Ok(Self {
            wifi,
            reconnect: ReconnectPolicy::default(),
        })
    }
}

impl NetworkLink for EspWifiLink {
    fn is_connected(&mut self) -> bool {
        let connected = match self.wifi.is_connected() {
            Ok(connected) => connected,
            Err(e) => {
                error!("WiFi status query failed: {}", e);
                false
            }
        };

        let was_down = self.reconnect.down_cycles();
        if connected && was_down > 0 {
            info!("WiFi link back after {} cycle(s)", was_down);
        }
        if self.reconnect.observe(connected) {
            if was_down == 0 {
                warn!("WiFi disconnected");
            }
            // Non-blocking request; the result shows up on a later cycle.
            match self.wifi.wifi_mut().connect() {
                Ok(()) => info!("WiFi reconnect requested"),
                Err(e) => warn!("WiFi reconnect request failed: {}", e),
            }
        }
        connected
    }
}
