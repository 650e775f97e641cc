// ===============================================================================
// ESP32 Smart Hub Node
// ===============================================================================
// Every 10 seconds this node:
// - reads a DS18B20 temperature probe and a PIR motion sensor
// - sends both to the smart hub server as a GET query
// - switches the fan and the light as the server's JSON reply says
//
// Pin map:
//   GPIO23  fan output
//   GPIO22  light output
//   GPIO15  motion input
//   GPIO4   one-wire bus (DS18B20)
// ===============================================================================

use esp_idf_hal::{
    delay::FreeRtos,
    gpio::{IOPin, PinDriver},
    peripherals::Peripherals,
};
use esp_idf_svc::sntp::EspSntp;
use log::*;
use smart_hub_core::{Actuator, ReportLoop, SensorReader, SystemClock};

mod http;
mod probe;
mod secrets;
mod wifi;

use http::EspHttpTransport;
use probe::EspTemperatureProbe;
use wifi::EspWifiLink;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF services
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== ESP32 Smart Hub Node Starting ===");

    // Load configuration from secrets.toml
    let secrets = secrets::load()?;
    let peripherals = Peripherals::take()?;

    // === Outputs first, so both are off during the rest of the bring-up ===
    let fan = PinDriver::output(peripherals.pins.gpio23)?;
    let light = PinDriver::output(peripherals.pins.gpio22)?;
    let actuator = Actuator::new(fan, light)?;

    // === Sensors ===
    let motion = PinDriver::input(peripherals.pins.gpio15)?;
    let probe = EspTemperatureProbe::new(peripherals.pins.gpio4.downgrade())?;
    let sensors = SensorReader::new(probe, motion);

    // === Initialize WiFi ===
    let link = EspWifiLink::connect(peripherals.modem, &secrets.wifi)?;

    // === Initialize SNTP (Network Time Protocol) ===
    // Not waited on: until the first sync the clock reports 00:00:00.
    let _sntp = EspSntp::new_default()?;
    info!("SNTP started");

    let http = EspHttpTransport::new(&secrets.hub);

    // === Main Loop ===
    let mut report_loop = ReportLoop::new(
        sensors,
        actuator,
        link,
        http,
        SystemClock,
        FreeRtos,
        secrets.hub,
    );
    report_loop.run_forever()
}
