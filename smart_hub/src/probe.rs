// probe.rs
use anyhow::anyhow;
use ds18b20::{Ds18b20, Resolution};
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, InputOutput, PinDriver, Pull};
use log::*;
use one_wire_bus::{Address, OneWire};
use smart_hub_core::sensors::ProbeTracker;
use smart_hub_core::TemperatureProbe;

/// DS18B20 on a one-wire bus with an external or internal pull-up.
pub struct EspTemperatureProbe {
    one_wire: OneWire<PinDriver<'static, AnyIOPin, InputOutput>>,
    tracker: ProbeTracker<Address>,
    delay: Ets,
}

impl EspTemperatureProbe {
    pub fn new(pin: AnyIOPin) -> anyhow::Result<Self> {
        let mut bus_pin = PinDriver::input_output_od(pin)?;
        bus_pin.set_pull(Pull::Up)?;
        bus_pin.set_high()?;

        let one_wire = OneWire::new(bus_pin)
            .map_err(|e| anyhow!("failed to initialize one-wire bus: {:?}", e))?;

        let mut probe = Self {
            one_wire,
            tracker: ProbeTracker::default(),
            delay: Ets,
        };
        probe.scan();
        Ok(probe)
    }

    /// Remembers the first DS18B20 found on the bus.
    fn scan(&mut self) {
        let mut found: Option<Address> = None;
        let mut device_count = 0u32;

        for device in self.one_wire.devices(false, &mut self.delay) {
            match device {
                Ok(address) => {
                    device_count += 1;
                    if found.is_none() && address.family_code() == ds18b20::FAMILY_CODE {
                        found = Some(address);
                    }
                }
                Err(e) => {
                    warn!("One-wire device scan failed: {:?}", e);
                    break;
                }
            }
        }

        self.tracker.scanned(found);
        match found {
            Some(address) => info!(
                "DS18B20 ready ({} one-wire device(s), using {:?})",
                device_count, address
            ),
            None => warn!(
                "No DS18B20 found ({} one-wire device(s) detected)",
                device_count
            ),
        }
    }
}

impl TemperatureProbe for EspTemperatureProbe {
    fn start_conversion(&mut self) -> anyhow::Result<()> {
        if self.tracker.needs_scan() {
            self.scan();
        }

        if let Err(e) =
            ds18b20::start_simultaneous_temp_measurement(&mut self.one_wire, &mut self.delay)
        {
            self.tracker.read_failed();
            return Err(anyhow!("failed to start DS18B20 conversion: {:?}", e));
        }

        // 750 ms at the power-on resolution; FreeRtos yields to the network stack meanwhile.
        Resolution::Bits12.delay_for_measurement_time(&mut FreeRtos);
        Ok(())
    }

    fn read_celsius(&mut self) -> anyhow::Result<f32> {
        let address = self
            .tracker
            .address()
            .ok_or_else(|| anyhow!("no DS18B20 on the one-wire bus"))?;
        let sensor = Ds18b20::new::<core::convert::Infallible>(address)
            .map_err(|e| anyhow!("invalid DS18B20 address {:?}: {:?}", address, e))?;

        match sensor.read_data(&mut self.one_wire, &mut self.delay) {
            Ok(data) => {
                self.tracker.read_succeeded();
                Ok(data.temperature)
            }
            Err(e) => {
                // The address stays valid for the retry; the bus is searched
                // again before the next conversion.
                self.tracker.read_failed();
                Err(anyhow!("failed to read DS18B20 scratchpad: {:?}", e))
            }
        }
    }
}
