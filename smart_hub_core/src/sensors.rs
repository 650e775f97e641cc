// sensors.rs
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::*;

/// Value a DS18B20 driver reports when the probe does not answer on the bus.
pub const DISCONNECTED_CELSIUS: f32 = -127.0;

/// How many times the probe is polled after one conversion request.
pub const TEMPERATURE_ATTEMPTS: usize = 2;

/// Pause after every attempt that produced no valid value.
pub const TEMPERATURE_RETRY_DELAY_MS: u32 = 100;

/// A temperature probe on a one-wire bus.
pub trait TemperatureProbe {
    /// Asks the probe to start a new conversion.
    fn start_conversion(&mut self) -> anyhow::Result<()>;

    /// Reads the last converted temperature in degrees Celsius.
    fn read_celsius(&mut self) -> anyhow::Result<f32>;
}

/// Returns true for values that may be reported to the server.
pub fn is_valid_temperature(celsius: f32) -> bool {
    celsius.is_finite() && celsius != DISCONNECTED_CELSIUS
}

/// Remembers where the probe sits on the bus between reads.
///
/// A failed read keeps the address so the next attempt of the same cycle still
/// talks to the probe; the bus is only rescanned before the next conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTracker<A> {
    address: Option<A>,
    rescan_pending: bool,
}

impl<A: Copy> Default for ProbeTracker<A> {
    fn default() -> Self {
        Self {
            address: None,
            rescan_pending: false,
        }
    }
}

impl<A: Copy> ProbeTracker<A> {
    /// True before a conversion when the bus has to be searched again.
    pub fn needs_scan(&self) -> bool {
        self.address.is_none() || self.rescan_pending
    }

    /// Records the result of a bus search.
    pub fn scanned(&mut self, found: Option<A>) {
        self.address = found;
        self.rescan_pending = false;
    }

    pub fn address(&self) -> Option<A> {
        self.address
    }

    pub fn read_failed(&mut self) {
        self.rescan_pending = true;
    }

    pub fn read_succeeded(&mut self) {
        self.rescan_pending = false;
    }
}

/// Owns the temperature probe and the motion input.
pub struct SensorReader<P, M> {
    probe: P,
    motion: M,
}

impl<P, M> SensorReader<P, M>
where
    P: TemperatureProbe,
    M: InputPin,
{
    pub fn new(probe: P, motion: M) -> Self {
        Self { probe, motion }
    }

    /// Requests one conversion and polls the probe up to
    /// [`TEMPERATURE_ATTEMPTS`] times.
    ///
    /// Returns `None` when every attempt failed or reported the disconnected
    /// sentinel, so the caller never sees an out-of-range value.
    pub fn read_temperature(&mut self, delay: &mut impl DelayNs) -> Option<f32> {
        // A failed request still leaves the previous conversion in the scratchpad.
        if let Err(e) = self.probe.start_conversion() {
            warn!("Temperature conversion request failed: {:#}", e);
        }

        for attempt in 1..=TEMPERATURE_ATTEMPTS {
            match self.probe.read_celsius() {
                Ok(celsius) if is_valid_temperature(celsius) => {
                    info!("Temperature: {:.2}°C (attempt {})", celsius, attempt);
                    return Some(celsius);
                }
                Ok(celsius) => {
                    warn!("Temperature attempt {}: invalid value {:.2}", attempt, celsius);
                }
                Err(e) => {
                    warn!("Temperature attempt {}: {:#}", attempt, e);
                }
            }
            delay.delay_ms(TEMPERATURE_RETRY_DELAY_MS);
        }

        error!("Temperature probe not detected!");
        None
    }

    /// Samples the motion pin once. A read error counts as no motion.
    pub fn read_motion(&mut self) -> bool {
        match self.motion.is_high() {
            Ok(level) => level,
            Err(e) => {
                warn!("Motion pin read failed: {:?}", e);
                false
            }
        }
    }
}
