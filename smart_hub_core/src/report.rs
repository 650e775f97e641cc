// report.rs
use crate::actuator::{ActuationCommand, Actuator};
use crate::clock::{current_time_string, Clock};
use crate::config::HubConfig;
use crate::network::{build_report_url, parse_command, HttpTransport, NetworkLink, Reading};
use crate::sensors::{SensorReader, TemperatureProbe};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::*;

/// Fixed pause between two cycles.
pub const REPORT_INTERVAL_MS: u32 = 10_000;

/// How a single cycle ended. Only `Actuated` touches the outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The network was not associated; nothing was read or sent.
    Offline,
    /// The probe gave no valid temperature; nothing was sent.
    SensorUnavailable,
    /// No HTTP status or a non-2xx status came back.
    RequestFailed(String),
    /// The body was not a valid `{"fan": bool, "light": bool}` object.
    ResponseRejected(String),
    /// The command was written to the outputs.
    Actuated(ActuationCommand),
    /// The GPIO driver refused the write.
    ActuationFailed(String),
}

/// The read, send, parse, actuate loop. Owns every hardware handle.
pub struct ReportLoop<P, M, F, L, N, H, K, D> {
    sensors: SensorReader<P, M>,
    actuator: Actuator<F, L>,
    link: N,
    http: H,
    clock: K,
    delay: D,
    config: HubConfig,
}

impl<P, M, F, L, N, H, K, D> ReportLoop<P, M, F, L, N, H, K, D>
where
    P: TemperatureProbe,
    M: InputPin,
    F: OutputPin,
    L: OutputPin,
    N: NetworkLink,
    H: HttpTransport,
    K: Clock,
    D: DelayNs,
{
    pub fn new(
        sensors: SensorReader<P, M>,
        actuator: Actuator<F, L>,
        link: N,
        http: H,
        clock: K,
        delay: D,
        config: HubConfig,
    ) -> Self {
        Self {
            sensors,
            actuator,
            link,
            http,
            clock,
            delay,
            config,
        }
    }

    pub fn actuator(&self) -> &Actuator<F, L> {
        &self.actuator
    }

    /// Runs one cycle. Every failure is logged here and ends the cycle early,
    /// leaving the outputs as they were.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        if !self.link.is_connected() {
            warn!("WiFi not connected, skipping this cycle");
            return CycleOutcome::Offline;
        }

        let Some(temperature_c) = self.sensors.read_temperature(&mut self.delay) else {
            return CycleOutcome::SensorUnavailable;
        };

        let reading = Reading {
            temperature_c,
            motion: self.sensors.read_motion(),
            time_of_day: current_time_string(&self.clock, self.config.utc_offset_minutes),
        };
        let url = build_report_url(&self.config.endpoint, &reading);
        info!("Sending request to: {}", url);

        let response = match self.http.get(&url) {
            Ok(response) => response,
            Err(e) => {
                error!("GET failed: {:#}", e);
                return CycleOutcome::RequestFailed(format!("{:#}", e));
            }
        };
        if !response.is_success() {
            error!("GET failed: HTTP status {}", response.status);
            return CycleOutcome::RequestFailed(format!("HTTP status {}", response.status));
        }
        info!("Response: {}", response.body);

        let command = match parse_command(&response.body) {
            Ok(command) => command,
            Err(e) => {
                error!("JSON parse error: {}", e);
                return CycleOutcome::ResponseRejected(e.to_string());
            }
        };

        match self.actuator.set_outputs(command) {
            Ok(()) => CycleOutcome::Actuated(command),
            Err(e) => {
                error!("{:#}", e);
                CycleOutcome::ActuationFailed(format!("{:#}", e))
            }
        }
    }

    /// One cycle followed by the fixed idle delay, whatever the outcome.
    pub fn tick(&mut self) -> CycleOutcome {
        let outcome = self.run_cycle();
        debug!("Cycle finished: {:?}", outcome);
        self.delay.delay_ms(REPORT_INTERVAL_MS);
        outcome
    }

    /// Runs cycles forever, [`REPORT_INTERVAL_MS`] apart.
    pub fn run_forever(&mut self) -> ! {
        info!("Entering report loop, endpoint {}", self.config.endpoint);
        loop {
            self.tick();
        }
    }
}
