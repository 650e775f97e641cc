//! Smart hub node logic.
//!
//! One report cycle reads the temperature probe and the motion pin, sends both
//! to the control endpoint as a GET query and drives the fan and light outputs
//! from the JSON answer. All hardware sits behind `embedded-hal` traits or the
//! small ports defined here, so the firmware plugs in ESP-IDF drivers and the
//! tests plug in mocks.

pub mod actuator;
pub mod clock;
pub mod config;
pub mod network;
pub mod report;
pub mod sensors;

pub use actuator::{ActuationCommand, Actuator};
pub use clock::{Clock, SystemClock};
pub use config::{HubConfig, Secrets, WiFiConfig};
pub use network::{HttpResponse, HttpTransport, NetworkLink, Reading, ReconnectPolicy};
pub use report::{CycleOutcome, ReportLoop};
pub use sensors::{SensorReader, TemperatureProbe};
