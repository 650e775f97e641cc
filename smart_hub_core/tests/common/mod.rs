//! Mock hardware for driving a `ReportLoop` on the host.
//!
//! Every mock hands out shared handles so a test can script inputs and
//! inspect outputs after the mock has been moved into the loop.

#![allow(dead_code)]

use anyhow::anyhow;
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::{Level, LevelFilter, Log, Metadata, Record};
use smart_hub_core::{
    Actuator, Clock, HttpResponse, HttpTransport, HubConfig, NetworkLink, ReportLoop,
    SensorReader, TemperatureProbe,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Once;

pub const ENDPOINT: &str = "http://hub.local:8000/control";

// 2024-07-15T14:05:09Z
pub const NOW: i64 = 1_721_052_309;

#[derive(Clone, Default)]
pub struct MockProbe {
    pub values: Rc<RefCell<VecDeque<Result<f32, String>>>>,
    pub conversions: Rc<Cell<usize>>,
}

impl MockProbe {
    pub fn push(&self, value: Result<f32, &str>) {
        self.values
            .borrow_mut()
            .push_back(value.map_err(str::to_string));
    }
}

impl TemperatureProbe for MockProbe {
    fn start_conversion(&mut self) -> anyhow::Result<()> {
        self.conversions.set(self.conversions.get() + 1);
        Ok(())
    }

    fn read_celsius(&mut self) -> anyhow::Result<f32> {
        match self.values.borrow_mut().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no reading scripted")),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockMotion {
    pub level: Rc<Cell<bool>>,
    pub reads: Rc<Cell<usize>>,
}

impl ErrorType for MockMotion {
    type Error = Infallible;
}

impl InputPin for MockMotion {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|level| !level)
    }
}

#[derive(Clone, Default)]
pub struct MockOutput {
    pub level: Rc<Cell<Option<bool>>>,
    pub writes: Rc<Cell<usize>>,
}

impl ErrorType for MockOutput {
    type Error = Infallible;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(Some(false));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(Some(true));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockLink {
    pub connected: Rc<Cell<bool>>,
}

impl NetworkLink for MockLink {
    fn is_connected(&mut self) -> bool {
        self.connected.get()
    }
}

#[derive(Clone, Debug)]
pub enum Reply {
    Status(u16, String),
    TransportError(String),
}

#[derive(Clone)]
pub struct MockHttp {
    pub requests: Rc<RefCell<Vec<String>>>,
    pub reply: Rc<RefCell<Reply>>,
}

impl HttpTransport for MockHttp {
    fn get(&mut self, url: &str) -> anyhow::Result<HttpResponse> {
        self.requests.borrow_mut().push(url.to_string());
        match &*self.reply.borrow() {
            Reply::Status(status, body) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            Reply::TransportError(reason) => Err(anyhow!("{}", reason)),
        }
    }
}

#[derive(Clone)]
pub struct MockClock {
    pub now: Rc<Cell<Option<i64>>>,
}

impl Clock for MockClock {
    fn unix_time(&self) -> Option<i64> {
        self.now.get()
    }
}

#[derive(Clone, Default)]
pub struct MockDelay {
    pub total_ns: Rc<Cell<u64>>,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

/// Logger keeping records per test thread so parallel tests do not mix.
struct CaptureLogger;

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Installs the capturing logger and drops anything this thread logged so far.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

/// Records logged on this thread since `capture_logs`.
pub fn take_logs() -> Vec<(Level, String)> {
    RECORDS.with(|records| records.borrow_mut().drain(..).collect())
}

/// True when a record at `level` contains `needle`.
pub fn logged(records: &[(Level, String)], level: Level, needle: &str) -> bool {
    records
        .iter()
        .any(|(at, message)| *at == level && message.contains(needle))
}

pub type MockLoop = ReportLoop<
    MockProbe,
    MockMotion,
    MockOutput,
    MockOutput,
    MockLink,
    MockHttp,
    MockClock,
    MockDelay,
>;

/// All mock handles of one loop, connected and replying `{"fan":false,"light":false}`.
pub struct Rig {
    pub probe: MockProbe,
    pub motion: MockMotion,
    pub fan: MockOutput,
    pub light: MockOutput,
    pub link: MockLink,
    pub http: MockHttp,
    pub clock: MockClock,
    pub delay: MockDelay,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            probe: MockProbe::default(),
            motion: MockMotion::default(),
            fan: MockOutput::default(),
            light: MockOutput::default(),
            link: MockLink {
                connected: Rc::new(Cell::new(true)),
            },
            http: MockHttp {
                requests: Rc::new(RefCell::new(Vec::new())),
                reply: Rc::new(RefCell::new(Reply::Status(
                    200,
                    r#"{"fan":false,"light":false}"#.to_string(),
                ))),
            },
            clock: MockClock {
                now: Rc::new(Cell::new(Some(NOW))),
            },
            delay: MockDelay::default(),
        }
    }

    pub fn reply(&self, reply: Reply) {
        *self.http.reply.borrow_mut() = reply;
    }

    pub fn requests(&self) -> Vec<String> {
        self.http.requests.borrow().clone()
    }

    pub fn outputs(&self) -> (Option<bool>, Option<bool>) {
        (self.fan.level.get(), self.light.level.get())
    }

    pub fn build(&self) -> MockLoop {
        self.build_with(HubConfig {
            endpoint: ENDPOINT.to_string(),
            utc_offset_minutes: 0,
            http_timeout_secs: None,
        })
    }

    pub fn build_with(&self, config: HubConfig) -> MockLoop {
        ReportLoop::new(
            SensorReader::new(self.probe.clone(), self.motion.clone()),
            Actuator::new(self.fan.clone(), self.light.clone()).unwrap(),
            self.link.clone(),
            self.http.clone(),
            self.clock.clone(),
            self.delay.clone(),
            config,
        )
    }
}
