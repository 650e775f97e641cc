// network.rs
use crate::actuator::ActuationCommand;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a query value: everything RFC 3986 forbids in a
/// query plus the separators `&`, `=` and `+`. `:` stays literal.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// One set of measurements, sent to the server and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub temperature_c: f32,
    pub motion: bool,
    /// Local time-of-day, "HH:MM:SS".
    pub time_of_day: String,
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Association state of the platform network stack.
pub trait NetworkLink {
    fn is_connected(&mut self) -> bool;
}

/// Cycles between two reconnect requests while the link stays down.
pub const RECONNECT_EVERY_CYCLES: u32 = 6;

/// Decides when a dropped link is asked to reconnect.
///
/// The first down cycle requests a reconnect, then every
/// [`RECONNECT_EVERY_CYCLES`]th one, so a missing access point is not hammered
/// with a request per report cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    down_cycles: u32,
}

impl ReconnectPolicy {
    /// Records the link state of one cycle. Returns true when a reconnect
    /// should be requested now.
    pub fn observe(&mut self, connected: bool) -> bool {
        if connected {
            self.down_cycles = 0;
            return false;
        }
        let request = self.down_cycles % RECONNECT_EVERY_CYCLES == 0;
        self.down_cycles = self.down_cycles.saturating_add(1);
        request
    }

    /// Consecutive cycles observed without a link.
    pub fn down_cycles(&self) -> u32 {
        self.down_cycles
    }
}

/// Blocking HTTP client. An `Err` means no status was received at all.
pub trait HttpTransport {
    fn get(&mut self, url: &str) -> anyhow::Result<HttpResponse>;
}

/// Builds `{endpoint}?temp=..&motion=0|1&current_time=HH:MM:SS`.
pub fn build_report_url(endpoint: &str, reading: &Reading) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    let temp = format!("{:.2}", reading.temperature_c);
    let motion = if reading.motion { "1" } else { "0" };
    format!(
        "{}{}temp={}&motion={}&current_time={}",
        endpoint,
        separator,
        utf8_percent_encode(&temp, QUERY_VALUE),
        motion,
        utf8_percent_encode(&reading.time_of_day, QUERY_VALUE),
    )
}

/// Parses the `{"fan": bool, "light": bool}` response body.
pub fn parse_command(body: &str) -> Result<ActuationCommand, serde_json::Error> {
    serde_json::from_str(body)
}
