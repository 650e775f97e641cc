// clock.rs
use chrono::{TimeZone, Timelike, Utc};
use log::*;
use std::time::{SystemTime, UNIX_EPOCH};

/// Time-of-day sent while the clock has never been synchronized.
pub const FALLBACK_TIME: &str = "00:00:00";

/// 2016-01-01T00:00:00Z. An unsynchronized RTC starts at the epoch, so
/// anything earlier means SNTP has not completed yet.
pub const MIN_SYNCED_UNIX_TIME: i64 = 1_451_606_400;

/// Source of wall-clock time.
pub trait Clock {
    /// Seconds since the Unix epoch, or `None` if the clock was never set.
    fn unix_time(&self) -> Option<i64>;
}

/// The system clock, kept in sync by SNTP in the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> Option<i64> {
        let since_the_epoch = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
        let secs = i64::try_from(since_the_epoch.as_secs()).ok()?;
        (secs >= MIN_SYNCED_UNIX_TIME).then_some(secs)
    }
}

/// Formats the time as a string "HH:MM:SS"
pub fn format_time(hour: u32, minute: u32, second: u32) -> String {
    format!("{:02}:{:02}:{:02}", hour, minute, second)
}

/// Splits a Unix timestamp into the local (hour, minute, second) for a fixed
/// UTC offset.
pub fn local_time_of_day(unix_time: i64, utc_offset_minutes: i32) -> Option<(u32, u32, u32)> {
    let local_timestamp = unix_time.checked_add(i64::from(utc_offset_minutes) * 60)?;
    let local_time = Utc.timestamp_opt(local_timestamp, 0).single()?;
    Some((local_time.hour(), local_time.minute(), local_time.second()))
}

/// Current local time-of-day as "HH:MM:SS".
///
/// Never blocks: an unsynchronized clock yields [`FALLBACK_TIME`].
pub fn current_time_string(clock: &impl Clock, utc_offset_minutes: i32) -> String {
    match clock
        .unix_time()
        .and_then(|now| local_time_of_day(now, utc_offset_minutes))
    {
        Some((hour, minute, second)) => format_time(hour, minute, second),
        None => {
            warn!("Failed to obtain time, sending {}", FALLBACK_TIME);
            FALLBACK_TIME.to_string()
        }
    }
}
