use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Recurring daily window during which the stream server may run.
///
/// `start > stop` wraps across midnight. `start == stop` is an empty window:
/// while enabled, streaming is always blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamWindow {
    pub enabled: bool,
    #[serde(rename = "startMinute")]
    pub start_minute: u16,
    #[serde(rename = "stopMinute")]
    pub stop_minute: u16,
}

impl Default for StreamWindow {
    fn default() -> Self {
        Self {
            enabled: false,
            start_minute: 6 * 60,
            stop_minute: 22 * 60,
        }
    }
}

pub fn minute_of_day(time: NaiveTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

pub fn minutes_until(from: u16, to: u16) -> u16 {
    (to + MINUTES_PER_DAY - from % MINUTES_PER_DAY) % MINUTES_PER_DAY
}

impl StreamWindow {
    pub fn is_empty(&self) -> bool {
        self.start_minute == self.stop_minute
    }

    pub fn contains(&self, minute: u16) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.start_minute < self.stop_minute {
            minute >= self.start_minute && minute < self.stop_minute
        } else {
            minute >= self.start_minute || minute < self.stop_minute
        }
    }

    pub fn allowed_now(&self, now: NaiveTime, time_valid: bool) -> bool {
        if !self.enabled || !time_valid {
            return true;
        }
        self.contains(minute_of_day(now))
    }

    pub fn seconds_to_next_boundary(&self, now: NaiveTime) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        let minute = minute_of_day(now);
        let target = if self.contains(minute) {
            self.stop_minute
        } else {
            self.start_minute
        };
        let minutes = match minutes_until(minute, target) {
            0 => MINUTES_PER_DAY,
            m => m,
        };
        Some(u64::from(minutes) * 60 - u64::from(now.second()))
    }
}
