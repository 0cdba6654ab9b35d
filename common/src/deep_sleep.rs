use chrono::NaiveTime;
use serde::Serialize;

use crate::{
    config::DeviceConfig,
    schedule::{minute_of_day, minutes_until, StreamWindow},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeepSleepStatus {
    Disabled,
    ScheduleDisabled,
    ScheduleInvalid,
    TimeInvalid,
    InsideWindow,
    GracePeriod,
    OutsideWindowStabilizing,
    ClientConnected,
    StreamingActive,
    RebootPending,
    NextWindowSoon,
    ReadyToSleep,
}

impl DeepSleepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::ScheduleDisabled => "schedule_disabled",
            Self::ScheduleInvalid => "schedule_invalid",
            Self::TimeInvalid => "time_invalid",
            Self::InsideWindow => "inside_window",
            Self::GracePeriod => "grace_period",
            Self::OutsideWindowStabilizing => "outside_window_stabilizing",
            Self::ClientConnected => "client_connected",
            Self::StreamingActive => "streaming_active",
            Self::RebootPending => "reboot_pending",
            Self::NextWindowSoon => "next_window_soon",
            Self::ReadyToSleep => "ready_to_sleep",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeepSleepInputs {
    pub deep_sleep_enabled: bool,
    pub window: StreamWindow,
    pub local_time: Option<NaiveTime>,
    pub uptime_ms: u64,
    pub client_connected: bool,
    pub streaming: bool,
    pub reboot_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeepSleepReport {
    pub status: DeepSleepStatus,
    #[serde(rename = "nextActionSeconds")]
    pub next_action_seconds: Option<u64>,
}

pub fn evaluate(inputs: &DeepSleepInputs, config: &DeviceConfig) -> DeepSleepReport {
    let window = inputs.window;
    let next_action_seconds = inputs
        .local_time
        .and_then(|now| window.seconds_to_next_boundary(now));
    let report = |status| DeepSleepReport {
        status,
        next_action_seconds,
    };

    if !inputs.deep_sleep_enabled {
        return report(DeepSleepStatus::Disabled);
    }
    if !window.enabled {
        return report(DeepSleepStatus::ScheduleDisabled);
    }
    if window.is_empty() {
        return report(DeepSleepStatus::ScheduleInvalid);
    }
    let Some(now) = inputs.local_time else {
        return report(DeepSleepStatus::TimeInvalid);
    };

    let minute = minute_of_day(now);
    if window.contains(minute) {
        return report(DeepSleepStatus::InsideWindow);
    }
    if inputs.uptime_ms < config.deep_sleep_grace_ms {
        return report(DeepSleepStatus::GracePeriod);
    }
    if minutes_until(window.stop_minute, minute) < config.deep_sleep_stabilize_min {
        return report(DeepSleepStatus::OutsideWindowStabilizing);
    }
    if inputs.client_connected {
        return report(DeepSleepStatus::ClientConnected);
    }
    if inputs.streaming {
        return report(DeepSleepStatus::StreamingActive);
    }
    if inputs.reboot_pending {
        return report(DeepSleepStatus::RebootPending);
    }
    if minutes_until(minute, window.start_minute) <= config.deep_sleep_next_window_min {
        return report(DeepSleepStatus::NextWindowSoon);
    }

    report(DeepSleepStatus::ReadyToSleep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    fn inputs() -> DeepSleepInputs {
        DeepSleepInputs {
            deep_sleep_enabled: true,
            window: StreamWindow {
                enabled: true,
                start_minute: 5 * 60,
                stop_minute: 9 * 60,
            },
            local_time: at(13, 0),
            uptime_ms: 3_600_000,
            client_connected: false,
            streaming: false,
            reboot_pending: false,
        }
    }

    fn status(inputs: &DeepSleepInputs) -> DeepSleepStatus {
        evaluate(inputs, &DeviceConfig::default()).status
    }

    #[test]
    fn ready_when_every_guard_clears() {
        let report = evaluate(&inputs(), &DeviceConfig::default());
        assert_eq!(report.status, DeepSleepStatus::ReadyToSleep);
        // 13:00 -> 05:00 next day.
        assert_eq!(report.next_action_seconds, Some(16 * 3600));
    }

    #[test]
    fn blocking_codes_for_configuration_and_clock() {
        let mut i = inputs();
        i.deep_sleep_enabled = false;
        assert_eq!(status(&i), DeepSleepStatus::Disabled);

        let mut i = inputs();
        i.window.enabled = false;
        assert_eq!(status(&i), DeepSleepStatus::ScheduleDisabled);

        let mut i = inputs();
        i.window.stop_minute = i.window.start_minute;
        assert_eq!(status(&i), DeepSleepStatus::ScheduleInvalid);

        let mut i = inputs();
        i.local_time = None;
        let report = evaluate(&i, &DeviceConfig::default());
        assert_eq!(report.status, DeepSleepStatus::TimeInvalid);
        assert_eq!(report.next_action_seconds, None);
    }

    #[test]
    fn inside_window_never_sleeps() {
        let mut i = inputs();
        i.local_time = at(6, 0);
        assert_eq!(status(&i), DeepSleepStatus::InsideWindow);
    }

    #[test]
    fn activity_guards_defer_sleep_in_order() {
        let mut i = inputs();
        i.uptime_ms = 10_000;
        i.client_connected = true;
        assert_eq!(status(&i), DeepSleepStatus::GracePeriod);

        i.uptime_ms = 3_600_000;
        i.local_time = at(9, 1);
        assert_eq!(status(&i), DeepSleepStatus::OutsideWindowStabilizing);

        i.local_time = at(13, 0);
        assert_eq!(status(&i), DeepSleepStatus::ClientConnected);

        i.client_connected = false;
        i.streaming = true;
        assert_eq!(status(&i), DeepSleepStatus::StreamingActive);

        i.streaming = false;
        i.reboot_pending = true;
        assert_eq!(status(&i), DeepSleepStatus::RebootPending);
    }

    #[test]
    fn short_gap_before_window_reports_next_window_soon() {
        let mut i = inputs();
        i.local_time = at(4, 52);
        assert_eq!(status(&i), DeepSleepStatus::NextWindowSoon);

        i.local_time = at(4, 40);
        assert_eq!(status(&i), DeepSleepStatus::ReadyToSleep);
    }
}
