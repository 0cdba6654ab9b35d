use serde::Serialize;

use crate::{
    config::ThresholdMode, deep_sleep::DeepSleepReport, error::ErrorCode, thermal::ThermalState,
};

/// `HH:MM:SS`, or `Nd HH:MM:SS` once the uptime passes a day.
pub fn format_uptime(uptime_ms: u64) -> String {
    let total = uptime_ms / 1_000;
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total / 3_600 % 24,
        total / 60 % 60,
        total % 60,
    );
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

pub fn format_since(event_ms: Option<u64>, now_ms: u64) -> String {
    match event_ms {
        Some(event_ms) => format!("{} ago", format_uptime(now_ms.saturating_sub(event_ms))),
        None => "never".to_string(),
    }
}

pub fn format_minute_of_day(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

pub fn latency_ms(sample_rate: u32, buffer_size: u16) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    f32::from(buffer_size) / sample_rate as f32 * 1_000.0
}

pub fn profile_name(buffer_size: u16) -> &'static str {
    match buffer_size {
        0..=256 => "Ultra-Low Latency (Higher CPU, May have dropouts)",
        257..=512 => "Balanced (Moderate CPU, Good stability)",
        513..=1024 => "Stable Streaming (Lower CPU, Excellent stability)",
        _ => "High Stability (Lowest CPU, Maximum stability)",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub version: &'static str,
    pub ip: Option<String>,
    #[serde(rename = "wifiRssi")]
    pub wifi_rssi: Option<i32>,
    #[serde(rename = "wifiTxDbm")]
    pub wifi_tx_dbm: f32,
    pub uptime: String,
    #[serde(rename = "uptimeSeconds")]
    pub uptime_seconds: u64,
    #[serde(rename = "serverEnabled")]
    pub server_enabled: bool,
    #[serde(rename = "serverRunning")]
    pub server_running: bool,
    #[serde(rename = "clientConnected")]
    pub client_connected: bool,
    pub client: Option<String>,
    pub streaming: bool,
    #[serde(rename = "packetRate")]
    pub packet_rate: f32,
    #[serde(rename = "lastClientConnect")]
    pub last_client_connect: String,
    #[serde(rename = "lastStreamStart")]
    pub last_stream_start: String,
    #[serde(rename = "freeHeapKb")]
    pub free_heap_kb: Option<u32>,
    #[serde(rename = "minFreeHeapKb")]
    pub min_free_heap_kb: Option<u32>,
    #[serde(rename = "timeSynced")]
    pub time_synced: bool,
    #[serde(rename = "localTime")]
    pub local_time: Option<String>,
    #[serde(rename = "timeOffsetMin")]
    pub time_offset_min: i32,
    #[serde(rename = "scheduleEnabled")]
    pub schedule_enabled: bool,
    #[serde(rename = "scheduleAllows")]
    pub schedule_allows: bool,
    #[serde(rename = "streamStart")]
    pub stream_start: String,
    #[serde(rename = "streamStop")]
    pub stream_stop: String,
    #[serde(rename = "deepSleep")]
    pub deep_sleep: DeepSleepReport,
    #[serde(rename = "rebootPending")]
    pub reboot_pending: bool,
    #[serde(rename = "thermalLatched")]
    pub thermal_latched: bool,
    #[serde(rename = "brokerEnabled")]
    pub broker_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioStatusView {
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
    pub gain: f32,
    #[serde(rename = "bufferSize")]
    pub buffer_size: u16,
    #[serde(rename = "shiftBits")]
    pub shift_bits: u8,
    #[serde(rename = "latencyMs")]
    pub latency_ms: f32,
    pub profile: &'static str,
    #[serde(rename = "highPassEnabled")]
    pub high_pass_enabled: bool,
    #[serde(rename = "highPassCutoffHz")]
    pub high_pass_cutoff_hz: u16,
    #[serde(rename = "peakLevel")]
    pub peak_level: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerfStatusView {
    #[serde(rename = "minRate")]
    pub min_rate: u32,
    #[serde(rename = "thresholdMode")]
    pub threshold_mode: ThresholdMode,
    #[serde(rename = "recommendedMinRate")]
    pub recommended_min_rate: u32,
    #[serde(rename = "expectedRate")]
    pub expected_rate: f32,
    #[serde(rename = "checkIntervalMin")]
    pub check_interval_min: u32,
    #[serde(rename = "autoRecovery")]
    pub auto_recovery: bool,
    #[serde(rename = "lastMeasuredRate")]
    pub last_measured_rate: Option<f32>,
    #[serde(rename = "recoveryRestarts")]
    pub recovery_restarts: u32,
    #[serde(rename = "nextCheckSeconds")]
    pub next_check_seconds: Option<u64>,
    #[serde(rename = "scheduledReset")]
    pub scheduled_reset: bool,
    #[serde(rename = "resetHours")]
    pub reset_hours: u32,
    #[serde(rename = "cpuMhz")]
    pub cpu_mhz: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThermalView {
    #[serde(rename = "currentC")]
    pub current_c: Option<f32>,
    #[serde(rename = "maxC")]
    pub max_c: Option<f32>,
    #[serde(rename = "cpuMhz")]
    pub cpu_mhz: u16,
    pub state: ThermalState,
    #[serde(rename = "protectionEnabled")]
    pub protection_enabled: bool,
    #[serde(rename = "shutdownLimitC")]
    pub shutdown_limit_c: i32,
    #[serde(rename = "sensorFault")]
    pub sensor_fault: bool,
    pub tripped: bool,
    pub latched: bool,
    #[serde(rename = "tripTempC")]
    pub trip_temp_c: Option<f32>,
    #[serde(rename = "tripUptime")]
    pub trip_uptime: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingEntry {
    pub key: &'static str,
    pub value: String,
}
