use serde::{Deserialize, Serialize};

use crate::{schedule::StreamWindow, thermal::LatchRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub settings_save_debounce_ms: u64,
    pub settings_save_retry_ms: u64,
    pub reboot_delay_ms: u64,
    pub log_capacity: usize,
    pub thermal_clear_hysteresis_c: f32,
    pub deep_sleep_grace_ms: u64,
    pub deep_sleep_stabilize_min: u16,
    pub deep_sleep_next_window_min: u16,
    pub broker_status_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            settings_save_debounce_ms: 2_000,
            settings_save_retry_ms: 1_000,
            reboot_delay_ms: 1_000,
            log_capacity: 80,
            thermal_clear_hysteresis_c: 5.0,
            deep_sleep_grace_ms: 120_000,
            deep_sleep_stabilize_min: 2,
            deep_sleep_next_window_min: 10,
            broker_status_interval_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    Auto,
    Manual,
}

impl ThresholdMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub gain: f32,
    pub buffer_size: u16,
    pub shift_bits: u8,
    pub high_pass_enabled: bool,
    pub high_pass_cutoff_hz: u16,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            gain: 1.2,
            buffer_size: 1_024,
            shift_bits: 12,
            high_pass_enabled: true,
            high_pass_cutoff_hz: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilitySettings {
    pub auto_recovery: bool,
    pub threshold_mode: ThresholdMode,
    pub min_rate_pkt_s: u32,
    pub check_interval_min: u32,
    pub scheduled_reset: bool,
    pub reset_interval_hours: u32,
}

impl Default for ReliabilitySettings {
    fn default() -> Self {
        Self {
            auto_recovery: true,
            threshold_mode: ThresholdMode::Auto,
            min_rate_pkt_s: 32,
            check_interval_min: 15,
            scheduled_reset: false,
            reset_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    pub wifi_tx_dbm: f32,
    pub cpu_mhz: u16,
    pub mdns_enabled: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            wifi_tx_dbm: 19.5,
            cpu_mhz: 160,
            mdns_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalSettings {
    pub protection_enabled: bool,
    pub shutdown_limit_c: i32,
}

impl Default for ThermalSettings {
    fn default() -> Self {
        Self {
            protection_enabled: true,
            shutdown_limit_c: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    pub offset_minutes: i32,
    pub sync_enabled: bool,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            offset_minutes: 0,
            sync_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub stream: StreamWindow,
    pub deep_sleep_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub topic: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "192.168.1.100".to_string(),
            port: 1883,
            user: String::new(),
            pass: String::new(),
            topic: "rtsp-mic".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub audio: AudioSettings,
    pub reliability: ReliabilitySettings,
    pub system: SystemSettings,
    pub thermal: ThermalSettings,
    pub time: TimeSettings,
    pub schedule: ScheduleSettings,
    pub broker: BrokerSettings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub settings: DeviceSettings,
    pub latch: Option<LatchRecord>,
}
