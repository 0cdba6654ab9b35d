use std::fmt;

use serde::{Serialize, Serializer};

use crate::{
    config::{DeviceSettings, ThresholdMode},
    thermal::{snap_shutdown_limit, LIMIT_MAX_C, LIMIT_MIN_C},
    threshold::{MIN_RATE_CEILING, MIN_RATE_FLOOR},
};

pub const TX_POWER_STEPS_DBM: [f32; 12] = [
    -1.0, 2.0, 5.0, 7.0, 8.5, 11.0, 13.0, 15.0, 17.0, 18.5, 19.0, 19.5,
];

pub const CPU_FREQUENCIES_MHZ: [i64; 3] = [40, 80, 160];

/// Nearest supported TX step. Ties go to the first (lowest) candidate scanned.
pub fn snap_tx_power(dbm: f32) -> f32 {
    let mut best = TX_POWER_STEPS_DBM[0];
    let mut best_distance = (dbm - best).abs();
    for step in TX_POWER_STEPS_DBM.iter().copied().skip(1) {
        let distance = (dbm - step).abs();
        if distance < best_distance {
            best = step;
            best_distance = distance;
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Gain,
    SampleRate,
    BufferSize,
    ShiftBits,
    WifiTxPower,
    AutoRecovery,
    ThresholdMode,
    MinRate,
    CheckInterval,
    ScheduledReset,
    ResetHours,
    CpuFrequency,
    HighPassEnabled,
    HighPassCutoff,
    ThermalEnabled,
    ThermalLimit,
    TimeOffset,
    TimeSync,
    StreamSchedule,
    StreamStart,
    StreamStop,
    DeepSleep,
    NameService,
    BrokerEnabled,
    BrokerHost,
    BrokerPort,
    BrokerUser,
    BrokerPass,
    BrokerTopic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind {
    Float { min: f32, max: f32 },
    Integer { min: i64, max: i64 },
    OneOf(&'static [i64]),
    Toggle,
    Mode,
    Text {
        max_len: usize,
        allow_empty: bool,
        forbidden: &'static [char],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    Exact,
    SnapTxPower,
    SnapThermalLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    RestartAudio,
    ApplyTxPower,
    ApplyCpuFrequency,
    ApplyNameService,
    ConfigureThermal,
    SyncTime,
    ReconnectBroker,
    RecomputeThreshold,
    ReevaluateStream,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f32),
    Integer(i64),
    Toggle(bool),
    Mode(ThresholdMode),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Toggle(true) => f.write_str("on"),
            Self::Toggle(false) => f.write_str("off"),
            Self::Mode(mode) => f.write_str(mode.as_str()),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Float(v) => serializer.serialize_f32(*v),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Toggle(v) => serializer.serialize_str(if *v { "on" } else { "off" }),
            Self::Mode(mode) => serializer.serialize_str(mode.as_str()),
            Self::Text(v) => serializer.serialize_str(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingSpec {
    pub key: SettingKey,
    pub name: &'static str,
    pub kind: Kind,
    pub normalize: Normalize,
    pub effects: &'static [Effect],
    pub secret: bool,
}

const fn spec(
    key: SettingKey,
    name: &'static str,
    kind: Kind,
    effects: &'static [Effect],
) -> SettingSpec {
    SettingSpec {
        key,
        name,
        kind,
        normalize: Normalize::Exact,
        effects,
        secret: false,
    }
}

const AUDIO: &[Effect] = &[Effect::RestartAudio];
const AUDIO_AND_THRESHOLD: &[Effect] = &[Effect::RestartAudio, Effect::RecomputeThreshold];
const BROKER: &[Effect] = &[Effect::ReconnectBroker];
const STREAM_GATE: &[Effect] = &[Effect::ReevaluateStream];
const NONE: &[Effect] = &[];

const TEXT: Kind = Kind::Text {
    max_len: 64,
    allow_empty: true,
    forbidden: &[],
};

pub static REGISTRY: [SettingSpec; 29] = [
    spec(SettingKey::Gain, "gain", Kind::Float { min: 0.1, max: 100.0 }, AUDIO),
    spec(
        SettingKey::SampleRate,
        "rate",
        Kind::Integer { min: 8_000, max: 96_000 },
        AUDIO_AND_THRESHOLD,
    ),
    spec(
        SettingKey::BufferSize,
        "buffer",
        Kind::Integer { min: 256, max: 8_192 },
        AUDIO_AND_THRESHOLD,
    ),
    spec(SettingKey::ShiftBits, "shift", Kind::Integer { min: 0, max: 24 }, AUDIO),
    SettingSpec {
        normalize: Normalize::SnapTxPower,
        ..spec(
            SettingKey::WifiTxPower,
            "wifi_tx",
            Kind::Float { min: -1.0, max: 19.5 },
            &[Effect::ApplyTxPower],
        )
    },
    spec(SettingKey::AutoRecovery, "auto_recovery", Kind::Toggle, NONE),
    spec(
        SettingKey::ThresholdMode,
        "thr_mode",
        Kind::Mode,
        &[Effect::RecomputeThreshold],
    ),
    spec(
        SettingKey::MinRate,
        "min_rate",
        Kind::Integer {
            min: MIN_RATE_FLOOR as i64,
            max: MIN_RATE_CEILING as i64,
        },
        NONE,
    ),
    spec(
        SettingKey::CheckInterval,
        "check_interval",
        Kind::Integer { min: 1, max: 60 },
        NONE,
    ),
    spec(SettingKey::ScheduledReset, "sched_reset", Kind::Toggle, NONE),
    spec(
        SettingKey::ResetHours,
        "reset_hours",
        Kind::Integer { min: 1, max: 168 },
        NONE,
    ),
    spec(
        SettingKey::CpuFrequency,
        "cpu_freq",
        Kind::OneOf(&CPU_FREQUENCIES_MHZ),
        &[Effect::ApplyCpuFrequency],
    ),
    spec(SettingKey::HighPassEnabled, "hp_enable", Kind::Toggle, AUDIO),
    spec(
        SettingKey::HighPassCutoff,
        "hp_cutoff",
        Kind::Integer { min: 10, max: 10_000 },
        AUDIO,
    ),
    spec(
        SettingKey::ThermalEnabled,
        "oh_enable",
        Kind::Toggle,
        &[Effect::ConfigureThermal],
    ),
    SettingSpec {
        normalize: Normalize::SnapThermalLimit,
        ..spec(
            SettingKey::ThermalLimit,
            "oh_limit",
            Kind::Integer {
                min: LIMIT_MIN_C as i64,
                max: LIMIT_MAX_C as i64,
            },
            &[Effect::ConfigureThermal],
        )
    },
    spec(
        SettingKey::TimeOffset,
        "time_offset",
        Kind::Integer { min: -720, max: 840 },
        STREAM_GATE,
    ),
    spec(
        SettingKey::TimeSync,
        "time_sync",
        Kind::Toggle,
        &[Effect::SyncTime, Effect::ReevaluateStream],
    ),
    spec(SettingKey::StreamSchedule, "stream_sched", Kind::Toggle, STREAM_GATE),
    spec(
        SettingKey::StreamStart,
        "stream_start",
        Kind::Integer { min: 0, max: 1_439 },
        STREAM_GATE,
    ),
    spec(
        SettingKey::StreamStop,
        "stream_stop",
        Kind::Integer { min: 0, max: 1_439 },
        STREAM_GATE,
    ),
    spec(SettingKey::DeepSleep, "deep_sleep", Kind::Toggle, NONE),
    spec(
        SettingKey::NameService,
        "mdns",
        Kind::Toggle,
        &[Effect::ApplyNameService],
    ),
    spec(SettingKey::BrokerEnabled, "mqtt_enable", Kind::Toggle, BROKER),
    spec(
        SettingKey::BrokerHost,
        "mqtt_host",
        Kind::Text {
            max_len: 64,
            allow_empty: false,
            forbidden: &[' ', '/'],
        },
        BROKER,
    ),
    spec(
        SettingKey::BrokerPort,
        "mqtt_port",
        Kind::Integer { min: 1, max: 65_535 },
        BROKER,
    ),
    spec(SettingKey::BrokerUser, "mqtt_user", TEXT, BROKER),
    SettingSpec {
        secret: true,
        ..spec(SettingKey::BrokerPass, "mqtt_pass", TEXT, BROKER)
    },
    spec(
        SettingKey::BrokerTopic,
        "mqtt_topic",
        Kind::Text {
            max_len: 64,
            allow_empty: false,
            forbidden: &['#', '+', ' '],
        },
        BROKER,
    ),
];

pub fn lookup(name: &str) -> Option<&'static SettingSpec> {
    REGISTRY.iter().find(|spec| spec.name == name)
}

pub fn spec_for(key: SettingKey) -> &'static SettingSpec {
    // REGISTRY holds exactly one entry per SettingKey variant.
    REGISTRY
        .iter()
        .find(|spec| spec.key == key)
        .unwrap_or(&REGISTRY[0])
}

impl SettingSpec {
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        let value = match self.kind {
            Kind::Float { .. } => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err("empty value".to_string());
                }
                let parsed = trimmed
                    .parse::<f32>()
                    .map_err(|_| format!("'{trimmed}' is not a number"))?;
                if !parsed.is_finite() {
                    return Err(format!("'{trimmed}' is not a finite number"));
                }
                Value::Float(parsed)
            }
            Kind::Integer { .. } | Kind::OneOf(_) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err("empty value".to_string());
                }
                Value::Integer(
                    trimmed
                        .parse::<i64>()
                        .map_err(|_| format!("'{trimmed}' is not an integer"))?,
                )
            }
            Kind::Toggle => match raw {
                "on" => Value::Toggle(true),
                "off" => Value::Toggle(false),
                _ => return Err("expected 'on' or 'off'".to_string()),
            },
            Kind::Mode => match raw {
                "auto" => Value::Mode(ThresholdMode::Auto),
                "manual" => Value::Mode(ThresholdMode::Manual),
                _ => return Err("expected 'auto' or 'manual'".to_string()),
            },
            Kind::Text { .. } => Value::Text(raw.to_string()),
        };
        self.validate(value)
    }

    pub fn validate(&self, value: Value) -> Result<Value, String> {
        match (self.kind, value) {
            (Kind::Float { min, max }, Value::Float(v)) => {
                if !v.is_finite() || v < min || v > max {
                    return Err(format!("{v} is outside [{min}, {max}]"));
                }
                Ok(Value::Float(match self.normalize {
                    Normalize::SnapTxPower => snap_tx_power(v),
                    _ => v,
                }))
            }
            (Kind::Integer { min, max }, Value::Integer(v)) => {
                if v < min || v > max {
                    return Err(format!("{v} is outside [{min}, {max}]"));
                }
                Ok(Value::Integer(match self.normalize {
                    Normalize::SnapThermalLimit => i64::from(snap_shutdown_limit(v as i32)),
                    _ => v,
                }))
            }
            (Kind::OneOf(allowed), Value::Integer(v)) => {
                if !allowed.contains(&v) {
                    return Err(format!("{v} is not one of {allowed:?}"));
                }
                Ok(Value::Integer(v))
            }
            (Kind::Toggle, value @ Value::Toggle(_)) | (Kind::Mode, value @ Value::Mode(_)) => {
                Ok(value)
            }
            (
                Kind::Text {
                    max_len,
                    allow_empty,
                    forbidden,
                },
                Value::Text(v),
            ) => {
                if v.is_empty() && !allow_empty {
                    return Err("value cannot be empty".to_string());
                }
                if v.len() > max_len {
                    return Err(format!("longer than {max_len} bytes"));
                }
                if v.chars().any(|c| c.is_control() || forbidden.contains(&c)) {
                    return Err("contains a forbidden character".to_string());
                }
                Ok(Value::Text(v))
            }
            _ => Err("wrong value type".to_string()),
        }
    }

    pub fn display(&self, value: &Value) -> String {
        if self.secret {
            return if matches!(value, Value::Text(v) if v.is_empty()) {
                String::new()
            } else {
                "****".to_string()
            };
        }
        value.to_string()
    }
}

impl DeviceSettings {
    pub fn get(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::Gain => Value::Float(self.audio.gain),
            SettingKey::SampleRate => Value::Integer(i64::from(self.audio.sample_rate)),
            SettingKey::BufferSize => Value::Integer(i64::from(self.audio.buffer_size)),
            SettingKey::ShiftBits => Value::Integer(i64::from(self.audio.shift_bits)),
            SettingKey::WifiTxPower => Value::Float(self.system.wifi_tx_dbm),
            SettingKey::AutoRecovery => Value::Toggle(self.reliability.auto_recovery),
            SettingKey::ThresholdMode => Value::Mode(self.reliability.threshold_mode),
            SettingKey::MinRate => Value::Integer(i64::from(self.reliability.min_rate_pkt_s)),
            SettingKey::CheckInterval => {
                Value::Integer(i64::from(self.reliability.check_interval_min))
            }
            SettingKey::ScheduledReset => Value::Toggle(self.reliability.scheduled_reset),
            SettingKey::ResetHours => {
                Value::Integer(i64::from(self.reliability.reset_interval_hours))
            }
            SettingKey::CpuFrequency => Value::Integer(i64::from(self.system.cpu_mhz)),
            SettingKey::HighPassEnabled => Value::Toggle(self.audio.high_pass_enabled),
            SettingKey::HighPassCutoff => Value::Integer(i64::from(self.audio.high_pass_cutoff_hz)),
            SettingKey::ThermalEnabled => Value::Toggle(self.thermal.protection_enabled),
            SettingKey::ThermalLimit => Value::Integer(i64::from(self.thermal.shutdown_limit_c)),
            SettingKey::TimeOffset => Value::Integer(i64::from(self.time.offset_minutes)),
            SettingKey::TimeSync => Value::Toggle(self.time.sync_enabled),
            SettingKey::StreamSchedule => Value::Toggle(self.schedule.stream.enabled),
            SettingKey::StreamStart => Value::Integer(i64::from(self.schedule.stream.start_minute)),
            SettingKey::StreamStop => Value::Integer(i64::from(self.schedule.stream.stop_minute)),
            SettingKey::DeepSleep => Value::Toggle(self.schedule.deep_sleep_enabled),
            SettingKey::NameService => Value::Toggle(self.system.mdns_enabled),
            SettingKey::BrokerEnabled => Value::Toggle(self.broker.enabled),
            SettingKey::BrokerHost => Value::Text(self.broker.host.clone()),
            SettingKey::BrokerPort => Value::Integer(i64::from(self.broker.port)),
            SettingKey::BrokerUser => Value::Text(self.broker.user.clone()),
            SettingKey::BrokerPass => Value::Text(self.broker.pass.clone()),
            SettingKey::BrokerTopic => Value::Text(self.broker.topic.clone()),
        }
    }

    /// Store an already validated value. Mismatched kinds are ignored.
    pub(crate) fn set(&mut self, key: SettingKey, value: Value) {
        match (key, value) {
            (SettingKey::Gain, Value::Float(v)) => self.audio.gain = v,
            (SettingKey::SampleRate, Value::Integer(v)) => self.audio.sample_rate = v as u32,
            (SettingKey::BufferSize, Value::Integer(v)) => self.audio.buffer_size = v as u16,
            (SettingKey::ShiftBits, Value::Integer(v)) => self.audio.shift_bits = v as u8,
            (SettingKey::WifiTxPower, Value::Float(v)) => self.system.wifi_tx_dbm = v,
            (SettingKey::AutoRecovery, Value::Toggle(v)) => self.reliability.auto_recovery = v,
            (SettingKey::ThresholdMode, Value::Mode(v)) => self.reliability.threshold_mode = v,
            (SettingKey::MinRate, Value::Integer(v)) => {
                self.reliability.min_rate_pkt_s = v as u32;
            }
            (SettingKey::CheckInterval, Value::Integer(v)) => {
                self.reliability.check_interval_min = v as u32;
            }
            (SettingKey::ScheduledReset, Value::Toggle(v)) => self.reliability.scheduled_reset = v,
            (SettingKey::ResetHours, Value::Integer(v)) => {
                self.reliability.reset_interval_hours = v as u32;
            }
            (SettingKey::CpuFrequency, Value::Integer(v)) => self.system.cpu_mhz = v as u16,
            (SettingKey::HighPassEnabled, Value::Toggle(v)) => self.audio.high_pass_enabled = v,
            (SettingKey::HighPassCutoff, Value::Integer(v)) => {
                self.audio.high_pass_cutoff_hz = v as u16;
            }
            (SettingKey::ThermalEnabled, Value::Toggle(v)) => self.thermal.protection_enabled = v,
            (SettingKey::ThermalLimit, Value::Integer(v)) => {
                self.thermal.shutdown_limit_c = v as i32;
            }
            (SettingKey::TimeOffset, Value::Integer(v)) => self.time.offset_minutes = v as i32,
            (SettingKey::TimeSync, Value::Toggle(v)) => self.time.sync_enabled = v,
            (SettingKey::StreamSchedule, Value::Toggle(v)) => self.schedule.stream.enabled = v,
            (SettingKey::StreamStart, Value::Integer(v)) => {
                self.schedule.stream.start_minute = v as u16;
            }
            (SettingKey::StreamStop, Value::Integer(v)) => {
                self.schedule.stream.stop_minute = v as u16;
            }
            (SettingKey::DeepSleep, Value::Toggle(v)) => self.schedule.deep_sleep_enabled = v,
            (SettingKey::NameService, Value::Toggle(v)) => self.system.mdns_enabled = v,
            (SettingKey::BrokerEnabled, Value::Toggle(v)) => self.broker.enabled = v,
            (SettingKey::BrokerHost, Value::Text(v)) => self.broker.host = v,
            (SettingKey::BrokerPort, Value::Integer(v)) => self.broker.port = v as u16,
            (SettingKey::BrokerUser, Value::Text(v)) => self.broker.user = v,
            (SettingKey::BrokerPass, Value::Text(v)) => self.broker.pass = v,
            (SettingKey::BrokerTopic, Value::Text(v)) => self.broker.topic = v,
            _ => {}
        }
    }

    /// Re-validate every value loaded from storage. Invalid values fall back to
    /// their defaults; snapped values are re-snapped. Returns one note per repair.
    pub fn sanitize(&mut self) -> Vec<String> {
        let defaults = DeviceSettings::default();
        let mut notes = Vec::new();

        for spec in &REGISTRY {
            let current = self.get(spec.key);
            match spec.validate(current.clone()) {
                Ok(normalized) if normalized == current => {}
                Ok(normalized) => {
                    notes.push(format!(
                        "{}: {} normalized to {}",
                        spec.name,
                        spec.display(&current),
                        spec.display(&normalized)
                    ));
                    self.set(spec.key, normalized);
                }
                Err(reason) => {
                    let fallback = defaults.get(spec.key);
                    notes.push(format!(
                        "{}: {reason}; restored default {}",
                        spec.name,
                        spec.display(&fallback)
                    ));
                    self.set(spec.key, fallback);
                }
            }
        }

        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(name: &str, raw: &str) -> Result<Value, String> {
        lookup(name).unwrap().parse(raw)
    }

    #[test]
    fn every_key_is_registered_once() {
        for spec in &REGISTRY {
            assert_eq!(
                REGISTRY.iter().filter(|s| s.key == spec.key).count(),
                1,
                "{}",
                spec.name
            );
            assert_eq!(
                REGISTRY.iter().filter(|s| s.name == spec.name).count(),
                1,
                "{}",
                spec.name
            );
            assert_eq!(spec_for(spec.key).name, spec.name);
        }
    }

    #[test]
    fn defaults_pass_their_own_validation() {
        let mut settings = DeviceSettings::default();
        assert_eq!(settings.sanitize(), Vec::<String>::new());
    }

    #[test]
    fn numbers_parse_strictly() {
        assert_eq!(parse("gain", " 2.5 "), Ok(Value::Float(2.5)));
        assert_eq!(parse("rate", "16000"), Ok(Value::Integer(16_000)));

        for raw in ["", "   ", "12abc", "1e", "0x10", "NaN", "inf", "--1"] {
            assert!(parse("gain", raw).is_err(), "gain accepted {raw:?}");
        }
        for raw in ["48000.0", "48k", "4 8000", ""] {
            assert!(parse("rate", raw).is_err(), "rate accepted {raw:?}");
        }
    }

    #[test]
    fn out_of_range_is_rejected_not_clamped() {
        assert!(parse("gain", "0.05").is_err());
        assert!(parse("gain", "100.1").is_err());
        assert!(parse("rate", "7999").is_err());
        assert!(parse("buffer", "8193").is_err());
        assert!(parse("shift", "-1").is_err());
        assert!(parse("wifi_tx", "20").is_err());
        assert!(parse("oh_limit", "29").is_err());
        assert!(parse("stream_start", "1440").is_err());
        assert!(parse("mqtt_port", "0").is_err());
    }

    #[test]
    fn out_of_range_for_every_numeric_setting() {
        for spec in &REGISTRY {
            match spec.kind {
                Kind::Integer { min, max } => {
                    assert!(spec.parse(&(min - 1).to_string()).is_err(), "{}", spec.name);
                    assert!(spec.parse(&(max + 1).to_string()).is_err(), "{}", spec.name);
                    assert!(spec.parse(&min.to_string()).is_ok(), "{}", spec.name);
                }
                Kind::Float { min, max } => {
                    assert!(spec.parse(&(min - 0.5).to_string()).is_err(), "{}", spec.name);
                    assert!(spec.parse(&(max + 0.5).to_string()).is_err(), "{}", spec.name);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn tokens_must_be_literal() {
        assert_eq!(parse("auto_recovery", "on"), Ok(Value::Toggle(true)));
        assert_eq!(parse("auto_recovery", "off"), Ok(Value::Toggle(false)));
        assert_eq!(
            parse("thr_mode", "manual"),
            Ok(Value::Mode(ThresholdMode::Manual))
        );

        for raw in ["ON", "true", "1", "yes", " on", ""] {
            assert!(parse("auto_recovery", raw).is_err(), "accepted {raw:?}");
        }
        assert!(parse("thr_mode", "Auto").is_err());
    }

    #[test]
    fn tx_power_snaps_to_nearest_step() {
        assert_eq!(parse("wifi_tx", "14"), Ok(Value::Float(13.0)));
        assert_eq!(parse("wifi_tx", "14.1"), Ok(Value::Float(15.0)));
        assert_eq!(parse("wifi_tx", "19.5"), Ok(Value::Float(19.5)));
        assert_eq!(parse("wifi_tx", "-1"), Ok(Value::Float(-1.0)));
    }

    #[test]
    fn tx_snap_ties_resolve_to_lowest_candidate() {
        // 14.0 is equidistant from 13.0 and 15.0; 0.5 from -1.0 and 2.0.
        assert_eq!(snap_tx_power(14.0), 13.0);
        assert_eq!(snap_tx_power(0.5), -1.0);
        assert_eq!(snap_tx_power(18.75), 18.5);
    }

    #[test]
    fn tx_snap_is_idempotent_and_total() {
        for step in TX_POWER_STEPS_DBM {
            assert_eq!(snap_tx_power(step), step);
        }
        let mut dbm = -50.0_f32;
        while dbm < 50.0 {
            let snapped = snap_tx_power(dbm);
            assert!(TX_POWER_STEPS_DBM.contains(&snapped));
            assert_eq!(snap_tx_power(snapped), snapped);
            dbm += 0.25;
        }
        assert!(TX_POWER_STEPS_DBM.contains(&snap_tx_power(f32::NAN)));
    }

    #[test]
    fn thermal_limit_snaps_down() {
        assert_eq!(parse("oh_limit", "77"), Ok(Value::Integer(75)));
        assert_eq!(parse("oh_limit", "95"), Ok(Value::Integer(95)));
    }

    #[test]
    fn cpu_frequency_uses_allowed_set() {
        assert_eq!(parse("cpu_freq", "40"), Ok(Value::Integer(40)));
        assert_eq!(parse("cpu_freq", "160"), Ok(Value::Integer(160)));
        assert!(parse("cpu_freq", "100").is_err());
        assert!(parse("cpu_freq", "120").is_err());
        assert!(parse("cpu_freq", "240").is_err());
    }

    #[test]
    fn text_fields_reject_bad_characters() {
        assert!(parse("mqtt_topic", "birds/#").is_err());
        assert!(parse("mqtt_topic", "").is_err());
        assert!(parse("mqtt_host", "broker.local").is_ok());
        assert!(parse("mqtt_host", "bad\nhost").is_err());
        assert!(parse("mqtt_user", "").is_ok());
        assert!(parse("mqtt_pass", &"x".repeat(65)).is_err());
    }

    #[test]
    fn secrets_are_redacted_for_display() {
        let spec = lookup("mqtt_pass").unwrap();
        assert_eq!(spec.display(&Value::Text("hunter2".to_string())), "****");
        assert_eq!(spec.display(&Value::Text(String::new())), "");
    }

    #[test]
    fn get_and_set_round_trip_every_key() {
        let mut settings = DeviceSettings::default();
        for spec in &REGISTRY {
            let value = settings.get(spec.key);
            settings.set(spec.key, value.clone());
            assert_eq!(settings.get(spec.key), value, "{}", spec.name);
        }
    }

    #[test]
    fn sanitize_repairs_persisted_values() {
        let mut settings = DeviceSettings::default();
        settings.audio.sample_rate = 1_000;
        settings.system.wifi_tx_dbm = 14.1;
        settings.thermal.shutdown_limit_c = 83;

        let notes = settings.sanitize();

        assert_eq!(notes.len(), 3);
        assert_eq!(settings.audio.sample_rate, 48_000);
        assert_eq!(settings.system.wifi_tx_dbm, 15.0);
        assert_eq!(settings.thermal.shutdown_limit_c, 80);
    }
}
