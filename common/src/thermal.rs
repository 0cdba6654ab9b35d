use serde::{Deserialize, Serialize};

use crate::config::ThermalSettings;

pub const LIMIT_MIN_C: i32 = 30;
pub const LIMIT_MAX_C: i32 = 95;
pub const LIMIT_STEP_C: i32 = 5;

pub fn snap_shutdown_limit(limit_c: i32) -> i32 {
    let clamped = limit_c.clamp(LIMIT_MIN_C, LIMIT_MAX_C);
    LIMIT_MIN_C + (clamped - LIMIT_MIN_C) / LIMIT_STEP_C * LIMIT_STEP_C
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalState {
    Disabled,
    Armed,
    SoftTripped,
    Latched,
    SensorFault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatchRecord {
    #[serde(rename = "tripTempC")]
    pub trip_temp_c: f32,
    #[serde(rename = "tripUptimeMs")]
    pub trip_uptime_ms: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThermalEvent {
    Tripped { temp_c: f32, limit_c: i32 },
    SoftTripCleared { temp_c: f32 },
    SensorFault,
    SensorRecovered { temp_c: f32 },
}

#[derive(Debug, Clone)]
pub struct ThermalProtection {
    enabled: bool,
    limit_c: i32,
    clear_hysteresis_c: f32,
    sensor_fault: bool,
    tripped: bool,
    latch: Option<LatchRecord>,
    last_temp_c: Option<f32>,
    max_temp_c: Option<f32>,
}

impl ThermalProtection {
    pub fn new(
        settings: &ThermalSettings,
        latch: Option<LatchRecord>,
        clear_hysteresis_c: f32,
    ) -> Self {
        Self {
            enabled: settings.protection_enabled,
            limit_c: snap_shutdown_limit(settings.shutdown_limit_c),
            clear_hysteresis_c,
            sensor_fault: false,
            tripped: false,
            latch,
            last_temp_c: None,
            max_temp_c: None,
        }
    }

    pub fn configure(&mut self, settings: &ThermalSettings) {
        self.enabled = settings.protection_enabled;
        self.limit_c = snap_shutdown_limit(settings.shutdown_limit_c);
    }

    pub fn state(&self) -> ThermalState {
        if self.tripped {
            ThermalState::SoftTripped
        } else if self.latch.is_some() {
            ThermalState::Latched
        } else if !self.enabled {
            ThermalState::Disabled
        } else if self.sensor_fault {
            ThermalState::SensorFault
        } else {
            ThermalState::Armed
        }
    }

    pub fn is_latched(&self) -> bool {
        self.latch.is_some()
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    pub fn limit_c(&self) -> i32 {
        self.limit_c
    }

    pub fn latch(&self) -> Option<&LatchRecord> {
        self.latch.as_ref()
    }

    pub fn last_temp_c(&self) -> Option<f32> {
        self.last_temp_c
    }

    pub fn max_temp_c(&self) -> Option<f32> {
        self.max_temp_c
    }

    pub fn permits_stream(&self) -> bool {
        !self.tripped && self.latch.is_none()
    }

    pub fn sample(&mut self, reading: Option<f32>, uptime_ms: u64) -> Option<ThermalEvent> {
        let Some(temp_c) = reading.filter(|t| t.is_finite()) else {
            if self.sensor_fault {
                return None;
            }
            self.sensor_fault = true;
            return Some(ThermalEvent::SensorFault);
        };

        let recovered = std::mem::replace(&mut self.sensor_fault, false);
        self.last_temp_c = Some(temp_c);
        self.max_temp_c = Some(self.max_temp_c.map_or(temp_c, |max| max.max(temp_c)));

        if self.tripped {
            if temp_c < self.limit_c as f32 - self.clear_hysteresis_c {
                self.tripped = false;
                return Some(ThermalEvent::SoftTripCleared { temp_c });
            }
            return None;
        }

        if self.enabled && temp_c >= self.limit_c as f32 {
            self.tripped = true;
            self.latch = Some(LatchRecord {
                trip_temp_c: temp_c,
                trip_uptime_ms: uptime_ms,
                reason: format!(
                    "temperature {temp_c:.1}C reached shutdown limit {}C",
                    self.limit_c
                ),
            });
            return Some(ThermalEvent::Tripped {
                temp_c,
                limit_c: self.limit_c,
            });
        }

        if recovered {
            return Some(ThermalEvent::SensorRecovered { temp_c });
        }
        None
    }

    /// Explicit human acknowledgement. Returns whether anything was cleared.
    pub fn acknowledge(&mut self) -> bool {
        let had_trip = self.tripped || self.latch.is_some();
        self.tripped = false;
        self.latch = None;
        had_trip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed() -> ThermalProtection {
        ThermalProtection::new(
            &ThermalSettings {
                protection_enabled: true,
                shutdown_limit_c: 80,
            },
            None,
            5.0,
        )
    }

    #[test]
    fn limit_snaps_down_onto_grid() {
        assert_eq!(snap_shutdown_limit(84), 80);
        assert_eq!(snap_shutdown_limit(85), 85);
        assert_eq!(snap_shutdown_limit(31), 30);
        assert_eq!(snap_shutdown_limit(10), 30);
        assert_eq!(snap_shutdown_limit(120), 95);
    }

    #[test]
    fn trip_sets_soft_trip_and_latch() {
        let mut thermal = armed();
        assert_eq!(thermal.sample(Some(60.0), 1_000), None);
        assert_eq!(thermal.state(), ThermalState::Armed);

        let event = thermal.sample(Some(80.0), 2_000);
        assert_eq!(
            event,
            Some(ThermalEvent::Tripped {
                temp_c: 80.0,
                limit_c: 80
            })
        );
        assert_eq!(thermal.state(), ThermalState::SoftTripped);
        assert!(thermal.is_latched());
        assert_eq!(thermal.latch().unwrap().trip_uptime_ms, 2_000);
        assert!(!thermal.permits_stream());
    }

    #[test]
    fn latch_survives_cooling_down() {
        let mut thermal = armed();
        thermal.sample(Some(85.0), 0);

        // Still inside the hysteresis band.
        assert_eq!(thermal.sample(Some(76.0), 1_000), None);
        assert!(thermal.is_tripped());

        let event = thermal.sample(Some(70.0), 2_000);
        assert_eq!(event, Some(ThermalEvent::SoftTripCleared { temp_c: 70.0 }));
        assert_eq!(thermal.state(), ThermalState::Latched);
        assert!(!thermal.permits_stream());
    }

    #[test]
    fn acknowledge_clears_latch_and_metadata() {
        let mut thermal = armed();
        thermal.sample(Some(90.0), 0);
        thermal.sample(Some(40.0), 1_000);

        assert!(thermal.acknowledge());
        assert_eq!(thermal.state(), ThermalState::Armed);
        assert!(thermal.latch().is_none());
        assert!(thermal.permits_stream());
        assert!(!thermal.acknowledge());
    }

    #[test]
    fn sensor_fault_pauses_without_clearing_latch() {
        let mut thermal = armed();
        thermal.sample(Some(82.0), 0);
        thermal.sample(Some(50.0), 500);

        assert_eq!(thermal.sample(None, 1_000), Some(ThermalEvent::SensorFault));
        assert_eq!(thermal.sample(None, 2_000), None);
        assert!(thermal.sensor_fault());
        assert!(thermal.is_latched());
        assert_eq!(thermal.state(), ThermalState::Latched);
    }

    #[test]
    fn faulty_reading_never_trips() {
        let mut thermal = armed();
        assert_eq!(thermal.sample(Some(f32::NAN), 0), Some(ThermalEvent::SensorFault));
        assert_eq!(thermal.state(), ThermalState::SensorFault);
        assert!(!thermal.is_latched());

        assert_eq!(
            thermal.sample(Some(45.0), 1_000),
            Some(ThermalEvent::SensorRecovered { temp_c: 45.0 })
        );
        assert_eq!(thermal.state(), ThermalState::Armed);
    }

    #[test]
    fn disabled_protection_does_not_trip() {
        let mut thermal = ThermalProtection::new(
            &ThermalSettings {
                protection_enabled: false,
                shutdown_limit_c: 50,
            },
            None,
            5.0,
        );
        assert_eq!(thermal.sample(Some(99.0), 0), None);
        assert_eq!(thermal.state(), ThermalState::Disabled);
        assert_eq!(thermal.max_temp_c(), Some(99.0));
    }

    #[test]
    fn persisted_latch_is_restored_at_boot() {
        let record = LatchRecord {
            trip_temp_c: 88.0,
            trip_uptime_ms: 12_000,
            reason: "previous boot".to_string(),
        };
        let thermal = ThermalProtection::new(&ThermalSettings::default(), Some(record), 5.0);

        assert_eq!(thermal.state(), ThermalState::Latched);
        assert!(!thermal.permits_stream());
    }
}
