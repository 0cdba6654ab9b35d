use std::{
    io::ErrorKind,
    path::PathBuf,
    time::Duration,
};

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, warn};

use rtsp_mic_common::{
    config::AudioSettings, threshold, AudioMetrics, AudioPipeline, CollaboratorResult, HeapStats,
    Network, PersistedState, SettingsStore, System, TemperatureSource, TimeSync,
};

const MIN_TRUSTED_YEAR: i32 = 2024;

#[derive(Debug, Default)]
pub struct HostAudio {
    settings: AudioSettings,
    running: bool,
}

impl AudioPipeline for HostAudio {
    fn restart(&mut self, settings: &AudioSettings) -> CollaboratorResult<()> {
        self.settings = settings.clone();
        info!(
            "audio pipeline configured: {} Hz, gain {}, buffer {}, shift {}, high-pass {} ({} Hz)",
            settings.sample_rate,
            settings.gain,
            settings.buffer_size,
            settings.shift_bits,
            settings.high_pass_enabled,
            settings.high_pass_cutoff_hz
        );
        Ok(())
    }

    fn set_server_running(&mut self, running: bool) -> CollaboratorResult<()> {
        self.running = running;
        info!("rtsp server {}", if running { "listening" } else { "stopped" });
        Ok(())
    }

    fn disconnect_client(&mut self) -> CollaboratorResult<bool> {
        info!("rtsp disconnect requested; no simulated client attached");
        Ok(false)
    }

    fn current_metrics(&self) -> AudioMetrics {
        AudioMetrics {
            packets_per_second: if self.running {
                threshold::expected_packet_rate(
                    self.settings.sample_rate,
                    self.settings.buffer_size,
                )
            } else {
                0.0
            },
            ..AudioMetrics::default()
        }
    }
}

pub struct HostNetwork {
    pub address: Option<String>,
}

impl Network for HostNetwork {
    fn apply_tx_power(&mut self, dbm: f32) -> CollaboratorResult<()> {
        info!("wifi tx power -> {dbm} dBm");
        Ok(())
    }

    fn set_name_service(&mut self, enabled: bool) -> CollaboratorResult<()> {
        info!("mdns {}", if enabled { "advertising" } else { "stopped" });
        Ok(())
    }

    fn forget_credentials(&mut self) -> CollaboratorResult<()> {
        info!("wifi credentials cleared");
        Ok(())
    }

    fn rssi(&self) -> Option<i32> {
        None
    }

    fn address(&self) -> Option<String> {
        self.address.clone()
    }
}

#[derive(Debug, Default)]
pub struct HostClock;

impl TimeSync for HostClock {
    fn utc_now(&self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        (now.year() >= MIN_TRUSTED_YEAR).then_some(now)
    }

    fn attempt_sync(&mut self, quick: bool) -> CollaboratorResult<bool> {
        let synced = self.utc_now().is_some();
        info!(
            "{} time sync: {}",
            if quick { "quick" } else { "full" },
            if synced { "clock valid" } else { "clock not set" }
        );
        Ok(synced)
    }
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join("runtime.json"),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> CollaboratorResult<Option<PersistedState>> {
        match std::fs::read(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_slice::<PersistedState>(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, state: &PersistedState) -> CollaboratorResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(state)?;
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, payload)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> CollaboratorResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct HostSystem;

impl System for HostSystem {
    fn set_cpu_frequency(&mut self, mhz: u16) -> CollaboratorResult<()> {
        info!("cpu frequency -> {mhz} MHz");
        Ok(())
    }

    fn schedule_restart(&mut self, delay_ms: u64) {
        let delay = Duration::from_millis(delay_ms);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    restart_process();
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    restart_process();
                });
            }
        }
    }

    fn enter_deep_sleep(&mut self, seconds_until_window: u64) -> CollaboratorResult<()> {
        info!("deep sleep advised for {seconds_until_window} s; host build stays awake");
        Ok(())
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        None
    }
}

fn restart_process() {
    // The service manager brings the process back up.
    info!("restarting");
    std::process::exit(0);
}

pub struct SysfsTemperature {
    path: PathBuf,
    failing: bool,
}

impl SysfsTemperature {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            failing: false,
        }
    }
}

impl TemperatureSource for SysfsTemperature {
    fn read_celsius(&mut self) -> Option<f32> {
        let reading = std::fs::read_to_string(&self.path)
            .map_err(|err| err.to_string())
            .and_then(|raw| parse_millidegrees(&raw).ok_or_else(|| format!("unparsable {raw:?}")));
        match reading {
            Ok(celsius) => {
                self.failing = false;
                Some(celsius)
            }
            Err(err) => {
                // Once per outage; the thermal machine reports the fault itself.
                if !self.failing {
                    warn!("temperature read from {} failed: {err}", self.path.display());
                }
                self.failing = true;
                None
            }
        }
    }
}

fn parse_millidegrees(raw: &str) -> Option<f32> {
    let millis = raw.trim().parse::<i64>().ok()?;
    Some(millis as f32 / 1_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysfs_reading_is_millidegrees() {
        assert_eq!(parse_millidegrees("48312\n"), Some(48.312));
        assert_eq!(parse_millidegrees("-1500"), Some(-1.5));
        assert_eq!(parse_millidegrees(""), None);
        assert_eq!(parse_millidegrees("hot"), None);
    }

    #[test]
    fn store_round_trips_and_clears() {
        let dir = std::env::temp_dir().join(format!("rtsp-mic-store-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let mut store = JsonFileStore::new(dir.clone());
        assert!(store.load().unwrap().is_none());

        let mut state = PersistedState::default();
        state.settings.audio.sample_rate = 16_000;
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_sensor_reads_as_none() {
        let mut sensor = SysfsTemperature::new(PathBuf::from("/nonexistent/thermal/temp"));
        assert_eq!(sensor.read_celsius(), None);
        assert_eq!(sensor.read_celsius(), None);
    }

    #[test]
    fn host_audio_reports_nominal_rate_only_while_running() {
        let mut audio = HostAudio::default();
        audio.restart(&AudioSettings::default()).unwrap();
        assert_eq!(audio.current_metrics().packets_per_second, 0.0);

        audio.set_server_running(true).unwrap();
        assert_eq!(audio.current_metrics().packets_per_second, 46.875);
    }

    #[test]
    fn host_audio_has_no_client_to_drop() {
        let mut audio = HostAudio::default();
        audio.set_server_running(true).unwrap();
        assert!(!audio.disconnect_client().unwrap());
        assert_eq!(audio.current_metrics().last_client_connect_ms, None);
        assert_eq!(HostSystem.heap_stats(), None);
    }
}
