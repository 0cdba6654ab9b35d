use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::{AudioSettings, BrokerSettings, PersistedState},
    error::CollaboratorResult,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioMetrics {
    #[serde(rename = "packetRate")]
    pub packets_per_second: f32,
    #[serde(rename = "packetsSent")]
    pub packets_sent: u64,
    #[serde(rename = "peakLevel")]
    pub peak_level: f32,
    #[serde(rename = "clientConnected")]
    pub client_connected: bool,
    #[serde(rename = "clientAddress")]
    pub client_address: Option<String>,
    pub streaming: bool,
    #[serde(rename = "lastClientConnectMs")]
    pub last_client_connect_ms: Option<u64>,
    #[serde(rename = "lastStreamStartMs")]
    pub last_stream_start_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    #[serde(rename = "freeKb")]
    pub free_kb: u32,
    #[serde(rename = "minFreeKb")]
    pub min_free_kb: u32,
}

pub trait AudioPipeline {
    fn restart(&mut self, settings: &AudioSettings) -> CollaboratorResult<()>;
    fn set_server_running(&mut self, running: bool) -> CollaboratorResult<()>;
    /// Drops the connected client, if any. Returns whether one was dropped.
    fn disconnect_client(&mut self) -> CollaboratorResult<bool>;
    fn current_metrics(&self) -> AudioMetrics;
}

pub trait Network {
    fn apply_tx_power(&mut self, dbm: f32) -> CollaboratorResult<()>;
    fn set_name_service(&mut self, enabled: bool) -> CollaboratorResult<()>;
    fn forget_credentials(&mut self) -> CollaboratorResult<()>;
    fn rssi(&self) -> Option<i32>;
    fn address(&self) -> Option<String>;
}

pub trait TimeSync {
    /// Current UTC time, or `None` while the clock cannot be trusted.
    fn utc_now(&self) -> Option<DateTime<Utc>>;
    fn attempt_sync(&mut self, quick: bool) -> CollaboratorResult<bool>;
}

pub trait Broker {
    fn request_reconnect(&mut self, settings: &BrokerSettings, force: bool)
        -> CollaboratorResult<()>;
    fn announce(&mut self, status_json: &str) -> CollaboratorResult<()>;
    fn publish_status(&mut self, status_json: &str) -> CollaboratorResult<()>;
}

pub trait SettingsStore {
    fn load(&self) -> CollaboratorResult<Option<PersistedState>>;
    fn save(&mut self, state: &PersistedState) -> CollaboratorResult<()>;
    fn clear(&mut self) -> CollaboratorResult<()>;
}

pub trait System {
    fn set_cpu_frequency(&mut self, mhz: u16) -> CollaboratorResult<()>;
    /// Fire-and-forget restart after `delay_ms`. Not cancellable.
    fn schedule_restart(&mut self, delay_ms: u64);
    fn enter_deep_sleep(&mut self, seconds_until_window: u64) -> CollaboratorResult<()>;
    fn heap_stats(&self) -> Option<HeapStats>;
}

pub trait TemperatureSource {
    fn read_celsius(&mut self) -> Option<f32>;
}

pub struct Collaborators {
    pub audio: Box<dyn AudioPipeline + Send>,
    pub network: Box<dyn Network + Send>,
    pub time: Box<dyn TimeSync + Send>,
    pub broker: Box<dyn Broker + Send>,
    pub store: Box<dyn SettingsStore + Send>,
    pub system: Box<dyn System + Send>,
    pub temperature: Box<dyn TemperatureSource + Send>,
}
