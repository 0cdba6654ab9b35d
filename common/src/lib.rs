pub mod collab;
pub mod config;
pub mod deep_sleep;
pub mod device;
pub mod error;
pub mod log_ring;
pub mod reconcile;
pub mod recovery;
pub mod schedule;
pub mod settings;
pub mod thermal;
pub mod threshold;
pub mod topics;
pub mod types;

pub use collab::{
    AudioMetrics, AudioPipeline, Broker, Collaborators, HeapStats, Network, SettingsStore, System,
    TemperatureSource, TimeSync,
};
pub use config::{BrokerSettings, DeviceConfig, DeviceSettings, PersistedState, ThresholdMode};
pub use deep_sleep::{DeepSleepReport, DeepSleepStatus};
pub use device::{action_names, Device, Outcome, Request};
pub use error::{CollaboratorError, CollaboratorResult, ErrorCode, MutationError};
pub use log_ring::LogRing;
pub use reconcile::EditLocks;
pub use schedule::StreamWindow;
pub use thermal::{LatchRecord, ThermalState};
pub use topics::*;
pub use types::{Ack, AudioStatusView, PerfStatusView, SettingEntry, StatusView, ThermalView};
