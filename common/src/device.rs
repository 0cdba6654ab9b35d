use chrono::{FixedOffset, NaiveTime};
use tracing::{info, warn};

use crate::{
    collab::{AudioMetrics, Collaborators},
    config::{DeviceConfig, DeviceSettings, PersistedState, ThresholdMode},
    deep_sleep::{self, DeepSleepInputs, DeepSleepReport, DeepSleepStatus},
    error::{CollaboratorError, MutationError},
    log_ring::LogRing,
    recovery::{PerformanceMonitor, RecoveryAction},
    settings::{self, Effect, SettingSpec, REGISTRY},
    thermal::{ThermalEvent, ThermalProtection},
    threshold,
    types::{
        format_minute_of_day, format_since, format_uptime, latency_ms, profile_name, Ack,
        AudioStatusView, PerfStatusView, SettingEntry, StatusView, ThermalView,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Set {
        key: Option<String>,
        value: Option<String>,
    },
    Action(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub key: &'static str,
    pub value: Option<String>,
    pub message: String,
}

impl Outcome {
    fn action(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            key: name,
            value: None,
            message: message.into(),
        }
    }
}

impl From<Result<Outcome, MutationError>> for Ack {
    fn from(result: Result<Outcome, MutationError>) -> Self {
        match result {
            Ok(outcome) => Self {
                ok: true,
                error: None,
                key: Some(outcome.key),
                value: outcome.value,
                message: outcome.message,
            },
            Err(err) => Self {
                ok: false,
                error: Some(err.code()),
                key: None,
                value: None,
                message: err.to_string(),
            },
        }
    }
}

type ActionFn = fn(&mut Device, u64) -> Result<Outcome, MutationError>;

struct ActionSpec {
    name: &'static str,
    run: ActionFn,
}

static ACTIONS: [ActionSpec; 10] = [
    ActionSpec {
        name: "server_start",
        run: Device::start_server,
    },
    ActionSpec {
        name: "server_stop",
        run: Device::stop_server,
    },
    ActionSpec {
        name: "disconnect_client",
        run: Device::disconnect_client,
    },
    ActionSpec {
        name: "reset_audio",
        run: Device::reset_audio,
    },
    ActionSpec {
        name: "time_sync",
        run: Device::sync_time,
    },
    ActionSpec {
        name: "network_reset",
        run: Device::reset_network,
    },
    ActionSpec {
        name: "mqtt_announce",
        run: Device::announce,
    },
    ActionSpec {
        name: "thermal_clear",
        run: Device::clear_thermal,
    },
    ActionSpec {
        name: "reboot",
        run: Device::reboot,
    },
    ActionSpec {
        name: "factory_reset",
        run: Device::factory_reset,
    },
];

pub fn action_names() -> impl Iterator<Item = &'static str> {
    ACTIONS.iter().map(|action| action.name)
}

pub struct Device {
    config: DeviceConfig,
    settings: DeviceSettings,
    thermal: ThermalProtection,
    logs: LogRing,
    monitor: PerformanceMonitor,
    collab: Collaborators,
    credential: String,

    // User intent. The gate below decides whether the server actually runs.
    server_enabled: bool,
    server_running: bool,
    reboot_pending: bool,
    pending_save_at_ms: Option<u64>,
    last_status_publish_ms: Option<u64>,
    last_sleep_status: DeepSleepStatus,
}

impl Device {
    pub fn new(
        config: DeviceConfig,
        collab: Collaborators,
        credential: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        let mut notes = Vec::new();
        let persisted = match collab.store.load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                notes.push("no stored settings; using defaults".to_string());
                PersistedState::default()
            }
            Err(err) => {
                warn!("settings load failed: {err}");
                notes.push(format!("settings load failed ({err}); using defaults"));
                PersistedState::default()
            }
        };

        let PersistedState {
            mut settings,
            latch,
        } = persisted;
        let repairs = settings.sanitize();
        let thermal =
            ThermalProtection::new(&settings.thermal, latch, config.thermal_clear_hysteresis_c);

        let mut device = Self {
            logs: LogRing::new(config.log_capacity),
            config,
            settings,
            thermal,
            monitor: PerformanceMonitor::new(),
            collab,
            credential: credential.into(),
            server_enabled: true,
            server_running: false,
            reboot_pending: false,
            pending_save_at_ms: None,
            last_status_publish_ms: None,
            last_sleep_status: DeepSleepStatus::Disabled,
        };

        device.log(now_ms, format!("boot: firmware {}", env!("CARGO_PKG_VERSION")));
        for note in notes {
            device.log(now_ms, note);
        }
        if !repairs.is_empty() {
            for repair in repairs {
                device.log(now_ms, format!("stored {repair}"));
            }
            device.queue_save(now_ms);
        }
        if device.thermal.is_latched() {
            device.log(
                now_ms,
                "THERMAL: latch restored from storage; stream server held off until acknowledged",
            );
        }

        for effect in [
            Effect::RestartAudio,
            Effect::ApplyTxPower,
            Effect::ApplyCpuFrequency,
            Effect::ApplyNameService,
            Effect::SyncTime,
        ] {
            device.run_effect(effect, now_ms);
        }
        if device.settings.broker.enabled {
            if let Err(err) = device
                .collab
                .broker
                .request_reconnect(&device.settings.broker, false)
            {
                device.log_failure(now_ms, "broker connect", err);
            }
        }
        device.reconcile_stream(now_ms);
        device
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn thermal(&self) -> &ThermalProtection {
        &self.thermal
    }

    pub fn logs(&self) -> &LogRing {
        &self.logs
    }

    pub fn is_server_enabled(&self) -> bool {
        self.server_enabled
    }

    pub fn is_server_running(&self) -> bool {
        self.server_running
    }

    pub fn is_reboot_pending(&self) -> bool {
        self.reboot_pending
    }

    pub fn pending_save_at_ms(&self) -> Option<u64> {
        self.pending_save_at_ms
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            settings: self.settings.clone(),
            latch: self.thermal.latch().cloned(),
        }
    }

    pub fn handle(
        &mut self,
        credential: Option<&str>,
        request: &Request,
        now_ms: u64,
    ) -> Result<Outcome, MutationError> {
        if credential != Some(self.credential.as_str()) {
            warn!("mutation refused: missing or incorrect credential");
            return Err(MutationError::Forbidden);
        }

        let result = match request {
            Request::Set { key, value } => self.set(key.as_deref(), value.as_deref(), now_ms),
            Request::Action(name) => {
                match ACTIONS.iter().find(|action| action.name == name.as_str()) {
                    Some(action) => (action.run)(self, now_ms),
                    None => Err(MutationError::UnknownKey(name.clone())),
                }
            }
        };
        if let Err(err) = &result {
            warn!("mutation rejected: {err}");
        }
        result
    }

    fn set(
        &mut self,
        key: Option<&str>,
        raw: Option<&str>,
        now_ms: u64,
    ) -> Result<Outcome, MutationError> {
        let key = key
            .filter(|key| !key.is_empty())
            .ok_or(MutationError::MissingKey)?;
        let spec =
            settings::lookup(key).ok_or_else(|| MutationError::UnknownKey(key.to_string()))?;
        let raw = raw.ok_or_else(|| MutationError::invalid(spec.name, "missing value"))?;
        let value = spec
            .parse(raw)
            .map_err(|reason| MutationError::invalid(spec.name, reason))?;

        Ok(self.apply(spec, value, now_ms))
    }

    fn apply(
        &mut self,
        spec: &'static SettingSpec,
        value: settings::Value,
        now_ms: u64,
    ) -> Outcome {
        let shown = spec.display(&value);
        self.settings.set(spec.key, value);
        self.queue_save(now_ms);
        for effect in spec.effects {
            self.run_effect(*effect, now_ms);
        }
        self.log(now_ms, format!("{} set to {shown}", spec.name));

        Outcome {
            key: spec.name,
            message: format!("{} updated", spec.name),
            value: Some(shown),
        }
    }

    fn run_effect(&mut self, effect: Effect, now_ms: u64) {
        let (what, result) = match effect {
            Effect::RestartAudio => {
                self.monitor.reschedule(now_ms);
                ("audio restart", self.collab.audio.restart(&self.settings.audio))
            }
            Effect::ApplyTxPower => (
                "tx power",
                self.collab
                    .network
                    .apply_tx_power(self.settings.system.wifi_tx_dbm),
            ),
            Effect::ApplyCpuFrequency => (
                "cpu frequency",
                self.collab
                    .system
                    .set_cpu_frequency(self.settings.system.cpu_mhz),
            ),
            Effect::ApplyNameService => (
                "name service",
                self.collab
                    .network
                    .set_name_service(self.settings.system.mdns_enabled),
            ),
            Effect::ReconnectBroker => (
                "broker reconnect",
                self.collab
                    .broker
                    .request_reconnect(&self.settings.broker, true),
            ),
            Effect::SyncTime => {
                if !self.settings.time.sync_enabled {
                    return;
                }
                ("time sync", self.collab.time.attempt_sync(true).map(|_| ()))
            }
            Effect::ConfigureThermal => {
                self.thermal.configure(&self.settings.thermal);
                return;
            }
            Effect::RecomputeThreshold => {
                self.recompute_threshold(now_ms);
                return;
            }
            Effect::ReevaluateStream => {
                self.reconcile_stream(now_ms);
                return;
            }
        };

        if let Err(err) = result {
            self.log_failure(now_ms, what, err);
        }
    }

    fn recompute_threshold(&mut self, now_ms: u64) {
        if self.settings.reliability.threshold_mode != ThresholdMode::Auto {
            return;
        }
        let audio = &self.settings.audio;
        let recommended = threshold::recommended(audio.sample_rate, audio.buffer_size);
        if recommended != self.settings.reliability.min_rate_pkt_s {
            self.settings.reliability.min_rate_pkt_s = recommended;
            self.log(now_ms, format!("min_rate auto-set to {recommended} pkt/s"));
        }
    }

    fn local_time(&self) -> Option<NaiveTime> {
        if !self.settings.time.sync_enabled {
            return None;
        }
        let utc = self.collab.time.utc_now()?;
        let offset = FixedOffset::east_opt(self.settings.time.offset_minutes * 60)?;
        Some(utc.with_timezone(&offset).time())
    }

    pub fn schedule_allows(&self) -> bool {
        let window = self.settings.schedule.stream;
        match self.local_time() {
            Some(now) => window.allowed_now(now, true),
            None => window.allowed_now(NaiveTime::default(), false),
        }
    }

    fn reconcile_stream(&mut self, now_ms: u64) {
        let schedule_allows = self.schedule_allows();
        let want = self.server_enabled && schedule_allows && self.thermal.permits_stream();
        if want == self.server_running {
            return;
        }

        if let Err(err) = self.collab.audio.set_server_running(want) {
            let what = if want {
                "stream server start"
            } else {
                "stream server stop"
            };
            self.log_failure(now_ms, what, err);
            return;
        }
        self.server_running = want;

        let text = if want {
            "stream server started"
        } else if !self.thermal.permits_stream() {
            "stream server stopped: thermal protection"
        } else if !schedule_allows {
            "stream server stopped: outside stream window"
        } else {
            "stream server stopped"
        };
        self.log(now_ms, text);
    }

    pub fn tick(&mut self, now_ms: u64) {
        let reading = self.collab.temperature.read_celsius();
        if let Some(event) = self.thermal.sample(reading, now_ms) {
            self.on_thermal_event(event, now_ms);
        }

        self.reconcile_stream(now_ms);

        let metrics = self.collab.audio.current_metrics();
        match self.monitor.poll(
            &self.settings.reliability,
            now_ms,
            metrics.streaming,
            metrics.packets_per_second,
        ) {
            Some(RecoveryAction::RestartAudio {
                measured,
                threshold,
            }) => {
                self.log(
                    now_ms,
                    format!(
                        "packet rate {measured:.1} pkt/s below {threshold}; restarting audio"
                    ),
                );
                self.run_effect(Effect::RestartAudio, now_ms);
            }
            Some(RecoveryAction::ScheduledReset { uptime_hours }) => {
                self.schedule_reboot(
                    now_ms,
                    &format!("scheduled reset after {uptime_hours} h uptime"),
                );
            }
            None => {}
        }

        self.flush_pending_save(now_ms);
        self.publish_status_if_due(now_ms);
        self.advise_deep_sleep(now_ms, &metrics);
    }

    fn on_thermal_event(&mut self, event: ThermalEvent, now_ms: u64) {
        match event {
            ThermalEvent::Tripped { temp_c, limit_c } => {
                self.log(
                    now_ms,
                    format!("THERMAL: {temp_c:.1}C reached limit {limit_c}C; protection latched"),
                );
                self.persist_now(now_ms);
            }
            ThermalEvent::SoftTripCleared { temp_c } => self.log(
                now_ms,
                format!("THERMAL: cooled to {temp_c:.1}C; latch held until acknowledged"),
            ),
            ThermalEvent::SensorFault => {
                self.log(now_ms, "THERMAL: sensor unreadable; protection paused");
            }
            ThermalEvent::SensorRecovered { temp_c } => {
                self.log(now_ms, format!("THERMAL: sensor recovered at {temp_c:.1}C"));
            }
        }
    }

    fn publish_status_if_due(&mut self, now_ms: u64) {
        if !self.settings.broker.enabled {
            return;
        }
        let due = self.last_status_publish_ms.map_or(true, |last| {
            now_ms.saturating_sub(last) >= self.config.broker_status_interval_ms
        });
        if !due {
            return;
        }
        self.last_status_publish_ms = Some(now_ms);

        let result = serde_json::to_string(&self.status_view(now_ms))
            .map_err(CollaboratorError::from)
            .and_then(|json| self.collab.broker.publish_status(&json));
        if let Err(err) = result {
            self.log_failure(now_ms, "broker status publish", err);
        }
    }

    pub fn deep_sleep_report(&self, now_ms: u64) -> DeepSleepReport {
        self.evaluate_deep_sleep(now_ms, &self.collab.audio.current_metrics())
    }

    fn evaluate_deep_sleep(&self, now_ms: u64, metrics: &AudioMetrics) -> DeepSleepReport {
        deep_sleep::evaluate(
            &DeepSleepInputs {
                deep_sleep_enabled: self.settings.schedule.deep_sleep_enabled,
                window: self.settings.schedule.stream,
                local_time: self.local_time(),
                uptime_ms: now_ms,
                client_connected: metrics.client_connected,
                streaming: metrics.streaming,
                reboot_pending: self.reboot_pending,
            },
            &self.config,
        )
    }

    fn advise_deep_sleep(&mut self, now_ms: u64, metrics: &AudioMetrics) {
        let report = self.evaluate_deep_sleep(now_ms, metrics);
        if report.status == self.last_sleep_status {
            return;
        }
        self.last_sleep_status = report.status;
        self.log(now_ms, format!("deep sleep: {}", report.status.as_str()));

        if report.status == DeepSleepStatus::ReadyToSleep {
            if let Some(seconds) = report.next_action_seconds {
                if let Err(err) = self.collab.system.enter_deep_sleep(seconds) {
                    self.log_failure(now_ms, "deep sleep", err);
                }
            }
        }
    }

    fn start_server(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        if self.thermal.is_latched() {
            return Err(MutationError::ThermalLatched);
        }
        self.server_enabled = true;
        self.reconcile_stream(now_ms);
        self.log(now_ms, "stream server enabled");

        let message = if self.server_running {
            "stream server running"
        } else {
            "stream server enabled; waiting for stream window"
        };
        Ok(Outcome::action("server_start", message))
    }

    fn stop_server(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        self.server_enabled = false;
        self.reconcile_stream(now_ms);
        self.log(now_ms, "stream server disabled");
        Ok(Outcome::action("server_stop", "stream server stopped"))
    }

    fn disconnect_client(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        let message = match self.collab.audio.disconnect_client() {
            Ok(true) => "rtsp client disconnected",
            Ok(false) => "no rtsp client connected",
            Err(err) => {
                self.log_failure(now_ms, "client disconnect", err);
                "client disconnect failed"
            }
        };
        self.log(now_ms, message);
        Ok(Outcome::action("disconnect_client", message))
    }

    fn reset_audio(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        self.run_effect(Effect::RestartAudio, now_ms);
        self.log(now_ms, "audio pipeline reset");
        Ok(Outcome::action("reset_audio", "audio pipeline restarted"))
    }

    fn sync_time(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        if !self.settings.time.sync_enabled {
            return Ok(Outcome::action("time_sync", "time sync is disabled"));
        }
        let message = match self.collab.time.attempt_sync(false) {
            Ok(true) => "time synchronized",
            Ok(false) => "time sync attempt did not complete",
            Err(err) => {
                self.log_failure(now_ms, "time sync", err);
                "time sync failed"
            }
        };
        self.log(now_ms, message);
        self.reconcile_stream(now_ms);
        Ok(Outcome::action("time_sync", message))
    }

    fn reset_network(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        if let Err(err) = self.collab.network.forget_credentials() {
            self.log_failure(now_ms, "forget network credentials", err);
        }
        let message = self.schedule_reboot(now_ms, "network credentials cleared");
        Ok(Outcome::action("network_reset", message))
    }

    fn announce(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        if !self.settings.broker.enabled {
            return Ok(Outcome::action("mqtt_announce", "broker is disabled"));
        }
        let result = serde_json::to_string(&self.status_view(now_ms))
            .map_err(CollaboratorError::from)
            .and_then(|json| self.collab.broker.announce(&json));
        let message = match result {
            Ok(()) => "announce queued",
            Err(err) => {
                self.log_failure(now_ms, "broker announce", err);
                "announce failed"
            }
        };
        self.log(now_ms, format!("broker {message}"));
        Ok(Outcome::action("mqtt_announce", message))
    }

    fn clear_thermal(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        let cleared = self.thermal.acknowledge();
        self.persist_now(now_ms);
        self.server_enabled = true;
        self.reconcile_stream(now_ms);

        let message = if cleared {
            "thermal latch acknowledged; stream server re-enabled"
        } else {
            "no thermal latch held; stream server re-enabled"
        };
        self.log(now_ms, format!("THERMAL: {message}"));
        Ok(Outcome::action("thermal_clear", message))
    }

    fn reboot(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        let message = self.schedule_reboot(now_ms, "reboot requested");
        Ok(Outcome::action("reboot", message))
    }

    fn factory_reset(&mut self, now_ms: u64) -> Result<Outcome, MutationError> {
        if let Err(err) = self.collab.store.clear() {
            self.log_failure(now_ms, "clear stored settings", err);
        }
        self.settings = DeviceSettings::default();
        self.thermal = ThermalProtection::new(
            &self.settings.thermal,
            None,
            self.config.thermal_clear_hysteresis_c,
        );
        self.monitor = PerformanceMonitor::new();
        self.pending_save_at_ms = None;
        self.log(now_ms, "factory reset: settings restored to defaults");

        let message = self.schedule_reboot(now_ms, "factory reset");
        Ok(Outcome::action("factory_reset", message))
    }

    fn schedule_reboot(&mut self, now_ms: u64, reason: &str) -> String {
        if self.reboot_pending {
            return "reboot already scheduled".to_string();
        }
        self.reboot_pending = true;
        if self.pending_save_at_ms.is_some() {
            self.persist_now(now_ms);
        }
        let delay_ms = self.config.reboot_delay_ms;
        self.collab.system.schedule_restart(delay_ms);
        self.log(now_ms, format!("{reason}; rebooting in {delay_ms} ms"));
        format!("rebooting in {delay_ms} ms")
    }

    fn queue_save(&mut self, now_ms: u64) {
        self.pending_save_at_ms =
            Some(now_ms.saturating_add(self.config.settings_save_debounce_ms));
    }

    fn flush_pending_save(&mut self, now_ms: u64) {
        match self.pending_save_at_ms {
            Some(due_ms) if now_ms >= due_ms => self.persist_now(now_ms),
            _ => {}
        }
    }

    fn persist_now(&mut self, now_ms: u64) {
        let state = self.persisted_state();
        match self.collab.store.save(&state) {
            Ok(()) => self.pending_save_at_ms = None,
            Err(err) => {
                self.log_failure(now_ms, "settings save", err);
                self.pending_save_at_ms =
                    Some(now_ms.saturating_add(self.config.settings_save_retry_ms));
            }
        }
    }

    fn log(&mut self, now_ms: u64, text: impl AsRef<str>) {
        let text = text.as_ref();
        info!("{text}");
        self.logs.push(format!("[{}] {text}", format_uptime(now_ms)));
    }

    fn log_failure(&mut self, now_ms: u64, what: &str, err: CollaboratorError) {
        warn!("{what} failed: {err}");
        self.logs
            .push(format!("[{}] {what} failed: {err}", format_uptime(now_ms)));
    }

    pub fn status_view(&self, now_ms: u64) -> StatusView {
        let metrics = self.collab.audio.current_metrics();
        let schedule = &self.settings.schedule.stream;
        let local_time = self.local_time();
        let heap = self.collab.system.heap_stats();

        StatusView {
            version: env!("CARGO_PKG_VERSION"),
            ip: self.collab.network.address(),
            wifi_rssi: self.collab.network.rssi(),
            wifi_tx_dbm: self.settings.system.wifi_tx_dbm,
            uptime: format_uptime(now_ms),
            uptime_seconds: now_ms / 1_000,
            server_enabled: self.server_enabled,
            server_running: self.server_running,
            client_connected: metrics.client_connected,
            client: metrics.client_address.clone(),
            streaming: metrics.streaming,
            packet_rate: metrics.packets_per_second,
            last_client_connect: format_since(metrics.last_client_connect_ms, now_ms),
            last_stream_start: format_since(metrics.last_stream_start_ms, now_ms),
            free_heap_kb: heap.map(|heap| heap.free_kb),
            min_free_heap_kb: heap.map(|heap| heap.min_free_kb),
            time_synced: local_time.is_some(),
            local_time: local_time.map(|time| time.format("%H:%M:%S").to_string()),
            time_offset_min: self.settings.time.offset_minutes,
            schedule_enabled: schedule.enabled,
            schedule_allows: self.schedule_allows(),
            stream_start: format_minute_of_day(schedule.start_minute),
            stream_stop: format_minute_of_day(schedule.stop_minute),
            deep_sleep: self.evaluate_deep_sleep(now_ms, &metrics),
            reboot_pending: self.reboot_pending,
            thermal_latched: self.thermal.is_latched(),
            broker_enabled: self.settings.broker.enabled,
        }
    }

    pub fn audio_view(&self) -> AudioStatusView {
        let audio = &self.settings.audio;
        AudioStatusView {
            sample_rate: audio.sample_rate,
            gain: audio.gain,
            buffer_size: audio.buffer_size,
            shift_bits: audio.shift_bits,
            latency_ms: latency_ms(audio.sample_rate, audio.buffer_size),
            profile: profile_name(audio.buffer_size),
            high_pass_enabled: audio.high_pass_enabled,
            high_pass_cutoff_hz: audio.high_pass_cutoff_hz,
            peak_level: self.collab.audio.current_metrics().peak_level,
        }
    }

    pub fn perf_view(&self, now_ms: u64) -> PerfStatusView {
        let audio = &self.settings.audio;
        let reliability = &self.settings.reliability;
        PerfStatusView {
            min_rate: reliability.min_rate_pkt_s,
            threshold_mode: reliability.threshold_mode,
            recommended_min_rate: threshold::recommended(audio.sample_rate, audio.buffer_size),
            expected_rate: threshold::expected_packet_rate(audio.sample_rate, audio.buffer_size),
            check_interval_min: reliability.check_interval_min,
            auto_recovery: reliability.auto_recovery,
            last_measured_rate: self.monitor.last_rate(),
            recovery_restarts: self.monitor.restarts(),
            next_check_seconds: self
                .monitor
                .next_check_in_ms(reliability, now_ms)
                .map(|ms| ms / 1_000),
            scheduled_reset: reliability.scheduled_reset,
            reset_hours: reliability.reset_interval_hours,
            cpu_mhz: self.settings.system.cpu_mhz,
        }
    }

    pub fn thermal_view(&self) -> ThermalView {
        let latch = self.thermal.latch();
        ThermalView {
            current_c: self.thermal.last_temp_c(),
            max_c: self.thermal.max_temp_c(),
            cpu_mhz: self.settings.system.cpu_mhz,
            state: self.thermal.state(),
            protection_enabled: self.thermal.is_enabled(),
            shutdown_limit_c: self.thermal.limit_c(),
            sensor_fault: self.thermal.sensor_fault(),
            tripped: self.thermal.is_tripped(),
            latched: self.thermal.is_latched(),
            trip_temp_c: latch.map(|l| l.trip_temp_c),
            trip_uptime: latch.map(|l| format_uptime(l.trip_uptime_ms)),
            reason: latch.map(|l| l.reason.clone()),
        }
    }

    pub fn settings_view(&self) -> Vec<SettingEntry> {
        REGISTRY
            .iter()
            .map(|spec| SettingEntry {
                key: spec.name,
                value: spec.display(&self.settings.get(spec.key)),
            })
            .collect()
    }
}
