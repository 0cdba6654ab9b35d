use crate::config::ReliabilitySettings;

const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = 3_600_000;

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    RestartAudio { measured: f32, threshold: u32 },
    ScheduledReset { uptime_hours: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceMonitor {
    last_check_ms: Option<u64>,
    last_rate: Option<f32>,
    restarts: u32,
    reset_requested: bool,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_rate(&self) -> Option<f32> {
        self.last_rate
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn next_check_in_ms(&self, settings: &ReliabilitySettings, now_ms: u64) -> Option<u64> {
        self.last_check_ms
            .map(|last| (last + interval_ms(settings)).saturating_sub(now_ms))
    }

    pub fn reschedule(&mut self, now_ms: u64) {
        self.last_check_ms = Some(now_ms);
    }

    pub fn poll(
        &mut self,
        settings: &ReliabilitySettings,
        now_ms: u64,
        streaming: bool,
        packet_rate: f32,
    ) -> Option<RecoveryAction> {
        let reset_after_ms = u64::from(settings.reset_interval_hours) * MS_PER_HOUR;
        if settings.scheduled_reset && !self.reset_requested && now_ms >= reset_after_ms {
            self.reset_requested = true;
            return Some(RecoveryAction::ScheduledReset {
                uptime_hours: now_ms / MS_PER_HOUR,
            });
        }

        let Some(last_ms) = self.last_check_ms else {
            self.reschedule(now_ms);
            return None;
        };
        if now_ms < last_ms + interval_ms(settings) {
            return None;
        }
        self.reschedule(now_ms);

        if !streaming {
            self.last_rate = None;
            return None;
        }
        self.last_rate = Some(packet_rate);

        if settings.auto_recovery && packet_rate < settings.min_rate_pkt_s as f32 {
            self.restarts += 1;
            return Some(RecoveryAction::RestartAudio {
                measured: packet_rate,
                threshold: settings.min_rate_pkt_s,
            });
        }
        None
    }
}

fn interval_ms(settings: &ReliabilitySettings) -> u64 {
    u64::from(settings.check_interval_min.max(1)) * MS_PER_MINUTE
}
