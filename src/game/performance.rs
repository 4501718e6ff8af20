//! Tick performance monitoring
//!
//! Tracks tick durations against the fixed budget so operators can see when
//! an arena approaches overload before ticks actually start slipping.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::constants::physics::TICK_RATE;

/// Performance status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    /// Well under budget, room to grow
    Excellent,
    /// Normal operation
    Good,
    /// Approaching the tick budget
    Warning,
    /// Nearly exhausting the budget every tick
    Critical,
    /// Sustained overload, ticks are being skipped
    Catastrophic,
}

impl PerformanceStatus {
    /// Whether the arena has headroom for more entities.
    pub fn has_headroom(&self) -> bool {
        matches!(self, PerformanceStatus::Excellent | PerformanceStatus::Good)
    }
}

/// Rolling tick-duration monitor
pub struct PerformanceMonitor {
    /// Rolling window of tick durations
    tick_durations: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Target tick duration (budget)
    target_tick_duration: Duration,
    excellent_threshold: f32,
    warning_threshold: f32,
    critical_threshold: f32,
    catastrophic_threshold: f32,
    status: PerformanceStatus,
    tick_start: Option<Instant>,
    /// Entity count at last measurement
    last_entity_count: usize,
}

impl PerformanceMonitor {
    pub fn new(tick_rate: u32) -> Self {
        let target_tick_duration = Duration::from_secs_f32(1.0 / tick_rate as f32);

        Self {
            // ~5 seconds of samples at 25 Hz
            tick_durations: VecDeque::with_capacity(125),
            max_samples: 125,
            target_tick_duration,
            excellent_threshold: 0.3,
            warning_threshold: 0.7,
            critical_threshold: 0.9,
            catastrophic_threshold: 1.5,
            status: PerformanceStatus::Excellent,
            tick_start: None,
            last_entity_count: 0,
        }
    }

    /// Start timing a tick
    pub fn tick_start(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// End timing a tick and record the duration
    pub fn tick_end(&mut self, entity_count: usize) {
        if let Some(start) = self.tick_start.take() {
            let duration = start.elapsed();
            self.record_tick(duration);
            self.last_entity_count = entity_count;
        }
    }

    fn record_tick(&mut self, duration: Duration) {
        self.tick_durations.push_back(duration);
        while self.tick_durations.len() > self.max_samples {
            self.tick_durations.pop_front();
        }
        self.update_status();
    }

    fn update_status(&mut self) {
        if self.tick_durations.len() < 10 {
            // Not enough data yet
            return;
        }

        let avg = self.average_tick_duration();
        let ratio = avg.as_secs_f32() / self.target_tick_duration.as_secs_f32();

        self.status = if ratio < self.excellent_threshold {
            PerformanceStatus::Excellent
        } else if ratio < self.warning_threshold {
            PerformanceStatus::Good
        } else if ratio < self.critical_threshold {
            PerformanceStatus::Warning
        } else if ratio < self.catastrophic_threshold {
            PerformanceStatus::Critical
        } else {
            PerformanceStatus::Catastrophic
        };
    }

    pub fn average_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.tick_durations.iter().sum();
        sum / self.tick_durations.len() as u32
    }

    /// 95th percentile tick duration over the sample window.
    pub fn p95_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.tick_durations.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted
            .get(idx.min(sorted.len() - 1))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Worst tick in the sample window.
    pub fn max_tick_duration(&self) -> Duration {
        self.tick_durations.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn status(&self) -> PerformanceStatus {
        self.status
    }

    /// Budget usage as a percentage (0-100+)
    pub fn budget_usage_percent(&self) -> f32 {
        let avg = self.average_tick_duration();
        (avg.as_secs_f32() / self.target_tick_duration.as_secs_f32()) * 100.0
    }

    pub fn last_entity_count(&self) -> usize {
        self.last_entity_count
    }

    /// Human-readable one-liner for periodic logging.
    pub fn status_message(&self) -> String {
        format!(
            "{:?} - {:.1}% budget, {} entities",
            self.status,
            self.budget_usage_percent(),
            self.last_entity_count
        )
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_monitor_new() {
        let monitor = PerformanceMonitor::new(25);
        assert_eq!(monitor.status(), PerformanceStatus::Excellent);
        assert_eq!(monitor.average_tick_duration(), Duration::ZERO);
    }

    #[test]
    fn test_excellent_performance() {
        let mut monitor = PerformanceMonitor::new(25);
        // Tick budget is 40ms, excellent is < 30% = 12ms
        for _ in 0..20 {
            monitor.record_tick(Duration::from_millis(5));
        }
        assert_eq!(monitor.status(), PerformanceStatus::Excellent);
        assert!(monitor.status().has_headroom());
    }

    #[test]
    fn test_good_performance() {
        let mut monitor = PerformanceMonitor::new(25);
        // Good is 30-70% of budget = 12-28ms
        for _ in 0..20 {
            monitor.record_tick(Duration::from_millis(20));
        }
        assert_eq!(monitor.status(), PerformanceStatus::Good);
        assert!(monitor.status().has_headroom());
    }

    #[test]
    fn test_warning_performance() {
        let mut monitor = PerformanceMonitor::new(25);
        // Warning is 70-90% of budget = 28-36ms
        for _ in 0..20 {
            monitor.record_tick(Duration::from_millis(30));
        }
        assert_eq!(monitor.status(), PerformanceStatus::Warning);
        assert!(!monitor.status().has_headroom());
    }

    #[test]
    fn test_catastrophic_performance() {
        let mut monitor = PerformanceMonitor::new(25);
        // Catastrophic is > 150% of budget = > 60ms
        for _ in 0..20 {
            monitor.record_tick(Duration::from_millis(70));
        }
        assert_eq!(monitor.status(), PerformanceStatus::Catastrophic);
    }

    #[test]
    fn test_tick_timing() {
        let mut monitor = PerformanceMonitor::new(25);
        monitor.tick_start();
        std::thread::sleep(Duration::from_millis(1));
        monitor.tick_end(10);

        assert!(!monitor.tick_durations.is_empty());
        assert_eq!(monitor.last_entity_count(), 10);
    }

    #[test]
    fn test_p95_tracks_outliers() {
        let mut monitor = PerformanceMonitor::new(25);
        for _ in 0..95 {
            monitor.record_tick(Duration::from_millis(2));
        }
        for _ in 0..5 {
            monitor.record_tick(Duration::from_millis(39));
        }
        assert!(monitor.p95_tick_duration() >= Duration::from_millis(2));
        assert!(monitor.average_tick_duration() < Duration::from_millis(5));
        assert_eq!(monitor.max_tick_duration(), Duration::from_millis(39));
    }
}
