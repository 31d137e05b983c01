//! Poll cycle metrics
//!
//! Tracks a rolling window of request latencies and the success rate of the
//! price query, so the front-end can show whether data is actually flowing.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Point-in-time view of the poll metrics
#[derive(Debug, Clone)]
pub struct PollMetrics {
    /// Name of the provider being polled
    pub provider_name: String,
    /// 50th percentile latency of successful requests in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful requests in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    pub total_cycles: u64,
    pub failed_cycles: u64,
    /// When the last successful query completed
    pub last_success_at: Option<DateTime<Utc>>,
}

impl PollMetrics {
    /// Creates metrics with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_cycles: 0,
            failed_cycles: 0,
            last_success_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<LatencySample>,
    total: u64,
    failed: u64,
    last_success_at: Option<DateTime<Utc>>,
}

/// Collects poll cycle outcomes
///
/// Shared between the engine task (writer) and the front-end (reader).
#[derive(Debug)]
pub struct MetricsCollector {
    provider_name: String,
    counters: Mutex<Counters>,
}

impl MetricsCollector {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            counters: Mutex::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    /// Records one price query with its duration and outcome
    pub fn record_cycle(&self, duration: Duration, success: bool) {
        let mut counters = self.counters.lock();
        counters.total += 1;
        if success {
            counters.last_success_at = Some(Utc::now());
        } else {
            counters.failed += 1;
        }

        if counters.samples.len() >= MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Computes current metrics from collected samples
    pub fn snapshot(&self) -> PollMetrics {
        let counters = self.counters.lock();
        if counters.samples.is_empty() {
            return PollMetrics::empty(&self.provider_name);
        }

        let mut latencies: Vec<f64> = counters
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        PollMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate: (counters.total - counters.failed) as f64 / counters.total as f64,
            total_cycles: counters.total,
            failed_cycles: counters.failed,
            last_success_at: counters.last_success_at,
        }
    }
}

/// Nearest-rank percentile of sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return 0.0;
    }

    let rank = (p / 100.0 * n as f64).ceil() as usize;
    sorted_values[rank.saturating_sub(1).min(n - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");
        assert_eq!(collector.snapshot().total_cycles, 0);

        collector.record_cycle(Duration::from_millis(100), true);
        collector.record_cycle(Duration::from_millis(200), true);
        collector.record_cycle(Duration::from_millis(150), false);

        let metrics = collector.snapshot();
        assert_eq!(metrics.provider_name, "test");
        assert_eq!(metrics.total_cycles, 3);
        assert_eq!(metrics.failed_cycles, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
        assert!(metrics.last_success_at.is_some());
        assert_eq!(metrics.latency_p99_ms, 200.0);
    }

    #[test]
    fn test_window_is_bounded() {
        let collector = MetricsCollector::new("test");
        for _ in 0..(MAX_SAMPLES + 20) {
            collector.record_cycle(Duration::from_millis(5), true);
        }
        assert_eq!(collector.counters.lock().samples.len(), MAX_SAMPLES);
        assert_eq!(collector.snapshot().total_cycles, (MAX_SAMPLES + 20) as u64);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 10.0);
        assert_eq!(percentile(&values, 90.0), 9.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[7.0], 99.0), 7.0);
    }

    #[test]
    fn test_median_of_even_window_is_lower_middle() {
        let collector = MetricsCollector::new("test");
        for ms in [40, 10, 30, 20] {
            collector.record_cycle(Duration::from_millis(ms), true);
        }
        assert_eq!(collector.snapshot().latency_p50_ms, 20.0);
    }
}
