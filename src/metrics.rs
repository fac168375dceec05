//! Latency bookkeeping for the driver: how long the reactor spends per event
//! and how long a translation takes from activation to result. Each metric
//! keeps a bounded window of recent durations; the summary is logged when
//! the driver stops.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, trace};

const DEFAULT_WINDOW: usize = 1024;

pub mod metric_names {
    /// Activation to result, success or failure.
    pub const TRANSLATE_DONE: &str = "t_translate_done";
    /// Reactor time per event.
    pub const EVENT_HANDLED: &str = "t_event_handled";
}

/// Measures from creation until [`TimingSpan::finish`].
pub struct TimingSpan {
    name: &'static str,
    start: Instant,
    registry: Arc<MetricsRegistry>,
}

impl TimingSpan {
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        self.registry.record(self.name, elapsed);
        elapsed
    }
}

/// Most recent `limit` samples, oldest first.
struct Window {
    samples: VecDeque<Duration>,
    limit: usize,
    total: u64,
}

impl Window {
    fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
            total: 0,
        }
    }

    fn push(&mut self, sample: Duration) {
        if self.samples.len() == self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.total += 1;
    }

    fn summary(&self) -> MetricSummary {
        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        MetricSummary {
            recorded: self.total,
            window: sorted.len(),
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            max: sorted.last().copied().unwrap_or_default(),
        }
    }
}

/// Nearest-rank percentile of an ascending slice.
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (p.clamp(0.0, 100.0) * sorted.len() as f64 / 100.0).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    /// Samples ever recorded, including ones that left the window.
    pub recorded: u64,
    pub window: usize,
    pub p50: Duration,
    pub p95: Duration,
    pub max: Duration,
}

pub struct MetricsRegistry {
    windows: Mutex<BTreeMap<&'static str, Window>>,
    window: usize,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            windows: Mutex::new(BTreeMap::new()),
            window,
        }
    }

    pub fn record(&self, name: &'static str, sample: Duration) {
        self.windows
            .lock()
            .entry(name)
            .or_insert_with(|| Window::new(self.window))
            .push(sample);
        trace!(metric = name, elapsed_us = sample.as_micros() as u64, "metric_recorded");
    }

    pub fn span(self: &Arc<Self>, name: &'static str) -> TimingSpan {
        TimingSpan {
            name,
            start: Instant::now(),
            registry: Arc::clone(self),
        }
    }

    pub fn summary(&self, name: &str) -> Option<MetricSummary> {
        self.windows.lock().get(name).map(Window::summary)
    }

    pub fn log_summary(&self) {
        let windows = self.windows.lock();
        for (name, window) in windows.iter() {
            let s = window.summary();
            info!(
                metric = name,
                recorded = s.recorded,
                p50_ms = s.p50.as_secs_f64() * 1e3,
                p95_ms = s.p95.as_secs_f64() * 1e3,
                max_ms = s.max.as_secs_f64() * 1e3,
                "metric_summary"
            );
        }
    }
}
