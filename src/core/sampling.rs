//! Log sampling for high-volume scenarios
//!
//! A [`SamplingFacility`] wraps another facility and drops a share of the
//! entries it would otherwise accept, while guaranteeing that configured
//! levels are never dropped.
//!
//! # Features
//!
//! - **Random Sampling**: Configurable sample rate between 0.0 and 1.0
//! - **Level Bypass**: Critical levels are never sampled
//! - **Category-based Sampling**: Loggers carrying a `category` field use
//!   that category's rate
//! - **Adaptive Sampling**: Automatically lowers the rate under heavy load
//!
//! # Example
//!
//! ```
//! use rust_structured_logger::prelude::*;
//!
//! let logger = Logger::builder()
//!     .output(std::sync::Arc::new(MemorySink::new()))
//!     .sampling(SamplingConfig::new(0.1).with_category_rate("database", 0.01))
//!     .build();
//! ```

use super::checked_entry::CheckedEntry;
use super::entry::Entry;
use super::error::Result;
use super::facility::Facility;
use super::field::{Field, FieldValue};
use super::level::Level;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Key of the context field that selects a category rate
pub const CATEGORY_KEY: &str = "category";

/// Configuration for log sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Sample rate between 0.0 and 1.0
    ///
    /// - 1.0 = no sampling (log everything)
    /// - 0.1 = sample 10% of logs
    /// - 0.0 = drop all logs (except always_sample levels)
    pub rate: f64,

    /// Levels that are never sampled (always logged)
    pub always_sample: Vec<Level>,

    /// Per-category sample rates
    pub category_rates: HashMap<String, f64>,

    /// Lower the rate when throughput exceeds `adaptive_threshold`
    pub adaptive: bool,

    /// Messages per second that trigger adaptive sampling
    pub adaptive_threshold: usize,

    /// Adaptive sampling never goes below this rate
    pub adaptive_min_rate: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate: 1.0, // No sampling by default
            always_sample: vec![Level::Error, Level::DPanic, Level::Panic, Level::Fatal],
            category_rates: HashMap::new(),
            adaptive: false,
            adaptive_threshold: 10000,
            adaptive_min_rate: 0.01,
        }
    }
}

impl SamplingConfig {
    /// Create a config with the given rate, clamped to 0.0 - 1.0
    ///
    /// # Example
    ///
    /// ```
    /// use rust_structured_logger::SamplingConfig;
    ///
    /// let config = SamplingConfig::new(0.5); // Sample 50%
    /// assert_eq!(config.rate, 0.5);
    /// ```
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Create a config that always logs all messages (no sampling)
    pub fn no_sampling() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_always_sample(mut self, levels: Vec<Level>) -> Self {
        self.always_sample = levels;
        self
    }

    #[must_use]
    pub fn with_category_rate(mut self, category: impl Into<String>, rate: f64) -> Self {
        self.category_rates
            .insert(category.into(), rate.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_adaptive(mut self, threshold: usize, min_rate: f64) -> Self {
        self.adaptive = true;
        self.adaptive_threshold = threshold;
        self.adaptive_min_rate = min_rate.clamp(0.0, 1.0);
        self
    }

    /// Rates must lie in 0.0 - 1.0; deserialized configs are not clamped
    pub fn validate(&self) -> std::result::Result<(), String> {
        let in_range = |r: f64| (0.0..=1.0).contains(&r);
        if !in_range(self.rate) {
            return Err(format!("rate {} is outside 0.0 - 1.0", self.rate));
        }
        if !in_range(self.adaptive_min_rate) {
            return Err(format!(
                "adaptive_min_rate {} is outside 0.0 - 1.0",
                self.adaptive_min_rate
            ));
        }
        if let Some((name, rate)) = self.category_rates.iter().find(|(_, r)| !in_range(**r)) {
            return Err(format!("rate {} for category '{}' is outside 0.0 - 1.0", rate, name));
        }
        Ok(())
    }
}

/// Metrics for sampling observability
///
/// # Example
///
/// ```
/// use rust_structured_logger::SamplerMetrics;
///
/// let metrics = SamplerMetrics::new();
/// assert_eq!(metrics.sampled_count(), 0);
/// assert_eq!(metrics.dropped_count(), 0);
/// ```
#[derive(Debug)]
pub struct SamplerMetrics {
    sampled_count: AtomicU64,
    dropped_count: AtomicU64,
    total_count: AtomicU64,
}

impl SamplerMetrics {
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            total_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.total_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_sampled(&self) {
        self.sampled_count.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of entries that passed sampling; 1.0 before any entry
    pub fn effective_sample_rate(&self) -> f64 {
        let sampled = self.sampled_count() as f64;
        let total = self.total_count() as f64;

        if total == 0.0 {
            1.0
        } else {
            sampled / total
        }
    }

    pub fn reset(&self) {
        self.sampled_count.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.total_count.store(0, Ordering::Relaxed);
    }
}

impl Default for SamplerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SamplerMetrics {
    fn clone(&self) -> Self {
        Self {
            sampled_count: AtomicU64::new(self.sampled_count()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            total_count: AtomicU64::new(self.total_count()),
        }
    }
}

/// Message rate since creation, in messages per second
#[derive(Debug)]
struct RateTracker {
    window_start: Instant,
    window_count: AtomicUsize,
    last_rate: AtomicU64,
}

impl RateTracker {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            window_count: AtomicUsize::new(0),
            last_rate: AtomicU64::new(0),
        }
    }

    fn record_and_get_rate(&self) -> f64 {
        let count = self.window_count.fetch_add(1, Ordering::Relaxed) + 1;
        let elapsed = self.window_start.elapsed().as_secs_f64();

        if elapsed > 0.0 {
            let rate = count as f64 / elapsed;
            self.last_rate.store(rate.to_bits(), Ordering::Relaxed);
            rate
        } else {
            0.0
        }
    }

    fn current_rate(&self) -> f64 {
        f64::from_bits(self.last_rate.load(Ordering::Relaxed))
    }
}

/// Sampling decision shared by a facility and all of its children
///
/// # Example
///
/// ```
/// use rust_structured_logger::{Level, LogSampler, SamplingConfig};
///
/// let sampler = LogSampler::new(SamplingConfig::new(0.5));
/// let _maybe = sampler.should_sample(Level::Info, None);
///
/// // Critical logs are always sampled
/// assert!(sampler.should_sample(Level::Error, None));
/// ```
pub struct LogSampler {
    config: SamplingConfig,
    metrics: SamplerMetrics,
    rate_tracker: RateTracker,
}

impl LogSampler {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            metrics: SamplerMetrics::new(),
            rate_tracker: RateTracker::new(),
        }
    }

    /// Whether an entry at `level`, in `category`, should be written
    pub fn should_sample(&self, level: Level, category: Option<&str>) -> bool {
        if self.config.always_sample.contains(&level) {
            self.metrics.record_sampled();
            return true;
        }

        let rate = self.effective_rate(category);

        let sample = if rate >= 1.0 {
            true
        } else if rate <= 0.0 {
            false
        } else {
            rand::thread_rng().gen::<f64>() < rate
        };

        if sample {
            self.metrics.record_sampled();
        } else {
            self.metrics.record_dropped();
        }
        sample
    }

    fn effective_rate(&self, category: Option<&str>) -> f64 {
        if let Some(rate) = category.and_then(|c| self.config.category_rates.get(c)) {
            return *rate;
        }

        if self.config.adaptive {
            let current_rate = self.rate_tracker.record_and_get_rate();
            let threshold = self.config.adaptive_threshold as f64;
            if current_rate > threshold {
                let scale = threshold / current_rate;
                return (self.config.rate * scale).max(self.config.adaptive_min_rate);
            }
        }

        self.config.rate
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }

    /// Only meaningful when adaptive sampling is enabled
    pub fn current_message_rate(&self) -> f64 {
        self.rate_tracker.current_rate()
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }
}

impl std::fmt::Debug for LogSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSampler")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// Facility wrapper that samples entries before the inner facility sees them
pub struct SamplingFacility {
    inner: Arc<dyn Facility>,
    sampler: Arc<LogSampler>,
    category: Option<String>,
}

impl SamplingFacility {
    pub fn new(inner: Arc<dyn Facility>, config: SamplingConfig) -> Self {
        Self {
            inner,
            sampler: Arc::new(LogSampler::new(config)),
            category: None,
        }
    }

    pub fn sampler(&self) -> &LogSampler {
        &self.sampler
    }
}

impl Facility for SamplingFacility {
    fn with(&self, fields: &[Field]) -> Arc<dyn Facility> {
        let category = fields
            .iter()
            .rev()
            .find(|f| f.key() == CATEGORY_KEY)
            .and_then(|f| match f.value() {
                FieldValue::String(s) => Some(s.clone()),
                _ => None,
            })
            .or_else(|| self.category.clone());

        Arc::new(SamplingFacility {
            inner: self.inner.with(fields),
            sampler: Arc::clone(&self.sampler),
            category,
        })
    }

    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn check(
        self: Arc<Self>,
        entry: &Entry,
        checked: Option<CheckedEntry>,
    ) -> Option<CheckedEntry> {
        if !self.inner.enabled(entry.level) {
            return checked;
        }
        if self
            .sampler
            .should_sample(entry.level, self.category.as_deref())
        {
            Arc::clone(&self.inner).check(entry, checked)
        } else {
            checked
        }
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        self.inner.write(entry, fields)
    }

    fn sync(&self) -> Result<()> {
        self.inner.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{Clock, EpochClock};
    use crate::core::facility::IoFacility;
    use crate::core::json_encoder::JsonEncoder;
    use crate::sinks::MemorySink;

    fn sampled(config: SamplingConfig) -> (MemorySink, Arc<SamplingFacility>) {
        let sink = MemorySink::new();
        let inner = Arc::new(IoFacility::new(
            Box::new(JsonEncoder::new()),
            Arc::new(sink.clone()),
            Level::Debug,
        ));
        (sink, Arc::new(SamplingFacility::new(inner, config)))
    }

    fn entry(level: Level) -> Entry {
        Entry::new(level, "sampled", EpochClock.now())
    }

    #[test]
    fn test_sampling_config_default() {
        let config = SamplingConfig::default();
        assert_eq!(config.rate, 1.0);
        assert!(config.always_sample.contains(&Level::Error));
        assert!(config.always_sample.contains(&Level::Fatal));
        assert!(!config.adaptive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sampling_config_new_clamps() {
        assert_eq!(SamplingConfig::new(1.5).rate, 1.0);
        assert_eq!(SamplingConfig::new(-0.5).rate, 0.0);
    }

    #[test]
    fn test_sampling_config_builder() {
        let config = SamplingConfig::new(0.3)
            .with_always_sample(vec![Level::Warn, Level::Error, Level::Fatal])
            .with_category_rate("database", 0.01)
            .with_adaptive(50000, 0.001);

        assert!(config.always_sample.contains(&Level::Warn));
        assert_eq!(config.category_rates.get("database"), Some(&0.01));
        assert!(config.adaptive);
        assert_eq!(config.adaptive_threshold, 50000);
    }

    #[test]
    fn test_validate_rejects_unclamped_rates() {
        let config: SamplingConfig = serde_json::from_str(r#"{"rate": 2.0}"#).unwrap();
        assert!(config.validate().is_err());

        let config: SamplingConfig =
            serde_json::from_str(r#"{"category_rates": {"db": -1.0}}"#).unwrap();
        assert!(config.validate().unwrap_err().contains("'db'"));
    }

    #[test]
    fn test_sampler_always_sample_critical() {
        let sampler = LogSampler::new(SamplingConfig::new(0.0));

        assert!(sampler.should_sample(Level::Error, None));
        assert!(sampler.should_sample(Level::Fatal, None));
        for _ in 0..10 {
            assert!(!sampler.should_sample(Level::Debug, None));
            assert!(!sampler.should_sample(Level::Info, None));
        }
    }

    #[test]
    fn test_sampler_category_rate() {
        let sampler = LogSampler::new(SamplingConfig::new(1.0).with_category_rate("noisy", 0.0));
        assert!(sampler.should_sample(Level::Info, None));
        for _ in 0..10 {
            assert!(!sampler.should_sample(Level::Info, Some("noisy")));
        }
    }

    #[test]
    fn test_sampler_statistical_rate() {
        let sampler = LogSampler::new(SamplingConfig::new(0.5));
        let total = 10000;
        let sampled = (0..total)
            .filter(|_| sampler.should_sample(Level::Info, None))
            .count();

        let rate = sampled as f64 / total as f64;
        assert!(
            (0.45..=0.55).contains(&rate),
            "Expected ~50% sample rate, got {}%",
            rate * 100.0
        );
        assert_eq!(sampler.metrics().total_count(), total as u64);
    }

    #[test]
    fn test_sampler_metrics() {
        let metrics = SamplerMetrics::new();
        assert_eq!(metrics.effective_sample_rate(), 1.0);

        metrics.record_sampled();
        metrics.record_sampled();
        metrics.record_dropped();
        assert_eq!(metrics.total_count(), 3);
        assert!((metrics.effective_sample_rate() - 0.666).abs() < 0.01);

        metrics.reset();
        assert_eq!(metrics.total_count(), 0);
    }

    #[test]
    fn test_rate_tracker() {
        let tracker = RateTracker::new();
        for _ in 0..100 {
            tracker.record_and_get_rate();
        }
        assert!(tracker.current_rate() > 0.0);
    }

    #[test]
    fn test_facility_drops_unsampled_entries() {
        let (sink, facility) = sampled(SamplingConfig::new(0.0));
        assert!(Arc::clone(&facility).check(&entry(Level::Info), None).is_none());

        let checked = Arc::clone(&facility).check(&entry(Level::Error), None);
        assert_eq!(checked.map(|c| c.facility_count()), Some(1));
        assert!(sink.contents().is_empty());
        assert_eq!(facility.sampler().metrics().dropped_count(), 1);
    }

    #[test]
    fn test_category_comes_from_context() {
        let (_, facility) = sampled(SamplingConfig::new(1.0).with_category_rate("noisy", 0.0));
        let noisy = facility.with(&[Field::string(CATEGORY_KEY, "noisy")]);
        assert!(noisy.check(&entry(Level::Info), None).is_none());

        let quiet = facility.with(&[Field::string(CATEGORY_KEY, "quiet")]);
        assert!(quiet.check(&entry(Level::Info), None).is_some());
    }
}
