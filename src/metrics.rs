//! Request metrics and statistics tracking for the churn service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::verdict::Verdict;

/// Metrics collector for served requests
pub struct ServiceMetrics {
    /// Predictions answered with a verdict
    pub predictions_served: AtomicU64,
    /// Churn verdicts among them
    pub churn_verdicts: AtomicU64,
    /// Rejected prediction requests by error kind
    rejections: RwLock<HashMap<String, u64>>,
    /// Contact messages stored
    pub contacts_sent: AtomicU64,
    /// Contact messages that could not be stored
    pub contacts_failed: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Churn probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            churn_verdicts: AtomicU64::new(0),
            rejections: RwLock::new(HashMap::new()),
            contacts_sent: AtomicU64::new(0),
            contacts_failed: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a prediction answered with a verdict
    pub fn record_prediction(&self, processing_time: Duration, verdict: Verdict, churn_probability: f64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if verdict == Verdict::Churn {
            self.churn_verdicts.fetch_add(1, Ordering::Relaxed);
        }

        self.record_time(processing_time);

        let bucket = (churn_probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a rejected prediction request
    pub fn record_rejection(&self, processing_time: Duration, kind: &str) {
        self.record_time(processing_time);
        if let Ok(mut rejections) = self.rejections.write() {
            *rejections.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a contact submission outcome
    pub fn record_contact(&self, stored: bool) {
        if stored {
            self.contacts_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.contacts_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Rejections by error kind
    pub fn get_rejections(&self) -> HashMap<String, u64> {
        self.rejections
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Total rejected prediction requests
    pub fn total_rejections(&self) -> u64 {
        self.get_rejections().values().sum()
    }

    /// Get probability distribution
    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or_default()
    }

    /// Predictions per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let churn = self.churn_verdicts.load(Ordering::Relaxed);
        let churn_rate = if served > 0 {
            (churn as f64 / served as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();

        info!("==================== CHURN SERVICE METRICS ====================");
        info!(
            "Predictions served: {:>8} | Throughput: {:>6.1} req/s",
            served,
            self.get_throughput()
        );
        info!(
            "Churn verdicts:     {:>8} | Churn rate: {:>6.1}%",
            churn, churn_rate
        );
        info!(
            "Processing time (us): mean={} p50={} p95={} p99={} max={}",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us, processing.max_us
        );
        for (kind, count) in &self.get_rejections() {
            info!("Rejected ({}): {}", kind, count);
        }
        info!(
            "Contact messages: sent={} failed={}",
            self.contacts_sent.load(Ordering::Relaxed),
            self.contacts_failed.load(Ordering::Relaxed)
        );

        let distribution = self.get_probability_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar = "#".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("===============================================================");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), Verdict::NoChurn, 0.1);
        metrics.record_prediction(Duration::from_micros(200), Verdict::Churn, 0.8);
        metrics.record_rejection(Duration::from_micros(50), "encoding");
        metrics.record_contact(true);

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.churn_verdicts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_rejections(), 1);
        assert_eq!(metrics.contacts_sent.load(Ordering::Relaxed), 1);

        let distribution = metrics.get_probability_distribution();
        assert_eq!(distribution[1], 1);
        assert_eq!(distribution[8], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ServiceMetrics::new();
        for us in 1..=100 {
            metrics.record_prediction(Duration::from_micros(us), Verdict::NoChurn, 0.0);
        }

        let stats = metrics.get_processing_stats();

        assert_eq!(stats.count, 100);
        assert_eq!(stats.max_us, 100);
        assert_eq!(stats.p50_us, 51);
        assert_eq!(stats.mean_us, 50);
    }

    #[test]
    fn test_probability_of_one_lands_in_last_bucket() {
        let metrics = ServiceMetrics::new();
        metrics.record_prediction(Duration::ZERO, Verdict::Churn, 1.0);
        assert_eq!(metrics.get_probability_distribution()[9], 1);
    }
}
