// Run counters for the conversion service
//
// Collected while commands run and logged once on exit

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one tool run.
///
/// Atomic so a shared `&Metrics` can be recorded into from anywhere.
#[derive(Debug)]
pub struct Metrics {
    /// Descriptor files decoded from disk
    pub documents_read: AtomicUsize,

    /// Descriptor files written to disk
    pub documents_written: AtomicUsize,

    /// MD5 digests attached to manifest file entries
    pub checksums_computed: AtomicUsize,

    /// Imported files whose digest could not be computed
    pub checksums_unavailable: AtomicUsize,

    /// Solution files created or rewritten
    pub solutions_updated: AtomicUsize,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            documents_read: AtomicUsize::new(0),
            documents_written: AtomicUsize::new(0),
            checksums_computed: AtomicUsize::new(0),
            checksums_unavailable: AtomicUsize::new(0),
            solutions_updated: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one descriptor read from disk
    pub fn record_document_read(&self) {
        self.documents_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one file written to disk
    pub fn record_document_written(&self) {
        self.documents_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the checksum outcome of one manifest write
    pub fn record_checksums(&self, computed: usize, unavailable: usize) {
        self.checksums_computed.fetch_add(computed, Ordering::Relaxed);
        self.checksums_unavailable
            .fetch_add(unavailable, Ordering::Relaxed);
    }

    /// Record one solution created or rewritten
    pub fn record_solution_updated(&self) {
        self.solutions_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log the counters at the end of a run.
    ///
    /// Missing checksums are logged at warn level, everything else at debug.
    pub fn log_summary(&self) {
        tracing::debug!(
            "Done in {:.2}s: {} read, {} written, {} solution(s) updated",
            self.uptime().as_secs_f64(),
            self.documents_read.load(Ordering::Relaxed),
            self.documents_written.load(Ordering::Relaxed),
            self.solutions_updated.load(Ordering::Relaxed)
        );

        let unavailable = self.checksums_unavailable.load(Ordering::Relaxed);
        if unavailable > 0 {
            tracing::warn!(
                "Checksums: {} computed, {} unavailable",
                self.checksums_computed.load(Ordering::Relaxed),
                unavailable
            );
        } else {
            tracing::debug!(
                "Checksums: {} computed",
                self.checksums_computed.load(Ordering::Relaxed)
            );
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.documents_read.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.documents_written.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_operations() {
        let metrics = Metrics::new();

        metrics.record_document_read();
        metrics.record_document_read();
        metrics.record_document_written();
        metrics.record_solution_updated();
        metrics.record_checksums(3, 1);
        metrics.record_checksums(2, 0);

        assert_eq!(metrics.documents_read.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.documents_written.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.solutions_updated.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.checksums_computed.load(Ordering::Relaxed), 5);
        assert_eq!(metrics.checksums_unavailable.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
