use cascade::{AnalysisError, AnalysisReport};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

pub struct Metrics {
    // Counters
    total_analyses: AtomicUsize,
    successful_analyses: AtomicUsize,
    empty_documents: AtomicUsize,
    no_extractable_content: AtomicUsize,
    other_failures: AtomicUsize,

    // Timing (in microseconds)
    total_extract_time_us: AtomicU64,
    total_stage_time_us: AtomicU64,

    // Counts
    total_chunks_processed: AtomicUsize,
    malformed_extractions: AtomicUsize,
    failed_extractions: AtomicUsize,
    raw_stage_outputs: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_analyses: AtomicUsize::new(0),
            successful_analyses: AtomicUsize::new(0),
            empty_documents: AtomicUsize::new(0),
            no_extractable_content: AtomicUsize::new(0),
            other_failures: AtomicUsize::new(0),
            total_extract_time_us: AtomicU64::new(0),
            total_stage_time_us: AtomicU64::new(0),
            total_chunks_processed: AtomicUsize::new(0),
            malformed_extractions: AtomicUsize::new(0),
            failed_extractions: AtomicUsize::new(0),
            raw_stage_outputs: AtomicUsize::new(0),
        })
    }

    pub fn record_success(&self, report: &AnalysisReport) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
        self.successful_analyses.fetch_add(1, Ordering::Relaxed);

        self.total_extract_time_us.fetch_add(report.extract_elapsed.as_micros() as u64, Ordering::Relaxed);
        self.total_stage_time_us.fetch_add(report.stages_elapsed.as_micros() as u64, Ordering::Relaxed);

        self.total_chunks_processed.fetch_add(report.extraction.chunks, Ordering::Relaxed);
        self.malformed_extractions.fetch_add(report.extraction.malformed, Ordering::Relaxed);
        self.failed_extractions.fetch_add(report.extraction.failed, Ordering::Relaxed);

        let raw = [&report.result.compare, &report.result.faq]
            .iter()
            .filter(|stage| stage.is_raw())
            .count();
        self.raw_stage_outputs.fetch_add(raw, Ordering::Relaxed);
    }

    pub fn record_failure(&self, error: &AnalysisError) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
        let counter = match error {
            AnalysisError::EmptyDocument => &self.empty_documents,
            AnalysisError::NoExtractableContent { .. } => &self.no_extractable_content,
            _ => &self.other_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_analyses: self.total_analyses.load(Ordering::Relaxed),
            successful_analyses: self.successful_analyses.load(Ordering::Relaxed),
            empty_documents: self.empty_documents.load(Ordering::Relaxed),
            no_extractable_content: self.no_extractable_content.load(Ordering::Relaxed),
            other_failures: self.other_failures.load(Ordering::Relaxed),
            avg_extract_time_per_chunk_ms: self.avg_time_ms(&self.total_extract_time_us, &self.total_chunks_processed),
            avg_stage_time_ms: self.avg_time_ms(&self.total_stage_time_us, &self.successful_analyses),
            total_chunks_processed: self.total_chunks_processed.load(Ordering::Relaxed),
            malformed_extractions: self.malformed_extractions.load(Ordering::Relaxed),
            failed_extractions: self.failed_extractions.load(Ordering::Relaxed),
            raw_stage_outputs: self.raw_stage_outputs.load(Ordering::Relaxed),
        }
    }

    fn avg_time_ms(&self, total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
        let total = total_us.load(Ordering::Relaxed) as f64;
        let cnt = count.load(Ordering::Relaxed) as f64;
        if cnt > 0.0 {
            total / cnt / 1000.0 // Convert to ms
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_analyses: usize,
    pub successful_analyses: usize,
    pub empty_documents: usize,
    pub no_extractable_content: usize,
    pub other_failures: usize,
    pub avg_extract_time_per_chunk_ms: f64,
    pub avg_stage_time_ms: f64,
    pub total_chunks_processed: usize,
    pub malformed_extractions: usize,
    pub failed_extractions: usize,
    pub raw_stage_outputs: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
