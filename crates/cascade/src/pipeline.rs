use extract::prompt::to_canonical_json;
use extract::{ExtractionStats, Extractor, ExtractorConfig, GenerationParams, Generator, Record};
use ingest::{Chunker, ChunkerConfig, Tokenizer};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::stage::{Stage, StageResult, StageRunner};

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub chunker: ChunkerConfig,
    pub extractor: ExtractorConfig,
    pub compare: GenerationParams,
    pub faq: GenerationParams,
    pub request_timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let extractor = ExtractorConfig::default();
        Self {
            chunker: ChunkerConfig::default(),
            request_timeout: extractor.request_timeout,
            extractor,
            compare: Stage::Compare.default_params(),
            faq: Stage::Faq.default_params(),
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.chunker.max_tokens == 0 {
            return Err(AnalysisError::InvalidConfig(
                "chunk max_tokens must be greater than zero".to_string(),
            ));
        }

        let all_params = [
            ("extract", &self.extractor.params),
            ("compare", &self.compare),
            ("faq", &self.faq),
        ];
        for (name, params) in all_params {
            if params.beams == 0 {
                return Err(AnalysisError::InvalidConfig(format!("{} beams must be at least 1", name)));
            }
            if params.max_output_tokens == 0 || params.max_input_tokens == 0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} token limits must be greater than zero",
                    name
                )));
            }
        }

        if self.request_timeout.is_zero() || self.extractor.request_timeout.is_zero() {
            return Err(AnalysisError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// End-to-end output: the document record plus both stage artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub extract: Record,
    pub compare: StageResult,
    pub faq: StageResult,
}

/// An [`AnalysisResult`] with what it took to produce it.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub extraction: ExtractionStats,
    pub extract_elapsed: Duration,
    pub stages_elapsed: Duration,
}

/// Chunk → extract per chunk → aggregate → compare and FAQ.
///
/// Holds no per-request state; one instance serves any number of
/// concurrent `analyze` calls.
pub struct Analyzer {
    chunker: Chunker,
    extractor: Extractor,
    stages: StageRunner,
    compare: GenerationParams,
    faq: GenerationParams,
}

impl Analyzer {
    pub fn new(
        generator: Arc<dyn Generator>,
        tokenizer: Arc<dyn Tokenizer>,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;

        Ok(Self {
            chunker: Chunker::new(config.chunker, tokenizer.clone()),
            extractor: Extractor::new(generator.clone(), tokenizer.clone(), config.extractor),
            stages: StageRunner::new(generator, tokenizer, config.request_timeout),
            compare: config.compare,
            faq: config.faq,
        })
    }

    pub async fn analyze(&self, document: &str) -> Result<AnalysisResult, AnalysisError> {
        Ok(self.analyze_with_report(document).await?.result)
    }

    pub async fn analyze_with_report(&self, document: &str) -> Result<AnalysisReport, AnalysisError> {
        let chunks = self.chunker.chunk(document).map_err(AnalysisError::Tokenizer)?;
        if chunks.is_empty() {
            return Err(AnalysisError::EmptyDocument);
        }

        info!(chunks = chunks.len(), chars = document.len(), "Analyzing document");

        let started = Instant::now();
        let (record, extraction) = self.extractor.aggregate(&chunks).await;
        let extract_elapsed = started.elapsed();

        if record.is_empty() {
            warn!(
                chunks = extraction.chunks,
                malformed = extraction.malformed,
                failed = extraction.failed,
                "No chunk produced a usable extraction"
            );
            return Err(AnalysisError::NoExtractableContent { chunks: chunks.len() });
        }

        // Both stages get byte-identical input
        let record_json = to_canonical_json(&record).map_err(AnalysisError::Serialization)?;

        let started = Instant::now();
        let (compare, faq) = tokio::join!(
            self.stages.run(Stage::Compare, &self.compare, &record_json),
            self.stages.run(Stage::Faq, &self.faq, &record_json),
        );
        let stages_elapsed = started.elapsed();

        info!(
            fields = record.len(),
            extract_ms = extract_elapsed.as_millis() as u64,
            stages_ms = stages_elapsed.as_millis() as u64,
            compare_raw = compare.is_raw(),
            faq_raw = faq.is_raw(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            result: AnalysisResult {
                extract: record,
                compare,
                faq,
            },
            extraction,
            extract_elapsed,
            stages_elapsed,
        })
    }
}
