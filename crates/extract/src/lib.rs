pub mod aggregate;
pub mod coverage;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod schema;
pub mod testing;

pub use aggregate::{aggregate, merge};
pub use coverage::CoverageSummary;
pub use llm::{GenerationParams, Generator, OllamaClient, generate_with_timeout};
pub use schema::{ExtractedChunk, ExtractionOutcome, Record};

use futures::stream::{self, StreamExt};
use ingest::{Chunk, Tokenizer};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub params: GenerationParams,
    /// Replace newlines in chunk text with spaces, as in the training inputs.
    pub flatten_newlines: bool,
    pub request_timeout: Duration,
    /// 1 extracts chunks one after another.
    pub max_concurrent_extractions: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            params: GenerationParams::extract(),
            flatten_newlines: false,
            request_timeout: Duration::from_secs(120),
            max_concurrent_extractions: 1,
        }
    }
}

/// Per-document extraction counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub chunks: usize,
    pub parsed: usize,
    /// Parsed, but the model found nothing.
    pub empty: usize,
    pub malformed: usize,
    pub failed: usize,
}

impl ExtractionStats {
    pub fn from_chunks(extracted: &[ExtractedChunk]) -> Self {
        let mut stats = Self {
            chunks: extracted.len(),
            ..Self::default()
        };
        for chunk in extracted {
            match chunk.outcome {
                ExtractionOutcome::Parsed if chunk.record.is_empty() => stats.empty += 1,
                ExtractionOutcome::Parsed => stats.parsed += 1,
                ExtractionOutcome::Malformed => stats.malformed += 1,
                ExtractionOutcome::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

pub struct Extractor {
    generator: Arc<dyn Generator>,
    tokenizer: Arc<dyn Tokenizer>,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(
        generator: Arc<dyn Generator>,
        tokenizer: Arc<dyn Tokenizer>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            generator,
            tokenizer,
            config,
        }
    }

    /// Run the extract directive over one chunk.
    ///
    /// Never fails: a generation error or unparseable output yields an empty record.
    pub async fn extract(&self, chunk: &Chunk) -> ExtractedChunk {
        let prompt = prompt::build_extraction_prompt(&chunk.text, self.config.flatten_newlines);
        let prompt = match ingest::truncate(
            self.tokenizer.as_ref(),
            &prompt,
            self.config.params.max_input_tokens,
        ) {
            Ok(truncated) => truncated,
            Err(e) => {
                warn!(chunk_index = chunk.index, error = %e, "Could not truncate extraction prompt");
                prompt.as_str()
            }
        };

        let started = Instant::now();
        let generated = generate_with_timeout(
            self.generator.as_ref(),
            prompt,
            &self.config.params,
            self.config.request_timeout,
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (outcome, record) = match generated {
            Ok(text) => match parse::parse_record(&text) {
                Some(record) => (ExtractionOutcome::Parsed, record),
                None => {
                    warn!(
                        chunk_index = chunk.index,
                        output_len = text.len(),
                        "Malformed extraction output, treating chunk as empty"
                    );
                    (ExtractionOutcome::Malformed, Record::new())
                }
            },
            Err(e) => {
                warn!(
                    chunk_index = chunk.index,
                    error = %e,
                    "Extraction call failed, treating chunk as empty"
                );
                (ExtractionOutcome::Failed, Record::new())
            }
        };

        debug!(
            chunk_index = chunk.index,
            fields = record.len(),
            elapsed_ms,
            "Extracted chunk"
        );

        ExtractedChunk {
            index: chunk.index,
            chunk_id: chunk.chunk_id.clone(),
            outcome,
            record,
        }
    }

    /// Extract every chunk. Results come back in chunk order even when
    /// several calls are in flight.
    pub async fn extract_all(&self, chunks: &[Chunk]) -> Vec<ExtractedChunk> {
        let limit = self.config.max_concurrent_extractions.max(1);

        stream::iter(chunks)
            .map(|chunk| self.extract(chunk))
            .buffered(limit)
            .collect()
            .await
    }

    /// Extract every chunk and fold the records into one document record.
    pub async fn aggregate(&self, chunks: &[Chunk]) -> (Record, ExtractionStats) {
        let extracted = self.extract_all(chunks).await;
        let stats = ExtractionStats::from_chunks(&extracted);
        let record = aggregate(extracted.into_iter().map(|e| e.record));
        (record, stats)
    }
}
