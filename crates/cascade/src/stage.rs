use extract::parse::parse_value;
use extract::prompt::{self, COMPARE_DIRECTIVE, FAQ_DIRECTIVE};
use extract::{GenerationParams, Generator, generate_with_timeout};
use ingest::Tokenizer;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Post-aggregation generation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Compare,
    Faq,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Compare => "compare",
            Stage::Faq => "faq",
        }
    }

    pub fn directive(self) -> &'static str {
        match self {
            Stage::Compare => COMPARE_DIRECTIVE,
            Stage::Faq => FAQ_DIRECTIVE,
        }
    }

    /// Key of the fallback object carrying unparseable output.
    pub fn raw_key(self) -> &'static str {
        match self {
            Stage::Compare => "compare_raw",
            Stage::Faq => "faq_raw",
        }
    }

    pub fn default_params(self) -> GenerationParams {
        match self {
            Stage::Compare => GenerationParams::compare(),
            Stage::Faq => GenerationParams::faq(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Parsed(Value),
    Raw(String),
}

/// Output of one stage. Serializes as the parsed value, or as
/// `{"<stage>_raw": "<text>"}` when the model output was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub stage: Stage,
    pub output: StageOutput,
}

impl StageResult {
    pub fn is_raw(&self) -> bool {
        matches!(self.output, StageOutput::Raw(_))
    }

    pub fn to_json(&self) -> Value {
        match &self.output {
            StageOutput::Parsed(value) => value.clone(),
            StageOutput::Raw(text) => {
                let mut map = serde_json::Map::new();
                map.insert(self.stage.raw_key().to_string(), Value::String(text.clone()));
                Value::Object(map)
            }
        }
    }
}

impl Serialize for StageResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.output {
            StageOutput::Parsed(value) => value.serialize(serializer),
            StageOutput::Raw(text) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(self.stage.raw_key(), text)?;
                map.end()
            }
        }
    }
}

/// Runs the compare and FAQ directives over a serialized record.
pub struct StageRunner {
    generator: Arc<dyn Generator>,
    tokenizer: Arc<dyn Tokenizer>,
    request_timeout: Duration,
}

impl StageRunner {
    pub fn new(
        generator: Arc<dyn Generator>,
        tokenizer: Arc<dyn Tokenizer>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            tokenizer,
            request_timeout,
        }
    }

    /// Never fails. Unparseable output becomes `StageOutput::Raw`; a failed
    /// or timed-out call becomes an empty raw text.
    pub async fn run(&self, stage: Stage, params: &GenerationParams, record_json: &str) -> StageResult {
        let prompt = prompt::build_stage_prompt(stage.directive(), record_json);
        let prompt = match ingest::truncate(self.tokenizer.as_ref(), &prompt, params.max_input_tokens) {
            Ok(truncated) => truncated,
            Err(e) => {
                warn!(stage = stage.name(), error = %e, "Could not truncate stage prompt");
                prompt.as_str()
            }
        };

        let started = Instant::now();
        let generated = generate_with_timeout(
            self.generator.as_ref(),
            prompt,
            params,
            self.request_timeout,
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let output = match generated {
            Ok(text) => match parse_value(&text) {
                Some(value) => StageOutput::Parsed(value),
                None => {
                    warn!(
                        stage = stage.name(),
                        output_len = text.len(),
                        "Stage output is not JSON, passing raw text through"
                    );
                    StageOutput::Raw(text)
                }
            },
            Err(e) => {
                warn!(stage = stage.name(), error = %e, "Stage call failed");
                StageOutput::Raw(String::new())
            }
        };

        debug!(stage = stage.name(), elapsed_ms, "Stage finished");

        StageResult { stage, output }
    }
}
