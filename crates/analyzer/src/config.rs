use anyhow::{Context, Result};
use cascade::AnalyzerConfig;
use extract::{ExtractorConfig, GenerationParams};
use ingest::ChunkerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mode: OperationMode,
    pub chunking: ChunkingConfig,
    pub generation: GenerationConfig,
    pub concurrency: ConcurrencyConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Fast,      // Greedy decoding, parallel chunk extraction
    Accurate,  // Beam search, one chunk at a time, generous timeouts
    Balanced,  // Default: beam search, one chunk at a time
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub flatten_newlines: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    /// `tokenizer.json` of the model; the word tokenizer is used when unset.
    pub tokenizer_path: Option<PathBuf>,
    pub extract: GenerationParams,
    pub compare: GenerationParams,
    pub faq: GenerationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub max_concurrent_extractions: usize,
    pub request_timeout_secs: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: ingest::DEFAULT_MAX_TOKENS,
            flatten_newlines: false,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-tasks-t5-swedish".to_string(),
            tokenizer_path: None,
            extract: GenerationParams::extract(),
            compare: GenerationParams::compare(),
            faq: GenerationParams::faq(),
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_extractions: 1,
            request_timeout_secs: 120,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::Balanced,
            chunking: ChunkingConfig::default(),
            generation: GenerationConfig::default(),
            concurrency: ConcurrencyConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn fast_mode() -> Self {
        let mut config = Self {
            mode: OperationMode::Fast,
            concurrency: ConcurrencyConfig {
                max_concurrent_extractions: 4,
                request_timeout_secs: 30,
            },
            ..Self::default()
        };
        for params in config.all_params_mut() {
            params.beams = 1;
        }
        config
    }

    pub fn accurate_mode() -> Self {
        Self {
            mode: OperationMode::Accurate,
            chunking: ChunkingConfig {
                flatten_newlines: true,
                ..ChunkingConfig::default()
            },
            concurrency: ConcurrencyConfig {
                max_concurrent_extractions: 1,
                request_timeout_secs: 300,
            },
            ..Self::default()
        }
    }

    pub fn for_mode(mode: OperationMode) -> Self {
        match mode {
            OperationMode::Fast => Self::fast_mode(),
            OperationMode::Accurate => Self::accurate_mode(),
            OperationMode::Balanced => Self::default(),
        }
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&content).context(format!("Invalid config file: {:?}", path))
    }

    fn all_params_mut(&mut self) -> [&mut GenerationParams; 3] {
        [
            &mut self.generation.extract,
            &mut self.generation.compare,
            &mut self.generation.faq,
        ]
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let request_timeout = Duration::from_secs(self.concurrency.request_timeout_secs);

        AnalyzerConfig {
            chunker: ChunkerConfig {
                max_tokens: self.chunking.max_tokens,
            },
            extractor: ExtractorConfig {
                params: self.generation.extract,
                flatten_newlines: self.chunking.flatten_newlines,
                request_timeout,
                max_concurrent_extractions: self.concurrency.max_concurrent_extractions,
            },
            compare: self.generation.compare,
            faq: self.generation.faq,
            request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_service_constants() {
        let config = AppConfig::default().analyzer_config();

        assert_eq!(config.chunker.max_tokens, 1000);
        assert_eq!(config.extractor.params, GenerationParams::extract());
        assert_eq!(config.faq.max_output_tokens, 1024);
        assert_eq!(config.extractor.max_concurrent_extractions, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_modes() {
        let fast = AppConfig::for_mode(OperationMode::Fast);
        assert_eq!(fast.generation.faq.beams, 1);
        assert_eq!(fast.concurrency.max_concurrent_extractions, 4);
        assert!(fast.analyzer_config().validate().is_ok());

        let accurate = AppConfig::for_mode(OperationMode::Accurate);
        assert!(accurate.chunking.flatten_newlines);
        assert_eq!(accurate.generation.extract.beams, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"chunking": {"max_tokens": 500}, "generation": {"model": "mt5-base"}}"#,
        )
        .unwrap();

        assert_eq!(config.chunking.max_tokens, 500);
        assert_eq!(config.generation.model, "mt5-base");
        assert_eq!(config.generation.base_url, "http://localhost:11434");
        assert_eq!(config.mode, OperationMode::Balanced);
        assert_eq!(config.concurrency.request_timeout_secs, 120);
    }
}
