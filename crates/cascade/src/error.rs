use thiserror::Error;

/// Conditions that end an analysis request.
///
/// Malformed model output never shows up here; it degrades to empty
/// records or raw-text stage results instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("document is empty or could not be chunked")]
    EmptyDocument,

    #[error("no chunk produced a usable extraction ({chunks} chunks processed)")]
    NoExtractableContent { chunks: usize },

    #[error("tokenizer failed: {0}")]
    Tokenizer(#[source] anyhow::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize aggregated record: {0}")]
    Serialization(#[source] anyhow::Error),
}

impl AnalysisError {
    /// True when the caller sent something unusable, as opposed to a processing failure.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyDocument)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyDocument => "empty_document",
            Self::NoExtractableContent { .. } => "no_extractable_content",
            Self::Tokenizer(_) => "tokenizer",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Serialization(_) => "serialization",
        }
    }
}
