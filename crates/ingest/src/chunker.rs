use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::chunk::Chunk;
use crate::generate_doc_id;
use crate::tokenizer::Tokenizer;

/// Token budget the generation model was trained on, minus room for the directive.
pub const DEFAULT_MAX_TOKENS: usize = 1000;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Splits a document into contiguous windows of at most `max_tokens` tokens.
///
/// Chunk boundaries fall on token boundaries. Bytes the tokenizer leaves
/// uncovered (leading, trailing, or between two windows) are absorbed into
/// the chunk that follows them, or into the last chunk at the end of the
/// document, so concatenating the chunks in order yields the document again.
pub struct Chunker {
    config: ChunkerConfig,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Chunker {
    pub fn new(config: ChunkerConfig, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { config, tokenizer }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        if self.config.max_tokens == 0 {
            anyhow::bail!("Chunk token budget must be greater than zero");
        }

        // Tokenize the whole document once
        let tokens = self
            .tokenizer
            .tokenize(text)
            .context("Failed to tokenize document")?;

        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let doc_id = generate_doc_id(text);
        let window_count = tokens.len().div_ceil(self.config.max_tokens);
        let mut chunks = Vec::with_capacity(window_count);
        let mut start = 0;

        for (index, window) in tokens.chunks(self.config.max_tokens).enumerate() {
            let end = if index + 1 == window_count {
                text.len()
            } else {
                window[window.len() - 1].end
            };

            chunks.push(Chunk::new(
                index,
                doc_id.clone(),
                text[start..end].to_string(),
                (start, end),
                window.len(),
            ));
            start = end;
        }

        debug!(
            doc_id = %doc_id,
            total_tokens = tokens.len(),
            chunks = chunks.len(),
            max_tokens = self.config.max_tokens,
            "Chunked document"
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{TokenSpan, WordTokenizer};
    use proptest::prelude::*;

    fn chunker(max_tokens: usize) -> Chunker {
        Chunker::new(ChunkerConfig { max_tokens }, Arc::new(WordTokenizer))
    }

    /// Tokenizer that only reports alphanumeric runs, like a subword model skipping spaces.
    struct SkippingTokenizer;

    impl Tokenizer for SkippingTokenizer {
        fn tokenize(&self, text: &str) -> Result<Vec<TokenSpan>> {
            Ok(WordTokenizer
                .tokenize(text)?
                .into_iter()
                .filter(|t| !text[t.start..t.end].trim().is_empty())
                .collect())
        }
    }

    #[test]
    fn test_basic_chunking() {
        let text = "Detta är en försäkring.\n\nDen omfattar tandvård.";
        let chunks = chunker(4).chunk(text).unwrap();

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].index, 0);
        assert!(chunks.iter().all(|c| c.token_count <= 4));
        assert!(chunks.iter().all(|c| c.doc_id == chunks[0].doc_id));
    }

    #[test]
    fn test_empty_document_yields_no_chunks() {
        assert!(chunker(10).chunk("").unwrap().is_empty());
    }

    #[test]
    fn test_budget_larger_than_document() {
        let text = "Folksam Bas täcker sjukhusvård";
        let chunks = chunker(10_000).chunk(text).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].span, (0, text.len()));
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        assert!(chunker(0).chunk("text").is_err());
    }

    #[test]
    fn test_gaps_are_absorbed() {
        let text = "  alpha beta\n\ngamma delta  ";
        let chunker = Chunker::new(ChunkerConfig { max_tokens: 2 }, Arc::new(SkippingTokenizer));
        let chunks = chunker.chunk(text).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "  alpha beta");
        assert_eq!(chunks[1].text, "\n\ngamma delta  ");
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_document(text in "\\PC{0,400}", budget in 1usize..40) {
            let chunks = chunker(budget).chunk(&text).unwrap();
            let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn prop_chunk_count_matches_budget(text in "[a-zåäö ,.\n]{0,400}", budget in 1usize..40) {
            let total = WordTokenizer.tokenize(&text).unwrap().len();
            let chunks = chunker(budget).chunk(&text).unwrap();

            prop_assert_eq!(chunks.len(), total.div_ceil(budget));
            if let Some(last) = chunks.last() {
                prop_assert!(last.token_count >= 1 && last.token_count <= budget);
            }
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
            }
        }
    }
}
