use anyhow::Result;
use unicode_segmentation::UnicodeSegmentation;

/// Byte span of one token in the source text. Both ends fall on `char` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Maps text to an ordered sequence of token offsets.
///
/// Only used to measure and slice text by token count, never to encode
/// model input.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<TokenSpan>>;

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.tokenize(text)?.len())
    }
}

/// Gap-free tokenizer on Unicode word boundaries.
///
/// Every byte of the input belongs to exactly one token: words,
/// punctuation and whitespace runs each count as a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<TokenSpan>> {
        Ok(text
            .split_word_bound_indices()
            .map(|(start, word)| TokenSpan::new(start, start + word.len()))
            .collect())
    }
}

/// Cut `text` after its first `max_tokens` tokens.
///
/// Text that already fits is returned unchanged.
pub fn truncate<'a>(tokenizer: &dyn Tokenizer, text: &'a str, max_tokens: usize) -> Result<&'a str> {
    let tokens = tokenizer.tokenize(text)?;
    if tokens.len() <= max_tokens {
        return Ok(text);
    }
    let end = max_tokens
        .checked_sub(1)
        .and_then(|last| tokens.get(last))
        .map_or(0, |token| token.end);
    Ok(&text[..end])
}

#[cfg(feature = "hf-tokenizer")]
pub use hf::HfTokenizer;

#[cfg(feature = "hf-tokenizer")]
mod hf {
    use super::{TokenSpan, Tokenizer};
    use anyhow::{Result, anyhow};
    use std::path::Path;

    /// Subword tokenizer loaded from the generation model's `tokenizer.json`.
    ///
    /// Offsets skip whitespace between tokens; the chunker absorbs those gaps.
    pub struct HfTokenizer {
        inner: tokenizers::Tokenizer,
    }

    impl HfTokenizer {
        pub fn from_file(path: &Path) -> Result<Self> {
            let inner = tokenizers::Tokenizer::from_file(path)
                .map_err(|e| anyhow!("Failed to load tokenizer {:?}: {}", path, e))?;
            Ok(Self { inner })
        }
    }

    impl Tokenizer for HfTokenizer {
        fn tokenize(&self, text: &str) -> Result<Vec<TokenSpan>> {
            let encoding = self
                .inner
                .encode(text, false)
                .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

            Ok(encoding
                .get_offsets()
                .iter()
                .filter(|(start, end)| end > start)
                .map(|&(start, end)| TokenSpan::new(start, end))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokens_cover_text() {
        let text = "Folksam ersätter  tandvård.\nSlut";
        let tokens = WordTokenizer.tokenize(text).unwrap();

        assert_eq!(tokens.first().unwrap().start, 0);
        assert_eq!(tokens.last().unwrap().end, text.len());
        for pair in tokens.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_empty_text_has_no_tokens() {
        assert!(WordTokenizer.tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_truncate() {
        let text = "a b c d";
        // tokens: a, " ", b, " ", c, " ", d
        assert_eq!(truncate(&WordTokenizer, text, 3).unwrap(), "a b");
        assert_eq!(truncate(&WordTokenizer, text, 100).unwrap(), text);
        assert_eq!(truncate(&WordTokenizer, text, 0).unwrap(), "");
    }

    #[test]
    fn test_truncate_at_budget_boundary() {
        let text = "a b c d";
        assert_eq!(truncate(&WordTokenizer, text, 7).unwrap(), text);
        assert_eq!(truncate(&WordTokenizer, text, 6).unwrap(), "a b c ");
        assert_eq!(truncate(&WordTokenizer, text, 1).unwrap(), "a");
        assert_eq!(truncate(&WordTokenizer, "", 0).unwrap(), "");
    }
}
