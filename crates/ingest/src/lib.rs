pub mod chunk;
pub mod chunker;
pub mod reader;
pub mod tokenizer;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig, DEFAULT_MAX_TOKENS};
pub use reader::FileReader;
#[cfg(feature = "hf-tokenizer")]
pub use tokenizer::HfTokenizer;
pub use tokenizer::{TokenSpan, Tokenizer, WordTokenizer, truncate};

use sha2::{Digest, Sha256};

/// Generate a stable document ID from its content
pub fn generate_doc_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_depends_on_content() {
        assert_eq!(generate_doc_id("a"), generate_doc_id("a"));
        assert_ne!(generate_doc_id("a"), generate_doc_id("b"));
        assert_eq!(generate_doc_id("a").len(), 32);
    }
}
