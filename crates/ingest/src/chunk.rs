use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub doc_id: String,
    pub chunk_id: String,
    pub text: String,
    pub span: (usize, usize), // [start, end) byte positions in the document
    pub token_count: usize,
}

impl Chunk {
    pub fn new(
        index: usize,
        doc_id: String,
        text: String,
        span: (usize, usize),
        token_count: usize,
    ) -> Self {
        // Generate stable chunk_id from content
        let chunk_id = Self::generate_chunk_id(&doc_id, &text, span);

        Self {
            index,
            doc_id,
            chunk_id,
            text,
            span,
            token_count,
        }
    }

    fn generate_chunk_id(doc_id: &str, text: &str, span: (usize, usize)) -> String {
        let mut hasher = Sha256::new();
        hasher.update(doc_id.as_bytes());
        hasher.update(text.as_bytes());
        hasher.update(span.0.to_string().as_bytes());
        hasher.update(span.1.to_string().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes (32 hex chars)
    }

    pub fn len(&self) -> usize {
        self.span.1 - self.span.0
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
