use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name to value, in the order the model emitted the fields.
///
/// Booleans are coverage flags; anything else (insurer name, amounts) is
/// identifying metadata.
pub type Record = Map<String, Value>;

/// Why a chunk contributed an empty record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Parsed,
    Malformed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedChunk {
    pub index: usize,
    pub chunk_id: String,
    pub outcome: ExtractionOutcome,
    pub record: Record,
}
