pub mod error;
pub mod pipeline;
pub mod stage;

pub use error::AnalysisError;
pub use pipeline::{AnalysisReport, AnalysisResult, Analyzer, AnalyzerConfig};
pub use stage::{Stage, StageOutput, StageResult, StageRunner};
