pub mod analyze;

pub use analyze::{AnalysisPipeline, DEFAULT_PIPELINE_TIMEOUT};

use std::fmt;

use crate::error::FailureKind;

/// Where a single pipeline run currently is.
///
/// Runs move strictly forward through
/// `Validating → AnalyzingVision → Structuring → ValidatingResponse → Done`
/// and may jump to `Failed` from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    AnalyzingVision,
    Structuring,
    ValidatingResponse,
    Done,
    Failed(FailureKind),
}

impl Stage {
    /// The stage that follows a successful step
    pub fn next(self) -> Stage {
        match self {
            Stage::Validating => Stage::AnalyzingVision,
            Stage::AnalyzingVision => Stage::Structuring,
            Stage::Structuring => Stage::ValidatingResponse,
            Stage::ValidatingResponse => Stage::Done,
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validating => f.write_str("validating request"),
            Stage::AnalyzingVision => f.write_str("analyzing image"),
            Stage::Structuring => f.write_str("structuring nutrition data"),
            Stage::ValidatingResponse => f.write_str("validating response"),
            Stage::Done => f.write_str("done"),
            Stage::Failed(kind) => write!(f, "failed ({})", kind),
        }
    }
}
