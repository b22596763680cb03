use thiserror::Error;

use crate::MAX_LG_EXPONENT;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(
        "breakpoints collapse to 2^{lg_bp_u} while trial bounds differ (lgMinT={lg_min_t}, lgMaxT={lg_max_t})"
    )]
    ZeroWidthBreakpoints { lg_bp_u: u32, lg_min_t: u32, lg_max_t: u32 },
    #[error("lgMinT ({lg_min_t}) must not exceed lgMaxT ({lg_max_t})")]
    InvertedTrialBounds { lg_min_t: u32, lg_max_t: u32 },
    #[error("uPPO must be at least 1")]
    ZeroStepsPerOctave,
    #[error("{name} = {value} exceeds the maximum exponent of {MAX_LG_EXPONENT}")]
    ExponentTooLarge { name: &'static str, value: u32 },
    #[error("geometric series point {0} is outside 1..u64::MAX")]
    OutOfSeriesRange(u64),
    #[error("input offset overflows u64 at step {step}")]
    OffsetOverflow { step: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed plan row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}
