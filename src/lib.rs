use clap::ValueEnum;

pub mod error;
pub mod logging;
pub mod plan;
pub mod schema;
pub mod stepper;
pub mod trials;

pub use error::{PlanError, Result};
pub use plan::{build_plan, build_plan_with, IterationPlan, PlanParams, PlanSequence};
pub use stepper::{pwr2_series_next, GeometricStepper};
pub use trials::{trials_for, TrialPolicy};

/// Largest accepted log2 exponent; keeps every `2^lg` inside a `u64`.
pub const MAX_LG_EXPONENT: u32 = 62;

/// Output encoding for a generated plan.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum PlanFormat {
    /// JSON report with run metadata and per-step operation counts.
    #[default]
    Json,
    /// Tab-separated `InU/Trials/VIn` rows for executors.
    Tsv,
}
