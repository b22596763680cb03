//! Iteration plan construction.
//!
//! A plan walks input sizes from `2^lg_min_u` along the geometric series until
//! the first size `>= 2^lg_max_u`. Each size gets a trial count from the
//! [`TrialPolicy`] and a starting input offset. Offsets advance by
//! `uniques * trials` per step, so no two trials anywhere in the plan draw the
//! same input value.

use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PlanError, Result};
use crate::stepper::GeometricStepper;
use crate::trials::{check_exponent, TrialPolicy};

/// Sweep parameters, all log2 exponents except `u_ppo` and `start_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanParams {
    pub lg_min_u: u32,
    pub lg_max_u: u32,
    /// Input sizes sampled per doubling.
    pub u_ppo: u32,
    pub lg_min_bp_u: u32,
    pub lg_max_bp_u: u32,
    pub lg_min_t: u32,
    pub lg_max_t: u32,
    pub start_offset: u64,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            lg_min_u: 0,
            lg_max_u: 23,
            u_ppo: 16,
            lg_min_bp_u: 4,
            lg_max_bp_u: 20,
            lg_min_t: 4,
            lg_max_t: 24,
            start_offset: 0,
        }
    }
}

impl PlanParams {
    pub fn stepper(&self) -> Result<GeometricStepper> {
        GeometricStepper::new(self.u_ppo)
    }

    pub fn trial_policy(&self) -> Result<TrialPolicy> {
        TrialPolicy::new(self.lg_min_bp_u, self.lg_max_bp_u, self.lg_min_t, self.lg_max_t)
    }

    pub fn min_uniques(&self) -> u64 {
        1 << self.lg_min_u
    }

    pub fn max_uniques(&self) -> u64 {
        1 << self.lg_max_u
    }

    /// Read parameters from a JSON file. Missing keys take their defaults;
    /// unknown keys are rejected so a typo cannot silently fall back.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        check_exponent("lgMinU", self.lg_min_u)?;
        check_exponent("lgMaxU", self.lg_max_u)?;
        self.stepper()?;
        self.trial_policy()?;
        Ok(())
    }
}

/// One step of the sweep: run `trials` repetitions over `uniques` inputs each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationPlan {
    pub uniques: u64,
    pub trials: u64,
    pub input_offset: u64,
}

impl IterationPlan {
    /// Operations performed by the whole step; executors divide elapsed time by this.
    pub fn operations(&self) -> u64 {
        self.uniques.saturating_mul(self.trials)
    }

    /// Exclusive end of the counter range consumed by this step.
    pub fn input_end(&self) -> u64 {
        self.input_offset.saturating_add(self.operations())
    }

    /// Counter values consumed by the 0-based `trial`.
    pub fn trial_inputs(&self, trial: u64) -> Option<Range<u64>> {
        if trial >= self.trials {
            return None;
        }
        let start = self.input_offset + trial * self.uniques;
        Some(start..start + self.uniques)
    }
}

/// Steps in execution order. Built once; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlanSequence {
    steps: Vec<IterationPlan>,
}

impl PlanSequence {
    pub(crate) fn from_steps(steps: Vec<IterationPlan>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step by its 1-based index.
    pub fn get(&self, step: usize) -> Option<&IterationPlan> {
        step.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// `(step, plan)` pairs with 1-based step indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &IterationPlan)> + '_ {
        self.steps.iter().enumerate().map(|(i, p)| (i + 1, p))
    }

    pub fn as_slice(&self) -> &[IterationPlan] {
        &self.steps
    }

    pub fn first(&self) -> Option<&IterationPlan> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&IterationPlan> {
        self.steps.last()
    }

    /// Offset the step after the last one would start at.
    pub fn end_offset(&self) -> Option<u64> {
        self.last().map(IterationPlan::input_end)
    }

    pub fn total_operations(&self) -> u64 {
        self.steps.iter().map(IterationPlan::operations).sum()
    }
}

impl<'a> IntoIterator for &'a PlanSequence {
    type Item = &'a IterationPlan;
    type IntoIter = std::slice::Iter<'a, IterationPlan>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl IntoIterator for PlanSequence {
    type Item = IterationPlan;
    type IntoIter = std::vec::IntoIter<IterationPlan>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

pub fn build_plan(params: &PlanParams) -> Result<PlanSequence> {
    params.validate()?;
    let stepper = params.stepper()?;
    let policy = params.trial_policy()?;

    let min_u = params.min_uniques();
    let max_u = params.max_uniques();
    if max_u < min_u {
        warn!(
            lg_min_u = params.lg_min_u,
            lg_max_u = params.lg_max_u,
            "lgMaxU is below lgMinU, plan has a single step"
        );
    }

    let mut steps = Vec::new();
    let mut offset = params.start_offset;
    for uniques in stepper.series(min_u, max_u)? {
        let trials = policy.trials_for(uniques);
        let step = steps.len() + 1;
        debug!(step, uniques, trials, input_offset = offset, "planned step");

        steps.push(IterationPlan {
            uniques,
            trials,
            input_offset: offset,
        });
        offset = uniques
            .checked_mul(trials)
            .and_then(|ops| offset.checked_add(ops))
            .ok_or(PlanError::OffsetOverflow { step })?;
    }

    let plan = PlanSequence::from_steps(steps);
    info!(
        steps = plan.len(),
        total_operations = plan.total_operations(),
        end_offset = offset,
        "built iteration plan"
    );
    Ok(plan)
}

/// Positional form of [`build_plan`].
#[allow(clippy::too_many_arguments)]
pub fn build_plan_with(
    lg_min_u: u32,
    lg_max_u: u32,
    u_ppo: u32,
    lg_min_bp_u: u32,
    lg_max_bp_u: u32,
    lg_min_t: u32,
    lg_max_t: u32,
    start_offset: u64,
) -> Result<PlanSequence> {
    build_plan(&PlanParams {
        lg_min_u,
        lg_max_u,
        u_ppo,
        lg_min_bp_u,
        lg_max_bp_u,
        lg_min_t,
        lg_max_t,
        start_offset,
    })
}
