//! Trial-count policy.
//!
//! Trials fall log-linearly from `2^lg_max_t` at the lower breakpoint
//! `2^lg_min_bp_u` to `2^lg_min_t` at the upper breakpoint `2^lg_max_bp_u`.
//! Outside that window they saturate at the nearer bound.

use crate::error::{PlanError, Result};
use crate::MAX_LG_EXPONENT;

pub(crate) fn check_exponent(name: &'static str, value: u32) -> Result<()> {
    if value > MAX_LG_EXPONENT {
        return Err(PlanError::ExponentTooLarge { name, value });
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialPolicy {
    lg_min_bp_u: u32,
    lg_max_bp_u: u32,
    lg_min_t: u32,
    lg_max_t: u32,
}

impl TrialPolicy {
    pub fn new(lg_min_bp_u: u32, lg_max_bp_u: u32, lg_min_t: u32, lg_max_t: u32) -> Result<Self> {
        check_exponent("lgMinBpU", lg_min_bp_u)?;
        check_exponent("lgMaxBpU", lg_max_bp_u)?;
        check_exponent("lgMinT", lg_min_t)?;
        check_exponent("lgMaxT", lg_max_t)?;

        if lg_min_t > lg_max_t {
            return Err(PlanError::InvertedTrialBounds { lg_min_t, lg_max_t });
        }
        if lg_min_bp_u == lg_max_bp_u && lg_min_t != lg_max_t {
            return Err(PlanError::ZeroWidthBreakpoints {
                lg_bp_u: lg_min_bp_u,
                lg_min_t,
                lg_max_t,
            });
        }

        Ok(Self {
            lg_min_bp_u,
            lg_max_bp_u,
            lg_min_t,
            lg_max_t,
        })
    }

    pub fn min_trials(&self) -> u64 {
        1 << self.lg_min_t
    }

    pub fn max_trials(&self) -> u64 {
        1 << self.lg_max_t
    }

    pub fn min_breakpoint(&self) -> u64 {
        1 << self.lg_min_bp_u
    }

    pub fn max_breakpoint(&self) -> u64 {
        1 << self.lg_max_bp_u
    }

    /// Number of measured repetitions to run at `uniques`.
    ///
    /// Always within `[min_trials(), max_trials()]`.
    pub fn trials_for(&self, uniques: u64) -> u64 {
        let min_t = self.min_trials();
        let max_t = self.max_trials();

        if self.lg_min_t == self.lg_max_t || uniques <= self.min_breakpoint() {
            return max_t;
        }
        if uniques >= self.max_breakpoint() {
            return min_t;
        }

        // Reaching here means min_breakpoint < uniques < max_breakpoint, so the
        // breakpoint exponents differ.
        let slope = f64::from(self.lg_max_t - self.lg_min_t)
            / (f64::from(self.lg_min_bp_u) - f64::from(self.lg_max_bp_u));
        let lg_cur_u = (uniques as f64).log2();
        let lg_trials =
            slope * (lg_cur_u - f64::from(self.lg_min_bp_u)) + f64::from(self.lg_max_t);

        (2f64.powf(lg_trials).floor() as u64).clamp(min_t, max_t)
    }
}

/// One-shot form of [`TrialPolicy::trials_for`]; validates the bounds on every call.
pub fn trials_for(
    uniques: u64,
    lg_min_bp_u: u32,
    lg_max_bp_u: u32,
    lg_min_t: u32,
    lg_max_t: u32,
) -> Result<u64> {
    TrialPolicy::new(lg_min_bp_u, lg_max_bp_u, lg_min_t, lg_max_t).map(|p| p.trials_for(uniques))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolated_counts() {
        let policy = TrialPolicy::new(0, 3, 1, 2).unwrap();
        assert_eq!(policy.trials_for(1), 4);
        assert_eq!(policy.trials_for(2), 3);
        assert_eq!(policy.trials_for(4), 2);
        assert_eq!(policy.trials_for(8), 2);
    }

    #[test]
    fn test_saturation_outside_breakpoints() {
        let policy = TrialPolicy::new(4, 20, 4, 24).unwrap();
        for u in [0, 1, 2, 15, 16] {
            assert_eq!(policy.trials_for(u), 1 << 24, "u={u}");
        }
        for u in [1 << 20, (1 << 20) + 1, 1 << 23, u64::MAX] {
            assert_eq!(policy.trials_for(u), 1 << 4, "u={u}");
        }
    }

    #[test]
    fn test_exact_powers_inside_window() {
        // slope = -1, so each doubling of u halves the trials.
        let policy = TrialPolicy::new(0, 4, 0, 4).unwrap();
        assert_eq!(policy.trials_for(2), 8);
        assert_eq!(policy.trials_for(4), 4);
        assert_eq!(policy.trials_for(8), 2);
    }

    #[test]
    fn test_non_increasing_across_window() {
        let policy = TrialPolicy::new(4, 20, 4, 24).unwrap();
        let mut prev = policy.trials_for(policy.min_breakpoint());
        for u in (policy.min_breakpoint()..=policy.max_breakpoint()).step_by(997) {
            let t = policy.trials_for(u);
            assert!(t <= prev, "trials rose at u={u}: {prev} -> {t}");
            assert!((policy.min_trials()..=policy.max_trials()).contains(&t));
            prev = t;
        }
    }

    #[test]
    fn test_constant_trial_range() {
        let policy = TrialPolicy::new(2, 10, 5, 5).unwrap();
        for u in [1, 4, 100, 1 << 10, 1 << 30] {
            assert_eq!(policy.trials_for(u), 32);
        }
        // Equal breakpoints are fine when there is nothing to interpolate.
        assert_eq!(trials_for(77, 6, 6, 3, 3).unwrap(), 8);
    }

    #[test]
    fn test_zero_width_breakpoints_rejected() {
        let err = trials_for(10, 3, 3, 1, 4).unwrap_err();
        assert!(matches!(
            err,
            PlanError::ZeroWidthBreakpoints {
                lg_bp_u: 3,
                lg_min_t: 1,
                lg_max_t: 4
            }
        ));
        // Rejected eagerly, even for sizes that would saturate.
        assert!(trials_for(1, 3, 3, 1, 4).is_err());
    }

    #[test]
    fn test_bound_validation() {
        assert!(matches!(
            TrialPolicy::new(0, 8, 5, 2),
            Err(PlanError::InvertedTrialBounds {
                lg_min_t: 5,
                lg_max_t: 2
            })
        ));
        assert!(matches!(
            TrialPolicy::new(0, 63, 0, 1),
            Err(PlanError::ExponentTooLarge {
                name: "lgMaxBpU",
                value: 63
            })
        ));
        assert!(TrialPolicy::new(0, MAX_LG_EXPONENT, 0, MAX_LG_EXPONENT).is_ok());
    }
}
