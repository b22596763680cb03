//! Logarithmic (base-2) input-size progression.
//!
//! Points are placed `steps_per_octave` to a doubling. Each point is
//! `round(2^(gi / ppo))` for a generating index `gi`. Indices that round to a
//! value already emitted are skipped, so the series never repeats an integer,
//! even when `ppo` is large compared to the current point.

use std::num::NonZeroU32;

use crate::error::{PlanError, Result};

/// Smallest point of the `steps_per_octave` series strictly greater than `current`.
pub fn pwr2_series_next(steps_per_octave: u32, current: u64) -> Result<u64> {
    let ppo = NonZeroU32::new(steps_per_octave).ok_or(PlanError::ZeroStepsPerOctave)?;
    GeometricStepper::from(ppo).next(current)
}

/// Validated wrapper around [`pwr2_series_next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometricStepper {
    steps_per_octave: NonZeroU32,
}

impl From<NonZeroU32> for GeometricStepper {
    fn from(steps_per_octave: NonZeroU32) -> Self {
        Self { steps_per_octave }
    }
}

impl GeometricStepper {
    pub fn new(steps_per_octave: u32) -> Result<Self> {
        NonZeroU32::new(steps_per_octave)
            .map(Self::from)
            .ok_or(PlanError::ZeroStepsPerOctave)
    }

    pub fn steps_per_octave(&self) -> u32 {
        self.steps_per_octave.get()
    }

    pub fn next(&self, current: u64) -> Result<u64> {
        if current == 0 || current == u64::MAX {
            return Err(PlanError::OutOfSeriesRange(current));
        }
        Ok(self.step_from(current))
    }

    /// Iterate `start, next(start), ...` up to and including the first point `>= end`.
    pub fn series(&self, start: u64, end: u64) -> Result<Series> {
        if start == 0 || start == u64::MAX {
            return Err(PlanError::OutOfSeriesRange(start));
        }
        Ok(Series {
            stepper: *self,
            next: Some(start),
            end,
        })
    }

    // Caller guarantees 1 <= current < u64::MAX. The first index whose point
    // rounds above `current` is ceil(ppo * log2(current + 0.5)); starting one
    // below it absorbs float error, so the loop runs a couple of passes at most.
    fn step_from(&self, current: u64) -> u64 {
        let ppo = f64::from(self.steps_per_octave.get());
        let mut gi = (ppo * (current as f64 + 0.5).log2()).ceil() as i64 - 2;
        loop {
            gi += 1;
            // `as` saturates, so the loop ends at u64::MAX at the latest.
            let next = 2f64.powf(gi as f64 / ppo).round() as u64;
            if next > current {
                return next;
            }
        }
    }
}

/// Iterator returned by [`GeometricStepper::series`].
#[derive(Clone, Debug)]
pub struct Series {
    stepper: GeometricStepper,
    next: Option<u64>,
    end: u64,
}

impl Iterator for Series {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = if current >= self.end || current == u64::MAX {
            None
        } else {
            Some(self.stepper.step_from(current))
        };
        Some(current)
    }
}
