#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Survival scoring: a fixed number of points for every interval the citadel
//! holds.

use std::time::Duration;

use citadel_defence_core::{Command, Phase};

/// Pure system that emits score accruals as time passes.
#[derive(Debug)]
pub struct Scoring {
    interval: Duration,
    points: u64,
    accumulator: Duration,
}

impl Scoring {
    /// Creates a scoring system paying `points` every `interval`.
    ///
    /// The first interval is credited as soon as the game runs.
    #[must_use]
    pub const fn new(interval: Duration, points: u64) -> Self {
        Self {
            interval,
            points,
            accumulator: interval,
        }
    }

    /// Advances the score clock by `dt` and emits one accrual per whole
    /// interval.
    pub fn handle(&mut self, dt: Duration, phase: Phase, out: &mut Vec<Command>) {
        if phase != Phase::Running || self.interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            out.push(Command::AccrueScore {
                points: self.points,
            });
        }
    }
}
