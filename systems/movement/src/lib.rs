#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement system that drives a single robot through step and slide cycles.
//!
//! A [`Pilot`] never touches the world. It proposes commands and reads the
//! resulting events back to decide what the robot's task does next.

use std::time::Duration;

use citadel_defence_core::{Command, Event, RobotId};

/// Shortest pause between advance attempts, so a stalled robot with a zero
/// step delay still yields.
const MIN_PAUSE: Duration = Duration::from_millis(1);

/// Timing of the slide between two cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Animation {
    window: Duration,
    tick: Duration,
}

impl Animation {
    /// Creates an animation lasting `window`, sampled every `tick`.
    #[must_use]
    pub const fn new(window: Duration, tick: Duration) -> Self {
        Self { window, tick }
    }

    /// Pause between samples.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Fraction of the slide completed after `elapsed`, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.window.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.window.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Outcome of an advance attempt, read from the world's answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fate {
    /// The robot claimed a neighbouring cell and must now slide into it.
    Claimed,
    /// No step was possible this time; try again after the next delay.
    Stalled,
    /// The robot crashed, breached the citadel, or the game ended.
    Gone,
}

/// Outcome of a single slide sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slide {
    /// The robot is still between cells.
    Moving,
    /// The robot landed on its claimed cell.
    Arrived,
    /// The world stopped answering for this robot.
    Gone,
}

/// Per-robot movement driver.
#[derive(Clone, Copy, Debug)]
pub struct Pilot {
    robot: RobotId,
    step_delay: Duration,
    animation: Animation,
}

impl Pilot {
    /// Creates a pilot for `robot`.
    #[must_use]
    pub const fn new(robot: RobotId, step_delay: Duration, animation: Animation) -> Self {
        Self {
            robot,
            step_delay,
            animation,
        }
    }

    /// Robot driven by this pilot.
    #[must_use]
    pub const fn robot(&self) -> RobotId {
        self.robot
    }

    /// Pause taken before each advance attempt.
    #[must_use]
    pub fn pause(&self) -> Duration {
        self.step_delay.max(MIN_PAUSE)
    }

    /// Slide timing.
    #[must_use]
    pub const fn animation(&self) -> Animation {
        self.animation
    }

    /// Command asking the world to pick and commit the next step.
    #[must_use]
    pub const fn advance(&self) -> Command {
        Command::AdvanceRobot { robot: self.robot }
    }

    /// Reads the events produced by [`Pilot::advance`].
    #[must_use]
    pub fn assess(&self, events: &[Event]) -> Fate {
        for event in events {
            match event {
                Event::RobotClaimedCell { robot, .. } if *robot == self.robot => {
                    return Fate::Claimed
                }
                Event::RobotStalled { robot, .. } if *robot == self.robot => {
                    return Fate::Stalled
                }
                _ => {}
            }
        }
        Fate::Gone
    }

    /// Command placing the robot where it should be `elapsed` into its slide.
    #[must_use]
    pub fn animate(&self, elapsed: Duration) -> Command {
        Command::AnimateRobot {
            robot: self.robot,
            progress: self.animation.progress(elapsed),
        }
    }

    /// Reads the events produced by [`Pilot::animate`].
    #[must_use]
    pub fn slide(&self, events: &[Event]) -> Slide {
        let mut outcome = Slide::Gone;
        for event in events {
            match event {
                Event::RobotArrived { robot, .. } if *robot == self.robot => {
                    return Slide::Arrived
                }
                Event::RobotMoved { robot, .. } if *robot == self.robot => {
                    outcome = Slide::Moving;
                }
                _ => {}
            }
        }
        outcome
    }
}
