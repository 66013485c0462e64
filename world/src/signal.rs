//! Lifecycle flag shared by every worker.

use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Condvar, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

use citadel_defence_core::Phase;

const NOT_STARTED: u8 = 0;
const RUNNING: u8 = 1;
const OVER: u8 = 2;

/// Game phase plus a wake-up channel for sleeping workers.
///
/// The phase only moves forward. Sleeps taken through [`StopSignal::sleep`]
/// return early as soon as the phase becomes [`Phase::Over`].
#[derive(Debug, Default)]
pub struct StopSignal {
    phase: AtomicU8,
    gate: Mutex<()>,
    wake: Condvar,
}

impl StopSignal {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            NOT_STARTED => Phase::NotStarted,
            RUNNING => Phase::Running,
            _ => Phase::Over,
        }
    }

    /// Reports whether the game is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase.load(Ordering::Acquire) == RUNNING
    }

    /// Reports whether the game has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase.load(Ordering::Acquire) == OVER
    }

    /// Moves `NotStarted -> Running`. Returns `false` in any other phase.
    pub(crate) fn start(&self) -> bool {
        self.phase
            .compare_exchange(NOT_STARTED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Moves to `Over` and wakes every sleeper. Returns `true` for the call
    /// that performed the transition.
    pub(crate) fn halt(&self) -> bool {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.phase.swap(OVER, Ordering::AcqRel);
        self.wake.notify_all();
        previous != OVER
    }

    /// Sleeps for `duration` unless the game ends first.
    ///
    /// Returns `true` when the full duration elapsed with the game still not
    /// over, `false` when the game is (or becomes) over. A duration too long
    /// to express as an [`Instant`] waits for the end of the game alone.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.is_over() {
                return false;
            }
            gate = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return true;
                    }
                    self.wake
                        .wait_timeout(gate, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self.wake.wait(gate).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Blocks until the game is over or `timeout` elapses. Returns whether the
    /// game is over.
    pub fn wait_until_over(&self, timeout: Duration) -> bool {
        !self.sleep(timeout) || self.is_over()
    }
}
