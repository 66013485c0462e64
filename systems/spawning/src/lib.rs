#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system responsible for emitting robot spawn commands.

use std::time::Duration;

use citadel_defence_core::{Command, Grid, Phase, RobotId};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random identifier draws attempted before falling back to a scan.
const ID_DRAW_ATTEMPTS: usize = 32;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    min_step_delay: Duration,
    max_step_delay: Duration,
    robot_id_limit: u32,
    rng_seed: Option<u64>,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence, step
    /// delay range and identifier space.
    #[must_use]
    pub const fn new(
        spawn_interval: Duration,
        min_step_delay: Duration,
        max_step_delay: Duration,
        robot_id_limit: u32,
    ) -> Self {
        Self {
            spawn_interval,
            min_step_delay,
            max_step_delay,
            robot_id_limit,
            rng_seed: None,
        }
    }

    /// Seeds the random source so runs are reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

impl From<&citadel_defence_core::Config> for Config {
    fn from(config: &citadel_defence_core::Config) -> Self {
        let base = Self::new(
            config.spawn_interval,
            config.min_step_delay,
            config.max_step_delay,
            config.robot_id_limit,
        );
        match config.seed {
            Some(seed) => base.with_seed(seed),
            None => base,
        }
    }
}

/// Pure system that emits a spawn command for every elapsed spawn interval.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    accumulator: Duration,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            accumulator: Duration::ZERO,
            rng,
        }
    }

    /// Advances the spawn clock by `dt` and emits spawn commands.
    ///
    /// `live` lists the identifiers of robots currently in the world; new
    /// identifiers never collide with them. Each command offers the four
    /// corners of `grid` in random order so the world can skip taken ones.
    pub fn handle(
        &mut self,
        dt: Duration,
        phase: Phase,
        live: &[RobotId],
        grid: &Grid,
        out: &mut Vec<Command>,
    ) {
        if phase != Phase::Running {
            self.accumulator = Duration::ZERO;
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let spawn_attempts = self.resolve_spawn_attempts();

        let mut issued: Vec<RobotId> = Vec::with_capacity(spawn_attempts);
        for _ in 0..spawn_attempts {
            let Some(robot) = self.select_id(|id| live.contains(&id) || issued.contains(&id))
            else {
                continue;
            };
            issued.push(robot);

            let mut cells = grid.corners().to_vec();
            cells.shuffle(&mut self.rng);
            out.push(Command::SpawnRobot {
                robot,
                cells,
                step_delay: self.draw_step_delay(),
            });
        }
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.config.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.config.spawn_interval {
            self.accumulator -= self.config.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    /// Draws an unused identifier from `0..robot_id_limit`, or `None` when
    /// every identifier is taken.
    fn select_id<F>(&mut self, taken: F) -> Option<RobotId>
    where
        F: Fn(RobotId) -> bool,
    {
        let limit = self.config.robot_id_limit;
        if limit == 0 {
            return None;
        }

        for _ in 0..ID_DRAW_ATTEMPTS {
            let candidate = RobotId::new(self.rng.gen_range(0..limit));
            if !taken(candidate) {
                return Some(candidate);
            }
        }

        // Crowded id space: walk from a random offset instead of redrawing.
        let offset = self.rng.gen_range(0..limit);
        (0..limit)
            .map(|step| RobotId::new((offset + step) % limit))
            .find(|candidate| !taken(*candidate))
    }

    fn draw_step_delay(&mut self) -> Duration {
        let Config {
            min_step_delay,
            max_step_delay,
            ..
        } = self.config;
        if min_step_delay >= max_step_delay {
            return min_step_delay;
        }
        self.rng.gen_range(min_step_delay..max_step_delay)
    }
}
