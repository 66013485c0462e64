#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Citadel Defence.
//!
//! The world is shared by every engine thread. Each structure sits behind its
//! own lock and locks are always taken in the same order:
//!
//! `robots` -> `walls` -> `score`
//!
//! The wall counter is a single atomic and the phase lives in a
//! [`StopSignal`]. The phase only becomes [`Phase::Over`] while the `robots`
//! and `score` locks are held, and every mutation re-checks the phase under
//! the lock it mutates under, so nothing is committed after the game ends.
//! No lock is held when `apply` returns.

mod navigation;
mod robots;
mod signal;
mod walls;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use citadel_defence_core::{
    CellCoord, Command, Config, ConfigError, Event, GameOverCause, Grid, Phase, PlacementError,
    RobotId,
};

pub use navigation::{decide_step, StepDecision};
pub use robots::Robot;
pub use signal::StopSignal;
pub use walls::Wall;

use robots::RobotRoster;
use walls::{Impact, WallRegistry};

/// Represents the authoritative Citadel Defence world state.
#[derive(Debug)]
pub struct World {
    config: Config,
    grid: Grid,
    robots: Mutex<RobotRoster>,
    walls: Mutex<WallRegistry>,
    score: Mutex<u64>,
    walls_in_flight: AtomicUsize,
    signal: StopSignal,
}

impl World {
    /// Creates a world ready to start. Fails when the configuration does not
    /// describe a playable game.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid: config.grid(),
            config,
            robots: Mutex::new(RobotRoster::default()),
            walls: Mutex::new(WallRegistry::default()),
            score: Mutex::new(0),
            walls_in_flight: AtomicUsize::new(0),
            signal: StopSignal::default(),
        })
    }

    /// Lifecycle flag shared with the worker threads.
    #[must_use]
    pub fn signal(&self) -> &StopSignal {
        &self.signal
    }

    fn award(&self, score: &mut u64, points: u64, out_events: &mut Vec<Event>) {
        *score = score.saturating_add(points);
        out_events.push(Event::ScoreAwarded {
            points,
            total: *score,
        });
    }

    fn reserve_wall_slot(&self) -> Option<usize> {
        let capacity = self.config.wall_capacity;
        self.walls_in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < capacity).then_some(count + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    fn release_wall_slot(&self) -> usize {
        let previous = self
            .walls_in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Applies the provided command to the world.
///
/// Commands naming a robot that no longer exists produce no events. Once the
/// game is over every command except [`Command::CancelWall`] is ignored.
pub fn apply(world: &World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start => {
            if world.signal.start() {
                out_events.push(Event::PhaseChanged {
                    phase: Phase::Running,
                });
            }
        }
        Command::SpawnRobot {
            robot,
            cells,
            step_delay,
        } => spawn_robot(world, robot, &cells, step_delay, out_events),
        Command::AdvanceRobot { robot } => advance_robot(world, robot, out_events),
        Command::AnimateRobot { robot, progress } => {
            let mut robots = lock(&world.robots);
            if world.signal.is_over() {
                return;
            }
            let Some(entry) = robots.get_mut(robot) else {
                return;
            };
            if entry.resting_cell().is_some() {
                return;
            }
            if progress >= 1.0 {
                let cell = entry.settle();
                out_events.push(Event::RobotArrived { robot, cell });
            } else {
                let position = entry.slide(progress);
                out_events.push(Event::RobotMoved { robot, position });
            }
        }
        Command::ReserveWall { cell } => {
            let rejection = if !world.signal.is_running() {
                Some(PlacementError::NotRunning)
            } else if !world.grid.contains(cell) {
                Some(PlacementError::OutOfBounds)
            } else if world.grid.is_reserved(cell) {
                Some(PlacementError::Reserved)
            } else {
                None
            };
            if let Some(reason) = rejection {
                out_events.push(Event::WallRejected { cell, reason });
                return;
            }
            let reason = match world.reserve_wall_slot() {
                // The game may have ended between the phase check and the reservation.
                Some(_) if world.signal.is_over() => {
                    let _ = world.release_wall_slot();
                    PlacementError::NotRunning
                }
                Some(in_flight) => {
                    out_events.push(Event::WallQueued { cell, in_flight });
                    return;
                }
                None => PlacementError::AtCapacity,
            };
            out_events.push(Event::WallRejected { cell, reason });
        }
        Command::PlaceWall { cell } => {
            let robots = lock(&world.robots);
            let mut walls = lock(&world.walls);
            if world.signal.is_over() {
                return;
            }
            let placed = !walls.contains(cell)
                && !robots.is_occupied(cell, None)
                && Wall::new(cell, &world.grid)
                    .map(|wall| walls.insert(wall))
                    .unwrap_or(false);
            if placed {
                out_events.push(Event::WallPlaced { cell });
            } else {
                let in_flight = world.release_wall_slot();
                out_events.push(Event::WallDiscarded { cell, in_flight });
            }
        }
        Command::CancelWall { cell } => {
            let in_flight = world.release_wall_slot();
            out_events.push(Event::WallDiscarded { cell, in_flight });
        }
        Command::AccrueScore { points } => {
            let mut score = lock(&world.score);
            if world.signal.is_running() {
                world.award(&mut score, points, out_events);
            }
        }
        Command::EndGame => {
            let _robots = lock(&world.robots);
            let _score = lock(&world.score);
            if world.signal.halt() {
                out_events.push(Event::PhaseChanged { phase: Phase::Over });
                out_events.push(Event::GameOver {
                    cause: GameOverCause::Shutdown,
                });
            }
        }
    }
}

fn spawn_robot(
    world: &World,
    robot: RobotId,
    cells: &[CellCoord],
    step_delay: Duration,
    out_events: &mut Vec<Event>,
) {
    let mut robots = lock(&world.robots);
    let walls = lock(&world.walls);
    if !world.signal.is_running() {
        return;
    }
    if robots.contains(robot) {
        out_events.push(Event::SpawnRejected { robot });
        return;
    }

    let grid = &world.grid;
    let spawned = cells
        .iter()
        .copied()
        .filter(|cell| grid.is_edge(*cell) && *cell != grid.center())
        .filter(|cell| !walls.contains(*cell) && !robots.is_occupied(*cell, None))
        .find_map(|cell| Robot::new(robot, cell.to_point(), step_delay, grid).ok());

    match spawned {
        Some(entry) => {
            let cell = entry.claimed();
            robots.insert(entry);
            out_events.push(Event::RobotSpawned {
                robot,
                cell,
                step_delay,
            });
        }
        None => out_events.push(Event::SpawnBlocked),
    }
}

fn advance_robot(world: &World, robot: RobotId, out_events: &mut Vec<Event>) {
    let mut robots = lock(&world.robots);
    if world.signal.is_over() {
        return;
    }
    let Some(position) = robots.get(robot).and_then(Robot::resting_cell) else {
        return;
    };

    let decision = decide_step(position, &world.grid, |cell| {
        !robots.is_occupied(cell, Some(robot))
    });

    match decision {
        StepDecision::Stall => out_events.push(Event::RobotStalled {
            robot,
            cell: position,
        }),
        StepDecision::Breach => {
            let _ = robots.remove(robot);
            let _score = lock(&world.score);
            if world.signal.halt() {
                out_events.push(Event::CitadelBreached { robot });
                out_events.push(Event::PhaseChanged { phase: Phase::Over });
                out_events.push(Event::GameOver {
                    cause: GameOverCause::CitadelBreached { robot },
                });
            }
        }
        StepDecision::Move(target) => {
            let mut walls = lock(&world.walls);
            match walls.strike(target) {
                Some(impact) => {
                    let _ = robots.remove(robot);
                    match impact {
                        Impact::Damaged => out_events.push(Event::WallDamaged {
                            cell: target,
                            robot,
                        }),
                        Impact::Destroyed => {
                            let in_flight = world.release_wall_slot();
                            out_events.push(Event::WallDestroyed {
                                cell: target,
                                robot,
                                in_flight,
                            });
                        }
                    }
                    out_events.push(Event::RobotDestroyed {
                        robot,
                        cell: target,
                    });
                    let mut score = lock(&world.score);
                    world.award(&mut score, world.config.destruction_bonus, out_events);
                }
                None => {
                    if let Some(entry) = robots.get_mut(robot) {
                        entry.claim(target);
                        out_events.push(Event::RobotClaimedCell {
                            robot,
                            from: position,
                            to: target,
                        });
                    }
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use citadel_defence_core::{
        CellCoord, Config, Grid, Phase, RenderSnapshot, RobotId, RobotSnapshot, WallSnapshot,
    };

    use super::{lock, Robot, World};

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &Config {
        &world.config
    }

    /// Grid geometry.
    #[must_use]
    pub fn grid(world: &World) -> Grid {
        world.grid
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.signal.phase()
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        *lock(&world.score)
    }

    /// Queued plus placed walls.
    #[must_use]
    pub fn walls_in_flight(world: &World) -> usize {
        world
            .walls_in_flight
            .load(std::sync::atomic::Ordering::Acquire)
    }

    /// Identifiers of every live robot in ascending order.
    #[must_use]
    pub fn robot_ids(world: &World) -> Vec<RobotId> {
        lock(&world.robots).ids()
    }

    /// Snapshot of a single robot, if it is still alive.
    #[must_use]
    pub fn robot(world: &World, robot: RobotId) -> Option<RobotSnapshot> {
        lock(&world.robots).get(robot).map(Robot::snapshot)
    }

    /// Snapshot of the wall on `cell`, if one stands there.
    #[must_use]
    pub fn wall(world: &World, cell: CellCoord) -> Option<WallSnapshot> {
        lock(&world.walls).get(cell).map(|wall| WallSnapshot {
            cell: wall.cell(),
            damaged: wall.damaged(),
        })
    }

    /// Consistent view of everything an adapter draws.
    #[must_use]
    pub fn render_snapshot(world: &World) -> RenderSnapshot {
        let robots = lock(&world.robots);
        let walls = lock(&world.walls);
        let score = lock(&world.score);
        RenderSnapshot {
            robots: robots.snapshots(),
            walls: walls.snapshots(),
            score: *score,
            walls_in_flight: walls_in_flight(world),
            wall_capacity: world.config.wall_capacity,
            phase: world.signal.phase(),
        }
    }
}
