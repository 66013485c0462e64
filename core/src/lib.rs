#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Citadel Defence engine.
//!
//! This crate defines the message surface that connects the presentation
//! adapter, the authoritative world, and the pure systems. Workers submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and answers with [`Event`] values
//! that the engine forwards to the adapter through an [`ArenaListener`].
//! Adapters never mutate state directly; they read a [`RenderSnapshot`] and
//! report clicks.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Citadel Defence.";

/// Largest wall capacity a configuration may ask for.
pub const MAX_WALL_CAPACITY: usize = 4096;

/// Lifecycle of a single game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The engine has been built but no worker is running yet.
    NotStarted,
    /// Robots spawn and move, walls are placed, and score accrues.
    Running,
    /// Terminal state. Nothing moves and nothing is placed any more.
    Over,
}

/// Reason the game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameOverCause {
    /// A robot stepped onto the citadel cell.
    CitadelBreached {
        /// Robot that reached the citadel first.
        robot: RobotId,
    },
    /// The adapter shut the engine down.
    Shutdown,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Transitions the world from [`Phase::NotStarted`] to [`Phase::Running`].
    Start,
    /// Requests a new robot on the first free cell among the candidates.
    SpawnRobot {
        /// Identifier to assign; rejected when a live robot already uses it.
        robot: RobotId,
        /// Candidate edge cells in order of preference.
        cells: Vec<CellCoord>,
        /// Pause the robot takes before each attempted step.
        step_delay: Duration,
    },
    /// Asks a robot to evaluate and commit its next grid step.
    AdvanceRobot {
        /// Robot attempting to move.
        robot: RobotId,
    },
    /// Moves a robot's rendered position along its committed step.
    AnimateRobot {
        /// Robot being animated.
        robot: RobotId,
        /// Fraction of the step completed, clamped to `0.0..=1.0`. A value of
        /// one lands the robot on its claimed cell.
        progress: f64,
    },
    /// Reserves wall capacity for a clicked cell.
    ReserveWall {
        /// Cell the player clicked.
        cell: CellCoord,
    },
    /// Builds a wall on a previously reserved cell if it is still free.
    PlaceWall {
        /// Cell dequeued by the wall worker.
        cell: CellCoord,
    },
    /// Returns the capacity slot of a reserved wall that never reached the
    /// wall worker. Honoured in every phase.
    CancelWall {
        /// Cell whose reservation is withdrawn.
        cell: CellCoord,
    },
    /// Adds periodic score while the game is running.
    AccrueScore {
        /// Points to add.
        points: u64,
    },
    /// Forces the world into [`Phase::Over`].
    EndGame,
}

/// Events emitted by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The world entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// A robot was created.
    RobotSpawned {
        /// Identifier of the new robot.
        robot: RobotId,
        /// Edge cell the robot occupies.
        cell: CellCoord,
        /// Pause the robot takes before each attempted step.
        step_delay: Duration,
    },
    /// Every candidate spawn cell was taken by a robot or a wall.
    SpawnBlocked,
    /// The requested identifier belongs to a live robot.
    SpawnRejected {
        /// Identifier that collided.
        robot: RobotId,
    },
    /// A robot committed to moving into a neighbouring cell.
    RobotClaimedCell {
        /// Robot that claimed the cell.
        robot: RobotId,
        /// Cell the robot is leaving.
        from: CellCoord,
        /// Cell the robot is entering.
        to: CellCoord,
    },
    /// A robot's rendered position changed mid-step.
    RobotMoved {
        /// Robot that moved.
        robot: RobotId,
        /// Interpolated position in grid coordinates.
        position: Point,
    },
    /// A robot finished its step and now sits on the claimed cell.
    RobotArrived {
        /// Robot that arrived.
        robot: RobotId,
        /// Cell the robot occupies.
        cell: CellCoord,
    },
    /// No rule allowed the robot to move this tick.
    RobotStalled {
        /// Robot that stalled.
        robot: RobotId,
        /// Cell the robot remains on.
        cell: CellCoord,
    },
    /// A robot crashed into a wall and was removed.
    RobotDestroyed {
        /// Robot that was destroyed.
        robot: RobotId,
        /// Wall cell it crashed into.
        cell: CellCoord,
    },
    /// A robot reached the citadel and was removed.
    CitadelBreached {
        /// Robot that reached the citadel.
        robot: RobotId,
    },
    /// A wall request took a capacity slot and was queued.
    WallQueued {
        /// Requested cell.
        cell: CellCoord,
        /// Queued plus placed walls after the reservation.
        in_flight: usize,
    },
    /// A wall request was refused before queueing.
    WallRejected {
        /// Requested cell.
        cell: CellCoord,
        /// Reason for the refusal.
        reason: PlacementError,
    },
    /// A wall was built.
    WallPlaced {
        /// Cell the wall occupies.
        cell: CellCoord,
    },
    /// A queued wall was dropped because its cell was taken or its request
    /// was withdrawn.
    WallDiscarded {
        /// Requested cell.
        cell: CellCoord,
        /// Queued plus placed walls after releasing the slot.
        in_flight: usize,
    },
    /// A wall absorbed its first hit.
    WallDamaged {
        /// Cell of the wall.
        cell: CellCoord,
        /// Robot that hit it.
        robot: RobotId,
    },
    /// A damaged wall absorbed its second hit and was removed.
    WallDestroyed {
        /// Cell the wall occupied.
        cell: CellCoord,
        /// Robot that hit it.
        robot: RobotId,
        /// Queued plus placed walls after releasing the slot.
        in_flight: usize,
    },
    /// Score increased.
    ScoreAwarded {
        /// Points added by this award.
        points: u64,
        /// Score after the award.
        total: u64,
    },
    /// The game ended.
    GameOver {
        /// Why the game ended.
        cause: GameOverCause,
    },
}

impl Event {
    /// Reports whether the event changes anything an adapter draws.
    #[must_use]
    pub const fn requires_redraw(&self) -> bool {
        !matches!(
            self,
            Self::PhaseChanged { .. }
                | Self::SpawnBlocked
                | Self::SpawnRejected { .. }
                | Self::RobotClaimedCell { .. }
                | Self::RobotStalled { .. }
                | Self::WallRejected { .. }
        )
    }
}

/// Unique identifier assigned to a live robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RobotId(u32);

impl RobotId {
    /// Creates a new robot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev (king move) distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Centre of the cell expressed as a grid-space point.
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.column), f64::from(self.row))
    }
}

/// Position in grid coordinates. Integral values name whole cells; fractional
/// values only appear while a robot is animated between two cells.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a point from raw coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Component-wise difference `to - self`.
    #[must_use]
    pub fn vector_to(self, to: Point) -> Point {
        Point::new(to.x - self.x, to.y - self.y)
    }

    /// Linear interpolation toward `to`; `t` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, to: Point, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        let delta = self.vector_to(to);
        Point::new(self.x + delta.x * t, self.y + delta.y * t)
    }

    /// Returns the cell this point names exactly, if it is integral and
    /// non-negative.
    #[must_use]
    pub fn cell(self) -> Option<CellCoord> {
        let whole = |value: f64| -> Option<u32> {
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value <= f64::from(u32::MAX)
            {
                Some(value as u32)
            } else {
                None
            }
        };
        Some(CellCoord::new(whole(self.x)?, whole(self.y)?))
    }
}

/// Single-cell step expressed as a unit offset per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Step {
    columns: i8,
    rows: i8,
}

impl Step {
    /// Unit step from `from` toward `to`, chosen independently per axis.
    ///
    /// Each component is `-1`, `0` or `+1`.
    #[must_use]
    pub fn toward(from: CellCoord, to: CellCoord) -> Self {
        Self {
            columns: signum(from.column(), to.column()),
            rows: signum(from.row(), to.row()),
        }
    }

    /// Column component of the step.
    #[must_use]
    pub const fn columns(&self) -> i8 {
        self.columns
    }

    /// Row component of the step.
    #[must_use]
    pub const fn rows(&self) -> i8 {
        self.rows
    }
}

fn signum(from: u32, to: u32) -> i8 {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

/// Fixed-size arena with a central citadel and four spawn corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    width: u32,
    height: u32,
}

impl Grid {
    /// Creates a grid description. Validation happens in [`Config::validate`].
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Citadel cell at `((width - 1) / 2, (height - 1) / 2)`.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        CellCoord::new(
            self.width.saturating_sub(1) / 2,
            self.height.saturating_sub(1) / 2,
        )
    }

    /// Spawn corners in clockwise order starting at the origin.
    #[must_use]
    pub const fn corners(&self) -> [CellCoord; 4] {
        let right = self.width.saturating_sub(1);
        let bottom = self.height.saturating_sub(1);
        [
            CellCoord::new(0, 0),
            CellCoord::new(right, 0),
            CellCoord::new(right, bottom),
            CellCoord::new(0, bottom),
        ]
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Reports whether the cell lies on the outer ring of the grid.
    #[must_use]
    pub const fn is_edge(&self, cell: CellCoord) -> bool {
        self.contains(cell)
            && (cell.column() == 0
                || cell.row() == 0
                || cell.column() + 1 == self.width
                || cell.row() + 1 == self.height)
    }

    /// Reports whether walls are forbidden on the cell: the citadel and the
    /// four spawn corners.
    #[must_use]
    pub fn is_reserved(&self, cell: CellCoord) -> bool {
        cell == self.center() || self.corners().contains(&cell)
    }

    /// Converts signed click coordinates into a cell inside the grid.
    #[must_use]
    pub fn cell_at(&self, x: i64, y: i64) -> Option<CellCoord> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        let cell = CellCoord::new(column, row);
        self.contains(cell).then_some(cell)
    }

    /// Neighbour of `cell` displaced along the column axis, clamped to the
    /// grid. `None` when the step does not change the column.
    #[must_use]
    pub fn step_columns(&self, cell: CellCoord, step: Step) -> Option<CellCoord> {
        let column = clamp_axis(cell.column(), step.columns(), self.width)?;
        Some(CellCoord::new(column, cell.row()))
    }

    /// Neighbour of `cell` displaced along the row axis, clamped to the grid.
    /// `None` when the step does not change the row.
    #[must_use]
    pub fn step_rows(&self, cell: CellCoord, step: Step) -> Option<CellCoord> {
        let row = clamp_axis(cell.row(), step.rows(), self.height)?;
        Some(CellCoord::new(cell.column(), row))
    }
}

fn clamp_axis(value: u32, delta: i8, extent: u32) -> Option<u32> {
    let upper = i64::from(extent.saturating_sub(1));
    let moved = (i64::from(value) + i64::from(delta)).clamp(0, upper);
    let moved = u32::try_from(moved).ok()?;
    (moved != value).then_some(moved)
}

/// Tuning parameters for a single game.
///
/// Durations are stored in whole milliseconds when serialised, which keeps the
/// TOML form readable (`spawn_interval = 1500`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of grid columns. Must be odd.
    pub grid_width: u32,
    /// Number of grid rows. Must be odd.
    pub grid_height: u32,
    /// Pause between spawn attempts.
    #[serde(with = "millis")]
    pub spawn_interval: Duration,
    /// Shortest per-robot step delay (inclusive).
    #[serde(with = "millis")]
    pub min_step_delay: Duration,
    /// Longest per-robot step delay (exclusive unless equal to the minimum).
    #[serde(with = "millis")]
    pub max_step_delay: Duration,
    /// Time a robot takes to slide from one cell to the next.
    #[serde(with = "millis")]
    pub animation_window: Duration,
    /// Sampling interval of the slide animation.
    #[serde(with = "millis")]
    pub animation_tick: Duration,
    /// Upper bound on queued plus placed walls.
    pub wall_capacity: usize,
    /// Pause the wall worker takes after building a wall.
    #[serde(with = "millis")]
    pub wall_cooldown: Duration,
    /// Period of the score ticker.
    #[serde(with = "millis")]
    pub score_interval: Duration,
    /// Points added every score period.
    pub score_per_interval: u64,
    /// Points awarded when a wall stops a robot.
    pub destruction_bonus: u64,
    /// Robot identifiers are drawn from `0..robot_id_limit`.
    pub robot_id_limit: u32,
    /// Seed for the spawner's random source; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_width: 9,
            grid_height: 9,
            spawn_interval: Duration::from_millis(1500),
            min_step_delay: Duration::from_millis(500),
            max_step_delay: Duration::from_millis(2000),
            animation_window: Duration::from_millis(400),
            animation_tick: Duration::from_millis(10),
            wall_capacity: 10,
            wall_cooldown: Duration::from_millis(2000),
            score_interval: Duration::from_secs(1),
            score_per_interval: 10,
            destruction_bonus: 100,
            robot_id_limit: 10_000,
            seed: None,
        }
    }
}

impl Config {
    /// Grid described by the configured dimensions.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        Grid::new(self.grid_width, self.grid_height)
    }

    /// Checks that the configuration describes a playable game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, extent) in [("width", self.grid_width), ("height", self.grid_height)] {
            if extent < 3 {
                return Err(ConfigError::GridTooSmall { axis, extent });
            }
            if extent % 2 == 0 {
                return Err(ConfigError::EvenGrid { axis, extent });
            }
        }
        if self.min_step_delay > self.max_step_delay {
            return Err(ConfigError::InvertedStepDelay {
                min: self.min_step_delay,
                max: self.max_step_delay,
            });
        }
        if self.spawn_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("spawn_interval"));
        }
        if self.score_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("score_interval"));
        }
        if !self.animation_window.is_zero() && self.animation_tick.is_zero() {
            return Err(ConfigError::ZeroDuration("animation_tick"));
        }
        if self.wall_capacity == 0 {
            return Err(ConfigError::NoWallCapacity);
        }
        if self.wall_capacity > MAX_WALL_CAPACITY {
            return Err(ConfigError::TooManyWalls {
                capacity: self.wall_capacity,
                max: MAX_WALL_CAPACITY,
            });
        }
        if self.robot_id_limit == 0 {
            return Err(ConfigError::NoRobotIds);
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Reasons a configuration cannot drive a game.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Even extents leave the citadel ambiguous.
    #[error("grid {axis} must be odd so the citadel is a single cell, got {extent}")]
    EvenGrid {
        /// Axis that failed validation.
        axis: &'static str,
        /// Offending extent.
        extent: u32,
    },
    /// The grid has no room between corners and citadel.
    #[error("grid {axis} must be at least 3, got {extent}")]
    GridTooSmall {
        /// Axis that failed validation.
        axis: &'static str,
        /// Offending extent.
        extent: u32,
    },
    /// The step delay range is empty.
    #[error("min_step_delay {min:?} exceeds max_step_delay {max:?}")]
    InvertedStepDelay {
        /// Configured minimum.
        min: Duration,
        /// Configured maximum.
        max: Duration,
    },
    /// A period that drives a loop is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    /// Walls could never be placed.
    #[error("wall_capacity must be greater than zero")]
    NoWallCapacity,
    /// The wall queue would be larger than any grid can use.
    #[error("wall_capacity must be at most {max}, got {capacity}")]
    TooManyWalls {
        /// Configured capacity.
        capacity: usize,
        /// Largest accepted capacity.
        max: usize,
    },
    /// Robots could never be identified.
    #[error("robot_id_limit must be greater than zero")]
    NoRobotIds,
}

/// Reasons a wall request is refused before it reaches the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum PlacementError {
    /// The click fell outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// Walls may not cover the citadel or a spawn corner.
    #[error("cell is reserved for the citadel or a spawn corner")]
    Reserved,
    /// Queued plus placed walls already reached capacity.
    #[error("wall capacity reached")]
    AtCapacity,
    /// The game has not started or is already over.
    #[error("game is not running")]
    NotRunning,
}

/// Construction-time rejections for robots and walls.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum EntityError {
    /// A coordinate was NaN or infinite.
    #[error("position ({x}, {y}) is not finite")]
    NonFinite {
        /// Offending horizontal coordinate.
        x: f64,
        /// Offending vertical coordinate.
        y: f64,
    },
    /// A coordinate was below zero.
    #[error("position ({x}, {y}) has a negative coordinate")]
    Negative {
        /// Offending horizontal coordinate.
        x: f64,
        /// Offending vertical coordinate.
        y: f64,
    },
    /// The position lies beyond the last row or column.
    #[error("position ({x}, {y}) lies outside the grid")]
    OutOfBounds {
        /// Offending horizontal coordinate.
        x: f64,
        /// Offending vertical coordinate.
        y: f64,
    },
    /// Walls cannot cover the citadel or a spawn corner.
    #[error("cell ({}, {}) is reserved", .0.column(), .0.row())]
    Reserved(CellCoord),
}

/// Checks that a point is finite, non-negative and inside the grid.
pub fn validate_position(grid: &Grid, position: Point) -> Result<(), EntityError> {
    let (x, y) = (position.x(), position.y());
    if !x.is_finite() || !y.is_finite() {
        return Err(EntityError::NonFinite { x, y });
    }
    if x < 0.0 || y < 0.0 {
        return Err(EntityError::Negative { x, y });
    }
    if x > f64::from(grid.width().saturating_sub(1))
        || y > f64::from(grid.height().saturating_sub(1))
    {
        return Err(EntityError::OutOfBounds { x, y });
    }
    Ok(())
}

/// Immutable representation of a single robot used for rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RobotSnapshot {
    /// Identifier of the robot.
    pub id: RobotId,
    /// Rendered position, fractional while the robot is mid-step.
    pub position: Point,
    /// Cell the robot occupies or is moving into.
    pub claimed: CellCoord,
}

/// Immutable representation of a single wall used for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WallSnapshot {
    /// Cell the wall occupies.
    pub cell: CellCoord,
    /// Whether the wall already absorbed one hit.
    pub damaged: bool,
}

/// Point-in-time view of everything an adapter draws.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSnapshot {
    /// Live robots ordered by identifier.
    pub robots: Vec<RobotSnapshot>,
    /// Standing walls ordered by cell.
    pub walls: Vec<WallSnapshot>,
    /// Current score.
    pub score: u64,
    /// Queued plus placed walls.
    pub walls_in_flight: usize,
    /// Configured wall capacity.
    pub wall_capacity: usize,
    /// Lifecycle phase at the time of capture.
    pub phase: Phase,
}

impl RenderSnapshot {
    /// Reports whether the game has ended.
    #[must_use]
    pub fn game_over(&self) -> bool {
        self.phase == Phase::Over
    }

    /// Status line in the form `Walls: n/capacity  Score: s`.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "Walls: {}/{}  Score: {}",
            self.walls_in_flight, self.wall_capacity, self.score
        )
    }
}

/// Callbacks the engine makes into the presentation adapter.
///
/// Both callbacks run on engine worker threads with no engine lock held, so
/// implementations may call back into the engine.
pub trait ArenaListener: Send + Sync {
    /// Something visible changed; the adapter should schedule a redraw.
    fn request_redraw(&self);

    /// The game ended. Delivered exactly once.
    fn game_over(&self, cause: GameOverCause);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn chebyshev_distance_takes_longest_axis() {
        assert_eq!(CellCoord::new(0, 0).chebyshev_distance(CellCoord::new(4, 2)), 4);
        assert_eq!(CellCoord::new(4, 4).chebyshev_distance(CellCoord::new(4, 4)), 0);
    }

    #[test]
    fn step_points_toward_target_per_axis() {
        let center = CellCoord::new(4, 4);
        let step = Step::toward(CellCoord::new(0, 8), center);
        assert_eq!((step.columns(), step.rows()), (1, -1));

        let aligned = Step::toward(CellCoord::new(4, 0), center);
        assert_eq!((aligned.columns(), aligned.rows()), (0, 1));
    }

    #[test]
    fn default_grid_center_and_corners() {
        let grid = Config::default().grid();
        assert_eq!(grid.center(), CellCoord::new(4, 4));
        assert_eq!(
            grid.corners(),
            [
                CellCoord::new(0, 0),
                CellCoord::new(8, 0),
                CellCoord::new(8, 8),
                CellCoord::new(0, 8),
            ]
        );
        assert!(grid.is_reserved(CellCoord::new(4, 4)));
        assert!(grid.is_reserved(CellCoord::new(8, 0)));
        assert!(!grid.is_reserved(CellCoord::new(4, 3)));
    }

    #[test]
    fn grid_steps_clamp_and_skip_null_moves() {
        let grid = Grid::new(5, 5);
        let corner = CellCoord::new(0, 0);
        let outward = Step { columns: -1, rows: -1 };
        assert_eq!(grid.step_columns(corner, outward), None);
        assert_eq!(grid.step_rows(corner, outward), None);

        let inward = Step::toward(corner, grid.center());
        assert_eq!(grid.step_columns(corner, inward), Some(CellCoord::new(1, 0)));
        assert_eq!(grid.step_rows(corner, inward), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn cell_at_rejects_negative_and_outside_clicks() {
        let grid = Grid::new(9, 9);
        assert_eq!(grid.cell_at(-1, 3), None);
        assert_eq!(grid.cell_at(3, 9), None);
        assert_eq!(grid.cell_at(3, 8), Some(CellCoord::new(3, 8)));
    }

    #[test]
    fn point_cell_requires_whole_coordinates() {
        assert_eq!(Point::new(2.0, 3.0).cell(), Some(CellCoord::new(2, 3)));
        assert_eq!(Point::new(2.5, 3.0).cell(), None);
        assert_eq!(Point::new(-1.0, 3.0).cell(), None);
    }

    #[test]
    fn lerp_clamps_progress() {
        let from = Point::new(0.0, 1.0);
        let to = Point::new(0.0, 2.0);
        assert_eq!(from.lerp(to, 0.5), Point::new(0.0, 1.5));
        assert_eq!(from.lerp(to, 3.0), to);
        assert_eq!(from.lerp(to, -1.0), from);
    }

    #[test]
    fn validate_position_rejects_each_failure() {
        let grid = Grid::new(9, 9);
        assert!(matches!(
            validate_position(&grid, Point::new(f64::NAN, 0.0)),
            Err(EntityError::NonFinite { .. })
        ));
        assert!(matches!(
            validate_position(&grid, Point::new(-1.0, 0.0)),
            Err(EntityError::Negative { .. })
        ));
        assert!(matches!(
            validate_position(&grid, Point::new(9.0, 0.0)),
            Err(EntityError::OutOfBounds { .. })
        ));
        assert!(validate_position(&grid, Point::new(8.0, 7.5)).is_ok());
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn config_rejects_even_grids() {
        let config = Config {
            grid_width: 8,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EvenGrid {
                axis: "width",
                extent: 8
            })
        );
    }

    #[test]
    fn config_rejects_inverted_delays_and_zero_capacity() {
        let inverted = Config {
            min_step_delay: Duration::from_millis(10),
            max_step_delay: Duration::from_millis(5),
            ..Config::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvertedStepDelay { .. })
        ));

        let no_walls = Config {
            wall_capacity: 0,
            ..Config::default()
        };
        assert_eq!(no_walls.validate(), Err(ConfigError::NoWallCapacity));
    }

    #[test]
    fn config_bounds_wall_capacity() {
        let largest = Config {
            wall_capacity: MAX_WALL_CAPACITY,
            ..Config::default()
        };
        assert_eq!(largest.validate(), Ok(()));

        let huge = Config {
            wall_capacity: 1_000_000_000_000,
            ..Config::default()
        };
        assert_eq!(
            huge.validate(),
            Err(ConfigError::TooManyWalls {
                capacity: 1_000_000_000_000,
                max: MAX_WALL_CAPACITY,
            })
        );
    }

    #[test]
    fn config_reads_partial_toml_in_milliseconds() {
        let config: Config =
            toml::from_str("grid_width = 7\nwall_cooldown = 250\nseed = 42\n")
                .expect("parse config");
        assert_eq!(config.grid_width, 7);
        assert_eq!(config.grid_height, 9);
        assert_eq!(config.wall_cooldown, Duration::from_millis(250));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.spawn_interval, Duration::from_millis(1500));
    }

    #[test]
    fn config_rejects_unknown_keys() {
        let parsed: Result<Config, _> = toml::from_str("grid_widht = 7\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn only_visible_events_request_redraw() {
        assert!(Event::WallPlaced {
            cell: CellCoord::new(1, 2)
        }
        .requires_redraw());
        assert!(!Event::RobotStalled {
            robot: RobotId::new(1),
            cell: CellCoord::new(0, 0)
        }
        .requires_redraw());
    }

    #[test]
    fn status_line_reports_walls_and_score() {
        let snapshot = RenderSnapshot {
            robots: Vec::new(),
            walls: Vec::new(),
            score: 120,
            walls_in_flight: 3,
            wall_capacity: 10,
            phase: Phase::Running,
        };
        assert_eq!(snapshot.status_line(), "Walls: 3/10  Score: 120");
        assert!(!snapshot.game_over());
    }
}
