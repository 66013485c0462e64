//! Robot records and the roster that owns them.

use std::{collections::BTreeMap, time::Duration};

use citadel_defence_core::{
    validate_position, CellCoord, EntityError, Grid, Point, RobotId, RobotSnapshot,
};

/// A robot marching on the citadel.
///
/// `position` is what gets drawn. `claimed` is the cell the robot holds or is
/// moving into; `origin` is the cell the current step started from. Outside a
/// step all three name the same cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Robot {
    id: RobotId,
    position: Point,
    origin: CellCoord,
    claimed: CellCoord,
    step_delay: Duration,
}

impl Robot {
    /// Creates a robot resting on `position`, which must name a whole cell
    /// inside the grid.
    pub fn new(
        id: RobotId,
        position: Point,
        step_delay: Duration,
        grid: &Grid,
    ) -> Result<Self, EntityError> {
        validate_position(grid, position)?;
        let cell = position.cell().ok_or(EntityError::OutOfBounds {
            x: position.x(),
            y: position.y(),
        })?;
        Ok(Self {
            id,
            position,
            origin: cell,
            claimed: cell,
            step_delay,
        })
    }

    /// Identifier of the robot.
    #[must_use]
    pub const fn id(&self) -> RobotId {
        self.id
    }

    /// Rendered position.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Cell the robot holds or is moving into.
    #[must_use]
    pub const fn claimed(&self) -> CellCoord {
        self.claimed
    }

    /// Pause before each attempted step.
    #[must_use]
    pub const fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Cell the robot rests on, or `None` while it is mid-step.
    #[must_use]
    pub fn resting_cell(&self) -> Option<CellCoord> {
        (self.origin == self.claimed && self.position == self.claimed.to_point())
            .then_some(self.claimed)
    }

    /// Reports whether the robot currently stands on or has claimed `cell`.
    #[must_use]
    pub fn holds(&self, cell: CellCoord) -> bool {
        self.claimed == cell || self.position == cell.to_point()
    }

    pub(crate) fn claim(&mut self, cell: CellCoord) {
        self.origin = self.claimed;
        self.claimed = cell;
    }

    pub(crate) fn slide(&mut self, progress: f64) -> Point {
        self.position = self
            .origin
            .to_point()
            .lerp(self.claimed.to_point(), progress);
        self.position
    }

    pub(crate) fn settle(&mut self) -> CellCoord {
        self.origin = self.claimed;
        self.position = self.claimed.to_point();
        self.claimed
    }

    pub(crate) fn snapshot(&self) -> RobotSnapshot {
        RobotSnapshot {
            id: self.id,
            position: self.position,
            claimed: self.claimed,
        }
    }
}

/// Live robots keyed by identifier.
#[derive(Debug, Default)]
pub(crate) struct RobotRoster {
    entries: BTreeMap<RobotId, Robot>,
}

impl RobotRoster {
    pub(crate) fn contains(&self, id: RobotId) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn get(&self, id: RobotId) -> Option<&Robot> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: RobotId) -> Option<&mut Robot> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn insert(&mut self, robot: Robot) {
        let _ = self.entries.insert(robot.id(), robot);
    }

    pub(crate) fn remove(&mut self, id: RobotId) -> Option<Robot> {
        self.entries.remove(&id)
    }

    /// Reports whether any robot other than `except` stands on or has
    /// claimed `cell`.
    pub(crate) fn is_occupied(&self, cell: CellCoord, except: Option<RobotId>) -> bool {
        self.entries
            .values()
            .any(|robot| Some(robot.id()) != except && robot.holds(cell))
    }

    pub(crate) fn ids(&self) -> Vec<RobotId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn snapshots(&self) -> Vec<RobotSnapshot> {
        self.entries.values().map(Robot::snapshot).collect()
    }
}
