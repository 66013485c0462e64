#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns player clicks into wall commands and paces the
//! wall worker.

use std::time::Duration;

use citadel_defence_core::{CellCoord, Command, Event, Grid, PlacementError};

/// Translates clicks and queued cells into wall commands.
#[derive(Clone, Copy, Debug)]
pub struct Builder {
    grid: Grid,
    cooldown: Duration,
}

impl Builder {
    /// Creates a builder for `grid` that rests `cooldown` after each wall.
    #[must_use]
    pub const fn new(grid: Grid, cooldown: Duration) -> Self {
        Self { grid, cooldown }
    }

    /// Validates a click and produces the reservation command for it.
    ///
    /// Clicks outside the grid or on the citadel and spawn corners are
    /// refused here so they never touch wall capacity.
    pub fn request(&self, x: i64, y: i64) -> Result<Command, PlacementError> {
        let cell = self
            .grid
            .cell_at(x, y)
            .ok_or(PlacementError::OutOfBounds)?;
        if self.grid.is_reserved(cell) {
            return Err(PlacementError::Reserved);
        }
        Ok(Command::ReserveWall { cell })
    }

    /// Reads the world's answer to a reservation: the cell to enqueue, or the
    /// reason it was refused.
    pub fn outcome(&self, events: &[Event]) -> Result<CellCoord, PlacementError> {
        for event in events {
            match event {
                Event::WallQueued { cell, .. } => return Ok(*cell),
                Event::WallRejected { reason, .. } => return Err(*reason),
                _ => {}
            }
        }
        Err(PlacementError::NotRunning)
    }

    /// Command the wall worker issues for a dequeued cell.
    #[must_use]
    pub const fn place(&self, cell: CellCoord) -> Command {
        Command::PlaceWall { cell }
    }

    /// Command withdrawing a reservation whose cell could not be enqueued.
    #[must_use]
    pub const fn cancel(&self, cell: CellCoord) -> Command {
        Command::CancelWall { cell }
    }

    /// Pause the wall worker takes after processing `events`. Only a built
    /// wall costs a cooldown; discarded requests are free.
    #[must_use]
    pub fn cooldown(&self, events: &[Event]) -> Duration {
        if events
            .iter()
            .any(|event| matches!(event, Event::WallPlaced { .. }))
        {
            self.cooldown
        } else {
            Duration::ZERO
        }
    }
}
