//! Step selection for robots heading to the citadel.

use citadel_defence_core::{CellCoord, Grid, Step};

/// What a robot does on its next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepDecision {
    /// The next step enters the citadel along an aligned axis.
    Breach,
    /// Move into the neighbouring cell.
    Move(CellCoord),
    /// Every candidate cell is held by another robot.
    Stall,
}

/// Chooses the next step for a robot resting on `position`.
///
/// Rules are evaluated in order and the first match wins:
///
/// 1. the aligned step lands on the citadel: breach;
/// 2. column already matches the citadel and the row step is free;
/// 3. row already matches the citadel and the column step is free;
/// 4. the row step is free;
/// 5. the column step is free.
///
/// `is_free` must answer for other robots only; walls are not obstacles here,
/// robots crash into them.
pub fn decide_step<F>(position: CellCoord, grid: &Grid, is_free: F) -> StepDecision
where
    F: Fn(CellCoord) -> bool,
{
    let center = grid.center();
    let step = Step::toward(position, center);
    let along_columns = grid.step_columns(position, step);
    let along_rows = grid.step_rows(position, step);

    let aligned_column = position.column() == center.column();
    let aligned_row = position.row() == center.row();

    if (aligned_row && along_columns == Some(center))
        || (aligned_column && along_rows == Some(center))
    {
        return StepDecision::Breach;
    }

    let free = |candidate: Option<CellCoord>| candidate.filter(|cell| is_free(*cell));

    let choice = (if aligned_column { free(along_rows) } else { None })
        .or_else(|| if aligned_row { free(along_columns) } else { None })
        .or_else(|| free(along_rows))
        .or_else(|| free(along_columns));

    choice.map_or(StepDecision::Stall, StepDecision::Move)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(9, 9)
    }

    #[test]
    fn adjacent_aligned_robot_breaches() {
        assert_eq!(
            decide_step(CellCoord::new(3, 4), &grid(), |_| true),
            StepDecision::Breach
        );
        assert_eq!(
            decide_step(CellCoord::new(4, 5), &grid(), |_| false),
            StepDecision::Breach
        );
    }

    #[test]
    fn diagonal_neighbour_does_not_breach() {
        assert_eq!(
            decide_step(CellCoord::new(3, 3), &grid(), |_| true),
            StepDecision::Move(CellCoord::new(3, 4))
        );
    }

    #[test]
    fn rows_are_preferred_off_axis() {
        assert_eq!(
            decide_step(CellCoord::new(0, 0), &grid(), |_| true),
            StepDecision::Move(CellCoord::new(0, 1))
        );
    }

    #[test]
    fn falls_back_to_columns_when_row_is_held() {
        let blocked = CellCoord::new(0, 1);
        assert_eq!(
            decide_step(CellCoord::new(0, 0), &grid(), |cell| cell != blocked),
            StepDecision::Move(CellCoord::new(1, 0))
        );
    }

    #[test]
    fn aligned_robot_stays_on_its_axis() {
        assert_eq!(
            decide_step(CellCoord::new(0, 4), &grid(), |_| true),
            StepDecision::Move(CellCoord::new(1, 4))
        );
        assert_eq!(
            decide_step(CellCoord::new(4, 8), &grid(), |_| true),
            StepDecision::Move(CellCoord::new(4, 7))
        );
    }

    #[test]
    fn aligned_robot_stalls_when_its_only_step_is_held() {
        assert_eq!(
            decide_step(CellCoord::new(0, 4), &grid(), |_| false),
            StepDecision::Stall
        );
    }

    #[test]
    fn walking_from_a_corner_never_increases_distance() {
        let grid = grid();
        let center = grid.center();
        let mut position = CellCoord::new(0, 0);
        let mut steps = 0;
        loop {
            match decide_step(position, &grid, |_| true) {
                StepDecision::Breach => break,
                StepDecision::Move(next) => {
                    assert!(next.chebyshev_distance(center) <= position.chebyshev_distance(center));
                    assert_eq!(
                        next.manhattan_distance(center) + 1,
                        position.manhattan_distance(center)
                    );
                    position = next;
                }
                StepDecision::Stall => panic!("free grid must never stall"),
            }
            steps += 1;
            assert!(steps < 16, "robot failed to converge");
        }
        assert_eq!(position.manhattan_distance(center), 1);
    }
}
