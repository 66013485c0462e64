//! ASCII rendering of a snapshot, one character per cell.

use citadel_defence_core::{Grid, RenderSnapshot};

const EMPTY: char = '.';
const CORNER: char = '+';
const CITADEL: char = 'C';
const WALL: char = '#';
const DAMAGED_WALL: char = '%';
const ROBOT: char = 'R';

/// Draws the grid followed by the status line.
///
/// Robots are drawn on the cell nearest to their rendered position, so a
/// robot mid-step shows up on whichever cell it is closer to.
pub(crate) fn render_frame(snapshot: &RenderSnapshot, grid: Grid) -> String {
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let mut cells = vec![vec![EMPTY; width]; height];

    for corner in grid.corners() {
        put(&mut cells, corner.column() as usize, corner.row() as usize, CORNER);
    }
    let center = grid.center();
    put(&mut cells, center.column() as usize, center.row() as usize, CITADEL);

    for wall in &snapshot.walls {
        let glyph = if wall.damaged { DAMAGED_WALL } else { WALL };
        put(&mut cells, wall.cell.column() as usize, wall.cell.row() as usize, glyph);
    }
    for robot in &snapshot.robots {
        let x = robot.position.x().round();
        let y = robot.position.y().round();
        if x >= 0.0 && y >= 0.0 {
            put(&mut cells, x as usize, y as usize, ROBOT);
        }
    }

    let mut frame = String::with_capacity((width + 1) * (height + 1) + 32);
    for row in cells {
        frame.extend(row);
        frame.push('\n');
    }
    frame.push_str(&snapshot.status_line());
    frame
}

fn put(cells: &mut [Vec<char>], column: usize, row: usize, glyph: char) {
    if let Some(cell) = cells.get_mut(row).and_then(|line| line.get_mut(column)) {
        *cell = glyph;
    }
}
