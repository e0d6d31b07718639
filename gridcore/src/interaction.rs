use log::debug;

use crate::grid::{CellStatus, Grid};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DragMode {
    #[default]
    None,
    DraggingStart,
    DraggingEnd,
    /// Drawing or erasing walls
    Painting,
}

/// What a pointer event did to the grid
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Unchanged,
    WallsChanged,
    MarkerMoved,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Marker {
    Start,
    End,
}

/// Interprets pointer events on grid cells: toggles walls, or drags the start and end markers
/// around while keeping the wall layout intact.
#[derive(Debug, Default)]
pub struct Controller {
    mode: DragMode,
    // walls that were cleared to make room for a marker, restored once the marker leaves
    displaced_walls: Vec<usize>,
    last_index: Option<usize>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn displaced_walls(&self) -> &[usize] {
        &self.displaced_walls
    }

    /// Forget every displaced wall, e.g. after the grid was cleared or replaced
    pub fn reset(&mut self) {
        self.mode = DragMode::None;
        self.displaced_walls.clear();
        self.last_index = None;
    }

    pub fn pointer_down(&mut self, grid: &mut Grid, index: usize) -> Outcome {
        if !grid.is_valid(index) {
            return Outcome::Unchanged;
        }
        self.last_index = Some(index);

        if index == grid.start() {
            self.mode = DragMode::DraggingStart;
            debug!("dragging start from {}", index);
            Outcome::Unchanged
        } else if index == grid.end() {
            self.mode = DragMode::DraggingEnd;
            debug!("dragging end from {}", index);
            Outcome::Unchanged
        } else {
            self.mode = DragMode::Painting;
            toggle(grid, index)
        }
    }

    /// The pointer moved onto `index`. Repeated calls for the same cell are ignored.
    pub fn pointer_enter(&mut self, grid: &mut Grid, index: usize) -> Outcome {
        if !grid.is_valid(index) || self.last_index == Some(index) {
            return Outcome::Unchanged;
        }
        self.last_index = Some(index);

        match self.mode {
            DragMode::None => Outcome::Unchanged,
            DragMode::Painting => {
                if grid.is_marker(index) {
                    Outcome::Unchanged
                } else {
                    toggle(grid, index)
                }
            }
            DragMode::DraggingStart => self.move_marker(grid, Marker::Start, index),
            DragMode::DraggingEnd => self.move_marker(grid, Marker::End, index),
        }
    }

    pub fn pointer_up(&mut self) {
        self.mode = DragMode::None;
        self.last_index = None;
    }

    fn move_marker(&mut self, grid: &mut Grid, marker: Marker, index: usize) -> Outcome {
        let (previous, other) = match marker {
            Marker::Start => (grid.start(), grid.end()),
            Marker::End => (grid.end(), grid.start()),
        };

        // markers never share a cell
        if index == other || index == previous {
            return Outcome::Unchanged;
        }

        if grid.status(index) == Some(CellStatus::Wall) {
            self.displaced_walls.push(index);
            grid.write_raw(index, CellStatus::Empty);
        }

        if let Some(position) = self.displaced_walls.iter().position(|i| *i == previous) {
            self.displaced_walls.remove(position);
            grid.write_raw(previous, CellStatus::Wall);
        }

        match marker {
            Marker::Start => grid.place_start(index),
            Marker::End => grid.place_end(index),
        }
        debug!("moved {:?} marker {} -> {}", marker, previous, index);

        Outcome::MarkerMoved
    }
}

fn toggle(grid: &mut Grid, index: usize) -> Outcome {
    let Some(status) = grid.status(index) else {
        return Outcome::Unchanged;
    };
    if grid.set_cell_status(index, status.toggled()) {
        Outcome::WallsChanged
    } else {
        Outcome::Unchanged
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn walled_grid() -> Grid {
        // 3x3, start at 0, end at 8, wall in the middle
        let mut grid = Grid::new(3, 3, 0, 8).unwrap();
        grid.set_cell_status(4, CellStatus::Wall);
        grid
    }

    #[test]
    fn test_plain_drag_toggles_walls() {
        let mut grid = walled_grid();
        let mut controller = Controller::new();

        assert_eq!(controller.pointer_down(&mut grid, 1), Outcome::WallsChanged);
        assert_eq!(controller.mode(), DragMode::Painting);
        assert_eq!(grid.status(1), Some(CellStatus::Wall));

        // dragging over an existing wall removes it
        assert_eq!(controller.pointer_enter(&mut grid, 4), Outcome::WallsChanged);
        assert_eq!(grid.status(4), Some(CellStatus::Empty));

        // the same cell again does nothing
        assert_eq!(controller.pointer_enter(&mut grid, 4), Outcome::Unchanged);

        // markers are skipped entirely
        assert_eq!(controller.pointer_enter(&mut grid, 8), Outcome::Unchanged);
        assert_eq!(grid.status(8), Some(CellStatus::Empty));
        assert_eq!(grid.end(), 8);

        controller.pointer_up();
        assert_eq!(controller.mode(), DragMode::None);
        assert_eq!(controller.pointer_enter(&mut grid, 2), Outcome::Unchanged);
        assert_eq!(grid.status(2), Some(CellStatus::Empty));
    }

    #[test]
    fn test_drag_onto_wall_and_back_restores_it() {
        let mut grid = walled_grid();
        let mut controller = Controller::new();

        controller.pointer_down(&mut grid, 0);
        assert_eq!(controller.mode(), DragMode::DraggingStart);

        assert_eq!(controller.pointer_enter(&mut grid, 1), Outcome::MarkerMoved);
        assert_eq!(controller.pointer_enter(&mut grid, 4), Outcome::MarkerMoved);
        assert_eq!(grid.start(), 4);
        assert_eq!(grid.status(4), Some(CellStatus::Empty));
        assert_eq!(controller.displaced_walls(), &[4]);

        controller.pointer_enter(&mut grid, 1);
        controller.pointer_enter(&mut grid, 0);
        controller.pointer_up();

        assert_eq!(grid.start(), 0);
        assert_eq!(grid.status(4), Some(CellStatus::Wall));
        assert!(controller.displaced_walls().is_empty());
    }

    #[test]
    fn test_markers_never_coincide() {
        let mut grid = walled_grid();
        let mut controller = Controller::new();

        controller.pointer_down(&mut grid, 8);
        assert_eq!(controller.mode(), DragMode::DraggingEnd);
        assert_eq!(controller.pointer_enter(&mut grid, 0), Outcome::Unchanged);
        assert_eq!(grid.end(), 8);
        assert_eq!(grid.start(), 0);

        let path = [7, 6, 3, 0, 1, 2, 5, 4, 3];
        for index in path {
            controller.pointer_enter(&mut grid, index);
            assert_ne!(grid.start(), grid.end());
            assert!(!grid.status(grid.start()).unwrap().is_wall());
            assert!(!grid.status(grid.end()).unwrap().is_wall());
        }
        assert_eq!(grid.end(), 3);
        // the wall at 4 was passed over and put back
        assert_eq!(grid.status(4), Some(CellStatus::Wall));
    }

    #[test]
    fn test_marker_drag_keeps_walls_it_passes() {
        let mut grid = Grid::new(1, 5, 0, 4).unwrap();
        grid.set_cell_status(1, CellStatus::Wall);
        grid.set_cell_status(2, CellStatus::Wall);
        let mut controller = Controller::new();

        controller.pointer_down(&mut grid, 0);
        controller.pointer_enter(&mut grid, 1);
        controller.pointer_enter(&mut grid, 2);
        controller.pointer_enter(&mut grid, 3);
        controller.pointer_up();

        assert_eq!(grid.start(), 3);
        assert_eq!(grid.status(1), Some(CellStatus::Wall));
        assert_eq!(grid.status(2), Some(CellStatus::Wall));
        assert!(controller.displaced_walls().is_empty());
    }

    #[test]
    fn test_wall_stays_displaced_while_marker_sits_on_it() {
        let mut grid = walled_grid();
        let mut controller = Controller::new();

        controller.pointer_down(&mut grid, 0);
        controller.pointer_enter(&mut grid, 4);
        controller.pointer_up();

        assert_eq!(grid.start(), 4);
        assert_eq!(controller.displaced_walls(), &[4]);

        // a later drag picks the marker up again and restores the wall
        controller.pointer_down(&mut grid, 4);
        controller.pointer_enter(&mut grid, 5);
        assert_eq!(grid.status(4), Some(CellStatus::Wall));
        assert!(controller.displaced_walls().is_empty());
    }
}
