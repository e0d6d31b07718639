use std::fmt::Display;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Status code of a single grid cell, as exchanged with the backend
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CellStatus {
    #[default]
    Empty = 0,
    Wall = 1,
    Visited = 2,
    Path = 3,
    // the cell currently being processed by the animation
    Active = 4,
}

impl CellStatus {
    pub fn is_wall(self) -> bool {
        self == CellStatus::Wall
    }

    /// Wall becomes empty, everything else becomes a wall
    pub fn toggled(self) -> Self {
        match self {
            CellStatus::Wall => CellStatus::Empty,
            _ => CellStatus::Wall,
        }
    }
}

impl TryFrom<u8> for CellStatus {
    type Error = GridError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CellStatus::Empty),
            1 => Ok(CellStatus::Wall),
            2 => Ok(CellStatus::Visited),
            3 => Ok(CellStatus::Path),
            4 => Ok(CellStatus::Active),
            other => Err(GridError::InvalidStatus(other)),
        }
    }
}

impl From<CellStatus> for u8 {
    fn from(status: CellStatus) -> Self {
        status as u8
    }
}

impl Display for CellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CellStatus::Empty => " ",
                CellStatus::Wall => "X",
                CellStatus::Visited => ".",
                CellStatus::Path => "*",
                CellStatus::Active => "@",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("cell index {index} is outside a grid of {len} cells")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("expected {expected} cells but got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("unknown cell status code {0}")]
    InvalidStatus(u8),
    #[error("start and end markers cannot share cell {0}")]
    MarkersCoincide(usize),
    #[error("a grid needs at least two cells, got {rows}x{columns}")]
    TooSmall { rows: usize, columns: usize },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

/// One write performed by the animation timeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Set { index: usize, status: CellStatus },
    CopyRow { row: usize, cells: Vec<CellStatus> },
    Replace(Vec<CellStatus>),
}

/// A rectangular grid of cells stored row major in a single vec, together with the start and end
/// markers.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<CellStatus>,
    start: usize,
    end: usize,
    // bumped on every mutation so the view knows when to redraw
    version: u64,
}

impl Grid {
    pub fn new(rows: usize, columns: usize, start: usize, end: usize) -> Result<Self, GridError> {
        let len = rows * columns;
        if len < 2 {
            return Err(GridError::TooSmall { rows, columns });
        }
        for index in [start, end] {
            if index >= len {
                return Err(GridError::IndexOutOfRange { index, len });
            }
        }
        if start == end {
            return Err(GridError::MarkersCoincide(start));
        }

        Ok(Self {
            rows,
            columns,
            cells: vec![CellStatus::Empty; len],
            start,
            end,
            version: 0,
        })
    }

    /// Creates an empty grid with the markers placed on two distinct random cells
    pub fn with_random_markers<R: Rng>(
        rows: usize,
        columns: usize,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        let len = rows * columns;
        if len < 2 {
            return Err(GridError::TooSmall { rows, columns });
        }
        let start = rng.gen_range(0..len);
        // draw from the remaining cells and skip over start
        let mut end = rng.gen_range(0..len - 1);
        if end >= start {
            end += 1;
        }
        Self::new(rows, columns, start, end)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_valid(&self, index: usize) -> bool {
        index < self.cells.len()
    }

    pub fn is_marker(&self, index: usize) -> bool {
        index == self.start || index == self.end
    }

    pub fn status(&self, index: usize) -> Option<CellStatus> {
        self.cells.get(index).copied()
    }

    pub fn statuses(&self) -> &[CellStatus] {
        &self.cells
    }

    pub fn index_of(&self, point: Point) -> Option<usize> {
        if point.row < self.rows && point.col < self.columns {
            Some(point.row * self.columns + point.col)
        } else {
            None
        }
    }

    pub fn point_of(&self, index: usize) -> Option<Point> {
        if self.is_valid(index) {
            Some(Point {
                row: index / self.columns,
                col: index % self.columns,
            })
        } else {
            None
        }
    }

    pub fn non_wall_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_wall()).count()
    }

    /// Sets the status of a single cell. Marker cells and invalid indices are left untouched.
    pub fn set_cell_status(&mut self, index: usize, status: CellStatus) -> bool {
        if self.is_marker(index) || !self.is_valid(index) {
            return false;
        }
        if self.cells[index] != status {
            self.cells[index] = status;
            self.version += 1;
        }
        true
    }

    /// Sets every cell to empty, the markers stay where they are
    pub fn clear(&mut self) {
        self.cells = vec![CellStatus::Empty; self.cells.len()];
        self.version += 1;
    }

    /// Removes all animation overlays but keeps the walls
    pub fn clear_overlays(&mut self) {
        self.cells = self
            .cells
            .iter()
            .map(|c| if c.is_wall() { CellStatus::Wall } else { CellStatus::Empty })
            .collect();
        self.version += 1;
    }

    /// Replaces every cell at once. The marker cells are never allowed to be walls.
    pub fn replace(&mut self, mut cells: Vec<CellStatus>) -> Result<(), GridError> {
        if cells.len() != self.cells.len() {
            return Err(GridError::LengthMismatch {
                expected: self.cells.len(),
                actual: cells.len(),
            });
        }
        for marker in [self.start, self.end] {
            if cells[marker].is_wall() {
                cells[marker] = CellStatus::Empty;
            }
        }
        self.cells = cells;
        self.version += 1;
        Ok(())
    }

    /// Applies a write coming from the animation timeline. Overlays may land on the markers (the
    /// visited order usually contains the start) but walls never do.
    pub fn apply_mutation(&mut self, mutation: &Mutation) -> Result<(), GridError> {
        match mutation {
            Mutation::Set { index, status } => {
                let len = self.cells.len();
                let cell = self
                    .cells
                    .get_mut(*index)
                    .ok_or(GridError::IndexOutOfRange { index: *index, len })?;
                if status.is_wall() && (*index == self.start || *index == self.end) {
                    return Ok(());
                }
                *cell = *status;
            }
            Mutation::CopyRow { row, cells } => {
                if cells.len() != self.columns {
                    return Err(GridError::LengthMismatch {
                        expected: self.columns,
                        actual: cells.len(),
                    });
                }
                let offset = row * self.columns;
                if offset >= self.cells.len() {
                    return Err(GridError::IndexOutOfRange {
                        index: offset,
                        len: self.cells.len(),
                    });
                }
                for (col, status) in cells.iter().enumerate() {
                    let index = offset + col;
                    if !(status.is_wall() && self.is_marker(index)) {
                        self.cells[index] = *status;
                    }
                }
            }
            Mutation::Replace(cells) => return self.replace(cells.clone()),
        }
        self.version += 1;
        Ok(())
    }

    /// Moves a marker without touching any cells. Used by the interaction controller which does
    /// the wall bookkeeping itself.
    pub(crate) fn place_start(&mut self, index: usize) {
        self.start = index;
        self.version += 1;
    }

    pub(crate) fn place_end(&mut self, index: usize) {
        self.end = index;
        self.version += 1;
    }

    /// Writes a cell regardless of the markers, for the controller's wall bookkeeping
    pub(crate) fn write_raw(&mut self, index: usize, status: CellStatus) {
        self.cells[index] = status;
        self.version += 1;
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, row) in self.cells.chunks(self.columns).enumerate() {
            for (col, cell) in row.iter().enumerate() {
                let index = i * self.columns + col;
                if index == self.start {
                    write!(f, "S")?;
                } else if index == self.end {
                    write!(f, "E")?;
                } else {
                    write!(f, "{}", cell)?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
