use egui::{Pos2, Rect, Vec2};

/// Maps between screen positions and grid cells
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridView {
    origin: Pos2,
    node_size: f32,
    rows: usize,
    columns: usize,
}

impl GridView {
    pub fn new(origin: Pos2, node_size: f32, rows: usize, columns: usize) -> Self {
        Self {
            origin,
            node_size,
            rows,
            columns,
        }
    }

    /// Number of rows and columns that fit into the given size, at least two of each
    pub fn fit(available: Vec2, node_size: f32) -> (usize, usize) {
        let rows = (available.y / node_size).floor().max(2.0) as usize;
        let columns = (available.x / node_size).floor().max(2.0) as usize;
        (rows, columns)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(
            self.columns as f32 * self.node_size,
            self.rows as f32 * self.node_size,
        )
    }

    /// Converts a screen position into the index of the cell under it
    pub fn cell_at(&self, pos: Pos2) -> Option<usize> {
        let (x, y) = (pos.x - self.origin.x, pos.y - self.origin.y);
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (col, row) = (
            (x / self.node_size) as usize,
            (y / self.node_size) as usize,
        );
        if row < self.rows && col < self.columns {
            Some(row * self.columns + col)
        } else {
            None
        }
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        let (row, col) = (index / self.columns, index % self.columns);
        Rect::from_min_size(
            Pos2::new(
                self.origin.x + col as f32 * self.node_size,
                self.origin.y + row as f32 * self.node_size,
            ),
            Vec2::splat(self.node_size),
        )
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}
