//! Turns the result of a remote run into a timeline of cell writes.
//!
//! The sequencer itself never sleeps. A [`Timeline`] is a list of frames sorted by their offset
//! from the start of the animation, and a [`Playback`] hands out the frames that are due for a
//! given clock reading. The host only needs one timer: wake up at [`Playback::next_due_ms`].

use crate::config::{Config, Speed};
use crate::grid::{CellStatus, Grid, GridError, Mutation};

/// The writes to perform at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub at_ms: u64,
    pub mutations: Vec<Mutation>,
    /// Last frame of the animation, releases the busy flag
    pub completes: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Delays {
    pub visited_ms: u64,
    pub path_ms: u64,
    pub no_path_settle_ms: u64,
}

impl Delays {
    pub fn new(config: &Config, speed: Speed) -> Self {
        Self {
            visited_ms: config.visited_delay_ms + speed.modifier_ms(),
            path_ms: config.path_delay_ms + speed.modifier_ms(),
            no_path_settle_ms: config.no_path_settle_ms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    frames: Vec<Frame>,
}

impl Timeline {
    /// Reveals the visited order one cell at a time, then the path.
    pub fn search(visited_order: &[usize], path_indexes: &[usize], delays: Delays) -> Self {
        let mut frames = Vec::with_capacity(visited_order.len() + path_indexes.len() + 2);

        reveal(
            &mut frames,
            visited_order,
            0,
            delays.visited_ms,
            CellStatus::Visited,
        );

        let phase_start = visited_order.len() as u64 * delays.visited_ms;
        if path_indexes.is_empty() {
            frames.push(Frame {
                at_ms: phase_start + delays.no_path_settle_ms,
                mutations: Vec::new(),
                completes: true,
            });
        } else {
            reveal(
                &mut frames,
                path_indexes,
                phase_start,
                delays.path_ms,
                CellStatus::Path,
            );
            if let Some(last) = frames.last_mut() {
                last.completes = true;
            }
        }

        Self::from_frames(frames)
    }

    /// Fills the grid with walls and then copies the generated maze in row by row.
    pub fn maze_reveal(grid: &Grid, maze: &[CellStatus], delay_ms: u64) -> Result<Self, GridError> {
        if maze.len() != grid.len() {
            return Err(GridError::LengthMismatch {
                expected: grid.len(),
                actual: maze.len(),
            });
        }

        let columns = grid.columns();
        let rows = grid.rows();

        let mut walls = vec![CellStatus::Wall; grid.len()];
        walls[grid.start()] = CellStatus::Empty;
        walls[grid.end()] = CellStatus::Empty;

        let mut frames = Vec::with_capacity(rows + 2);
        frames.push(Frame {
            at_ms: 0,
            mutations: vec![Mutation::Replace(walls)],
            completes: false,
        });

        for (row, cells) in maze.chunks(columns).enumerate() {
            frames.push(Frame {
                at_ms: row as u64 * delay_ms,
                mutations: vec![Mutation::CopyRow {
                    row,
                    cells: cells.to_vec(),
                }],
                completes: false,
            });
        }

        frames.push(Frame {
            at_ms: rows as u64 * delay_ms,
            mutations: vec![Mutation::Replace(maze.to_vec())],
            completes: true,
        });

        Ok(Self::from_frames(frames))
    }

    fn from_frames(frames: Vec<Frame>) -> Self {
        debug_assert!(frames.windows(2).all(|w| w[0].at_ms <= w[1].at_ms));
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Offset of the last frame
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map(|f| f.at_ms).unwrap_or(0)
    }
}

/// Marks each index active in turn and settles the previous one, followed by one frame that
/// settles the last index.
fn reveal(
    frames: &mut Vec<Frame>,
    indexes: &[usize],
    phase_start: u64,
    delay_ms: u64,
    settled: CellStatus,
) {
    let mut previous: Option<usize> = None;
    for (i, &index) in indexes.iter().enumerate() {
        let mut mutations = Vec::with_capacity(2);
        if let Some(previous) = previous {
            mutations.push(Mutation::Set {
                index: previous,
                status: settled,
            });
        }
        mutations.push(Mutation::Set {
            index,
            status: CellStatus::Active,
        });
        frames.push(Frame {
            at_ms: phase_start + i as u64 * delay_ms,
            mutations,
            completes: false,
        });
        previous = Some(index);
    }

    if let Some(last) = previous {
        frames.push(Frame {
            at_ms: phase_start + indexes.len() as u64 * delay_ms,
            mutations: vec![Mutation::Set {
                index: last,
                status: settled,
            }],
            completes: false,
        });
    }
}

/// Cursor over a timeline that was started at a given clock reading
#[derive(Debug, Clone)]
pub struct Playback {
    timeline: Timeline,
    started_at_ms: u64,
    next: usize,
}

impl Playback {
    pub fn new(timeline: Timeline, started_at_ms: u64) -> Self {
        Self {
            timeline,
            started_at_ms,
            next: 0,
        }
    }

    /// Returns all frames that became due since the last call, in timeline order
    pub fn advance(&mut self, now_ms: u64) -> &[Frame] {
        let first = self.next;
        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        while let Some(frame) = self.timeline.frames.get(self.next) {
            if frame.at_ms > elapsed {
                break;
            }
            self.next += 1;
        }
        &self.timeline.frames[first..self.next]
    }

    /// Returns every remaining frame regardless of the clock
    pub fn finish(&mut self) -> &[Frame] {
        let first = self.next;
        self.next = self.timeline.frames.len();
        &self.timeline.frames[first..]
    }

    /// Absolute clock reading at which the next frame is due
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timeline
            .frames
            .get(self.next)
            .map(|f| self.started_at_ms + f.at_ms)
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.timeline.frames.len()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }
}
