//! The state of one visualizer window: grid, markers, the selected algorithm, and whatever
//! animation is currently playing.
//!
//! The session never talks to the network. Starting a run hands back a [`Command`] for the host
//! to execute, and the host reports the reply through [`Session::finish_run`] or
//! [`Session::finish_maze`]. Time is passed in as milliseconds on the host's clock.

use log::{debug, error, info, warn};
use rand::Rng;

use crate::animation::{Delays, Frame, Playback, Timeline};
use crate::api::{Algorithm, ApiError, MazeRequest, MazeResponse, RunRequest, RunResponse};
use crate::config::{Config, Speed};
use crate::grid::{Grid, GridError};
use crate::interaction::{Controller, DragMode, Outcome};

/// Remote work the host has to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RunAlgorithm {
        algorithm: Algorithm,
        request: RunRequest,
    },
    GenerateMaze(MazeRequest),
}

/// Numbers shown after a search has been played back
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub algorithm: Algorithm,
    pub visited: usize,
    pub non_walls: usize,
    pub path_length: usize,
}

impl RunStats {
    pub fn visited_percentage(&self) -> f64 {
        if self.non_walls == 0 {
            return 0.0;
        }
        self.visited as f64 / self.non_walls as f64 * 100.0
    }
}

#[derive(Debug)]
struct PendingRun {
    algorithm: Algorithm,
    non_walls: usize,
}

pub struct Session {
    config: Config,
    grid: Grid,
    controller: Controller,
    algorithm: Algorithm,
    speed: Speed,

    busy: bool,
    is_played: bool,
    pending_run: Option<PendingRun>,
    playback: Option<Playback>,

    stats: Option<RunStats>,
    last_error: Option<String>,
}

impl Session {
    /// Creates an empty grid with the markers on random cells
    pub fn new<R: Rng>(
        config: Config,
        rows: usize,
        columns: usize,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        let grid = Grid::with_random_markers(rows, columns, rng)?;
        Ok(Self::from_grid(config, grid))
    }

    pub fn from_grid(config: Config, grid: Grid) -> Self {
        Self {
            config,
            grid,
            controller: Controller::new(),
            algorithm: Algorithm::default(),
            speed: Speed::default(),
            busy: false,
            is_played: false,
            pending_run: None,
            playback: None,
            stats: None,
            last_error: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_played(&self) -> bool {
        self.is_played
    }

    pub fn drag_mode(&self) -> DragMode {
        self.controller.mode()
    }

    pub fn stats(&self) -> Option<&RunStats> {
        self.stats.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Clock reading at which the running animation needs the next tick
    pub fn next_due_ms(&self) -> Option<u64> {
        self.playback.as_ref().and_then(Playback::next_due_ms)
    }

    pub fn pointer_down(&mut self, index: usize) -> Option<Command> {
        if self.busy {
            return None;
        }
        let outcome = self.controller.pointer_down(&mut self.grid, index);
        self.after_interaction(outcome)
    }

    pub fn pointer_enter(&mut self, index: usize) -> Option<Command> {
        if self.busy {
            return None;
        }
        let outcome = self.controller.pointer_enter(&mut self.grid, index);
        self.after_interaction(outcome)
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    fn after_interaction(&mut self, outcome: Outcome) -> Option<Command> {
        // moving a marker while results are on screen replays the same search
        if outcome == Outcome::MarkerMoved && self.is_played {
            debug!("marker moved after a run, running {} again", self.algorithm);
            return self.play();
        }
        None
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        if self.busy || algorithm == self.algorithm {
            return;
        }
        self.algorithm = algorithm;
        self.grid.clear_overlays();
        self.is_played = false;
    }

    pub fn cycle_algorithm(&mut self) {
        self.set_algorithm(self.algorithm.next());
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    pub fn cycle_speed(&mut self) {
        self.speed = self.speed.next();
    }

    /// Empties the whole grid, keeping the markers in place
    pub fn clear(&mut self) {
        if self.busy {
            warn!("ignoring clear while an animation is running");
            return;
        }
        self.grid.clear();
        self.controller.reset();
        self.is_played = false;
        self.stats = None;
    }

    /// Starts a search with the selected algorithm. Returns `None` while another request or
    /// animation is in flight.
    pub fn play(&mut self) -> Option<Command> {
        if self.busy {
            warn!("ignoring run request while busy");
            return None;
        }
        self.grid.clear_overlays();
        self.is_played = true;
        self.busy = true;
        self.last_error = None;
        self.pending_run = Some(PendingRun {
            algorithm: self.algorithm,
            non_walls: self.grid.non_wall_count(),
        });

        debug!("requesting {} run", self.algorithm);
        Some(Command::RunAlgorithm {
            algorithm: self.algorithm,
            request: RunRequest::from_grid(&self.grid),
        })
    }

    pub fn generate_maze(&mut self) -> Option<Command> {
        if self.busy {
            warn!("ignoring maze request while busy");
            return None;
        }
        self.busy = true;
        self.last_error = None;

        debug!("requesting maze");
        Some(Command::GenerateMaze(MazeRequest::from_grid(&self.grid)))
    }

    pub fn finish_run(&mut self, now_ms: u64, result: Result<RunResponse, ApiError>) {
        let pending = self.pending_run.take();
        let result = result.and_then(|response| {
            response.validate(self.grid.len())?;
            Ok(response)
        });

        match result {
            Ok(response) => {
                let algorithm = pending.as_ref().map_or(self.algorithm, |p| p.algorithm);
                let non_walls = pending
                    .as_ref()
                    .map_or_else(|| self.grid.non_wall_count(), |p| p.non_walls);
                info!(
                    "{} visited {} cells, path of {} cells",
                    algorithm,
                    response.visited_order.len(),
                    response.path_indexes.len()
                );
                self.stats = Some(RunStats {
                    algorithm,
                    visited: response.visited_order.len(),
                    non_walls,
                    path_length: response.path_indexes.len(),
                });

                let timeline = Timeline::search(
                    &response.visited_order,
                    &response.path_indexes,
                    Delays::new(&self.config, self.speed),
                );
                self.start_playback(timeline, now_ms);
            }
            Err(e) => self.fail("pathfinding", e),
        }
    }

    pub fn finish_maze(&mut self, now_ms: u64, result: Result<MazeResponse, ApiError>) {
        let result = result.and_then(|response| {
            response.validate(self.grid.len())?;
            Timeline::maze_reveal(&self.grid, &response.grid, self.config.maze_reveal_delay_ms)
                .map_err(|e| ApiError::Malformed(e.to_string()))
        });

        match result {
            Ok(timeline) => {
                self.controller.reset();
                self.is_played = false;
                self.stats = None;
                self.start_playback(timeline, now_ms);
            }
            Err(e) => self.fail("maze generation", e),
        }
    }

    fn start_playback(&mut self, timeline: Timeline, now_ms: u64) {
        self.playback = Some(Playback::new(timeline, now_ms));
        // the first frame is due right away
        self.tick(now_ms);
    }

    fn fail(&mut self, what: &str, e: ApiError) {
        error!("{} failed: {}", what, e);
        self.last_error = Some(format!("{} failed: {}", what, e));
        self.busy = false;
    }

    /// Applies every frame that is due. Returns true if the grid changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let Some(playback) = self.playback.as_mut() else {
            return false;
        };

        let frames = playback.advance(now_ms);
        let changed = !frames.is_empty();
        let completed = apply_frames(&mut self.grid, frames);

        if completed || playback.is_finished() {
            self.playback = None;
            self.busy = false;
            debug!("animation finished");
        }
        changed
    }

    /// Skips the rest of the running animation
    pub fn finish_animation(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            apply_frames(&mut self.grid, playback.finish());
            self.busy = false;
        }
    }
}

/// Returns true if one of the frames completes the animation
fn apply_frames(grid: &mut Grid, frames: &[Frame]) -> bool {
    let mut completed = false;
    for frame in frames {
        for mutation in &frame.mutations {
            if let Err(e) = grid.apply_mutation(mutation) {
                // indices are validated before playback starts
                error!("dropping animation write: {}", e);
            }
        }
        completed |= frame.completes;
    }
    completed
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::CellStatus;

    fn session_10x10() -> Session {
        let grid = Grid::new(10, 10, 0, 99).unwrap();
        Session::from_grid(Config::default(), grid)
    }

    fn scenario_response() -> RunResponse {
        RunResponse {
            visited_order: (0..=50).collect(),
            path_indexes: (0..10).map(|r| r * 10).chain([99]).collect(),
        }
    }

    #[test]
    fn test_run_scenario() {
        let mut session = session_10x10();

        let command = session.play().unwrap();
        let Command::RunAlgorithm { algorithm, request } = command else {
            panic!("expected a run command");
        };
        assert_eq!(algorithm, Algorithm::Dijkstra);
        assert_eq!(request.grid.len(), 100);
        assert_eq!((request.start, request.end), (0, 99));
        assert!(session.is_busy());

        // while busy nothing else is accepted
        assert!(session.play().is_none());
        assert!(session.generate_maze().is_none());
        assert!(session.pointer_down(5).is_none());
        assert_eq!(session.grid().status(5), Some(CellStatus::Empty));

        session.finish_run(1_000, Ok(scenario_response()));
        assert!(session.is_busy());
        assert_eq!(session.grid().status(0), Some(CellStatus::Active));

        let d = Config::default().visited_delay_ms;
        session.tick(1_000 + 50 * d);
        assert_eq!(session.grid().status(50), Some(CellStatus::Active));
        assert_eq!(session.grid().status(49), Some(CellStatus::Visited));

        let mut now = 1_000;
        while session.is_busy() {
            now += 7;
            session.tick(now);
            assert!(now < 1_000_000, "animation never completed");
        }

        let grid = session.grid();
        for index in [0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 99] {
            assert_eq!(grid.status(index), Some(CellStatus::Path));
        }
        assert_eq!(grid.status(1), Some(CellStatus::Visited));
        assert_eq!(grid.status(49), Some(CellStatus::Visited));
        assert_eq!(grid.status(51), Some(CellStatus::Empty));
        assert!(session.next_due_ms().is_none());

        let stats = session.stats().unwrap();
        assert_eq!(stats.visited, 51);
        assert_eq!(stats.non_walls, 100);
        assert!((stats.visited_percentage() - 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_path_releases_after_settle() {
        let mut session = session_10x10();
        session.play();
        session.finish_run(
            0,
            Ok(RunResponse {
                visited_order: vec![0, 1, 2],
                path_indexes: vec![],
            }),
        );

        let d = Config::default().visited_delay_ms;
        session.tick(3 * d + 99);
        assert!(session.is_busy());
        session.tick(3 * d + 100);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_failed_run_releases_busy() {
        let mut session = session_10x10();
        session.play();
        session.finish_run(
            0,
            Err(ApiError::Status {
                status: 500,
                detail: "boom".to_owned(),
            }),
        );

        assert!(!session.is_busy());
        assert!(session.last_error().unwrap().contains("boom"));

        // the grid is still usable
        assert!(session.play().is_some());
    }

    #[test]
    fn test_out_of_range_response_is_rejected() {
        let mut session = session_10x10();
        session.play();
        session.finish_run(
            0,
            Ok(RunResponse {
                visited_order: vec![0, 100],
                path_indexes: vec![],
            }),
        );

        assert!(!session.is_busy());
        assert!(session.last_error().unwrap().contains("malformed"));
        assert!(session.grid().statuses().iter().all(|c| *c == CellStatus::Empty));
    }

    #[test]
    fn test_clear_resets_everything_but_markers() {
        let mut session = session_10x10();
        session.pointer_down(5);
        session.pointer_enter(6);
        session.pointer_up();
        session.play();
        session.finish_run(0, Ok(scenario_response()));
        session.finish_animation();
        assert!(session.is_played());

        session.clear();
        assert!(session.grid().statuses().iter().all(|c| *c == CellStatus::Empty));
        assert_eq!((session.grid().start(), session.grid().end()), (0, 99));
        assert!(!session.is_played());
    }

    #[test]
    fn test_changing_algorithm_clears_overlays() {
        let mut session = session_10x10();
        session.pointer_down(55);
        session.pointer_up();
        session.play();
        session.finish_run(0, Ok(scenario_response()));
        session.finish_animation();

        session.cycle_algorithm();
        assert_eq!(session.algorithm(), Algorithm::AStar);
        assert!(!session.is_played());
        assert_eq!(session.grid().status(55), Some(CellStatus::Wall));
        assert_eq!(session.grid().non_wall_count(), 99);
        assert!(session
            .grid()
            .statuses()
            .iter()
            .all(|c| matches!(c, CellStatus::Empty | CellStatus::Wall)));
    }

    #[test]
    fn test_marker_move_after_run_replays() {
        let mut session = session_10x10();
        assert!(session.pointer_down(0).is_none());
        // not played yet, moving the marker is just a move
        assert!(session.pointer_enter(1).is_none());
        session.pointer_up();

        session.cycle_algorithm();
        session.play();
        session.finish_run(0, Ok(scenario_response()));
        session.finish_animation();

        session.pointer_down(1);
        let command = session.pointer_enter(2);
        assert!(matches!(
            command,
            Some(Command::RunAlgorithm {
                algorithm: Algorithm::AStar,
                request: RunRequest { start: 2, .. }
            })
        ));
        assert!(session.is_busy());
        // overlays of the previous run are gone before the request is sent
        assert_eq!(session.grid().status(10), Some(CellStatus::Empty));
    }

    #[test]
    fn test_maze_reveal() {
        let mut session = session_10x10();
        let Some(Command::GenerateMaze(request)) = session.generate_maze() else {
            panic!("expected a maze command");
        };
        assert_eq!((request.rows, request.cols), (10, 10));

        let mut maze = vec![CellStatus::Wall; 100];
        for index in (0..100).step_by(3) {
            maze[index] = CellStatus::Empty;
        }
        maze[99] = CellStatus::Empty;

        session.finish_maze(500, Ok(MazeResponse { grid: maze.clone() }));
        // everything but the markers is a wall until the rows arrive
        assert_eq!(session.grid().status(1), Some(CellStatus::Wall));
        assert!(session.is_busy());

        let delay = Config::default().maze_reveal_delay_ms;
        session.tick(500 + 10 * delay);
        assert!(!session.is_busy());
        assert_eq!(session.grid().statuses(), maze.as_slice());
        assert!(!session.is_played());
    }

    #[test]
    fn test_maze_with_wrong_size_fails() {
        let mut session = session_10x10();
        session.generate_maze();
        session.finish_maze(
            0,
            Ok(MazeResponse {
                grid: vec![CellStatus::Wall; 10],
            }),
        );
        assert!(!session.is_busy());
        assert!(session.last_error().is_some());
    }

    #[test]
    fn test_speed_is_used_for_next_run() {
        let mut session = session_10x10();
        session.cycle_speed();
        assert_eq!(session.speed(), Speed::Normal);

        session.play();
        session.finish_run(
            0,
            Ok(RunResponse {
                visited_order: vec![1, 2],
                path_indexes: vec![],
            }),
        );
        let visited_delay = Config::default().visited_delay_ms + Speed::Normal.modifier_ms();
        assert_eq!(session.next_due_ms(), Some(visited_delay));
    }
}
