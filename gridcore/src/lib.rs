pub mod animation;
pub mod api;
pub mod config;
pub mod grid;
pub mod interaction;
pub mod session;

pub use animation::{Delays, Frame, Playback, Timeline};
pub use api::{Algorithm, ApiError, MazeRequest, MazeResponse, RunRequest, RunResponse};
pub use config::{Config, Speed};
pub use grid::{CellStatus, Grid, GridError, Mutation, Point};
pub use interaction::{Controller, DragMode, Outcome};
pub use session::{Command, RunStats, Session};
