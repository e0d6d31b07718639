//! Request and response shapes of the pathfinding backend, plus decoding of its replies.
//!
//! The transport lives in the frontend. Everything here is plain data so it can be checked
//! without a network.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::{CellStatus, Grid};

pub const MAZE_ENDPOINT: &str = "/api/maze";
pub const HEALTH_ENDPOINT: &str = "/api/health";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP error! status: {status}, message: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The search algorithms offered by the backend, in the order the user cycles through them
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
    Dfs,
    Bfs,
    GreedyBfs,
    BellmanFord,
    BiSwarm,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Dijkstra,
        Algorithm::AStar,
        Algorithm::Dfs,
        Algorithm::Bfs,
        Algorithm::GreedyBfs,
        Algorithm::BellmanFord,
        Algorithm::BiSwarm,
    ];

    pub fn endpoint(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "/api/dijkstra",
            Algorithm::AStar => "/api/astar",
            Algorithm::Dfs => "/api/dfs",
            Algorithm::Bfs => "/api/bfs",
            Algorithm::GreedyBfs => "/api/greedy-bfs",
            Algorithm::BellmanFord => "/api/bellman-ford",
            Algorithm::BiSwarm => "/api/bi-swarm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "Dijkstra",
            Algorithm::AStar => "A Star",
            Algorithm::Dfs => "DFS",
            Algorithm::Bfs => "BFS",
            Algorithm::GreedyBfs => "Greedy BFS",
            Algorithm::BellmanFord => "Bellman Ford",
            Algorithm::BiSwarm => "Bi Swarm",
        }
    }

    /// Asymptotic complexity shown next to the run statistics
    pub fn complexity(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "O((V+E)logV)",
            Algorithm::AStar => "O(E)",
            Algorithm::Dfs => "O(V+E)",
            Algorithm::Bfs => "O(V+E)",
            Algorithm::GreedyBfs => "O(E)",
            Algorithm::BellmanFord => "O(VE)",
            Algorithm::BiSwarm => "O(VlogV)",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|a| *a == self)
            .unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace([' ', '_'], "-");
        Self::ALL
            .into_iter()
            .find(|a| {
                a.label().to_ascii_lowercase().replace(' ', "-") == wanted
                    || a.endpoint().trim_start_matches("/api/") == wanted
            })
            .ok_or_else(|| anyhow::anyhow!("Invalid algorithm: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub grid: Vec<CellStatus>,
    pub start: usize,
    pub end: usize,
    pub rows: usize,
    pub cols: usize,
}

impl RunRequest {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            grid: grid.statuses().to_vec(),
            start: grid.start(),
            end: grid.end(),
            rows: grid.rows(),
            cols: grid.columns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub visited_order: Vec<usize>,
    pub path_indexes: Vec<usize>,
}

impl RunResponse {
    /// Every index has to address a cell of the grid the request was made for
    pub fn validate(&self, len: usize) -> Result<(), ApiError> {
        let out_of_range = self
            .visited_order
            .iter()
            .chain(&self.path_indexes)
            .find(|index| **index >= len);
        match out_of_range {
            Some(index) => Err(ApiError::Malformed(format!(
                "cell index {} is outside a grid of {} cells",
                index, len
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeRequest {
    pub start: usize,
    pub end: usize,
    pub rows: usize,
    pub cols: usize,
}

impl MazeRequest {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            start: grid.start(),
            end: grid.end(),
            rows: grid.rows(),
            cols: grid.columns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeResponse {
    pub grid: Vec<CellStatus>,
}

impl MazeResponse {
    pub fn validate(&self, len: usize) -> Result<(), ApiError> {
        if self.grid.len() != len {
            return Err(ApiError::Malformed(format!(
                "maze has {} cells, expected {}",
                self.grid.len(),
                len
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Turns a raw HTTP reply into the expected payload
pub fn decode_response<T: for<'de> Deserialize<'de>>(
    status: u16,
    body: &[u8],
) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| "Unknown error".to_owned());
        return Err(ApiError::Status { status, detail });
    }

    serde_json::from_slice(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

pub fn encode_request<T: Serialize>(request: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(request).map_err(|e| ApiError::Transport(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_algorithm_order_and_cycle() {
        let mut algorithm = Algorithm::Dijkstra;
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(algorithm.endpoint());
            algorithm = algorithm.next();
        }
        assert_eq!(algorithm, Algorithm::Dijkstra);
        assert_eq!(
            seen,
            vec![
                "/api/dijkstra",
                "/api/astar",
                "/api/dfs",
                "/api/bfs",
                "/api/greedy-bfs",
                "/api/bellman-ford",
                "/api/bi-swarm",
            ]
        );
        assert_eq!(Algorithm::from_index(12), Algorithm::GreedyBfs);
        assert_eq!(Algorithm::BellmanFord.complexity(), "O(VE)");
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("A Star".parse::<Algorithm>().unwrap(), Algorithm::AStar);
        assert_eq!("greedy-bfs".parse::<Algorithm>().unwrap(), Algorithm::GreedyBfs);
        assert_eq!("bellman_ford".parse::<Algorithm>().unwrap(), Algorithm::BellmanFord);
        assert!("quicksort".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_request_shape() {
        let mut grid = Grid::new(2, 2, 0, 3).unwrap();
        grid.set_cell_status(1, CellStatus::Wall);

        let body = encode_request(&RunRequest::from_grid(&grid)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"grid": [0, 1, 0, 0], "start": 0, "end": 3, "rows": 2, "cols": 2})
        );

        let body = encode_request(&MazeRequest::from_grid(&grid)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"start": 0, "end": 3, "rows": 2, "cols": 2})
        );
    }

    #[test]
    fn test_decode_success_ignores_extra_fields() {
        let body = br#"{"visited_order":[0,1,2],"path_indexes":[0,2],"grid":[0,0,0,0]}"#;
        let response: RunResponse = decode_response(200, body).unwrap();
        assert_eq!(response.visited_order, vec![0, 1, 2]);
        assert_eq!(response.path_indexes, vec![0, 2]);
    }

    #[test]
    fn test_decode_missing_field_is_malformed() {
        let body = br#"{"visited_order":[0,1,2]}"#;
        let result: Result<RunResponse, _> = decode_response(200, body);
        assert!(matches!(result, Err(ApiError::Malformed(_))));

        let result: Result<MazeResponse, _> = decode_response(200, br#"{"grid":[0,9]}"#);
        assert!(matches!(result, Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_decode_error_status() {
        let result: Result<RunResponse, _> =
            decode_response(500, br#"{"detail":"start out of bounds"}"#);
        assert_eq!(
            result,
            Err(ApiError::Status {
                status: 500,
                detail: "start out of bounds".to_owned()
            })
        );

        let result: Result<RunResponse, _> = decode_response(502, b"<html>bad gateway</html>");
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error! status: 502, message: Unknown error"
        );
    }

    #[test]
    fn test_validate_indices() {
        let response = RunResponse {
            visited_order: vec![0, 1, 4],
            path_indexes: vec![],
        };
        assert!(response.validate(5).is_ok());
        assert!(matches!(response.validate(4), Err(ApiError::Malformed(_))));

        let maze = MazeResponse {
            grid: vec![CellStatus::Wall; 3],
        };
        assert!(maze.validate(3).is_ok());
        assert!(maze.validate(4).is_err());
    }
}
