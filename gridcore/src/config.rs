use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable holding the backend base url
pub const API_URL_ENV: &str = "PATHVIZ_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Edge length of one cell in logical pixels
pub const NODE_SIZE: f32 = 25.0;

pub const VISITED_DELAY_MS: u64 = 10;
pub const PATH_DELAY_MS: u64 = 40;
pub const MAZE_REVEAL_DELAY_MS: u64 = 30;
/// How long the busy flag is held after the visited phase when there is no path to show
pub const NO_PATH_SETTLE_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub node_size: f32,
    pub visited_delay_ms: u64,
    pub path_delay_ms: u64,
    pub maze_reveal_delay_ms: u64,
    pub no_path_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            node_size: NODE_SIZE,
            visited_delay_ms: VISITED_DELAY_MS,
            path_delay_ms: PATH_DELAY_MS,
            maze_reveal_delay_ms: MAZE_REVEAL_DELAY_MS,
            no_path_settle_ms: NO_PATH_SETTLE_MS,
        }
    }
}

impl Config {
    /// Resolves the backend url from the environment. On the web there is no process environment,
    /// so the value is baked in at compile time instead.
    pub fn from_env() -> Self {
        let configured = if cfg!(target_arch = "wasm32") {
            option_env!("PATHVIZ_API_URL").map(str::to_owned)
        } else {
            std::env::var(API_URL_ENV).ok()
        };

        Self::with_base_url(configured.as_deref())
    }

    pub fn with_base_url(base_url: Option<&str>) -> Self {
        let base_url = match base_url.map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_owned(),
            _ => DEFAULT_API_URL.to_owned(),
        };
        log::debug!("using backend at {}", base_url);

        Self {
            base_url,
            ..Default::default()
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Animation speed, added on top of the base delays
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Speed {
    #[default]
    Fast,
    Normal,
    Slow,
}

impl Speed {
    pub fn modifier_ms(self) -> u64 {
        match self {
            Speed::Fast => 0,
            Speed::Normal => 20,
            Speed::Slow => 60,
        }
    }

    /// fast -> normal -> slow -> fast
    pub fn next(self) -> Self {
        match self {
            Speed::Fast => Speed::Normal,
            Speed::Normal => Speed::Slow,
            Speed::Slow => Speed::Fast,
        }
    }
}

impl Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Speed::Fast => "FAST",
                Speed::Normal => "NORMAL",
                Speed::Slow => "SLOW",
            }
        )
    }
}

impl FromStr for Speed {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Speed::Fast),
            "normal" => Ok(Speed::Normal),
            "slow" => Ok(Speed::Slow),
            _ => Err(anyhow::anyhow!("Invalid speed: {}", s)),
        }
    }
}
