//! HTTP transport for the commands issued by the session.
//!
//! `ehttp` runs the request on a background thread (native) or through `fetch` (web) and calls
//! back when done. The reply is sent over a channel and picked up at the start of the next frame,
//! so the session is only ever touched from the UI thread.

use std::sync::mpsc::{channel, Receiver, Sender};

use gridcore::api::{decode_response, encode_request, HealthResponse, HEALTH_ENDPOINT, MAZE_ENDPOINT};
use gridcore::{ApiError, Command, Config, MazeResponse, RunResponse};
use log::{debug, error};
use serde::Serialize;

#[derive(Debug)]
pub enum Reply {
    Run(Result<RunResponse, ApiError>),
    Maze(Result<MazeResponse, ApiError>),
    Health(Result<HealthResponse, ApiError>),
}

pub struct Remote {
    config: Config,
    ctx: egui::Context,
    sender: Sender<Reply>,
    receiver: Receiver<Reply>,
}

impl Remote {
    pub fn new(config: Config, ctx: egui::Context) -> Self {
        let (sender, receiver) = channel();
        Self {
            config,
            ctx,
            sender,
            receiver,
        }
    }

    pub fn execute(&self, command: Command) {
        match command {
            Command::RunAlgorithm { algorithm, request } => {
                self.post(algorithm.endpoint(), &request, Reply::Run);
            }
            Command::GenerateMaze(request) => {
                self.post(MAZE_ENDPOINT, &request, Reply::Maze);
            }
        }
    }

    pub fn check_health(&self) {
        let request = ehttp::Request::get(self.config.url(HEALTH_ENDPOINT));
        self.send(request, Reply::Health);
    }

    /// Returns the next reply that has arrived, if any
    pub fn poll(&self) -> Option<Reply> {
        self.receiver.try_recv().ok()
    }

    fn post<B, T>(&self, endpoint: &str, body: &B, wrap: fn(Result<T, ApiError>) -> Reply)
    where
        B: Serialize,
        T: for<'de> serde::Deserialize<'de> + 'static,
    {
        let url = self.config.url(endpoint);
        let body = match encode_request(body) {
            Ok(body) => body,
            Err(e) => {
                // still report back so the session releases its busy flag
                let _ = self.sender.send(wrap(Err(e)));
                return;
            }
        };

        debug!("POST {} ({} bytes)", url, body.len());
        let request = ehttp::Request {
            headers: ehttp::Headers::new(&[
                ("Accept", "application/json"),
                ("Content-Type", "application/json"),
            ]),
            ..ehttp::Request::post(url, body)
        };
        self.send(request, wrap);
    }

    fn send<T>(&self, request: ehttp::Request, wrap: fn(Result<T, ApiError>) -> Reply)
    where
        T: for<'de> serde::Deserialize<'de> + 'static,
    {
        let sender = self.sender.clone();
        let ctx = self.ctx.clone();
        let url = request.url.clone();

        ehttp::fetch(request, move |result: ehttp::Result<ehttp::Response>| {
            let decoded = match result {
                Ok(response) => decode_response(response.status, &response.bytes),
                Err(e) => Err(ApiError::Transport(e)),
            };
            if let Err(e) = &decoded {
                error!("request to {} failed: {}", url, e);
            }

            if sender.send(wrap(decoded)).is_err() {
                debug!("reply from {} arrived after shutdown", url);
            }
            ctx.request_repaint();
        });
    }
}
