use std::time::Duration;

use egui::{Color32, Sense, Stroke};
use gridcore::{Algorithm, CellStatus, Command, Config, Session, Speed};
use log::{error, info, warn};

use crate::remote::{Remote, Reply};
use crate::view::GridView;

pub struct App {
    preferences: Preferences,
    config: Config,
    remote: Remote,

    /// Created on the first frame, once we know how much room the grid has
    session: Option<Session>,
    backend: BackendStatus,
}

/// We derive Deserialize/Serialize so we can persist the user's choices on shutdown.
/// The grid itself is never persisted.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
struct Preferences {
    algorithm: Algorithm,
    speed: Speed,
    draw_grid_lines: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            speed: Speed::default(),
            draw_grid_lines: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BackendStatus {
    Unknown,
    Online(String),
    Offline(String),
}

impl App {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Note that you must enable the `persistence` feature for this to work.
        let preferences: Preferences = if let Some(storage) = cc.storage {
            eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default()
        } else {
            Default::default()
        };

        let config = Config::from_env();
        info!("using backend at {}", config.base_url);

        let remote = Remote::new(config.clone(), cc.egui_ctx.clone());
        remote.check_health();

        App {
            preferences,
            config,
            remote,
            session: None,
            backend: BackendStatus::Unknown,
        }
    }

    fn execute(&self, command: Option<Command>) {
        if let Some(command) = command {
            self.remote.execute(command);
        }
    }

    /// Hands every reply that arrived since the last frame to the session
    fn receive_replies(&mut self, now_ms: u64) {
        while let Some(reply) = self.remote.poll() {
            match reply {
                Reply::Health(Ok(health)) => self.backend = BackendStatus::Online(health.status),
                Reply::Health(Err(e)) => self.backend = BackendStatus::Offline(e.to_string()),
                Reply::Run(result) => match &mut self.session {
                    Some(session) => session.finish_run(now_ms, result),
                    None => warn!("dropping search reply without a session"),
                },
                Reply::Maze(result) => match &mut self.session {
                    Some(session) => session.finish_maze(now_ms, result),
                    None => warn!("dropping maze reply without a session"),
                },
            }
        }
    }

    fn ensure_session(&mut self, available: egui::Vec2) {
        if self.session.is_some() {
            return;
        }

        let (rows, columns) = GridView::fit(available, self.config.node_size);
        match Session::new(self.config.clone(), rows, columns, &mut rand::thread_rng()) {
            Ok(mut session) => {
                info!("created a {}x{} grid", rows, columns);
                session.set_algorithm(self.preferences.algorithm);
                session.set_speed(self.preferences.speed);
                self.session = Some(session);
            }
            Err(e) => error!("could not create a {}x{} grid: {}", rows, columns, e),
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let Some(session) = &mut self.session else {
            return;
        };
        let (play, maze, clear, algorithm, speed, skip) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::M),
                i.key_pressed(egui::Key::C),
                i.key_pressed(egui::Key::A),
                i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::Escape),
            )
        });

        if skip {
            session.finish_animation();
        }
        if session.is_busy() {
            return;
        }

        let command = if play {
            session.play()
        } else if maze {
            session.generate_maze()
        } else {
            if clear {
                session.clear();
            }
            if algorithm {
                session.cycle_algorithm();
            }
            if speed {
                session.cycle_speed();
            }
            None
        };
        self.execute(command);
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        let Some(session) = &mut self.session else {
            ui.spinner();
            return;
        };
        let busy = session.is_busy();
        let mut command = None;

        ui.heading("Path Visualizer");
        ui.separator();

        ui.add_enabled_ui(!busy, |ui| {
            let mut algorithm = session.algorithm();
            egui::ComboBox::from_label("Algorithm")
                .selected_text(algorithm.label())
                .show_ui(ui, |ui| {
                    for a in Algorithm::ALL {
                        ui.selectable_value(&mut algorithm, a, a.label());
                    }
                });
            session.set_algorithm(algorithm);

            if ui.button(format!("Speed: {}", session.speed())).clicked() {
                session.cycle_speed();
            }

            ui.horizontal(|ui| {
                if ui.button("Visualize").clicked() {
                    command = session.play();
                }
                if ui.button("Generate Maze").clicked() {
                    command = session.generate_maze();
                }
                if ui.button("Clear").clicked() {
                    session.clear();
                }
            });
        });

        if busy && session.next_due_ms().is_some() && ui.button("Skip animation").clicked() {
            session.finish_animation();
        }

        ui.checkbox(&mut self.preferences.draw_grid_lines, "Draw grid lines");
        ui.separator();

        if let Some(stats) = session.stats().filter(|_| session.is_played() && !busy) {
            ui.label(egui::RichText::new(stats.algorithm.label()).strong());
            egui::Grid::new("run_stats").num_columns(2).show(ui, |ui| {
                ui.label("Visited");
                ui.label(format!(
                    "{} / {} ({:.1}%)",
                    stats.visited,
                    stats.non_walls,
                    stats.visited_percentage()
                ));
                ui.end_row();

                ui.label("Path length");
                if stats.path_length == 0 {
                    ui.label("no path");
                } else {
                    ui.label(stats.path_length.to_string());
                }
                ui.end_row();

                ui.label("Complexity");
                ui.label(stats.algorithm.complexity());
                ui.end_row();
            });
            ui.separator();
        }

        if let Some(e) = session.last_error() {
            ui.colored_label(ui.visuals().error_fg_color, e);
        }
        if session.last_error().is_some() && ui.small_button("Dismiss").clicked() {
            session.dismiss_error();
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            powered_by_egui_and_eframe(ui);
            egui::warn_if_debug_build(ui);

            ui.horizontal(|ui| {
                match &self.backend {
                    BackendStatus::Unknown => ui.label("Backend: checking..."),
                    BackendStatus::Online(status) => ui.label(format!("Backend: {}", status)),
                    BackendStatus::Offline(_) => {
                        ui.colored_label(ui.visuals().warn_fg_color, "Backend: offline")
                    }
                };
                if ui.small_button("↻").clicked() {
                    self.backend = BackendStatus::Unknown;
                    self.remote.check_health();
                }
            });
            ui.label("Space: visualize, M: maze, C: clear, A: algorithm, S: speed");
        });

        self.execute(command);
    }

    fn grid_panel(&mut self, ui: &mut egui::Ui) {
        self.ensure_session(ui.available_size());
        let Some(session) = &mut self.session else {
            return;
        };

        let grid = session.grid();
        let view = GridView::new(
            ui.available_rect_before_wrap().min,
            self.config.node_size,
            grid.rows(),
            grid.columns(),
        );
        let (rect, response) = ui.allocate_exact_size(view.size(), Sense::click_and_drag());
        let view = GridView::new(rect.min, self.config.node_size, view.rows(), view.columns());

        let dark_mode = ui.visuals().dark_mode;
        let painter = ui.painter_at(rect);
        for (index, status) in grid.statuses().iter().enumerate() {
            let color = if index == grid.start() {
                START_COLOR
            } else if index == grid.end() {
                END_COLOR
            } else {
                status_color(*status, dark_mode)
            };
            painter.rect_filled(view.cell_rect(index), 0.0, color);
        }

        if self.preferences.draw_grid_lines {
            let stroke = Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color);
            for row in 0..=view.rows() {
                let y = rect.top() + row as f32 * self.config.node_size;
                painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], stroke);
            }
            for col in 0..=view.columns() {
                let x = rect.left() + col as f32 * self.config.node_size;
                painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], stroke);
            }
        }

        let busy = session.is_busy();
        if busy {
            painter.rect_filled(rect, 0.0, Color32::from_black_alpha(40));
            if response.hovered() {
                ui.ctx()
                    .output_mut(|o| o.cursor_icon = egui::CursorIcon::NotAllowed);
            }
        }

        let (pressed, down, released, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });

        let mut command = None;
        if !busy {
            let cell = pos.and_then(|pos| view.cell_at(pos));
            if let Some(index) = cell {
                if pressed && response.hovered() {
                    command = session.pointer_down(index);
                } else if down && response.is_pointer_button_down_on() {
                    command = session.pointer_enter(index);
                }
            }
        }
        if released {
            session.pointer_up();
        }

        self.execute(command);
    }
}

const START_COLOR: Color32 = Color32::from_rgb(46, 204, 113);
const END_COLOR: Color32 = Color32::from_rgb(231, 76, 60);

fn status_color(status: CellStatus, dark_mode: bool) -> Color32 {
    match status {
        CellStatus::Empty if dark_mode => Color32::from_gray(40),
        CellStatus::Empty => Color32::WHITE,
        CellStatus::Wall if dark_mode => Color32::from_gray(200),
        CellStatus::Wall => Color32::from_rgb(12, 53, 71),
        CellStatus::Visited => Color32::from_rgb(64, 206, 227),
        CellStatus::Path => Color32::from_rgb(255, 254, 106),
        CellStatus::Active => Color32::from_rgb(255, 165, 0),
    }
}

impl eframe::App for App {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Some(session) = &self.session {
            self.preferences.algorithm = session.algorithm();
            self.preferences.speed = session.speed();
        }
        eframe::set_value(storage, eframe::APP_KEY, &self.preferences);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // one clock for both replies and animation frames
        let now_ms = (ctx.input(|i| i.time) * 1000.0) as u64;

        self.receive_replies(now_ms);
        if let Some(session) = &mut self.session {
            session.tick(now_ms);
        }
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                // NOTE: no File->Quit on web pages!
                let is_web = cfg!(target_arch = "wasm32");
                if !is_web {
                    ui.menu_button("File", |ui| {
                        if ui.button("Quit").clicked() {
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                    ui.add_space(16.0);
                }

                egui::widgets::global_dark_light_mode_buttons(ui);
            });
        });

        egui::SidePanel::left("side_panel").show(ctx, |ui| self.side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.grid_panel(ui));

        if let Some(due) = self.session.as_ref().and_then(Session::next_due_ms) {
            ctx.request_repaint_after(Duration::from_millis(due.saturating_sub(now_ms)));
        }
    }
}

fn powered_by_egui_and_eframe(ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        ui.label("Powered by ");
        ui.hyperlink_to("egui", "https://github.com/emilk/egui");
        ui.label(" and ");
        ui.hyperlink_to(
            "eframe",
            "https://github.com/emilk/egui/tree/master/crates/eframe",
        );
        ui.label(".");
    });
}
