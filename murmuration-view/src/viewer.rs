//! Interactive murmuration viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation state
//! ([`World`], [`SteerBuffer`], configuration) and implements
//! [`eframe::App`] to render and control the simulation through an egui UI.
//!
//! The typical per-frame update is:
//! 1. Honor a pending quit request ('Q' / Escape) — checked between ticks
//!    only, so the world is never left half-stepped.
//! 2. Handle UI interactions and input.
//! 3. If `running` and enough time has passed, call [`Viewer::step_once`].
//! 4. Draw the world boundary and every agent from the tick's render view.

use eframe::App;
use glam::Vec2;
use murmuration_core::agent::AgentKind;
use murmuration_core::config::{BoundaryPolicy, ConfigError, SimulationConfig, SteeringMode};
use murmuration_core::phases;
use murmuration_core::steering::SteerBuffer;
use murmuration_core::world::World;
use tracing::warn;

/// Main application state for the interactive viewer.
pub struct Viewer {
    world: World,
    acc: SteerBuffer,
    /// Draft configuration edited by the UI. Tunables are copied into the
    /// world before every step; structural fields (populations, seed) only
    /// take effect on Reset.
    cfg: SimulationConfig,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer over a freshly spawned default world.
    ///
    /// ### Returns
    /// - `Ok(Viewer)` ready to be passed to `eframe::run_native`.
    /// - `Err` if the default configuration fails validation.
    pub fn new() -> Result<Self, ConfigError> {
        let cfg = SimulationConfig::default();
        let world = World::new(cfg)?;
        let acc = SteerBuffer::with_len(world.starlings.len());

        Ok(Self {
            world,
            acc,
            cfg,
            running: false,
            zoom: 6.0,
            pan: egui::vec2(0.0, 0.0),
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        })
    }

    /// Rebuilds the world from the current draft configuration.
    ///
    /// Keeps the camera and timing settings. If the draft fails validation
    /// the old world stays and the rejection is logged.
    fn reset(&mut self) {
        match World::new(self.cfg) {
            Ok(world) => {
                self.acc = SteerBuffer::with_len(world.starlings.len());
                self.world = world;
                self.running = false;
            }
            Err(err) => warn!(%err, "reset rejected: configuration invalid"),
        }
    }

    /// Advances the simulation by a single tick at wall-clock time `now`.
    fn step_once(&mut self, now: f64) {
        self.world.config = self.cfg;
        phases::advance(&mut self.world, &mut self.acc, now);
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The world rectangle is centered in `rect`, scaled by `zoom`, and
    /// offset by `pan`. World y grows downward, matching screen space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let half_w = self.cfg.width * 0.5;
        let half_h = self.cfg.height * 0.5;
        egui::pos2(
            center.x + (p.x - half_w) * self.zoom + self.pan.x,
            center.y + (p.y - half_h) * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`] up to floating-point rounding.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let half_w = self.cfg.width * 0.5;
        let half_h = self.cfg.height * 0.5;
        Vec2::new(
            (p.x - center.x - self.pan.x) / self.zoom + half_w,
            (p.y - center.y - self.pan.y) / self.zoom + half_h,
        )
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(1.0));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f64` [`egui::DragValue`].
    fn labeled_drag_f64(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f64,
        range: std::ops::RangeInclusive<f64>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.01..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once(now);
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.5..=40.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (time step and population counts).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("starlings = {}", self.world.starlings.len()));
                ui.label(format!("predators = {}", self.world.predators.len()));
            });
        });
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Config");

                    ui.separator();
                    ui.label("Model");
                    egui::ComboBox::from_label("steering")
                        .selected_text(match self.cfg.steering {
                            SteeringMode::Heading => "Heading",
                            SteeringMode::Velocity => "Velocity",
                        })
                        .show_ui(ui, |ui| {
                            ui.selectable_value(
                                &mut self.cfg.steering,
                                SteeringMode::Heading,
                                "Heading",
                            );
                            ui.selectable_value(
                                &mut self.cfg.steering,
                                SteeringMode::Velocity,
                                "Velocity",
                            );
                        });
                    egui::ComboBox::from_label("boundary")
                        .selected_text(match self.cfg.boundary {
                            BoundaryPolicy::Wrap => "Wrap",
                            BoundaryPolicy::Bounce => "Bounce",
                        })
                        .show_ui(ui, |ui| {
                            ui.selectable_value(
                                &mut self.cfg.boundary,
                                BoundaryPolicy::Wrap,
                                "Wrap",
                            );
                            ui.selectable_value(
                                &mut self.cfg.boundary,
                                BoundaryPolicy::Bounce,
                                "Bounce",
                            );
                        });

                    ui.separator();
                    ui.label("World (applies on Reset)");
                    Self::labeled_drag_f32(ui, "width:", &mut self.cfg.width, 10.0..=1000.0, 1.0);
                    Self::labeled_drag_f32(ui, "height:", &mut self.cfg.height, 10.0..=1000.0, 1.0);
                    Self::labeled_drag_usize(ui, "starlings:", &mut self.cfg.num_starlings, 0..=2000);
                    Self::labeled_drag_usize(ui, "predators:", &mut self.cfg.num_predators, 0..=50);
                    Self::labeled_drag_usize(ui, "obstacles:", &mut self.cfg.num_obstacles, 0..=200);
                    Self::labeled_drag_usize(
                        ui,
                        "attraction points:",
                        &mut self.cfg.num_attraction_points,
                        0..=50,
                    );

                    ui.separator();
                    ui.label("Heading model");
                    Self::labeled_drag_f32(
                        ui,
                        "starling_speed:",
                        &mut self.cfg.starling_speed,
                        0.1..=10.0,
                        0.1,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "turn_angle:",
                        &mut self.cfg.turn_angle,
                        0.05..=std::f32::consts::PI,
                        0.05,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "align_radius:",
                        &mut self.cfg.align_radius,
                        1.0..=100.0,
                        0.5,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "obstacle_avoid_radius:",
                        &mut self.cfg.obstacle_avoid_radius,
                        0.5..=50.0,
                        0.5,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "predator_avoid_radius:",
                        &mut self.cfg.predator_avoid_radius,
                        0.5..=50.0,
                        0.5,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "predator_speed:",
                        &mut self.cfg.predator_speed,
                        0.1..=10.0,
                        0.1,
                    );

                    ui.separator();
                    ui.label("Velocity model");
                    Self::labeled_drag_f32(
                        ui,
                        "separation_radius:",
                        &mut self.cfg.separation_radius,
                        0.5..=50.0,
                        0.5,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "alignment_factor:",
                        &mut self.cfg.alignment_factor,
                        0.0..=1.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "cohesion_factor:",
                        &mut self.cfg.cohesion_factor,
                        0.0..=1.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "predator_flee_factor:",
                        &mut self.cfg.predator_flee_factor,
                        0.0..=1.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "randomness_factor:",
                        &mut self.cfg.randomness_factor,
                        0.0..=1.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(ui, "max_speed:", &mut self.cfg.max_speed, 0.1..=10.0, 0.1);

                    ui.separator();
                    ui.label("Health & spawning");
                    Self::labeled_drag_f32(
                        ui,
                        "starting_health:",
                        &mut self.cfg.starting_health,
                        1.0..=1000.0,
                        1.0,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "health_decay_rate:",
                        &mut self.cfg.health_decay_rate,
                        0.0..=5.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "obstacle_damage:",
                        &mut self.cfg.obstacle_damage,
                        0.0..=100.0,
                        0.5,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "predator_damage:",
                        &mut self.cfg.predator_damage,
                        0.0..=100.0,
                        0.5,
                    );
                    Self::labeled_drag_f64(
                        ui,
                        "starling_spawn_interval:",
                        &mut self.cfg.starling_spawn_interval,
                        0.5..=120.0,
                        0.5,
                    );
                    Self::labeled_drag_f64(
                        ui,
                        "predator_spawn_interval:",
                        &mut self.cfg.predator_spawn_interval,
                        0.5..=120.0,
                        0.5,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "spawn_fraction:",
                        &mut self.cfg.starling_spawn_fraction,
                        0.0..=2.0,
                        0.05,
                    );

                    ui.separator();
                    ui.label("Seed (applies on Reset)");
                    let mut seeded = self.cfg.seed.is_some();
                    if ui.checkbox(&mut seeded, "fixed seed").changed() {
                        self.cfg.seed = if seeded { Some(0) } else { None };
                    }
                    if let Some(seed) = &mut self.cfg.seed {
                        ui.add(egui::DragValue::new(seed).speed(1.0));
                    }

                    ui.separator();
                    if ui.button("Defaults (heading)").clicked() {
                        self.cfg = SimulationConfig::default();
                    }
                    if ui.button("Velocity preset").clicked() {
                        self.cfg = SimulationConfig::velocity_preset();
                    }
                });
            });
    }

    /// Builds the central panel where the world is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                let delta = response.drag_delta();
                self.pan += delta;
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.5, 40.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // World boundary.
            let corners = [
                Vec2::new(0.0, 0.0),
                Vec2::new(self.cfg.width, 0.0),
                Vec2::new(self.cfg.width, self.cfg.height),
                Vec2::new(0.0, self.cfg.height),
            ];
            let points: Vec<egui::Pos2> = corners
                .iter()
                .map(|&c| self.world_to_screen(c, rect))
                .collect();
            painter.add(egui::Shape::closed_line(
                points,
                egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
            ));

            // Draw the current render view: static points first, movers on
            // top. Static points are clipped to the world bounds before
            // drawing; a shrunk world can leave them outside.
            for entry in self.world.view() {
                let p = entry.position;
                match entry.kind {
                    AgentKind::Obstacle => {
                        if !self.in_world_bounds(p) {
                            continue;
                        }
                        painter.circle_filled(
                            self.world_to_screen(p, rect),
                            (0.35 * self.zoom).max(2.0),
                            egui::Color32::GRAY,
                        );
                    }
                    AgentKind::AttractionPoint => {
                        if !self.in_world_bounds(p) {
                            continue;
                        }
                        painter.circle_filled(
                            self.world_to_screen(p, rect),
                            (0.3 * self.zoom).max(2.0),
                            egui::Color32::LIGHT_BLUE,
                        );
                    }
                    AgentKind::Starling => {
                        painter.circle_filled(
                            self.world_to_screen(p, rect),
                            (0.25 * self.zoom).max(1.5),
                            egui::Color32::GREEN,
                        );
                    }
                    AgentKind::Predator => {
                        painter.circle_filled(
                            self.world_to_screen(p, rect),
                            (0.6 * self.zoom).max(3.0),
                            egui::Color32::RED,
                        );
                    }
                }
            }

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once(now);
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }

    fn in_world_bounds(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x < self.cfg.width && p.y >= 0.0 && p.y < self.cfg.height
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Quit lands here, between ticks, never mid-tick.
        if ctx.input(|i| i.key_pressed(egui::Key::Q) || i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = Viewer::new().unwrap();
        // Use non-trivial zoom and pan to exercise the math.
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(60.0, 20.0),
            Vec2::new(119.5, 39.25),
        ];

        let eps = 1e-4;

        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);

            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }
    }

    #[test]
    fn reset_rebuilds_the_configured_populations() {
        let mut viewer = Viewer::new().unwrap();

        // Mutate state to make sure reset actually changes things.
        viewer.world.starlings.clear();
        viewer.running = true;
        viewer.cfg.num_starlings = 42;

        viewer.reset();

        assert_eq!(viewer.world.starlings.len(), 42);
        assert_eq!(viewer.world.predators.len(), viewer.cfg.num_predators);
        assert!(!viewer.running);
    }

    #[test]
    fn reset_with_an_invalid_draft_keeps_the_old_world() {
        let mut viewer = Viewer::new().unwrap();
        let before = viewer.world.starlings.len();

        viewer.cfg.width = -5.0;
        viewer.reset();

        assert_eq!(viewer.world.starlings.len(), before);
    }

    #[test]
    fn step_once_moves_the_flock_without_changing_its_size() {
        let mut viewer = Viewer::new().unwrap();
        viewer.cfg.seed = Some(4);
        viewer.reset();

        let before: Vec<Vec2> = viewer.world.starlings.iter().map(|s| s.position).collect();
        let population = viewer.world.starlings.len();

        // First tick arms the spawn timers; no batch lands yet.
        viewer.step_once(0.0);

        assert_eq!(viewer.world.starlings.len(), population);
        let moved = viewer
            .world
            .starlings
            .iter()
            .zip(&before)
            .any(|(s, old)| s.position != *old);
        assert!(moved);
    }
}
