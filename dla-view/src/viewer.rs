//! Interactive 2D DLA viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation driver and
//! its configuration and implements [`eframe::App`] to render and control
//! the aggregation through an egui UI. The viewer only reads cluster and
//! walker state; all mutation goes through [`Simulation::reset`] and
//! [`Simulation::step`].

use dla_core::config::SimConfig;
use dla_core::sim::{FrameReport, Simulation};
use eframe::App;
use glam::Vec2;

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`Simulation`] and its [`SimConfig`].
/// - UI configuration (pan/zoom, draw toggles, decimation cap).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true`, call [`Viewer::step_once`] (the frame budget
///    inside the core bounds the work done per call).
/// 3. Render the cluster, the walkers, and the status readouts.
///
/// ### Fields
/// - `sim` - The aggregation driver (cluster, walker pool, RNG).
/// - `cfg` - Simulation parameters, edited live through the side panel.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `draw_lines` / `draw_points` / `draw_walkers` - Draw toggles.
/// - `draw_max_nodes` - Decimation cap: above this many nodes, drawing
///   strides over the node list to bound frame cost.
///
/// - `last_report` - Result of the most recent simulation step (for the
///   status bar).
pub struct Viewer {
    sim: Simulation,
    cfg: SimConfig,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    draw_lines: bool,
    draw_points: bool,
    draw_walkers: bool,
    draw_max_nodes: usize,

    last_report: FrameReport,
}

/// Stride to draw at most `cap` of `n` nodes.
fn draw_stride(n: usize, cap: usize) -> usize {
    if n > cap { n.div_ceil(cap) } else { 1 }
}

impl Viewer {
    /// Creates a new viewer with a freshly reset simulation.
    ///
    /// The default setup is [`SimConfig::default`] (deterministic seed,
    /// 1024 walkers), a single seed node at the origin, a moderate zoom
    /// and no pan.
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`] ready to be passed to
    /// `eframe::run_native`.
    pub fn new() -> Self {
        let cfg = SimConfig::default();
        let sim = Simulation::new(&cfg);

        Self {
            sim,
            cfg,
            running: false,
            zoom: 2.0,
            pan: egui::vec2(0.0, 0.0),
            draw_lines: true,
            draw_points: true,
            draw_walkers: true,
            draw_max_nodes: 12_000,
            last_report: FrameReport::default(),
        }
    }

    /// Resets the simulation to a single seed at the origin.
    ///
    /// This keeps the current configuration and camera settings, clears
    /// the last frame report and stops auto-running.
    fn reset(&mut self) {
        self.sim.reset(&self.cfg);
        self.last_report = FrameReport::default();
        self.running = false;
    }

    /// Advances the simulation by one frame's worth of walker steps and
    /// records the report. Stops auto-running once auto-pause latches.
    fn step_once(&mut self) {
        self.last_report = self.sim.step(&self.cfg);
        if self.sim.is_paused() {
            self.running = false;
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    ///
    /// ### Parameters
    /// - `p` - World-space position.
    /// - `rect` - Screen-space rectangle representing the drawing area.
    ///
    /// ### Returns
    /// The corresponding egui position in screen-space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding), using the same `zoom`, `pan`, and `rect` center.
    ///
    /// ### Parameters
    /// - `p` - Screen-space position in egui coordinates.
    /// - `rect` - Screen-space rectangle representing the drawing area.
    ///
    /// ### Returns
    /// The corresponding position in world-space.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
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

    /// Helper to draw a labeled `u64` [`egui::DragValue`].
    fn labeled_drag_u64(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u64,
        range: std::ops::RangeInclusive<u64>,
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

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.05..=20.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (node count, extent, last frame stats).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.sim.is_paused() {
                    ui.label("max reached — paused");
                    ui.separator();
                }
                ui.label(format!(
                    "stuck = {}  escaped = {}",
                    self.last_report.stuck, self.last_report.escaped
                ));
                ui.separator();
                ui.label(format!(
                    "nodes = {} / {}",
                    self.sim.cluster().len(),
                    self.cfg.max_stuck
                ));
                ui.label(format!("extent = {:.1}", self.sim.cluster().extent()));
                ui.label(format!("walkers = {}", self.sim.walkers().len()));
            });
        });
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Walkers");
                Self::labeled_drag_usize(
                    ui,
                    "num_walkers:",
                    &mut self.cfg.num_walkers,
                    32..=8192,
                    16.0,
                );

                ui.separator();
                ui.label("Sticking");
                Self::labeled_drag_f32(
                    ui,
                    "stick_radius:",
                    &mut self.cfg.stick_radius,
                    0.5..=12.0,
                    0.1,
                );
                Self::labeled_drag_f32(ui, "step_len:", &mut self.cfg.step_len, 0.25..=8.0, 0.05);
                Self::labeled_drag_f32(
                    ui,
                    "stick_prob:",
                    &mut self.cfg.stick_prob,
                    0.0..=1.0,
                    0.01,
                );

                ui.separator();
                ui.label("Respawn");
                Self::labeled_drag_f32(
                    ui,
                    "spawn_margin:",
                    &mut self.cfg.spawn_margin,
                    4.0..=200.0,
                    1.0,
                );
                Self::labeled_drag_f32(
                    ui,
                    "kill_margin:",
                    &mut self.cfg.kill_margin,
                    20.0..=400.0,
                    1.0,
                );

                ui.separator();
                ui.label("Limits");
                Self::labeled_drag_usize(
                    ui,
                    "max_stuck:",
                    &mut self.cfg.max_stuck,
                    100..=200_000,
                    100.0,
                );
                Self::labeled_drag_u64(
                    ui,
                    "frame_budget_ms:",
                    &mut self.cfg.frame_budget_ms,
                    0..=16,
                    1.0,
                );
                ui.checkbox(&mut self.cfg.auto_pause_on_max, "auto-pause on max");

                ui.separator();
                ui.label("RNG (applied on reset)");
                Self::labeled_drag_u64(ui, "seed:", &mut self.cfg.seed, 0..=u64::MAX, 1.0);
                ui.checkbox(&mut self.cfg.deterministic, "deterministic");

                ui.separator();
                ui.label("Drawing");
                ui.checkbox(&mut self.draw_lines, "lines");
                ui.checkbox(&mut self.draw_points, "points");
                ui.checkbox(&mut self.draw_walkers, "walkers");
                Self::labeled_drag_usize(
                    ui,
                    "draw_max_nodes:",
                    &mut self.draw_max_nodes,
                    2000..=60_000,
                    100.0,
                );

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = SimConfig::default();
                }
            });
    }

    /// Builds the central panel where the cluster and walkers are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                let delta = response.drag_delta();
                self.pan += delta;
            }

            // Zoom around the mouse cursor.
            if ui.ctx().input(|i| i.raw_scroll_delta.y != 0.0) {
                let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    let pointer_screen = response.hover_pos().unwrap_or(rect.center());

                    let world_before = self.screen_to_world(pointer_screen, rect);

                    let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                    let new_zoom = (self.zoom * factor).clamp(0.05, 20.0);
                    self.zoom = new_zoom;

                    let screen_after = self.world_to_screen(world_before, rect);

                    let delta = pointer_screen - screen_after;
                    self.pan += delta;
                }
            }

            let nodes = self.sim.cluster().nodes();
            let n = nodes.len();
            let stride = draw_stride(n, self.draw_max_nodes);

            // Draw parent -> child edges, brighter with depth.
            if self.draw_lines {
                for k in (0..n).step_by(stride) {
                    let node = &nodes[k];
                    if let Some(parent) = node.parent {
                        let a = self.world_to_screen(nodes[parent].pos, rect);
                        let b = self.world_to_screen(node.pos, rect);
                        let alpha = 40 + node.depth.min(140) as u8;
                        painter.line_segment(
                            [a, b],
                            egui::Stroke::new(
                                1.0,
                                egui::Color32::from_rgba_unmultiplied(255, 255, 255, alpha),
                            ),
                        );
                    }
                }
            }

            // Draw stuck nodes.
            if self.draw_points {
                for k in (0..n).step_by(stride) {
                    let node = &nodes[k];
                    let p = self.world_to_screen(node.pos, rect);
                    let r = (1.0 * self.zoom).max(1.5);
                    let intensity = (200 + node.depth / 2).min(255) as u8;
                    painter.circle_filled(p, r, egui::Color32::from_gray(intensity));
                }
            }

            // Draw walkers in flight.
            if self.draw_walkers {
                let color = egui::Color32::from_rgba_unmultiplied(255, 255, 255, 80);
                for w in self.sim.walkers() {
                    let p = self.world_to_screen(w.pos, rect);
                    painter.circle_filled(p, self.zoom.max(1.0), color);
                }
            }

            // Auto-run simulation if requested.
            if self.running {
                self.step_once();
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    ///
    /// This method:
    /// - Renders the top control bar and status bar.
    /// - Renders the config side panel.
    /// - Draws the central simulation view and handles interactions.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = Viewer::new();
        // Use non-trivial zoom and pan to exercise the math.
        viewer.zoom = 3.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, -5.0),
            Vec2::new(-3.5, 8.25),
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
    fn reset_restores_basic_state() {
        let mut viewer = Viewer::new();

        // Mutate state to make sure reset actually changes things.
        viewer.cfg.frame_budget_ms = 0;
        viewer.step_once();
        viewer.running = true;

        viewer.reset();

        // Cluster should hold exactly the seed again.
        assert_eq!(viewer.sim.cluster().len(), 1);
        assert!(viewer.sim.cluster().nodes()[0].parent.is_none());

        // Walker pool should match the configured count.
        assert_eq!(viewer.sim.walkers().len(), viewer.cfg.num_walkers);

        // No stale report after reset.
        assert_eq!(viewer.last_report, FrameReport::default());

        // Simulation should not be running after reset.
        assert!(!viewer.running);
    }

    #[test]
    fn step_once_records_a_full_frame_report() {
        let mut viewer = Viewer::new();
        viewer.cfg.frame_budget_ms = 0; // visit every walker

        viewer.step_once();

        assert_eq!(viewer.last_report.processed, viewer.cfg.num_walkers);
    }

    #[test]
    fn draw_stride_decimates_only_above_the_cap() {
        assert_eq!(draw_stride(100, 12_000), 1);
        assert_eq!(draw_stride(12_000, 12_000), 1);
        assert_eq!(draw_stride(24_000, 12_000), 2);
        assert_eq!(draw_stride(24_001, 12_000), 3);
    }
}
