use std::sync::Arc;
use std::time::Duration;

use checkers_engine::{Advisor, AlphaBetaOracle, Color, Game, SearchLimits, Transition};
use eframe::egui::{self, Color32, RichText};

mod gui;

struct App {
    game: Game,
    advisor: Advisor,
    cell_size: f32,
    side_prompt: bool,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([790.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Checkers",
        options,
        Box::new(|_cc| {
            let advisor = Advisor::new(Arc::new(AlphaBetaOracle), SearchLimits::default());
            Box::new(App {
                game: Game::new(Color::Black),
                advisor,
                cell_size: 70.0,
                side_prompt: true,
            })
        }),
    )
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.advisor.poll(self.game.turn_id()) {
            ctx.request_repaint();
        }
        egui::SidePanel::right("control_panel").show(ctx, |ui| self.control_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            let clicked = gui::board_canvas(ui, self.cell_size, &self.game, self.advisor.view());
            if let Some((row, col)) = clicked {
                if !self.side_prompt {
                    self.board_clicked(row, col);
                }
            }
        });
        if self.side_prompt {
            self.show_side_prompt(ctx);
        }
        // Fixed channel drain cadence.
        ctx.request_repaint_after(Duration::from_millis(50));
    }
}

impl App {
    fn board_clicked(&mut self, row: u8, col: u8) {
        match self.game.handle_click(row, col) {
            Transition::TurnEnded => self.start_advisory(),
            Transition::GameOver(_) => self.advisor.clear(),
            _ => {}
        }
    }

    fn start_advisory(&mut self) {
        self.advisor.clear();
        self.advisor.request(
            self.game.board().clone(),
            self.game.active_player(),
            self.game.turn_id(),
        );
    }

    fn restart(&mut self, starting_player: Color) {
        self.game.reset(starting_player);
        self.side_prompt = false;
        self.start_advisory();
    }

    fn control_panel(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.heading("Checkers");
            if let Some(winner) = self.game.winner() {
                ui.label(
                    RichText::new(format!("Finished! {winner:?} won"))
                        .color(Color32::GOLD)
                        .strong(),
                );
            } else {
                ui.label(format!("Move: {:?}", self.game.active_player()));
            }

            let view = self.advisor.view();
            if view.thinking {
                ui.label(RichText::new("Thinking...").color(Color32::RED).italics());
            } else if view.outcome.is_some() {
                ui.label(RichText::new("Ready").color(Color32::GREEN).italics());
            } else {
                ui.label(RichText::new("Waiting").color(Color32::LIGHT_BLUE).italics());
            }
            if let Some((depth, score)) = view.progress {
                ui.label(format!("D: {depth} | O: {}", gui::score_text(score)));
            }
            if let Some(report) = &view.outcome {
                ui.label(format!(
                    "Final: D={} | S={}",
                    report.depth,
                    gui::score_text(report.score)
                ));
            }

            if ui.button("New game").clicked() {
                self.side_prompt = true;
            }
        });
    }

    fn show_side_prompt(&mut self, ctx: &egui::Context) {
        egui::Window::new("Select a side")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Whites starting?");
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        self.restart(Color::White);
                    }
                    if ui.button("No").clicked() {
                        self.restart(Color::Black);
                    }
                });
            });
    }
}
