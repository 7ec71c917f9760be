//! HUD panels drawn over the rooms.

use bevy_egui::egui;
use whitespace_core::decoder::DecodeResult;
use whitespace_core::rooms::RoomRegistry;
use whitespace_core::transition::TransitionState;
use whitespace_core::GameSession;

use crate::state::HudState;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(120, 200, 255);
const MUTED: egui::Color32 = egui::Color32::from_rgb(150, 150, 150);

/// Bits, preview and letters typed so far.
pub fn render_buffer_window(ctx: &egui::Context, session: &GameSession, rooms: &RoomRegistry) {
    let buffer = session.buffer();

    egui::Window::new("Input")
        .collapsible(true)
        .resizable(false)
        .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Bits:");
                let bits = buffer.bit_string();
                let shown = if bits.is_empty() { "-".to_string() } else { bits };
                ui.monospace(shown);
                ui.label(
                    egui::RichText::new(format!("{}/{}", buffer.bit_len(), buffer.capacity()))
                        .small()
                        .color(MUTED),
                );
            });

            ui.horizontal(|ui| {
                ui.label("Forward gives:");
                let (text, color) = match session.preview() {
                    DecodeResult::Letter(c) => (c.to_string(), ACCENT),
                    DecodeResult::Overflow => ("nothing".to_string(), MUTED),
                    DecodeResult::Incomplete => ("keep walking".to_string(), MUTED),
                };
                ui.label(egui::RichText::new(text).strong().color(color));
            });

            ui.separator();
            ui.label(format!("Letters ({}/{}):", buffer.letters().len(), buffer.max_letters()));
            let letters = buffer.letters();
            ui.monospace(if letters.is_empty() { "-" } else { letters });

            if !buffer.history().is_empty() {
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(format!("Spoken: {}", buffer.history().join(", ")))
                        .small()
                        .color(MUTED),
                );
            }

            ui.separator();
            let state = match session.state() {
                TransitionState::Idle => "standing still".to_string(),
                TransitionState::Transitioning { target, direction } => {
                    format!("walking {direction:?} to {target}")
                }
            };
            if let Some(room) = session.current_room() {
                ui.label(format!("In {room}, {state}"));
            }
            ui.label(
                egui::RichText::new(format!("{} rooms loaded", rooms.len()))
                    .small()
                    .color(MUTED),
            );
        });
}

/// Shown if the session failed to start.
pub fn render_no_session(ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.heading(egui::RichText::new("Whitespace").size(40.0));
                ui.add_space(10.0);
                ui.colored_label(egui::Color32::LIGHT_RED, "The game could not start. See the log.");
            });
        });
}

/// Which walk spells each letter.
pub fn render_legend(ctx: &egui::Context, session: &GameSession) {
    let trie = session.buffer().trie();

    egui::SidePanel::right("legend_panel")
        .min_width(150.0)
        .max_width(150.0)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("Letters");
            ui.label(
                egui::RichText::new(format!("{:?} layout, depth {}", trie.layout(), trie.depth()))
                    .small()
                    .color(MUTED),
            );
            ui.label(egui::RichText::new("Tab to hide").small().color(MUTED));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                for letter in 'A'..='Z' {
                    let Some(path) = trie.path_for(letter) else { continue };
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(letter.to_string()).strong().color(ACCENT));
                        ui.monospace(route_label(&path));
                    });
                }
            });
        });
}

/// Recent events along the bottom of the screen.
pub fn render_log_panel(ctx: &egui::Context, hud: &HudState) {
    egui::TopBottomPanel::bottom("log_panel")
        .resizable(false)
        .min_height(110.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("A/D turn, W forward, R restart").small().color(MUTED));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!("config: {}", hud.config_source))
                            .small()
                            .color(MUTED),
                    );
                });
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for line in &hud.log {
                        ui.label(line);
                    }
                });
        });
}

/// The narrative of the last spoken keyword.
pub fn render_narrative(ctx: &egui::Context, narrative: &str) {
    egui::Area::new(egui::Id::new("narrative"))
        .anchor(egui::Align2::CENTER_TOP, [0.0, 40.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(narrative)
                    .size(24.0)
                    .italics()
                    .color(egui::Color32::WHITE),
            );
        });
}

/// Why the configured file was not used. Dismissable.
pub fn render_config_error(ctx: &egui::Context, hud: &mut HudState) {
    let Some(error) = hud.config_error.clone() else { return };
    let mut open = true;

    egui::Window::new("Config")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .open(&mut open)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                ui.colored_label(egui::Color32::LIGHT_RED, &error);
                ui.label(format!("Using {}.", hud.config_source));
                ui.add_space(10.0);
                if ui.button("OK").clicked() {
                    hud.config_error = None;
                }
            });
        });

    if !open {
        hud.config_error = None;
    }
}

/// A letter's walk written as turns, ending with the step forward.
fn route_label(path: &[bool]) -> String {
    let mut turns: Vec<&str> = path.iter().map(|&bit| if bit { "R" } else { "L" }).collect();
    turns.push("F");
    turns.join(" ")
}
