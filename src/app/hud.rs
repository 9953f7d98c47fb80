//! Heads-up overlay: title, object count, protocol legend, connection status

use eframe::egui;
use egui::RichText;

use super::PacketLensApp;
use crate::core::palette::{protocol_color, LEGEND};
use crate::theme::{self, colors};
use crate::ws_state::WsState;

/// Format a count with human-readable suffix (1234 → "1234", 56000 → "56.0k")
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn overlay_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::BG_OVERLAY)
        .corner_radius(4.0)
        .inner_margin(10.0)
}

impl PacketLensApp {
    /// Title block, top-left
    pub(crate) fn draw_title(&self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("hud_title"))
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(20.0, 20.0))
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(RichText::new("PacketLens").size(22.0).strong().color(colors::HUD_GREEN));
                ui.label(RichText::new("Live Traffic Monitor").color(colors::TEXT_SECONDARY));
                ui.add_space(4.0);
                ui.label(
                    RichText::new(format!("Objects in view: {}", self.scene.particle_count()))
                        .monospace()
                        .color(colors::TEXT_PRIMARY),
                );
            });
    }

    /// Protocol color legend, bottom-left
    pub(crate) fn draw_legend(&self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("hud_legend"))
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(20.0, -20.0))
            .show(ctx, |ui| {
                overlay_frame().show(ui, |ui| {
                    for &(protocol, label) in LEGEND {
                        ui.horizontal(|ui| {
                            let (dot_rect, _) =
                                ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                            ui.painter().circle_filled(
                                dot_rect.center(),
                                5.0,
                                theme::rgb(protocol_color(protocol)),
                            );
                            ui.label(RichText::new(label).color(colors::TEXT_SECONDARY));
                        });
                    }
                });
            });
    }

    /// Connection and pipeline status, top-right
    pub(crate) fn draw_status(&self, ctx: &egui::Context) {
        let (indicator, status_text, status_color) = match self.get_ws_state() {
            Some(WsState::Connected) => ("●", "Connected".to_string(), colors::STATUS_OK),
            Some(WsState::Connecting) => ("●", "Connecting...".to_string(), colors::STATUS_PENDING),
            Some(WsState::Disconnected) => ("✕", "Disconnected".to_string(), colors::STATUS_DOWN),
            Some(WsState::Error(e)) => ("✕", format!("Error: {e}"), colors::STATUS_DOWN),
            None => ("●", "Synthetic traffic".to_string(), colors::STATUS_PENDING),
        };
        let stats = self.scene.stats();

        egui::Area::new(egui::Id::new("hud_status"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-20.0, 20.0))
            .show(ctx, |ui| {
                overlay_frame().show(ui, |ui| {
                    ui.label(RichText::new(format!("{indicator} {status_text}")).color(status_color));
                    egui::Grid::new("hud_status_grid")
                        .num_columns(2)
                        .spacing([16.0, 2.0])
                        .show(ui, |ui| {
                            let row = |ui: &mut egui::Ui, name: &str, value: String| {
                                ui.label(RichText::new(name).color(colors::TEXT_MUTED));
                                ui.label(RichText::new(value).monospace().color(colors::TEXT_SECONDARY));
                                ui.end_row();
                            };
                            row(ui, "fps", format!("{:.0}", self.frame_rate.fps()));
                            row(ui, "packets", format_count(stats.received));
                            row(ui, "rejected", format_count(stats.rejected));
                            row(ui, "recycled", format_count(stats.recycled));
                            row(ui, "dropped", format_count(self.dropped()));
                        });
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(9_999), "9999");
        assert_eq!(format_count(56_000), "56.0k");
        assert_eq!(format_count(5_000_000), "5.0M");
    }
}
