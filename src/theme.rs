//! Dark "space" theme: black background, terminal-green HUD text

use egui::Color32;

use crate::core::Rgb;

pub mod colors {
    use super::Color32;

    // === Backgrounds ===
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(0, 0, 0);           // #000000 - scene background
    pub const BG_OVERLAY: Color32 = Color32::from_rgba_premultiplied(10, 10, 10, 180);

    // === Text ===
    pub const HUD_GREEN: Color32 = Color32::from_rgb(0, 255, 0);          // #00FF00 - title
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(255, 255, 255);   // #FFFFFF
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 160, 160); // #A0A0A0
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(80, 80, 80);        // #505050

    // === Connection status ===
    pub const STATUS_OK: Color32 = Color32::from_rgb(100, 200, 100);
    pub const STATUS_PENDING: Color32 = Color32::from_rgb(200, 200, 100);
    pub const STATUS_DOWN: Color32 = Color32::from_rgb(200, 100, 100);

    // === Particle glow ===
    pub const GLOW_ALPHA: u8 = 28;
    pub const HIGHLIGHT: Color32 = Color32::from_rgba_premultiplied(120, 120, 120, 120);

    // === Backdrop ===
    pub const HOME_BASE: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);   // #333333 - wireframe platform
    pub const STAR: Color32 = Color32::from_rgb(235, 240, 255);
}

/// Opaque egui color from a palette color
pub fn rgb(color: Rgb) -> Color32 {
    Color32::from_rgb(color.0, color.1, color.2)
}

/// Translucent egui color from a palette color
pub fn rgba(color: Rgb, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.0, color.1, color.2, alpha)
}

/// Dark egui Visuals with pure black panels
pub fn scene_visuals() -> egui::Visuals {
    use colors::*;

    let mut visuals = egui::Visuals::dark();

    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_PRIMARY;
    visuals.extreme_bg_color = BG_PRIMARY;
    visuals.override_text_color = Some(TEXT_PRIMARY);

    // No shadows - flat overlay
    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;

    visuals
}
