//! PacketLens desktop viewer
//!
//! Run with: cargo run --features viewer --bin packetlens
//! Set PACKETLENS_DEMO=1 to animate synthetic traffic without a backend.

use eframe::egui;
use packetlens::app::PacketLensApp;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<(), eframe::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("PacketLens")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PacketLens",
        options,
        Box::new(|cc| Ok(Box::new(PacketLensApp::new(cc)))),
    )
}
