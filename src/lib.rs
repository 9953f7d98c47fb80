//! PacketLens - live 3D network traffic monitor
//!
//! Packet events arrive from a capture backend over a Socket.IO websocket,
//! land in a bounded buffer of the most recent events, and every buffered
//! event is shown as a sphere drifting toward the camera:
//! - core: buffer, particle reconciliation, frame advance, palette
//! - websocket_native / websocket_wasm: ingestion channel per platform
//! - app: egui viewer shared by the native binary and the browser build

pub mod core;
pub mod time;
pub mod ws_state;

#[cfg(all(feature = "cli", not(target_arch = "wasm32")))]
pub mod websocket_native;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod websocket_wasm;

#[cfg(any(feature = "viewer", all(feature = "wasm", target_arch = "wasm32")))]
pub mod app;
#[cfg(any(feature = "viewer", all(feature = "wasm", target_arch = "wasm32")))]
pub mod theme;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod web {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::app::PacketLensApp;

    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();

        // Initialize tracing for browser console
        tracing_wasm::set_as_global_default();

        let web_options = eframe::WebOptions::default();

        wasm_bindgen_futures::spawn_local(async {
            let Some(canvas) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("canvas"))
                .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
            else {
                tracing::error!("No <canvas id=\"canvas\"> element on the page");
                return;
            };

            let started = eframe::WebRunner::new()
                .start(
                    canvas,
                    web_options,
                    Box::new(|cc| Ok(Box::new(PacketLensApp::new(cc)))),
                )
                .await;
            if let Err(e) = started {
                tracing::error!(error = ?e, "Failed to start eframe");
            }
        });
    }
}
