//! PacketLens viewer
//!
//! This module contains the egui app that runs on both native and WASM platforms.
//! Each frame drains the ingestion channel under a time budget, advances the
//! scene once and paints it.

mod hud;
pub mod scene_view;

use eframe::egui;
use tracing::info;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::collections::VecDeque;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

use crate::core::{PacketScene, SyntheticFeed};
use crate::theme::{colors, scene_visuals};
use crate::time::{now_seconds, FrameRate};
use crate::ws_state::WsState;
use scene_view::{Camera, Starfield};

#[cfg(target_arch = "wasm32")]
use crate::websocket_wasm::{MessageBuffer, WsClient};

#[cfg(not(target_arch = "wasm32"))]
use crate::core::SceneConfig;
#[cfg(not(target_arch = "wasm32"))]
use crate::websocket_native::NativeWsClient;

/// Seconds between stats log lines
const STATS_PERIOD: f64 = 5.0;

/// PacketLens app - runs on both native and WASM
pub struct PacketLensApp {
    scene: PacketScene,
    camera: Camera,
    starfield: Starfield,

    /// WebSocket client; dropping it releases the subscription
    #[cfg(target_arch = "wasm32")]
    ws_client: Option<WsClient>,
    #[cfg(target_arch = "wasm32")]
    ws_state: Rc<RefCell<WsState>>,
    /// Buffered WebSocket messages for time-budgeted processing
    #[cfg(target_arch = "wasm32")]
    msg_buffer: MessageBuffer,
    #[cfg(not(target_arch = "wasm32"))]
    ws_client: Option<NativeWsClient>,

    /// Locally generated traffic instead of a socket
    demo: Option<SyntheticFeed>,

    frame_rate: FrameRate,
    last_frame: f64,
    last_stats: f64,
}

impl PacketLensApp {
    /// Create new app for WASM platform
    #[cfg(target_arch = "wasm32")]
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(scene_visuals());

        let ws_state = Rc::new(RefCell::new(WsState::Connecting));
        let msg_buffer: MessageBuffer = Rc::new(RefCell::new(VecDeque::new()));

        // Page may set window.__packetlens_demo / window.__packetlens_ws_url
        let demo_requested = js_sys::eval("window.__packetlens_demo")
            .ok()
            .is_some_and(|v| v.is_truthy());

        let (ws_client, demo) = if demo_requested {
            info!("Using synthetic traffic");
            (None, Some(SyntheticFeed::new(SyntheticFeed::DEFAULT_RATE)))
        } else {
            let ws_url = js_sys::eval("window.__packetlens_ws_url")
                .ok()
                .and_then(|v| v.as_string())
                .map(|url| crate::ws_state::resolve_endpoint(&url))
                .unwrap_or_else(|| crate::ws_state::DEFAULT_WS_URL.to_string());
            let client = match WsClient::connect(&ws_url, msg_buffer.clone(), ws_state.clone()) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to open WebSocket");
                    *ws_state.borrow_mut() = WsState::Error(format!("{e:?}"));
                    None
                }
            };
            (client, None)
        };

        let now = now_seconds();
        Self {
            scene: PacketScene::default(),
            camera: Camera::default(),
            starfield: Starfield::default(),
            ws_client,
            ws_state,
            msg_buffer,
            demo,
            frame_rate: FrameRate::default(),
            last_frame: now,
            last_stats: now,
        }
    }

    /// Create new app for native platform
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(scene_visuals());

        let (ws_client, demo) = if SyntheticFeed::requested() {
            info!(rate = SyntheticFeed::DEFAULT_RATE, "Using synthetic traffic");
            (None, Some(SyntheticFeed::new(SyntheticFeed::DEFAULT_RATE)))
        } else {
            let url = crate::ws_state::endpoint_from_env();
            info!(url = %url, "Connecting to capture backend");
            (Some(NativeWsClient::connect(&url)), None)
        };

        let now = now_seconds();
        Self {
            scene: PacketScene::new(SceneConfig::from_env()).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid scene config, using defaults");
                PacketScene::default()
            }),
            camera: Camera::default(),
            starfield: Starfield::default(),
            ws_client,
            demo,
            frame_rate: FrameRate::default(),
            last_frame: now,
            last_stats: now,
        }
    }

    /// Process incoming WebSocket messages (native)
    #[cfg(not(target_arch = "wasm32"))]
    fn process_messages(&mut self) {
        // Time-budget message processing: yield after ~12ms to maintain 60fps.
        // Remaining messages stay in the channel for the next frame.
        use std::time::{Duration, Instant};
        const BUDGET: Duration = Duration::from_millis(12);
        let deadline = Instant::now() + BUDGET;
        if let Some(client) = self.ws_client.as_mut() {
            while let Some(msg) = client.try_recv() {
                self.scene.ingest(&msg);
                if Instant::now() >= deadline {
                    break;
                }
            }
        }
    }

    /// Process buffered WebSocket messages (WASM)
    #[cfg(target_arch = "wasm32")]
    fn process_messages(&mut self) {
        const BUDGET_MS: f64 = 12.0;
        let deadline = js_sys::Date::now() + BUDGET_MS;
        let mut buf = self.msg_buffer.borrow_mut();
        while let Some(msg) = buf.pop_front() {
            self.scene.ingest(&msg);
            if js_sys::Date::now() >= deadline {
                break;
            }
        }
    }

    /// Connection state, None when running on synthetic traffic
    pub(crate) fn get_ws_state(&self) -> Option<WsState> {
        if self.demo.is_some() {
            return None;
        }
        #[cfg(target_arch = "wasm32")]
        {
            Some(self.ws_state.borrow().clone())
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Some(
                self.ws_client
                    .as_ref()
                    .map(|c| c.state())
                    .unwrap_or(WsState::Disconnected),
            )
        }
    }

    /// Frames dropped by the transport queue
    pub(crate) fn dropped(&self) -> u64 {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.ws_client.as_ref().map(|c| c.dropped()).unwrap_or(0)
        }
        #[cfg(target_arch = "wasm32")]
        {
            0
        }
    }

    /// Drag orbits, scroll zooms, double-click resets the view
    fn handle_camera_input(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        if response.dragged() {
            let delta = response.drag_delta();
            self.camera.orbit(delta.x, delta.y);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.camera.zoom(scroll);
            }
        }
        if response.double_clicked() {
            self.camera = Camera::default();
        }
    }

    fn log_stats(&mut self, now: f64) {
        if now - self.last_stats < STATS_PERIOD {
            return;
        }
        self.last_stats = now;
        let stats = self.scene.stats();
        info!(
            particles = stats.live_particles,
            received = stats.received,
            rejected = stats.rejected,
            recycled = stats.recycled,
            fps = format!("{:.1}", self.frame_rate.fps()),
            "stats"
        );
    }
}

impl eframe::App for PacketLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Request continuous repaint: one scene tick per display refresh
        ctx.request_repaint();

        self.process_messages();

        let now = now_seconds();
        if let Some(feed) = self.demo.as_mut() {
            for msg in feed.poll(now - self.last_frame) {
                self.scene.push(msg);
            }
        }
        self.last_frame = now;

        self.scene.tick();
        self.frame_rate.tick(now);
        self.log_stats(now);

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.handle_camera_input(ui, rect);
                let painter = ui.painter_at(rect);
                self.starfield.paint(&painter, rect, &self.camera);
                scene_view::paint_home_base(&painter, rect, &self.camera);
                scene_view::paint(&painter, rect, &self.scene, &self.camera);
            });

        self.draw_title(ctx);
        self.draw_legend(ctx);
        self.draw_status(ctx);
    }
}
