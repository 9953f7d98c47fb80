//! Platform-agnostic time utilities
//!
//! - now_seconds(): elapsed seconds since app start
//! - FrameRate: rolling frames-per-second estimate for the HUD

use std::collections::VecDeque;

#[cfg(target_arch = "wasm32")]
pub fn now_seconds() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now() / 1000.0)
        .unwrap_or(0.0)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_seconds() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Frames per second over the last `window` frames
pub struct FrameRate {
    stamps: VecDeque<f64>,
    window: usize,
}

impl FrameRate {
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            stamps: VecDeque::with_capacity(window + 1),
            window,
        }
    }

    /// Record a frame at `now` seconds
    pub fn tick(&mut self, now: f64) {
        self.stamps.push_back(now);
        if self.stamps.len() > self.window {
            self.stamps.pop_front();
        }
    }

    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.stamps.front(), self.stamps.back()) else {
            return 0.0;
        };
        let elapsed = last - first;
        if self.stamps.len() < 2 || elapsed <= 0.0 {
            return 0.0;
        }
        (self.stamps.len() - 1) as f64 / elapsed
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(60)
    }
}
