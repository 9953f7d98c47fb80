//! Headless CLI for the PacketLens pipeline
//!
//! Runs ingestion, reconciliation and the frame loop without a window and
//! logs pipeline statistics.
//!
//! Run with: cargo run --features cli --bin packetlens-cli

use packetlens::core::{PacketScene, SceneConfig, SyntheticFeed};
use packetlens::time::now_seconds;
use packetlens::websocket_native::NativeWsClient;
use packetlens::ws_state::endpoint_from_env;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Fixed visual cadence of the frame loop
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
const STATS_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,packetlens=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = SceneConfig::from_env();
    let mut scene = PacketScene::new(config)?;

    let mut client = None;
    let mut demo = None;
    if SyntheticFeed::requested() {
        info!(rate = SyntheticFeed::DEFAULT_RATE, "Using synthetic traffic");
        demo = Some(SyntheticFeed::new(SyntheticFeed::DEFAULT_RATE));
    } else {
        let url = endpoint_from_env();
        info!(url = %url, "Connecting to capture backend");
        client = Some(NativeWsClient::spawn(&url));
    }

    let mut frame_interval = tokio::time::interval(FRAME_INTERVAL);
    frame_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_interval = tokio::time::interval(STATS_INTERVAL);
    let mut last_frame = now_seconds();
    let mut frames_last_interval = 0u64;
    let mut received_last_interval = 0u64;

    info!("Pipeline running, Ctrl-C to stop");

    loop {
        tokio::select! {
            frame = recv(&mut client) => {
                match frame {
                    Some(text) => {
                        scene.ingest(&text);
                    }
                    None => {
                        // Session over; keep animating what is buffered
                        debug!("Ingestion channel closed");
                        client = None;
                    }
                }
            }
            _ = frame_interval.tick() => {
                let now = now_seconds();
                if let Some(feed) = demo.as_mut() {
                    for msg in feed.poll(now - last_frame) {
                        scene.push(msg);
                    }
                }
                last_frame = now;
                scene.tick();
                frames_last_interval += 1;
            }
            _ = stats_interval.tick() => {
                let stats = scene.stats();
                let secs = STATS_INTERVAL.as_secs_f64();
                info!(
                    state = client.as_ref().map(|c| c.state().label()).unwrap_or("offline"),
                    particles = stats.live_particles,
                    buffered = stats.buffered,
                    received = stats.received,
                    rejected = stats.rejected,
                    recycled = stats.recycled,
                    dropped = client.as_ref().map(|c| c.dropped()).unwrap_or(0),
                    "/sec" = format!("{:.1}", (stats.received - received_last_interval) as f64 / secs),
                    fps = format!("{:.1}", frames_last_interval as f64 / secs),
                    "stats"
                );
                received_last_interval = stats.received;
                frames_last_interval = 0;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    // Release the subscription before the scene goes away
    if let Some(mut client) = client.take() {
        client.shutdown();
    }
    info!(stats = ?scene.stats(), "Stopped");
    Ok(())
}

/// Next frame from the socket; pends forever when there is no socket
async fn recv(client: &mut Option<NativeWsClient>) -> Option<String> {
    match client {
        Some(client) => client.recv().await,
        None => std::future::pending().await,
    }
}
