//! End-to-end: raw socket frames through buffer, reconciliation and frames

use packetlens::core::{
    protocol_color, EventId, Ingest, PacketScene, Protocol, SceneConfig, SyntheticFeed,
    DEFAULT_CAPACITY,
};

fn socketio_frame(n: u64, protocol: &str) -> String {
    format!(
        r#"42["packet_data",{{"src":"192.168.1.{}","dst":"8.8.8.8","protocol":"{protocol}","size":{}}}]"#,
        n % 255,
        60 + n
    )
}

#[test]
fn overflow_keeps_the_most_recent_101() {
    let mut scene = PacketScene::seeded(SceneConfig::default(), 7).expect("valid config");
    for n in 0..105 {
        assert!(matches!(scene.ingest(&socketio_frame(n, "TCP")), Ingest::Appended(_)));
    }
    scene.tick();

    let ids: Vec<EventId> = scene.buffer().snapshot().ids().collect();
    assert_eq!(ids.len(), DEFAULT_CAPACITY);
    assert_eq!(ids.first(), Some(&4));
    assert_eq!(ids.last(), Some(&104));

    assert_eq!(scene.particle_count(), DEFAULT_CAPACITY);
    for gone in 0..4 {
        assert!(scene.particle(gone).is_none(), "#{gone} should be destroyed");
    }
    assert!(scene.particle(104).is_some());
}

#[test]
fn survivors_keep_their_state_across_evictions() {
    let mut scene = PacketScene::seeded(SceneConfig::default(), 11).expect("valid config");
    for n in 0..DEFAULT_CAPACITY as u64 {
        scene.ingest(&socketio_frame(n, "UDP"));
    }
    scene.tick();
    let before = *scene.particle(50).expect("live");

    // One more packet evicts #0 and spawns exactly one new particle
    scene.ingest(&socketio_frame(999, "TCP"));
    scene.tick();

    assert!(scene.particle(0).is_none());
    let after = scene.particle(50).expect("still live");
    assert_eq!(after.position[0], before.position[0]);
    assert_eq!(after.position[1], before.position[1]);
    assert!((after.position[2] - (before.position[2] + 0.3)).abs() < 1e-4);
    assert_eq!(scene.stats().spawned, DEFAULT_CAPACITY as u64 + 1);
    assert_eq!(scene.stats().retired, 1);
}

#[test]
fn malformed_frames_change_nothing() {
    let mut scene = PacketScene::seeded(SceneConfig::default(), 3).expect("valid config");
    scene.ingest(&socketio_frame(1, "TCP"));
    scene.tick();
    let revision = scene.buffer().revision();

    let bad = [
        r#"{"src":"10.0.0.1","dst":"10.0.0.2","size":40}"#,
        r#"42["packet_data",{"src":"a","dst":"b","protocol":"TCP","size":-1}]"#,
        "{not json",
        r#"42["packet_data"]"#,
    ];
    for frame in bad {
        assert_eq!(scene.ingest(frame), Ingest::Rejected, "{frame}");
    }
    scene.tick();

    assert_eq!(scene.buffer().revision(), revision);
    assert_eq!(scene.buffer().len(), 1);
    assert_eq!(scene.particle_count(), 1);
    assert_eq!(scene.stats().rejected, bad.len() as u64);
}

#[test]
fn handshake_frames_are_ignored() {
    let mut scene = PacketScene::seeded(SceneConfig::default(), 5).expect("valid config");
    for frame in [r#"0{"sid":"abc","pingInterval":25000}"#, "40", "2", "3"] {
        assert_eq!(scene.ingest(frame), Ingest::Ignored, "{frame}");
    }
    assert!(scene.buffer().is_empty());
}

#[test]
fn particles_recycle_instead_of_disappearing() {
    let mut scene = PacketScene::seeded(SceneConfig::default(), 21).expect("valid config");
    for n in 0..20 {
        scene.ingest(&socketio_frame(n, if n % 2 == 0 { "TCP" } else { "OTHER" }));
    }

    // Far enough for every particle to pass the viewpoint at least once
    for _ in 0..400 {
        scene.tick();
        for p in scene.particles() {
            assert!(p.position[2] <= 5.0 + 1e-4);
        }
    }

    assert_eq!(scene.particle_count(), 20);
    assert!(scene.particles().all(|p| p.recycled >= 1));
    assert!(scene.stats().recycled >= 20);
}

#[test]
fn protocol_labels_map_to_colors() {
    let mut scene = PacketScene::seeded(SceneConfig::default(), 9).expect("valid config");
    let tcp = match scene.ingest(&socketio_frame(1, "tcp")) {
        Ingest::Appended(id) => id,
        other => panic!("unexpected {other:?}"),
    };
    let icmp = match scene.ingest(&socketio_frame(2, "ICMP")) {
        Ingest::Appended(id) => id,
        other => panic!("unexpected {other:?}"),
    };
    scene.tick();

    let tcp = scene.particle(tcp).expect("live");
    let icmp = scene.particle(icmp).expect("live");
    assert_eq!(protocol_color(tcp.protocol), (0x00, 0xcc, 0xff));
    assert_eq!(icmp.protocol, Protocol::Other);
    assert_eq!(protocol_color(icmp.protocol), (0x00, 0xff, 0x66));
}

#[test]
fn recycle_happens_on_the_21st_frame_from_minus_one() {
    let mut scene = PacketScene::seeded(SceneConfig::default(), 17).expect("valid config");
    let id = scene.push(packetlens::core::PacketMessage::new("a", "b", Protocol::Tcp, 1));
    scene.reconcile();

    // Place the particle at z = -1 and count frames until it is sent back
    let mut z_trace = Vec::new();
    let mut particle = *scene.particle(id).expect("live");
    particle.position[2] = -1.0;
    for _ in 0..21 {
        packetlens::core::frame::step(&mut particle, scene.config());
        z_trace.push(particle.position[2]);
    }
    assert!(z_trace[..20].iter().all(|z| *z <= 5.0));
    assert_eq!(z_trace[20], -50.0);
}

#[test]
fn inverted_spawn_window_is_refused() {
    let config = SceneConfig {
        spawn_depth_far: -10.0,
        spawn_depth_near: -20.0,
        ..SceneConfig::default()
    };
    assert!(PacketScene::seeded(config, 1).is_err());
}

#[test]
fn synthetic_feed_drives_the_scene() {
    let config = SceneConfig::from_json(r#"{"capacity": 16}"#).expect("valid config");
    let mut scene = PacketScene::seeded(config, 13).expect("valid config");
    let mut feed = SyntheticFeed::seeded(100.0, 13);

    for _ in 0..60 {
        for msg in feed.poll(1.0 / 60.0) {
            scene.push(msg);
        }
        scene.tick();
    }

    assert!(scene.stats().received >= 90);
    assert_eq!(scene.particle_count(), 16);
    assert_eq!(scene.buffer().capacity(), 16);
}
