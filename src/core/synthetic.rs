//! Synthetic traffic for running without a capture backend
//!
//! Produces packets at a mean rate with a typical desktop mix:
//! mostly TCP, some UDP, a little of everything else.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{PacketMessage, Protocol};

/// Env var enabling the synthetic feed in the hosts
pub const DEMO_ENV: &str = "PACKETLENS_DEMO";

/// Upper bound on packets produced by a single poll (e.g. after a stall)
const MAX_BURST: usize = 1_000;
/// Longest gap in seconds a single poll accounts for
const MAX_ELAPSED: f64 = 60.0;

const REMOTE_HOSTS: &[&str] = &[
    "1.1.1.1",
    "8.8.8.8",
    "140.82.112.3",
    "151.101.1.69",
    "172.217.16.142",
    "52.84.150.11",
];

pub struct SyntheticFeed {
    rng: SmallRng,
    /// Mean packets per second
    rate: f64,
    /// Fractional packet owed from previous polls
    carry: f64,
}

impl SyntheticFeed {
    pub const DEFAULT_RATE: f64 = 40.0;

    pub fn new(rate: f64) -> Self {
        Self::with_rng(rate, SmallRng::from_entropy())
    }

    pub fn seeded(rate: f64, seed: u64) -> Self {
        Self::with_rng(rate, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rate: f64, rng: SmallRng) -> Self {
        Self {
            rng,
            rate: if rate.is_finite() { rate.max(0.0) } else { 0.0 },
            carry: 0.0,
        }
    }

    /// Whether the demo feed was requested through the environment
    pub fn requested() -> bool {
        std::env::var(DEMO_ENV).is_ok_and(|v| !v.is_empty() && v != "0")
    }

    /// Packets due after `elapsed` seconds
    pub fn poll(&mut self, elapsed: f64) -> Vec<PacketMessage> {
        let elapsed = if elapsed.is_nan() { 0.0 } else { elapsed.clamp(0.0, MAX_ELAPSED) };
        if !self.carry.is_finite() {
            self.carry = 0.0;
        }
        let due = self.rate * elapsed + self.carry;
        let count = due.floor();
        self.carry = due - count;
        let count = (count as usize).min(MAX_BURST);
        (0..count).map(|_| self.packet()).collect()
    }

    fn packet(&mut self) -> PacketMessage {
        let roll: f32 = self.rng.gen();
        let (protocol, size) = if roll < 0.70 {
            (Protocol::Tcp, self.rng.gen_range(54..=1514))
        } else if roll < 0.95 {
            (Protocol::Udp, self.rng.gen_range(60..=1280))
        } else {
            (Protocol::Other, self.rng.gen_range(28..=98))
        };

        let local = format!("192.168.1.{}", self.rng.gen_range(2..=254));
        let remote = REMOTE_HOSTS[self.rng.gen_range(0..REMOTE_HOSTS.len())].to_string();
        let (source, destination) = if self.rng.gen_bool(0.5) {
            (local, remote)
        } else {
            (remote, local)
        };

        PacketMessage::new(source, destination, protocol, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_matches_rate() {
        let mut feed = SyntheticFeed::seeded(40.0, 1);
        assert_eq!(feed.poll(1.0).len(), 40);
        assert_eq!(feed.poll(0.5).len(), 20);
    }

    #[test]
    fn test_fractional_rate_carries_over() {
        let mut feed = SyntheticFeed::seeded(40.0, 2);
        let total: usize = (0..3).map(|_| feed.poll(0.01).len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_burst_is_capped() {
        let mut feed = SyntheticFeed::seeded(1_000.0, 3);
        assert_eq!(feed.poll(3_600.0).len(), MAX_BURST);
    }

    #[test]
    fn test_packets_are_plausible() {
        let mut feed = SyntheticFeed::seeded(500.0, 4);
        let packets = feed.poll(1.0);
        assert!(packets.iter().any(|p| p.protocol == Protocol::Tcp));
        assert!(packets.iter().any(|p| p.protocol == Protocol::Udp));
        for p in &packets {
            assert!(p.size >= 28 && p.size <= 1514);
            assert!(p.source.starts_with("192.168.1.") || p.destination.starts_with("192.168.1."));
        }
    }

    #[test]
    fn test_negative_elapsed_produces_nothing() {
        let mut feed = SyntheticFeed::seeded(40.0, 5);
        assert!(feed.poll(-1.0).is_empty());
    }

    #[test]
    fn test_unbounded_elapsed_does_not_stall_the_feed() {
        let mut feed = SyntheticFeed::seeded(40.0, 6);
        assert_eq!(feed.poll(f64::INFINITY).len(), MAX_BURST);
        assert_eq!(feed.poll(1.0).len(), 40);

        assert!(feed.poll(f64::NAN).is_empty());
        assert_eq!(feed.poll(1.0).len(), 40);
    }

    #[test]
    fn test_non_finite_rate_is_silent() {
        let mut feed = SyntheticFeed::seeded(f64::INFINITY, 7);
        assert!(feed.poll(1.0).is_empty());
        let mut feed = SyntheticFeed::seeded(f64::NAN, 7);
        assert!(feed.poll(1.0).is_empty());
    }
}
