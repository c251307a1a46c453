// ── Traffic sampling capability ──
//
// Everything random about a session sits behind `TrafficSource`, so a
// real measurement pipeline can replace `SyntheticTraffic` without the
// controller noticing.

use std::net::Ipv4Addr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{RateRange, TrafficProfile};
use crate::model::{Endpoint, TrafficReading};

/// Source of session addresses and bandwidth readings.
pub trait TrafficSource: Send {
    /// Address handed out when a session opens against `endpoint`.
    fn assign_address(&mut self, endpoint: &Endpoint) -> Ipv4Addr;

    /// One bandwidth reading. Called once per sampling period while connected.
    fn sample(&mut self) -> TrafficReading;
}

/// Uniformly random readings within a `TrafficProfile`.
#[derive(Debug)]
pub struct SyntheticTraffic {
    rng: StdRng,
    profile: TrafficProfile,
}

impl SyntheticTraffic {
    pub fn new(profile: TrafficProfile) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            profile,
        }
    }

    /// Deterministic sequence for tests and reproducible demos.
    pub fn seeded(seed: u64, profile: TrafficProfile) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            profile,
        }
    }

    fn draw(&mut self, range: RateRange) -> f64 {
        if range.max <= range.min {
            return range.min;
        }
        self.rng.gen_range(range.min..range.max)
    }
}

impl Default for SyntheticTraffic {
    fn default() -> Self {
        Self::new(TrafficProfile::default())
    }
}

impl TrafficSource for SyntheticTraffic {
    /// `185.x.y.12`, fresh per connection.
    fn assign_address(&mut self, _endpoint: &Endpoint) -> Ipv4Addr {
        Ipv4Addr::new(185, self.rng.gen_range(0..255), self.rng.gen_range(0..255), 12)
    }

    fn sample(&mut self) -> TrafficReading {
        let upload_mbps = self.draw(self.profile.upload_mbps);
        let download_mbps = self.draw(self.profile.download_mbps);
        TrafficReading {
            upload_mbps,
            download_mbps,
        }
    }
}
