// ── Active session record ──
//
// Created the instant the phase becomes `Connected`, destroyed the
// instant it returns to `Disconnected`. Counters are derived from the
// synthetic rates, not measured.

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::endpoint::EndpointId;
use super::traffic::TrafficSample;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub endpoint_id: EndpointId,
    pub started_at: DateTime<Utc>,
    pub address: Ipv4Addr,
    pub uploaded_bytes: u64,
    pub downloaded_bytes: u64,
    /// Most recent upload rate in Mbps (0 until the first sample).
    pub upload_mbps: f64,
    /// Most recent download rate in Mbps (0 until the first sample).
    pub download_mbps: f64,
}

impl Session {
    pub fn open(endpoint_id: EndpointId, address: Ipv4Addr, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint_id,
            started_at,
            address,
            uploaded_bytes: 0,
            downloaded_bytes: 0,
            upload_mbps: 0.0,
            download_mbps: 0.0,
        }
    }

    /// Fold one sample covering `period` into the counters.
    pub fn record(&mut self, sample: &TrafficSample, period: Duration) {
        self.uploaded_bytes = self
            .uploaded_bytes
            .saturating_add(bytes_for(sample.upload_mbps, period));
        self.downloaded_bytes = self
            .downloaded_bytes
            .saturating_add(bytes_for(sample.download_mbps, period));
        self.upload_mbps = sample.upload_mbps;
        self.download_mbps = sample.download_mbps;
    }

    pub fn total_bytes(&self) -> u64 {
        self.uploaded_bytes.saturating_add(self.downloaded_bytes)
    }

    /// Time since the session opened, clamped at zero.
    pub fn uptime(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.started_at).max(TimeDelta::zero())
    }
}

/// Megabits per second sustained for `period`, in bytes.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn bytes_for(mbps: f64, period: Duration) -> u64 {
    (mbps.max(0.0) * 125_000.0 * period.as_secs_f64()).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::traffic::TrafficReading;

    fn session() -> Session {
        Session::open(
            EndpointId::from("2"),
            Ipv4Addr::new(185, 1, 2, 12),
            DateTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn opens_with_zero_counters() {
        let s = session();
        assert_eq!(s.uploaded_bytes, 0);
        assert_eq!(s.downloaded_bytes, 0);
        assert_eq!(s.total_bytes(), 0);
        assert_eq!(s.endpoint_id.as_str(), "2");
    }

    #[test]
    fn record_accumulates_bytes_and_keeps_last_rate() {
        let mut s = session();
        let reading = TrafficReading {
            upload_mbps: 2.0,
            download_mbps: 8.0,
        };
        let sample = TrafficSample::new(DateTime::UNIX_EPOCH, reading);
        s.record(&sample, Duration::from_secs(1));
        s.record(&sample, Duration::from_secs(1));

        assert_eq!(s.uploaded_bytes, 500_000);
        assert_eq!(s.downloaded_bytes, 2_000_000);
        assert!((s.download_mbps - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uptime_never_negative() {
        let s = session();
        let before = DateTime::UNIX_EPOCH - TimeDelta::seconds(5);
        assert_eq!(s.uptime(before), TimeDelta::zero());
        assert_eq!(s.uptime(DateTime::UNIX_EPOCH + TimeDelta::seconds(90)).num_seconds(), 90);
    }
}
