// ── Endpoint identity and metadata ──
//
// An endpoint is one candidate server location. Endpoints are immutable
// for the lifetime of the process; the catalog hands them out as `Arc`s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── EndpointId ──────────────────────────────────────────────────────

/// Opaque catalog identifier (`"1"`, `"zrh-02"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EndpointId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<String> for EndpointId {
    fn from(s: String) -> Self {
        Self(s.trim().to_owned())
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_owned())
    }
}

// ── Coordinates ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

// ── Endpoint ────────────────────────────────────────────────────────

/// A candidate VPN server location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: EndpointId,
    pub country: String,
    pub city: String,
    /// Regional indicator emoji, purely cosmetic.
    #[serde(default)]
    pub flag: String,
    /// Current load, 0-100.
    pub load: u8,
    #[serde(alias = "latency")]
    pub latency_ms: u32,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub premium: bool,
}

impl Endpoint {
    /// `City, Country`
    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}
