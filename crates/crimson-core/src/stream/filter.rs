// ── Filter predicates for the endpoint catalog ──
//
// Used by the CLI to narrow `servers list` without touching the catalog.

use crate::model::Endpoint;

/// Filter predicate for endpoints.
pub enum EndpointFilter {
    All,
    /// Case-insensitive exact country match.
    Country(String),
    /// Case-insensitive substring of city or country.
    Search(String),
    MaxLoad(u8),
    MaxLatency(u32),
    Premium(bool),
    /// Every inner filter must match.
    Every(Vec<EndpointFilter>),
    Custom(Box<dyn Fn(&Endpoint) -> bool + Send + Sync>),
}

impl EndpointFilter {
    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        match self {
            Self::All => true,
            Self::Country(c) => endpoint.country.eq_ignore_ascii_case(c.trim()),
            Self::Search(term) => {
                let term = term.trim().to_lowercase();
                endpoint.city.to_lowercase().contains(&term)
                    || endpoint.country.to_lowercase().contains(&term)
            }
            Self::MaxLoad(max) => endpoint.load <= *max,
            Self::MaxLatency(max) => endpoint.latency_ms <= *max,
            Self::Premium(p) => endpoint.premium == *p,
            Self::Every(filters) => filters.iter().all(|f| f.matches(endpoint)),
            Self::Custom(f) => f(endpoint),
        }
    }
}
