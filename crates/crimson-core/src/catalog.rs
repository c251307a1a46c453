// ── Endpoint catalog ──
//
// Ordered, read-only set of endpoints supplied at startup. Cloning a
// `Catalog` is cheap; every clone shares the same entries.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Coordinates, Endpoint, EndpointId};
use crate::stream::EndpointFilter;

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Arc<IndexMap<EndpointId, Arc<Endpoint>>>,
    primary: Arc<Endpoint>,
}

impl Catalog {
    /// Build a catalog, preserving input order.
    ///
    /// Rejects an empty list, duplicate ids, load above 100, and
    /// coordinates outside the valid lat/lng range.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, CoreError> {
        let mut entries = IndexMap::with_capacity(endpoints.len());

        for endpoint in endpoints {
            if endpoint.id.as_str().is_empty() {
                return Err(invalid("endpoint id must not be empty"));
            }
            if endpoint.load > 100 {
                return Err(invalid(format!(
                    "endpoint {} has load {} (must be 0-100)",
                    endpoint.id, endpoint.load
                )));
            }
            if !endpoint.coordinates.is_valid() {
                return Err(invalid(format!(
                    "endpoint {} has out-of-range coordinates ({})",
                    endpoint.id, endpoint.coordinates
                )));
            }
            let id = endpoint.id.clone();
            if entries.insert(id.clone(), Arc::new(endpoint)).is_some() {
                return Err(invalid(format!("duplicate endpoint id {id}")));
            }
        }

        let primary = entries
            .values()
            .next()
            .cloned()
            .ok_or_else(|| invalid("catalog must contain at least one endpoint"))?;

        debug!(endpoints = entries.len(), "catalog loaded");
        Ok(Self {
            entries: Arc::new(entries),
            primary,
        })
    }

    /// The eight-location seed list the dashboard ships with.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::new(seed())
    }

    /// The default selection: the first entry.
    pub fn first(&self) -> &Arc<Endpoint> {
        &self.primary
    }

    pub fn get(&self, id: &EndpointId) -> Option<&Arc<Endpoint>> {
        self.entries.get(id)
    }

    /// Like [`get`](Self::get), but an unknown id is an error.
    pub fn require(&self, id: &EndpointId) -> Result<&Arc<Endpoint>, CoreError> {
        self.get(id).ok_or_else(|| CoreError::UnknownEndpoint {
            id: id.to_string(),
        })
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.entries.values()
    }

    /// All endpoints in catalog order.
    pub fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.entries.values().cloned().collect()
    }

    /// Endpoints matching `filter`, in catalog order.
    pub fn filter(&self, filter: &EndpointFilter) -> Vec<Arc<Endpoint>> {
        self.entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidCatalog {
        reason: reason.into(),
    }
}

// ── Seed data ────────────────────────────────────────────────────────

fn endpoint(
    id: &str,
    country: &str,
    city: &str,
    flag: &str,
    (load, latency_ms): (u8, u32),
    (lat, lng): (f64, f64),
) -> Endpoint {
    Endpoint {
        id: EndpointId::from(id),
        country: country.into(),
        city: city.into(),
        flag: flag.into(),
        load,
        latency_ms,
        coordinates: Coordinates::new(lat, lng),
        premium: false,
    }
}

fn new_york() -> Endpoint {
    endpoint("1", "United States", "New York", "🇺🇸", (45, 12), (40.7128, -74.0060))
}

fn seed() -> Vec<Endpoint> {
    vec![
        new_york(),
        endpoint("2", "Switzerland", "Zurich", "🇨🇭", (22, 45), (47.3769, 8.5417)),
        endpoint("3", "Japan", "Tokyo", "🇯🇵", (88, 120), (35.6762, 139.6503)),
        endpoint("4", "Germany", "Frankfurt", "🇩🇪", (31, 38), (50.1109, 8.6821)),
        endpoint("5", "Brazil", "São Paulo", "🇧🇷", (12, 15), (-23.5505, -46.6333)),
        endpoint("6", "Singapore", "Singapore", "🇸🇬", (56, 180), (1.3521, 103.8198)),
        endpoint("7", "United Kingdom", "London", "🇬🇧", (67, 25), (51.5074, -0.1278)),
        endpoint("8", "Australia", "Sydney", "🇦🇺", (15, 210), (-33.8688, 151.2093)),
    ]
}
