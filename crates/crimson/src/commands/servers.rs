//! Endpoint catalog handlers.

use std::sync::Arc;

use tabled::Tabled;

use crimson_core::{Catalog, Endpoint, EndpointFilter};

use crate::cli::{GlobalOpts, ServerListArgs, ServersArgs, ServersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Load")]
    load: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

impl From<&Arc<Endpoint>> for ServerRow {
    fn from(e: &Arc<Endpoint>) -> Self {
        let location = if e.flag.is_empty() {
            e.location()
        } else {
            format!("{} {}", e.flag, e.location())
        };
        Self {
            id: e.id.to_string(),
            location,
            load: format!("{}%", e.load),
            latency: format!("{} ms", e.latency_ms),
        }
    }
}

fn detail(e: &Arc<Endpoint>) -> String {
    output::detail_block(&[
        ("ID", e.id.to_string()),
        ("City", e.city.clone()),
        ("Country", e.country.clone()),
        ("Load", format!("{}%", e.load)),
        ("Latency", format!("{} ms", e.latency_ms)),
        ("Coordinates", e.coordinates.to_string()),
        ("Premium", if e.premium { "yes" } else { "no" }.into()),
    ])
}

/// Combine the list flags into one filter; no flags means everything.
fn build_filter(args: &ServerListArgs) -> EndpointFilter {
    let mut filters = Vec::new();
    if let Some(ref term) = args.search {
        filters.push(EndpointFilter::Search(term.clone()));
    }
    if let Some(ref country) = args.country {
        filters.push(EndpointFilter::Country(country.clone()));
    }
    if let Some(load) = args.max_load {
        filters.push(EndpointFilter::MaxLoad(load));
    }
    if let Some(ms) = args.max_latency {
        filters.push(EndpointFilter::MaxLatency(ms));
    }

    match filters.len() {
        0 => EndpointFilter::All,
        1 => filters.remove(0),
        _ => EndpointFilter::Every(filters),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(catalog: &Catalog, args: ServersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ServersCommand::List(list) => {
            let endpoints = catalog.filter(&build_filter(&list));
            tracing::debug!(matched = endpoints.len(), total = catalog.len(), "servers filtered");
            let out = output::render_list(
                global.output,
                &endpoints,
                |e| ServerRow::from(e),
                |e| e.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ServersCommand::Show { id } => {
            let endpoint = util::resolve_endpoint(catalog, &id)?;
            let out = output::render_single(global.output, &endpoint, detail, |e| e.location())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ids(filter: &EndpointFilter) -> Vec<String> {
        Catalog::builtin().unwrap()
            .filter(filter)
            .iter()
            .map(|e| e.id.to_string())
            .collect()
    }

    #[test]
    fn no_flags_lists_everything() {
        let filter = build_filter(&ServerListArgs::default());
        assert!(matches!(filter, EndpointFilter::All));
        assert_eq!(ids(&filter).len(), 8);
    }

    #[test]
    fn flags_combine_with_and() {
        let filter = build_filter(&ServerListArgs {
            max_load: Some(40),
            max_latency: Some(50),
            ..ServerListArgs::default()
        });
        assert_eq!(ids(&filter), ["2", "4", "5"]);
    }

    #[test]
    fn search_matches_country_text() {
        let filter = build_filter(&ServerListArgs {
            search: Some("united".into()),
            ..ServerListArgs::default()
        });
        assert_eq!(ids(&filter), ["1", "7"]);
    }
}
