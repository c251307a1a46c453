//! Advisor-picked endpoint.

use std::sync::Arc;

use serde::Serialize;

use crimson_core::{AdviceOrigin, Controller, Endpoint};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct RecommendationReport {
    endpoint: Arc<Endpoint>,
    reasoning: String,
    origin: AdviceOrigin,
}

fn detail(report: &RecommendationReport, color: bool) -> String {
    let e = &report.endpoint;
    let title = format!("Recommended: {} (id {})", e.location(), e.id);
    format!(
        "{}\n{}\n\n{}",
        output::heading(&title, color),
        output::detail_block(&[
            ("Load", format!("{}%", e.load)),
            ("Latency", format!("{} ms", e.latency_ms)),
        ]),
        report.reasoning
    )
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = util::spinner("Comparing endpoints...", global);
    let pick = controller.recommend().await;
    spinner.finish_and_clear();

    // recommend() only ever returns catalog members
    let endpoint = util::resolve_endpoint(controller.catalog(), pick.endpoint_id.as_str())?;
    let report = RecommendationReport {
        endpoint,
        reasoning: pick.reasoning,
        origin: pick.origin,
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| detail(r, color),
        |r| r.endpoint.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
