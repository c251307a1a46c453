//! Security advice for a single endpoint.

use serde::Serialize;

use crimson_core::{AdviceOrigin, AdviceState, Controller, EndpointId};

use crate::cli::{AdviseArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct AdviceReport {
    endpoint: EndpointId,
    location: String,
    origin: AdviceOrigin,
    advice: String,
}

fn detail(report: &AdviceReport, color: bool) -> String {
    format!(
        "{}\n\n{}\n\n({} advice)",
        output::heading(&report.location, color),
        report.advice,
        report.origin
    )
}

pub async fn handle(
    controller: &Controller,
    args: AdviseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let endpoint = util::resolve_endpoint(controller.catalog(), &args.id)?;
    controller.select(endpoint.id.clone()).await?;

    let spinner = util::spinner(&format!("Analyzing {}...", endpoint.city), global);
    let snapshot = controller.wait_for_advice(&endpoint.id).await;
    spinner.finish_and_clear();
    let snapshot = snapshot?;

    let AdviceState::Ready { text, origin, .. } = &snapshot.advice else {
        return Err(CliError::Internal("advice resolved without text".into()));
    };

    let report = AdviceReport {
        endpoint: endpoint.id.clone(),
        location: endpoint.location(),
        origin: *origin,
        advice: text.clone(),
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| detail(r, color),
        |r| r.advice.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
