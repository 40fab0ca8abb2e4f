//! `surql plan`: what the editor makes of a saved query.

use crate::cli::input::read_json;
use crate::cli::output::print_json;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use surql_datasource::{build_request_target, is_runnable};
use surql_protocol::Query;

#[derive(Debug)]
pub struct PlanArgs {
    pub query: String,
}

pub fn run(args: PlanArgs) -> Result<()> {
    let query: Query = serde_json::from_value(read_json(&args.query)?)
        .context("Failed to decode saved query")?;
    print_json(&plan(&query)?)
}

/// Mode, visible optional fields, runnability and the dispatched target.
pub fn plan(query: &Query) -> Result<Value> {
    let visibility = query.visibility();
    let fields: Vec<&str> = visibility.fields().iter().map(|f| f.as_str()).collect();
    Ok(json!({
        "mode": query.mode,
        "visualisation": query.mode.preferred_visualisation(),
        "visibleFields": fields,
        "runnable": is_runnable(query),
        "target": serde_json::to_value(build_request_target(query))?,
    }))
}
