//! `surql run`: execute one saved query against a recorded response or a
//! live database.

use crate::cli::connect::{runtime, ConnectionArgs};
use crate::cli::input::{interval, read_json, time_range};
use crate::cli::output::{print_frame, print_json};
use anyhow::Result;
use chrono::Utc;
use surql_backend::{
    BackendQuery, QueryDataRequest, QueryDataResponse, QueryHandler, RecordedClient,
};
use tracing::info;

const DEFAULT_REF_ID: &str = "A";

#[derive(Debug)]
pub struct RunArgs {
    pub query: String,
    /// Recorded RPC result; a live connection is used when absent
    pub response: Option<String>,
    pub connection: ConnectionArgs,
    pub from: Option<String>,
    pub to: Option<String>,
    pub interval: String,
    pub json: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let query = read_json(&args.query)?;
    let range = time_range(args.from.as_deref(), args.to.as_deref(), Utc::now())?;
    let interval = interval(&args.interval)?;

    let ref_id = query
        .get("refId")
        .and_then(|value| value.as_str())
        .filter(|ref_id| !ref_id.is_empty())
        .unwrap_or(DEFAULT_REF_ID)
        .to_string();
    let request = QueryDataRequest {
        queries: vec![BackendQuery::new(ref_id, query, range, interval)],
    };

    let response = match &args.response {
        Some(recorded) => {
            let handler = QueryHandler::new(RecordedClient::new(read_json(recorded)?));
            let response = runtime()?.block_on(handler.query_data(request));
            info!(executed = ?handler.client().executed(), "recorded client received");
            response
        }
        None => runtime()?.block_on(async {
            let handler = QueryHandler::new(args.connection.connect().await?);
            anyhow::Ok(handler.query_data(request).await)
        })?,
    };

    if args.json {
        print_json(&response)?;
    } else {
        print_response(&response);
    }

    let failed = failures(&response);
    anyhow::ensure!(failed.is_empty(), "query failed: {}", failed.join("; "));
    Ok(())
}

fn print_response(response: &QueryDataResponse) {
    for (ref_id, result) in &response.responses {
        if let Some(error) = &result.error {
            println!("{}: {}", ref_id, error);
            continue;
        }
        if result.frames.is_empty() {
            println!("{}: no frames", ref_id);
        }
        for frame in &result.frames {
            print_frame(frame);
        }
    }
}

fn failures(response: &QueryDataResponse) -> Vec<String> {
    response
        .responses
        .iter()
        .filter_map(|(ref_id, result)| {
            result
                .error
                .as_ref()
                .map(|error| format!("{}: {}", ref_id, error))
        })
        .collect()
}
