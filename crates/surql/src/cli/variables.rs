//! `surql variables`: dashboard variable lookup through the local transport.

use crate::cli::connect::{runtime, ConnectionArgs};
use crate::cli::input::read_json;
use crate::cli::output::print_json;
use anyhow::Result;
use surql_backend::{LocalTransport, QueryHandler, RecordedClient, SurrealClient};
use surql_datasource::{DataSource, NoTemplating, VariableLookup, VariableQueryOptions};
use surql_protocol::{ScopedVars, TimeRange};

#[derive(Debug)]
pub struct VariablesArgs {
    pub query_text: String,
    /// Recorded RPC result; a live connection is used when absent
    pub response: Option<String>,
    pub connection: ConnectionArgs,
    pub variable_id: String,
}

pub fn run(args: VariablesArgs) -> Result<()> {
    let rt = runtime()?;
    let lookup = match &args.response {
        Some(recorded) => {
            let client = RecordedClient::new(read_json(recorded)?);
            rt.block_on(resolve(client, &args.query_text, args.variable_id.clone()))
        }
        None => rt.block_on(async {
            let client = args.connection.connect().await?;
            anyhow::Ok(resolve(client, &args.query_text, args.variable_id.clone()).await)
        })?,
    };

    match lookup {
        Ok(choices) => print_json(&choices),
        Err(failure) => {
            print_json(&failure)?;
            let message = failure
                .first()
                .map(|value| value.text.clone())
                .unwrap_or_default();
            anyhow::bail!("variable lookup failed: {}", message)
        }
    }
}

async fn resolve<C: SurrealClient + 'static>(
    client: C,
    query_text: &str,
    variable_id: String,
) -> VariableLookup {
    let transport = LocalTransport::new(QueryHandler::new(client));
    let datasource = DataSource::new(transport, NoTemplating);
    let options = VariableQueryOptions {
        range: TimeRange::last(chrono::Duration::hours(1)),
        scoped_vars: ScopedVars::new(),
        variable_id,
    };
    datasource.metric_find_query(query_text, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use surql_protocol::MetricFindValue;

    #[tokio::test]
    async fn test_resolve_choices() {
        let client = RecordedClient::with_result(json!([{ "name": "eu" }, { "name": "us" }]));
        let lookup = resolve(client, "select name from region", "region".to_string()).await;
        assert_eq!(
            lookup,
            Ok(vec![MetricFindValue::new("eu"), MetricFindValue::new("us")])
        );
    }

    #[tokio::test]
    async fn test_resolve_statement_error() {
        let client = RecordedClient::new(json!([{ "status": "ERR", "time": "0ms", "result": "table missing" }]));
        let lookup = resolve(client, "select name from region", "region".to_string()).await;
        assert_eq!(
            lookup,
            Err(vec![MetricFindValue::new("Query failed: table missing")])
        );
    }

    #[test]
    fn test_run_recorded_failure_exits_with_error() {
        let args = VariablesArgs {
            query_text: "select name from region".to_string(),
            response: Some(r#"[{"status": "ERR", "time": "0ms", "result": "table missing"}]"#.to_string()),
            connection: ConnectionArgs::default(),
            variable_id: "region".to_string(),
        };
        let err = run(args).unwrap_err();
        assert_eq!(err.to_string(), "variable lookup failed: Query failed: table missing");
    }
}
