//! `surql health`: connect, sign in and run the health check.

use crate::cli::connect::{runtime, ConnectionArgs};
use anyhow::Result;
use surql_backend::handler::HEALTH_ERROR_PREFIX;
use surql_backend::{HealthCheckResult, HealthStatus, QueryHandler};

#[derive(Debug)]
pub struct HealthArgs {
    pub connection: ConnectionArgs,
}

pub fn run(args: HealthArgs) -> Result<()> {
    let health = runtime()?.block_on(async {
        match args.connection.connect().await {
            Ok(client) => QueryHandler::new(client).check_health().await,
            // a failed signin is an unhealthy datasource, not a CLI failure
            Err(err) => HealthCheckResult {
                status: HealthStatus::Error,
                message: format!("{}{:#}", HEALTH_ERROR_PREFIX, err),
            },
        }
    });

    println!("{}", health.message);
    anyhow::ensure!(health.status == HealthStatus::Ok, "health check failed");
    Ok(())
}
