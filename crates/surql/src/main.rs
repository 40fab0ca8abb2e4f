//! surql command-line driver
//!
//! Runs the datasource pipeline against recorded SurrealDB responses or a
//! live database:
//! - `plan`: how the editor sees a saved query
//! - `run`: backend execution into data frames
//! - `variables`: dashboard variable lookup end to end
//! - `health`: connection and signin check

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::connect::ConnectionArgs;
use std::process::ExitCode;
use surql_logging::LogConfig;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "surql", about = "SurrealQL datasource pipeline driver")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Only log errors to stderr
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show field visibility, runnability and the request target of a query
    Plan {
        /// Saved query: inline JSON or a path to a JSON file
        #[arg(long, env = "SURQL_QUERY")]
        query: String,
    },

    /// Execute a query against a recorded response or a live database
    Run {
        /// Saved query: inline JSON or a path to a JSON file
        #[arg(long, env = "SURQL_QUERY")]
        query: String,

        /// Recorded RPC result: inline JSON or a path to a JSON file.
        /// Without it the query runs against the configured database.
        #[arg(long, env = "SURQL_RESPONSE")]
        response: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,

        /// Range start (RFC 3339), defaults to one hour before --to
        #[arg(long)]
        from: Option<String>,

        /// Range end (RFC 3339), defaults to now
        #[arg(long)]
        to: Option<String>,

        /// Query interval (e.g. 30s, 1m30s)
        #[arg(long, env = "SURQL_INTERVAL", default_value = "1s")]
        interval: String,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a dashboard variable against a recorded response or a live database
    Variables {
        /// Variable query text
        #[arg(long)]
        query_text: String,

        /// Recorded RPC result: inline JSON or a path to a JSON file.
        /// Without it the lookup runs against the configured database.
        #[arg(long, env = "SURQL_RESPONSE")]
        response: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,

        /// Variable identifier used as the request id
        #[arg(long, default_value = "variable")]
        variable_id: String,
    },

    /// Connect to the configured database and run the health check
    Health {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan { query } => cli::plan::run(cli::plan::PlanArgs { query }),
        Commands::Run {
            query,
            response,
            connection,
            from,
            to,
            interval,
            json,
        } => cli::run::run(cli::run::RunArgs {
            query,
            response,
            connection,
            from,
            to,
            interval,
            json,
        }),
        Commands::Variables {
            query_text,
            response,
            connection,
            variable_id,
        } => cli::variables::run(cli::variables::VariablesArgs {
            query_text,
            response,
            connection,
            variable_id,
        }),
        Commands::Health { connection } => cli::health::run(cli::health::HealthArgs { connection }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match surql_logging::init_logging(LogConfig {
        app_name: "surql",
        verbose: cli.verbose,
        quiet: cli.quiet,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:#}", err);
            None
        }
    };

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
