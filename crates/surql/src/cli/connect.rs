//! Live SurrealDB connection options shared by the subcommands.

use crate::cli::input::read_json;
use anyhow::{Context, Result};
use clap::Args;
use std::collections::BTreeMap;
use surql_backend::WsClient;
use surql_protocol::{DatasourceConfig, DatasourceOptions};

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Datasource options (location, nameaddr, database, scope, username):
    /// inline JSON or a path to a JSON file
    #[arg(long, env = "SURQL_DATASOURCE")]
    pub datasource: Option<String>,

    /// SurrealDB password
    #[arg(long, env = "SURQL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    /// Options overlaid on the defaults; the password travels separately.
    pub fn config(&self) -> Result<DatasourceConfig> {
        let options: DatasourceOptions = match &self.datasource {
            Some(arg) => serde_json::from_value(read_json(arg)?)
                .context("Failed to decode datasource options")?,
            None => DatasourceOptions::default(),
        };
        let mut secure = BTreeMap::new();
        if let Some(password) = &self.password {
            secure.insert("password".to_string(), password.clone());
        }
        Ok(DatasourceConfig::resolve(&options, &secure))
    }

    pub async fn connect(&self) -> Result<WsClient> {
        let config = self.config()?;
        WsClient::connect(&config)
            .await
            .with_context(|| format!("Failed to connect to {}", config.rpc_url()))
    }
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_overlays_options_and_password() {
        let args = ConnectionArgs {
            datasource: Some(r#"{"location": "db.internal:8000", "nameaddr": "ops", "scope": "viewer"}"#.to_string()),
            password: Some("hunter2".to_string()),
        };
        let config = args.config().unwrap();
        assert_eq!(config.rpc_url(), "ws://db.internal:8000/rpc");
        assert_eq!(config.namespace, "ops");
        assert_eq!(config.database, "default");
        assert_eq!(config.scope.as_deref(), Some("viewer"));
        assert_eq!(config.password, "hunter2");
    }

    #[test]
    fn test_config_defaults() {
        let config = ConnectionArgs::default().config().unwrap();
        assert_eq!(config, DatasourceConfig::default());
    }
}
