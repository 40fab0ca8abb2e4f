//! Datasource instance configuration.

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options stored with a datasource instance, as the host persists them.
/// Empty strings mean "use the default".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceOptions {
    #[serde(default)]
    pub location: String,
    #[serde(rename = "nameaddr", default)]
    pub namespace: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub username: String,
}

/// Resolved connection settings for one datasource instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceConfig {
    /// `host:port` of the SurrealDB endpoint
    pub location: String,
    pub namespace: String,
    pub database: String,
    /// Record-access scope; signin omits `SC` when unset
    pub scope: Option<String>,
    pub username: String,
    pub password: String,
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            location: defaults::DEFAULT_LOCATION.to_string(),
            namespace: defaults::DEFAULT_NAMESPACE.to_string(),
            database: defaults::DEFAULT_DATABASE.to_string(),
            scope: None,
            username: defaults::DEFAULT_USERNAME.to_string(),
            password: defaults::DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl DatasourceConfig {
    /// Overlay non-empty options and the decrypted secure map onto defaults.
    pub fn resolve(options: &DatasourceOptions, secure: &BTreeMap<String, String>) -> Self {
        let mut config = Self::default();
        if !options.location.is_empty() {
            config.location = options.location.clone();
        }
        if !options.namespace.is_empty() {
            config.namespace = options.namespace.clone();
        }
        if !options.database.is_empty() {
            config.database = options.database.clone();
        }
        if !options.scope.is_empty() {
            config.scope = Some(options.scope.clone());
        }
        if !options.username.is_empty() {
            config.username = options.username.clone();
        }
        if let Some(password) = secure.get("password").filter(|p| !p.is_empty()) {
            config.password = password.clone();
        }
        config
    }

    /// WebSocket RPC endpoint.
    pub fn rpc_url(&self) -> String {
        format!("ws://{}/rpc", self.location)
    }

    /// Parameters for the RPC `signin` call.
    pub fn signin_params(&self) -> serde_json::Value {
        let mut params = serde_json::Map::new();
        params.insert("NS".to_string(), self.namespace.clone().into());
        params.insert("DB".to_string(), self.database.clone().into());
        params.insert("user".to_string(), self.username.clone().into());
        params.insert("pass".to_string(), self.password.clone().into());
        if let Some(scope) = &self.scope {
            params.insert("SC".to_string(), scope.clone().into());
        }
        serde_json::Value::Object(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_uses_defaults_for_empty_options() {
        let options: DatasourceOptions = serde_json::from_value(json!({})).unwrap();
        let config = DatasourceConfig::resolve(&options, &BTreeMap::new());
        assert_eq!(config, DatasourceConfig::default());
        assert_eq!(config.rpc_url(), "ws://localhost:8000/rpc");
        assert!(config.signin_params().get("SC").is_none());
    }

    #[test]
    fn test_resolve_overlays_options_and_password() {
        let options: DatasourceOptions = serde_json::from_value(json!({
            "location": "db:8000",
            "nameaddr": "prod",
            "database": "metrics",
            "scope": "viewer",
            "username": "grafana"
        }))
        .unwrap();
        let secure = BTreeMap::from([("password".to_string(), "s3cret".to_string())]);
        let config = DatasourceConfig::resolve(&options, &secure);

        assert_eq!(config.namespace, "prod");
        assert_eq!(config.password, "s3cret");
        assert_eq!(
            config.signin_params(),
            json!({"NS": "prod", "DB": "metrics", "user": "grafana", "pass": "s3cret", "SC": "viewer"})
        );
    }
}
