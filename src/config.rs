use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// The endpoint limits bound how many data-interface endpoints a single
/// deployable entity may reference per direction. The unclaim path relies on
/// at most one OUT endpoint per entity per data source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_endpoint_limit")]
    pub max_in_endpoints: usize,
    #[serde(default = "default_endpoint_limit")]
    pub max_out_endpoints: usize,
}

fn default_database_url() -> String {
    "sqlite://edgescope.db?mode=rwc".to_string()
}

fn default_endpoint_limit() -> usize {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_in_endpoints: default_endpoint_limit(),
            max_out_endpoints: default_endpoint_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_in_endpoints, 1);
        assert_eq!(config.max_out_endpoints, 1);
        assert!(config.database_url.starts_with("sqlite://"));
    }

    #[test]
    fn test_deserialization_with_partial_fields() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"max_out_endpoints": 2}"#).unwrap();
        assert_eq!(config.max_out_endpoints, 2);
        assert_eq!(config.max_in_endpoints, 1);
    }
}
