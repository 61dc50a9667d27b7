//! Logic for loading the handler configuration.

use std::str::FromStr;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::services::web_graphql::Locale;

const DEFAULT_GRAPHQL_PATH: &str = "/graphql";
const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 2_000_000;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not parse configuration: {0}
    DeserializeConfigError(#[from] serde_yaml::Error),

    /// invalid configuration for {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// The configuration of a [`crate::GraphQlHttpHandler`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Where GraphQL requests are served.
    pub graphql: GraphQl,

    /// The locale of requests without a usable `Accept-Language` header.
    pub default_locale: Locale,

    /// Request limits.
    pub limits: Limits,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder(visibility = "pub")]
    fn new(
        graphql_path: Option<String>,
        default_locale: Option<Locale>,
        max_request_body_bytes: Option<usize>,
    ) -> Result<Self, ConfigurationError> {
        let configuration = Self {
            graphql: GraphQl {
                path: graphql_path.unwrap_or_else(default_graphql_path),
            },
            default_locale: default_locale.unwrap_or_default(),
            limits: Limits {
                max_request_body_bytes: max_request_body_bytes
                    .unwrap_or(DEFAULT_MAX_REQUEST_BODY_BYTES),
            },
        };
        configuration.validate()?;
        Ok(configuration)
    }
}

impl Configuration {
    /// Parse and validate a YAML (or JSON) configuration.
    pub fn from_yaml(raw_yaml: &str) -> Result<Self, ConfigurationError> {
        let configuration: Configuration = if raw_yaml.trim().is_empty() {
            Configuration::default()
        } else {
            serde_yaml::from_str(raw_yaml)?
        };
        configuration.validate()?;
        Ok(configuration)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.graphql.path.starts_with('/') {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "graphql.path",
                error: format!("'{}' must start with '/'", self.graphql.path),
            });
        }
        if let Err(error) = Locale::from_str(self.default_locale.as_str()) {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "default_locale",
                error,
            });
        }
        if self.limits.max_request_body_bytes == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "limits.max_request_body_bytes",
                error: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml(s)
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    schemars::schema_for!(Configuration)
}

/// GraphQL endpoint configuration.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct GraphQl {
    /// The path GraphQL requests are served on. Defaults to `/graphql`.
    pub path: String,
}

fn default_graphql_path() -> String {
    DEFAULT_GRAPHQL_PATH.to_string()
}

impl Default for GraphQl {
    fn default() -> Self {
        Self {
            path: default_graphql_path(),
        }
    }
}

/// Configuration for operational limits.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Limits {
    /// Limit the size of incoming HTTP requests read from the network,
    /// to protect against running out of memory. Default: 2000000 (2 MB)
    pub max_request_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_BYTES,
        }
    }
}
