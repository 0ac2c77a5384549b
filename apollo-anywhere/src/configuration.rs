//! Configuration of document parsing.

use std::str::FromStr;

use displaydoc::Display;
use schemars::gen::SchemaGenerator;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize configuration: {0}
    DeserializeConfigError(#[from] serde_yaml::Error),
}

/// The configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Limits applied when parsing documents
    pub parser: ParserLimits,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder]
    pub fn new(parser: Option<ParserLimits>) -> Self {
        Self {
            parser: parser.unwrap_or_default(),
        }
    }

    /// The JSON schema of the YAML configuration.
    pub fn json_schema() -> RootSchema {
        SchemaGenerator::default().into_root_schema_for::<Configuration>()
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let configuration: Configuration = serde_yaml::from_str(s)?;
        tracing::debug!(?configuration, "loaded configuration");
        Ok(configuration)
    }
}

/// Configuration options pertaining to the GraphQL parser.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ParserLimits {
    /// Maximum nesting of selection sets and values
    /// default: 4096
    #[serde(default = "default_parser_recursion_limit")]
    pub recursion_limit: usize,

    /// Maximum number of tokens in a document
    /// default: unlimited
    #[serde(default)]
    pub token_limit: Option<usize>,
}

#[buildstructor::buildstructor]
impl ParserLimits {
    #[builder]
    pub fn new(recursion_limit: Option<usize>, token_limit: Option<usize>) -> Self {
        Self {
            recursion_limit: recursion_limit.unwrap_or_else(default_parser_recursion_limit),
            token_limit,
        }
    }
}

impl Default for ParserLimits {
    fn default() -> Self {
        ParserLimits::builder().build()
    }
}

fn default_parser_recursion_limit() -> usize {
    // Protects against stack overflow but is still very high for "reasonable" queries.
    4096
}
