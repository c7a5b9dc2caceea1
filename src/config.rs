//! Configuration loading and validation.
//!
//! The raw [`Config`] maps directly to the YAML schema. [`Config::into_mappers`]
//! validates it and produces the ordered [`ResponseMappers`] list, failing as
//! a whole if any part of the configuration is unusable.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::registry::{self, FailureRule, LOCAL_REPLY_BODY};
use crate::selector::{
    DEFAULT_EXT_AUTHZ_KEY, DEFAULT_EXT_AUTHZ_NAMESPACE, DEFAULT_EXT_AUTHZ_SENTINEL,
    EXT_AUTHZ_DENIED_FLAG, ExtAuthzMatch,
};
use crate::{MapperError, ResponseMappers, Result};

/// Pattern for dotted filter namespaces such as `envoy.filters.http.ext_authz`.
const NAMESPACE_PATTERN: &str = r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)*$";

/// Pattern for dynamic metadata keys.
const METADATA_KEY_PATTERN: &str = r"^[A-Za-z0-9_.\-]+$";

/// Raw configuration as deserialized from the YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Settings for the authorization-denial predicate.
    #[serde(default)]
    pub ext_authz: ExtAuthzConfig,
    /// Describe transport failures with the proxy's `%LOCAL_REPLY_BODY%`
    /// instead of a fixed description (default: `true`).
    #[serde(default = "default_use_local_reply_body")]
    pub use_local_reply_body: bool,
    /// Single-flag rules replacing the built-in table. When empty, the
    /// built-in table is used. The authorization-denial rule is always
    /// appended last.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_use_local_reply_body() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ext_authz: ExtAuthzConfig::default(),
            use_local_reply_body: default_use_local_reply_body(),
            rules: Vec::new(),
        }
    }
}

/// Authorization-denial predicate settings. Every field falls back to the
/// built-in default when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtAuthzConfig {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub sentinel: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
}

/// A single-flag rule as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleConfig {
    pub status_code: u16,
    pub error_code: i32,
    pub message: String,
    /// Defaults to `%LOCAL_REPLY_BODY%` or, when that is disabled, to the
    /// message.
    #[serde(default)]
    pub description: Option<String>,
    pub flag: String,
}

impl ExtAuthzConfig {
    /// Validates the names and fills in defaults.
    pub fn to_match(&self) -> Result<ExtAuthzMatch> {
        let namespace = self
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_EXT_AUTHZ_NAMESPACE);
        let key = self.key.as_deref().unwrap_or(DEFAULT_EXT_AUTHZ_KEY);

        if !Regex::new(NAMESPACE_PATTERN)?.is_match(namespace) {
            return Err(MapperError::Config(format!(
                "invalid ext_authz namespace \"{namespace}\""
            )));
        }
        if !Regex::new(METADATA_KEY_PATTERN)?.is_match(key) {
            return Err(MapperError::Config(format!(
                "invalid ext_authz metadata key \"{key}\""
            )));
        }

        Ok(ExtAuthzMatch {
            namespace: namespace.to_owned(),
            key: key.to_owned(),
            sentinel: self
                .sentinel
                .clone()
                .unwrap_or_else(|| DEFAULT_EXT_AUTHZ_SENTINEL.into()),
            flag: self
                .flag
                .clone()
                .unwrap_or_else(|| EXT_AUTHZ_DENIED_FLAG.into()),
        })
    }
}

impl RuleConfig {
    fn into_rule(self, use_local_reply_body: bool) -> FailureRule {
        let description = self.description.unwrap_or_else(|| {
            if use_local_reply_body {
                LOCAL_REPLY_BODY.into()
            } else {
                self.message.clone()
            }
        });
        FailureRule::flag(
            self.status_code,
            self.error_code,
            self.message,
            description,
            self.flag,
        )
    }
}

impl Config {
    /// Loads configuration from a YAML file at the given path.
    ///
    /// Returns a [`MapperError::Config`] if the file cannot be opened or
    /// its contents fail YAML deserialization.
    pub fn load_from_file(file_path: &(impl AsRef<Path> + ?Sized)) -> Result<Self> {
        let file = std::fs::File::open(file_path).map_err(|e| {
            MapperError::Config(format!(
                "failed to open {}: {e}",
                file_path.as_ref().display()
            ))
        })?;

        serde_yaml::from_reader(file)
            .map_err(|e| MapperError::Config(format!("failed to parse config: {e}")))
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| MapperError::Config(format!("failed to parse config: {e}")))
    }

    /// Assembles the full rule table: configured or built-in single-flag
    /// rules followed by the authorization-denial rule.
    pub fn rules(&self) -> Result<Vec<FailureRule>> {
        let ext_authz = self.ext_authz.to_match()?;

        let mut rules = if self.rules.is_empty() {
            registry::flag_rules(self.use_local_reply_body)
        } else {
            self.rules
                .iter()
                .cloned()
                .map(|r| r.into_rule(self.use_local_reply_body))
                .collect()
        };
        rules.push(registry::authorization_denied_rule(&ext_authz));
        Ok(rules)
    }

    /// Validates the configuration and builds the ordered mapper list.
    pub fn into_mappers(self) -> Result<ResponseMappers> {
        ResponseMappers::build(&self.rules()?)
    }
}
