//! Serialization of response mappers into the proxy's connection manager
//! configuration.
//!
//! The output is the `local_reply_config` block of the HTTP connection
//! manager. Mappers keep their order; the body override is emitted as a
//! `json_format` object whose keys stay in `code`, `message`, `description`
//! order.

use serde::Serialize;

use crate::Result;
use crate::mapper::{ErrorBody, ResponseArtifact, ResponseMappers};
use crate::selector::{MetadataSelector, Selector};

/// The `local_reply_config` block.
#[derive(Debug, Serialize)]
pub struct LocalReplyConfig<'a> {
    pub mappers: Vec<Mapper<'a>>,
}

/// One entry of `local_reply_config.mappers`.
#[derive(Debug, Serialize)]
pub struct Mapper<'a> {
    pub filter: AccessLogFilter<'a>,
    pub status_code: u16,
    pub body_format_override: BodyFormat<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLogFilter<'a> {
    ResponseFlagFilter {
        flags: Vec<&'a str>,
    },
    MetadataFilter {
        matcher: MetadataMatcher<'a>,
        match_if_key_not_found: bool,
    },
    AndFilter {
        filters: Vec<AccessLogFilter<'a>>,
    },
}

/// Metadata matcher. `invert` makes the matcher succeed when the value
/// differs from the sentinel.
#[derive(Debug, Serialize)]
pub struct MetadataMatcher<'a> {
    pub filter: &'a str,
    pub path: Vec<PathSegment<'a>>,
    pub value: ValueMatcher<'a>,
    pub invert: bool,
}

#[derive(Debug, Serialize)]
pub struct PathSegment<'a> {
    pub key: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ValueMatcher<'a> {
    pub string_match: StringMatcher<'a>,
}

#[derive(Debug, Serialize)]
pub struct StringMatcher<'a> {
    pub exact: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BodyFormat<'a> {
    pub json_format: &'a ErrorBody,
}

impl<'a> From<&'a MetadataSelector> for AccessLogFilter<'a> {
    fn from(meta: &'a MetadataSelector) -> Self {
        Self::MetadataFilter {
            matcher: MetadataMatcher {
                filter: &meta.namespace,
                path: vec![PathSegment { key: &meta.key }],
                value: ValueMatcher {
                    string_match: StringMatcher {
                        exact: &meta.sentinel,
                    },
                },
                invert: true,
            },
            match_if_key_not_found: meta.match_if_key_not_found,
        }
    }
}

impl<'a> From<&'a Selector> for AccessLogFilter<'a> {
    fn from(selector: &'a Selector) -> Self {
        match selector {
            Selector::ResponseFlag(flag) => Self::ResponseFlagFilter {
                flags: vec![flag.as_str()],
            },
            Selector::Metadata(meta) => meta.into(),
            Selector::And(selectors) => Self::AndFilter {
                filters: selectors.iter().map(Into::into).collect(),
            },
        }
    }
}

impl<'a> From<&'a ResponseArtifact> for Mapper<'a> {
    fn from(artifact: &'a ResponseArtifact) -> Self {
        Self {
            filter: artifact.predicate().into(),
            status_code: artifact.status_code(),
            body_format_override: BodyFormat {
                json_format: artifact.body(),
            },
        }
    }
}

/// Converts the ordered mapper list into a `local_reply_config` block.
pub fn local_reply_config(mappers: &ResponseMappers) -> LocalReplyConfig<'_> {
    LocalReplyConfig {
        mappers: mappers.iter().map(Mapper::from).collect(),
    }
}

/// Renders the `local_reply_config` block as pretty-printed JSON.
pub fn to_json(mappers: &ResponseMappers) -> Result<String> {
    Ok(serde_json::to_string_pretty(&local_reply_config(mappers))?)
}

/// Renders the `local_reply_config` block as YAML.
pub fn to_yaml(mappers: &ResponseMappers) -> Result<String> {
    Ok(serde_yaml::to_string(&local_reply_config(mappers))?)
}
