//! Shared test infrastructure for integration tests.
//!
//! Provides the default mapper list, transaction builders and body helpers
//! used across all integration test modules.

#![allow(dead_code)]

use error_response_mapper::selector::{DEFAULT_EXT_AUTHZ_KEY, DEFAULT_EXT_AUTHZ_NAMESPACE};
use error_response_mapper::{
    Config, ExtAuthzMatch, FailureRule, ResponseArtifact, ResponseMappers, TransactionRecord,
    registry,
};
use hyper::Body;
use serde_json::Value;

/// Builds the mapper list from the built-in configuration.
pub fn default_mappers() -> ResponseMappers {
    Config::default()
        .into_mappers()
        .expect("built-in table must be valid")
}

/// Returns the built-in rule table in evaluation order.
pub fn default_rules() -> Vec<FailureRule> {
    registry::default_rules(&ExtAuthzMatch::default(), true)
}

/// A transaction that recorded only the given flag.
pub fn flagged(flag: &str) -> TransactionRecord {
    TransactionRecord::new().with_flag(flag)
}

/// A transaction whose authorization marker holds `value`.
pub fn with_authz_marker(record: TransactionRecord, value: &str) -> TransactionRecord {
    record.with_metadata(DEFAULT_EXT_AUTHZ_NAMESPACE, DEFAULT_EXT_AUTHZ_KEY, value)
}

/// Parses an artifact's serialized body into a JSON value.
pub fn body_json(artifact: &ResponseArtifact) -> Value {
    let json = artifact.body().to_json().expect("body must serialize");
    serde_json::from_str(&json).expect("body must be valid JSON")
}

/// Collects a hyper body into a JSON value.
pub async fn collect_json(body: Body) -> Value {
    let bytes = hyper::body::to_bytes(body)
        .await
        .expect("failed to collect response body");
    serde_json::from_slice(&bytes).expect("response body must be valid JSON")
}
