//! Response artifact construction.
//!
//! Each [`FailureRule`] becomes exactly one [`ResponseArtifact`]: the
//! predicate the proxy evaluates, the status code it substitutes and the
//! JSON body it emits. [`ResponseMappers`] holds the ordered list and is the
//! only way to obtain artifacts from a whole rule table, so a table that
//! fails validation never yields a partial list.

use std::collections::HashSet;

use hyper::header::CONTENT_TYPE;
use hyper::{Body, Response, StatusCode};
use log::{debug, info, warn};
use serde::Serialize;

use crate::registry::FailureRule;
use crate::selector::{Selector, TransactionRecord};
use crate::{MapperError, Result};

/// The client-visible error body.
///
/// Field order is part of the wire format: `code`, `message`, `description`.
/// `code` is a decimal string even though the source code is an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub description: String,
}

impl ErrorBody {
    pub fn new(error_code: i32, message: &str, description: &str) -> Self {
        Self {
            code: error_code.to_string(),
            message: message.to_owned(),
            description: description.to_owned(),
        }
    }

    /// Serializes the body as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A response override: predicate, status code and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseArtifact {
    predicate: Selector,
    status: StatusCode,
    body: ErrorBody,
}

impl ResponseArtifact {
    pub fn predicate(&self) -> &Selector {
        &self.predicate
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }

    /// Returns `true` if the proxy would apply this override to `record`.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.predicate.matches(record)
    }

    /// Renders the override as the HTTP response a client would receive.
    ///
    /// Proxy command operators such as `%LOCAL_REPLY_BODY%` are left as-is;
    /// substituting them is the proxy's job.
    pub fn to_response(&self) -> Result<Response<Body>> {
        let body = self.body.to_json()?;
        Ok(Response::builder()
            .status(self.status)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))?)
    }
}

/// Checks that `status_code` is a usable final HTTP status.
fn validate_status(status_code: u16) -> Result<StatusCode> {
    if !(100..=599).contains(&status_code) {
        return Err(MapperError::InvalidStatus {
            status: status_code,
        });
    }
    StatusCode::from_u16(status_code).map_err(|_| MapperError::InvalidStatus {
        status: status_code,
    })
}

fn build_artifact_with(rule: &FailureRule, predicate: Selector) -> Result<ResponseArtifact> {
    let status = validate_status(rule.status_code)?;
    predicate.validate()?;
    Ok(ResponseArtifact {
        predicate,
        status,
        body: ErrorBody::new(rule.error_code, &rule.message, &rule.description),
    })
}

/// Builds an artifact whose predicate is the presence of a single response
/// flag. The rule's own selector is ignored in favor of `flag`.
pub fn build_simple_artifact(rule: &FailureRule, flag: &str) -> Result<ResponseArtifact> {
    if flag.is_empty() {
        return Err(MapperError::EmptyFlag);
    }
    build_artifact_with(rule, Selector::ResponseFlag(flag.to_owned()))
}

/// Builds an artifact around a pre-built composite predicate.
pub fn build_composite_artifact(
    rule: &FailureRule,
    predicate: Selector,
) -> Result<ResponseArtifact> {
    if !matches!(predicate, Selector::And(_)) {
        return Err(MapperError::CompositeShape(
            "composite artifact requires an AND selector".into(),
        ));
    }
    build_artifact_with(rule, predicate)
}

/// Builds the artifact for a rule, dispatching on its selector.
pub fn build_artifact(rule: &FailureRule) -> Result<ResponseArtifact> {
    match &rule.selector {
        Selector::ResponseFlag(flag) => build_simple_artifact(rule, flag),
        Selector::And(_) => build_composite_artifact(rule, rule.selector.clone()),
        Selector::Metadata(_) => Err(MapperError::CompositeShape(
            "a metadata selector must be combined with a response flag".into(),
        )),
    }
}

/// The ordered list of response overrides handed to the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMappers {
    artifacts: Vec<ResponseArtifact>,
}

impl ResponseMappers {
    /// Builds one artifact per rule, preserving order.
    ///
    /// Fails without returning any artifact if a rule has an invalid status
    /// code or selector, or if two rules claim the same response flag,
    /// whether on their own or inside a composite selector.
    pub fn build(rules: &[FailureRule]) -> Result<Self> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut artifacts = Vec::with_capacity(rules.len());

        for rule in rules {
            let artifact = build_artifact(rule).inspect_err(|e| {
                warn!("rejecting rule table: error code {}: {e}", rule.error_code);
            })?;

            for flag in artifact.predicate.response_flags() {
                if !seen.insert(flag.to_owned()) {
                    warn!("rejecting rule table: flag {flag} is claimed twice");
                    return Err(MapperError::DuplicateFlag(flag.to_owned()));
                }
            }
            debug!(
                "built response mapper: status={} code={} predicate={:?}",
                artifact.status_code(),
                artifact.body.code,
                artifact.predicate
            );
            artifacts.push(artifact);
        }

        info!("built {} response mappers", artifacts.len());
        Ok(Self { artifacts })
    }

    /// Returns the first artifact whose predicate matches `record`.
    pub fn select(&self, record: &TransactionRecord) -> Option<&ResponseArtifact> {
        self.artifacts.iter().find(|a| a.matches(record))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResponseArtifact> {
        self.artifacts.iter()
    }

    pub fn as_slice(&self) -> &[ResponseArtifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResponseMappers {
    type Item = &'a ResponseArtifact;
    type IntoIter = std::slice::Iter<'a, ResponseArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::selector::{ExtAuthzMatch, ext_authz_denied};

    fn rate_limited() -> FailureRule {
        FailureRule::flag(429, 102517, "Too Many Requests", "Rate limit exceeded", "RL")
    }

    #[test]
    fn simple_artifact_carries_status_and_body() {
        let artifact = build_simple_artifact(&rate_limited(), "RL").unwrap();
        assert_eq!(artifact.status_code(), 429);
        assert_eq!(artifact.predicate(), &Selector::flag("RL"));
        assert_eq!(
            artifact.body(),
            &ErrorBody {
                code: "102517".into(),
                message: "Too Many Requests".into(),
                description: "Rate limit exceeded".into(),
            }
        );
    }

    #[test]
    fn body_serializes_fields_in_order() {
        let body = ErrorBody::new(-7, "m", "d");
        assert_eq!(
            body.to_json().unwrap(),
            r#"{"code":"-7","message":"m","description":"d"}"#
        );
    }

    #[test]
    fn simple_artifact_rejects_empty_flag() {
        assert_eq!(
            build_simple_artifact(&rate_limited(), ""),
            Err(MapperError::EmptyFlag)
        );
    }

    #[test]
    fn status_range_is_enforced() {
        for status in [0, 99, 600, 999] {
            let mut rule = rate_limited();
            rule.status_code = status;
            assert_eq!(
                build_artifact(&rule),
                Err(MapperError::InvalidStatus { status })
            );
        }
        for status in [100, 599] {
            let mut rule = rate_limited();
            rule.status_code = status;
            assert_eq!(build_artifact(&rule).unwrap().status_code(), status);
        }
    }

    #[test]
    fn composite_artifact_requires_and_selector() {
        let rule = registry::authorization_denied_rule(&ExtAuthzMatch::default());
        assert!(matches!(
            build_composite_artifact(&rule, Selector::flag("UAEX")),
            Err(MapperError::CompositeShape(_))
        ));

        let artifact =
            build_composite_artifact(&rule, ext_authz_denied(&ExtAuthzMatch::default())).unwrap();
        assert_eq!(artifact.status_code(), 500);
        assert_eq!(artifact.body().code, rule.error_code.to_string());
    }

    #[test]
    fn build_rejects_duplicate_flags() {
        let rules = vec![
            rate_limited(),
            FailureRule::flag(503, 1, "a", "b", "UF"),
            FailureRule::flag(500, 2, "c", "d", "RL"),
        ];
        assert_eq!(
            ResponseMappers::build(&rules),
            Err(MapperError::DuplicateFlag("RL".into()))
        );
    }

    #[test]
    fn build_rejects_flag_shared_with_composite() {
        let authz = registry::authorization_denied_rule(&ExtAuthzMatch::default());
        let shadowing = FailureRule::flag(403, 7, "x", "y", "UAEX");

        assert_eq!(
            ResponseMappers::build(&[shadowing.clone(), authz.clone()]),
            Err(MapperError::DuplicateFlag("UAEX".into()))
        );
        assert_eq!(
            ResponseMappers::build(&[authz, shadowing]),
            Err(MapperError::DuplicateFlag("UAEX".into()))
        );
    }

    #[test]
    fn build_rejects_whole_table_on_single_bad_rule() {
        let rules = vec![rate_limited(), FailureRule::flag(503, 1, "a", "b", "")];
        assert_eq!(ResponseMappers::build(&rules), Err(MapperError::EmptyFlag));
    }

    #[test]
    fn build_preserves_rule_order() {
        let rules = registry::default_rules(&ExtAuthzMatch::default(), true);
        let mappers = ResponseMappers::build(&rules).unwrap();
        assert_eq!(mappers.len(), rules.len());
        for (rule, artifact) in rules.iter().zip(&mappers) {
            assert_eq!(artifact.status_code(), rule.status_code);
            assert_eq!(artifact.predicate(), &rule.selector);
        }
    }

    #[test]
    fn select_returns_first_match() {
        let rules = vec![
            FailureRule::flag(503, 1, "first", "", "UF"),
            FailureRule::flag(504, 2, "second", "", "UT"),
        ];
        let mappers = ResponseMappers::build(&rules).unwrap();
        let record = TransactionRecord::new().with_flag("UT").with_flag("UF");
        assert_eq!(mappers.select(&record).unwrap().body().message, "first");
        assert!(mappers.select(&TransactionRecord::new()).is_none());
    }

    #[test]
    fn empty_table_builds_empty_list() {
        let mappers = ResponseMappers::build(&[]).unwrap();
        assert!(mappers.is_empty());
    }
}
