//! The ordered table of failure classification rules.
//!
//! Rule order is significant: the proxy evaluates mappers top-down and the
//! first match wins. The authorization-denial rule is always last.

use crate::codes::{self, ErrorDescriptor};
use crate::selector::{self, ExtAuthzMatch, Selector};

/// Proxy command operator substituted with the proxy's own local reply text.
pub const LOCAL_REPLY_BODY: &str = "%LOCAL_REPLY_BODY%";

/// A failure class bound to its status code, error descriptor and selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRule {
    /// HTTP status substituted into the response.
    pub status_code: u16,
    /// Internal error code, rendered as a decimal string in the body.
    pub error_code: i32,
    /// Short summary placed in the body's `message` field.
    pub message: String,
    /// Body `description`; may be a proxy command operator.
    pub description: String,
    /// Predicate selecting the transactions this rule applies to.
    pub selector: Selector,
}

impl FailureRule {
    /// Creates a rule matching a single response flag.
    pub fn flag(
        status_code: u16,
        error_code: i32,
        message: impl Into<String>,
        description: impl Into<String>,
        flag: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            error_code,
            message: message.into(),
            description: description.into(),
            selector: Selector::ResponseFlag(flag.into()),
        }
    }
}

/// How a rule's description is produced.
#[derive(Debug, Clone, Copy)]
enum Detail {
    /// Always the descriptor's fixed description.
    Fixed,
    /// The proxy's local reply body, when enabled.
    LocalReply,
}

struct FlagEntry {
    status_code: u16,
    flag: &'static str,
    descriptor: ErrorDescriptor,
    detail: Detail,
}

const fn entry(
    status_code: u16,
    flag: &'static str,
    descriptor: ErrorDescriptor,
    detail: Detail,
) -> FlagEntry {
    FlagEntry {
        status_code,
        flag,
        descriptor,
        detail,
    }
}

const FLAG_TABLE: &[FlagEntry] = &[
    entry(404, "NR", codes::NOT_FOUND, Detail::Fixed),
    entry(503, "UF", codes::UPSTREAM_CONNECTION_FAILURE, Detail::LocalReply),
    entry(504, "UT", codes::UPSTREAM_REQUEST_TIMEOUT, Detail::LocalReply),
    entry(503, "UO", codes::UPSTREAM_OVERFLOW, Detail::LocalReply),
    entry(500, "URX", codes::UPSTREAM_RETRY_LIMIT_EXCEEDED, Detail::LocalReply),
    entry(500, "NC", codes::NO_CLUSTER_FOUND, Detail::LocalReply),
    entry(503, "UH", codes::NO_HEALTHY_UPSTREAM, Detail::LocalReply),
    entry(503, "UR", codes::UPSTREAM_CONNECTION_RESET, Detail::LocalReply),
    entry(503, "UC", codes::UPSTREAM_CONNECTION_TERMINATION, Detail::LocalReply),
    entry(503, "LR", codes::LOCAL_RESET, Detail::LocalReply),
    entry(400, "IH", codes::INVALID_HEADER, Detail::LocalReply),
    entry(500, "SI", codes::STREAM_IDLE_TIMEOUT, Detail::LocalReply),
    entry(500, "DPE", codes::DOWNSTREAM_PROTOCOL_ERROR, Detail::LocalReply),
    entry(500, "UPE", codes::UPSTREAM_PROTOCOL_ERROR, Detail::LocalReply),
    entry(500, "UMSDR", codes::UPSTREAM_MAX_STREAM_DURATION, Detail::LocalReply),
    entry(429, "RL", codes::RATE_LIMITED, Detail::Fixed),
    entry(500, "RLSE", codes::RATE_LIMIT_SERVICE_ERROR, Detail::LocalReply),
];

/// Status code returned for authorization denials.
pub const AUTHORIZATION_DENIED_STATUS: u16 = 500;

/// Returns the single-flag rules in evaluation order.
///
/// With `use_local_reply_body` set, transport failures describe themselves
/// with [`LOCAL_REPLY_BODY`]; otherwise the fixed registry description is
/// used for every rule.
pub fn flag_rules(use_local_reply_body: bool) -> Vec<FailureRule> {
    FLAG_TABLE
        .iter()
        .map(|e| {
            let description = match e.detail {
                Detail::LocalReply if use_local_reply_body => LOCAL_REPLY_BODY,
                _ => e.descriptor.description,
            };
            FailureRule::flag(
                e.status_code,
                e.descriptor.code,
                e.descriptor.message,
                description,
                e.flag,
            )
        })
        .collect()
}

/// Returns the authorization-denial rule with its composite selector.
pub fn authorization_denied_rule(settings: &ExtAuthzMatch) -> FailureRule {
    let d = codes::AUTHORIZATION_DENIED;
    FailureRule {
        status_code: AUTHORIZATION_DENIED_STATUS,
        error_code: d.code,
        message: d.message.into(),
        description: d.description.into(),
        selector: selector::ext_authz_denied(settings),
    }
}

/// Returns the complete default rule table: the single-flag rules followed
/// by the authorization-denial rule.
pub fn default_rules(settings: &ExtAuthzMatch, use_local_reply_body: bool) -> Vec<FailureRule> {
    let mut rules = flag_rules(use_local_reply_body);
    rules.push(authorization_denied_rule(settings));
    rules
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn flag_of(rule: &FailureRule) -> Option<&str> {
        match &rule.selector {
            Selector::ResponseFlag(f) => Some(f.as_str()),
            _ => None,
        }
    }

    #[test]
    fn simple_flags_are_unique() {
        let rules = flag_rules(true);
        let flags: HashSet<_> = rules.iter().filter_map(flag_of).collect();
        assert_eq!(flags.len(), rules.len());
    }

    #[test]
    fn authorization_rule_is_last() {
        let rules = default_rules(&ExtAuthzMatch::default(), true);
        let last = rules.last().unwrap();
        assert!(matches!(last.selector, Selector::And(_)));
        assert_eq!(last.status_code, 500);
        assert_eq!(rules.len(), FLAG_TABLE.len() + 1);
    }

    #[test]
    fn covers_required_failure_classes() {
        let rules = flag_rules(true);
        let status_of = |flag: &str| {
            rules
                .iter()
                .find(|r| flag_of(r) == Some(flag))
                .map(|r| r.status_code)
        };
        assert_eq!(status_of("NR"), Some(404));
        assert_eq!(status_of("UF"), Some(503));
        assert_eq!(status_of("UH"), Some(503));
        assert_eq!(status_of("UO"), Some(503));
        assert_eq!(status_of("UT"), Some(504));
        assert_eq!(status_of("URX"), Some(500));
        assert_eq!(status_of("NC"), Some(500));
        assert_eq!(status_of("DPE"), Some(500));
        assert_eq!(status_of("UPE"), Some(500));
        assert_eq!(status_of("RLSE"), Some(500));
        assert_eq!(status_of("LR"), Some(503));
        assert_eq!(status_of("UC"), Some(503));
        assert_eq!(status_of("UR"), Some(503));
        assert_eq!(status_of("IH"), Some(400));
        assert_eq!(status_of("RL"), Some(429));
    }

    #[test]
    fn local_reply_placeholder_is_optional() {
        let with = flag_rules(true);
        let without = flag_rules(false);

        let uf = |rules: &[FailureRule]| {
            rules
                .iter()
                .find(|r| flag_of(r) == Some("UF"))
                .map(|r| r.description.clone())
                .unwrap()
        };
        assert_eq!(uf(&with), LOCAL_REPLY_BODY);
        assert_eq!(uf(&without), codes::UPSTREAM_CONNECTION_FAILURE.description);

        let nr = with.iter().find(|r| flag_of(r) == Some("NR")).unwrap();
        assert_eq!(nr.description, codes::NOT_FOUND.description);
    }

    #[test]
    fn not_found_precedes_rate_limited() {
        let rules = flag_rules(true);
        let pos = |flag: &str| rules.iter().position(|r| flag_of(r) == Some(flag)).unwrap();
        assert!(pos("NR") < pos("RL"));
    }
}
