//! Mapper predicates and the authorization-denial composer.
//!
//! A [`Selector`] is the condition the proxy evaluates against a completed
//! transaction to decide whether a response override applies. Selectors are
//! plain values; the proxy is the runtime evaluator, but [`Selector::matches`]
//! implements the same semantics over a [`TransactionRecord`] so the
//! generated predicates can be checked without a running proxy.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::{MapperError, Result};

/// Dynamic metadata namespace written by the proxy's external authorization
/// filter.
pub const DEFAULT_EXT_AUTHZ_NAMESPACE: &str = "envoy.filters.http.ext_authz";

/// Metadata key the authorization service writes when its check completes.
pub const DEFAULT_EXT_AUTHZ_KEY: &str = "choreo-connect-enforcer-reply";

/// Value that legitimate authorization replies never produce. Its presence
/// marks a transaction as *not* an authorization denial.
pub const DEFAULT_EXT_AUTHZ_SENTINEL: &str = "Not Matching";

/// Response flag the proxy records for replies originated by external
/// authorization.
pub const EXT_AUTHZ_DENIED_FLAG: &str = "UAEX";

/// Response flags the proxy is able to record on a transaction.
pub const KNOWN_RESPONSE_FLAGS: &[&str] = &[
    "DC", "DF", "DI", "DO", "DPE", "DR", "DT", "FI", "IH", "LH", "LR", "NC", "NFCF", "NR", "OM",
    "RFCF", "RL", "RLSE", "SI", "UAEX", "UC", "UF", "UH", "UMSDR", "UO", "UPE", "UR", "URX", "UT",
];

/// A predicate over a completed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Matches when the proxy recorded this response flag.
    ResponseFlag(String),
    /// Matches on a dynamic metadata lookup. Only valid inside [`Selector::And`].
    Metadata(MetadataSelector),
    /// Matches when every sub-selector matches.
    And(Vec<Selector>),
}

/// A string comparison against one dynamic metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSelector {
    /// Filter namespace the metadata entry lives under.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// Exact string value that causes the selector not to match.
    pub sentinel: String,
    /// Whether a missing key counts as a match.
    pub match_if_key_not_found: bool,
}

/// Outcome of looking up a [`MetadataSelector`]'s key on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLookup {
    /// The key holds exactly the sentinel string.
    EqualsSentinel,
    /// The key holds any other value, including non-string values.
    DiffersFromSentinel,
    /// The namespace or the key is not present.
    Absent,
}

impl MetadataLookup {
    /// Collapses the lookup to a match decision.
    ///
    /// | lookup                | result                   |
    /// |-----------------------|--------------------------|
    /// | `EqualsSentinel`      | `false`                  |
    /// | `DiffersFromSentinel` | `true`                   |
    /// | `Absent`              | `match_if_key_not_found` |
    pub fn is_match(self, match_if_key_not_found: bool) -> bool {
        match self {
            Self::EqualsSentinel => false,
            Self::DiffersFromSentinel => true,
            Self::Absent => match_if_key_not_found,
        }
    }
}

impl MetadataSelector {
    /// Performs the tri-state lookup against a transaction's metadata.
    pub fn lookup(&self, record: &TransactionRecord) -> MetadataLookup {
        match record.metadata_value(&self.namespace, &self.key) {
            None => MetadataLookup::Absent,
            Some(Value::String(s)) if *s == self.sentinel => MetadataLookup::EqualsSentinel,
            Some(_) => MetadataLookup::DiffersFromSentinel,
        }
    }

    /// Returns `true` if the lookup collapses to a match.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.lookup(record).is_match(self.match_if_key_not_found)
    }
}

impl Selector {
    /// Builds a single response flag selector.
    pub fn flag(flag: impl Into<String>) -> Self {
        Self::ResponseFlag(flag.into())
    }

    /// Evaluates the selector the way the proxy would.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            Self::ResponseFlag(flag) => record.has_flag(flag),
            Self::Metadata(meta) => meta.matches(record),
            Self::And(selectors) => selectors.iter().all(|s| s.matches(record)),
        }
    }

    /// Returns every response flag the selector tests, including those
    /// nested inside a composite.
    pub fn response_flags(&self) -> Vec<&str> {
        match self {
            Self::ResponseFlag(flag) => vec![flag.as_str()],
            Self::Metadata(_) => Vec::new(),
            Self::And(selectors) => selectors.iter().flat_map(Self::response_flags).collect(),
        }
    }

    /// Checks the selector's shape as a top-level mapper predicate.
    ///
    /// A top-level selector is either a known response flag or an `And` of
    /// exactly one metadata selector and exactly one response flag selector.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ResponseFlag(flag) => validate_flag(flag),
            Self::Metadata(_) => Err(MapperError::CompositeShape(
                "a metadata selector must be combined with a response flag".into(),
            )),
            Self::And(selectors) => validate_composite(selectors),
        }
    }
}

fn validate_flag(flag: &str) -> Result<()> {
    if flag.is_empty() {
        return Err(MapperError::EmptyFlag);
    }
    if !KNOWN_RESPONSE_FLAGS.contains(&flag) {
        return Err(MapperError::UnknownFlag(flag.to_owned()));
    }
    Ok(())
}

fn validate_composite(selectors: &[Selector]) -> Result<()> {
    let mut metadata = 0;
    let mut flags = 0;

    for selector in selectors {
        match selector {
            Selector::ResponseFlag(flag) => {
                validate_flag(flag)?;
                flags += 1;
            }
            Selector::Metadata(meta) => {
                if meta.namespace.is_empty() || meta.key.is_empty() {
                    return Err(MapperError::CompositeShape(
                        "metadata selector needs a namespace and a key".into(),
                    ));
                }
                metadata += 1;
            }
            Selector::And(_) => {
                return Err(MapperError::CompositeShape(
                    "nested composite selectors are not supported".into(),
                ));
            }
        }
    }

    if metadata != 1 || flags != 1 {
        return Err(MapperError::CompositeShape(format!(
            "expected exactly one metadata and one response flag sub-selector, \
             found {metadata} metadata and {flags} response flag"
        )));
    }
    Ok(())
}

/// Settings for the authorization-denial predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtAuthzMatch {
    /// Metadata namespace of the authorization filter.
    pub namespace: String,
    /// Completion marker key written by the authorization service.
    pub key: String,
    /// Sentinel value marking a transaction as not denied.
    pub sentinel: String,
    /// Response flag the proxy records for authorization replies.
    pub flag: String,
}

impl Default for ExtAuthzMatch {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_EXT_AUTHZ_NAMESPACE.into(),
            key: DEFAULT_EXT_AUTHZ_KEY.into(),
            sentinel: DEFAULT_EXT_AUTHZ_SENTINEL.into(),
            flag: EXT_AUTHZ_DENIED_FLAG.into(),
        }
    }
}

/// Builds the predicate that attributes a failure to an authorization denial.
///
/// Matches when the authorization filter did not record its completion
/// marker (the key is absent or holds anything but the sentinel) and the
/// transaction carries the authorization reply flag.
pub fn ext_authz_denied(settings: &ExtAuthzMatch) -> Selector {
    Selector::And(vec![
        Selector::Metadata(MetadataSelector {
            namespace: settings.namespace.clone(),
            key: settings.key.clone(),
            sentinel: settings.sentinel.clone(),
            match_if_key_not_found: true,
        }),
        Selector::ResponseFlag(settings.flag.clone()),
    ])
}

/// The observable outcome of one proxied transaction: its response flags
/// and the dynamic metadata filters attached to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    response_flags: BTreeSet<String>,
    metadata: BTreeMap<String, BTreeMap<String, Value>>,
}

impl TransactionRecord {
    /// Creates a record with no flags and no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a response flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.response_flags.insert(flag.into());
        self
    }

    /// Records a dynamic metadata entry under `namespace`.
    pub fn with_metadata(
        mut self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.metadata
            .entry(namespace.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the proxy recorded `flag`.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.response_flags.contains(flag)
    }

    /// Looks up a dynamic metadata entry.
    pub fn metadata_value(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.metadata.get(namespace).and_then(|ns| ns.get(key))
    }
}
