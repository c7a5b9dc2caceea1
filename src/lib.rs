//!
//! Error response mappers for a reverse proxy control plane.
//!
//! Translates the proxy's internal failure classes (response flags and the
//! external authorization outcome) into deterministic client-facing
//! responses: a status code and a fixed JSON body of `code`, `message` and
//! `description`. The ordered [`ResponseMappers`] list is embedded into the
//! proxy's HTTP connection manager as its `local_reply_config`.
//!
//! ```
//! use error_response_mapper::{Config, TransactionRecord};
//!
//! let mappers = Config::default().into_mappers()?;
//! let record = TransactionRecord::new().with_flag("RL");
//! let artifact = mappers.select(&record).expect("RL is mapped");
//! assert_eq!(artifact.status_code(), 429);
//! # Ok::<(), error_response_mapper::MapperError>(())
//! ```

pub mod codes;
pub mod config;
pub mod envoy;
pub mod error;
pub mod mapper;
pub mod registry;
pub mod selector;

pub use config::{Config, ExtAuthzConfig, RuleConfig};
pub use error::MapperError;
pub use mapper::{
    ErrorBody, ResponseArtifact, ResponseMappers, build_artifact, build_composite_artifact,
    build_simple_artifact,
};
pub use registry::{FailureRule, LOCAL_REPLY_BODY};
pub use selector::{
    ExtAuthzMatch, MetadataLookup, MetadataSelector, Selector, TransactionRecord,
    ext_authz_denied,
};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, MapperError>;
