//! Error descriptor registry.
//!
//! Each failure class the proxy can report is identified by a stable
//! numeric error code plus a short message and a human readable
//! description. The values here are treated as trusted input by the mapper
//! builder and are never validated for semantic correctness.

/// A code/message/description triple for one failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDescriptor {
    /// Stable numeric error code exposed to clients as a decimal string.
    pub code: i32,
    /// Short summary of the failure.
    pub message: &'static str,
    /// Longer explanation used when the proxy's own reply detail is not
    /// substituted into the body.
    pub description: &'static str,
}

impl ErrorDescriptor {
    const fn new(code: i32, message: &'static str, description: &'static str) -> Self {
        Self {
            code,
            message,
            description,
        }
    }
}

pub const NOT_FOUND: ErrorDescriptor = ErrorDescriptor::new(
    404,
    "Not Found",
    "The requested resource is not available.",
);

pub const UPSTREAM_CONNECTION_FAILURE: ErrorDescriptor = ErrorDescriptor::new(
    102503,
    "Upstream connection failure",
    "Failed to establish a connection to the upstream service.",
);

pub const UPSTREAM_REQUEST_TIMEOUT: ErrorDescriptor = ErrorDescriptor::new(
    102504,
    "Upstream request timeout",
    "The upstream service did not respond in time.",
);

pub const UPSTREAM_OVERFLOW: ErrorDescriptor = ErrorDescriptor::new(
    102505,
    "Upstream overflow",
    "The upstream circuit breaker rejected the request due to insufficient resources.",
);

pub const UPSTREAM_RETRY_LIMIT_EXCEEDED: ErrorDescriptor = ErrorDescriptor::new(
    102506,
    "Upstream retry limit exceeded",
    "The request was reset after exhausting the upstream retry limit.",
);

pub const NO_CLUSTER_FOUND: ErrorDescriptor = ErrorDescriptor::new(
    102507,
    "No cluster found",
    "No upstream cluster is configured for the requested route.",
);

pub const NO_HEALTHY_UPSTREAM: ErrorDescriptor = ErrorDescriptor::new(
    102508,
    "No healthy upstream",
    "No healthy upstream host is available to serve the request.",
);

pub const UPSTREAM_CONNECTION_RESET: ErrorDescriptor = ErrorDescriptor::new(
    102509,
    "Upstream connection reset",
    "The upstream service sent a faulty response or reset the connection.",
);

pub const UPSTREAM_CONNECTION_TERMINATION: ErrorDescriptor = ErrorDescriptor::new(
    102510,
    "Upstream connection termination",
    "The upstream connection was terminated before a response was received.",
);

pub const LOCAL_RESET: ErrorDescriptor = ErrorDescriptor::new(
    102511,
    "Connection local reset",
    "The gateway reset the connection locally.",
);

pub const INVALID_HEADER: ErrorDescriptor = ErrorDescriptor::new(
    102512,
    "Invalid request header",
    "The request carried a header that failed strict validation.",
);

pub const STREAM_IDLE_TIMEOUT: ErrorDescriptor = ErrorDescriptor::new(
    102513,
    "Stream idle timeout",
    "The stream was idle for longer than the configured timeout.",
);

pub const DOWNSTREAM_PROTOCOL_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    102514,
    "Downstream protocol error",
    "The client request violated the HTTP protocol.",
);

pub const UPSTREAM_PROTOCOL_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    102515,
    "Upstream protocol error",
    "The upstream response violated the HTTP protocol.",
);

pub const UPSTREAM_MAX_STREAM_DURATION: ErrorDescriptor = ErrorDescriptor::new(
    102516,
    "Upstream max stream duration reached",
    "The upstream stream exceeded its maximum allowed duration.",
);

pub const RATE_LIMITED: ErrorDescriptor =
    ErrorDescriptor::new(102517, "Too Many Requests", "Rate limit exceeded");

pub const RATE_LIMIT_SERVICE_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    102518,
    "Rate limit service error",
    "The rate limit service could not be reached.",
);

pub const AUTHORIZATION_DENIED: ErrorDescriptor = ErrorDescriptor::new(
    102519,
    "Internal Server Error",
    "Error occurred while authorizing the request.",
);
