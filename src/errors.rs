use thiserror::Error;

/// Error taxonomy for scan orchestration.
///
/// `Probe` is always contained at the host level: the worker pool counts it
/// and degrades that host's record instead of aborting the sweep. The other
/// variants surface to callers of the job API.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Bad interface, CIDR or worker count. Fatal to a start call; no job is
    /// created.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A scan is already pending or running.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown job id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Per-host probe failure (socket setup, send error). Recovered locally.
    #[error("probe error: {0}")]
    Probe(String),

    /// Unrecoverable failure discovered mid-scan; the job transitions to
    /// `error` and the previous snapshot is left untouched.
    #[error("scan job failed: {0}")]
    Job(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }
}
