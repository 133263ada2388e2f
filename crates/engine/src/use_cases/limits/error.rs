//! Limit resolution errors.

use std::time::Duration;

use trionforge_domain::AccountLimits;

use crate::infrastructure::ports::RepoError;

/// Errors that can occur while resolving account limits.
///
/// Write failures carry the limits that were generated but not persisted, so
/// a caller that recovers can still use them for the current session.
#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    #[error("Profile read failed: {0}")]
    Read(#[from] RepoError),
    #[error("Profile read timed out after {0:?}")]
    ReadTimeout(Duration),
    #[error("Profile write failed: {source}")]
    Write {
        limits: AccountLimits,
        #[source]
        source: RepoError,
    },
    #[error("Profile write timed out after {after:?}")]
    WriteTimeout {
        limits: AccountLimits,
        after: Duration,
    },
}

impl LimitError {
    /// Limits generated before the failure, if any.
    pub fn unpersisted_limits(&self) -> Option<AccountLimits> {
        match self {
            Self::Write { limits, .. } | Self::WriteTimeout { limits, .. } => Some(*limits),
            Self::Read(_) | Self::ReadTimeout(_) => None,
        }
    }
}
