//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Profile and character storage (in-memory or SQLite)
//! - The identity service
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CharacterRepo, ProfileMetadata, ProfileRepo};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::IdentityPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::MockIdentityPort;
#[cfg(test)]
pub use repos::{MockCharacterRepo, MockProfileRepo};
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{AuthError, RepoError};
