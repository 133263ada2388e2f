//! Account-scoped numeric limits and the policy that generates them.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Profile metadata key holding the standard-mode stat ceiling.
pub const MAX_STAT_TOTAL_KEY: &str = "maxStatTotal";

/// Profile metadata key holding the forced trion value.
pub const FIXED_TRION_KEY: &str = "fixedTrion";

/// Per-account limits, generated once and then read back from the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLimits {
    /// Ceiling for the combat-stat total in standard mode
    pub max_stat_total: u32,
    /// Trion value standard-mode characters are forced to
    pub fixed_trion: u32,
}

/// How limits are generated for an account that has none yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitPolicy {
    pub max_stat_total: u32,
    pub trion_min: u32,
    pub trion_max: u32,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            max_stat_total: 36,
            trion_min: 5,
            trion_max: 8,
        }
    }
}

impl LimitPolicy {
    pub fn new(max_stat_total: u32, trion_min: u32, trion_max: u32) -> Result<Self, DomainError> {
        if trion_min > trion_max {
            return Err(DomainError::validation(format!(
                "Trion range is empty: {}..={}",
                trion_min, trion_max
            )));
        }
        Ok(Self {
            max_stat_total,
            trion_min,
            trion_max,
        })
    }

    /// Draw a trion value. `rng` receives the inclusive bounds and must return
    /// a value inside them; out-of-range answers are clamped.
    pub fn roll_trion(&self, rng: impl FnOnce(u32, u32) -> u32) -> u32 {
        rng(self.trion_min, self.trion_max).clamp(self.trion_min, self.trion_max)
    }

    /// Generate a fresh set of limits.
    pub fn generate(&self, rng: impl FnOnce(u32, u32) -> u32) -> AccountLimits {
        AccountLimits {
            max_stat_total: self.max_stat_total,
            fixed_trion: self.roll_trion(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_final_rule_set() {
        let policy = LimitPolicy::default();
        assert_eq!(policy.max_stat_total, 36);
        assert_eq!((policy.trion_min, policy.trion_max), (5, 8));
    }

    #[test]
    fn test_generate_uses_injected_rng() {
        let limits = LimitPolicy::default().generate(|min, max| {
            assert_eq!((min, max), (5, 8));
            6
        });
        assert_eq!(
            limits,
            AccountLimits {
                max_stat_total: 36,
                fixed_trion: 6
            }
        );
    }

    #[test]
    fn test_roll_clamps_misbehaving_rng() {
        let policy = LimitPolicy::default();
        assert_eq!(policy.roll_trion(|_, _| 99), 8);
        assert_eq!(policy.roll_trion(|_, _| 0), 5);
    }

    #[test]
    fn test_policy_rejects_inverted_range() {
        assert!(LimitPolicy::new(36, 9, 5).is_err());
    }

    #[test]
    fn test_limits_serialize_with_metadata_keys() {
        let json = serde_json::to_value(AccountLimits {
            max_stat_total: 36,
            fixed_trion: 7,
        })
        .unwrap();
        assert_eq!(json[MAX_STAT_TOTAL_KEY], 36);
        assert_eq!(json[FIXED_TRION_KEY], 7);
    }
}
