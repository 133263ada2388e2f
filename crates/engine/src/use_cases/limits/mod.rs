//! Account limit resolution.
//!
//! Each account gets a stat-total ceiling and a fixed trion value. They are
//! generated once, written to the account's profile metadata, and read back
//! on every later session.

mod error;

pub use error::LimitError;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::OnceCell;
use trionforge_domain::{
    AccountLimits, LimitPolicy, UserId, FIXED_TRION_KEY, MAX_STAT_TOTAL_KEY,
};

use crate::infrastructure::ports::{ProfileMetadata, ProfileRepo, RandomPort};

/// Where a set of resolved limits came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitSource {
    /// Read back from the profile.
    Stored,
    /// Generated now and written to the profile.
    Generated,
    /// Generated locally and not persisted. Valid for this session only.
    Ephemeral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLimits {
    #[serde(flatten)]
    pub limits: AccountLimits,
    pub source: LimitSource,
}

pub struct LimitProvider {
    profiles: Arc<dyn ProfileRepo>,
    random: Arc<dyn RandomPort>,
    policy: LimitPolicy,
    timeout: Duration,
    resolved: DashMap<UserId, Arc<OnceCell<ResolvedLimits>>>,
}

impl LimitProvider {
    pub fn new(
        profiles: Arc<dyn ProfileRepo>,
        random: Arc<dyn RandomPort>,
        policy: LimitPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            profiles,
            random,
            policy,
            timeout,
            resolved: DashMap::new(),
        }
    }

    /// Limits for a session with no identity. Never persisted.
    pub fn generate_ephemeral(&self) -> ResolvedLimits {
        ResolvedLimits {
            limits: self.generate(),
            source: LimitSource::Ephemeral,
        }
    }

    fn generate(&self) -> AccountLimits {
        self.policy
            .generate(|min, max| self.random.gen_range(min, max))
    }

    /// Resolve limits for `user_id`, surfacing storage failures.
    ///
    /// Not cached: every call reads the profile.
    pub async fn try_resolve(&self, user_id: UserId) -> Result<ResolvedLimits, LimitError> {
        let metadata = self
            .bounded(self.profiles.read_metadata(user_id))
            .await
            .ok_or(LimitError::ReadTimeout(self.timeout))??;

        let stored_total = read_u32(&metadata, MAX_STAT_TOTAL_KEY);
        let stored_trion = read_u32(&metadata, FIXED_TRION_KEY);

        let mut patch = ProfileMetadata::new();
        let max_stat_total = stored_total.unwrap_or_else(|| {
            patch.insert(MAX_STAT_TOTAL_KEY.into(), self.policy.max_stat_total.into());
            self.policy.max_stat_total
        });
        let fixed_trion = stored_trion.unwrap_or_else(|| {
            let trion = self
                .policy
                .roll_trion(|min, max| self.random.gen_range(min, max));
            patch.insert(FIXED_TRION_KEY.into(), trion.into());
            trion
        });
        let limits = AccountLimits {
            max_stat_total,
            fixed_trion,
        };

        if patch.is_empty() {
            return Ok(ResolvedLimits {
                limits,
                source: LimitSource::Stored,
            });
        }

        let written_keys: Vec<String> = patch.keys().cloned().collect();
        match self
            .bounded(self.profiles.write_metadata(user_id, patch))
            .await
        {
            None => Err(LimitError::WriteTimeout {
                limits,
                after: self.timeout,
            }),
            Some(Err(source)) => Err(LimitError::Write { limits, source }),
            Some(Ok(())) => {
                tracing::info!(
                    user_id = %user_id,
                    max_stat_total,
                    fixed_trion,
                    keys = ?written_keys,
                    "Generated account limits"
                );
                Ok(ResolvedLimits {
                    limits,
                    source: LimitSource::Generated,
                })
            }
        }
    }

    /// Resolve limits for `user_id`, falling back to session-only limits.
    ///
    /// Concurrent calls for the same account share one resolution. Persisted
    /// results are released once resolved; ephemeral results stay cached until
    /// [`Self::forget_ephemeral`].
    pub async fn resolve(&self, user_id: UserId) -> ResolvedLimits {
        let cell = self.resolved.entry(user_id).or_default().clone();
        let resolved = *cell
            .get_or_init(|| async {
                match self.try_resolve(user_id).await {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        let limits = e.unpersisted_limits().unwrap_or_else(|| self.generate());
                        tracing::warn!(
                            user_id = %user_id,
                            error = %e,
                            fixed_trion = limits.fixed_trion,
                            "Limit resolution failed, using session-only limits"
                        );
                        ResolvedLimits {
                            limits,
                            source: LimitSource::Ephemeral,
                        }
                    }
                }
            })
            .await;

        if resolved.source != LimitSource::Ephemeral {
            self.resolved
                .remove_if(&user_id, |_, cached| Arc::ptr_eq(cached, &cell));
        }
        resolved
    }

    /// Drop a cached fallback so the next [`Self::resolve`] retries storage.
    pub fn forget_ephemeral(&self, user_id: UserId) {
        let removed = self.resolved.remove_if(&user_id, |_, cell| {
            cell.get()
                .is_some_and(|r| r.source == LimitSource::Ephemeral)
        });
        if removed.is_some() {
            tracing::debug!(user_id = %user_id, "Discarded session-only limits");
        }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        tokio::time::timeout(self.timeout, fut).await.ok()
    }
}

fn read_u32(metadata: &ProfileMetadata, key: &str) -> Option<u32> {
    metadata
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::ports::{MockProfileRepo, MockRandomPort, RepoError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn provider(repo: impl ProfileRepo + 'static, trion: u32) -> LimitProvider {
        LimitProvider::new(
            Arc::new(repo),
            Arc::new(FixedRandom(trion)),
            LimitPolicy::default(),
            Duration::from_millis(200),
        )
    }

    fn metadata(pairs: &[(&str, serde_json::Value)]) -> ProfileMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn when_limits_stored_then_returned_without_write() {
        let user = UserId::new();
        let mut repo = MockProfileRepo::new();
        repo.expect_read_metadata()
            .withf(move |id| *id == user)
            .times(1)
            .returning(|_| Ok(metadata(&[("maxStatTotal", json!(40)), ("fixedTrion", json!(6))])));
        repo.expect_write_metadata().never();

        let resolved = provider(repo, 8).try_resolve(user).await.unwrap();
        assert_eq!(resolved.source, LimitSource::Stored);
        assert_eq!(
            resolved.limits,
            AccountLimits {
                max_stat_total: 40,
                fixed_trion: 6
            }
        );
    }

    #[tokio::test]
    async fn when_resolved_twice_then_identical_and_written_once() {
        let user = UserId::new();
        let mut repo = MockProfileRepo::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_read_metadata()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ProfileMetadata::new()));
        repo.expect_read_metadata()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(metadata(&[("maxStatTotal", json!(36)), ("fixedTrion", json!(7))])));
        repo.expect_write_metadata()
            .withf(|_, patch| {
                patch.get("maxStatTotal") == Some(&json!(36))
                    && patch.get("fixedTrion") == Some(&json!(7))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let provider = provider(repo, 7);
        let first = provider.resolve(user).await;
        let second = provider.resolve(user).await;

        assert_eq!(first.limits, second.limits);
        assert_eq!(first.source, LimitSource::Generated);
        assert_eq!(second.source, LimitSource::Stored);
        assert_eq!(first.limits.fixed_trion, 7);
        assert_eq!(first.limits.max_stat_total, 36);
        assert!(provider.resolved.is_empty());
    }

    #[tokio::test]
    async fn when_only_trion_stored_then_fills_total_and_writes_missing_key() {
        let mut repo = MockProfileRepo::new();
        repo.expect_read_metadata()
            .returning(|_| Ok(metadata(&[("fixedTrion", json!(5)), ("theme", json!("dark"))])));
        repo.expect_write_metadata()
            .withf(|_, patch| {
                patch.len() == 1 && patch.get("maxStatTotal") == Some(&json!(36))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let resolved = provider(repo, 8).try_resolve(UserId::new()).await.unwrap();
        assert_eq!(resolved.source, LimitSource::Generated);
        assert_eq!(resolved.limits.fixed_trion, 5);
    }

    #[tokio::test]
    async fn when_stored_value_malformed_then_regenerated() {
        let mut repo = MockProfileRepo::new();
        repo.expect_read_metadata().returning(|_| {
            Ok(metadata(&[("maxStatTotal", json!(36)), ("fixedTrion", json!("six"))]))
        });
        repo.expect_write_metadata()
            .withf(|_, patch| patch.get("fixedTrion") == Some(&json!(6)))
            .times(1)
            .returning(|_, _| Ok(()));

        let resolved = provider(repo, 6).try_resolve(UserId::new()).await.unwrap();
        assert_eq!(resolved.limits.fixed_trion, 6);
    }

    #[tokio::test]
    async fn when_write_fails_then_generated_value_used_for_session() {
        let user = UserId::new();
        let mut repo = MockProfileRepo::new();
        repo.expect_read_metadata()
            .returning(|_| Ok(ProfileMetadata::new()));
        repo.expect_write_metadata()
            .times(1)
            .returning(|_, _| Err(RepoError::database("write_metadata", "disk full")));

        let provider = provider(repo, 8);
        let resolved = provider.resolve(user).await;
        assert_eq!(resolved.source, LimitSource::Ephemeral);
        assert_eq!(resolved.limits.fixed_trion, 8);

        // Cached: no second read or write.
        assert_eq!(provider.resolve(user).await, resolved);
        assert_eq!(provider.resolved.len(), 1);
    }

    /// Profile store whose reads find nothing and whose writes never finish.
    struct StalledWrites;

    #[async_trait]
    impl ProfileRepo for StalledWrites {
        async fn read_metadata(&self, _user_id: UserId) -> Result<ProfileMetadata, RepoError> {
            Ok(ProfileMetadata::new())
        }

        async fn write_metadata(
            &self,
            _user_id: UserId,
            _patch: ProfileMetadata,
        ) -> Result<(), RepoError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn when_profile_write_hangs_then_generated_value_used_for_session() {
        let mut random = MockRandomPort::new();
        random
            .expect_gen_range()
            .withf(|min, max| (*min, *max) == (5, 8))
            .times(1)
            .returning(|_, _| 7);
        let provider = LimitProvider::new(
            Arc::new(StalledWrites),
            Arc::new(random),
            LimitPolicy::default(),
            Duration::from_millis(20),
        );
        let user = UserId::new();

        let resolved = provider.resolve(user).await;
        assert_eq!(resolved.source, LimitSource::Ephemeral);
        assert_eq!(
            resolved.limits,
            AccountLimits {
                max_stat_total: 36,
                fixed_trion: 7
            }
        );
    }

    #[tokio::test]
    async fn when_try_resolve_write_hangs_then_timeout_carries_generated_limits() {
        let provider = LimitProvider::new(
            Arc::new(StalledWrites),
            Arc::new(FixedRandom(6)),
            LimitPolicy::default(),
            Duration::from_millis(20),
        );

        let err = provider.try_resolve(UserId::new()).await.unwrap_err();
        assert!(matches!(err, LimitError::WriteTimeout { .. }));
        assert_eq!(
            err.unpersisted_limits().map(|l| l.fixed_trion),
            Some(6)
        );
    }

    #[tokio::test]
    async fn when_try_resolve_fails_then_error_is_surfaced() {
        let mut repo = MockProfileRepo::new();
        repo.expect_read_metadata()
            .returning(|_| Err(RepoError::database("read_metadata", "offline")));

        let err = provider(repo, 5)
            .try_resolve(UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LimitError::Read(_)));
        assert!(err.unpersisted_limits().is_none());
    }

    #[tokio::test]
    async fn when_ephemeral_forgotten_then_next_resolve_retries() {
        let user = UserId::new();
        let mut repo = MockProfileRepo::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_read_metadata()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(RepoError::database("read_metadata", "offline")));
        repo.expect_read_metadata()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(metadata(&[("maxStatTotal", json!(36)), ("fixedTrion", json!(7))])));

        let provider = provider(repo, 5);
        assert_eq!(provider.resolve(user).await.source, LimitSource::Ephemeral);

        provider.forget_ephemeral(user);
        let retried = provider.resolve(user).await;
        assert_eq!(retried.source, LimitSource::Stored);
        assert_eq!(retried.limits.fixed_trion, 7);
    }

    /// Profile store that counts writes and answers slowly.
    #[derive(Default)]
    struct SlowProfiles {
        delay: Duration,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl ProfileRepo for SlowProfiles {
        async fn read_metadata(&self, _user_id: UserId) -> Result<ProfileMetadata, RepoError> {
            tokio::time::sleep(self.delay).await;
            Ok(ProfileMetadata::new())
        }

        async fn write_metadata(
            &self,
            _user_id: UserId,
            _patch: ProfileMetadata,
        ) -> Result<(), RepoError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn when_resolved_concurrently_then_generation_is_coalesced() {
        let repo = Arc::new(SlowProfiles {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        let provider = LimitProvider::new(
            repo.clone(),
            Arc::new(FixedRandom(6)),
            LimitPolicy::default(),
            Duration::from_secs(5),
        );
        let user = UserId::new();

        let (a, b, c) = tokio::join!(
            provider.resolve(user),
            provider.resolve(user),
            provider.resolve(user)
        );

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(repo.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn when_profile_read_hangs_then_times_out_and_falls_back() {
        let repo = SlowProfiles {
            delay: Duration::from_secs(5),
            ..Default::default()
        };
        let provider = LimitProvider::new(
            Arc::new(repo),
            Arc::new(FixedRandom(5)),
            LimitPolicy::default(),
            Duration::from_millis(20),
        );
        let user = UserId::new();

        let err = provider.try_resolve(user).await.unwrap_err();
        assert!(matches!(err, LimitError::ReadTimeout(_)));

        let resolved = provider.resolve(user).await;
        assert_eq!(resolved.source, LimitSource::Ephemeral);
        assert_eq!(resolved.limits.fixed_trion, 5);
    }

    #[test]
    fn test_ephemeral_limits_follow_policy() {
        let provider = provider(MockProfileRepo::new(), 8);
        let resolved = provider.generate_ephemeral();
        assert_eq!(resolved.source, LimitSource::Ephemeral);
        assert_eq!(resolved.limits.max_stat_total, 36);
        assert_eq!(resolved.limits.fixed_trion, 8);
    }
}
