//! Process configuration read from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use trionforge_domain::{LimitPolicy, TriggerCatalog, TriggerCatalogEntry, VipAllowList};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server_host: String,
    pub server_port: u16,
    /// SQLite file; `None` keeps everything in memory.
    pub database_path: Option<String>,
    pub vip_emails: VipAllowList,
    /// Soft timeout for each profile read/write during limit resolution.
    pub limits_timeout: Duration,
    /// JSON catalog override; `None` uses the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    pub limit_policy: LimitPolicy,
    pub cors_allowed_origins: Option<String>,
    /// Editor sessions untouched for this long are evicted.
    pub session_idle_timeout: Duration,
    /// Upper bound on concurrently open editor sessions.
    pub max_sessions: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            database_path: None,
            vip_emails: VipAllowList::default(),
            limits_timeout: Duration::from_millis(3000),
            catalog_path: None,
            limit_policy: LimitPolicy::default(),
            cors_allowed_origins: None,
            session_idle_timeout: Duration::from_secs(30 * 60),
            max_sessions: 10_000,
        }
    }
}

impl AppSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_port = get("SERVER_PORT")
            .or_else(|| get("PORT"))
            .map(|raw| parse_or("SERVER_PORT", &raw, defaults.server_port))
            .unwrap_or(defaults.server_port);

        let timeout_ms = get("LIMITS_TIMEOUT_MS")
            .map(|raw| parse_or("LIMITS_TIMEOUT_MS", &raw, 3000u64))
            .unwrap_or(3000);

        let idle_secs = get("SESSION_IDLE_TIMEOUT_SECS")
            .map(|raw| parse_or("SESSION_IDLE_TIMEOUT_SECS", &raw, 1800u64))
            .unwrap_or(1800);

        let max_sessions = get("MAX_SESSIONS")
            .map(|raw| parse_or("MAX_SESSIONS", &raw, defaults.max_sessions))
            .unwrap_or(defaults.max_sessions);

        let base = defaults.limit_policy;
        let number = |key: &str, default: u32| {
            get(key)
                .map(|raw| parse_or(key, &raw, default))
                .unwrap_or(default)
        };
        let limit_policy = match LimitPolicy::new(
            number("MAX_STAT_TOTAL", base.max_stat_total),
            number("TRION_MIN", base.trion_min),
            number("TRION_MAX", base.trion_max),
        ) {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid limit policy, using defaults");
                base
            }
        };

        Self {
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            database_path: get("DATABASE_PATH"),
            vip_emails: get("VIP_EMAILS")
                .map(|raw| VipAllowList::from_csv(&raw))
                .unwrap_or_default(),
            limits_timeout: Duration::from_millis(timeout_ms),
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            limit_policy,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
            session_idle_timeout: Duration::from_secs(idle_secs),
            max_sessions,
        }
    }

    /// The configured catalog, or the built-in one.
    pub fn load_catalog(&self) -> Result<TriggerCatalog, CatalogLoadError> {
        match &self.catalog_path {
            Some(path) => load_catalog_file(path),
            None => Ok(TriggerCatalog::builtin()),
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: &str, default: T) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw, "Invalid numeric setting, using default");
        default
    })
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Domain(#[from] trionforge_domain::DomainError),
}

/// Load a catalog from a JSON array of entries.
pub fn load_catalog_file(path: &Path) -> Result<TriggerCatalog, CatalogLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&raw)
}

pub fn parse_catalog(raw: &str) -> Result<TriggerCatalog, CatalogLoadError> {
    let entries: Vec<TriggerCatalogEntry> = serde_json::from_str(raw)?;
    Ok(TriggerCatalog::from_entries(entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use trionforge_domain::{Identity, TriggerType, UserId};

    fn settings(vars: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_empty() {
        let s = settings(&[]);
        assert_eq!(s.server_host, "0.0.0.0");
        assert_eq!(s.server_port, 3000);
        assert!(s.database_path.is_none());
        assert!(s.vip_emails.is_empty());
        assert_eq!(s.limits_timeout, Duration::from_millis(3000));
        assert_eq!(s.limit_policy, LimitPolicy::default());
        assert_eq!(s.session_idle_timeout, Duration::from_secs(1800));
        assert_eq!(s.max_sessions, 10_000);
    }

    #[test]
    fn test_reads_overrides() {
        let s = settings(&[
            ("PORT", "8080"),
            ("DATABASE_PATH", "/tmp/tf.db"),
            ("VIP_EMAILS", "Jin@Border.jp, rindo@border.jp"),
            ("LIMITS_TIMEOUT_MS", "250"),
            ("TRION_MIN", "6"),
            ("TRION_MAX", "6"),
            ("SESSION_IDLE_TIMEOUT_SECS", "90"),
            ("MAX_SESSIONS", "500"),
        ]);
        assert_eq!(s.server_port, 8080);
        assert_eq!(s.database_path.as_deref(), Some("/tmp/tf.db"));
        assert!(s
            .vip_emails
            .is_eligible(&Identity::new(UserId::new(), "jin@border.jp")));
        assert_eq!(s.limits_timeout, Duration::from_millis(250));
        assert_eq!((s.limit_policy.trion_min, s.limit_policy.trion_max), (6, 6));
        assert_eq!(s.session_idle_timeout, Duration::from_secs(90));
        assert_eq!(s.max_sessions, 500);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let s = settings(&[
            ("SERVER_PORT", "http"),
            ("MAX_STAT_TOTAL", "-1"),
            ("TRION_MIN", "9"),
            ("TRION_MAX", "3"),
            ("MAX_SESSIONS", "lots"),
        ]);
        assert_eq!(s.server_port, 3000);
        assert_eq!(s.max_sessions, 10_000);
        assert_eq!(s.limit_policy, LimitPolicy::default());
    }

    #[test]
    fn test_parse_catalog_json() {
        let catalog = parse_catalog(
            r#"[
                {"name": "弧月", "type": "attacker"},
                {"name": "旋空", "type": "attacker", "option": "弧月"},
                {"name": "イーグレット", "type": "sniper"}
            ]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.by_name("旋空").and_then(|e| e.option.as_deref()),
            Some("弧月")
        );
        assert_eq!(
            catalog.categories(),
            vec![TriggerType::Attacker, TriggerType::Sniper]
        );
    }

    #[test]
    fn test_parse_catalog_rejects_duplicates() {
        let err = parse_catalog(
            r#"[{"name": "弧月", "type": "attacker"}, {"name": "弧月", "type": "option"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogLoadError::Domain(_)));
    }

    #[test]
    fn test_load_catalog_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"name": "シールド", "type": "defense"}]"#).unwrap();

        let s = AppSettings {
            catalog_path: Some(path),
            ..AppSettings::default()
        };
        assert!(s.load_catalog().unwrap().contains("シールド"));

        let missing = AppSettings {
            catalog_path: Some(dir.path().join("nope.json")),
            ..AppSettings::default()
        };
        assert!(matches!(
            missing.load_catalog(),
            Err(CatalogLoadError::Io { .. })
        ));
    }
}
