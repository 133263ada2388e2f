//! Editing mode and VIP eligibility.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::UserId;

/// Editing mode of a session. Ephemeral UI state, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Standard,
    Vip,
}

impl EditMode {
    pub fn is_vip(&self) -> bool {
        matches!(self, Self::Vip)
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Vip => write!(f, "vip"),
        }
    }
}

impl FromStr for EditMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "vip" => Ok(Self::Vip),
            _ => Err(DomainError::parse(format!("Unknown edit mode: {}", s))),
        }
    }
}

/// A signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
}

impl Identity {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Canonical form of an email address: trimmed and lowercased (Unicode-aware).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Accounts allowed to enter VIP mode, matched by email (case-insensitive).
///
/// Injected from configuration rather than compiled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VipAllowList {
    emails: HashSet<String>,
}

impl VipAllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Parse a comma-separated list (`VIP_EMAILS` format).
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_eligible(&self, identity: &Identity) -> bool {
        self.emails
            .contains(&normalize_email(&identity.email))
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_matches_case_insensitively() {
        let list = VipAllowList::from_csv(" Pilot@Example.com , ,other@example.com");
        assert_eq!(list.len(), 2);

        let vip = Identity::new(UserId::new(), "pilot@example.com");
        let regular = Identity::new(UserId::new(), "someone@example.com");
        assert!(list.is_eligible(&vip));
        assert!(!list.is_eligible(&regular));
    }

    #[test]
    fn test_allow_list_folds_non_ascii_case() {
        let list = VipAllowList::from_csv("ÉLODIE@Border.jp");
        assert!(list.is_eligible(&Identity::new(UserId::new(), "élodie@border.jp")));
        assert_eq!(normalize_email(" ÉLODIE@Border.jp "), "élodie@border.jp");
    }

    #[test]
    fn test_empty_allow_list_admits_nobody() {
        let list = VipAllowList::default();
        assert!(!list.is_eligible(&Identity::new(UserId::new(), "a@b.c")));
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!(EditMode::from_str("VIP"), Ok(EditMode::Vip));
        assert_eq!(EditMode::default(), EditMode::Standard);
        assert_eq!(EditMode::Vip.to_string(), "vip");
        assert!(EditMode::from_str("admin").is_err());
    }
}
