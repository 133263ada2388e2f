//! Persisted character records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::CharacterDraft;
use crate::ids::{CharacterId, UserId};
use crate::value_objects::{Stats, TriggerSlots};

/// A saved character as it is stored by the record collaborator.
///
/// Serialized field names follow the stored row shape
/// (`user_id`, `created_at`, ...), while `stats` keeps camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    pub stats: Stats,
    #[serde(default)]
    pub triggers: TriggerSlots,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CharacterRecord {
    /// A brand-new record for `draft`.
    pub fn create(user_id: UserId, draft: &CharacterDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: CharacterId::new(),
            user_id,
            name: draft.name.clone(),
            stats: draft.stats,
            triggers: draft.triggers.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the content from `draft`, keeping id and creation time.
    pub fn update_from(&mut self, draft: &CharacterDraft, now: DateTime<Utc>) {
        self.name = draft.name.clone();
        self.stats = draft.stats;
        self.triggers = draft.triggers.clone();
        self.updated_at = now;
    }

    pub fn to_draft(&self) -> CharacterDraft {
        CharacterDraft {
            name: self.name.clone(),
            stats: self.stats,
            triggers: self.triggers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_update_keeps_identity_and_creation_time() {
        let draft = CharacterDraft::new("烏丸");
        let mut record = CharacterRecord::create(UserId::new(), &draft, fixed_time(1_700_000_000));
        let id = record.id;

        let edited = CharacterDraft::new("烏丸京介");
        record.update_from(&edited, fixed_time(1_700_000_500));

        assert_eq!(record.id, id);
        assert_eq!(record.created_at, fixed_time(1_700_000_000));
        assert_eq!(record.updated_at, fixed_time(1_700_000_500));
        assert_eq!(record.to_draft(), edited);
    }

    #[test]
    fn test_legacy_row_drops_special_stat() {
        let json = r#"{
            "id": "6f1c1a56-5b8e-4d61-9d57-4a5a0f6f2a11",
            "user_id": "0b4a1f0e-9a70-44a1-8d7a-2e3a3b1f4c22",
            "name": "木虎",
            "stats": {"trion": 7, "speed": 4, "range": 3, "attack": 8,
                      "defenseSupport": 6, "special": 5, "technique": 9},
            "triggers": {"main": ["スコーピオン", ""], "sub": ["スパイダー"]},
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        }"#;
        let record: CharacterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.stats.technique, 9);
        assert_eq!(record.triggers.main, vec!["スコーピオン", ""]);

        let round = serde_json::to_value(&record).unwrap();
        assert!(round["stats"].get("special").is_none());
    }
}
