//! SQLite-backed profile and character storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use trionforge_domain::{CharacterId, CharacterRecord, Stats, TriggerSlots, UserId};
use uuid::Uuid;

use crate::infrastructure::ports::{
    CharacterRepo, ClockPort, ProfileMetadata, ProfileRepo, RepoError,
};

/// SQLite implementation of both storage ports, sharing one pool.
pub struct SqliteStore {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteStore {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                metadata_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("profiles_schema", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS characters (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                stats_json TEXT NOT NULL,
                triggers_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("characters_schema", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_characters_owner ON characters (user_id, updated_at)",
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("characters_schema", e))?;

        Ok(Self { pool, clock })
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepoError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepoError::database("decode_row", e))
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(RepoError::serialization)
}

fn parse_uuid(raw: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(raw).map_err(RepoError::serialization)
}

fn record_from_row(row: &SqliteRow) -> Result<CharacterRecord, RepoError> {
    let id: String = column(row, "id")?;
    let user_id: String = column(row, "user_id")?;
    let stats_json: String = column(row, "stats_json")?;
    let triggers_json: String = column(row, "triggers_json")?;
    let created_at: String = column(row, "created_at")?;
    let updated_at: String = column(row, "updated_at")?;

    // Older rows may carry retired stat fields; Stats ignores them.
    let stats: Stats = serde_json::from_str(&stats_json).map_err(RepoError::serialization)?;
    let triggers: TriggerSlots =
        serde_json::from_str(&triggers_json).map_err(RepoError::serialization)?;

    Ok(CharacterRecord {
        id: CharacterId::from_uuid(parse_uuid(&id)?),
        user_id: UserId::from_uuid(parse_uuid(&user_id)?),
        name: column(row, "name")?,
        stats,
        triggers,
        created_at: parse_time(&created_at)?,
        updated_at: parse_time(&updated_at)?,
    })
}

#[async_trait]
impl ProfileRepo for SqliteStore {
    async fn read_metadata(&self, user_id: UserId) -> Result<ProfileMetadata, RepoError> {
        let row = sqlx::query("SELECT metadata_json FROM profiles WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("read_metadata", e))?;

        match row {
            Some(row) => {
                let json: String = column(&row, "metadata_json")?;
                serde_json::from_str(&json).map_err(RepoError::serialization)
            }
            None => Ok(ProfileMetadata::new()),
        }
    }

    async fn write_metadata(
        &self,
        user_id: UserId,
        patch: ProfileMetadata,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("write_metadata", e))?;

        let existing = sqlx::query("SELECT metadata_json FROM profiles WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepoError::database("write_metadata", e))?;

        let mut metadata = match existing {
            Some(row) => {
                let json: String = column(&row, "metadata_json")?;
                serde_json::from_str::<ProfileMetadata>(&json)
                    .map_err(RepoError::serialization)?
            }
            None => ProfileMetadata::new(),
        };
        metadata.extend(patch);

        let json = serde_json::to_string(&metadata).map_err(RepoError::serialization)?;
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, metadata_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                metadata_json = excluded.metadata_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id.to_string())
        .bind(json)
        .bind(self.clock.now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("write_metadata", e))?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("write_metadata", e))
    }
}

#[async_trait]
impl CharacterRepo for SqliteStore {
    async fn list(&self, user_id: UserId) -> Result<Vec<CharacterRecord>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, stats_json, triggers_json, created_at, updated_at
            FROM characters
            WHERE user_id = ?
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("list_characters", e))?;

        let mut records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        // Text ordering breaks on mixed offsets; sort on parsed times too.
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn get(&self, id: CharacterId) -> Result<Option<CharacterRecord>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, stats_json, triggers_json, created_at, updated_at
            FROM characters
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_character", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn upsert(&self, record: &CharacterRecord) -> Result<(), RepoError> {
        let stats_json = serde_json::to_string(&record.stats).map_err(RepoError::serialization)?;
        let triggers_json =
            serde_json::to_string(&record.triggers).map_err(RepoError::serialization)?;

        sqlx::query(
            r#"
            INSERT INTO characters (id, user_id, name, stats_json, triggers_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                stats_json = excluded.stats_json,
                triggers_json = excluded.triggers_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.name)
        .bind(stats_json)
        .bind(triggers_json)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("upsert_character", e))?;

        Ok(())
    }

    async fn delete(&self, id: CharacterId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM characters WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("delete_character", e))?;
        Ok(())
    }
}
