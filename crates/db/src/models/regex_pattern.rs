use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A regex pattern saved from the lab. `flags` is the serialized flag
/// string the frontend round-trips (e.g. "gi").
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct SavedRegexPattern {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub pattern: String,
    pub description: Option<String>,
    pub flags: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSavedRegexPattern {
    pub name: String,
    pub pattern: String,
    pub description: Option<String>,
    pub flags: Option<String>,
}

impl SavedRegexPattern {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        data: &CreateSavedRegexPattern,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SavedRegexPattern>(
            r#"
            INSERT INTO regex_patterns (id, user_id, name, pattern, description, flags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, name, pattern, description, flags, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.name)
        .bind(&data.pattern)
        .bind(&data.description)
        .bind(data.flags.as_deref().unwrap_or_default())
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SavedRegexPattern>(
            r#"
            SELECT id, user_id, name, pattern, description, flags, created_at
            FROM regex_patterns
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM regex_patterns WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
