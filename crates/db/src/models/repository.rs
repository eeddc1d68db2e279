use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A GitHub repository connected for Q&A, with metadata captured at
/// connection time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ConnectedRepository {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub language: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub created_at: DateTime<Utc>,
}

/// Metadata to persist when connecting a repository
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateConnectedRepository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub language: Option<String>,
    pub stars: i64,
    pub forks: i64,
}

impl ConnectedRepository {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        data: &CreateConnectedRepository,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ConnectedRepository>(
            r#"
            INSERT INTO repositories (id, user_id, name, full_name, description, url, language, stars, forks)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, name, full_name, description, url, language, stars, forks, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.name)
        .bind(&data.full_name)
        .bind(&data.description)
        .bind(&data.url)
        .bind(&data.language)
        .bind(data.stars)
        .bind(data.forks)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id_and_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ConnectedRepository>(
            r#"
            SELECT id, user_id, name, full_name, description, url, language, stars, forks, created_at
            FROM repositories
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ConnectedRepository>(
            r#"
            SELECT id, user_id, name, full_name, description, url, language, stars, forks, created_at
            FROM repositories
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM repositories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
