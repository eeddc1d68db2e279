use db::models::{
    project::{CreateProject, Project, UpdateProject},
    regex_pattern::{CreateSavedRegexPattern, SavedRegexPattern},
    repository::{ConnectedRepository, CreateConnectedRepository},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use uuid::Uuid;

// A single connection keeps the in-memory database alive for the whole test.
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn project_crud_roundtrip() {
    let pool = test_pool().await;
    let user_id = Uuid::new_v4();

    let created = Project::create(
        &pool,
        Uuid::new_v4(),
        user_id,
        &CreateProject {
            name: "gitstack".to_string(),
            description: Some("dashboard".to_string()),
            github_url: None,
        },
    )
    .await
    .unwrap();

    let found = Project::find_by_id_and_user(&pool, created.id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "gitstack");
    assert_eq!(found.description.as_deref(), Some("dashboard"));

    let updated = Project::update(
        &pool,
        created.id,
        user_id,
        &UpdateProject {
            name: Some("gitstack-2".to_string()),
            description: None,
            github_url: Some("https://github.com/acme/gitstack".to_string()),
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "gitstack-2");
    // COALESCE keeps fields the update did not mention
    assert_eq!(updated.description.as_deref(), Some("dashboard"));
    assert_eq!(
        updated.github_url.as_deref(),
        Some("https://github.com/acme/gitstack")
    );

    let deleted = Project::delete(&pool, created.id, user_id).await.unwrap();
    assert_eq!(deleted, 1);
    assert!(
        Project::find_by_id_and_user(&pool, created.id, user_id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn project_queries_are_scoped_to_owner() {
    let pool = test_pool().await;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let project = Project::create(
        &pool,
        Uuid::new_v4(),
        owner,
        &CreateProject {
            name: "private".to_string(),
            description: None,
            github_url: None,
        },
    )
    .await
    .unwrap();

    assert!(
        Project::find_by_id_and_user(&pool, project.id, other)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(Project::delete(&pool, project.id, other).await.unwrap(), 0);
    assert_eq!(Project::list_for_user(&pool, other).await.unwrap().len(), 0);
}

#[tokio::test]
async fn project_count_tracks_onboarding_evidence() {
    let pool = test_pool().await;
    let user_id = Uuid::new_v4();

    assert_eq!(Project::count_for_user(&pool, user_id).await.unwrap(), 0);

    Project::create(
        &pool,
        Uuid::new_v4(),
        user_id,
        &CreateProject {
            name: "first".to_string(),
            description: None,
            github_url: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(Project::count_for_user(&pool, user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn repository_create_and_list() {
    let pool = test_pool().await;
    let user_id = Uuid::new_v4();

    let repo = ConnectedRepository::create(
        &pool,
        Uuid::new_v4(),
        user_id,
        &CreateConnectedRepository {
            name: "tokio".to_string(),
            full_name: "tokio-rs/tokio".to_string(),
            description: Some("async runtime".to_string()),
            url: "https://github.com/tokio-rs/tokio".to_string(),
            language: Some("Rust".to_string()),
            stars: 25000,
            forks: 2300,
        },
    )
    .await
    .unwrap();

    let listed = ConnectedRepository::list_for_user(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].full_name, "tokio-rs/tokio");
    assert_eq!(listed[0].stars, 25000);

    assert_eq!(
        ConnectedRepository::delete(&pool, repo.id, user_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn regex_pattern_defaults_empty_flags() {
    let pool = test_pool().await;
    let user_id = Uuid::new_v4();

    let saved = SavedRegexPattern::create(
        &pool,
        Uuid::new_v4(),
        user_id,
        &CreateSavedRegexPattern {
            name: "emails".to_string(),
            pattern: r"\w+@\w+\.\w+".to_string(),
            description: None,
            flags: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(saved.flags, "");

    let listed = SavedRegexPattern::list_for_user(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}
