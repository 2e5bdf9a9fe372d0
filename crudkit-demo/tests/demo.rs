#![cfg(all(feature = "sqlite", not(feature = "postgres")))]

use chrono::Utc;
use crudkit_core::config::{CrudkitConfig, DefaultSecretResolver};
use crudkit_data::FieldMap;
use crudkit_data_sqlx::{ConnectionManager, DatabaseConfig};
use crudkit_demo::{run_demo, tables, TestTool};
use serial_test::serial;

async fn manager() -> ConnectionManager {
    let manager = ConnectionManager::configure(&DatabaseConfig::from_url("sqlite::memory:")).unwrap();
    manager.init_schema(&tables()).await.unwrap();
    manager
}

#[tokio::test]
async fn demo_scenario() {
    let manager = manager().await;
    let outcome = run_demo(&manager).await.unwrap();

    assert!(outcome.created.id > 0);
    assert_eq!(outcome.created.status.as_deref(), Some("test"));
    assert_eq!(outcome.created.count, Some(1));
    assert!((Utc::now() - outcome.created.creating_date).num_seconds().abs() < 5);
    assert_eq!(outcome.fetched, outcome.created);
    assert!(outcome.all.contains(&outcome.created));
}

#[tokio::test]
async fn get_by_status_returns_the_matching_subset() {
    let manager = manager().await;
    let a = TestTool::create(&manager, FieldMap::new().with("status", "test")).await.unwrap();
    TestTool::create(&manager, FieldMap::new().with("status", "done")).await.unwrap();
    let c = TestTool::create(&manager, FieldMap::new().with("status", "test").with("count", 4))
        .await
        .unwrap();

    let found = TestTool::get_by_status(&manager, "test").await.unwrap();
    assert_eq!(found, vec![a, c]);
    assert!(TestTool::get_by_status(&manager, "missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_count_keeps_status() {
    let manager = manager().await;
    let created = TestTool::create(&manager, FieldMap::new().with("status", "test").with("count", 1))
        .await
        .unwrap();
    let tool = TestTool::new(&manager, created.id);

    tool.update_count(5).await.unwrap();

    let updated = tool.require().await.unwrap();
    assert_eq!(updated.count, Some(5));
    assert_eq!(updated.status, created.status);
    assert_eq!(updated.creating_date, created.creating_date);
}

#[tokio::test]
async fn deleted_record_is_gone() {
    let manager = manager().await;
    let created = TestTool::create(&manager, FieldMap::new()).await.unwrap();
    assert_eq!(created.status, None);

    let tool = TestTool::new(&manager, created.id);
    tool.delete().await.unwrap();
    assert!(tool.get().await.unwrap().is_none());
    assert!(tool.update_count(2).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn demo_config_file_loads() {
    for key in ["CRUDKIT_PROFILE", "DATABASE_URL", "DATABASE_DRIVER", "DATABASE_NAME"] {
        std::env::remove_var(key);
    }
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        concat!(env!("CARGO_MANIFEST_DIR"), "/application.yaml"),
        dir.path().join("application.yaml"),
    )
    .unwrap();

    let config = CrudkitConfig::load_from_dir(dir.path(), "dev", &DefaultSecretResolver)
        .unwrap()
        .with_typed::<DatabaseConfig>()
        .unwrap();
    assert_eq!(config.url(), "sqlite::memory:");

    let manager = ConnectionManager::configure(&config).unwrap();
    manager.init_schema(&tables()).await.unwrap();
    assert!(run_demo(&manager).await.is_ok());
    manager.close().await;
}
