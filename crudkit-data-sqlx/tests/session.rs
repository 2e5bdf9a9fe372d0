#![cfg(all(feature = "sqlite", not(feature = "postgres")))]

use crudkit_core::config::CrudkitConfig;
use crudkit_core::managed::run_managed;
use crudkit_data::{Column, ColumnType, DataError, TableDef};
use crudkit_data_sqlx::{ConnectionManager, DatabaseConfig, Session};

const NOTES: TableDef = TableDef {
    name: "notes",
    columns: &[
        Column::new("id", ColumnType::BigInt).primary_key().generated(),
        Column::new("body", ColumnType::Text).not_null(),
    ],
};

async fn memory_manager() -> ConnectionManager {
    let manager = ConnectionManager::configure(&DatabaseConfig::from_url("sqlite::memory:")).unwrap();
    manager.init_schema(&[NOTES]).await.unwrap();
    manager
}

async fn note_count(manager: &ConnectionManager) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM notes")
        .fetch_one(manager.pool())
        .await
        .unwrap()
}

async fn insert_note(session: &mut Session, body: &str) {
    sqlx::query("INSERT INTO notes (body) VALUES (?)")
        .bind(body)
        .execute(session.conn())
        .await
        .unwrap();
}

#[tokio::test]
async fn released_session_commits() {
    let manager = memory_manager().await;
    let mut session = manager.open_session().await.unwrap();
    insert_note(&mut session, "kept").await;
    session.release(true).await.unwrap();
    assert_eq!(note_count(&manager).await, 1);
}

#[tokio::test]
async fn failed_session_rolls_back() {
    let manager = memory_manager().await;
    let mut session = manager.open_session().await.unwrap();
    insert_note(&mut session, "discarded").await;
    session.release(false).await.unwrap();
    assert_eq!(note_count(&manager).await, 0);
}

#[tokio::test]
async fn dropped_session_rolls_back() {
    let manager = memory_manager().await;
    {
        let mut session = manager.open_session().await.unwrap();
        insert_note(&mut session, "dropped").await;
    }
    assert_eq!(note_count(&manager).await, 0);
}

#[tokio::test]
async fn run_managed_commits_on_ok_and_rolls_back_on_err() {
    let manager = memory_manager().await;

    run_managed::<_, Session, (), DataError, _>(&manager, |session| {
        Box::pin(async move {
            insert_note(session, "ok").await;
            Ok(())
        })
    })
    .await
    .unwrap();

    let err = run_managed::<_, Session, (), DataError, _>(&manager, |session| {
        Box::pin(async move {
            insert_note(session, "failed").await;
            Err(DataError::invalid("body", "rejected"))
        })
    })
    .await
    .unwrap_err();

    assert_eq!(err.field_errors()[0].field, "body");
    assert_eq!(note_count(&manager).await, 1);
}

#[tokio::test]
async fn schema_init_is_idempotent_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("notes.db").display());

    let first = ConnectionManager::configure(&DatabaseConfig::from_url(&url)).unwrap();
    first.init_schema(&[NOTES]).await.unwrap();
    let mut session = first.open_session().await.unwrap();
    insert_note(&mut session, "persisted").await;
    session.release(true).await.unwrap();
    first.close().await;
    assert!(first.is_closed());

    let second = ConnectionManager::configure(&DatabaseConfig::from_url(&url)).unwrap();
    second.init_schema(&[NOTES]).await.unwrap();
    assert_eq!(note_count(&second).await, 1);
    second.close().await;
}

#[tokio::test]
async fn schema_failures_are_schema_errors() {
    let manager = memory_manager().await;

    let bad_name = TableDef {
        name: "bad name",
        columns: NOTES.columns,
    };
    assert!(matches!(
        manager.init_schema(&[bad_name]).await,
        Err(DataError::Schema(_))
    ));

    manager.close().await;
    assert!(matches!(
        manager.init_schema(&[NOTES]).await,
        Err(DataError::Schema(_))
    ));
}

#[tokio::test]
async fn manager_from_yaml_config() {
    let yaml = r#"
database:
  driver: sqlite
  name: ":memory:"
  pool:
    timeout: 5
"#;
    let config = CrudkitConfig::from_yaml_str(yaml, "test")
        .unwrap()
        .with_typed::<DatabaseConfig>()
        .unwrap();
    let manager = ConnectionManager::configure(&config).unwrap();
    manager.init_schema(&[NOTES]).await.unwrap();
    assert_eq!(note_count(&manager).await, 0);
}
