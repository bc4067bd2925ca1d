use fusion_sdk::{AppError, Condition, Database, Row};
use serde_json::{json, Value};

fn row(v: Value) -> Row {
    match v {
        Value::Object(m) => m,
        _ => unreachable!("row literal must be an object"),
    }
}

async fn fresh() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("app.sqlite")).unwrap();
    (dir, db)
}

#[tokio::test]
async fn insert_then_fetch_by_id_round_trips() {
    let (_dir, mut db) = fresh().await;
    let id = db
        .insert("users", &row(json!({"username": "ada", "email": "ada@example.com"})))
        .await
        .unwrap();
    assert!(id > 0);

    let got = db
        .fetch_one("SELECT username, email FROM users WHERE id = ?", &[json!(id)])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got, row(json!({"username": "ada", "email": "ada@example.com"})));

    let by_select = db.select("users", &Condition::eq("id", id)).await.unwrap();
    assert_eq!(by_select.len(), 1);
    assert_eq!(by_select[0]["id"], json!(id));
}

#[tokio::test]
async fn update_matching_nothing_returns_zero() {
    let (_dir, mut db) = fresh().await;
    let changed = db
        .update("users", &row(json!({"email": "x@example.com"})), &Condition::eq("id", 999))
        .await
        .unwrap();
    assert_eq!(changed, 0);
}

#[tokio::test]
async fn update_reports_affected_rows() {
    let (_dir, mut db) = fresh().await;
    let id = db
        .insert("users", &row(json!({"username": "grace", "email": "g@example.com"})))
        .await
        .unwrap();
    let changed = db
        .update("users", &row(json!({"email": "grace@example.com"})), &Condition::eq("id", id))
        .await
        .unwrap();
    assert_eq!(changed, 1);
    let got = db.fetch_one("SELECT email FROM users WHERE id = ?", &[json!(id)]).await.unwrap().unwrap();
    assert_eq!(got["email"], "grace@example.com");
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (_dir, mut db) = fresh().await;
    let id = db
        .insert("users", &row(json!({"username": "linus", "email": "l@example.com"})))
        .await
        .unwrap();
    assert_eq!(db.delete("users", &Condition::eq("id", id)).await.unwrap(), 1);
    assert_eq!(db.delete("users", &Condition::eq("id", id)).await.unwrap(), 0);
    assert!(db
        .fetch_one("SELECT * FROM users WHERE id = ?", &[json!(id)])
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn sql_metacharacters_are_stored_literally() {
    let (_dir, mut db) = fresh().await;
    let hostile = "\"; DROP TABLE users; --";
    let id = db
        .insert("users", &row(json!({"username": hostile, "email": "'; DELETE FROM users; --"})))
        .await
        .unwrap();

    let got = db
        .fetch_one("SELECT username, email FROM users WHERE username = ?", &[json!(hostile)])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got["username"], hostile);
    assert_eq!(got["email"], "'; DELETE FROM users; --");

    let tables = db
        .fetch_all("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'users'", &[])
        .await
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(db.select("users", &Condition::eq("id", id)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn hostile_identifiers_are_quoted() {
    let (_dir, mut db) = fresh().await;
    let err = db
        .insert("users; DROP TABLE users", &row(json!({"username": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Query(_)));
    let tables = db
        .fetch_all("SELECT name FROM sqlite_master WHERE name = 'users'", &[])
        .await
        .unwrap();
    assert_eq!(tables.len(), 1);
}

#[tokio::test]
async fn bootstrap_on_initialized_store_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.sqlite");

    let mut db = Database::open(&path).unwrap();
    db.insert("users", &row(json!({"username": "ada", "email": "ada@example.com"})))
        .await
        .unwrap();
    db.kv_set("theme", &json!("dark")).await.unwrap();
    let schema_before = db
        .fetch_all("SELECT name, sql FROM sqlite_master ORDER BY name", &[])
        .await
        .unwrap();
    db.bootstrap().await.unwrap();
    db.close().await.unwrap();

    let mut reopened = Database::open(&path).unwrap();
    reopened.bootstrap().await.unwrap();
    let schema_after = reopened
        .fetch_all("SELECT name, sql FROM sqlite_master ORDER BY name", &[])
        .await
        .unwrap();
    assert_eq!(schema_before, schema_after);
    assert_eq!(reopened.fetch_all("SELECT * FROM users", &[]).await.unwrap().len(), 1);
    assert_eq!(reopened.kv_get("theme").await.unwrap(), Some(json!("dark")));
}

#[tokio::test]
async fn fetch_all_on_empty_table_is_empty() {
    let (_dir, mut db) = fresh().await;
    assert!(db.fetch_all("SELECT * FROM users", &[]).await.unwrap().is_empty());
    assert!(db.select("app_data", &Condition::always()).await.unwrap().is_empty());
    assert!(db.kv_list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unwritable_path_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let missing_parent = dir.path().join("no").join("such").join("dir").join("db.sqlite");
    assert!(matches!(
        Database::open(&missing_parent),
        Err(AppError::StorageUnavailable { .. })
    ));
    assert!(matches!(Database::open(dir.path()), Err(AppError::StorageUnavailable { .. })));
}

#[tokio::test]
async fn unique_violation_surfaces_as_query_error() {
    let (_dir, mut db) = fresh().await;
    let user = row(json!({"username": "ada", "email": "ada@example.com"}));
    db.insert("users", &user).await.unwrap();
    let err = db.insert("users", &user).await.unwrap_err();
    assert!(matches!(err, AppError::Query(_)));
    assert!(err.is_constraint_violation());
}

#[tokio::test]
async fn insert_many_rolls_back_on_failure() {
    let (_dir, mut db) = fresh().await;
    let rows = vec![
        row(json!({"username": "a", "email": "a@example.com"})),
        row(json!({"username": "b", "email": "b@example.com"})),
        row(json!({"username": "a", "email": "dup@example.com"})),
    ];
    assert!(db.insert_many("users", &rows).await.is_err());
    assert!(db.fetch_all("SELECT * FROM users", &[]).await.unwrap().is_empty());

    let ids = db.insert_many("users", &rows[..2]).await.unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids[0] < ids[1]);
}

#[tokio::test]
async fn kv_upsert_overwrites() {
    let (_dir, mut db) = fresh().await;
    db.kv_set("count", &json!(1)).await.unwrap();
    db.kv_set("count", &json!({"n": 2})).await.unwrap();
    assert_eq!(db.kv_get("count").await.unwrap(), Some(json!({"n": 2})));
    assert_eq!(db.kv_list().await.unwrap(), vec![("count".to_string(), json!({"n": 2}))]);
    assert_eq!(db.kv_delete("count").await.unwrap(), 1);
    assert_eq!(db.kv_delete("count").await.unwrap(), 0);
    assert_eq!(db.kv_get("count").await.unwrap(), None);
}

#[tokio::test]
async fn extra_tables_are_bootstrapped() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = Database::open(dir.path().join("notes.sqlite"))
        .unwrap()
        .with_tables([fusion_sdk::TableDescriptor::new("notes")
            .column("id", "INTEGER PRIMARY KEY")
            .column("body", "TEXT NOT NULL")]);
    let id = db.insert("notes", &row(json!({"body": "hello"}))).await.unwrap();
    let got = db.fetch_one("SELECT body FROM notes WHERE id = ?", &[json!(id)]).await.unwrap().unwrap();
    assert_eq!(got["body"], "hello");
}

#[tokio::test]
async fn failed_statement_leaves_handle_usable_and_closable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.sqlite");

    let mut db = Database::open(&path).unwrap();
    db.kv_set("before", &json!(1)).await.unwrap();
    let err = db.execute("SELEC nonsense", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Query(_)));
    let err = db.fetch_all("SELECT * FROM no_such_table", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Query(_)));

    db.kv_set("after", &json!(2)).await.unwrap();
    db.close().await.unwrap();

    let mut reopened = Database::open(&path).unwrap();
    let keys: Vec<String> = reopened.kv_list().await.unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["after", "before"]);
    reopened.close().await.unwrap();
}

#[tokio::test]
async fn read_only_file_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.sqlite");
    std::fs::write(&path, b"").unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&path, perms).unwrap();

    // Privileged users (root) can still write read-only files; nothing to assert then.
    if std::fs::OpenOptions::new().append(true).open(&path).is_ok() {
        return;
    }
    assert!(matches!(Database::open(&path), Err(AppError::StorageUnavailable { .. })));
}
