use std::io::Write;

use sql_helper::prelude::*;
use tempfile::TempDir;

async fn setup() -> Result<(TempDir, Database), SqlHelperError> {
    let dir = tempfile::tempdir().map_err(|e| SqlHelperError::ConfigError(e.to_string()))?;
    let path = dir.path().join("script.db");
    let db = Database::connect(DatabaseOptions::sqlite(path.to_string_lossy())).await?;
    Ok((dir, db))
}

async fn count(ctx: &mut ExecutionContext, table: &str) -> Result<i64, SqlHelperError> {
    let rows = ctx
        .execute_query(&format!("SELECT COUNT(*) AS n FROM {table}"), &[])
        .await?;
    Ok(rows[0].get("n").and_then(RowValues::as_int).copied().unwrap_or(-1))
}

#[tokio::test(flavor = "current_thread")]
async fn runs_every_line_in_order() -> Result<(), SqlHelperError> {
    let (_dir, db) = setup().await?;
    let mut ctx = db.begin_context();
    let script = "CREATE TABLE Customer (id INTEGER PRIMARY KEY, name TEXT)\n\
                  \n\
                  INSERT INTO Customer (name) VALUES ('Acme')\n   \n\
                  INSERT INTO Customer (name) VALUES ('Globex')\n";

    let executed = ctx.execute_sql_script(script.as_bytes()).await?;
    assert_eq!(executed, 3);
    assert_eq!(count(&mut ctx, "Customer").await?, 2);
    ctx.close_connection().await;
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn stops_at_the_first_bad_line() -> Result<(), SqlHelperError> {
    let (_dir, db) = setup().await?;
    let mut ctx = db.begin_context();
    ctx.execute_update("CREATE TABLE t (id INTEGER)", &[]).await?;

    let script = "INSERT INTO t VALUES (1)\nINSERT INTO t VALUES (\nINSERT INTO t VALUES (3)\n";
    let err = ctx.execute_sql_script(script.as_bytes()).await.unwrap_err();
    assert!(matches!(err, SqlHelperError::UpdateError(_)), "{err}");

    // the first statement stays applied, the third never ran
    assert_eq!(count(&mut ctx, "t").await?, 1);
    ctx.close_connection().await;
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn runs_a_file_from_disk() -> Result<(), SqlHelperError> {
    let (dir, db) = setup().await?;
    let script_path = dir.path().join("init.sql");
    let mut file = std::fs::File::create(&script_path)
        .map_err(|e| SqlHelperError::ConfigError(e.to_string()))?;
    writeln!(
        file,
        "CREATE TABLE Customer (id INTEGER PRIMARY KEY, name TEXT NOT NULL)\n\
         INSERT INTO Customer (name) VALUES ('Acme')"
    )
    .map_err(|e| SqlHelperError::ConfigError(e.to_string()))?;
    drop(file);

    let mut ctx = db.begin_context();
    assert_eq!(ctx.execute_sql_file(&script_path).await?, 2);
    assert_eq!(count(&mut ctx, "Customer").await?, 1);
    ctx.close_connection().await;
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn missing_file_is_a_script_error() -> Result<(), SqlHelperError> {
    let (dir, db) = setup().await?;
    let mut ctx = db.begin_context();
    let err = ctx
        .execute_sql_file(dir.path().join("nope.sql"))
        .await
        .unwrap_err();
    assert!(matches!(err, SqlHelperError::ScriptError { line: 0, .. }), "{err}");
    assert!(!ctx.has_connection());
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn shipped_customer_script_seeds_two_rows() -> Result<(), SqlHelperError> {
    let (_dir, db) = setup().await?;
    let mut ctx = db.begin_context();
    let script = concat!(env!("CARGO_MANIFEST_DIR"), "/sql/customer_init.sql");
    assert_eq!(ctx.execute_sql_file(script).await?, 4);
    assert_eq!(count(&mut ctx, "Customer").await?, 2);

    // running it again starts from scratch
    assert_eq!(ctx.execute_sql_file(script).await?, 4);
    assert_eq!(count(&mut ctx, "Customer").await?, 2);
    ctx.close_connection().await;
    Ok(())
}
