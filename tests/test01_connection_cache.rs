use std::time::Duration;

use sql_helper::prelude::*;
use tempfile::TempDir;

async fn open(
    strategy: ConnectionStrategy,
    pool_size: u32,
) -> Result<(TempDir, Database), SqlHelperError> {
    let dir = tempfile::tempdir().map_err(|e| SqlHelperError::ConfigError(e.to_string()))?;
    let path = dir.path().join("cache.db");
    let db = DatabaseOptions::builder(Driver::Sqlite, path.to_string_lossy())
        .strategy(strategy)
        .pool_max_size(pool_size)
        .pool_timeout(Duration::from_millis(300))
        .build()
        .await?;
    Ok((dir, db))
}

#[tokio::test(flavor = "current_thread")]
async fn same_handle_until_closed() -> Result<(), SqlHelperError> {
    for strategy in [ConnectionStrategy::Pooled, ConnectionStrategy::Direct] {
        let (_dir, db) = open(strategy, 4).await?;
        let mut ctx = db.begin_context();
        assert!(!ctx.has_connection());

        let first = ctx.get_connection().await?.id();
        ctx.execute_update("CREATE TABLE t (id INTEGER)", &[]).await?;
        ctx.execute_update("INSERT INTO t VALUES (?)", &[RowValues::Int(1)])
            .await?;
        let second = ctx.get_connection().await?.id();
        assert_eq!(first, second, "{strategy:?}: statements reuse the cached handle");
        assert_eq!(ctx.connection_id(), Some(first));

        ctx.close_connection().await;
        assert!(!ctx.has_connection());

        let fresh = ctx.get_connection().await?.id();
        assert_ne!(first, fresh, "{strategy:?}: a closed handle must not come back");
        assert_eq!(
            ctx.get_connection().await?.is_pooled(),
            strategy == ConnectionStrategy::Pooled
        );
        ctx.close_connection().await;
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn close_is_idempotent() -> Result<(), SqlHelperError> {
    let (_dir, db) = open(ConnectionStrategy::Direct, 1).await?;
    let mut ctx = db.begin_context();
    ctx.close_connection().await;
    ctx.get_connection().await?;
    ctx.close_connection().await;
    ctx.close_connection().await;
    assert!(!ctx.has_connection());
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn contexts_never_share_a_handle() -> Result<(), SqlHelperError> {
    let (_dir, db) = open(ConnectionStrategy::Pooled, 4).await?;
    let mut a = db.begin_context();
    let mut b = db.begin_context();
    assert_ne!(a.id(), b.id());

    let a_conn = a.get_connection().await?.id();
    let b_conn = b.get_connection().await?.id();
    assert_ne!(a_conn, b_conn);

    // closing one context leaves the other's handle alone
    a.close_connection().await;
    assert_eq!(b.connection_id(), Some(b_conn));
    b.close_connection().await;
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn pool_exhaustion_is_a_connection_error() -> Result<(), SqlHelperError> {
    let (_dir, db) = open(ConnectionStrategy::Pooled, 1).await?;
    let mut holder = db.begin_context();
    holder.get_connection().await?;

    let mut waiter = db.begin_context();
    let err = waiter.get_connection().await.unwrap_err();
    assert!(err.is_connection_error(), "unexpected error: {err}");
    assert!(!waiter.has_connection(), "a failed acquire must not be cached");

    holder.close_connection().await;
    waiter.get_connection().await?;
    waiter.close_connection().await;
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn dropped_context_returns_its_pooled_connection() -> Result<(), SqlHelperError> {
    let (_dir, db) = open(ConnectionStrategy::Pooled, 1).await?;
    {
        let mut forgetful = db.begin_context();
        forgetful.get_connection().await?;
    }
    let mut next = db.begin_context();
    next.get_connection().await?;
    next.close_connection().await;
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn unreachable_database_fails_on_acquire() -> Result<(), SqlHelperError> {
    let db = Database::connect(
        DatabaseOptions::builder(Driver::Sqlite, "/nonexistent-dir/for/sure/db.sqlite")
            .strategy(ConnectionStrategy::Direct)
            .finish(),
    )
    .await?;
    let mut ctx = db.begin_context();
    let err = ctx.get_connection().await.unwrap_err();
    assert!(err.is_connection_error());
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn failed_close_still_evicts_the_handle() -> Result<(), SqlHelperError> {
    let (_dir, db) = open(ConnectionStrategy::Direct, 1).await?;
    let mut ctx = db.begin_context();
    let first = ctx.get_connection().await?.id();

    // abandon a long statement so its blocking task still holds the connection
    let slow = "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 20000000) \
                SELECT COUNT(*) AS n FROM c";
    let outcome =
        tokio::time::timeout(Duration::from_millis(50), ctx.execute_query(slow, &[])).await;
    assert!(outcome.is_err(), "the statement should still be running");

    // closing a connection that is still in use fails, and that failure is swallowed
    ctx.close_connection().await;
    assert!(!ctx.has_connection());

    let fresh = ctx.get_connection().await?.id();
    assert_ne!(first, fresh);
    ctx.close_connection().await;
    Ok(())
}
