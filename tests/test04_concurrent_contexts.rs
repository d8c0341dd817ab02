use std::sync::Arc;

use sql_helper::impl_entity;
use sql_helper::prelude::*;

#[derive(Debug, Default)]
struct Event {
    id: i64,
    worker: i64,
    label: String,
}

impl_entity!(Event { id, worker, label });

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contexts_on_different_tasks_stay_isolated() -> Result<(), SqlHelperError> {
    let dir = tempfile::tempdir().map_err(|e| SqlHelperError::ConfigError(e.to_string()))?;
    let path = dir.path().join("events.db");
    let db = Arc::new(
        DatabaseOptions::builder(Driver::Sqlite, path.to_string_lossy())
            .pool_max_size(4)
            .build()
            .await?,
    );

    let mut setup = db.begin_context();
    setup
        .execute_update(
            "CREATE TABLE Event (id INTEGER PRIMARY KEY, worker INTEGER NOT NULL, label TEXT)",
            &[],
        )
        .await?;
    setup.close_connection().await;

    let mut tasks = Vec::new();
    for worker in 0..4_i64 {
        let db = Arc::clone(&db);
        tasks.push(tokio::spawn(async move {
            let mut ctx = db.begin_context();
            let handle = ctx.get_connection().await?.id();
            for n in 0..5 {
                let fields = FieldMap::new()
                    .with("worker", worker)
                    .with("label", format!("w{worker}-{n}"));
                assert!(ctx.insert_entity::<Event>(&fields).await?);
                assert_eq!(ctx.connection_id(), Some(handle));
            }
            let mine: Vec<Event> = ctx
                .query_entity_list("SELECT * FROM Event WHERE worker = ?", &[worker.into()])
                .await?;
            ctx.close_connection().await;
            Ok::<_, SqlHelperError>((worker, handle, mine))
        }));
    }

    let mut handles = Vec::new();
    for task in tasks {
        let (worker, handle, mine) = task
            .await
            .map_err(|e| SqlHelperError::ConnectionError(e.to_string()))??;
        assert_eq!(mine.len(), 5);
        assert!(
            mine.iter()
                .all(|e| e.id > 0 && e.worker == worker && e.label.starts_with('w'))
        );
        handles.push(handle);
    }
    handles.sort();
    handles.dedup();
    assert_eq!(handles.len(), 4, "every context gets its own handle");
    Ok(())
}
