#![cfg(feature = "postgres")]

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde::Deserialize;
use sql_facade::prelude::*;

/// Connection string for a disposable Postgres database, or `None` to skip.
fn pg_url() -> Option<String> {
    std::env::var("TESTING_PG_URL").ok()
}

fn table_name(prefix: &str) -> String {
    format!(
        "{prefix}_{}_{}",
        std::process::id(),
        chrono::Utc::now().timestamp_micros()
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Widget {
    id: i64,
    label: String,
    weight: Option<f64>,
    created_at: chrono::NaiveDateTime,
    attrs: serde_json::Value,
}

async fn widgets(url: &str, table: &str) -> Result<Db, SqlFacadeError> {
    let db = Db::builder(DatabaseType::Postgres, url)
        .name_convention(NameConvention::UnderScore)
        .max_size(4)
        .connect()
        .await?;
    db.execute_batch(&format!(
        "CREATE TABLE {table} (
            id BIGSERIAL PRIMARY KEY,
            label TEXT NOT NULL UNIQUE,
            weight DOUBLE PRECISION,
            qty INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT now(),
            attrs JSONB NOT NULL DEFAULT '{{}}'
        );"
    ))
    .await?;
    Ok(db)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn postgres_facade_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let Some(url) = pg_url() else {
        return Ok(());
    };
    let table = table_name("widgets");
    let db = widgets(&url, &table).await?;

    let id = db
        .insert(
            &format!("INSERT INTO {table} (label, weight, qty, attrs) VALUES (?, ?, ?, ?) RETURNING id"),
            &params!["sprocket", 1.5, 3, serde_json::json!({"color": "red"})],
        )
        .await?;

    let w: Widget = db
        .select_one(&format!("SELECT * FROM {table} WHERE id = $1"), &params![id])
        .await?;
    assert_eq!(w.id, id);
    assert_eq!(w.label, "sprocket");
    assert_eq!(w.weight, Some(1.5));
    assert_eq!(w.attrs["color"], "red");
    assert!(w.created_at.and_utc().timestamp() > 0);

    // INTEGER column bound from an i64 parameter
    db.update_one(
        &format!("UPDATE {table} SET qty = ? WHERE id = ?"),
        &params![4, id],
    )
    .await?;
    let qty: i64 = db
        .select_one(&format!("SELECT qty FROM {table} WHERE id = ?"), &params![id])
        .await?;
    assert_eq!(qty, 4);

    // integer parameter bound to a DOUBLE PRECISION column
    db.update_one(
        &format!("UPDATE {table} SET weight = ? WHERE id = ?"),
        &params![2, id],
    )
    .await?;
    let weight: f64 = db
        .select_one(&format!("SELECT weight FROM {table} WHERE id = ?"), &params![id])
        .await?;
    assert!((weight - 2.0).abs() < f64::EPSILON);

    let err = db
        .update(
            &format!("UPDATE {table} SET qty = ? WHERE id = ?"),
            &params![2.5, id],
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("cannot bind"), "{err}");

    let insert = format!("INSERT INTO {table} (label) VALUES (?)");
    assert!(db.insert_ignore_duplicate(&insert, &params!["sprocket"]).await?);
    assert!(!db.insert_ignore_duplicate(&insert, &params!["gear"]).await?);

    let none: Option<Widget> = db
        .select_one_maybe(&format!("SELECT * FROM {table} WHERE id = ?"), &params![-1])
        .await?;
    assert!(none.is_none());

    db.execute_batch(&format!("DROP TABLE {table}")).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn postgres_transact_paths() -> Result<(), Box<dyn std::error::Error>> {
    let Some(url) = pg_url() else {
        return Ok(());
    };
    let table = table_name("tx_widgets");
    let db = widgets(&url, &table).await?;
    let insert = format!("INSERT INTO {table} (label) VALUES (?) RETURNING id");
    let count_sql = format!("SELECT count(*) FROM {table}");

    db.transact(async |tx: &Tx| {
        tx.insert(&insert, &params!["kept"]).await?;
        Ok(())
    })
    .await?;

    let err = db
        .transact(async |tx: &Tx| {
            tx.insert(&insert, &params!["dropped"]).await?;
            tx.insert(&insert, &params!["kept"]).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    let tx_err = err.as_transaction().expect("transaction error");
    assert_eq!(tx_err.outcome(), TxOutcome::RolledBack);
    assert!(
        tx_err
            .original()
            .is_some_and(|e| DatabaseType::Postgres.dialect().is_duplicate_key(e))
    );

    let caught = AssertUnwindSafe(db.transact(async |tx: &Tx| {
        tx.insert(&insert, &params!["panicked"]).await?;
        let boom = true;
        if boom {
            panic!("widget press jammed");
        }
        Ok(())
    }))
    .catch_unwind()
    .await;
    let payload = caught.expect_err("panic should propagate");
    let panic = payload
        .downcast_ref::<TransactionPanic>()
        .expect("TransactionPanic payload");
    assert!(panic.message().contains("widget press jammed"));

    let count: i64 = db.select_one(&count_sql, &[]).await?;
    assert_eq!(count, 1);

    db.execute_batch(&format!("DROP TABLE {table}")).await?;
    Ok(())
}
