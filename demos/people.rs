//! Small end-to-end tour of the facade.
//!
//! ```text
//! cargo run --example people -- --db sqlite --conn people.db
//! RUST_LOG=sql_facade=debug cargo run --example people -- --db postgres \
//!     --conn "host=localhost user=postgres dbname=demo"
//! ```

use clap::Parser;
use serde::Deserialize;
use sql_facade::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Create, fill and query a people table")]
struct Args {
    #[arg(long, value_enum, default_value = "sqlite")]
    db: DatabaseType,
    /// Connection string: a file path for SQLite, key/value or URL for Postgres.
    #[arg(long, default_value = ":memory:")]
    conn: String,
    #[arg(long, default_value_t = 4)]
    pool_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Person {
    id: i64,
    first_name: String,
    last_name: Option<String>,
    age: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), SqlFacadeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let db = Db::builder(args.db, args.conn)
        .name_convention(NameConvention::UnderScore)
        .max_size(args.pool_size)
        .connect()
        .await?;

    let id_column = match args.db {
        DatabaseType::Postgres => "id BIGSERIAL PRIMARY KEY",
        DatabaseType::Sqlite => "id INTEGER PRIMARY KEY",
    };
    db.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS people (
            {id_column},
            first_name TEXT NOT NULL UNIQUE,
            last_name TEXT,
            age BIGINT
        );"
    ))
    .await?;

    let returning = match args.db.dialect().insert_id_strategy() {
        sql_facade::InsertIdStrategy::Returning => " RETURNING id",
        sql_facade::InsertIdStrategy::LastInsertRowId => "",
    };
    let insert = format!("INSERT INTO people (first_name, last_name, age) VALUES (?, ?, ?){returning}");

    let inserted = db
        .transact(async |tx: &Tx| {
            let mut ids = Vec::new();
            for (first, last, age) in [
                ("Ada", Some("Lovelace"), Some(36)),
                ("Alan", Some("Turing"), Some(41)),
                ("Grace", None, None),
            ] {
                let exists = tx
                    .select_one_maybe::<Person>(
                        "SELECT * FROM people WHERE first_name = ?",
                        &params![first],
                    )
                    .await?;
                if exists.is_none() {
                    ids.push(tx.insert(&insert, &params![first, last, age]).await?);
                }
            }
            tx.update_num(
                1,
                "UPDATE people SET last_name = ? WHERE first_name = ?",
                &params!["Hopper", "Grace"],
            )
            .await?;
            Ok(ids)
        })
        .await?;
    tracing::info!(count = inserted.len(), "inserted people");

    let people: Vec<Person> = db
        .select("SELECT * FROM people ORDER BY id", &params![])
        .await?;
    for p in &people {
        println!(
            "{:>3}  {:<8} {:<10} {}",
            p.id,
            p.first_name,
            p.last_name.as_deref().unwrap_or("-"),
            p.age.map_or_else(|| "?".to_string(), |a| a.to_string())
        );
    }
    Ok(())
}
