//! A small convenience layer over `tokio-postgres` and `rusqlite`.
//!
//! - [`Db`] wraps a bb8 pool and exposes the [`QueryOps`] facade: `select`, `select_one`,
//!   `insert`, `update_num` and friends, with rows mapped onto `serde` types.
//! - [`Db::transact`] runs an async callback inside a transaction: commit on `Ok`, rollback
//!   on `Err`, rollback and re-panic on panic.
//! - [`NameConvention`] decides which column feeds each struct field.
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use sql_facade::prelude::*;
//!
//! #[derive(Deserialize)]
//! struct Person {
//!     id: i64,
//!     first_name: String,
//! }
//!
//! # async fn run() -> Result<(), SqlFacadeError> {
//! let db = Db::connect(DatabaseType::Sqlite, "people.db", NameConvention::Same).await?;
//! let people: Vec<Person> = db
//!     .select("SELECT id, first_name FROM people WHERE id > ?", &params![0])
//!     .await?;
//! # let _ = people;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod must;
pub mod naming;
pub mod ops;
pub mod pool;
pub mod prelude;
pub mod record;
pub mod results;
pub mod transaction;
pub mod translation;
pub mod tx_outcome;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{DbOptions, DbOptionsBuilder};
pub use db::Db;
pub use dialect::{Dialect, InsertIdStrategy, is_duplicate_entry_error};
pub use error::SqlFacadeError;
pub use must::Must;
pub use naming::NameConvention;
pub use ops::QueryOps;
pub use pool::DbPool;
pub use results::{CustomDbRow, ResultSet};
pub use transaction::Tx;
pub use translation::{PlaceholderStyle, rebind};
pub use tx_outcome::{TransactionError, TransactionPanic, TxOutcome};
pub use types::{DatabaseType, RowValues};

#[cfg(not(any(feature = "postgres", feature = "sqlite")))]
compile_error!("enable at least one backend feature: `postgres` or `sqlite`");
