// SQLite backend
//
// - config: bb8 manager and pool setup
// - params: conversion from `RowValues` into rusqlite values
// - query: building a `ResultSet` from a prepared statement
// - executor: running work against a pooled connection on the blocking pool

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager, SqlitePool};
pub use query::build_result_set;
