use rusqlite::types::Value;

use crate::error::SqlFacadeError;
use crate::results::ResultSet;

use super::config::SharedSqliteConnection;
use super::query::build_result_set;

/// Run `func` against the connection on tokio's blocking pool.
///
/// The lock is taken before the blocking task is spawned, so statements reach the connection
/// in the order their futures queued on it, even when a caller is cancelled after queueing.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlFacadeError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlFacadeError> + Send + 'static,
    R: Send + 'static,
{
    let mut guard = conn.lock_owned().await;
    tokio::task::spawn_blocking(move || func(&mut guard))
    .await
    .map_err(|e| SqlFacadeError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

/// Execute a SELECT (or any statement returning rows).
pub(crate) async fn fetch(
    conn: SharedSqliteConnection,
    sql: String,
    params: Vec<Value>,
) -> Result<ResultSet, SqlFacadeError> {
    run_blocking(conn, move |c| {
        let mut stmt = c.prepare(&sql)?;
        build_result_set(&mut stmt, &params)
    })
    .await
}

/// Execute any statement and return the affected row count.
///
/// Rows the statement yields (`SELECT`, `RETURNING`, value-returning pragmas) are discarded.
pub(crate) async fn execute(
    conn: SharedSqliteConnection,
    sql: String,
    params: Vec<Value>,
) -> Result<u64, SqlFacadeError> {
    run_blocking(conn, move |c| step_discarding_rows(c, &sql, &params)).await
}

/// Execute an INSERT and read the rowid it generated.
///
/// The rowid is read under the same lock as the insert so no other statement can slip in
/// between.
pub(crate) async fn execute_returning_rowid(
    conn: SharedSqliteConnection,
    sql: String,
    params: Vec<Value>,
) -> Result<i64, SqlFacadeError> {
    run_blocking(conn, move |c| {
        step_discarding_rows(c, &sql, &params)?;
        Ok(c.last_insert_rowid())
    })
    .await
}

/// Execute semicolon-separated statements without parameters.
pub(crate) async fn execute_batch(
    conn: SharedSqliteConnection,
    sql: String,
) -> Result<(), SqlFacadeError> {
    run_blocking(conn, move |c| c.execute_batch(&sql).map_err(SqlFacadeError::from)).await
}

/// Run one statement to completion and report its row changes.
///
/// `Connection::execute` rejects statements that return rows, so those are stepped through
/// `query` instead. `changes()` is not reset by read-only statements; they report 0.
fn step_discarding_rows(
    c: &rusqlite::Connection,
    sql: &str,
    params: &[Value],
) -> Result<u64, SqlFacadeError> {
    let mut stmt = c.prepare(sql)?;
    if stmt.column_count() == 0 {
        let changed = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
        return affected(changed);
    }
    let readonly = stmt.readonly();
    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while rows.next()?.is_some() {}
    drop(rows);
    Ok(if readonly { 0 } else { c.changes() })
}

fn affected(changed: usize) -> Result<u64, SqlFacadeError> {
    u64::try_from(changed).map_err(|e| {
        SqlFacadeError::ExecutionError(format!("sqlite affected rows conversion error: {e}"))
    })
}
