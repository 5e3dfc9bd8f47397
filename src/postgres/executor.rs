use tokio_postgres::Client;

use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::build_result_set;

/// Prepare and run a statement that returns rows.
pub(crate) async fn fetch(
    client: &Client,
    sql: &str,
    params: &[RowValues],
) -> Result<ResultSet, SqlFacadeError> {
    let stmt = client.prepare(sql).await?;
    let converted = Params::convert(params);
    let rows = client.query(&stmt, converted.as_refs()).await?;
    build_result_set(&stmt, &rows)
}

/// Run a DML statement and return the affected row count.
pub(crate) async fn execute(
    client: &Client,
    sql: &str,
    params: &[RowValues],
) -> Result<u64, SqlFacadeError> {
    let converted = Params::convert(params);
    Ok(client.execute(sql, converted.as_refs()).await?)
}

/// Run semicolon-separated statements using the simple query protocol.
pub(crate) async fn execute_batch(client: &Client, sql: &str) -> Result<(), SqlFacadeError> {
    Ok(client.batch_execute(sql).await?)
}
