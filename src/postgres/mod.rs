// PostgreSQL backend
//
// - config: bb8 manager and pool setup
// - params: `ToSql` for `RowValues`
// - query: result extraction and building
// - executor: running statements on a pooled client

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{PgManager, PgPool};
pub use params::Params;
pub use query::build_result_set;
