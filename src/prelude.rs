//! Convenient imports for common functionality.
//!
//! ```rust
//! use sql_facade::prelude::*;
//! ```

pub use crate::params;
pub use crate::{
    CustomDbRow, DatabaseType, Db, DbOptions, DbOptionsBuilder, Must, NameConvention, QueryOps,
    ResultSet, RowValues, SqlFacadeError, TransactionError, TransactionPanic, Tx, TxOutcome,
};
