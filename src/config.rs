use crate::db::Db;
use crate::error::SqlFacadeError;
use crate::naming::NameConvention;
use crate::types::DatabaseType;

/// Options for opening a [`Db`].
#[derive(Debug, Clone)]
pub struct DbOptions {
    pub db_type: DatabaseType,
    /// Postgres key/value or URL string, or a `SQLite` file path (`:memory:` allowed).
    pub conn_str: String,
    pub name_convention: NameConvention,
    /// Maximum pooled connections; bb8's default when `None`. Ignored for `:memory:`.
    pub max_size: Option<u32>,
}

impl DbOptions {
    #[must_use]
    pub fn new(db_type: DatabaseType, conn_str: impl Into<String>) -> Self {
        Self {
            db_type,
            conn_str: conn_str.into(),
            name_convention: NameConvention::default(),
            max_size: None,
        }
    }

    #[must_use]
    pub fn with_name_convention(mut self, convention: NameConvention) -> Self {
        self.name_convention = convention;
        self
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

/// Fluent builder for [`DbOptions`].
#[derive(Debug, Clone)]
pub struct DbOptionsBuilder {
    opts: DbOptions,
}

impl DbOptionsBuilder {
    #[must_use]
    pub fn new(db_type: DatabaseType, conn_str: impl Into<String>) -> Self {
        Self {
            opts: DbOptions::new(db_type, conn_str),
        }
    }

    #[must_use]
    pub fn name_convention(mut self, convention: NameConvention) -> Self {
        self.opts.name_convention = convention;
        self
    }

    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.opts.max_size = Some(max_size);
        self
    }

    #[must_use]
    pub fn finish(self) -> DbOptions {
        self.opts
    }

    /// Open the database with these options.
    ///
    /// # Errors
    ///
    /// Returns `SqlFacadeError` if the pool cannot be built or the database does not answer.
    pub async fn connect(self) -> Result<Db, SqlFacadeError> {
        Db::from_options(self.finish()).await
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_options() {
        let opts = DbOptionsBuilder::new(DatabaseType::Sqlite, "app.db")
            .name_convention(NameConvention::UnderScore)
            .max_size(4)
            .finish();
        assert_eq!(opts.conn_str, "app.db");
        assert_eq!(opts.max_size, Some(4));
        assert_eq!(opts.name_convention.apply("UserID"), "user_id");

        let defaults = DbOptions::new(DatabaseType::Sqlite, ":memory:");
        assert_eq!(defaults.max_size, None);
        assert_eq!(defaults.name_convention.apply("UserID"), "UserID");
    }
}
