//! The must-succeed calling convention.
//!
//! For setup code and scripts where a database failure is unrecoverable, [`Must::must`]
//! unwraps a result or panics with the error's message.

use crate::error::SqlFacadeError;

pub trait Must<T> {
    /// # Panics
    /// Panics with the error message on `Err`.
    fn must(self) -> T;
}

impl<T> Must<T> for Result<T, SqlFacadeError> {
    #[track_caller]
    fn must(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}
