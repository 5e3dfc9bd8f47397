//! Field-name conventions.
//!
//! A [`NameConvention`] maps a Rust field name (as seen by `serde`) to the database column
//! that holds it. The convention is fixed per [`Db`](crate::Db) handle and inherited by its
//! transactions.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static FIRST_CAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(.)([A-Z][a-z]+)").unwrap_or_else(|e| unreachable!("static regex: {e}"))
});
static ALL_CAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("([a-z0-9])([A-Z])").unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// How struct field names translate into column names.
#[derive(Clone, Copy, Default)]
pub enum NameConvention {
    /// Column name equals field name.
    #[default]
    Same,
    /// `FirstName` → `firstName`
    Uncapitalized,
    /// `FirstName` → `first_name`
    UnderScore,
    /// `FirstName` → `FIRSTNAME`
    Uppercase,
    /// `FirstName` → `FIRST_NAME`
    UppercaseUnderScore,
    /// Caller-supplied transform.
    Custom(fn(&str) -> String),
}

impl NameConvention {
    /// Column name for `field`.
    #[must_use]
    pub fn apply(&self, field: &str) -> String {
        match self {
            NameConvention::Same => field.to_owned(),
            NameConvention::Uncapitalized => uncapitalize(field),
            NameConvention::UnderScore => camel_to_snake(field),
            NameConvention::Uppercase => field.to_uppercase(),
            NameConvention::UppercaseUnderScore => camel_to_snake(field).to_uppercase(),
            NameConvention::Custom(map) => map(field),
        }
    }
}

impl fmt::Debug for NameConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameConvention::Same => f.write_str("Same"),
            NameConvention::Uncapitalized => f.write_str("Uncapitalized"),
            NameConvention::UnderScore => f.write_str("UnderScore"),
            NameConvention::Uppercase => f.write_str("Uppercase"),
            NameConvention::UppercaseUnderScore => f.write_str("UppercaseUnderScore"),
            NameConvention::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// Lowercase the first character, leaving the rest untouched.
#[must_use]
pub fn uncapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Camel case to snake case.
///
/// A capital followed by lowercase letters starts a new word, as does any capital that
/// follows a lowercase letter or digit. Runs of capitals stay together, so `ID` is `id`
/// and `HTTPServer` is `http_server`.
#[must_use]
pub fn camel_to_snake(s: &str) -> String {
    let snake = FIRST_CAP.replace_all(s, "${1}_${2}");
    let snake = ALL_CAP.replace_all(&snake, "${1}_${2}");
    snake.to_lowercase()
}
