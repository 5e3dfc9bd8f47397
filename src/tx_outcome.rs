use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;

use crate::error::SqlFacadeError;

/// How a failed transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    /// The callback failed and the rollback went through.
    RolledBack,
    /// The callback failed and the rollback failed as well.
    RollbackFailed,
    /// The callback succeeded but the commit did not.
    CommitFailed,
}

impl TxOutcome {
    fn title(self) -> &'static str {
        match self {
            TxOutcome::RolledBack => "transaction rolled back",
            TxOutcome::RollbackFailed => "transaction rollback failed",
            TxOutcome::CommitFailed => "transaction commit failed",
        }
    }
}

/// Composite error returned by `Db::transact` when the transaction did not commit.
///
/// Carries the callback's own error (if any), the commit or rollback failure, and the
/// backtrace captured where the transaction was abandoned.
#[derive(Debug)]
pub struct TransactionError {
    outcome: TxOutcome,
    original: Option<SqlFacadeError>,
    commit_error: Option<SqlFacadeError>,
    rollback_error: Option<SqlFacadeError>,
    backtrace: Backtrace,
}

impl TransactionError {
    pub(crate) fn rolled_back(original: SqlFacadeError) -> Self {
        Self::new(TxOutcome::RolledBack, Some(original), None, None)
    }

    pub(crate) fn rollback_failed(original: SqlFacadeError, rollback: SqlFacadeError) -> Self {
        Self::new(TxOutcome::RollbackFailed, Some(original), None, Some(rollback))
    }

    pub(crate) fn commit_failed(commit: SqlFacadeError) -> Self {
        Self::new(TxOutcome::CommitFailed, None, Some(commit), None)
    }

    fn new(
        outcome: TxOutcome,
        original: Option<SqlFacadeError>,
        commit_error: Option<SqlFacadeError>,
        rollback_error: Option<SqlFacadeError>,
    ) -> Self {
        Self {
            outcome,
            original,
            commit_error,
            rollback_error,
            backtrace: Backtrace::force_capture(),
        }
    }

    #[must_use]
    pub fn outcome(&self) -> TxOutcome {
        self.outcome
    }

    /// The error the callback returned.
    #[must_use]
    pub fn original(&self) -> Option<&SqlFacadeError> {
        self.original.as_ref()
    }

    #[must_use]
    pub fn commit_error(&self) -> Option<&SqlFacadeError> {
        self.commit_error.as_ref()
    }

    #[must_use]
    pub fn rollback_error(&self) -> Option<&SqlFacadeError> {
        self.rollback_error.as_ref()
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Take the callback's error out of the composite.
    #[must_use]
    pub fn into_original(self) -> Option<SqlFacadeError> {
        self.original
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.outcome.title())?;
        if let Some(err) = &self.original {
            write!(f, "; transaction error: {err}")?;
        }
        if let Some(err) = &self.commit_error {
            write!(f, "; commit error: {err}")?;
        }
        if let Some(err) = &self.rollback_error {
            write!(f, "; rollback error: {err}")?;
        }
        if f.alternate() {
            write!(f, "\nstack trace:\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.original
            .as_ref()
            .or(self.commit_error.as_ref())
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Panic payload `Db::transact` resumes with after a callback panicked.
///
/// Downcast the payload from `std::panic::catch_unwind` (or a `JoinError`) to inspect it.
/// The callback's own panic payload travels inside, untouched.
#[derive(Debug)]
pub struct TransactionPanic {
    message: String,
    payload: Box<dyn Any + Send>,
    rollback: Result<(), String>,
    backtrace: Backtrace,
}

impl TransactionPanic {
    pub(crate) fn new(payload: Box<dyn Any + Send>, rollback: Result<(), String>) -> Self {
        Self {
            message: panic_message(payload.as_ref()),
            payload,
            rollback,
            backtrace: Backtrace::force_capture(),
        }
    }

    /// Text of the original panic.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The callback's original panic payload.
    #[must_use]
    pub fn payload(&self) -> &(dyn Any + Send) {
        self.payload.as_ref()
    }

    /// Take the original payload, e.g. to `resume_unwind` with it.
    #[must_use]
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }

    /// `Err` holds the rollback failure text.
    #[must_use]
    pub fn rollback(&self) -> Result<(), &str> {
        self.rollback.as_ref().map(|_| ()).map_err(String::as_str)
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for TransactionPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction callback panicked: {}", self.message)?;
        match &self.rollback {
            Ok(()) => f.write_str("; rolled back"),
            Err(err) => write!(f, "; rollback error: {err}"),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(p) = payload.downcast_ref::<TransactionPanic>() {
        p.to_string()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_failure() {
        let err = TransactionError::rollback_failed(
            SqlFacadeError::ExecutionError("boom".into()),
            SqlFacadeError::ConnectionError("gone".into()),
        );
        let text = err.to_string();
        assert!(text.starts_with("transaction rollback failed"));
        assert!(text.contains("transaction error: SQL execution error: boom"));
        assert!(text.contains("rollback error: Connection error: gone"));
        assert!(!text.contains("stack trace"));
        assert!(format!("{err:#}").contains("stack trace"));
    }

    #[test]
    fn commit_failure_has_no_original() {
        let err = TransactionError::commit_failed(SqlFacadeError::Other("disk full".into()));
        assert_eq!(err.outcome(), TxOutcome::CommitFailed);
        assert!(err.original().is_none());
        assert!(err.rollback_error().is_none());
        assert!(err.commit_error().is_some());
    }

    #[test]
    fn panic_payloads_become_text() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "static");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");

        let p = TransactionPanic::new(Box::new("oops"), Err("locked".into()));
        assert_eq!(p.message(), "oops");
        assert_eq!(p.rollback(), Err("locked"));
        assert_eq!(p.to_string(), "transaction callback panicked: oops; rollback error: locked");
        assert_eq!(p.into_payload().downcast_ref::<&str>(), Some(&"oops"));
    }

    #[test]
    fn non_string_payloads_are_kept() {
        #[derive(Debug, PartialEq)]
        struct Fault(u8);

        let p = TransactionPanic::new(Box::new(Fault(7)), Ok(()));
        assert_eq!(p.message(), "non-string panic payload");
        assert_eq!(p.payload().downcast_ref::<Fault>(), Some(&Fault(7)));
    }
}
