//! Aggregation of errors collected from fan-out writes
//!
//! `MultiError::default()` is the uninitialized state: it holds no allocation
//! until the first real error is appended. Appending `Ok(())` is a no-op.

use super::error::{LoggerError, Result};
use std::fmt;

/// Ordered list of two or more errors, displayed joined by `"; "`.
#[derive(Debug, Default)]
pub struct ErrorList(Vec<LoggerError>);

impl ErrorList {
    pub fn errors(&self) -> &[LoggerError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// Accumulator for zero or more errors.
///
/// # Example
///
/// ```
/// use rust_structured_logger::{LoggerError, MultiError};
///
/// let mut errs = MultiError::default();
/// errs.append(Ok(()));
/// errs.push(LoggerError::other("foo"));
/// errs.push(LoggerError::other("bar"));
///
/// let err = errs.into_result().unwrap_err();
/// assert_eq!(err.to_string(), "foo; bar");
/// ```
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<LoggerError>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of `result`, if any
    pub fn append(&mut self, result: Result<()>) {
        if let Err(err) = result {
            self.errors.push(err);
        }
    }

    /// Record an error
    pub fn push(&mut self, err: LoggerError) {
        self.errors.push(err);
    }

    /// Chaining form of [`append`](Self::append)
    #[must_use]
    pub fn and(mut self, result: Result<()>) -> Self {
        self.append(result);
        self
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse into a single result
    ///
    /// No errors gives `Ok(())`, exactly one error is returned unchanged, and
    /// more than one becomes [`LoggerError::Multiple`].
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(LoggerError::Multiple(ErrorList(self.errors))),
        }
    }
}

impl Extend<LoggerError> for MultiError {
    fn extend<I: IntoIterator<Item = LoggerError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl FromIterator<Result<()>> for MultiError {
    fn from_iter<I: IntoIterator<Item = Result<()>>>(iter: I) -> Self {
        let mut errs = MultiError::default();
        for result in iter {
            errs.append(result);
        }
        errs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> LoggerError {
        LoggerError::other("foo")
    }

    fn bar() -> LoggerError {
        LoggerError::other("bar")
    }

    #[test]
    fn test_error_list_display() {
        assert_eq!(ErrorList::default().to_string(), "");
        assert_eq!(ErrorList(vec![foo()]).to_string(), "foo");
        assert_eq!(ErrorList(vec![foo(), bar()]).to_string(), "foo; bar");
    }

    #[test]
    fn test_empty_aggregator_is_ok() {
        assert!(MultiError::default().into_result().is_ok());

        let mut errs = MultiError::default();
        errs.append(Ok(()));
        errs.append(Ok(()));
        assert!(errs.is_empty());
        assert!(errs.into_result().is_ok());
    }

    #[test]
    fn test_single_error_is_returned_unchanged() {
        let mut errs = MultiError::default();
        errs.append(Err(LoggerError::ShortWrite {
            written: 1,
            expected: 4,
        }));

        match errs.into_result() {
            Err(LoggerError::ShortWrite { written, expected }) => {
                assert_eq!(written, 1);
                assert_eq!(expected, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_many_errors_join_in_order() {
        let errs = MultiError::default()
            .and(Ok(()))
            .and(Err(foo()))
            .and(Ok(()))
            .and(Err(bar()));
        assert_eq!(errs.len(), 2);

        let err = errs.into_result().unwrap_err();
        assert!(matches!(err, LoggerError::Multiple(ref list) if list.len() == 2));
        assert_eq!(err.to_string(), "foo; bar");
    }

    #[test]
    fn test_collect_from_results() {
        let errs: MultiError = vec![Ok(()), Err(foo()), Err(bar())].into_iter().collect();
        assert_eq!(errs.into_result().unwrap_err().to_string(), "foo; bar");
    }
}
