use std::fmt::{self, Display, Formatter};

use miette::Diagnostic;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure raised by a caller-supplied leaf predicate.
///
/// The engine never inspects or rewraps it: the original error is available
/// through [`PredicateError::into_inner`] and [`PredicateError::downcast_ref`].
#[derive(Debug)]
pub struct PredicateError(BoxError);

impl PredicateError {
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }

    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }

    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl Display for PredicateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for PredicateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// A condition that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCondition {
    #[error("`{0}` requires at least one operand")]
    EmptyOperands(&'static str),
    #[error("Condition nesting exceeds the maximum depth of {0}")]
    TooDeep(u32),
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Invalid condition: {0}")]
    #[diagnostic(code(qdsl::invalid_condition))]
    InvalidCondition(#[from] InvalidCondition),
    #[error(transparent)]
    #[diagnostic(code(qdsl::predicate))]
    Predicate(#[from] PredicateError),
    #[error("Invalid regular expression `{pattern}`")]
    #[diagnostic(code(qdsl::invalid_regex))]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },
    #[error("Unsupported document: {0}")]
    #[diagnostic(
        code(qdsl::unsupported_document),
        help("documents must be a mapping or a list at the top level")
    )]
    UnsupportedDocument(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_predicate_error_keeps_original() {
        let err = PredicateError::new(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert_eq!(err.to_string(), "missing");
        assert_eq!(
            err.downcast_ref::<io::Error>().map(|e| e.kind()),
            Some(io::ErrorKind::NotFound)
        );
        let inner = err.into_inner();
        assert!(inner.downcast::<io::Error>().is_ok());
    }

    #[test]
    fn test_predicate_error_from_str() {
        let err = PredicateError::new("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_error_display() {
        let err: Error = InvalidCondition::EmptyOperands("all").into();
        assert_eq!(
            err.to_string(),
            "Invalid condition: `all` requires at least one operand"
        );
        let err: Error = PredicateError::new("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
