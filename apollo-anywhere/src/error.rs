//! Execution errors.
use displaydoc::Display;
use thiserror::Error;

use crate::spec::SpecError;

/// Error type returned by resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for execution.
///
/// Execution is all or nothing: any of these aborts it and no partial result is returned.
#[derive(Error, Display, Debug)]
#[ignore_extra_doc_attributes]
#[non_exhaustive]
pub enum ExecutionError {
    /// no fragment named '{0}'
    UnknownFragment(String),

    /// {0}
    ///
    /// The resolver's own error, passed through untouched. Downcast it to get the original
    /// type back.
    Resolver(#[source] BoxError),

    /// {0}
    Spec(#[from] SpecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, Display, PartialEq)]
    /// database unavailable
    struct Unavailable;

    #[test]
    fn resolver_errors_are_passed_through() {
        let error = ExecutionError::Resolver(Box::new(Unavailable));
        assert_eq!(error.to_string(), "database unavailable");

        let ExecutionError::Resolver(source) = error else {
            panic!("expected a resolver error");
        };
        assert_eq!(source.downcast_ref::<Unavailable>(), Some(&Unavailable));
    }

    #[test]
    fn messages() {
        assert_eq!(
            ExecutionError::UnknownFragment("HeroFields".to_string()).to_string(),
            "no fragment named 'HeroFields'"
        );
        assert_eq!(
            ExecutionError::from(SpecError::NoExecutableDefinition).to_string(),
            "document contains no operation or fragment to execute"
        );
    }
}
