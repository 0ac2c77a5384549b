//! The executable subset of a GraphQL document.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

mod document;
mod fragments;
mod selection;

use displaydoc::Display;
pub use document::*;
pub use fragments::*;
pub use selection::*;
use thiserror::Error;

/// GraphQL document errors.
#[derive(Error, Debug, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpecError {
    /// parsing error: {0}
    ParsingError(String),
    /// missing {0} in document
    MissingNode(&'static str),
    /// invalid number literal '{0}'
    InvalidNumber(String),
    /// document contains no operation or fragment to execute
    NoExecutableDefinition,
}
