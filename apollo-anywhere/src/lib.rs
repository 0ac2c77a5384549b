//! Run GraphQL queries against any data.
//!
//! A [`Document`] is executed by asking a single [`Resolver`] for the value of each field and
//! recursing into sub-selections. The result has the shape of the query. Executing again with
//! the previous result keeps every unchanged subtree of that result by identity, which makes
//! change detection a matter of comparing references.
//!
//! ```ignore
//! let document = Document::parse("{ hero { name } }")?;
//! let resolver = |field: &str, root: &Value, _: &Object, _: &(), _: &ExecInfo| {
//!     Ok(root.get(field).cloned())
//! };
//! let result = execute(&resolver, &document, &data, &(), &Object::new(), ExecutionOptions::new())?;
//! ```

#![cfg_attr(feature = "failfast", allow(unreachable_code))]
#![warn(unreachable_pub)]

macro_rules! failfast_debug {
    ($($tokens:tt)+) => {{
        tracing::debug!($($tokens)+);
        #[cfg(feature = "failfast")]
        panic!(
            "failfast triggered. \
            Please remove the feature failfast if you don't want to see these panics"
        );
    }};
}

pub mod configuration;
pub mod error;
mod execution;
pub mod json_ext;
pub mod spec;
mod utilities;

pub use configuration::Configuration;
pub use error::BoxError;
pub use error::ExecutionError;
pub use execution::execute;
pub use execution::ExecInfo;
pub use execution::ExecutionOptions;
pub use execution::FragmentMatcher;
pub use execution::MatchAll;
pub use execution::Resolver;
pub use execution::ResultMapper;
pub use json_ext::Object;
pub use json_ext::Value;
pub use spec::Document;
pub use utilities::check;
pub use utilities::filter;
pub use utilities::MissingField;
