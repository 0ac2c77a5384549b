//! Executes a document against a resolver.
//!
//! Every field of the document is handed to a single [`Resolver`], and the result mirrors the
//! shape of the query. When a previous result is provided, every part of the new result that
//! did not change is the previous value itself, so consumers can detect unchanged subtrees by
//! comparing identities ([`Value::is_same`]).

mod engine;

use derivative::Derivative;
use indexmap::IndexMap;
use serde_json_bytes::ByteString;

use self::engine::ExecutionContext;
use crate::error::BoxError;
use crate::error::ExecutionError;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::spec::Document;
use crate::spec::Fragments;

/// Produces the value of a field.
///
/// Returning `Ok(None)` means the field has no value at all: it is left out of the result.
/// Errors abort the execution and are returned to the caller as
/// [`ExecutionError::Resolver`].
///
/// A field that has a selection set must resolve to null, an object, or a (possibly nested)
/// list of objects and nulls. Anything else is a contract violation.
///
/// Implemented for closures, which need their argument types spelled out:
///
/// ```ignore
/// let resolver = |field_name: &str, root: &Value, _: &Object, _: &(), _: &ExecInfo| {
///     Ok(root.get(field_name).cloned())
/// };
/// ```
pub trait Resolver<C> {
    fn resolve(
        &self,
        field_name: &str,
        root_value: &Value,
        arguments: &Object,
        context_value: &C,
        info: &ExecInfo,
    ) -> Result<Option<Value>, BoxError>;
}

impl<C, F> Resolver<C> for F
where
    F: Fn(&str, &Value, &Object, &C, &ExecInfo) -> Result<Option<Value>, BoxError>,
{
    fn resolve(
        &self,
        field_name: &str,
        root_value: &Value,
        arguments: &Object,
        context_value: &C,
        info: &ExecInfo,
    ) -> Result<Option<Value>, BoxError> {
        self(field_name, root_value, arguments, context_value, info)
    }
}

/// Decides whether a value satisfies a fragment's type condition.
pub trait FragmentMatcher<C> {
    fn matches(&self, root_value: &Value, type_condition: &str, context_value: &C) -> bool;
}

impl<C, F> FragmentMatcher<C> for F
where
    F: Fn(&Value, &str, &C) -> bool,
{
    fn matches(&self, root_value: &Value, type_condition: &str, context_value: &C) -> bool {
        self(root_value, type_condition, context_value)
    }
}

/// The default fragment matcher: every fragment applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAll;

impl<C> FragmentMatcher<C> for MatchAll {
    fn matches(&self, _root_value: &Value, _type_condition: &str, _context_value: &C) -> bool {
        true
    }
}

/// Post-processes every object built from a selection set.
///
/// Receives the fields gathered for the selection set and the value they were resolved from.
/// Whatever it returns replaces the object in the result.
pub trait ResultMapper {
    fn map(&self, fields: Object, root_value: &Value) -> Value;
}

impl<F> ResultMapper for F
where
    F: Fn(Object, &Value) -> Value,
{
    fn map(&self, fields: Object, root_value: &Value) -> Value {
        self(fields, root_value)
    }
}

/// What a resolver knows about the field it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecInfo {
    /// The field has no selection set.
    pub is_leaf: bool,
    /// The key of the field in the result, its alias or its name.
    pub result_key: ByteString,
    /// Directives applied to the field, with their arguments resolved.
    pub directives: IndexMap<String, Object>,
}

/// Optional parts of an execution.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct ExecutionOptions<'a, C> {
    #[derivative(Debug = "ignore")]
    fragment_matcher: Option<&'a dyn FragmentMatcher<C>>,
    #[derivative(Debug = "ignore")]
    result_mapper: Option<&'a dyn ResultMapper>,
    previous_result: Option<&'a Value>,
}

impl<'a, C> ExecutionOptions<'a, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides which fragments apply. Defaults to [`MatchAll`].
    pub fn fragment_matcher(mut self, fragment_matcher: &'a dyn FragmentMatcher<C>) -> Self {
        self.fragment_matcher = Some(fragment_matcher);
        self
    }

    /// Transforms each object of the result. Identities of a previous result are not
    /// preserved when a mapper is set.
    pub fn result_mapper(mut self, result_mapper: &'a dyn ResultMapper) -> Self {
        self.result_mapper = Some(result_mapper);
        self
    }

    /// The result of a previous execution of the same document.
    pub fn previous_result(mut self, previous_result: &'a Value) -> Self {
        self.previous_result = Some(previous_result);
        self
    }
}

/// Executes `document` with `resolver`.
///
/// The document's main definition (see [`Document::main_definition`]) is resolved starting
/// from `root_value`. `context_value` is handed unchanged to the resolver and the fragment
/// matcher. Default values of the operation's variables complete `variable_values`.
#[tracing::instrument(skip_all, level = "trace")]
pub fn execute<C>(
    resolver: &dyn Resolver<C>,
    document: &Document,
    root_value: &Value,
    context_value: &C,
    variable_values: &Object,
    options: ExecutionOptions<'_, C>,
) -> Result<Value, ExecutionError> {
    let main_definition = document.main_definition()?;
    let fragments = Fragments::new(document.fragment_definitions());
    let variables = main_definition.variables(variable_values);

    let context = ExecutionContext {
        fragments: &fragments,
        context_value,
        variables: &variables,
        resolver,
        fragment_matcher: options.fragment_matcher.unwrap_or(&MatchAll),
        result_mapper: options.result_mapper,
    };

    let (result, changed) = context.execute_selection_set(
        main_definition.selection_set(),
        root_value,
        options.previous_result,
    )?;
    tracing::trace!(changed, "execution done");
    Ok(result)
}
