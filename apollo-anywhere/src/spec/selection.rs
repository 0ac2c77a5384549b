use indexmap::IndexMap;
use serde_json_bytes::ByteString;

use crate::json_ext::Object;
use crate::json_ext::Value;

pub(crate) const SKIP_DIRECTIVE_NAME: &str = "skip";
pub(crate) const INCLUDE_DIRECTIVE_NAME: &str = "include";

/// Arguments of a field or directive, in document order.
pub type Arguments = IndexMap<ByteString, InputValue>;

/// One entry of a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
    FragmentSpread(FragmentSpread),
}

/// A requested field.
///
/// A field without a selection set is a leaf: whatever the resolver returns for it is taken
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: ByteString,
    pub alias: Option<ByteString>,
    pub arguments: Arguments,
    pub directives: Vec<Directive>,
    pub selection_set: Option<Vec<Selection>>,
}

/// `... on Type { }`
///
/// The type condition is optional in GraphQL. Without one, the fragment always applies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub directives: Vec<Directive>,
    pub selection_set: Vec<Selection>,
}

/// `...Name`, resolved through the document's fragment definitions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FragmentSpread {
    pub name: String,
    pub directives: Vec<Directive>,
}

/// A directive application such as `@skip(if: $hidden)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Directive {
    pub name: String,
    pub arguments: Arguments,
}

/// An argument value as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Variable(String),
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    List(Vec<InputValue>),
    Object(IndexMap<ByteString, InputValue>),
}

impl Selection {
    pub fn directives(&self) -> &[Directive] {
        match self {
            Selection::Field(field) => &field.directives,
            Selection::InlineFragment(fragment) => &fragment.directives,
            Selection::FragmentSpread(spread) => &spread.directives,
        }
    }

    /// Whether `@skip`/`@include` let this selection take part in execution.
    pub fn should_include(&self, variables: &Object) -> bool {
        should_include(self.directives(), variables)
    }
}

impl Field {
    pub fn new(name: impl Into<ByteString>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: Arguments::new(),
            directives: Vec::new(),
            selection_set: None,
        }
    }

    /// The key under which this field appears in a result: its alias if it has one, else its
    /// name.
    pub fn response_key(&self) -> &ByteString {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    pub fn is_leaf(&self) -> bool {
        self.selection_set.is_none()
    }
}

impl Directive {
    pub fn argument_by_name(&self, name: &str) -> Option<&InputValue> {
        self.arguments.get(name)
    }
}

impl InputValue {
    /// Turns the literal into a value, substituting variables.
    ///
    /// Variables missing from `variables` resolve to `null`.
    pub fn resolve(&self, variables: &Object) -> Value {
        match self {
            InputValue::Variable(name) => variables.get(name.as_str()).cloned().unwrap_or_default(),
            InputValue::Null => Value::Null,
            InputValue::Boolean(b) => Value::Bool(*b),
            InputValue::Int(i) => Value::from(*i),
            InputValue::Float(f) => Value::from(*f),
            InputValue::String(s) | InputValue::Enum(s) => Value::from(s.as_str()),
            InputValue::List(values) => values.iter().map(|v| v.resolve(variables)).collect(),
            InputValue::Object(fields) => Value::from(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.resolve(variables)))
                    .collect::<Object>(),
            ),
        }
    }
}

/// Resolves arguments against the variables.
///
/// An argument given as a variable that was not provided is left out, as if the argument had
/// not been written.
pub fn resolve_arguments(arguments: &Arguments, variables: &Object) -> Object {
    arguments
        .iter()
        .filter(|(_, value)| match value {
            InputValue::Variable(name) => variables.contains_key(name.as_str()),
            _ => true,
        })
        .map(|(name, value)| (name.clone(), value.resolve(variables)))
        .collect()
}

/// Evaluates `@skip` and `@include`.
///
/// A selection is excluded by any `@skip(if: true)` or `@include(if: false)`. Other directives
/// are ignored. A condition that does not evaluate to a boolean (a missing variable, or one
/// holding something else) leaves its directive inactive.
pub fn should_include(directives: &[Directive], variables: &Object) -> bool {
    directives.iter().all(|directive| {
        let condition = || Condition::parse(directive).and_then(|c| c.eval(variables));
        match directive.name.as_str() {
            SKIP_DIRECTIVE_NAME => !condition().unwrap_or(false),
            INCLUDE_DIRECTIVE_NAME => condition().unwrap_or(true),
            _ => true,
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Condition {
    Yes,
    No,
    Variable(String),
}

impl Condition {
    pub(crate) fn parse(directive: &Directive) -> Option<Self> {
        match directive.argument_by_name("if")? {
            InputValue::Boolean(true) => Some(Condition::Yes),
            InputValue::Boolean(false) => Some(Condition::No),
            InputValue::Variable(variable) => Some(Condition::Variable(variable.clone())),
            _ => None,
        }
    }

    pub(crate) fn eval(&self, variables: &Object) -> Option<bool> {
        match self {
            Condition::Yes => Some(true),
            Condition::No => Some(false),
            Condition::Variable(variable_name) => variables
                .get(variable_name.as_str())
                .and_then(|v| v.as_bool()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    fn directive(name: &str, condition: InputValue) -> Directive {
        let mut arguments = Arguments::new();
        arguments.insert("if".into(), condition);
        Directive {
            name: name.to_string(),
            arguments,
        }
    }

    fn variables(value: serde_json_bytes::Value) -> Object {
        Value::from(value).as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn include_skip_literals() {
        let vars = Object::new();
        assert!(should_include(&[], &vars));
        assert!(!should_include(
            &[directive("skip", InputValue::Boolean(true))],
            &vars
        ));
        assert!(should_include(
            &[directive("skip", InputValue::Boolean(false))],
            &vars
        ));
        assert!(!should_include(
            &[directive("include", InputValue::Boolean(false))],
            &vars
        ));
        assert!(should_include(
            &[directive("include", InputValue::Boolean(true))],
            &vars
        ));
        assert!(!should_include(
            &[
                directive("include", InputValue::Boolean(true)),
                directive("skip", InputValue::Boolean(true)),
            ],
            &vars
        ));
    }

    #[test]
    fn include_skip_variables() {
        let vars = variables(json!({"yes": true, "no": false, "text": "true"}));
        let skip = |name: &str| directive("skip", InputValue::Variable(name.to_string()));
        let include = |name: &str| directive("include", InputValue::Variable(name.to_string()));

        assert!(!should_include(&[skip("yes")], &vars));
        assert!(should_include(&[skip("no")], &vars));
        assert!(!should_include(&[include("no")], &vars));
        assert!(should_include(&[include("yes")], &vars));

        // not evaluated to a boolean: the directive stays inactive
        assert!(should_include(&[skip("missing")], &vars));
        assert!(should_include(&[include("missing")], &vars));
        assert!(should_include(&[skip("text")], &vars));
    }

    #[test]
    fn unknown_directives_are_ignored() {
        let vars = Object::new();
        assert!(should_include(
            &[directive("client", InputValue::Boolean(false))],
            &vars
        ));
    }

    #[test]
    fn response_key_prefers_alias() {
        let mut field = Field::new("name");
        assert_eq!(field.response_key().as_str(), "name");
        field.alias = Some("alias".into());
        assert_eq!(field.response_key().as_str(), "alias");
    }

    #[test]
    fn arguments_substitute_variables() {
        let vars = variables(json!({"id": 4, "nested": [1, 2]}));
        let mut object = IndexMap::new();
        object.insert("inner".into(), InputValue::Variable("nested".to_string()));
        object.insert("gone".into(), InputValue::Variable("missing".to_string()));
        let mut arguments = Arguments::new();
        arguments.insert("id".into(), InputValue::Variable("id".to_string()));
        arguments.insert("missing".into(), InputValue::Variable("missing".to_string()));
        arguments.insert("kind".into(), InputValue::Enum("HUMAN".to_string()));
        arguments.insert(
            "list".into(),
            InputValue::List(vec![InputValue::Int(1), InputValue::Float(2.5), InputValue::Null]),
        );
        arguments.insert("object".into(), InputValue::Object(object));

        assert_eq!(
            Value::from(resolve_arguments(&arguments, &vars)),
            Value::from(json!({
                "id": 4,
                "kind": "HUMAN",
                "list": [1, 2.5, null],
                "object": {"inner": [1, 2], "gone": null},
            }))
        );
    }
}
