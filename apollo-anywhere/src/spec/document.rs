use std::borrow::Cow;
use std::str::FromStr;

use apollo_parser::cst;
use apollo_parser::cst::CstNode;
use apollo_parser::Parser;
use serde_json_bytes::ByteString;

use super::Arguments;
use super::Directive;
use super::Field;
use super::FragmentSpread;
use super::InlineFragment;
use super::InputValue;
use super::Selection;
use super::SpecError;
use crate::configuration::Configuration;
use crate::json_ext::Object;

/// A parsed GraphQL document: its operations and fragment definitions.
///
/// Documents are usually obtained from [`Document::parse`], but nothing prevents building one
/// by hand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub operations: Vec<Operation>,
    pub fragments: Vec<FragmentDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variables: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selection_set: Vec<Selection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
    Subscription,
}

/// `$name: Type = default`. Only the default value matters for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub default_value: Option<InputValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub selection_set: Vec<Selection>,
}

/// What gets executed for a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MainDefinition<'a> {
    Operation(&'a Operation),
    Fragment(&'a FragmentDefinition),
}

impl Document {
    pub fn parse(source: impl AsRef<str>) -> Result<Self, SpecError> {
        Self::parse_with_configuration(source, &Configuration::default())
    }

    pub fn parse_with_configuration(
        source: impl AsRef<str>,
        configuration: &Configuration,
    ) -> Result<Self, SpecError> {
        let mut parser = Parser::new(source.as_ref())
            .recursion_limit(configuration.parser.recursion_limit);
        if let Some(token_limit) = configuration.parser.token_limit {
            parser = parser.token_limit(token_limit);
        }
        let tree = parser.parse();

        let recursion_limit = tree.recursion_limit();
        tracing::trace!(?recursion_limit, "recursion limit data");

        let errors = tree
            .errors()
            .map(|err| format!("{err:?}"))
            .collect::<Vec<_>>();
        if !errors.is_empty() {
            let errors = errors.join(", ");
            tracing::debug!("parsing error(s): {}", errors);
            return Err(SpecError::ParsingError(errors));
        }

        let mut document = Document::default();
        for definition in tree.document().definitions() {
            match definition {
                // Spec: https://spec.graphql.org/draft/#OperationDefinition
                cst::Definition::OperationDefinition(operation) => {
                    document.operations.push(operation_from_cst(operation)?)
                }
                // Spec: https://spec.graphql.org/draft/#FragmentDefinition
                cst::Definition::FragmentDefinition(fragment) => {
                    document.fragments.push(fragment_from_cst(fragment)?)
                }
                // type system definitions have nothing to execute
                _ => {}
            }
        }
        Ok(document)
    }

    /// The definition to execute: the first operation, or the first fragment of a document
    /// that only holds fragments.
    pub fn main_definition(&self) -> Result<MainDefinition<'_>, SpecError> {
        if let Some(operation) = self.operations.first() {
            return Ok(MainDefinition::Operation(operation));
        }
        self.fragments
            .first()
            .map(MainDefinition::Fragment)
            .ok_or(SpecError::NoExecutableDefinition)
    }

    pub fn fragment_definitions(&self) -> &[FragmentDefinition] {
        &self.fragments
    }
}

impl FromStr for Document {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Document::parse(s)
    }
}

impl MainDefinition<'_> {
    pub fn selection_set(&self) -> &[Selection] {
        match self {
            MainDefinition::Operation(operation) => &operation.selection_set,
            MainDefinition::Fragment(fragment) => &fragment.selection_set,
        }
    }

    /// The provided variables, completed with the operation's default values.
    pub fn variables<'v>(&self, provided: &'v Object) -> Cow<'v, Object> {
        match self {
            MainDefinition::Operation(operation)
                if operation
                    .variables
                    .iter()
                    .any(|variable| variable.default_value.is_some()) =>
            {
                // default values are literals, no variable to substitute
                let no_variables = Object::new();
                let mut variables = operation
                    .variables
                    .iter()
                    .filter_map(|variable| {
                        let value = variable.default_value.as_ref()?;
                        Some((variable.name.as_str().into(), value.resolve(&no_variables)))
                    })
                    .collect::<Object>();
                variables.extend(provided.iter().map(|(k, v)| (k.clone(), v.clone())));
                Cow::Owned(variables)
            }
            _ => Cow::Borrowed(provided),
        }
    }
}

fn operation_from_cst(operation: cst::OperationDefinition) -> Result<Operation, SpecError> {
    let kind = match operation.operation_type() {
        Some(ty) if ty.mutation_token().is_some() => OperationKind::Mutation,
        Some(ty) if ty.subscription_token().is_some() => OperationKind::Subscription,
        // the query shorthand has no operation type
        _ => OperationKind::Query,
    };
    let name = operation.name().map(|name| name.text().to_string());
    let variables = match operation.variable_definitions() {
        Some(definitions) => definitions
            .variable_definitions()
            .map(|definition| {
                Ok(VariableDefinition {
                    name: name_text(
                        definition.variable().and_then(|v| v.name()),
                        "variable name",
                    )?,
                    default_value: definition
                        .default_value()
                        .and_then(|default| default.value())
                        .map(value_from_cst)
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>, SpecError>>()?,
        None => Vec::new(),
    };

    Ok(Operation {
        kind,
        name,
        variables,
        directives: directives_from_cst(operation.directives())?,
        selection_set: selection_set_from_cst(operation.selection_set())?,
    })
}

fn fragment_from_cst(fragment: cst::FragmentDefinition) -> Result<FragmentDefinition, SpecError> {
    Ok(FragmentDefinition {
        name: name_text(
            fragment.fragment_name().and_then(|name| name.name()),
            "fragment name",
        )?,
        type_condition: fragment
            .type_condition()
            .map(type_condition_from_cst)
            .transpose()?
            .ok_or(SpecError::MissingNode("fragment type condition"))?,
        selection_set: selection_set_from_cst(fragment.selection_set())?,
    })
}

fn selection_set_from_cst(
    selection_set: Option<cst::SelectionSet>,
) -> Result<Vec<Selection>, SpecError> {
    selection_set
        .ok_or(SpecError::MissingNode("selection set"))?
        .selections()
        .map(selection_from_cst)
        .collect()
}

fn selection_from_cst(selection: cst::Selection) -> Result<Selection, SpecError> {
    Ok(match selection {
        // Spec: https://spec.graphql.org/draft/#Field
        cst::Selection::Field(field) => Selection::Field(Field {
            name: name_text(field.name(), "field name")?.into(),
            alias: field
                .alias()
                .map(|alias| name_text(alias.name(), "alias name"))
                .transpose()?
                .map(ByteString::from),
            arguments: arguments_from_cst(field.arguments())?,
            directives: directives_from_cst(field.directives())?,
            selection_set: field
                .selection_set()
                .map(|selection_set| selection_set_from_cst(Some(selection_set)))
                .transpose()?,
        }),
        // Spec: https://spec.graphql.org/draft/#InlineFragment
        cst::Selection::InlineFragment(fragment) => Selection::InlineFragment(InlineFragment {
            type_condition: fragment
                .type_condition()
                .map(type_condition_from_cst)
                .transpose()?,
            directives: directives_from_cst(fragment.directives())?,
            selection_set: selection_set_from_cst(fragment.selection_set())?,
        }),
        // Spec: https://spec.graphql.org/draft/#FragmentSpread
        cst::Selection::FragmentSpread(spread) => Selection::FragmentSpread(FragmentSpread {
            name: name_text(
                spread.fragment_name().and_then(|name| name.name()),
                "fragment name",
            )?,
            directives: directives_from_cst(spread.directives())?,
        }),
    })
}

fn type_condition_from_cst(type_condition: cst::TypeCondition) -> Result<String, SpecError> {
    name_text(
        type_condition.named_type().and_then(|ty| ty.name()),
        "type condition",
    )
}

fn directives_from_cst(directives: Option<cst::Directives>) -> Result<Vec<Directive>, SpecError> {
    let Some(directives) = directives else {
        return Ok(Vec::new());
    };
    directives
        .directives()
        .map(|directive| {
            Ok(Directive {
                name: name_text(directive.name(), "directive name")?,
                arguments: arguments_from_cst(directive.arguments())?,
            })
        })
        .collect()
}

fn arguments_from_cst(arguments: Option<cst::Arguments>) -> Result<Arguments, SpecError> {
    let Some(arguments) = arguments else {
        return Ok(Arguments::new());
    };
    arguments
        .arguments()
        .map(|argument| {
            let name = name_text(argument.name(), "argument name")?;
            let value = argument
                .value()
                .ok_or(SpecError::MissingNode("argument value"))?;
            Ok((ByteString::from(name), value_from_cst(value)?))
        })
        .collect()
}

fn value_from_cst(value: cst::Value) -> Result<InputValue, SpecError> {
    Ok(match value {
        cst::Value::Variable(variable) => {
            InputValue::Variable(name_text(variable.name(), "variable name")?)
        }
        cst::Value::StringValue(string) => InputValue::String(String::from(string)),
        cst::Value::FloatValue(float) => InputValue::Float(parse_float(&float.source_string())?),
        cst::Value::IntValue(int) => {
            let text = int.source_string();
            match text.trim().parse::<i64>() {
                Ok(int) => InputValue::Int(int),
                // too large for an i64, keep it as a float
                Err(_) => InputValue::Float(parse_float(&text)?),
            }
        }
        cst::Value::BooleanValue(boolean) => InputValue::Boolean(boolean.true_token().is_some()),
        cst::Value::NullValue(_) => InputValue::Null,
        cst::Value::EnumValue(value) => InputValue::Enum(value.source_string().trim().to_string()),
        cst::Value::ListValue(list) => InputValue::List(
            list.values()
                .map(value_from_cst)
                .collect::<Result<_, SpecError>>()?,
        ),
        cst::Value::ObjectValue(object) => InputValue::Object(
            object
                .object_fields()
                .map(|field| {
                    let name = name_text(field.name(), "object field name")?;
                    let value = field
                        .value()
                        .ok_or(SpecError::MissingNode("object field value"))?;
                    Ok((ByteString::from(name), value_from_cst(value)?))
                })
                .collect::<Result<_, SpecError>>()?,
        ),
    })
}

fn parse_float(text: &str) -> Result<f64, SpecError> {
    text.trim()
        .parse()
        .map_err(|_| SpecError::InvalidNumber(text.trim().to_string()))
}

fn name_text(name: Option<cst::Name>, node: &'static str) -> Result<String, SpecError> {
    name.map(|name| name.text().to_string())
        .ok_or(SpecError::MissingNode(node))
}
