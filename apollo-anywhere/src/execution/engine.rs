use std::sync::Arc;

use super::ExecInfo;
use super::FragmentMatcher;
use super::Resolver;
use super::ResultMapper;
use crate::error::ExecutionError;
use crate::json_ext::merge_entry;
use crate::json_ext::merge_object;
use crate::json_ext::same_value;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::spec::resolve_arguments;
use crate::spec::Field;
use crate::spec::Fragments;
use crate::spec::Selection;

/// Everything an execution needs, shared by reference through the whole traversal.
///
/// None of it changes while executing.
pub(crate) struct ExecutionContext<'a, C> {
    pub(crate) fragments: &'a Fragments<'a>,
    pub(crate) context_value: &'a C,
    pub(crate) variables: &'a Object,
    pub(crate) resolver: &'a dyn Resolver<C>,
    pub(crate) fragment_matcher: &'a dyn FragmentMatcher<C>,
    pub(crate) result_mapper: Option<&'a dyn ResultMapper>,
}

impl<C> ExecutionContext<'_, C> {
    /// Resolves a selection set against `root_value`.
    ///
    /// Returns the result and whether it differs from `previous_result`. When it does not,
    /// the result is `previous_result` itself.
    pub(crate) fn execute_selection_set(
        &self,
        selection_set: &[Selection],
        root_value: &Value,
        previous_result: Option<&Value>,
    ) -> Result<(Value, bool), ExecutionError> {
        let mut output = Object::new();
        let changed =
            self.collect_fields(selection_set, root_value, previous_result, &mut output)?;

        if let Some(result_mapper) = self.result_mapper {
            return Ok((result_mapper.map(output, root_value), true));
        }

        match previous_result {
            Some(previous_result) if !changed => Ok((previous_result.clone(), false)),
            _ => Ok((Value::Object(Arc::new(output)), true)),
        }
    }

    /// Resolves the fields of a selection set into `output`, following fragments.
    ///
    /// Returns whether any of them differs from its counterpart in `previous_result`. Only
    /// the fields that are resolved are compared: `output` may receive the same key from
    /// several fields and fragments, so keys of `previous_result` left unfilled here are not
    /// a change by themselves.
    fn collect_fields(
        &self,
        selection_set: &[Selection],
        root_value: &Value,
        previous_result: Option<&Value>,
        output: &mut Object,
    ) -> Result<bool, ExecutionError> {
        let mut changed = previous_result.is_none();

        for selection in selection_set {
            if !selection.should_include(self.variables) {
                continue;
            }

            match selection {
                Selection::Field(field) => {
                    let key = field.response_key();
                    let previous_value = previous_result.and_then(|p| p.get(key.as_str()));
                    let value = self.execute_field(field, root_value, previous_value)?;
                    if !same_value(value.as_ref(), previous_value) {
                        changed = true;
                    }
                    if let Some(value) = value {
                        merge_entry(output, key, &value);
                    }
                }
                Selection::InlineFragment(fragment) => {
                    changed |= self.execute_fragment(
                        fragment.type_condition.as_deref(),
                        &fragment.selection_set,
                        root_value,
                        previous_result,
                        output,
                    )?;
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = self.fragments.get(&spread.name).ok_or_else(|| {
                        tracing::debug!(fragment = %spread.name, "unknown fragment");
                        ExecutionError::UnknownFragment(spread.name.clone())
                    })?;
                    changed |= self.execute_fragment(
                        Some(&fragment.type_condition),
                        &fragment.selection_set,
                        root_value,
                        previous_result,
                        output,
                    )?;
                }
            }
        }

        Ok(changed)
    }

    /// Merges a fragment's fields into `output` if its type condition matches.
    ///
    /// With a result mapper, the fragment's selection set is mapped on its own before being
    /// merged. Returns whether the fragment's fields changed.
    fn execute_fragment(
        &self,
        type_condition: Option<&str>,
        selection_set: &[Selection],
        root_value: &Value,
        previous_result: Option<&Value>,
        output: &mut Object,
    ) -> Result<bool, ExecutionError> {
        if let Some(type_condition) = type_condition {
            if !self
                .fragment_matcher
                .matches(root_value, type_condition, self.context_value)
            {
                tracing::trace!(type_condition, "fragment does not match");
                return Ok(false);
            }
        }

        if self.result_mapper.is_none() {
            return self.collect_fields(selection_set, root_value, previous_result, output);
        }

        let (fields, changed) =
            self.execute_selection_set(selection_set, root_value, previous_result)?;
        match &fields {
            Value::Object(fields) => merge_object(output, fields),
            other => {
                tracing::debug!(
                    "mapped fragment result is not an object and cannot be merged: {}",
                    other
                );
            }
        }
        Ok(changed)
    }

    fn execute_field(
        &self,
        field: &Field,
        root_value: &Value,
        previous_result: Option<&Value>,
    ) -> Result<Option<Value>, ExecutionError> {
        let arguments = resolve_arguments(&field.arguments, self.variables);
        let info = ExecInfo {
            is_leaf: field.is_leaf(),
            result_key: field.response_key().clone(),
            directives: field
                .directives
                .iter()
                .map(|directive| {
                    (
                        directive.name.clone(),
                        resolve_arguments(&directive.arguments, self.variables),
                    )
                })
                .collect(),
        };

        let result = self
            .resolver
            .resolve(
                field.name.as_str(),
                root_value,
                &arguments,
                self.context_value,
                &info,
            )
            .map_err(ExecutionError::Resolver)?;

        let Some(selection_set) = &field.selection_set else {
            return Ok(result);
        };

        match result {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(Value::Null)),
            Some(Value::Array(list)) => self
                .execute_sub_selected_array(selection_set, &list, previous_result)
                .map(|(value, _)| Some(value)),
            Some(value) => {
                if !value.is_object() {
                    failfast_debug!(
                        "field '{}' has a selection set but resolved to a scalar: {}",
                        field.name.as_str(),
                        value
                    );
                }
                self.execute_selection_set(selection_set, &value, previous_result)
                    .map(|(value, _)| Some(value))
            }
        }
    }

    /// Applies a selection set to each element of a list, recursing into nested lists.
    ///
    /// Null elements stay null. The list is unchanged when every element is the same as the
    /// previous element at its index, in which case `previous_result` is returned.
    fn execute_sub_selected_array(
        &self,
        selection_set: &[Selection],
        list: &[Value],
        previous_result: Option<&Value>,
    ) -> Result<(Value, bool), ExecutionError> {
        let previous_list = previous_result.and_then(Value::as_array);
        let mut changed = previous_list.map_or(true, |previous| previous.len() != list.len());

        let mut output = Vec::with_capacity(list.len());
        for (index, item) in list.iter().enumerate() {
            let previous_item = previous_list.and_then(|previous| previous.get(index));
            let value = match item {
                Value::Null => Value::Null,
                Value::Array(inner) => {
                    self.execute_sub_selected_array(selection_set, inner, previous_item)?
                        .0
                }
                item => self.execute_selection_set(selection_set, item, previous_item)?.0,
            };
            if !same_value(Some(&value), previous_item) {
                changed = true;
            }
            output.push(value);
        }

        match previous_result {
            Some(previous_result) if !changed => Ok((previous_result.clone(), false)),
            _ => Ok((Value::Array(Arc::new(output)), true)),
        }
    }
}
