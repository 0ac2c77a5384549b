//! Executing documents against data that is already shaped like a result.

use displaydoc::Display;
use thiserror::Error;

use crate::error::BoxError;
use crate::error::ExecutionError;
use crate::execution::execute;
use crate::execution::ExecInfo;
use crate::execution::ExecutionOptions;
use crate::execution::Resolver;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::spec::Document;

/// A field required by the document is absent from the data.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
/// {key} missing on {data}
pub struct MissingField {
    pub key: String,
    pub data: String,
}

/// Reshapes `data` to the document: unrequested fields are dropped, aliases are read from the
/// data as is, and skipped fields are left out.
///
/// Lists are filtered element by element, at any depth. Null elements stay null.
pub fn filter(
    document: &Document,
    data: &Value,
    variables: &Object,
) -> Result<Value, ExecutionError> {
    let resolver = |_: &str, root: &Value, _: &Object, _: &(), info: &ExecInfo| {
        Ok::<_, BoxError>(root.get(info.result_key.as_str()).cloned())
    };
    filter_value(&resolver, document, data, variables)
}

fn filter_value(
    resolver: &dyn Resolver<()>,
    document: &Document,
    data: &Value,
    variables: &Object,
) -> Result<Value, ExecutionError> {
    match data {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => items
            .iter()
            .map(|item| filter_value(resolver, document, item, variables))
            .collect(),
        data => execute::<()>(
            resolver,
            document,
            data,
            &(),
            variables,
            ExecutionOptions::new(),
        ),
    }
}

/// Verifies that `data` holds every field the document requests.
///
/// Fragments are not checked: without type information there is no telling whether they
/// apply.
pub fn check(document: &Document, data: &Value, variables: &Object) -> Result<(), ExecutionError> {
    let resolver = |_: &str, root: &Value, _: &Object, _: &(), info: &ExecInfo| {
        match root.get(info.result_key.as_str()) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(BoxError::from(MissingField {
                key: info.result_key.as_str().to_string(),
                data: root.to_string(),
            })),
        }
    };
    let no_fragment = |_: &Value, _: &str, _: &()| false;

    execute::<()>(
        &resolver,
        document,
        data,
        &(),
        variables,
        ExecutionOptions::new().fragment_matcher(&no_fragment),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn filter_drops_unrequested_fields() {
        let document = Document::parse(
            r#"
            {
                alias: name
                friends { name }
                secret @skip(if: true)
            }
            "#,
        )
        .unwrap();
        let data = Value::from(json!({
            "alias": "R2-D2",
            "name": "unused",
            "secret": "hidden",
            "friends": [{"name": "Luke", "height": 1.72}, null],
        }));

        assert_eq!(
            filter(&document, &data, &Object::new()).unwrap(),
            Value::from(json!({
                "alias": "R2-D2",
                "friends": [{"name": "Luke"}, null],
            }))
        );
    }

    #[test]
    fn filter_lists_and_null() {
        let document = Document::parse("{ a }").unwrap();
        let data = Value::from(json!([{"a": 1, "b": 2}, {"a": 3}]));
        assert_eq!(
            filter(&document, &data, &Object::new()).unwrap(),
            Value::from(json!([{"a": 1}, {"a": 3}]))
        );
        assert_eq!(
            filter(&document, &Value::Null, &Object::new()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn filter_keeps_the_shape_of_lists() {
        let document = Document::parse("{ a }").unwrap();
        let data = Value::from(json!([{"a": 1, "b": 0}, null, [{"a": 2}, [null, {"a": 3}]]]));
        assert_eq!(
            filter(&document, &data, &Object::new()).unwrap(),
            Value::from(json!([{"a": 1}, null, [{"a": 2}, [null, {"a": 3}]]]))
        );
    }

    #[test]
    fn check_accepts_complete_data() {
        let document = Document::parse("{ a b { c } ... on T { d } }").unwrap();
        let data = Value::from(json!({"a": 1, "b": [{"c": null}]}));
        assert!(check(&document, &data, &Object::new()).is_ok());
    }

    #[test]
    fn check_reports_missing_fields() {
        let document = Document::parse("{ a b { c } }").unwrap();
        let data = Value::from(json!({"a": 1, "b": {"d": 2}}));

        let error = check(&document, &data, &Object::new()).unwrap_err();
        assert_eq!(error.to_string(), r#"c missing on {"d":2}"#);
        let ExecutionError::Resolver(error) = error else {
            panic!("expected a resolver error");
        };
        assert_eq!(
            error.downcast_ref::<MissingField>(),
            Some(&MissingField {
                key: "c".to_string(),
                data: r#"{"d":2}"#.to_string(),
            })
        );
    }
}
