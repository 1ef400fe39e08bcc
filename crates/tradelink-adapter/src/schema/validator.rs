/*
[INPUT]:  JSON values and schemas / endpoint descriptors
[OUTPUT]: Unchanged input or a ValidationError naming the offending path
[POS]:    Schema layer - structural validation of requests and responses
[UPDATE]: When schema kinds change or error reporting needs more detail
*/

use serde_json::Value;
use thiserror::Error;

use super::registry::EndpointDescriptor;
use super::types::Schema;

/// A value did not match its schema.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate an outbound request against its endpoint descriptor.
pub fn validate_request<'a>(
    descriptor: &EndpointDescriptor,
    request: &'a Value,
) -> Result<&'a Value, ValidationError> {
    validate(&descriptor.request, request, "request")?;
    Ok(request)
}

/// Validate an inbound response against its endpoint descriptor.
pub fn validate_response<'a>(
    descriptor: &EndpointDescriptor,
    response: &'a Value,
) -> Result<&'a Value, ValidationError> {
    validate(&descriptor.response, response, "response")?;
    Ok(response)
}

/// Check `value` against `schema`; `path` names the value in errors.
pub fn validate(schema: &Schema, value: &Value, path: &str) -> Result<(), ValidationError> {
    match schema {
        Schema::Any => Ok(()),
        Schema::Null => expect_type(value.is_null(), schema, value, path),
        Schema::Boolean => expect_type(value.is_boolean(), schema, value, path),
        Schema::String { allowed } => {
            let Some(text) = value.as_str() else {
                return Err(type_mismatch(schema, value, path));
            };
            match allowed {
                Some(allowed) if !allowed.contains(&text) => Err(ValidationError::new(
                    path,
                    format!("value {text:?} is not one of {allowed:?}"),
                )),
                _ => Ok(()),
            }
        }
        Schema::Number { allowed } => {
            let Some(number) = value.as_f64() else {
                return Err(type_mismatch(schema, value, path));
            };
            match allowed {
                Some(allowed) if !allowed.contains(&number) => Err(ValidationError::new(
                    path,
                    format!("value {number} is not one of {allowed:?}"),
                )),
                _ => Ok(()),
            }
        }
        Schema::Array { items } => {
            let Some(elements) = value.as_array() else {
                return Err(type_mismatch(schema, value, path));
            };
            if let Some(items) = items {
                for (index, element) in elements.iter().enumerate() {
                    validate(items, element, &format!("{path}[{index}]"))?;
                }
            }
            Ok(())
        }
        Schema::Object { fields } => {
            let Some(object) = value.as_object() else {
                return Err(type_mismatch(schema, value, path));
            };
            for field in fields {
                let field_path = format!("{path}.{}", field.name);
                match object.get(field.name) {
                    Some(member) => validate(&field.schema, member, &field_path)?,
                    None if field.required => {
                        return Err(ValidationError::new(&field_path, "required field missing"));
                    }
                    None => {}
                }
            }
            Ok(())
        }
        Schema::Union(members) => {
            let mut nested_error = None;
            for member in members {
                match validate(member, value, path) {
                    Ok(()) => return Ok(()),
                    // Keep the deeper error of a member whose top-level type matched.
                    Err(err) if err.path != path => nested_error = Some(err),
                    Err(_) => {}
                }
            }
            Err(nested_error.unwrap_or_else(|| type_mismatch(schema, value, path)))
        }
    }
}

fn expect_type(
    matches: bool,
    schema: &Schema,
    value: &Value,
    path: &str,
) -> Result<(), ValidationError> {
    if matches {
        Ok(())
    } else {
        Err(type_mismatch(schema, value, path))
    }
}

fn type_mismatch(schema: &Schema, value: &Value, path: &str) -> ValidationError {
    ValidationError::new(
        path,
        format!("expected {}, got {}", schema.type_name(), json_type(value)),
    )
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, SchemaRegistry};
    use rstest::rstest;
    use serde_json::json;

    fn tick_schema() -> Schema {
        Schema::object(vec![
            Field::required("symbol", Schema::string()),
            Field::required("quote", Schema::number()),
            Field::optional("side", Schema::string_enum(&["buy", "sell"])),
            Field::optional("prices", Schema::array(Schema::number())),
            Field::optional(
                "meta",
                Schema::object(vec![Field::required("pip", Schema::number())]),
            ),
        ])
    }

    #[test]
    fn test_valid_value_passes() {
        let value = json!({
            "symbol": "R_100",
            "quote": 1234.56,
            "side": "buy",
            "prices": [1.0, 2.0],
            "meta": {"pip": 0.01},
            "extra": "ignored"
        });
        assert_eq!(validate(&tick_schema(), &value, "tick"), Ok(()));
    }

    #[rstest]
    #[case(json!({"quote": 1.0}), "tick.symbol", "required field missing")]
    #[case(json!({"symbol": 5, "quote": 1.0}), "tick.symbol", "expected string, got number")]
    #[case(json!({"symbol": "R_100", "quote": "1.0"}), "tick.quote", "expected number, got string")]
    #[case(json!({"symbol": "R_100", "quote": 1.0, "prices": [1.0, "x"]}), "tick.prices[1]", "expected number, got string")]
    #[case(json!({"symbol": "R_100", "quote": 1.0, "meta": {}}), "tick.meta.pip", "required field missing")]
    #[case(json!([1, 2]), "tick", "expected object, got array")]
    fn test_invalid_value_reports_path(
        #[case] value: Value,
        #[case] path: &str,
        #[case] reason: &str,
    ) {
        let err = validate(&tick_schema(), &value, "tick").unwrap_err();
        assert_eq!(err.path, path);
        assert_eq!(err.reason, reason);
    }

    #[test]
    fn test_string_enum_membership() {
        let value = json!({"symbol": "R_100", "quote": 1.0, "side": "hold"});
        let err = validate(&tick_schema(), &value, "tick").unwrap_err();
        assert_eq!(err.path, "tick.side");
        assert!(err.reason.contains("not one of"));
    }

    #[test]
    fn test_number_enum_membership() {
        let schema = Schema::flag();
        assert!(validate(&schema, &json!(1), "subscribe").is_ok());
        let err = validate(&schema, &json!(2), "subscribe").unwrap_err();
        assert!(err.reason.contains("not one of"));
    }

    #[test]
    fn test_union_accepts_any_member() {
        let schema = Schema::union(vec![Schema::string(), Schema::any_object()]);
        assert!(validate(&schema, &json!("https://cashier"), "cashier").is_ok());
        assert!(validate(&schema, &json!({"address": "x"}), "cashier").is_ok());

        let err = validate(&schema, &json!(3), "cashier").unwrap_err();
        assert_eq!(err.reason, "expected string|object, got number");
    }

    #[test]
    fn test_union_reports_nested_member_error() {
        let schema = Schema::union(vec![
            Schema::string(),
            Schema::object(vec![Field::required("id", Schema::string())]),
        ]);
        let err = validate(&schema, &json!({}), "value").unwrap_err();
        assert_eq!(err.path, "value.id");
    }

    #[test]
    fn test_no_coercion() {
        let value = json!({"symbol": "R_100", "quote": "12"});
        assert!(validate(&tick_schema(), &value, "tick").is_err());
        assert_eq!(value["quote"], json!("12"));
    }

    #[test]
    fn test_validate_request_returns_input() {
        let registry = SchemaRegistry::standard();
        let descriptor = registry.get("ticks").unwrap();
        let request = json!({"ticks": "R_100", "subscribe": 1, "req_id": 3});
        let validated = validate_request(descriptor, &request).unwrap();
        assert!(std::ptr::eq(validated, &request));
    }

    #[test]
    fn test_validate_response_rejects_missing_body() {
        let registry = SchemaRegistry::standard();
        let descriptor = registry.get("authorize").unwrap();
        let response = json!({"msg_type": "authorize", "authorize": {"loginid": "CR1"}});
        let err = validate_response(descriptor, &response).unwrap_err();
        assert!(err.path.starts_with("response.authorize."));
    }
}
