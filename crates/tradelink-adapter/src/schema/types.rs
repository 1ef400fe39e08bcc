/*
[INPUT]:  Endpoint shape declarations from the registry
[OUTPUT]: Tagged schema tree consumed by the validator
[POS]:    Schema layer - structural type representation
[UPDATE]: When adding new primitive kinds or schema combinators
*/

/// Structural schema for a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// String, optionally restricted to an enumerated set
    String { allowed: Option<Vec<&'static str>> },
    /// Number, optionally restricted to an enumerated set
    Number { allowed: Option<Vec<f64>> },
    Boolean,
    /// Explicit JSON `null`, only useful inside a union
    Null,
    /// Array whose elements, when `items` is set, must all match it
    Array { items: Option<Box<Schema>> },
    /// Object with declared fields; undeclared fields are allowed
    Object { fields: Vec<Field> },
    /// Any member may match
    Union(Vec<Schema>),
    Any,
}

/// Named member of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }

    pub fn optional(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: false,
        }
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::String { allowed: None }
    }

    pub fn string_enum(values: &[&'static str]) -> Self {
        Schema::String {
            allowed: Some(values.to_vec()),
        }
    }

    pub fn number() -> Self {
        Schema::Number { allowed: None }
    }

    pub fn number_enum(values: &[f64]) -> Self {
        Schema::Number {
            allowed: Some(values.to_vec()),
        }
    }

    /// The `1` flag most wire methods use as their discriminator value.
    pub fn flag() -> Self {
        Self::number_enum(&[1.0])
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Some(Box::new(items)),
        }
    }

    pub fn any_array() -> Self {
        Schema::Array { items: None }
    }

    pub fn object(fields: Vec<Field>) -> Self {
        Schema::Object { fields }
    }

    pub fn any_object() -> Self {
        Schema::Object { fields: Vec::new() }
    }

    pub fn union(members: Vec<Schema>) -> Self {
        Schema::Union(members)
    }

    /// `number | null`
    pub fn nullable_number() -> Self {
        Schema::Union(vec![Schema::number(), Schema::Null])
    }

    /// `string | null`
    pub fn nullable_string() -> Self {
        Schema::Union(vec![Schema::string(), Schema::Null])
    }

    /// Name used in validation messages; unions render as `a|b`.
    pub fn type_name(&self) -> String {
        match self {
            Schema::String { .. } => "string".to_string(),
            Schema::Number { .. } => "number".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Null => "null".to_string(),
            Schema::Array { .. } => "array".to_string(),
            Schema::Object { .. } => "object".to_string(),
            Schema::Union(members) => members
                .iter()
                .map(Schema::type_name)
                .collect::<Vec<_>>()
                .join("|"),
            Schema::Any => "any".to_string(),
        }
    }

    /// Look up a declared field of an object schema.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Schema::Object { fields } => fields.iter().find(|field| field.name == name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_type_name() {
        let schema = Schema::union(vec![Schema::string(), Schema::any_object()]);
        assert_eq!(schema.type_name(), "string|object");
        assert_eq!(Schema::nullable_number().type_name(), "number|null");
    }

    #[test]
    fn test_field_lookup() {
        let schema = Schema::object(vec![
            Field::required("symbol", Schema::string()),
            Field::optional("count", Schema::number()),
        ]);
        assert!(schema.field("symbol").is_some_and(|field| field.required));
        assert!(schema.field("count").is_some_and(|field| !field.required));
        assert!(schema.field("missing").is_none());
        assert!(Schema::string().field("symbol").is_none());
    }
}
