use serde_json::{json, Map, Value};

/// Simple structural type system for generator output.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Text,
    Integer,
    Number,
    Bool,
    List(Box<TypeDef>),
    Object(Vec<FieldDef>),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: TypeDef,
    pub required: bool,
    pub description: Option<&'static str>,
}

impl FieldDef {
    pub fn required(name: &'static str, ty: TypeDef) -> Self {
        Self {
            name,
            ty,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: &'static str, ty: TypeDef) -> Self {
        Self {
            name,
            ty,
            required: false,
            description: None,
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

impl TypeDef {
    pub fn list(inner: TypeDef) -> Self {
        TypeDef::List(Box::new(inner))
    }

    fn wire_name(&self) -> &'static str {
        match self {
            TypeDef::Text => "STRING",
            TypeDef::Integer => "INTEGER",
            TypeDef::Number => "NUMBER",
            TypeDef::Bool => "BOOLEAN",
            TypeDef::List(_) => "ARRAY",
            TypeDef::Object(_) => "OBJECT",
        }
    }
}

/// Single validation issue, with a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField { path: String },
    TypeMismatch { path: String, expected: &'static str, found: &'static str },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::MissingField { path } => {
                write!(f, "missing required field at {path}")
            }
            ValidationIssue::TypeMismatch { path, expected, found } => {
                write!(f, "type mismatch at {path}: expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for ValidationIssue {}

/// Validate a serde_json::Value against a TypeDef.
///
/// Returns Ok(()) if everything matches, or Err(vec![]) with every issue found.
pub fn validate(ty: &TypeDef, value: &Value) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    validate_inner(ty, value, "$", &mut issues);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn validate_inner(ty: &TypeDef, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    use TypeDef::*;

    let matches = match ty {
        Text => value.is_string(),
        Integer => value.is_i64() || value.is_u64(),
        Number => value.is_number(),
        Bool => value.is_boolean(),
        List(inner) => {
            if let Value::Array(items) = value {
                for (idx, item) in items.iter().enumerate() {
                    validate_inner(inner, item, &format!("{path}[{idx}]"), issues);
                }
                true
            } else {
                false
            }
        }
        Object(fields) => {
            if let Some(obj) = value.as_object() {
                for field in fields {
                    let field_path = format!("{path}.{}", field.name);
                    match obj.get(field.name) {
                        // Optional fields may be sent as explicit nulls.
                        Some(Value::Null) if !field.required => {}
                        Some(v) => validate_inner(&field.ty, v, &field_path, issues),
                        None if field.required => {
                            issues.push(ValidationIssue::MissingField { path: field_path })
                        }
                        None => {}
                    }
                }
                // Extra fields are ignored.
                true
            } else {
                false
            }
        }
    };

    if !matches {
        issues.push(ValidationIssue::TypeMismatch {
            path: path.to_string(),
            expected: expected_name(ty),
            found: value_type_name(value),
        });
    }
}

/// Render a TypeDef in the generative endpoint's `responseSchema` dialect.
pub fn to_wire_schema(ty: &TypeDef) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(ty.wire_name()));

    match ty {
        TypeDef::List(inner) => {
            out.insert("items".into(), to_wire_schema(inner));
        }
        TypeDef::Object(fields) => {
            let mut properties = Map::new();
            for field in fields {
                let mut prop = to_wire_schema(&field.ty);
                if let (Some(desc), Value::Object(p)) = (field.description, &mut prop) {
                    p.insert("description".into(), json!(desc));
                }
                properties.insert(field.name.into(), prop);
            }
            out.insert("properties".into(), Value::Object(properties));

            let required: Vec<&str> = fields
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name)
                .collect();
            if !required.is_empty() {
                out.insert("required".into(), json!(required));
            }
        }
        _ => {}
    }

    Value::Object(out)
}

fn expected_name(ty: &TypeDef) -> &'static str {
    match ty {
        TypeDef::Text => "string",
        TypeDef::Integer => "integer",
        TypeDef::Number => "number",
        TypeDef::Bool => "boolean",
        TypeDef::List(_) => "array",
        TypeDef::Object(_) => "object",
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
