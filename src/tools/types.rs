//! Tool argument types and parameter schemas.

use serde_json::{json, Value};

/// Semantic type of a single tool argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    StringEnum(Vec<String>),
    Array(Box<ArgType>),
    Nullable(Box<ArgType>),
}

impl ArgType {
    pub fn array(items: ArgType) -> Self {
        Self::Array(Box::new(items))
    }

    pub fn nullable(inner: ArgType) -> Self {
        match inner {
            already @ Self::Nullable(_) => already,
            other => Self::Nullable(Box::new(other)),
        }
    }

    /// JSON Schema fragment for this type. Arrays always carry `items`.
    pub fn to_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Number => json!({ "type": "number" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Object => json!({ "type": "object" }),
            Self::StringEnum(values) => json!({ "type": "string", "enum": values }),
            Self::Array(items) => json!({ "type": "array", "items": items.to_schema() }),
            Self::Nullable(inner) => {
                let mut schema = inner.to_schema();
                if let Some(ty) = schema.get("type").cloned() {
                    schema["type"] = json!([ty, "null"]);
                }
                schema
            }
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSpec {
    pub name: String,
    pub ty: ArgType,
    pub description: String,
}

impl ArgumentSpec {
    fn to_schema(&self) -> Value {
        let mut schema = self.ty.to_schema();
        schema["description"] = Value::String(self.description.clone());
        schema
    }
}

/// Declared arguments of a tool plus the subset that must be supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParameters {
    arguments: Vec<ArgumentSpec>,
    required: Vec<String>,
}

impl ToolParameters {
    /// No parameters at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder: create an object schema with properties.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            params: Self::default(),
        }
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Required argument names, in declaration order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// `{type: "object", properties, required}` as shared by both tool conventions.
    pub fn to_json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .arguments
            .iter()
            .map(|arg| (arg.name.clone(), arg.to_schema()))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

/// Builder for constructing tool parameter schemas.
pub struct ParameterBuilder {
    params: ToolParameters,
}

impl ParameterBuilder {
    /// Add a property of any type.
    pub fn arg(
        mut self,
        name: impl Into<String>,
        ty: ArgType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.params.arguments.retain(|a| a.name != name);
        self.params.required.retain(|r| r != &name);
        if required {
            self.params.required.push(name.clone());
        }
        self.params.arguments.push(ArgumentSpec {
            name,
            ty,
            description: description.into(),
        });
        self
    }

    /// Add a string property.
    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.arg(name, ArgType::String, description, required)
    }

    /// Add a number property.
    pub fn number(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.arg(name, ArgType::Number, description, required)
    }

    /// Add an integer property.
    pub fn integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.arg(name, ArgType::Integer, description, required)
    }

    /// Add a boolean property.
    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.arg(name, ArgType::Boolean, description, required)
    }

    /// Add a free-form object property.
    pub fn object(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.arg(name, ArgType::Object, description, required)
    }

    /// Add an array property whose elements have type `items`.
    pub fn array(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        items: ArgType,
        required: bool,
    ) -> Self {
        self.arg(name, ArgType::array(items), description, required)
    }

    /// Add a property that also accepts `null`.
    pub fn nullable(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        inner: ArgType,
        required: bool,
    ) -> Self {
        self.arg(name, ArgType::nullable(inner), description, required)
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        self.arg(name, ArgType::StringEnum(values), description, required)
    }

    /// Build into ToolParameters.
    pub fn build(self) -> ToolParameters {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_schema_always_has_items() {
        let schema = ArgType::array(ArgType::array(ArgType::Integer)).to_schema();
        assert_eq!(
            schema,
            json!({"type": "array", "items": {"type": "array", "items": {"type": "integer"}}})
        );
    }

    #[test]
    fn nullable_array_keeps_items() {
        let schema = ArgType::nullable(ArgType::array(ArgType::String)).to_schema();
        assert_eq!(schema["type"], json!(["array", "null"]));
        assert_eq!(schema["items"], json!({"type": "string"}));
    }

    #[test]
    fn nullable_does_not_nest() {
        let ty = ArgType::nullable(ArgType::nullable(ArgType::Number));
        assert_eq!(ty.to_schema()["type"], json!(["number", "null"]));
    }

    #[test]
    fn required_keeps_declaration_order() {
        let params = ToolParameters::object()
            .string("filename", "Name", true)
            .string("file_path", "Dir", false)
            .string("content", "Body", true)
            .build();

        assert_eq!(params.required(), ["filename", "content"]);
        let schema = params.to_json_schema();
        assert_eq!(schema["required"], json!(["filename", "content"]));
        assert_eq!(schema["properties"]["file_path"]["description"], "Dir");
    }

    #[test]
    fn redeclaring_an_argument_replaces_it() {
        let params = ToolParameters::object()
            .string("path", "first", true)
            .string("path", "second", false)
            .build();

        assert_eq!(params.arguments().len(), 1);
        assert!(params.required().is_empty());
        assert_eq!(params.argument("path").unwrap().description, "second");
    }

    #[test]
    fn empty_parameters_render_empty_object_schema() {
        assert_eq!(
            ToolParameters::empty().to_json_schema(),
            json!({"type": "object", "properties": {}, "required": []})
        );
    }
}
