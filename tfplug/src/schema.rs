//! Schema types and builders for tfplug
//!
//! A [`Schema`] declares the attributes of a provider or data source. Besides
//! describing the shape to Terraform, it checks configuration before a read:
//! unknown attributes, missing required attributes, values set on
//! computed-only attributes, type mismatches, and per-attribute validators.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use crate::validator::Validator;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Terraform's attribute type system
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(BTreeMap<String, AttributeType>),
}

impl AttributeType {
    /// Terraform's JSON type-constraint encoding, e.g. `["list","string"]`
    pub fn to_type_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};

        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(elem) => json!(["list", elem.to_type_json()]),
            AttributeType::Set(elem) => json!(["set", elem.to_type_json()]),
            AttributeType::Map(elem) => json!(["map", elem.to_type_json()]),
            AttributeType::Object(attrs) => {
                let fields: serde_json::Map<String, Value> = attrs
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.to_type_json()))
                    .collect();
                json!(["object", fields])
            }
        }
    }

    /// Whether `value` conforms to this type; null conforms to every type
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Number, Dynamic::Number(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::List(elem), Dynamic::List(items))
            | (AttributeType::Set(elem), Dynamic::List(items)) => {
                items.iter().all(|item| elem.accepts(item))
            }
            (AttributeType::Map(elem), Dynamic::Map(entries)) => {
                entries.values().all(|entry| elem.accepts(entry))
            }
            (AttributeType::Object(attrs), Dynamic::Map(entries)) => attrs
                .iter()
                .all(|(name, ty)| entries.get(name).map_or(true, |v| ty.accepts(v))),
            _ => false,
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Number => write!(f, "number"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::List(elem) => write!(f, "list({})", elem),
            AttributeType::Set(elem) => write!(f, "set({})", elem),
            AttributeType::Map(elem) => write!(f, "map({})", elem),
            AttributeType::Object(_) => write!(f, "object"),
        }
    }
}

/// Schema is returned by providers and data sources
#[derive(Debug, Clone)]
pub struct Schema {
    /// Increment when the state shape changes
    pub version: i64,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub description_kind: StringKind,
    pub deprecated: bool,
}

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub deprecated: bool,
    pub validators: Vec<Arc<dyn Validator>>,
}

// Validators are trait objects without Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringKind {
    Plain,
    Markdown,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    /// Check a configuration object against this schema
    pub fn validate_config(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let entries = match &config.value {
            Dynamic::Map(entries) => Some(entries),
            Dynamic::Null => None,
            other => {
                diagnostics.push(Diagnostic::error(
                    "Invalid configuration",
                    format!("expected an object, got {}", other.type_name()),
                ));
                return diagnostics;
            }
        };

        if let Some(entries) = entries {
            let mut names: Vec<&String> = entries.keys().collect();
            names.sort();
            for name in names {
                if self.attribute(name).is_none() {
                    diagnostics.push(
                        Diagnostic::error(
                            "Unsupported argument",
                            format!("An argument named \"{}\" is not expected here.", name),
                        )
                        .with_attribute(AttributePath::new(name)),
                    );
                }
            }
        }

        let null = Dynamic::Null;
        for attr in &self.block.attributes {
            let path = AttributePath::new(&attr.name);
            let value = entries
                .and_then(|e| e.get(&attr.name))
                .unwrap_or(&null);

            if value.is_null() {
                if attr.required {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required argument",
                            format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                        )
                        .with_attribute(path),
                    );
                }
                continue;
            }

            if attr.computed && !attr.optional && !attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid configuration",
                        format!("\"{}\" is read-only and cannot be set in configuration.", attr.name),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            if !attr.r#type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!(
                            "Inappropriate value for attribute \"{}\": {} required, got {}.",
                            attr.name,
                            attr.r#type,
                            value.type_name()
                        ),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            for validator in &attr.validators {
                validator.validate(value, &path, &mut diagnostics);
            }
        }

        diagnostics
    }
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                deprecated: false,
                validators: Vec::new(),
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    attributes: Vec::new(),
                    description: String::new(),
                    description_kind: StringKind::Plain,
                    deprecated: false,
                },
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn description_kind(mut self, kind: StringKind) -> Self {
        self.schema.block.description_kind = kind;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::has_errors;
    use crate::validator::StringLengthValidator;
    use std::collections::HashMap;

    fn lookup_schema() -> Schema {
        SchemaBuilder::new()
            .version(1)
            .description("Test data source")
            .attribute(
                AttributeBuilder::new("key", AttributeType::String)
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::List(Box::new(AttributeType::String)))
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("value", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build()
    }

    fn config(entries: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>(),
        ))
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the joke")
            .required()
            .build();

        assert_eq!(attr.name, "name");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.description, "The name of the joke");
    }

    #[test]
    fn schema_builder_creates_schema_with_attributes() {
        let schema = lookup_schema();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.block.attributes.len(), 3);
        assert_eq!(schema.block.description, "Test data source");
        assert!(schema.attribute("tags").unwrap().computed);
    }

    #[test]
    fn cloned_attributes_keep_validators() {
        let schema = lookup_schema().clone();
        assert_eq!(schema.attribute("key").unwrap().validators.len(), 1);
    }

    #[test]
    fn type_json_matches_terraform_encoding() {
        let ty = AttributeType::List(Box::new(AttributeType::String));
        assert_eq!(ty.to_type_json().to_string(), r#"["list","string"]"#);

        let obj = AttributeType::Object(BTreeMap::from([
            ("host".to_string(), AttributeType::String),
            ("port".to_string(), AttributeType::Number),
        ]));
        assert_eq!(
            obj.to_type_json().to_string(),
            r#"["object",{"host":"string","port":"number"}]"#
        );
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        let diags = lookup_schema().validate_config(&config(vec![
            ("key", Dynamic::from("abc")),
            ("tags", Dynamic::from(vec!["x".to_string()])),
        ]));
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn missing_required_attribute_is_reported() {
        let diags = lookup_schema().validate_config(&config(vec![]));
        assert!(has_errors(&diags));
        assert_eq!(diags[0].summary, "Missing required argument");
        assert_eq!(diags[0].attribute, Some(AttributePath::new("key")));
    }

    #[test]
    fn computed_only_attribute_cannot_be_configured() {
        let diags = lookup_schema().validate_config(&config(vec![
            ("key", Dynamic::from("abc")),
            ("value", Dynamic::from("nope")),
        ]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(AttributePath::new("value")));
    }

    #[test]
    fn unknown_and_mistyped_attributes_are_reported() {
        let diags = lookup_schema().validate_config(&config(vec![
            ("key", Dynamic::Number(1.0)),
            ("bogus", Dynamic::Bool(true)),
        ]));
        let summaries: Vec<&str> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Unsupported argument", "Incorrect attribute value type"]
        );
    }

    #[test]
    fn validators_run_on_configured_values() {
        let diags = lookup_schema().validate_config(&config(vec![("key", Dynamic::from(""))]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("minimum length"));
    }

    #[test]
    fn non_object_config_is_rejected() {
        let diags = lookup_schema().validate_config(&DynamicValue::new(Dynamic::from("x")));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Invalid configuration");
    }
}
