//! Schema model
//!
//! A [`Schema`] describes the expected shape of a configuration tree. Schemas
//! are usually parsed from JSON-Schema-like documents with
//! [`Schema::from_value`], but plugins may also build them in code.
//!
//! Supported keywords: `type`, `properties`, `required`, `items`, `enum`,
//! `minimum`, `maximum`, `multipleOf`, `minLength`, `maxLength`, `pattern`,
//! `additionalProperties`, `default`, `description`, `$ref`, and root
//! `definitions` / `$defs`.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::value::sort_keys;

/// The type of value a schema node accepts
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// Closed set of literal values, see [`Schema::enum_values`]
    Enum,
    /// Accepts anything
    #[default]
    Any,
    /// A type name this crate does not know. Converted as [`SchemaKind::Any`]
    /// with a warning.
    Unrecognized(String),
}

impl SchemaKind {
    /// Parse a JSON Schema `type` name.
    pub fn parse(name: &str) -> Self {
        match name {
            "object" => Self::Object,
            "array" => Self::Array,
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            "enum" => Self::Enum,
            "any" => Self::Any,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The type name as written in schema documents.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Enum => "enum",
            Self::Any => "any",
            Self::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Policy for mapping keys not declared in `properties`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    /// Unknown keys pass through unchecked
    #[default]
    Allow,
    /// Unknown keys are errors
    Deny,
    /// Unknown keys are validated against this schema
    Schema(Box<Schema>),
}

/// A node describing the expected shape of configuration data.
///
/// Invariants (enforced by [`Schema::from_value`]): `required` only names
/// declared properties, `properties` only appears on objects and `items`
/// only on arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    /// Also accept `null`
    pub nullable: bool,
    pub description: Option<String>,
    /// Declared properties, in declaration order
    pub properties: Option<Vec<(String, Schema)>>,
    pub required: Vec<String>,
    pub additional_properties: AdditionalProperties,
    pub items: Option<Box<Schema>>,
    pub enum_values: Option<Vec<Value>>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub multiple_of: Option<Number>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub default: Option<Value>,
    /// `$ref` target such as `#/definitions/step`
    pub reference: Option<String>,
    /// Named sub-schemas, meaningful on the document root
    pub definitions: BTreeMap<String, Schema>,
}

impl Schema {
    /// A schema of the given kind with no constraints.
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self {
            kind: SchemaKind::Object,
            properties: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            kind: SchemaKind::Array,
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    /// A closed set of literal values.
    pub fn enumeration(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            kind: SchemaKind::Enum,
            enum_values: Some(values.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Declare (or replace) a property.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        let properties = self.properties.get_or_insert_with(Vec::new);
        match properties.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = schema,
            None => properties.push((name, schema)),
        }
        self
    }

    /// Mark properties as required.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.required.contains(&name) {
                self.required.push(name);
            }
        }
        self
    }

    /// Reject keys that are not declared properties.
    pub fn deny_additional(mut self) -> Self {
        self.additional_properties = AdditionalProperties::Deny;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a declared property.
    pub fn property_schema(&self, name: &str) -> Option<&Schema> {
        self.properties
            .as_ref()?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }

    /// Parse a schema document from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    /// Parse a JSON-Schema-like document.
    ///
    /// # Example
    ///
    /// ```
    /// use confkit_schema::{Schema, SchemaKind};
    /// use serde_json::json;
    ///
    /// let schema = Schema::from_value(&json!({
    ///     "type": "object",
    ///     "properties": {"port": {"type": "integer", "minimum": 1}},
    ///     "required": ["port"]
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(schema.kind, SchemaKind::Object);
    /// assert_eq!(schema.property_schema("port").unwrap().kind, SchemaKind::Integer);
    /// ```
    pub fn from_value(value: &Value) -> Result<Self> {
        parse_node(value, "#")
    }

    /// Serialize back into a schema document.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();

        if let Some(reference) = &self.reference {
            map.insert("$ref".into(), Value::String(reference.clone()));
        }

        let type_name = match &self.kind {
            SchemaKind::Any | SchemaKind::Enum => None,
            kind => Some(Value::String(kind.as_str().to_string())),
        };
        match (type_name, self.nullable) {
            (Some(name), true) => {
                map.insert("type".into(), Value::Array(vec![name, "null".into()]));
            }
            (Some(name), false) => {
                map.insert("type".into(), name);
            }
            (None, _) => {}
        }

        if let Some(description) = &self.description {
            map.insert("description".into(), Value::String(description.clone()));
        }
        if let Some(properties) = &self.properties {
            let properties: Map<String, Value> = properties
                .iter()
                .map(|(name, schema)| (name.clone(), schema.to_value()))
                .collect();
            map.insert("properties".into(), Value::Object(properties));
        }
        if !self.required.is_empty() {
            map.insert("required".into(), self.required.clone().into());
        }
        match &self.additional_properties {
            AdditionalProperties::Allow => {}
            AdditionalProperties::Deny => {
                map.insert("additionalProperties".into(), Value::Bool(false));
            }
            AdditionalProperties::Schema(schema) => {
                map.insert("additionalProperties".into(), schema.to_value());
            }
        }
        if let Some(items) = &self.items {
            map.insert("items".into(), items.to_value());
        }
        if let Some(values) = &self.enum_values {
            map.insert("enum".into(), Value::Array(values.clone()));
        }

        let numbers = [
            ("minimum", &self.minimum),
            ("maximum", &self.maximum),
            ("multipleOf", &self.multiple_of),
        ];
        for (key, number) in numbers {
            if let Some(number) = number {
                map.insert(key.into(), Value::Number(number.clone()));
            }
        }
        if let Some(min) = self.min_length {
            map.insert("minLength".into(), min.into());
        }
        if let Some(max) = self.max_length {
            map.insert("maxLength".into(), max.into());
        }
        if let Some(pattern) = &self.pattern {
            map.insert("pattern".into(), Value::String(pattern.clone()));
        }
        if let Some(default) = &self.default {
            map.insert("default".into(), default.clone());
        }
        if !self.definitions.is_empty() {
            let definitions: Map<String, Value> = self
                .definitions
                .iter()
                .map(|(name, schema)| (name.clone(), schema.to_value()))
                .collect();
            map.insert("definitions".into(), Value::Object(definitions));
        }

        Value::Object(map)
    }

    /// Key identifying this schema by structural content.
    ///
    /// Two schemas with the same content produce the same key no matter how
    /// they were built. Mapping keys inside `default`/`enum` literals are
    /// compared order-insensitively; property declaration order is
    /// significant because it fixes error ordering.
    pub fn canonical_key(&self) -> String {
        let canonical = canonical_value(self);
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// `to_value` with user literals normalized.
fn canonical_value(schema: &Schema) -> Value {
    let mut normalized = schema.clone();
    normalize_literals(&mut normalized);
    normalized.to_value()
}

fn normalize_literals(schema: &mut Schema) {
    if let Some(default) = &schema.default {
        schema.default = Some(sort_keys(default));
    }
    if let Some(values) = &schema.enum_values {
        schema.enum_values = Some(values.iter().map(sort_keys).collect());
    }
    if let Some(properties) = &mut schema.properties {
        for (_, child) in properties.iter_mut() {
            normalize_literals(child);
        }
    }
    if let Some(items) = &mut schema.items {
        normalize_literals(items);
    }
    if let AdditionalProperties::Schema(child) = &mut schema.additional_properties {
        normalize_literals(child);
    }
    for child in schema.definitions.values_mut() {
        normalize_literals(child);
    }
}

fn parse_node(value: &Value, pointer: &str) -> Result<Schema> {
    let map = match value {
        Value::Object(map) => map,
        // JSON Schema's boolean form: `true` accepts anything
        Value::Bool(true) => return Ok(Schema::any()),
        _ => return Err(Error::invalid(pointer, "a schema must be an object")),
    };

    let mut schema = Schema::default();
    let mut explicit_type = false;

    if let Some(reference) = map.get("$ref") {
        let reference = reference
            .as_str()
            .ok_or_else(|| Error::invalid(pointer, "$ref must be a string"))?;
        schema.reference = Some(reference.to_string());
    }

    match map.get("type") {
        None => {}
        Some(Value::String(name)) => {
            schema.kind = SchemaKind::parse(name);
            explicit_type = true;
        }
        Some(Value::Array(names)) => {
            let mut names = names
                .iter()
                .map(|name| {
                    name.as_str()
                        .ok_or_else(|| Error::invalid(pointer, "type names must be strings"))
                })
                .collect::<Result<Vec<_>>>()?;
            if names.len() > 1 && names.contains(&"null") {
                schema.nullable = true;
                names.retain(|name| *name != "null");
            }
            schema.kind = match names.as_slice() {
                [single] => SchemaKind::parse(single),
                many => SchemaKind::Unrecognized(many.join("|")),
            };
            explicit_type = true;
        }
        Some(_) => {
            return Err(Error::invalid(
                pointer,
                "type must be a string or an array of strings",
            ));
        }
    }

    if let Some(description) = map.get("description").and_then(Value::as_str) {
        schema.description = Some(description.to_string());
    }

    if let Some(values) = map.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| Error::invalid(pointer, "enum must be an array"))?;
        schema.enum_values = Some(values.clone());
        if !explicit_type {
            schema.kind = SchemaKind::Enum;
        }
    } else if schema.kind == SchemaKind::Enum {
        return Err(Error::invalid(pointer, "enum schema has no enum values"));
    }

    if let Some(properties) = map.get("properties") {
        let properties = properties
            .as_object()
            .ok_or_else(|| Error::invalid(pointer, "properties must be an object"))?;
        if !explicit_type {
            schema.kind = SchemaKind::Object;
        } else if schema.kind != SchemaKind::Object {
            return Err(Error::invalid(
                pointer,
                format!("properties are only allowed on objects, not {}", schema.kind),
            ));
        }
        let mut parsed = Vec::with_capacity(properties.len());
        for (name, child) in properties {
            parsed.push((
                name.clone(),
                parse_node(child, &format!("{}/properties/{}", pointer, name))?,
            ));
        }
        schema.properties = Some(parsed);
    } else if schema.kind == SchemaKind::Object {
        schema.properties = Some(Vec::new());
    }

    if let Some(required) = map.get("required") {
        let required = required
            .as_array()
            .ok_or_else(|| Error::invalid(pointer, "required must be an array"))?;
        for name in required {
            let name = name
                .as_str()
                .ok_or_else(|| Error::invalid(pointer, "required entries must be strings"))?;
            if schema.property_schema(name).is_none() {
                return Err(Error::invalid(
                    pointer,
                    format!("required property '{}' is not declared in properties", name),
                ));
            }
            schema.required.push(name.to_string());
        }
    }

    match map.get("additionalProperties") {
        None | Some(Value::Bool(true)) => {}
        Some(Value::Bool(false)) => schema.additional_properties = AdditionalProperties::Deny,
        Some(child @ Value::Object(_)) => {
            let child = parse_node(child, &format!("{}/additionalProperties", pointer))?;
            schema.additional_properties = AdditionalProperties::Schema(Box::new(child));
        }
        Some(_) => {
            return Err(Error::invalid(
                pointer,
                "additionalProperties must be a boolean or a schema",
            ));
        }
    }

    if let Some(items) = map.get("items") {
        if items.is_array() {
            return Err(Error::invalid(pointer, "tuple-form items are not supported"));
        }
        if !explicit_type {
            schema.kind = SchemaKind::Array;
        } else if schema.kind != SchemaKind::Array {
            return Err(Error::invalid(
                pointer,
                format!("items are only allowed on arrays, not {}", schema.kind),
            ));
        }
        schema.items = Some(Box::new(parse_node(items, &format!("{}/items", pointer))?));
    }

    schema.minimum = parse_number(map, "minimum", pointer)?;
    schema.maximum = parse_number(map, "maximum", pointer)?;
    schema.multiple_of = parse_number(map, "multipleOf", pointer)?;
    if let Some(step) = &schema.multiple_of
        && step.as_f64().is_none_or(|step| step <= 0.0)
    {
        return Err(Error::invalid(pointer, "multipleOf must be greater than zero"));
    }

    schema.min_length = parse_length(map, "minLength", pointer)?;
    schema.max_length = parse_length(map, "maxLength", pointer)?;

    if let Some(pattern) = map.get("pattern") {
        let pattern = pattern
            .as_str()
            .ok_or_else(|| Error::invalid(pointer, "pattern must be a string"))?;
        schema.pattern = Some(pattern.to_string());
    }

    schema.default = map.get("default").cloned();

    for key in ["definitions", "$defs"] {
        if let Some(definitions) = map.get(key) {
            let definitions = definitions
                .as_object()
                .ok_or_else(|| Error::invalid(pointer, format!("{} must be an object", key)))?;
            for (name, child) in definitions {
                let child = parse_node(child, &format!("{}/{}/{}", pointer, key, name))?;
                schema.definitions.insert(name.clone(), child);
            }
        }
    }

    Ok(schema)
}

fn parse_number(map: &Map<String, Value>, key: &str, pointer: &str) -> Result<Option<Number>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Number(number)) => Ok(Some(number.clone())),
        Some(_) => Err(Error::invalid(pointer, format!("{} must be a number", key))),
    }
}

fn parse_length(map: &Map<String, Value>, key: &str, pointer: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            Error::invalid(pointer, format!("{} must be a non-negative integer", key))
        }),
    }
}
