//! Schema → validator conversion
//!
//! [`TypeConverter`] walks a [`Schema`] tree and produces a
//! [`CompiledValidator`]. Definitions referenced through `$ref` are compiled
//! once into an arena and referenced by slot, so recursive definitions do not
//! recurse during conversion.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::compiled::{
    AdditionalRule, CompiledValidator, Node, NumberRules, ObjectRules, PropertyRule, StringRules,
};
use crate::error::{Error, Result};
use crate::schema::{AdditionalProperties, Schema, SchemaKind};

/// Something that turns schemas into executable validators.
///
/// [`crate::ValidatorCache`] is generic over this seam so tests can observe
/// how often conversion actually happens.
pub trait SchemaConverter: Send + Sync {
    fn convert(&self, schema: &Schema) -> Result<CompiledValidator>;
}

/// Non-fatal finding raised while converting a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaWarning {
    /// JSON-pointer-style location of the schema node
    pub pointer: String,
    pub message: String,
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

/// Receiver for conversion warnings.
pub trait WarningSink: Send + Sync {
    fn warn(&self, warning: &SchemaWarning);
}

impl<F> WarningSink for F
where
    F: Fn(&SchemaWarning) + Send + Sync,
{
    fn warn(&self, warning: &SchemaWarning) {
        self(warning)
    }
}

/// The standard schema converter.
#[derive(Clone, Default)]
pub struct TypeConverter {
    sink: Option<Arc<dyn WarningSink>>,
}

impl TypeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward conversion warnings to `sink` in addition to the log.
    pub fn with_warning_sink(sink: Arc<dyn WarningSink>) -> Self {
        Self { sink: Some(sink) }
    }
}

impl fmt::Debug for TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConverter")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl SchemaConverter for TypeConverter {
    fn convert(&self, schema: &Schema) -> Result<CompiledValidator> {
        let mut compiler = Compiler {
            root: schema,
            definitions: Vec::new(),
            slots: HashMap::new(),
            warnings: Vec::new(),
        };
        let root = compiler.compile(schema, "#")?;

        for warning in &compiler.warnings {
            tracing::warn!(pointer = %warning.pointer, "{}", warning.message);
            if let Some(sink) = &self.sink {
                sink.warn(warning);
            }
        }

        Ok(CompiledValidator::new(
            root,
            compiler.definitions,
            compiler.warnings,
        ))
    }
}

struct Compiler<'a> {
    root: &'a Schema,
    definitions: Vec<Node>,
    slots: HashMap<String, usize>,
    warnings: Vec<SchemaWarning>,
}

impl Compiler<'_> {
    fn compile(&mut self, schema: &Schema, pointer: &str) -> Result<Node> {
        if let Some(reference) = &schema.reference {
            return self.resolve_reference(reference, pointer).map(Node::Ref);
        }

        let node = match (&schema.enum_values, &schema.kind) {
            // A closed set wins over every other constraint on the node
            (Some(values), _) => Node::Enum(values.clone()),
            (None, SchemaKind::Enum) => {
                return Err(Error::invalid(pointer, "enum schema has no enum values"));
            }
            (None, SchemaKind::Object) => Node::Object(self.compile_object(schema, pointer)?),
            (None, SchemaKind::Array) => {
                let items = match &schema.items {
                    Some(items) => {
                        Some(Box::new(self.compile(items, &format!("{}/items", pointer))?))
                    }
                    None => None,
                };
                Node::Array(items)
            }
            (None, SchemaKind::String) => Node::String(compile_string(schema, pointer)?),
            (None, SchemaKind::Number) => Node::Number(number_rules(schema, false)),
            (None, SchemaKind::Integer) => Node::Number(number_rules(schema, true)),
            (None, SchemaKind::Boolean) => Node::Boolean,
            (None, SchemaKind::Null) => Node::Null,
            (None, SchemaKind::Any) => Node::Any,
            (None, SchemaKind::Unrecognized(name)) => {
                self.warnings.push(SchemaWarning {
                    pointer: pointer.to_string(),
                    message: format!(
                        "unrecognized schema type '{}', accepting any value",
                        name
                    ),
                });
                Node::Any
            }
        };

        Ok(match node {
            Node::Any | Node::Null => node,
            node if schema.nullable => Node::Nullable(Box::new(node)),
            node => node,
        })
    }

    fn compile_object(&mut self, schema: &Schema, pointer: &str) -> Result<ObjectRules> {
        let declared = schema.properties.as_deref().unwrap_or_default();

        for name in &schema.required {
            if !declared.iter().any(|(key, _)| key == name) {
                return Err(Error::invalid(
                    pointer,
                    format!("required property '{}' is not declared in properties", name),
                ));
            }
        }

        let mut properties = Vec::with_capacity(declared.len());
        for (name, child) in declared {
            properties.push(PropertyRule {
                name: name.clone(),
                required: schema.required.contains(name),
                node: self.compile(child, &format!("{}/properties/{}", pointer, name))?,
                default: child.default.clone(),
            });
        }

        let additional = match &schema.additional_properties {
            AdditionalProperties::Allow => AdditionalRule::Allow,
            AdditionalProperties::Deny => AdditionalRule::Deny,
            AdditionalProperties::Schema(child) => AdditionalRule::Validate(Box::new(
                self.compile(child, &format!("{}/additionalProperties", pointer))?,
            )),
        };

        Ok(ObjectRules {
            properties,
            additional,
        })
    }

    fn resolve_reference(&mut self, reference: &str, pointer: &str) -> Result<usize> {
        let unresolved = || Error::UnresolvedReference {
            pointer: pointer.to_string(),
            reference: reference.to_string(),
        };

        let name = reference
            .strip_prefix("#/definitions/")
            .or_else(|| reference.strip_prefix("#/$defs/"))
            .ok_or_else(unresolved)?;

        if let Some(&slot) = self.slots.get(name) {
            return Ok(slot);
        }

        let root = self.root;
        let definition = root.definitions.get(name).ok_or_else(unresolved)?;

        // Reserve the slot before compiling so self-references resolve to it
        let slot = self.definitions.len();
        self.definitions.push(Node::Any);
        self.slots.insert(name.to_string(), slot);

        let node = self.compile(definition, &format!("#/definitions/{}", name))?;
        if self.is_reference_cycle(&node, slot) {
            return Err(Error::invalid(
                pointer,
                format!("definition '{}' only refers to itself", name),
            ));
        }
        self.definitions[slot] = node;
        Ok(slot)
    }

    /// A chain of bare references that loops back to `slot` would never
    /// reach a concrete node.
    fn is_reference_cycle(&self, node: &Node, slot: usize) -> bool {
        let mut current = node;
        let mut steps = 0;
        while let Node::Ref(target) = current {
            if *target == slot || steps > self.definitions.len() {
                return true;
            }
            current = &self.definitions[*target];
            steps += 1;
        }
        false
    }
}

fn compile_string(schema: &Schema, pointer: &str) -> Result<StringRules> {
    let pattern = match &schema.pattern {
        Some(pattern) => {
            // The whole string must match, not just a substring
            let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                Error::InvalidPattern {
                    pointer: pointer.to_string(),
                    pattern: pattern.clone(),
                    source,
                }
            })?;
            Some((pattern.clone(), regex))
        }
        None => None,
    };

    Ok(StringRules {
        min_length: schema.min_length,
        max_length: schema.max_length,
        pattern,
    })
}

fn number_rules(schema: &Schema, integer: bool) -> NumberRules {
    NumberRules {
        integer,
        minimum: schema.minimum.clone(),
        maximum: schema.maximum.clone(),
        multiple_of: schema.multiple_of.clone(),
    }
}

/// Convert with the default converter.
pub fn convert(schema: &Schema) -> Result<CompiledValidator> {
    TypeConverter::new().convert(schema)
}
