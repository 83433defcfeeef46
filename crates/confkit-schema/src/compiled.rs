//! Executable validators
//!
//! A [`CompiledValidator`] is immutable once built. Executing it walks the
//! data alongside the node tree, collecting every failure with its path and
//! producing the (possibly coerced) output value.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::convert::SchemaWarning;
use crate::path::{ConfigPath, PathSegment};
use crate::validator::{ValidateOptions, ValidationError, ValidationResult};
use crate::value::type_name;

/// Relative tolerance for `multipleOf` checks on non-integer numbers.
///
/// Integers are checked exactly with the remainder operator; floats are
/// accepted when the quotient is within this relative distance of an integer.
pub const MULTIPLE_OF_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Any,
    Null,
    Boolean,
    Number(NumberRules),
    String(StringRules),
    Enum(Vec<Value>),
    Array(Option<Box<Node>>),
    Object(ObjectRules),
    Nullable(Box<Node>),
    /// Slot in [`CompiledValidator::definitions`]
    Ref(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct NumberRules {
    pub integer: bool,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub multiple_of: Option<Number>,
}

#[derive(Debug, Clone)]
pub(crate) struct StringRules {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    /// Source pattern and its anchored regex
    pub pattern: Option<(String, Regex)>,
}

#[derive(Debug, Clone)]
pub(crate) struct ObjectRules {
    pub properties: Vec<PropertyRule>,
    pub additional: AdditionalRule,
}

#[derive(Debug, Clone)]
pub(crate) struct PropertyRule {
    pub name: String,
    pub required: bool,
    pub node: Node,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) enum AdditionalRule {
    Allow,
    Deny,
    Validate(Box<Node>),
}

/// The executable form of a [`crate::Schema`].
#[derive(Debug, Clone)]
pub struct CompiledValidator {
    root: Node,
    definitions: Vec<Node>,
    warnings: Vec<SchemaWarning>,
}

impl CompiledValidator {
    pub(crate) fn new(root: Node, definitions: Vec<Node>, warnings: Vec<SchemaWarning>) -> Self {
        Self {
            root,
            definitions,
            warnings,
        }
    }

    /// Warnings raised while this validator was converted.
    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    /// Run the validator against `data`.
    pub fn validate(&self, data: &Value, options: &ValidateOptions) -> ValidationResult {
        let mut run = Run {
            definitions: &self.definitions,
            options,
            path: ConfigPath::root(),
            errors: Vec::new(),
        };
        let output = run.check(&self.root, data);

        if run.errors.is_empty() {
            ValidationResult::valid(output)
        } else {
            ValidationResult::invalid(run.errors)
        }
    }

    /// Whether `data` passes without coercion.
    pub fn is_valid(&self, data: &Value) -> bool {
        self.validate(data, &ValidateOptions::default()).success
    }
}

struct Run<'a> {
    definitions: &'a [Node],
    options: &'a ValidateOptions,
    path: ConfigPath,
    errors: Vec<ValidationError>,
}

impl Run<'_> {
    fn fail(&mut self, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: self.path.clone(),
            message: message.into(),
        });
    }

    fn mismatch(&mut self, expected: &str, found: &Value) {
        self.fail(format!("expected {}, found {}", expected, type_name(found)));
    }

    fn check(&mut self, node: &Node, value: &Value) -> Value {
        match node {
            Node::Any => value.clone(),
            Node::Null => {
                if !value.is_null() {
                    self.mismatch("null", value);
                }
                value.clone()
            }
            Node::Boolean => self.check_boolean(value),
            Node::Number(rules) => self.check_number(rules, value),
            Node::String(rules) => {
                match value {
                    Value::String(text) => self.check_string(rules, text),
                    other => self.mismatch("string", other),
                }
                value.clone()
            }
            Node::Enum(members) => self.check_enum(members, value),
            Node::Array(items) => self.check_array(items.as_deref(), value),
            Node::Object(rules) => self.check_object(rules, value),
            Node::Nullable(inner) => {
                if value.is_null() {
                    Value::Null
                } else {
                    self.check(inner, value)
                }
            }
            Node::Ref(slot) => {
                let definitions = self.definitions;
                self.check(&definitions[*slot], value)
            }
        }
    }

    fn check_boolean(&mut self, value: &Value) -> Value {
        match value {
            Value::Bool(_) => value.clone(),
            Value::String(text) if self.options.coerce => match parse_bool(text) {
                Some(flag) => Value::Bool(flag),
                None => {
                    self.fail(format!("expected boolean, found string {:?}", text));
                    value.clone()
                }
            },
            other => {
                self.mismatch("boolean", other);
                value.clone()
            }
        }
    }

    fn check_number(&mut self, rules: &NumberRules, value: &Value) -> Value {
        let expected = if rules.integer { "integer" } else { "number" };
        let number = match value {
            Value::Number(number) => number.clone(),
            Value::String(text) if self.options.coerce => match parse_number(text) {
                Some(number) => number,
                None => {
                    self.fail(format!("expected {}, found string {:?}", expected, text));
                    return value.clone();
                }
            },
            other => {
                self.mismatch(expected, other);
                return value.clone();
            }
        };

        if rules.integer && !is_integral(&number) {
            self.fail(format!("expected integer, found {}", number));
        }
        if let Some(minimum) = &rules.minimum
            && compare(&number, minimum) == Ordering::Less
        {
            self.fail(format!("must be greater than or equal to {}", minimum));
        }
        if let Some(maximum) = &rules.maximum
            && compare(&number, maximum) == Ordering::Greater
        {
            self.fail(format!("must be less than or equal to {}", maximum));
        }
        if let Some(step) = &rules.multiple_of
            && !is_multiple_of(&number, step)
        {
            self.fail(format!("must be a multiple of {}", step));
        }

        Value::Number(number)
    }

    fn check_string(&mut self, rules: &StringRules, text: &str) {
        let length = text.chars().count() as u64;
        if let Some(min) = rules.min_length
            && length < min
        {
            self.fail(format!("must be at least {} characters long", min));
        }
        if let Some(max) = rules.max_length
            && length > max
        {
            self.fail(format!("must be at most {} characters long", max));
        }
        if let Some((source, regex)) = &rules.pattern
            && !regex.is_match(text)
        {
            self.fail(format!("must match pattern `{}`", source));
        }
    }

    fn check_enum(&mut self, members: &[Value], value: &Value) -> Value {
        if members.contains(value) {
            return value.clone();
        }
        if self.options.coerce
            && let Value::String(text) = value
            && let Some(member) = members
                .iter()
                .find(|member| !member.is_string() && member.to_string() == *text)
        {
            return member.clone();
        }

        let listed = members
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.fail(format!("must be one of {}, found {}", listed, value));
        value.clone()
    }

    fn check_array(&mut self, items: Option<&Node>, value: &Value) -> Value {
        let Value::Array(elements) = value else {
            self.mismatch("array", value);
            return value.clone();
        };
        let Some(items) = items else {
            return value.clone();
        };

        let mut output = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            output.push(self.check(items, element));
            self.path.pop();
        }
        Value::Array(output)
    }

    fn check_object(&mut self, rules: &ObjectRules, value: &Value) -> Value {
        let Value::Object(map) = value else {
            // The whole branch is malformed; siblings continue elsewhere
            self.mismatch("object", value);
            return value.clone();
        };

        let mut output: Map<String, Value> = map.clone();

        for property in &rules.properties {
            self.path.push(PathSegment::Key(property.name.clone()));
            match map.get(&property.name) {
                Some(child) => {
                    let checked = self.check(&property.node, child);
                    output.insert(property.name.clone(), checked);
                }
                None if property.required => self.fail("missing required property"),
                None => {
                    if self.options.apply_defaults
                        && let Some(default) = &property.default
                    {
                        output.insert(property.name.clone(), default.clone());
                    }
                }
            }
            self.path.pop();
        }

        for (key, child) in map {
            if rules.properties.iter().any(|property| property.name == *key) {
                continue;
            }
            match &rules.additional {
                AdditionalRule::Allow => {}
                AdditionalRule::Deny => {
                    self.path.push(PathSegment::Key(key.clone()));
                    self.fail("unknown property");
                    self.path.pop();
                }
                AdditionalRule::Validate(node) => {
                    self.path.push(PathSegment::Key(key.clone()));
                    let checked = self.check(node, child);
                    output.insert(key.clone(), checked);
                    self.path.pop();
                }
            }
        }

        Value::Object(output)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(int) = text.parse::<i64>() {
        return Some(int.into());
    }
    if let Ok(uint) = text.parse::<u64>() {
        return Some(uint.into());
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn is_integral(number: &Number) -> bool {
    number.is_i64()
        || number.is_u64()
        || number
            .as_f64()
            .is_some_and(|float| float.is_finite() && float.fract() == 0.0)
}

fn compare(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    let a = a.as_f64().unwrap_or(f64::NAN);
    let b = b.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn is_multiple_of(number: &Number, step: &Number) -> bool {
    if let (Some(value), Some(step)) = (number.as_i64(), step.as_i64())
        && step != 0
    {
        // Only i64::MIN % -1 overflows, and it divides evenly
        return value.checked_rem(step).is_none_or(|rem| rem == 0);
    }
    if let (Some(value), Some(step)) = (number.as_u64(), step.as_u64())
        && step != 0
    {
        return value % step == 0;
    }
    match (number.as_f64(), step.as_f64()) {
        (Some(value), Some(step)) if step != 0.0 => {
            let quotient = value / step;
            (quotient - quotient.round()).abs() <= MULTIPLE_OF_TOLERANCE * quotient.abs().max(1.0)
        }
        _ => false,
    }
}
