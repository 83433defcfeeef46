//! Dotted paths into configuration trees
//!
//! A [`ConfigPath`] addresses a value inside a `serde_json::Value` tree:
//!
//! - `output.format` walks mapping keys
//! - `jobs[0].steps[2]` walks sequence indices
//! - `a\.b` is a single key containing a dot. `\\`, `\[` and `\]` escape a
//!   literal backslash or bracket.
//!
//! The empty string parses to the root path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::value::type_name;

/// One step of a [`ConfigPath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => {
                for c in key.chars() {
                    if matches!(c, '.' | '\\' | '[' | ']') {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                Ok(())
            }
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// A breadcrumb from the root of a configuration tree to one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigPath(Vec<PathSegment>);

#[derive(Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    InKey,
    AfterDot,
    AfterIndex,
}

impl ConfigPath {
    /// The empty path, addressing the whole tree.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path such as `jobs[0].name`.
    ///
    /// # Example
    ///
    /// ```
    /// use confkit_schema::{ConfigPath, PathSegment};
    ///
    /// let path = ConfigPath::parse("jobs[0].name").unwrap();
    /// assert_eq!(
    ///     path.segments(),
    ///     &[
    ///         PathSegment::Key("jobs".into()),
    ///         PathSegment::Index(0),
    ///         PathSegment::Key("name".into()),
    ///     ]
    /// );
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidPath {
            path: input.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut state = ParseState::Start;
        let mut chars = input.chars();

        while let Some(c) = chars.next() {
            match (state, c) {
                (ParseState::AfterIndex, '.') => state = ParseState::AfterDot,
                (ParseState::AfterIndex, '[') | (ParseState::Start, '[') => {
                    segments.push(PathSegment::Index(parse_index(&mut chars).map_err(invalid)?));
                    state = ParseState::AfterIndex;
                }
                (ParseState::AfterIndex, _) => {
                    return Err(invalid("expected '.' or '[' after an index"));
                }
                (ParseState::Start, '.') | (ParseState::AfterDot, '.') => {
                    return Err(invalid("empty key segment"));
                }
                (ParseState::AfterDot, '[') => {
                    return Err(invalid("expected a key after '.'"));
                }
                (ParseState::InKey, '.') => {
                    segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    state = ParseState::AfterDot;
                }
                (ParseState::InKey, '[') => {
                    segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    segments.push(PathSegment::Index(parse_index(&mut chars).map_err(invalid)?));
                    state = ParseState::AfterIndex;
                }
                (_, '\\') => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| invalid("trailing escape character"))?;
                    key.push(escaped);
                    state = ParseState::InKey;
                }
                (_, c) => {
                    key.push(c);
                    state = ParseState::InKey;
                }
            }
        }

        match state {
            ParseState::InKey => segments.push(PathSegment::Key(key)),
            ParseState::AfterDot => return Err(invalid("trailing '.'")),
            ParseState::Start | ParseState::AfterIndex => {}
        }

        Ok(Self(segments))
    }

    /// The path's segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a segment.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Remove the last segment.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Whether `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &ConfigPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Look up the value at this path.
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(value, |current, segment| match segment {
            PathSegment::Key(key) => current.as_object()?.get(key),
            PathSegment::Index(index) => current.as_array()?.get(*index),
        })
    }

    /// Look up the value at this path inside a mapping.
    pub fn get_in<'a>(&self, map: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let PathSegment::Key(key) = first else {
            return None;
        };
        Self(rest.to_vec()).get(map.get(key)?)
    }

    /// Mutable lookup of the value at this path.
    pub fn get_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = value;
        for segment in &self.0 {
            current = match segment {
                PathSegment::Key(key) => current.as_object_mut()?.get_mut(key)?,
                PathSegment::Index(index) => current.as_array_mut()?.get_mut(*index)?,
            };
        }
        Some(current)
    }

    /// Store `new_value` at this path.
    ///
    /// Missing intermediate mappings and sequences are created (a `null`
    /// along the way is replaced). An index equal to the sequence length
    /// appends. On error `target` is left untouched.
    pub fn set(&self, target: &mut Value, new_value: Value) -> Result<()> {
        self.check_settable(target)?;
        let mut current = target;

        for (depth, segment) in self.0.iter().enumerate() {
            if current.is_null() {
                *current = match segment {
                    PathSegment::Key(_) => Value::Object(Map::new()),
                    PathSegment::Index(_) => Value::Array(Vec::new()),
                };
            }

            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => {
                    map.entry(key.clone()).or_insert(Value::Null)
                }
                (PathSegment::Index(index), Value::Array(items)) => {
                    let len = items.len();
                    if *index > len {
                        return Err(self.conflict(
                            depth,
                            format!("index {} is out of bounds (length {})", index, len),
                        ));
                    }
                    if *index == len {
                        items.push(Value::Null);
                    }
                    &mut items[*index]
                }
                (PathSegment::Key(_), other) => {
                    return Err(self.conflict(
                        depth,
                        format!("expected a mapping, found {}", type_name(other)),
                    ));
                }
                (PathSegment::Index(_), other) => {
                    return Err(self.conflict(
                        depth,
                        format!("expected a sequence, found {}", type_name(other)),
                    ));
                }
            };
        }

        *current = new_value;
        Ok(())
    }

    /// Walk `target` without mutating it and report the first segment
    /// `set` would fail on.
    fn check_settable(&self, target: &Value) -> Result<()> {
        let mut current = Some(target).filter(|value| !value.is_null());

        for (depth, segment) in self.0.iter().enumerate() {
            current = match (segment, current) {
                (PathSegment::Index(index), None) if *index > 0 => {
                    return Err(self.conflict(
                        depth,
                        format!("index {} is out of bounds (length 0)", index),
                    ));
                }
                (_, None) => None,
                (PathSegment::Key(key), Some(Value::Object(map))) => map.get(key),
                (PathSegment::Index(index), Some(Value::Array(items))) => {
                    if *index > items.len() {
                        return Err(self.conflict(
                            depth,
                            format!("index {} is out of bounds (length {})", index, items.len()),
                        ));
                    }
                    items.get(*index)
                }
                (PathSegment::Key(_), Some(other)) => {
                    return Err(self.conflict(
                        depth,
                        format!("expected a mapping, found {}", type_name(other)),
                    ));
                }
                (PathSegment::Index(_), Some(other)) => {
                    return Err(self.conflict(
                        depth,
                        format!("expected a sequence, found {}", type_name(other)),
                    ));
                }
            }
            .filter(|value| !value.is_null());
        }

        Ok(())
    }

    /// Remove and return the value at this path.
    pub fn remove(&self, target: &mut Value) -> Option<Value> {
        let (last, parents) = self.0.split_last()?;
        let parent = Self(parents.to_vec()).get_mut(target)?;
        match last {
            PathSegment::Key(key) => parent.as_object_mut()?.remove(key),
            PathSegment::Index(index) => {
                let items = parent.as_array_mut()?;
                (*index < items.len()).then(|| items.remove(*index))
            }
        }
    }

    fn conflict(&self, depth: usize, message: String) -> Error {
        Error::PathConflict {
            path: Self(self.0[..depth].to_vec()).to_string(),
            message,
        }
    }
}

fn parse_index(chars: &mut std::str::Chars<'_>) -> std::result::Result<usize, &'static str> {
    let mut digits = String::new();
    for c in chars.by_ref() {
        if c == ']' {
            if digits.is_empty() {
                return Err("empty index");
            }
            return digits
                .parse()
                .map_err(|_| "index must be a non-negative integer");
        }
        if !c.is_ascii_digit() {
            return Err("index must be a non-negative integer");
        }
        digits.push(c);
    }
    Err("unclosed '['")
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Key(_)) {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for ConfigPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Vec<PathSegment>> for ConfigPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for ConfigPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", vec![])]
    #[case("a", vec![PathSegment::from("a")])]
    #[case("a.b", vec!["a".into(), "b".into()])]
    #[case("items[2]", vec!["items".into(), PathSegment::Index(2)])]
    #[case("[0].name", vec![PathSegment::Index(0), "name".into()])]
    #[case("m[1][2].x", vec!["m".into(), 1usize.into(), 2usize.into(), "x".into()])]
    #[case(r"a\.b.c", vec!["a.b".into(), "c".into()])]
    #[case(r"back\\slash", vec![r"back\slash".into()])]
    fn test_parse(#[case] input: &str, #[case] expected: Vec<PathSegment>) {
        assert_eq!(ConfigPath::parse(input).unwrap().segments(), expected.as_slice());
    }

    #[rstest]
    #[case(".a")]
    #[case("a.")]
    #[case("a..b")]
    #[case("a[x]")]
    #[case("a[]")]
    #[case("a[1")]
    #[case("a[0]b")]
    #[case("a.[0]")]
    #[case("a\\")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(matches!(
            ConfigPath::parse(input),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[rstest]
    #[case("output.format")]
    #[case("jobs[0].steps[1]")]
    #[case(r"a\.b.c")]
    fn test_display_reparses(#[case] input: &str) {
        let path = ConfigPath::parse(input).unwrap();
        assert_eq!(path.to_string(), input);
        assert_eq!(ConfigPath::parse(&path.to_string()).unwrap(), path);
    }

    #[test]
    fn test_get() {
        let value = json!({"jobs": [{"name": "build"}], "a.b": 1});
        let name = ConfigPath::parse("jobs[0].name").unwrap();
        assert_eq!(name.get(&value), Some(&json!("build")));
        assert_eq!(ConfigPath::parse(r"a\.b").unwrap().get(&value), Some(&json!(1)));
        assert_eq!(ConfigPath::parse("jobs[3]").unwrap().get(&value), None);
        assert_eq!(ConfigPath::root().get(&value), Some(&value));
    }

    #[test]
    fn test_set_creates_intermediate_containers() {
        let mut value = json!({});
        ConfigPath::parse("a.b[0].c").unwrap().set(&mut value, json!(true)).unwrap();
        assert_eq!(value, json!({"a": {"b": [{"c": true}]}}));
    }

    #[test]
    fn test_set_appends_at_length() {
        let mut value = json!({"list": [1, 2]});
        ConfigPath::parse("list[2]").unwrap().set(&mut value, json!(3)).unwrap();
        assert_eq!(value, json!({"list": [1, 2, 3]}));
    }

    #[test]
    fn test_set_out_of_bounds_leaves_target_untouched() {
        let mut value = json!({"list": [1]});
        let err = ConfigPath::parse("list[5]")
            .unwrap()
            .set(&mut value, json!(3))
            .unwrap_err();
        assert!(matches!(err, Error::PathConflict { .. }));
        assert_eq!(value, json!({"list": [1]}));
    }

    #[test]
    fn test_failed_set_does_not_create_intermediates() {
        let mut value = json!({"a": {}, "n": null});
        for path in ["a.x[3]", "a.x.y[1].z", "n[2]"] {
            assert!(ConfigPath::parse(path).unwrap().set(&mut value, json!(1)).is_err());
        }
        assert_eq!(value, json!({"a": {}, "n": null}));
    }

    #[test]
    fn test_set_replaces_null_and_keeps_siblings() {
        let mut value = json!({"a": {"keep": 1, "n": null}});
        ConfigPath::parse("a.n[0]").unwrap().set(&mut value, json!("x")).unwrap();
        ConfigPath::parse("a.m.k").unwrap().set(&mut value, json!(2)).unwrap();
        assert_eq!(value, json!({"a": {"keep": 1, "n": ["x"], "m": {"k": 2}}}));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut value = json!({"a": 1});
        let err = ConfigPath::parse("a.b").unwrap().set(&mut value, json!(2)).unwrap_err();
        assert!(err.to_string().contains("expected a mapping, found integer"));
    }

    #[test]
    fn test_remove() {
        let mut value = json!({"a": {"b": 1, "c": 2}, "l": [1, 2, 3]});
        assert_eq!(ConfigPath::parse("a.b").unwrap().remove(&mut value), Some(json!(1)));
        assert_eq!(ConfigPath::parse("l[1]").unwrap().remove(&mut value), Some(json!(2)));
        assert_eq!(ConfigPath::parse("l[9]").unwrap().remove(&mut value), None);
        assert_eq!(value, json!({"a": {"c": 2}, "l": [1, 3]}));
    }

    #[test]
    fn test_serializes_as_sequence() {
        let path = ConfigPath::parse("jobs[0].name").unwrap();
        assert_eq!(serde_json::to_value(&path).unwrap(), json!(["jobs", 0, "name"]));
    }
}
