//! Value types for HOCON documents.
//!
//! A [`Value`] is an immutable, cheaply cloned node. Every node carries an
//! [`Origin`] and one [`ValueKind`]. Besides the six JSON types, a tree that
//! has not been resolved yet may hold:
//! - `Reference` for `${path}` and `${?path}`
//! - `Concatenation` for adjacent pieces like `foo ${bar} baz`
//! - `DelayedMerge` / `DelayedMergeObject` for merges that can only be
//!   decided once substitutions are known
//!
//! Origins and flags never take part in equality or hashing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{Origin, Path, SubstitutionExpression};

/// Whether a subtree still contains substitutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResolveStatus {
    #[default]
    Resolved,
    Unresolved,
}

impl ResolveStatus {
    pub(crate) fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        if values.into_iter().all(Value::is_resolved) {
            ResolveStatus::Resolved
        } else {
            ResolveStatus::Unresolved
        }
    }
}

/// The JSON-level type of a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Object,
    List,
    Number,
    Boolean,
    Null,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Object => "object",
            ValueType::List => "list",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Null => "null",
            ValueType::String => "string",
        })
    }
}

/// A numeric value, stored at the narrowest width that holds it.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i32),
    Long(i64),
    Double(f64),
}

impl Number {
    pub fn from_i64(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(i) => Number::Int(i),
            Err(_) => Number::Long(value),
        }
    }

    /// The value as an integer, if it is integral.
    pub fn as_whole(&self) -> Option<i64> {
        match *self {
            Number::Int(i) => Some(i64::from(i)),
            Number::Long(l) => Some(l),
            Number::Double(d) => {
                if d.is_finite() && d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64
                {
                    Some(d as i64)
                } else {
                    None
                }
            }
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => f64::from(i),
            Number::Long(l) => l as f64,
            Number::Double(d) => d,
        }
    }

    /// Truncating conversion, as used by integer getters.
    pub fn as_i64(&self) -> i64 {
        match *self {
            Number::Int(i) => i64::from(i),
            Number::Long(l) => l,
            Number::Double(d) => d as i64,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_whole(), other.as_whole()) {
            (Some(a), Some(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.as_whole() {
            Some(whole) => whole.hash(state),
            None => self.as_f64().to_bits().hash(state),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Long(l) => write!(f, "{}", l),
            Number::Double(d) => write!(f, "{}", d),
        }
    }
}

/// An object: keys in insertion order, plus its cached resolve status.
#[derive(Debug, Clone, Default)]
pub struct ConfigObject {
    entries: IndexMap<String, Value>,
    status: ResolveStatus,
}

impl ConfigObject {
    pub fn new(entries: IndexMap<String, Value>) -> Self {
        let status = ResolveStatus::from_values(entries.values());
        Self { entries, status }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn entries(&self) -> &IndexMap<String, Value> {
        &self.entries
    }

    pub fn into_entries(self) -> IndexMap<String, Value> {
        self.entries
    }

    pub fn status(&self) -> ResolveStatus {
        self.status
    }

    /// Walk nested objects without resolving anything.
    pub fn peek_path(&self, path: &Path) -> Option<&Value> {
        let mut current = self.entries.get(path.first())?;
        for key in &path.keys()[1..] {
            current = current.as_object()?.entries.get(key.as_str())?;
        }
        Some(current)
    }
}

impl PartialEq for ConfigObject {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.entries.get(k).is_some_and(|o| o == v))
    }
}

/// A list and its cached resolve status.
#[derive(Debug, Clone, Default)]
pub struct ConfigList {
    items: Vec<Value>,
    status: ResolveStatus,
}

impl ConfigList {
    pub fn new(items: Vec<Value>) -> Self {
        let status = ResolveStatus::from_values(&items);
        Self { items, status }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn status(&self) -> ResolveStatus {
        self.status
    }
}

impl PartialEq for ConfigList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

/// A substitution placed in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub expr: SubstitutionExpression,
    /// How many leading path elements were added by relativizing an
    /// included document; used to retry the lookup without them.
    pub prefix_length: usize,
}

/// What a value is.
#[derive(Debug, Clone)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Number {
        value: Number,
        /// The number as written in the source, if it came from text.
        text: Option<String>,
    },
    String {
        text: String,
        /// False for unquoted text; only matters for whitespace between
        /// concatenated values.
        quoted: bool,
    },
    Object(ConfigObject),
    List(ConfigList),
    Reference(Reference),
    /// Adjacent pieces still waiting for substitutions.
    Concatenation(Vec<Value>),
    /// A merge stack whose first element is not an object.
    DelayedMerge(Vec<Value>),
    /// A merge stack whose first element is an object.
    DelayedMergeObject(Vec<Value>),
}

#[derive(Debug)]
struct Node {
    origin: Origin,
    kind: ValueKind,
    ignores_fallbacks: bool,
}

/// An immutable HOCON value.
#[derive(Clone)]
pub struct Value(Arc<Node>);

impl Value {
    pub fn new(origin: Origin, kind: ValueKind) -> Self {
        Self::with_flags(origin, kind, false)
    }

    pub(crate) fn with_flags(origin: Origin, kind: ValueKind, ignores_fallbacks: bool) -> Self {
        Value(Arc::new(Node {
            origin,
            kind,
            ignores_fallbacks,
        }))
    }

    pub fn null(origin: Origin) -> Self {
        Self::new(origin, ValueKind::Null)
    }

    pub fn boolean(origin: Origin, value: bool) -> Self {
        Self::new(origin, ValueKind::Boolean(value))
    }

    pub fn int(origin: Origin, value: i64, text: Option<String>) -> Self {
        Self::number(origin, Number::from_i64(value), text)
    }

    pub fn double(origin: Origin, value: f64, text: Option<String>) -> Self {
        Self::number(origin, Number::Double(value), text)
    }

    pub fn number(origin: Origin, value: Number, text: Option<String>) -> Self {
        Self::new(origin, ValueKind::Number { value, text })
    }

    /// A quoted string.
    pub fn string(origin: Origin, text: impl Into<String>) -> Self {
        Self::new(
            origin,
            ValueKind::String {
                text: text.into(),
                quoted: true,
            },
        )
    }

    /// Unquoted text, including whitespace between concatenated values.
    pub fn unquoted(origin: Origin, text: impl Into<String>) -> Self {
        Self::new(
            origin,
            ValueKind::String {
                text: text.into(),
                quoted: false,
            },
        )
    }

    pub fn object(origin: Origin, entries: IndexMap<String, Value>) -> Self {
        Self::new(origin, ValueKind::Object(ConfigObject::new(entries)))
    }

    pub fn empty_object(origin: Origin) -> Self {
        Self::object(origin, IndexMap::new())
    }

    pub fn list(origin: Origin, items: Vec<Value>) -> Self {
        Self::new(origin, ValueKind::List(ConfigList::new(items)))
    }

    pub fn reference(origin: Origin, expr: SubstitutionExpression) -> Self {
        Self::reference_with_prefix(origin, expr, 0)
    }

    pub(crate) fn reference_with_prefix(
        origin: Origin,
        expr: SubstitutionExpression,
        prefix_length: usize,
    ) -> Self {
        Self::new(
            origin,
            ValueKind::Reference(Reference {
                expr,
                prefix_length,
            }),
        )
    }

    /// A raw concatenation of `pieces`, without consolidating them.
    pub fn concatenation(origin: Origin, pieces: Vec<Value>) -> Self {
        Self::new(origin, ValueKind::Concatenation(pieces))
    }

    pub fn origin(&self) -> &Origin {
        &self.0.origin
    }

    pub fn kind(&self) -> &ValueKind {
        &self.0.kind
    }

    /// The JSON-level type, or `None` for kinds that only exist before
    /// resolution.
    pub fn value_type(&self) -> Option<ValueType> {
        match self.kind() {
            ValueKind::Null => Some(ValueType::Null),
            ValueKind::Boolean(_) => Some(ValueType::Boolean),
            ValueKind::Number { .. } => Some(ValueType::Number),
            ValueKind::String { .. } => Some(ValueType::String),
            ValueKind::Object(_) | ValueKind::DelayedMergeObject(_) => Some(ValueType::Object),
            ValueKind::List(_) => Some(ValueType::List),
            ValueKind::Reference(_)
            | ValueKind::Concatenation(_)
            | ValueKind::DelayedMerge(_) => None,
        }
    }

    pub fn resolve_status(&self) -> ResolveStatus {
        match self.kind() {
            ValueKind::Object(o) => o.status(),
            ValueKind::List(l) => l.status(),
            ValueKind::Reference(_)
            | ValueKind::Concatenation(_)
            | ValueKind::DelayedMerge(_)
            | ValueKind::DelayedMergeObject(_) => ResolveStatus::Unresolved,
            _ => ResolveStatus::Resolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolve_status() == ResolveStatus::Resolved
    }

    /// Whether merging anything below this value is a no-op.
    pub fn ignores_fallbacks(&self) -> bool {
        match self.kind() {
            ValueKind::Object(_) => self.0.ignores_fallbacks,
            ValueKind::DelayedMerge(stack) | ValueKind::DelayedMergeObject(stack) => {
                stack.last().is_some_and(Value::ignores_fallbacks)
            }
            ValueKind::Reference(_) | ValueKind::Concatenation(_) => false,
            _ => self.is_resolved(),
        }
    }

    /// Same value, different origin.
    pub fn with_origin(&self, origin: Origin) -> Value {
        Self::with_flags(origin, self.0.kind.clone(), self.0.ignores_fallbacks)
    }

    pub fn as_object(&self) -> Option<&ConfigObject> {
        match self.kind() {
            ValueKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self.kind() {
            ValueKind::List(l) => Some(l.items()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.kind() {
            ValueKind::String { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            ValueKind::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self.kind() {
            ValueKind::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind(), ValueKind::Null)
    }

    /// The text a scalar contributes to a string concatenation; `None` for
    /// objects, lists and unresolved kinds.
    pub fn transform_to_string(&self) -> Option<String> {
        match self.kind() {
            ValueKind::Null => Some("null".to_string()),
            ValueKind::Boolean(b) => Some(b.to_string()),
            ValueKind::Number { value, text } => {
                Some(text.clone().unwrap_or_else(|| value.to_string()))
            }
            ValueKind::String { text, .. } => Some(text.clone()),
            _ => None,
        }
    }

    /// Unquoted text made only of whitespace.
    pub(crate) fn is_ignored_whitespace(&self) -> bool {
        match self.kind() {
            ValueKind::String {
                text,
                quoted: false,
            } => text.chars().all(hocon_tokenizer::is_whitespace),
            _ => false,
        }
    }

    /// Identity of the shared node, stable while any clone is alive.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.kind(), other.kind()) {
            (ValueKind::Null, ValueKind::Null) => true,
            (ValueKind::Boolean(a), ValueKind::Boolean(b)) => a == b,
            (ValueKind::Number { value: a, .. }, ValueKind::Number { value: b, .. }) => a == b,
            (ValueKind::String { text: a, .. }, ValueKind::String { text: b, .. }) => a == b,
            (ValueKind::Object(a), ValueKind::Object(b)) => a == b,
            (ValueKind::List(a), ValueKind::List(b)) => a == b,
            (ValueKind::Reference(a), ValueKind::Reference(b)) => a.expr == b.expr,
            (ValueKind::Concatenation(a), ValueKind::Concatenation(b))
            | (ValueKind::DelayedMerge(a), ValueKind::DelayedMerge(b))
            | (ValueKind::DelayedMergeObject(a), ValueKind::DelayedMergeObject(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.kind() {
            ValueKind::Null => 0u8.hash(state),
            ValueKind::Boolean(b) => b.hash(state),
            ValueKind::Number { value, .. } => value.hash(state),
            ValueKind::String { text, .. } => text.hash(state),
            ValueKind::Object(o) => {
                let mut keys: Vec<&String> = o.entries().keys().collect();
                keys.sort();
                for key in keys {
                    key.hash(state);
                    o.entries()[key].hash(state);
                }
            }
            ValueKind::List(l) => l.items().hash(state),
            ValueKind::Reference(r) => r.expr.hash(state),
            ValueKind::Concatenation(pieces)
            | ValueKind::DelayedMerge(pieces)
            | ValueKind::DelayedMergeObject(pieces) => pieces.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean(b) => write!(f, "{}", b),
            ValueKind::Number { value, .. } => write!(f, "{}", value),
            ValueKind::String { text, .. } => write!(f, "{:?}", text),
            ValueKind::Object(o) => f.debug_map().entries(o.iter()).finish(),
            ValueKind::List(l) => f.debug_list().entries(l.items()).finish(),
            ValueKind::Reference(r) => write!(f, "{}", r.expr),
            ValueKind::Concatenation(pieces) => {
                f.debug_tuple("Concatenation").field(pieces).finish()
            }
            ValueKind::DelayedMerge(stack) => f.debug_tuple("DelayedMerge").field(stack).finish(),
            ValueKind::DelayedMergeObject(stack) => {
                f.debug_tuple("DelayedMergeObject").field(stack).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn origin() -> Origin {
        Origin::new("test")
    }

    #[test]
    fn test_int_width() {
        assert!(matches!(
            Value::int(origin(), 7, None).as_number(),
            Some(Number::Int(7))
        ));
        assert!(matches!(
            Value::int(origin(), 1 << 40, None).as_number(),
            Some(Number::Long(_))
        ));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let one = Value::int(origin(), 1, Some("1".into()));
        let one_double = Value::double(origin(), 1.0, Some("1.0".into()));
        assert_eq!(one, one_double);
        assert_ne!(one, Value::double(origin(), 1.5, None));
    }

    #[test]
    fn test_equality_ignores_origin_and_quoting() {
        let a = Value::string(Origin::new("a").with_line(1), "x");
        let b = Value::unquoted(Origin::new("b").with_line(9), "x");
        assert_eq!(a, b);
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let mut first = IndexMap::new();
        first.insert("a".to_string(), Value::int(origin(), 1, None));
        first.insert("b".to_string(), Value::int(origin(), 2, None));
        let mut second = IndexMap::new();
        second.insert("b".to_string(), Value::int(origin(), 2, None));
        second.insert("a".to_string(), Value::int(origin(), 1, None));
        assert_eq!(Value::object(origin(), first), Value::object(origin(), second));
    }

    #[test]
    fn test_status_propagates() {
        let reference = Value::reference(
            origin(),
            SubstitutionExpression::new(Path::key("x"), false),
        );
        let list = Value::list(origin(), vec![Value::null(origin()), reference]);
        assert_eq!(list.resolve_status(), ResolveStatus::Unresolved);
        assert!(!list.ignores_fallbacks());
        assert!(Value::boolean(origin(), true).ignores_fallbacks());
    }
}
