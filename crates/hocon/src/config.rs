//! The [`Config`] handle: an object tree read through path expressions.

use std::path::Path as FsPath;
use std::time::Duration;

use hocon_parse::{ParseOptions, parse_path};
use hocon_tree::{
    ConfigError, ConfigObject, Number, Origin, Path, RenderOptions, ResolveOptions, Result, Value,
    ValueKind, ValueType, env_variables,
};
use tracing::debug;

use crate::units::{self, UnitError};

/// An immutable configuration whose root is always an object.
///
/// Getters take path expressions such as `a.b."c.d"` and never return
/// null: an absent path is [`ConfigError::Missing`], an explicit `null` is
/// [`ConfigError::Null`] and a value that cannot be coerced to the
/// requested type is [`ConfigError::WrongType`]. Reading through a
/// substitution that has not been resolved is [`ConfigError::NotResolved`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: Value,
}

impl Config {
    /// Wrap an object tree.
    pub fn new(root: Value) -> Result<Self> {
        match root.value_type() {
            Some(ValueType::Object) => Ok(Config { root }),
            other => Err(ConfigError::wrong_type(
                root.origin().clone(),
                format!("the root of a config must be an object, not {}", describe(other)),
            )),
        }
    }

    pub fn empty() -> Self {
        Self::empty_with_description("empty config")
    }

    pub fn empty_with_description(description: impl Into<String>) -> Self {
        Config {
            root: Value::empty_object(Origin::new(description)),
        }
    }

    pub fn parse_string(source: &str) -> Result<Self> {
        Self::parse_string_with(source, &ParseOptions::new())
    }

    pub fn parse_string_with(source: &str, options: &ParseOptions) -> Result<Self> {
        Self::new(hocon_parse::parse_string(source, options)?)
    }

    pub fn parse_file(path: impl AsRef<FsPath>) -> Result<Self> {
        Self::parse_file_with(path, &ParseOptions::new())
    }

    pub fn parse_file_with(path: impl AsRef<FsPath>, options: &ParseOptions) -> Result<Self> {
        Self::new(hocon_parse::parse_file(path, options)?)
    }

    /// Load `basename.conf`, `basename.json` and `basename.properties`,
    /// whichever exist, with that order of priority. A name that already
    /// has an extension is loaded as is.
    pub fn parse_file_any_syntax(
        basename: impl AsRef<FsPath>,
        options: &ParseOptions,
    ) -> Result<Self> {
        Self::new(hocon_parse::parse_file_any_syntax(basename, options)?)
    }

    /// Convert a JSON document; its root must be an object.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Self::new(Value::from_json(json, &Origin::new("json")))
    }

    /// Build a config from `(path expression, value)` pairs.
    ///
    /// A path that is both a value and the parent of another path is an
    /// error.
    pub fn from_path_map<K: AsRef<str>>(
        entries: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Self> {
        let origin = Origin::new("hardcoded value");
        let entries = entries
            .into_iter()
            .map(|(key, value)| Ok((parse_path(key.as_ref())?, value)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(hocon_parse::properties::from_path_map(&origin, entries, false)?)
    }

    /// The process environment, one key per variable.
    pub fn system_environment() -> Self {
        Config {
            root: env_variables(),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn origin(&self) -> &Origin {
        self.root.origin()
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_object().is_some_and(ConfigObject::is_empty)
    }

    pub fn is_resolved(&self) -> bool {
        self.root.is_resolved()
    }

    /// Resolve substitutions against this config, falling back to the
    /// environment.
    pub fn resolve(&self) -> Result<Self> {
        self.resolve_with_options(&ResolveOptions::new())
    }

    pub fn resolve_with_options(&self, options: &ResolveOptions) -> Result<Self> {
        self.resolve_with(self, options)
    }

    /// Resolve substitutions in this config by looking them up in `source`.
    pub fn resolve_with(&self, source: &Config, options: &ResolveOptions) -> Result<Self> {
        if self.is_resolved() {
            return Ok(self.clone());
        }
        debug!(target: "hocon::resolve", origin = %self.origin(), "resolving config");
        Self::new(hocon_tree::resolve_with(&self.root, &source.root, options)?)
    }

    /// This config with `fallback` merged underneath it.
    pub fn with_fallback(&self, fallback: &Config) -> Config {
        Config {
            root: self.root.with_fallback(&fallback.root),
        }
    }

    /// Whether `path` holds a value other than null.
    pub fn has_path(&self, path: &str) -> Result<bool> {
        let parsed = parse_path(path)?;
        let mut current = &self.root;
        for key in parsed.keys() {
            if current.is_unmergeable() {
                return Err(not_resolved(current, path));
            }
            let Some(object) = current.as_object() else {
                return Ok(false);
            };
            match object.get(key) {
                Some(child) => current = child,
                None => return Ok(false),
            }
        }
        if current.is_unmergeable() {
            return Err(not_resolved(current, path));
        }
        Ok(!current.is_null())
    }

    pub fn get_value(&self, path: &str) -> Result<Value> {
        self.find(path, None)
    }

    pub fn get_string(&self, path: &str) -> Result<String> {
        self.typed(path, ValueType::String, |v| v.as_str().map(str::to_string))
    }

    /// Also accepts the strings `true`, `yes`, `on`, `false`, `no` and `off`.
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        self.typed(path, ValueType::Boolean, Value::as_bool)
    }

    /// Also accepts strings that parse as numbers.
    pub fn get_number(&self, path: &str) -> Result<Number> {
        self.typed(path, ValueType::Number, Value::as_number)
    }

    pub fn get_i32(&self, path: &str) -> Result<i32> {
        let value = self.find(path, Some(ValueType::Number))?;
        let number = extract(&value, Value::as_number)?.as_i64();
        i32::try_from(number).map_err(|_| {
            ConfigError::wrong_type(
                value.origin().clone(),
                format!("{path} has type out-of-range value {number} rather than 32-bit integer"),
            )
        })
    }

    /// Doubles are truncated toward zero.
    pub fn get_i64(&self, path: &str) -> Result<i64> {
        Ok(self.get_number(path)?.as_i64())
    }

    pub fn get_f64(&self, path: &str) -> Result<f64> {
        Ok(self.get_number(path)?.as_f64())
    }

    pub fn get_object(&self, path: &str) -> Result<ConfigObject> {
        self.typed(path, ValueType::Object, |v| v.as_object().cloned())
    }

    pub fn get_config(&self, path: &str) -> Result<Config> {
        let root = self.find(path, Some(ValueType::Object))?;
        Ok(Config { root })
    }

    pub fn get_list(&self, path: &str) -> Result<Vec<Value>> {
        self.typed(path, ValueType::List, |v| v.as_list().map(<[Value]>::to_vec))
    }

    /// A list whose elements are all strings, or numbers and booleans
    /// which are converted to strings.
    pub fn get_string_list(&self, path: &str) -> Result<Vec<String>> {
        self.get_list(path)?
            .into_iter()
            .map(|item| {
                if item.is_unmergeable() {
                    return Err(not_resolved(&item, path));
                }
                let item = coerce(item, ValueType::String);
                match item.as_str() {
                    Some(text) => Ok(text.to_string()),
                    None => Err(ConfigError::wrong_type(
                        item.origin().clone(),
                        format!(
                            "{path} has type list of {} rather than list of string",
                            describe(item.value_type())
                        ),
                    )),
                }
            })
            .collect()
    }

    /// A number of milliseconds, or a string with a unit such as `10s`.
    pub fn get_duration(&self, path: &str) -> Result<Duration> {
        let value = self.find(path, None)?;
        let parsed = match value.kind() {
            ValueKind::Number { value: number, .. } => units::parse_duration(&number.to_string()),
            ValueKind::String { text, .. } => units::parse_duration(text),
            _ => {
                return Err(ConfigError::wrong_type(
                    value.origin().clone(),
                    format!(
                        "{path} has type {} rather than duration string or number of milliseconds",
                        describe(value.value_type())
                    ),
                ));
            }
        };
        parsed.map_err(|err| bad_value(&value, path, err))
    }

    /// A number of bytes, or a string with a unit such as `512MiB`.
    pub fn get_bytes(&self, path: &str) -> Result<u64> {
        let value = self.find(path, None)?;
        let parsed = match value.kind() {
            ValueKind::Number { value: number, .. } => units::parse_bytes(&number.to_string()),
            ValueKind::String { text, .. } => units::parse_bytes(text),
            _ => {
                return Err(ConfigError::wrong_type(
                    value.origin().clone(),
                    format!(
                        "{path} has type {} rather than memory size string or number of bytes",
                        describe(value.value_type())
                    ),
                ));
            }
        };
        parsed.map_err(|err| bad_value(&value, path, err))
    }

    /// Only the value at `path` and the objects leading to it.
    pub fn with_only_path(&self, path: &str) -> Result<Config> {
        let path = parse_path(path)?;
        Ok(Config {
            root: self.root.with_only_path(&path),
        })
    }

    pub fn without_path(&self, path: &str) -> Result<Config> {
        let path = parse_path(path)?;
        Ok(Config {
            root: self.root.without_path(&path),
        })
    }

    /// A copy with `value` placed at `path`, replacing what was there.
    pub fn with_value(&self, path: &str, value: Value) -> Result<Config> {
        let path = parse_path(path)?;
        Ok(Config {
            root: self.root.with_path_value(&path, value),
        })
    }

    /// This config nested under `path`.
    pub fn at_path(&self, path: &str) -> Result<Config> {
        let path = parse_path(path)?;
        Ok(Config {
            root: self.root.at_path(&path),
        })
    }

    /// Every non-null leaf, keyed by its rendered path, in document order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut leaves = Vec::new();
        collect_leaves(&self.root, None, &mut leaves);
        leaves
    }

    pub fn render(&self, options: &RenderOptions) -> String {
        self.root.render(options)
    }

    fn typed<T>(
        &self,
        path: &str,
        expected: ValueType,
        get: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<T> {
        let value = self.find(path, Some(expected))?;
        extract(&value, get)
    }

    /// Walk `path`, requiring objects along the way and `expected` at the
    /// end.
    fn find(&self, path: &str, expected: Option<ValueType>) -> Result<Value> {
        let parsed = parse_path(path)?;
        if self.root.is_unmergeable() {
            return Err(not_resolved(&self.root, path));
        }
        let keys = parsed.keys();
        let mut current = self.root.clone();
        for depth in 1..=keys.len() {
            let here = render_prefix(&parsed, depth);
            let child = current
                .as_object()
                .and_then(|object| object.get(&keys[depth - 1]))
                .cloned()
                .ok_or_else(|| ConfigError::Missing {
                    origin: None,
                    path: here.clone(),
                })?;
            let wanted = if depth == keys.len() {
                expected
            } else {
                Some(ValueType::Object)
            };
            current = checked(child, wanted, &here)?;
        }
        Ok(current)
    }
}

fn checked(value: Value, expected: Option<ValueType>, path: &str) -> Result<Value> {
    if value.is_unmergeable() {
        return Err(not_resolved(&value, path));
    }
    let value = match expected {
        Some(requested) => coerce(value, requested),
        None => value,
    };
    let actual = value.value_type();
    if actual == Some(ValueType::Null) {
        return Err(ConfigError::Null {
            origin: value.origin().clone(),
            path: path.to_string(),
            expected: expected.map_or_else(|| "a value".to_string(), |t| t.to_string()),
        });
    }
    if let Some(expected) = expected {
        if actual != Some(expected) {
            return Err(ConfigError::wrong_type(
                value.origin().clone(),
                format!("{path} has type {} rather than {expected}", describe(actual)),
            ));
        }
    }
    Ok(value)
}

/// Best-effort conversion between strings and other scalars. Anything that
/// does not convert comes back unchanged for the type check to reject.
pub(crate) fn coerce(value: Value, requested: ValueType) -> Value {
    coerced(&value, requested).unwrap_or(value)
}

fn coerced(value: &Value, requested: ValueType) -> Option<Value> {
    let origin = value.origin().clone();
    match (value.kind(), requested) {
        (ValueKind::String { text, .. }, ValueType::Number) => {
            if let Ok(whole) = text.parse::<i64>() {
                return Some(Value::int(origin, whole, Some(text.clone())));
            }
            text.parse::<f64>()
                .ok()
                .filter(|d| d.is_finite())
                .map(|d| Value::double(origin, d, Some(text.clone())))
        }
        (ValueKind::String { text, .. }, ValueType::Boolean) => match text.as_str() {
            "true" | "yes" | "on" => Some(Value::boolean(origin, true)),
            "false" | "no" | "off" => Some(Value::boolean(origin, false)),
            _ => None,
        },
        (ValueKind::String { text, .. }, ValueType::Null) if text == "null" => {
            Some(Value::null(origin))
        }
        (ValueKind::Number { .. } | ValueKind::Boolean(_), ValueType::String) => value
            .transform_to_string()
            .map(|text| Value::string(origin, text)),
        _ => None,
    }
}

fn extract<T>(value: &Value, get: impl FnOnce(&Value) -> Option<T>) -> Result<T> {
    get(value).ok_or_else(|| {
        ConfigError::bug(format!(
            "value of type {} passed the type check but could not be read",
            describe(value.value_type())
        ))
    })
}

pub(crate) fn describe(value_type: Option<ValueType>) -> String {
    match value_type {
        Some(t) => t.to_string(),
        None => "unresolved value".to_string(),
    }
}

fn not_resolved(value: &Value, path: &str) -> ConfigError {
    ConfigError::NotResolved {
        message: format!(
            "{}: '{path}' has not been resolved, call Config::resolve() before reading it",
            value.origin()
        ),
    }
}

fn bad_value(value: &Value, path: &str, err: UnitError) -> ConfigError {
    ConfigError::BadValue {
        origin: value.origin().clone(),
        path: path.to_string(),
        message: err.to_string(),
    }
}

fn render_prefix(path: &Path, len: usize) -> String {
    Path::from_keys(path.keys()[..len].iter().cloned()).map_or_else(String::new, |p| p.render())
}

fn collect_leaves(value: &Value, path: Option<&Path>, leaves: &mut Vec<(String, Value)>) {
    match (value.as_object(), path) {
        (Some(object), _) => {
            for (key, child) in object.iter() {
                let child_path = match path {
                    Some(parent) => parent.child(key),
                    None => Path::key(key),
                };
                collect_leaves(child, Some(&child_path), leaves);
            }
        }
        (None, Some(path)) if !value.is_null() => leaves.push((path.render(), value.clone())),
        _ => {}
    }
}
