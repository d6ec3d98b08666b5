//! Path-based edits on object trees.

use indexmap::IndexMap;

use crate::{ConfigObject, Path, Value, ValueKind};

impl Value {
    /// `{key: self}`.
    pub fn at_key(&self, key: &str) -> Value {
        let mut entries = IndexMap::with_capacity(1);
        entries.insert(key.to_string(), self.clone());
        Value::object(self.origin().clone(), entries)
    }

    /// Nest this value under `path`, e.g. `a.b` gives `{a: {b: self}}`.
    pub fn at_path(&self, path: &Path) -> Value {
        path.keys()
            .iter()
            .rev()
            .fold(self.clone(), |inner, key| inner.at_key(key))
    }

    fn with_entries(&self, entries: IndexMap<String, Value>) -> Value {
        Value::with_flags(
            self.origin().clone(),
            ValueKind::Object(ConfigObject::new(entries)),
            self.ignores_fallbacks(),
        )
    }

    /// Keep only the value at `path` and the objects leading to it.
    ///
    /// Returns an empty object when nothing is at `path`.
    pub fn with_only_path(&self, path: &Path) -> Value {
        self.with_only_path_or_none(path)
            .unwrap_or_else(|| self.with_entries(IndexMap::new()))
    }

    fn with_only_path_or_none(&self, path: &Path) -> Option<Value> {
        let object = self.as_object()?;
        let child = object.get(path.first())?;
        let kept = match path.remainder() {
            None => child.clone(),
            Some(next) => child.with_only_path_or_none(&next)?,
        };
        let mut entries = IndexMap::with_capacity(1);
        entries.insert(path.first().to_string(), kept);
        Some(self.with_entries(entries))
    }

    /// Remove the value at `path`, if there is one.
    pub fn without_path(&self, path: &Path) -> Value {
        let Some(object) = self.as_object() else {
            return self.clone();
        };
        let key = path.first();
        let Some(child) = object.get(key) else {
            return self.clone();
        };
        match path.remainder() {
            Some(next) => {
                if child.as_object().is_none() {
                    return self.clone();
                }
                let mut entries = object.entries().clone();
                entries.insert(key.to_string(), child.without_path(&next));
                self.with_entries(entries)
            }
            None => {
                let mut entries = object.entries().clone();
                entries.shift_remove(key);
                self.with_entries(entries)
            }
        }
    }

    /// Set the value at `path`, creating or replacing objects along the way.
    pub fn with_path_value(&self, path: &Path, value: Value) -> Value {
        let mut entries = self
            .as_object()
            .map(|o| o.entries().clone())
            .unwrap_or_default();
        let key = path.first().to_string();
        let new_child = match path.remainder() {
            None => value,
            Some(next) => match entries.get(&key) {
                Some(child) if child.as_object().is_some() => child.with_path_value(&next, value),
                _ => value.at_path(&next),
            },
        };
        entries.insert(key, new_child);
        self.with_entries(entries)
    }
}
