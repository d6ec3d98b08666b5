//! Merging with fallbacks, concatenation and relativizing.

use indexmap::IndexMap;

use crate::{ConfigError, ConfigObject, Origin, Path, Result, Value, ValueKind};

impl Value {
    /// Whether this value cannot be merged until it is resolved.
    pub fn is_unmergeable(&self) -> bool {
        matches!(
            self.kind(),
            ValueKind::Reference(_)
                | ValueKind::Concatenation(_)
                | ValueKind::DelayedMerge(_)
                | ValueKind::DelayedMergeObject(_)
        )
    }

    /// The merge stack this value stands for.
    pub(crate) fn unmerged_values(&self) -> Vec<Value> {
        match self.kind() {
            ValueKind::DelayedMerge(stack) | ValueKind::DelayedMergeObject(stack) => stack.clone(),
            _ => vec![self.clone()],
        }
    }

    /// Merge `fallback` underneath this value.
    ///
    /// Object keys missing here are taken from `fallback`; keys present in
    /// both are merged recursively. Any non-object value hides what falls
    /// back behind it. Merges involving unresolved values are kept as a
    /// delayed merge and decided during resolution.
    pub fn with_fallback(&self, fallback: &Value) -> Value {
        if self.ignores_fallbacks() {
            return self.clone();
        }
        if fallback.is_unmergeable() {
            let mut stack = self.unmerged_values();
            stack.extend(fallback.unmerged_values());
            return self.construct_delayed_merge(stack);
        }
        match (self.kind(), fallback.kind()) {
            (ValueKind::Object(own), ValueKind::Object(other)) => {
                self.merged_with_object(own, fallback, other)
            }
            _ => {
                if self.is_resolved() {
                    self.with_fallbacks_ignored()
                } else {
                    let mut stack = self.unmerged_values();
                    stack.push(fallback.clone());
                    self.construct_delayed_merge(stack)
                }
            }
        }
    }

    fn merged_with_object(
        &self,
        own: &ConfigObject,
        fallback: &Value,
        other: &ConfigObject,
    ) -> Value {
        let mut changed = false;
        let mut merged = IndexMap::with_capacity(own.len() + other.len());
        let keys = other
            .keys()
            .chain(own.keys().filter(|k| !other.contains_key(k)));
        for key in keys {
            let kept = match (own.get(key), other.get(key)) {
                (Some(first), Some(second)) => {
                    let kept = first.with_fallback(second);
                    if !kept.ptr_eq(first) {
                        changed = true;
                    }
                    kept
                }
                (Some(first), None) => first.clone(),
                (None, Some(second)) => {
                    changed = true;
                    second.clone()
                }
                (None, None) => continue,
            };
            merged.insert(key.to_string(), kept);
        }

        let ignores_fallbacks = fallback.ignores_fallbacks();
        let object = ConfigObject::new(merged);
        if changed {
            let origin = merge_origins(&[self.clone(), fallback.clone()]);
            Value::with_flags(origin, ValueKind::Object(object), ignores_fallbacks)
        } else if object.status() != own.status() || ignores_fallbacks != self.ignores_fallbacks()
        {
            Value::with_flags(
                self.origin().clone(),
                ValueKind::Object(object),
                ignores_fallbacks,
            )
        } else {
            self.clone()
        }
    }

    pub(crate) fn with_fallbacks_ignored(&self) -> Value {
        match self.kind() {
            ValueKind::Object(o) if !self.ignores_fallbacks() => Value::with_flags(
                self.origin().clone(),
                ValueKind::Object(o.clone()),
                true,
            ),
            _ => self.clone(),
        }
    }

    fn construct_delayed_merge(&self, stack: Vec<Value>) -> Value {
        let origin = merge_origins(&stack);
        match self.kind() {
            ValueKind::Object(_) | ValueKind::DelayedMergeObject(_) => {
                Value::new(origin, ValueKind::DelayedMergeObject(stack))
            }
            _ => Value::new(origin, ValueKind::DelayedMerge(stack)),
        }
    }

    /// Rewrite every substitution below this value to be relative to
    /// `prefix`, as needed when a document is included under a key.
    pub fn relativized(&self, prefix: &Path) -> Value {
        let map = |values: &[Value]| -> Vec<Value> {
            values.iter().map(|v| v.relativized(prefix)).collect()
        };
        match self.kind() {
            ValueKind::Reference(r) => Value::reference_with_prefix(
                self.origin().clone(),
                r.expr.with_path(r.expr.path.prepend(prefix)),
                r.prefix_length + prefix.len(),
            ),
            ValueKind::Object(o) => {
                if o.status() == crate::ResolveStatus::Resolved {
                    return self.clone();
                }
                let entries = o
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.relativized(prefix)))
                    .collect();
                Value::with_flags(
                    self.origin().clone(),
                    ValueKind::Object(ConfigObject::new(entries)),
                    self.ignores_fallbacks(),
                )
            }
            ValueKind::List(l) => {
                if l.status() == crate::ResolveStatus::Resolved {
                    return self.clone();
                }
                Value::list(self.origin().clone(), map(l.items()))
            }
            ValueKind::Concatenation(pieces) => {
                Value::concatenation(self.origin().clone(), map(pieces))
            }
            ValueKind::DelayedMerge(stack) => {
                Value::new(self.origin().clone(), ValueKind::DelayedMerge(map(stack)))
            }
            ValueKind::DelayedMergeObject(stack) => Value::new(
                self.origin().clone(),
                ValueKind::DelayedMergeObject(map(stack)),
            ),
            _ => self.clone(),
        }
    }
}

/// The origin for a value combined from `stack`. Resolved empty objects are
/// left out unless nothing else is there.
pub(crate) fn merge_origins(stack: &[Value]) -> Origin {
    let meaningful: Vec<&Origin> = stack
        .iter()
        .filter(|v| !v.as_object().is_some_and(|o| o.is_empty() && v.is_resolved()))
        .map(Value::origin)
        .collect();
    Origin::merge_all(meaningful)
        .or_else(|| stack.first().map(|v| v.origin().clone()))
        .unwrap_or_else(|| Origin::new("empty merge"))
}

/// Consolidate adjacent pieces and produce their single value: `None` when
/// there are no pieces, the piece itself when only one is left, and a
/// concatenation otherwise.
pub fn concatenate(pieces: Vec<Value>) -> Result<Option<Value>> {
    let mut consolidated = consolidate(pieces, false)?;
    match consolidated.len() {
        0 => Ok(None),
        1 => Ok(consolidated.pop()),
        _ => {
            let origin = Origin::merge_all(consolidated.iter().map(Value::origin))
                .unwrap_or_else(|| Origin::new("concatenation"));
            Ok(Some(Value::concatenation(origin, consolidated)))
        }
    }
}

/// Join neighbouring pieces wherever their kinds allow it.
///
/// With `null_as_empty`, null pieces contribute nothing to joined text.
pub(crate) fn consolidate(pieces: Vec<Value>, null_as_empty: bool) -> Result<Vec<Value>> {
    if pieces.len() < 2 {
        return Ok(pieces);
    }
    let mut flattened = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece.kind() {
            ValueKind::Concatenation(inner) => flattened.extend(inner.iter().cloned()),
            _ => flattened.push(piece),
        }
    }

    let mut consolidated: Vec<Value> = Vec::with_capacity(flattened.len());
    for right in flattened {
        match consolidated.pop() {
            None => consolidated.push(right),
            Some(left) => match join(&left, &right, null_as_empty)? {
                Some(joined) => consolidated.push(joined),
                None => {
                    consolidated.push(left);
                    consolidated.push(right);
                }
            },
        }
    }
    Ok(consolidated)
}

fn is_object_like(value: &Value) -> bool {
    matches!(
        value.kind(),
        ValueKind::Object(_) | ValueKind::DelayedMergeObject(_)
    )
}

fn join(left: &Value, right: &Value, null_as_empty: bool) -> Result<Option<Value>> {
    if is_object_like(left) && is_object_like(right) {
        return Ok(Some(right.with_fallback(left)));
    }
    if let (ValueKind::List(a), ValueKind::List(b)) = (left.kind(), right.kind()) {
        let items = a.items().iter().chain(b.items()).cloned().collect();
        return Ok(Some(Value::list(left.origin().merge(right.origin()), items)));
    }
    if (is_object_like(left) || left.as_list().is_some()) && right.is_ignored_whitespace() {
        return Ok(Some(left.clone()));
    }
    if left.is_unmergeable() || right.is_unmergeable() {
        return Ok(None);
    }

    let text = |v: &Value| {
        if null_as_empty && v.is_null() {
            Some(String::new())
        } else {
            v.transform_to_string()
        }
    };
    match (text(left), text(right)) {
        (Some(s1), Some(s2)) => Ok(Some(Value::string(
            left.origin().merge(right.origin()),
            s1 + &s2,
        ))),
        _ => Err(ConfigError::wrong_type(
            left.origin().clone(),
            format!(
                "Cannot concatenate object or list with a non-object-or-list, {:?} and {:?} are not compatible",
                left, right
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResolveStatus, SubstitutionExpression};
    use facet_testhelpers::test;

    fn o() -> Origin {
        Origin::new("test")
    }

    fn obj(entries: &[(&str, Value)]) -> Value {
        Value::object(
            o(),
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn int(i: i64) -> Value {
        Value::int(o(), i, None)
    }

    fn reference(path: &str) -> Value {
        Value::reference(o(), SubstitutionExpression::new(Path::key(path), false))
    }

    #[test]
    fn test_objects_merge_deeply() {
        let high = obj(&[("a", obj(&[("x", int(1))])), ("b", int(2))]);
        let low = obj(&[("a", obj(&[("y", int(3))])), ("c", int(4))]);
        let merged = high.with_fallback(&low);
        let expected = obj(&[
            ("a", obj(&[("x", int(1)), ("y", int(3))])),
            ("b", int(2)),
            ("c", int(4)),
        ]);
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_non_object_blocks_later_fallbacks() {
        let high = obj(&[("a", obj(&[("x", int(1))]))]);
        let middle = obj(&[("a", int(7))]);
        let low = obj(&[("a", obj(&[("y", int(2))]))]);
        let merged = high.with_fallback(&middle).with_fallback(&low);
        assert_eq!(merged, obj(&[("a", obj(&[("x", int(1))]))]));
    }

    #[test]
    fn test_scalar_ignores_fallback() {
        let merged = int(1).with_fallback(&obj(&[("y", int(2))]));
        assert_eq!(merged, int(1));
        assert!(merged.ignores_fallbacks());
    }

    #[test]
    fn test_unresolved_fallback_delays() {
        let merged = obj(&[("x", int(1))]).with_fallback(&reference("r"));
        assert!(matches!(merged.kind(), ValueKind::DelayedMergeObject(s) if s.len() == 2));
        assert_eq!(merged.resolve_status(), ResolveStatus::Unresolved);

        let merged = reference("r").with_fallback(&obj(&[("x", int(1))]));
        assert!(matches!(merged.kind(), ValueKind::DelayedMerge(s) if s.len() == 2));
    }

    #[test]
    fn test_concatenate_strings_and_whitespace() {
        let pieces = vec![
            Value::unquoted(o(), "foo"),
            Value::unquoted(o(), " "),
            int(10),
        ];
        let joined = concatenate(pieces).unwrap().unwrap();
        assert_eq!(joined.as_str(), Some("foo 10"));
    }

    #[test]
    fn test_concatenate_lists_and_objects() {
        let lists = vec![Value::list(o(), vec![int(1)]), Value::list(o(), vec![int(2)])];
        assert_eq!(
            concatenate(lists).unwrap().unwrap(),
            Value::list(o(), vec![int(1), int(2)])
        );

        let objects = vec![
            obj(&[("a", int(1)), ("b", int(1))]),
            Value::unquoted(o(), " "),
            obj(&[("b", int(2))]),
        ];
        assert_eq!(
            concatenate(objects).unwrap().unwrap(),
            obj(&[("a", int(1)), ("b", int(2))])
        );
    }

    #[test]
    fn test_concatenate_keeps_references() {
        let pieces = vec![Value::unquoted(o(), "a"), reference("x")];
        let value = concatenate(pieces).unwrap().unwrap();
        assert!(matches!(value.kind(), ValueKind::Concatenation(p) if p.len() == 2));
    }

    #[test]
    fn test_concatenate_list_with_string_fails() {
        let pieces = vec![Value::list(o(), vec![]), Value::unquoted(o(), "x")];
        let err = concatenate(pieces).unwrap_err();
        assert!(matches!(err, ConfigError::WrongType { .. }));
    }

    #[test]
    fn test_relativized_prefixes_references() {
        let value = obj(&[("a", reference("x"))]);
        let prefix = Path::key("inc");
        let relativized = value.relativized(&prefix);
        let a = relativized.as_object().unwrap().get("a").unwrap();
        match a.kind() {
            ValueKind::Reference(r) => {
                assert_eq!(r.expr.path.render(), "inc.x");
                assert_eq!(r.prefix_length, 1);
            }
            other => panic!("expected reference, got {:?}", other),
        }
    }
}
