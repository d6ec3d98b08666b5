//! Substitution resolution.
//!
//! Resolving walks the tree and replaces every `${path}` with the value it
//! refers to, lazily resolving only as much of the tree as each lookup
//! needs. While a reference is being looked up it is replaced by a marker
//! that reports a cycle if the lookup ever comes back to it. While one layer
//! of a delayed merge is being resolved, the merge is replaced by the layers
//! below it, so a self-reference like `path = ${path} [x]` sees the value
//! it overrides rather than itself.

mod memos;
mod options;

pub use options::ResolveOptions;

use std::collections::HashMap;
use std::sync::OnceLock;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::merge::consolidate;
use crate::{
    ConfigError, ConfigObject, Origin, Path, Reference, Result, SubstitutionExpression, Value,
    ValueKind,
};
use memos::ResolveMemos;

/// Resolve every substitution in `root`, looking them up in `root` itself.
pub fn resolve(root: &Value, options: &ResolveOptions) -> Result<Value> {
    resolve_with(root, root, options)
}

/// Resolve every substitution in `value`, looking them up in `source`.
pub fn resolve_with(value: &Value, source: &Value, options: &ResolveOptions) -> Result<Value> {
    if value.is_resolved() {
        return Ok(value.clone());
    }
    debug!(target: "hocon::resolve", origin = %value.origin(), "resolving");
    let mut context = ResolveContext::new(source.clone(), options);
    let result = context.resolve(value, None);
    trace!(target: "hocon::resolve", memos = context.memos.len(), "resolve finished");
    match result {
        Ok(Some(resolved)) => Ok(resolved),
        Ok(None) => Err(ConfigError::bug("resolving produced no value")),
        Err(ResolveFailure::Config(err)) => Err(err),
        Err(ResolveFailure::NotPossible { .. }) => Err(ConfigError::bug(
            "a cycle escaped the reference that caused it",
        )),
    }
}

/// All environment variables as one flat object; names are single keys and
/// are never split on `.`.
pub fn env_variables() -> Value {
    static ENV: OnceLock<Value> = OnceLock::new();
    ENV.get_or_init(|| {
        let origin = Origin::env();
        let mut vars: Vec<(String, String)> = std::env::vars().collect();
        vars.sort();
        let entries = vars
            .into_iter()
            .map(|(k, v)| (k, Value::string(origin.clone(), v)))
            .collect();
        Value::object(origin, entries)
    })
    .clone()
}

/// Why a resolution step could not produce a value.
#[derive(Debug)]
enum ResolveFailure {
    /// Resolution came back around to a value already being resolved.
    NotPossible { trace: String },
    Config(ConfigError),
}

impl From<ConfigError> for ResolveFailure {
    fn from(err: ConfigError) -> Self {
        ResolveFailure::Config(err)
    }
}

type Resolved = std::result::Result<Option<Value>, ResolveFailure>;

/// What a node currently being resolved should be seen as.
enum Replacer {
    /// A reference being looked up; reaching it again is a cycle.
    Cycle,
    /// A delayed merge, seen from one of its own layers: only the layers
    /// from `skipping` down are visible.
    MergeStack {
        stack: Vec<Value>,
        skipping: usize,
        cached: Option<Value>,
    },
}

struct ResolveContext<'a> {
    root: Value,
    options: &'a ResolveOptions,
    memos: ResolveMemos,
    replacements: HashMap<usize, Vec<Replacer>>,
    /// Substitutions currently being looked up, outermost first.
    trace: Vec<SubstitutionExpression>,
}

impl<'a> ResolveContext<'a> {
    fn new(root: Value, options: &'a ResolveOptions) -> Self {
        Self {
            root,
            options,
            memos: ResolveMemos::default(),
            replacements: HashMap::new(),
            trace: Vec::new(),
        }
    }

    fn trace_string(&self) -> String {
        self.trace
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Resolve `original`, or only the part of it along `restrict`.
    ///
    /// `None` means the value vanished (an optional substitution with
    /// nothing to refer to).
    fn resolve(&mut self, original: &Value, restrict: Option<&Path>) -> Resolved {
        // A full resolution also answers any restricted request.
        if let Some(cached) = self.memos.get(original, None) {
            return Ok(Some(cached));
        }
        if restrict.is_some() {
            if let Some(cached) = self.memos.get(original, restrict) {
                return Ok(Some(cached));
            }
        }

        let resolved = self.resolve_checking_replacement(original, restrict)?;
        let Some(resolved) = resolved else {
            return Ok(None);
        };

        if resolved.is_resolved() {
            self.memos.put(original, None, resolved.clone());
        } else if restrict.is_some() {
            self.memos.put(original, restrict, resolved.clone());
        } else if self.options.allow_unresolved {
            self.memos.put(original, None, resolved.clone());
        } else {
            return Err(ConfigError::bug(format!(
                "resolving did not give a resolved value: {:?}",
                resolved
            ))
            .into());
        }
        Ok(Some(resolved))
    }

    fn resolve_checking_replacement(&mut self, original: &Value, restrict: Option<&Path>) -> Resolved {
        if let Some(replacement) = self.replacement(original)? {
            if !replacement.ptr_eq(original) {
                return self.resolve(&replacement, restrict);
            }
        }
        self.resolve_substitutions(original, restrict)
    }

    fn replace(&mut self, value: &Value, replacer: Replacer) {
        self.replacements
            .entry(value.identity())
            .or_default()
            .push(replacer);
    }

    fn unreplace(&mut self, value: &Value) {
        let identity = value.identity();
        if let Some(stack) = self.replacements.get_mut(&identity) {
            stack.pop();
            if stack.is_empty() {
                self.replacements.remove(&identity);
            }
        }
    }

    fn replacement(&mut self, value: &Value) -> Resolved {
        if !self.replacements.contains_key(&value.identity()) {
            return Ok(None);
        }
        let trace = self.trace_string();
        let Some(replacer) = self
            .replacements
            .get_mut(&value.identity())
            .and_then(|stack| stack.last_mut())
        else {
            return Ok(None);
        };
        match replacer {
            Replacer::Cycle => Err(ResolveFailure::NotPossible { trace }),
            Replacer::MergeStack {
                stack,
                skipping,
                cached,
            } => {
                if let Some(value) = cached.as_ref() {
                    return Ok(Some(value.clone()));
                }
                let mut remaining = stack.iter().skip(*skipping);
                let Some(first) = remaining.next() else {
                    return Err(ResolveFailure::NotPossible { trace });
                };
                let merged = remaining.fold(first.clone(), |merged, v| merged.with_fallback(v));
                *cached = Some(merged.clone());
                Ok(Some(merged))
            }
        }
    }

    fn resolve_substitutions(&mut self, original: &Value, restrict: Option<&Path>) -> Resolved {
        match original.kind() {
            ValueKind::Object(object) => self.resolve_object(original, object, restrict),
            ValueKind::List(list) => {
                if list.status() == crate::ResolveStatus::Resolved || restrict.is_some() {
                    return Ok(Some(original.clone()));
                }
                let mut items = Vec::with_capacity(list.len());
                let mut changed = false;
                for item in list.items() {
                    match self.resolve(item, None)? {
                        Some(resolved) => {
                            changed |= !resolved.ptr_eq(item);
                            items.push(resolved);
                        }
                        None => changed = true,
                    }
                }
                if !changed {
                    return Ok(Some(original.clone()));
                }
                Ok(Some(Value::list(original.origin().clone(), items)))
            }
            ValueKind::Reference(reference) => self.resolve_reference(original, reference, restrict),
            ValueKind::Concatenation(pieces) => self.resolve_concatenation(original, pieces),
            ValueKind::DelayedMerge(stack) | ValueKind::DelayedMergeObject(stack) => {
                self.resolve_merge_stack(original, stack, restrict)
            }
            _ => Ok(Some(original.clone())),
        }
    }

    fn resolve_object(
        &mut self,
        original: &Value,
        object: &ConfigObject,
        restrict: Option<&Path>,
    ) -> Resolved {
        if object.status() == crate::ResolveStatus::Resolved {
            return Ok(Some(original.clone()));
        }
        let mut changed = false;
        let mut entries = IndexMap::with_capacity(object.len());
        for (key, value) in object.iter() {
            let resolved = match restrict {
                None => self.resolve(value, None)?,
                Some(restrict) if key == restrict.first() => match restrict.remainder() {
                    Some(remainder) => self.resolve(value, Some(&remainder))?,
                    // the leaf itself is left for the caller
                    None => Some(value.clone()),
                },
                Some(_) => Some(value.clone()),
            };
            match resolved {
                Some(resolved) => {
                    changed |= !resolved.ptr_eq(value);
                    entries.insert(key.to_string(), resolved);
                }
                None => changed = true,
            }
        }
        if !changed {
            return Ok(Some(original.clone()));
        }
        Ok(Some(Value::with_flags(
            original.origin().clone(),
            ValueKind::Object(ConfigObject::new(entries)),
            original.ignores_fallbacks(),
        )))
    }

    fn resolve_reference(
        &mut self,
        original: &Value,
        reference: &Reference,
        restrict: Option<&Path>,
    ) -> Resolved {
        let expr = &reference.expr;
        self.replace(original, Replacer::Cycle);
        let looked_up = self.lookup_subst(expr, reference.prefix_length, restrict);
        self.unreplace(original);

        let found = match looked_up {
            Ok(found) => found,
            Err(ResolveFailure::NotPossible { trace }) => {
                if expr.optional {
                    trace!(target: "hocon::resolve", %expr, "optional substitution is part of a cycle, dropping it");
                    None
                } else {
                    return Err(ConfigError::UnresolvedSubstitution {
                        origin: original.origin().clone(),
                        detail: format!(
                            "{} was part of a cycle of substitutions involving {}",
                            expr, trace
                        ),
                    }
                    .into());
                }
            }
            Err(err) => return Err(err),
        };

        match found {
            None if !expr.optional => {
                if self.options.allow_unresolved {
                    Ok(Some(original.clone()))
                } else {
                    Err(ConfigError::UnresolvedSubstitution {
                        origin: original.origin().clone(),
                        detail: expr.to_string(),
                    }
                    .into())
                }
            }
            found => Ok(found),
        }
    }

    fn lookup_subst(
        &mut self,
        expr: &SubstitutionExpression,
        prefix_length: usize,
        restrict: Option<&Path>,
    ) -> Resolved {
        self.trace.push(expr.clone());
        let result = self.lookup_subst_traced(expr, prefix_length, restrict);
        self.trace.pop();
        result
    }

    fn lookup_subst_traced(
        &mut self,
        expr: &SubstitutionExpression,
        prefix_length: usize,
        restrict: Option<&Path>,
    ) -> Resolved {
        trace!(target: "hocon::resolve", %expr, "looking up");
        let root = self.root.clone();
        let mut found = self.find_in_object(&root, &expr.path)?;

        if found.is_none() {
            // Retry relative to the including document, then the environment.
            if let Some(path) = expr.path.sub_path(prefix_length) {
                let unprefixed = expr.with_path(path);
                if let Some(top) = self.trace.last_mut() {
                    *top = unprefixed.clone();
                }
                if prefix_length > 0 {
                    found = self.find_in_object(&root, &unprefixed.path)?;
                }
                if found.is_none() && self.options.use_system_environment {
                    found = self.find_in_object(&env_variables(), &unprefixed.path)?;
                }
            }
        }

        match found {
            Some(value) => self.resolve(&value, restrict),
            None => Ok(None),
        }
    }

    /// Resolve just enough of `object` to look at `path`, then look.
    fn find_in_object(&mut self, object: &Value, path: &Path) -> Resolved {
        let partial = self.resolve(object, Some(path))?;
        match partial {
            Some(partial) if is_object_like(&partial) => Ok(peek_path(&partial, path)?),
            other => Err(ConfigError::bug(format!(
                "resolved object {:?} to non-object {:?}",
                object, other
            ))
            .into()),
        }
    }

    fn resolve_concatenation(&mut self, original: &Value, pieces: &[Value]) -> Resolved {
        let mut resolved = Vec::with_capacity(pieces.len());
        for piece in pieces {
            // joining pieces needs each of them fully resolved
            if let Some(value) = self.resolve(piece, None)? {
                resolved.push(value);
            }
        }
        let mut joined = consolidate(resolved, true)?;
        match joined.len() {
            0 => Ok(None),
            1 => Ok(joined.pop()),
            _ if self.options.allow_unresolved => Ok(Some(Value::concatenation(
                original.origin().clone(),
                joined,
            ))),
            _ => Err(ConfigError::bug(format!(
                "resolved concatenation joined to too many values: {:?}",
                joined
            ))
            .into()),
        }
    }

    fn resolve_merge_stack(
        &mut self,
        original: &Value,
        stack: &[Value],
        restrict: Option<&Path>,
    ) -> Resolved {
        let mut merged: Option<Value> = None;
        for (count, layer) in stack.iter().enumerate() {
            if matches!(
                layer.kind(),
                ValueKind::DelayedMerge(_) | ValueKind::DelayedMergeObject(_)
            ) {
                return Err(ConfigError::bug(format!(
                    "a delayed merge should not contain another one: {:?}",
                    original
                ))
                .into());
            }

            let replaced = layer.is_unmergeable();
            if replaced {
                self.replace(
                    original,
                    Replacer::MergeStack {
                        stack: stack.to_vec(),
                        skipping: count + 1,
                        cached: None,
                    },
                );
            }
            let resolved = self.resolve(layer, restrict);
            if replaced {
                self.unreplace(original);
            }

            if let Some(resolved) = resolved? {
                merged = Some(match merged {
                    None => resolved,
                    Some(merged) => merged.with_fallback(&resolved),
                });
            }
        }
        Ok(merged)
    }
}

fn is_object_like(value: &Value) -> bool {
    matches!(
        value.kind(),
        ValueKind::Object(_) | ValueKind::DelayedMergeObject(_)
    )
}

/// Walk `path` without resolving anything.
fn peek_path(object: &Value, path: &Path) -> Result<Option<Value>> {
    let found = attempt_peek(object, path.first()).map_err(|err| match err {
        ConfigError::NotResolved { message } => ConfigError::NotResolved {
            message: format!("{} has not been resolved: {}", path.render(), message),
        },
        other => other,
    })?;
    match (found, path.remainder()) {
        (found, None) => Ok(found),
        (Some(child), Some(next)) if is_object_like(&child) => peek_path(&child, &next),
        _ => Ok(None),
    }
}

fn attempt_peek(object: &Value, key: &str) -> Result<Option<Value>> {
    match object.kind() {
        ValueKind::Object(o) => Ok(o.get(key).cloned()),
        ValueKind::DelayedMergeObject(stack) => {
            // Only a value that ignores fallbacks and sits above every
            // unresolved layer can be answered without resolving.
            for layer in stack {
                match layer.kind() {
                    ValueKind::Object(_) => {
                        if let Some(v) = attempt_peek(layer, key)? {
                            if v.ignores_fallbacks() {
                                return Ok(Some(v));
                            }
                        }
                    }
                    _ if layer.is_unmergeable() => {
                        return Err(ConfigError::NotResolved {
                            message: format!(
                                "Key '{}' is not available at '{}' because value at '{}' has not been resolved and may turn out to contain or hide '{}'. Be sure to resolve before using a config object.",
                                key,
                                object.origin(),
                                layer.origin(),
                                key
                            ),
                        });
                    }
                    // a list or a scalar hides everything below it
                    _ => return Ok(None),
                }
            }
            Err(ConfigError::bug(
                "delayed merge stack does not contain any unmergeable values",
            ))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests;
