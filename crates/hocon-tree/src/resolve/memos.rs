//! Cache of values already resolved during one resolution pass.

use std::collections::HashMap;

use crate::{Path, Value};

/// A node's identity plus the path the resolution was restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    identity: usize,
    restrict: Option<Path>,
}

/// Resolved values keyed by the identity of the node they came from.
///
/// Each entry keeps its original node alive so that no other node can be
/// allocated at the same address while the cache exists.
#[derive(Default)]
pub(crate) struct ResolveMemos {
    entries: HashMap<MemoKey, (Value, Value)>,
}

impl ResolveMemos {
    pub(crate) fn get(&self, original: &Value, restrict: Option<&Path>) -> Option<Value> {
        let key = MemoKey {
            identity: original.identity(),
            restrict: restrict.cloned(),
        };
        self.entries.get(&key).map(|(_, resolved)| resolved.clone())
    }

    pub(crate) fn put(&mut self, original: &Value, restrict: Option<&Path>, resolved: Value) {
        let key = MemoKey {
            identity: original.identity(),
            restrict: restrict.cloned(),
        };
        self.entries.insert(key, (original.clone(), resolved));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
