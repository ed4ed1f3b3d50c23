//! Field identity and per-field-kind value operations.
//!
//! A [`Field`] is a small `Copy` handle into a process-wide interning table, the same grow-only
//! `RwLock`-guarded shape as [`crate::pattern`]'s regex cache: a read-lock fast path for the
//! (overwhelmingly common) already-interned case, and a write-lock insert with a re-check so two
//! racing writers never double-insert the same name.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use crate::value::{self, Values};

/// The closed set of value shapes a field can hold.
///
/// Modeled as a tagged variant rather than a trait object: the set of kinds is small and fixed,
/// and a `match` over four variants reads more plainly than a dispatch through `dyn FieldKindOps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Ordered, append-only collection (e.g. `defines`).
    List,
    /// Unordered collection with no meaningful duplicates (e.g. `links`).
    Set,
    /// Single overwritten value (e.g. `kind`).
    Scalar,
    /// Like `Set`, but semantically holds filesystem paths. Matching/merge behave identically to
    /// `Set`; the distinction exists for callers that want to tell the two apart (e.g. an emitter
    /// deciding whether to normalize path separators), not for anything this crate does.
    PathSet,
}

/// An interned field handle. Two handles for the same name compare equal; `is_scope` is fixed at
/// registration and never changes after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field(usize);

struct FieldEntry {
    name: String,
    kind: FieldKind,
    is_scope: bool,
}

struct Registry {
    entries: Vec<FieldEntry>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    fn new() -> Self {
        Registry { entries: Vec::new(), by_name: HashMap::new() }
    }
}

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::new()));

impl Field {
    /// Idempotent lookup/creation of a field by name. Defaults to `FieldKind::List`,
    /// `is_scope = false` for never-before-seen names; use [`Field::register`] to control those
    /// at first registration.
    pub fn get(name: &str) -> Field {
        Field::register(name, FieldKind::List, false)
    }

    /// Lookup-only: returns the handle for an already-registered name, or `None` rather than
    /// interning it. Used by condition parsing, where referencing an unregistered field is a
    /// caller error (`QueryError::UnknownField`), not an implicit declaration.
    pub fn try_get(name: &str) -> Option<Field> {
        let reg = REGISTRY.read().expect("field registry poisoned");
        reg.by_name.get(name).map(|&idx| Field(idx))
    }

    /// Registers a field with explicit kind/scope-ness, or returns the existing handle if the
    /// name is already interned (the explicit kind/scope arguments are ignored in that case —
    /// `is_scope` and `kind` are fixed at first registration, per the registry's invariants).
    pub fn register(name: &str, kind: FieldKind, is_scope: bool) -> Field {
        {
            let reg = REGISTRY.read().expect("field registry poisoned");
            if let Some(&idx) = reg.by_name.get(name) {
                return Field(idx);
            }
        }
        let mut reg = REGISTRY.write().expect("field registry poisoned");
        if let Some(&idx) = reg.by_name.get(name) {
            return Field(idx);
        }
        let idx = reg.entries.len();
        reg.entries.push(FieldEntry { name: name.to_string(), kind, is_scope });
        reg.by_name.insert(name.to_string(), idx);
        Field(idx)
    }

    /// The interned name this handle was registered under.
    pub fn name(self) -> String {
        let reg = REGISTRY.read().expect("field registry poisoned");
        reg.entries[self.0].name.clone()
    }

    /// Whether this field is resolved against a query's scope map (true) or its values map
    /// (false) during condition evaluation.
    pub fn is_scope(self) -> bool {
        let reg = REGISTRY.read().expect("field registry poisoned");
        reg.entries[self.0].is_scope
    }

    /// The value kind this field holds.
    pub fn kind(self) -> FieldKind {
        let reg = REGISTRY.read().expect("field registry poisoned");
        reg.entries[self.0].kind
    }

    /// Union for set/list/path-set fields, overwrite for scalars.
    pub fn merge(self, current: &[String], incoming: &[String]) -> Values {
        let mut out = current.to_vec();
        match self.kind() {
            FieldKind::Scalar => value::overwrite(&mut out, incoming),
            FieldKind::List | FieldKind::Set | FieldKind::PathSet => {
                value::append_dedup(&mut out, incoming)
            }
        }
        out
    }

    /// Subtracts values matching any of `patterns` from `current`. Wildcards in a pattern expand
    /// against the concrete values present in `current`. Returns the reduced collection and the
    /// concrete values actually removed — patterns matching nothing (because the value was never
    /// present) contribute nothing to either output, per the spec's silently-dropped-unset-remove
    /// behavior.
    pub fn remove(self, current: &[String], patterns: &[String]) -> (Values, Values) {
        let mut removed = Vec::new();
        let kept: Values = current
            .iter()
            .filter(|v| {
                let hit = patterns.iter().any(|p| crate::pattern::wildcard_match(p, v));
                if hit {
                    removed.push((*v).clone());
                }
                !hit
            })
            .cloned()
            .collect();
        (kept, removed)
    }

    /// Per-field pattern match: does any element of `value` match `pattern`? For scalar fields
    /// `value` holds at most one element, so this degenerates to literal (or wildcard) equality.
    pub fn matches(self, value: &[String], pattern: &str) -> bool {
        value.iter().any(|v| crate::pattern::wildcard_match(pattern, v))
    }
}
