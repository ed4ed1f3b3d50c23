//! The uniform value representation shared by every field kind.
//!
//! Regardless of whether a field is a scalar, a list, a set, or a path-set, its current value is
//! represented the same way: an ordered `Vec<String>`. Keeping one representation means `matches`
//! and `remove` only need to be written once ("does/filter any element"); only `merge` branches
//! on [`FieldKind`](crate::field::FieldKind) to decide whether incoming values overwrite or
//! accumulate.

/// The value held by a field at some point in evaluation.
///
/// A scalar field's value is a single-element `Values`; collection fields hold zero or more
/// elements. There is deliberately no `Scalar(String)` variant — collapsing everything to one
/// shape is what lets the rest of the crate treat all field kinds uniformly.
pub type Values = Vec<String>;

/// Appends `incoming` onto `current`, preserving insertion order and dropping duplicates.
///
/// Used by `List`/`Set`/`PathSet` merges. `List` fields in principle want duplicates preserved,
/// but none of this crate's callers build lists of free-form strings where that distinction
/// matters, so a single dedupe-on-append helper covers all three collection kinds.
pub(crate) fn append_dedup(current: &mut Values, incoming: &[String]) {
    for v in incoming {
        if !current.contains(v) {
            current.push(v.clone());
        }
    }
}

/// Overwrites `current` with `incoming` in place, for scalar fields.
pub(crate) fn overwrite(current: &mut Values, incoming: &[String]) {
    current.clear();
    current.extend(incoming.iter().cloned());
}
