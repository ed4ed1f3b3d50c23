//! Boolean condition trees over `(field, pattern)` leaves.
//!
//! Represented as a tagged-variant enum — `Match`/`And`/`Or`/`Not` — never as an object graph
//! with back-pointers, since condition trees are finite and acyclic by construction (the parser
//! only ever builds downward).

use std::collections::HashSet;
use std::sync::{LazyLock, RwLock};

use crate::error::QueryError;
use crate::field::Field;
use crate::value::Values;

/// A node in a condition tree.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Matches everything; the empty/unconditional condition.
    Always,
    /// Leaf: does the resolved value for `field` match `pattern`?
    Match { field: Field, pattern: String },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

static ALL_FIELDS_TESTED: LazyLock<RwLock<HashSet<Field>>> =
    LazyLock::new(|| RwLock::new(HashSet::new()));

fn mark_tested(field: Field) {
    {
        let set = ALL_FIELDS_TESTED.read().expect("all_fields_tested poisoned");
        if set.contains(&field) {
            return;
        }
    }
    let mut set = ALL_FIELDS_TESTED.write().expect("all_fields_tested poisoned");
    set.insert(field);
}

/// Is `field` tested by any condition parsed so far in this process? Read by the evaluator as an
/// optimization hint: a field no MATCH leaf ever mentions cannot influence any future decision,
/// so its contributions can be skipped when accumulating `target_values`/`global_values`.
pub fn is_field_tested(field: Field) -> bool {
    ALL_FIELDS_TESTED.read().expect("all_fields_tested poisoned").contains(&field)
}

#[cfg(test)]
pub(crate) fn clear_all_fields_tested() {
    ALL_FIELDS_TESTED.write().expect("all_fields_tested poisoned").clear();
}

/// One positional or keyed clause as supplied by the ingestion layer, before parsing.
pub enum Clause<'a> {
    /// `{field_name: pattern}` — matches against the named field.
    Keyed(&'a str, &'a str),
    /// A bare pattern string with no enclosing field key; only legal when every `or_term`
    /// carries its own `field:` prefix.
    Positional(&'a str),
}

impl Condition {
    /// The unconditional condition: matches everything.
    pub fn always() -> Condition {
        Condition::Always
    }

    /// Parses a set of clauses (ANDed together) into a `Condition`.
    ///
    /// Each clause's pattern string follows the grammar:
    /// `pattern := or_term (" or " or_term)*`, `or_term := "not " atom | atom`,
    /// `atom := [field_name ":"] literal`.
    ///
    /// Every field named in a clause must already be registered (via [`Field::register`] or
    /// [`Field::get`]); referencing an unregistered name fails with `QueryError::UnknownField`
    /// rather than interning it on the spot.
    pub fn new(clauses: &[Clause<'_>]) -> Result<Condition, QueryError> {
        let mut terms = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let (default_field, pattern) = match clause {
                Clause::Keyed(field, pattern) => (Some(*field), *pattern),
                Clause::Positional(pattern) => (None, *pattern),
            };
            terms.push(parse_pattern_string(default_field, pattern)?);
        }
        Ok(match terms.len() {
            0 => Condition::Always,
            1 => terms.into_iter().next().unwrap(),
            _ => Condition::And(terms),
        })
    }

    /// The set of fields appearing in any `Match` leaf under this node.
    pub fn fields_tested(&self) -> HashSet<Field> {
        let mut out = HashSet::new();
        self.collect_fields_tested(&mut out);
        out
    }

    fn collect_fields_tested(&self, out: &mut HashSet<Field>) {
        match self {
            Condition::Always => {}
            Condition::Match { field, .. } => {
                out.insert(*field);
            }
            Condition::And(children) | Condition::Or(children) => {
                for c in children {
                    c.collect_fields_tested(out);
                }
            }
            Condition::Not(inner) => inner.collect_fields_tested(out),
        }
    }

    /// Evaluates this condition against a single `(values, scope)` pair.
    ///
    /// For a `Match` leaf on a scope field, resolves against `scope` if present; otherwise (or
    /// for non-scope fields) resolves against `values`. An absent value yields `match_on_nil`.
    pub fn matches_values(
        &self,
        values: &std::collections::HashMap<Field, Values>,
        scope: Option<&std::collections::HashMap<Field, Values>>,
        match_on_nil: bool,
    ) -> bool {
        match self {
            Condition::Always => true,
            Condition::Match { field, pattern } => {
                let resolved = if field.is_scope() {
                    scope.and_then(|s| s.get(field)).or_else(|| values.get(field))
                } else {
                    values.get(field)
                };
                match resolved {
                    None => match_on_nil,
                    Some(tv) => field.matches(tv, pattern),
                }
            }
            Condition::And(children) => {
                children.iter().all(|c| c.matches_values(values, scope, match_on_nil))
            }
            Condition::Or(children) => {
                children.iter().any(|c| c.matches_values(values, scope, match_on_nil))
            }
            Condition::Not(inner) => !inner.matches_values(values, scope, match_on_nil),
        }
    }

    /// Iterates `scopes`; for each scope requiring that every field it declares is tested by this
    /// condition (otherwise that scope is skipped as non-evaluable), evaluates `matches_values`.
    /// Returns the index of the first compatible scope, or `None`.
    pub fn matches_scope_and_values(
        &self,
        values: &std::collections::HashMap<Field, Values>,
        scopes: &[std::collections::HashMap<Field, Values>],
        match_on_nil: bool,
    ) -> Option<usize> {
        let tested = self.fields_tested();
        scopes.iter().position(|scope| {
            if !scope.keys().all(|f| tested.contains(f)) {
                return false;
            }
            self.matches_values(values, Some(scope), match_on_nil)
        })
    }

    /// True iff, among the scopes in `scopes` that actually carry one of this condition's tested
    /// fields, at least one exists and *every* one of them fails to match (with
    /// `match_on_nil = true`, i.e. absence of data is treated as a wildcard). "Conflict" here
    /// means the condition could apply somewhere in this chain but definitely doesn't apply here.
    ///
    /// Scopes that carry none of the tested fields (an ancestor level the condition says nothing
    /// about) are skipped rather than treated as vacuously compatible: a workspace-level entry
    /// lacking a `projects` key, say, has no opinion on a `projects:P2` condition and must not
    /// mask an actual mismatch carried by a sibling entry that does have the key. A chain with no
    /// relevant scope at all reports no conflict, the same as an empty chain would.
    pub fn has_conflicting_values(
        &self,
        scopes: &[std::collections::HashMap<Field, Values>],
        values: &std::collections::HashMap<Field, Values>,
    ) -> bool {
        let tested = self.fields_tested();
        let mut saw_relevant = false;
        for scope in scopes {
            if !scope.keys().all(|f| tested.contains(f)) {
                continue;
            }
            saw_relevant = true;
            if self.matches_values(values, Some(scope), true) {
                return false;
            }
        }
        saw_relevant
    }
}

fn parse_pattern_string(
    default_field: Option<&str>,
    pattern: &str,
) -> Result<Condition, QueryError> {
    let or_terms: Vec<&str> = pattern.split(" or ").collect();
    let mut parsed = Vec::with_capacity(or_terms.len());
    for term in or_terms {
        parsed.push(parse_or_term(default_field, term)?);
    }
    Ok(match parsed.len() {
        0 => return Err(QueryError::BadCondition("empty pattern".to_string())),
        1 => parsed.into_iter().next().unwrap(),
        _ => Condition::Or(parsed),
    })
}

fn parse_or_term(default_field: Option<&str>, term: &str) -> Result<Condition, QueryError> {
    let term = term.trim();
    if let Some(rest) = term.strip_prefix("not ") {
        return Ok(Condition::Not(Box::new(parse_atom(default_field, rest)?)));
    }
    parse_atom(default_field, term)
}

fn parse_atom(default_field: Option<&str>, atom: &str) -> Result<Condition, QueryError> {
    let atom = atom.trim();
    let (field_name, literal) = match atom.split_once(':') {
        Some((name, lit)) => (name.trim(), lit.trim()),
        None => match default_field {
            Some(name) => (name, atom),
            None => {
                return Err(QueryError::BadCondition(format!(
                    "positional clause `{atom}` has no default field"
                )));
            }
        },
    };
    let field = Field::try_get(field_name)
        .ok_or_else(|| QueryError::UnknownField(field_name.to_string()))?;
    mark_tested(field);
    Ok(Condition::Match { field, pattern: literal.to_string() })
}
