//! # scoped-config-query: a fixed-point evaluator for layered configuration
//!
//! This crate answers one question: given an ordered list of conditional
//! [`Block`](block::Block)s that add or remove values from named [`Field`](field::Field)s, what
//! is the effective set of values at some scope in a nested hierarchy — and with or without
//! inheritance from its ancestors?
//!
//! A script layering configuration over `global → workspace → project → configuration/platform`
//! might declare, in order:
//!
//! ```text
//! defines { "A", "B", "C" }
//! when projects: "P2" { removeDefines "B" }
//! ```
//!
//! Most IDE project formats have no way to remove a value once inherited, so when a REMOVE
//! happens at one scope (`P2`), the evaluator suppresses the value at the common ancestor and
//! synthesizes a compensating ADD for every sibling that didn't ask for the removal (`P1`, `P3`).
//! The output stream is always strictly additive.
//!
//! # Quick start
//!
//! ```
//! use scoped_config_query::block::{Block, Operation};
//! use scoped_config_query::condition::{Clause, Condition};
//! use scoped_config_query::field::{Field, FieldKind};
//! use scoped_config_query::query::{accumulate, Query};
//! use std::collections::HashMap;
//!
//! let projects = Field::register("projects", FieldKind::Set, true);
//! let defines = Field::register("defines", FieldKind::List, false);
//!
//! // `defines` applies to every project (a wildcard keeps the block resolvable against any
//! // scope in the `projects` chain); the removal of `B` is further scoped to `P2` alone.
//! let add_cond = Condition::new(&[Clause::Keyed("projects", "*")]).unwrap();
//! let mut add_data = HashMap::new();
//! add_data.insert(defines, vec!["A".into(), "B".into(), "C".into()]);
//! let add = Block::new(Operation::Add, add_cond, add_data);
//!
//! let remove_cond = Condition::new(&[Clause::Keyed("projects", "P2")]).unwrap();
//! let mut remove_data = HashMap::new();
//! remove_data.insert(defines, vec!["B".into()]);
//! let remove = Block::new(Operation::Remove, remove_cond, remove_data);
//!
//! let mut p1 = HashMap::new();
//! p1.insert(projects, vec!["P1".into()]);
//! let mut p2 = HashMap::new();
//! p2.insert(projects, vec!["P2".into()]);
//!
//! // Inspected at the workspace itself: its own scope is the empty map (never a bare `vec![]`,
//! // which no condition could ever resolve against), while the global chain still covers both
//! // projects so the remove's scope is visible to the decision table.
//! let workspace_scope = HashMap::new();
//! let query =
//!     Query::new(vec![add, remove], vec![workspace_scope], vec![p1, p2], HashMap::new());
//! let result = accumulate(&query.evaluate());
//! assert_eq!(result.get(&defines).unwrap(), &vec!["A".to_string(), "C".to_string()]);
//! ```
//!
//! # Core concepts
//!
//! - [`field`] — interned field identity and per-kind merge/remove/match operators.
//! - [`condition`] — the Boolean expression tree a block's applicability is gated on.
//! - [`block`] — the `(operation, condition, data)` record the evaluator consumes.
//! - [`query`] — [`query::Query`] and the fixed-point evaluator ([`query::Query::evaluate`]),
//!   plus [`query::accumulate`] for replaying a result block list into a final value map.
//! - [`error`] — [`error::QueryError`], raised only while building conditions; the evaluator's
//!   own decision table is total and never returns an error.
//! - [`pattern`] — wildcard (`*`) pattern matching backed by a compiled-regex cache.
//!
//! # Concurrency
//!
//! A [`query::Query::evaluate`] call is a pure, single-threaded, deterministic function of its
//! inputs. The only shared mutable state in the crate is the process-wide [`field::Field`]
//! interning table, the `all_fields_tested` registry populated during condition parsing, and the
//! wildcard pattern cache — all three are grow-only and safe to read concurrently once parsing
//! has finished, the natural phasing being parse scripts → evaluate queries → emit.

pub mod block;
pub mod condition;
pub mod error;
pub mod field;
pub mod pattern;
pub mod query;
mod value;

pub use block::{Block, Operation};
pub use condition::{Clause, Condition};
pub use error::QueryError;
pub use field::{Field, FieldKind};
pub use query::{accumulate, Query, Scope};
