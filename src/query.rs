//! The fixed-point query evaluator: the heart of the crate.
//!
//! Walks an ordered block list against a target/global scope-chain pair and produces the subset
//! of blocks that are effectively enabled, synthesizing compensating ADD blocks wherever a
//! REMOVE decided at a sibling scope would otherwise force a REMOVE into the (strictly additive)
//! output.

use std::collections::HashMap;

use crate::block::{Block, Operation};
use crate::condition::{is_field_tested, Condition};
use crate::field::Field;
use crate::value::Values;

/// A `{field → value}` map selecting one point in the project hierarchy, e.g.
/// `{workspaces: [W1]}` or `{projects: [P2], configurations: [Debug]}`.
pub type Scope = HashMap<Field, Values>;

/// The inputs to one evaluation. `target_scopes` is the restricted chain (only the levels with
/// inheritance enabled, plus the queried level); `global_scopes` is the full lineage that could
/// inherit into the target if every ancestor had inheritance enabled. `global_scopes` is always a
/// superset of `target_scopes`.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub source_blocks: Vec<Block>,
    pub target_scopes: Vec<Scope>,
    pub global_scopes: Vec<Scope>,
    pub initial_values: HashMap<Field, Values>,
}

impl Query {
    pub fn new(
        source_blocks: Vec<Block>,
        target_scopes: Vec<Scope>,
        global_scopes: Vec<Scope>,
        initial_values: HashMap<Field, Values>,
    ) -> Query {
        Query { source_blocks, target_scopes, global_scopes, initial_values }
    }

    /// Widens `global_scopes` to include `root` (if not already present), without touching
    /// `target_scopes`. The only override this evaluator supports: a caller can ask for a global
    /// chain relative to a root above the one the scope-chain derivation initially selected.
    pub fn with_global_root(mut self, root: Scope) -> Self {
        if !self.global_scopes.contains(&root) {
            self.global_scopes.insert(0, root);
        }
        self
    }

    /// Runs the evaluator. Pure function of `self`; independent calls never interact.
    pub fn evaluate(&self) -> Vec<Block> {
        evaluate(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecisionOp {
    Add,
    Remove,
    Unknown,
    OutOfScope,
}

#[derive(Debug, Clone)]
struct BlockResult {
    target_op: DecisionOp,
    global_op: DecisionOp,
    source_block: Block,
}

impl BlockResult {
    fn pending(source_block: Block) -> BlockResult {
        BlockResult { target_op: DecisionOp::Unknown, global_op: DecisionOp::Unknown, source_block }
    }
}

/// Inputs: a block's operation/condition, the two scope lists, the two accumulated value maps.
/// Output: `(global_op, target_op)`, each either a terminal decision or `Unknown` (revisit
/// later).
fn test_block(
    operation: Operation,
    condition: &Condition,
    global_scopes: &[Scope],
    global_values: &Scope,
    target_scopes: &[Scope],
    target_values: &Scope,
) -> (DecisionOp, DecisionOp) {
    match operation {
        Operation::Add => {
            if condition.matches_scope_and_values(global_values, global_scopes, true).is_none() {
                (DecisionOp::Unknown, DecisionOp::Unknown)
            } else if condition.matches_scope_and_values(target_values, target_scopes, true).is_none()
            {
                (DecisionOp::Add, DecisionOp::Unknown)
            } else {
                (DecisionOp::Add, DecisionOp::Add)
            }
        }
        Operation::Remove => {
            // Load-bearing duality (see design notes): the first call passes `global_values`
            // twice, once as the values map and once — wrapped as a singleton scope list — in
            // the scopes position, asking "could any potential parent or sibling match?". The
            // second call passes the real `global_scopes` chain, asking "is the target's direct
            // lineage compatible?".
            if condition.has_conflicting_values(std::slice::from_ref(global_values), global_values)
            {
                (DecisionOp::Unknown, DecisionOp::Unknown)
            } else if !condition.has_conflicting_values(global_scopes, global_values) {
                (DecisionOp::Remove, DecisionOp::Remove)
            } else {
                (DecisionOp::Remove, DecisionOp::Add)
            }
        }
    }
}

/// Merges `data` into `map` using `operation`'s semantics, restricted to fields that some
/// condition has actually tested — a field no MATCH leaf ever mentions cannot influence any
/// future decision, so its contribution here would be wasted work.
fn merge_restricted(map: &mut Scope, data: &HashMap<Field, Values>, operation: Operation) {
    for (field, values) in data {
        if !is_field_tested(*field) {
            continue;
        }
        let entry = map.entry(*field).or_default();
        match operation {
            Operation::Add => *entry = field.merge(entry, values),
            Operation::Remove => {
                let (kept, _) = field.remove(entry, values);
                *entry = kept;
            }
        }
    }
}

/// §4.6: the current value of one field as reconstructed from all already-decided block results
/// (not from `global_values`, which is filtered to tested fields only).
fn fetch_field_across_decided(field: Field, results: &[BlockResult]) -> Values {
    let mut acc = Values::new();
    for r in results {
        if !matches!(r.global_op, DecisionOp::Add | DecisionOp::Remove) {
            continue;
        }
        if let Some(data) = r.source_block.data.get(&field) {
            match r.source_block.operation {
                Operation::Add => acc = field.merge(&acc, data),
                Operation::Remove => {
                    let (kept, _) = field.remove(&acc, data);
                    acc = kept;
                }
            }
        }
    }
    acc
}

/// Builds the synthetic compensation block for a REMOVE that applied at a sibling scope.
fn build_compensation_block(
    remove_block: &Block,
    results: &[BlockResult],
    target_values: &Scope,
) -> Block {
    let mut synthetic = Block::synthetic(Operation::Add);
    let empty = Values::new();
    for (field, remove_patterns) in &remove_block.data {
        let current_global = fetch_field_across_decided(*field, results);
        let (_, removed_values) = field.remove(&current_global, remove_patterns);
        let target_field_values = target_values.get(field).unwrap_or(&empty);
        for v in removed_values {
            if !field.matches(target_field_values, &v) {
                synthetic.receive(*field, &v);
            }
        }
    }
    synthetic
}

#[tracing::instrument(skip_all, fields(blocks = query.source_blocks.len()))]
fn evaluate(query: &Query) -> Vec<Block> {
    let mut results: Vec<BlockResult> =
        query.source_blocks.iter().cloned().map(BlockResult::pending).collect();
    let mut target_values: Scope = query.initial_values.clone();
    let mut global_values: Scope = query.initial_values.clone();

    let mut i = 0;
    while i < results.len() {
        if results[i].global_op != DecisionOp::Unknown {
            i += 1;
            continue;
        }

        let block = results[i].source_block.clone();
        let (global_op, target_op) = test_block(
            block.operation,
            &block.condition,
            &query.global_scopes,
            &global_values,
            &query.target_scopes,
            &target_values,
        );

        if target_op == DecisionOp::Add && global_op == DecisionOp::Remove {
            tracing::debug!(position = i, "compensating for sibling REMOVE");
            results[i].target_op = DecisionOp::OutOfScope;

            let synthetic = build_compensation_block(&block, &results, &target_values);
            merge_restricted(&mut target_values, &synthetic.data, Operation::Add);
            results.insert(
                i,
                BlockResult {
                    target_op: DecisionOp::Add,
                    global_op: DecisionOp::OutOfScope,
                    source_block: synthetic,
                },
            );

            // Step 5 still applies to the original (now shifted) block: its global_op is
            // decided REMOVE regardless of the compensation branch taken.
            results[i + 1].global_op = DecisionOp::Remove;
            merge_restricted(&mut global_values, &block.data, Operation::Remove);

            tracing::debug!(position = i, "restarting scan after fixed-point update");
            i = 0;
            continue;
        }

        let mut global_decided = false;
        if matches!(target_op, DecisionOp::Add | DecisionOp::Remove) {
            results[i].target_op = target_op;
            merge_restricted(&mut target_values, &block.data, block.operation);
        }
        if matches!(global_op, DecisionOp::Add | DecisionOp::Remove) {
            results[i].global_op = global_op;
            merge_restricted(&mut global_values, &block.data, block.operation);
            global_decided = true;
        }

        if global_decided {
            tracing::debug!(position = i, "restarting scan after fixed-point update");
            i = 0;
        } else {
            i += 1;
        }
    }

    results
        .into_iter()
        .filter_map(|r| match r.target_op {
            DecisionOp::Add => {
                Some(Block::new(Operation::Add, Condition::always(), r.source_block.data))
            }
            DecisionOp::Remove => {
                Some(Block::new(Operation::Remove, Condition::always(), r.source_block.data))
            }
            DecisionOp::Unknown | DecisionOp::OutOfScope => None,
        })
        .collect()
}

/// Replays an evaluator's output blocks into a final `field → value` map, for the emitter. A
/// thin convenience wrapper: every caller needs this, and it has no design space of its own
/// beyond "ADD merges, REMOVE subtracts, in order".
pub fn accumulate(blocks: &[Block]) -> HashMap<Field, Values> {
    let mut acc: HashMap<Field, Values> = HashMap::new();
    for block in blocks {
        for (field, data) in &block.data {
            let entry = acc.entry(*field).or_default();
            match block.operation {
                Operation::Add => *entry = field.merge(entry, data),
                Operation::Remove => {
                    let (kept, _) = field.remove(entry, data);
                    *entry = kept;
                }
            }
        }
    }
    acc
}
