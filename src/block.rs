//! Blocks: the unit of declaration the evaluator reconciles.

use std::collections::HashMap;

use crate::condition::Condition;
use crate::field::Field;
use crate::value::Values;

/// Whether a block adds values to a field or subtracts (pattern-matched) values from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
}

/// An immutable `(operation, condition, data)` record.
///
/// `data` holds, for `Add` blocks, the literal values to merge in; for `Remove` blocks, the
/// removal patterns (which may contain wildcards) per field.
#[derive(Debug, Clone)]
pub struct Block {
    pub operation: Operation,
    pub condition: Condition,
    pub data: HashMap<Field, Values>,
}

impl Block {
    pub fn new(operation: Operation, condition: Condition, data: HashMap<Field, Values>) -> Block {
        Block { operation, condition, data }
    }

    /// A synthetic block with an empty (unconditional) condition and no data yet; values are
    /// appended with [`Block::receive`] as the evaluator computes a compensation set.
    pub fn synthetic(operation: Operation) -> Block {
        Block { operation, condition: Condition::always(), data: HashMap::new() }
    }

    /// Appends a single value into `data[field]`, using the field's own merge semantics against
    /// whatever is already accumulated there. Used by the evaluator to build up a synthetic
    /// compensation block one value at a time.
    pub fn receive(&mut self, field: Field, value: &str) {
        let entry = self.data.entry(field).or_default();
        let merged = field.merge(entry, &[value.to_string()]);
        *entry = merged;
    }
}
