//! Procedure context: the per-call activation record. See §3/§4.C.

use crate::instruction::Instruction;
use crate::value::{Reference, Value};
use serde::{Deserialize, Serialize};

/// A single mutable variable cell.
pub type Cell = Value;

/// The bytecode, literal table, and variable/parameter declarations that
/// make up a compiled procedure. Produced by the compiler/assembler
/// collaborator, consumed here to build a [`ProcedureContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureDefinition {
    /// The procedure's name.
    pub name: String,
    /// Ordered, 1-indexed literal table.
    pub literal_values: Vec<Value>,
    /// Number of local variable cells to allocate (each starts as `NONE`).
    pub variable_count: usize,
    /// The instruction words.
    pub bytecode: Vec<Instruction>,
}

/// The per-call activation record: bytecode, next-address pointer, and the
/// three indexed tables a running procedure reads from. Shares the task's
/// component and handler stacks rather than owning its own — see §9.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureContext {
    /// The receiver of a method-style call, or `NONE` for a bare procedure.
    #[serde(rename = "$targetComponent")]
    pub target_component: Value,
    /// A reference to the type document that owns this procedure.
    #[serde(rename = "$typeReference")]
    pub type_reference: Reference,
    /// The procedure's name, as a symbol.
    #[serde(rename = "$procedureName")]
    pub procedure_name: String,
    /// Ordered, 1-indexed, immutable literal table.
    #[serde(rename = "literalValues")]
    pub literal_values: Vec<Value>,
    /// Ordered, 1-indexed, mutable variable cells.
    #[serde(rename = "$variableValues")]
    pub variable_values: Vec<Cell>,
    /// Ordered, 1-indexed, immutable parameter values.
    #[serde(rename = "$parameterValues")]
    pub parameter_values: Vec<Value>,
    /// The procedure's instruction words.
    #[serde(rename = "$bytecodeInstructions")]
    pub bytecode: Vec<Instruction>,
    /// 1-based pointer into `bytecode` naming the next instruction to fetch.
    #[serde(rename = "$nextAddress")]
    pub next_address: usize,
}

impl ProcedureContext {
    /// Build a fresh activation record. Variable storage is initialized to
    /// `NONE`; `next_address` starts at 1, per §4.C.
    pub fn new(
        type_reference: Reference,
        definition: &ProcedureDefinition,
        target_component: Value,
        parameter_values: Vec<Value>,
    ) -> Self {
        Self {
            target_component,
            type_reference,
            procedure_name: definition.name.clone(),
            literal_values: definition.literal_values.clone(),
            variable_values: vec![Value::none(); definition.variable_count],
            parameter_values,
            bytecode: definition.bytecode.clone(),
            next_address: 1,
        }
    }

    /// `true` if `next_address` still points inside `bytecode` (1-based,
    /// inclusive of the one-past-the-end "about to finish" position per
    /// invariant 1 in §3).
    pub fn has_more_instructions(&self) -> bool {
        self.next_address <= self.bytecode.len()
    }

    /// Fetch the instruction at `next_address`. Returns `None` if the
    /// pointer has run off the end of the array.
    pub fn current_instruction(&self) -> Option<Instruction> {
        self.bytecode.get(self.next_address.checked_sub(1)?).copied()
    }

    /// 1-based indexed read of a literal. Returns `None` for an
    /// out-of-range index.
    pub fn literal(&self, index: usize) -> Option<&Value> {
        index.checked_sub(1).and_then(|i| self.literal_values.get(i))
    }

    /// 1-based indexed read of a parameter. Returns `None` for an
    /// out-of-range index.
    pub fn parameter(&self, index: usize) -> Option<&Value> {
        index.checked_sub(1).and_then(|i| self.parameter_values.get(i))
    }

    /// 1-based indexed read of a variable cell. Returns `None` for an
    /// out-of-range index.
    pub fn variable(&self, index: usize) -> Option<&Value> {
        index.checked_sub(1).and_then(|i| self.variable_values.get(i))
    }

    /// 1-based indexed write of a variable cell. Returns `false` for an
    /// out-of-range index.
    pub fn set_variable(&mut self, index: usize, value: Value) -> bool {
        match index.checked_sub(1).and_then(|i| self.variable_values.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_definition() -> ProcedureDefinition {
        ProcedureDefinition {
            name: "doSomething".to_string(),
            literal_values: vec![Value::symbol("hello")],
            variable_count: 2,
            bytecode: Vec::new(),
        }
    }

    #[test]
    fn new_frame_starts_at_address_one_with_none_variables() {
        let def = sample_definition();
        let frame = ProcedureContext::new(
            Reference::draft("SomeType", "v1"),
            &def,
            Value::none(),
            vec![Value::symbol("param")],
        );
        assert_eq!(frame.next_address, 1);
        assert_eq!(frame.variable_values, vec![Value::none(), Value::none()]);
        assert_eq!(frame.literal(1), Some(&Value::symbol("hello")));
        assert_eq!(frame.parameter(1), Some(&Value::symbol("param")));
    }

    #[test]
    fn variable_indices_are_one_based() {
        let def = sample_definition();
        let mut frame = ProcedureContext::new(Reference::draft("T", "v1"), &def, Value::none(), Vec::new());
        assert!(frame.set_variable(1, Value::symbol("x")));
        assert_eq!(frame.variable(1), Some(&Value::symbol("x")));
        assert_eq!(frame.variable(0), None);
        assert!(!frame.set_variable(99, Value::symbol("y")));
    }
}
