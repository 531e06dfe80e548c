//! Decoding of compiled procedures out of a fetched type document, per the
//! `$procedureDefinitions` schema in §6. Kept separate from [`crate::frame`]
//! so the document shape can evolve without touching the activation-record
//! type it ultimately builds.

use crate::frame::ProcedureDefinition;
use crate::instruction::Instruction;
use crate::value::Value;

/// Resolve procedure `index` (1-based) out of a type document's
/// `$procedureDefinitions` list. Returns `None` for any structural mismatch —
/// callers raise `$invalidBytecode`, since a well-formed compiler never emits
/// an `EXECUTE` whose type document disagrees with it.
pub fn procedure_definition(type_document: &Value, index: usize) -> Option<ProcedureDefinition> {
    let definitions = type_document.get_keyed("$procedureDefinitions")?;
    let entry = definitions.get_indexed(index)?;

    let name = match entry.get_keyed("$procedureName")? {
        Value::Symbol(s) => s.clone(),
        _ => return None,
    };

    let literal_values = match entry.get_keyed("literalValues") {
        Some(Value::List(items)) => items.clone(),
        Some(_) => return None,
        None => Vec::new(),
    };

    let variable_count = match entry.get_keyed("$variableCount")? {
        Value::Number { magnitude, .. } => {
            if *magnitude < 0.0 {
                return None;
            }
            *magnitude as usize
        }
        _ => return None,
    };

    let bytecode = match entry.get_keyed("$bytecodeInstructions")? {
        Value::List(words) => words
            .iter()
            .map(|w| match w {
                Value::Number { magnitude, .. } => Some(Instruction::from_word(*magnitude as u16)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };

    Some(ProcedureDefinition {
        name,
        literal_values,
        variable_count,
        bytecode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{handle, Modifier, Operation};

    fn sample_document() -> Value {
        let instruction = Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0);
        let procedure = Value::Catalog(vec![
            ("$procedureName".to_string(), Value::symbol("doSomething")),
            ("literalValues".to_string(), Value::List(vec![Value::symbol("x")])),
            ("$variableCount".to_string(), Value::number_from_literal("2")),
            (
                "$bytecodeInstructions".to_string(),
                Value::List(vec![Value::number_from_literal(instruction.word().to_string())]),
            ),
        ]);
        Value::Catalog(vec![("$procedureDefinitions".to_string(), Value::List(vec![procedure]))])
    }

    #[test]
    fn resolves_procedure_by_one_based_index() {
        let doc = sample_document();
        let definition = procedure_definition(&doc, 1).unwrap();
        assert_eq!(definition.name, "doSomething");
        assert_eq!(definition.variable_count, 2);
        assert_eq!(definition.bytecode.len(), 1);
        assert!(procedure_definition(&doc, 2).is_none());
    }
}
