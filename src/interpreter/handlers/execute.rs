//! `EXECUTE`: resolve a procedure from a type document and push its
//! activation record, optionally against a target component and/or with
//! parameters.

use super::super::Interpreter;
use crate::error::{ExceptionTag, RuntimeError};
use crate::instruction::Instruction;
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};
use crate::value::Value;

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_execute(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        let index = instruction.operand();
        let with_parameters = instruction.modifier().bits() & 0b01 != 0;
        let on_target = instruction.modifier().bits() & 0b10 != 0;

        let parameters = if with_parameters {
            match self.pop_component()? {
                Value::List(items) => items,
                _ => return Err(ExceptionTag::InvalidBytecode.into()),
            }
        } else {
            Vec::new()
        };

        let receiver = match self.pop_component()? {
            Value::Reference(r) => r,
            _ => return Err(ExceptionTag::NotAReference.into()),
        };

        let target_component = if on_target { Value::Reference(receiver.clone()) } else { Value::none() };

        self.enter_procedure(receiver, index, target_component, parameters)
    }
}
