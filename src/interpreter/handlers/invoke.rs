//! `INVOKE`: call an intrinsic function by 1-based index.

use super::super::Interpreter;
use crate::error::{Exception, ExceptionTag, RuntimeError};
use crate::instruction::Instruction;
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_invoke(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        let arity = instruction.modifier().bits() as usize;
        let index = instruction.operand() as usize;

        // The modifier's first pop is parameter 1, per `IntrinsicTable`.
        let mut arguments = Vec::with_capacity(arity);
        for _ in 0..arity {
            arguments.push(self.pop_component()?);
        }

        match self.intrinsics.invoke(index, arguments) {
            Ok(value) => {
                self.task.component_stack.push(value);
                Ok(())
            }
            Err(err) => match err.exception_value() {
                Some(value) => Err(RuntimeError::Recoverable(Exception::Value(value.clone()))),
                None => Err(ExceptionTag::IntrinsicFailure.into()),
            },
        }
    }
}
