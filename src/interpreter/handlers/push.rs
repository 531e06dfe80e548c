//! `PUSH`: place a handler address or a literal-table element/code body onto
//! its stack.

use super::super::Interpreter;
use crate::error::{ExceptionTag, RuntimeError};
use crate::instruction::{push, Instruction};
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};
use crate::task::HandlerEntry;

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_push(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        let operand = instruction.operand() as usize;
        match instruction.modifier().bits() {
            push::HANDLER => {
                let frame_depth = self.task.current_depth();
                self.task.handler_stack.push(HandlerEntry {
                    address: operand,
                    frame_depth,
                });
                Ok(())
            }
            _ => {
                // ELEMENT and CODE both read the literal table; the
                // distinction is purely about what the bytecode already
                // stored there.
                let literal = self.frame().literal(operand).cloned().ok_or(ExceptionTag::InvalidBytecode)?;
                self.task.component_stack.push(literal);
                Ok(())
            }
        }
    }
}
