//! The opcode dispatch table. See §4.E.

use super::super::Interpreter;
use crate::error::{ExceptionTag, RuntimeError};
use crate::instruction::{Instruction, Operation};
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    /// Validate and route a single instruction to its operation-family
    /// handler under `handlers/`.
    pub(in crate::interpreter) fn dispatch(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        if !instruction.is_valid() {
            return Err(ExceptionTag::InvalidBytecode.into());
        }
        match instruction.op() {
            Operation::Jump => self.execute_jump(instruction),
            Operation::Push => self.execute_push(instruction),
            Operation::Pop => self.execute_pop(instruction),
            Operation::Load => self.execute_load(instruction),
            Operation::Store => self.execute_store(instruction),
            Operation::Invoke => self.execute_invoke(instruction),
            Operation::Execute => self.execute_execute(instruction),
            Operation::Handle => self.execute_handle(instruction),
        }
    }
}
