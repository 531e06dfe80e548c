//! `POP`: discard the top of the handler or component stack.

use super::super::Interpreter;
use crate::error::RuntimeError;
use crate::instruction::{pop, Instruction};
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_pop(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        match instruction.modifier().bits() {
            pop::HANDLER => self.pop_handler().map(drop),
            _ => self.pop_component().map(drop),
        }
    }
}
