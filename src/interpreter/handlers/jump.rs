//! `JUMP`: unconditional or template-conditional control transfer.

use super::super::Interpreter;
use crate::error::RuntimeError;
use crate::instruction::{jump, Instruction};
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};
use crate::value::Template;

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_jump(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        let operand = instruction.operand() as usize;
        let taken = match instruction.modifier().bits() {
            jump::ALWAYS => true,
            jump::ON_NONE => self.pop_component()?.matches_template(Template::None),
            jump::ON_TRUE => self.pop_component()?.matches_template(Template::True),
            _ => self.pop_component()?.matches_template(Template::False),
        };
        if taken && operand > 0 {
            self.frame_mut().next_address = operand;
        }
        Ok(())
    }
}
