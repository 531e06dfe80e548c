//! `HANDLE`: install a handler's counterpart operations — raising an
//! exception, or returning a result, out of the current frame.

use super::super::Interpreter;
use crate::error::{Exception, RuntimeError};
use crate::instruction::{handle, Instruction};
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_handle(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        let value = self.pop_component()?;
        match instruction.modifier().bits() {
            handle::EXCEPTION => Err(RuntimeError::Recoverable(Exception::Value(value))),
            _ => {
                self.return_result(value);
                Ok(())
            }
        }
    }
}
