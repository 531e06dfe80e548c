//! `STORE`: write the top of the component stack into one of the four
//! symbol-table classes.

use super::super::Interpreter;
use crate::error::{ExceptionTag, HaltReason, RuntimeError};
use crate::instruction::{store_symbol, Instruction};
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};
use crate::value::Value;

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_store(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        let operand = instruction.operand() as usize;
        match instruction.modifier().bits() {
            store_symbol::VARIABLE => {
                let value = self.pop_component()?;
                if !self.frame_mut().set_variable(operand, value) {
                    return Err(ExceptionTag::InvalidBytecode.into());
                }
                Ok(())
            }
            store_symbol::DRAFT => {
                let value = self.pop_component()?;
                let citation = self.citation_variable(operand)?;
                self.repository
                    .save_draft(&citation.tag, &citation.version, value)
                    .map_err(|e| RuntimeError::Halt(HaltReason::Repository(e.to_string())))
            }
            store_symbol::DOCUMENT => {
                let value = self.pop_component()?;
                let citation = self.citation_variable(operand)?;
                let committed = self
                    .repository
                    .commit_document(&citation.tag, &citation.version, value)
                    .map_err(|e| RuntimeError::Halt(HaltReason::Repository(e.to_string())))?;
                self.frame_mut().set_variable(operand, Value::Reference(committed));
                Ok(())
            }
            _ => {
                let value = self.pop_component()?;
                let queue = self.queue_name_variable(operand)?;
                self.repository
                    .queue_message(&queue, value)
                    .map_err(|e| RuntimeError::Halt(HaltReason::Repository(e.to_string())))
            }
        }
    }
}
