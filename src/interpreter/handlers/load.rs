//! `LOAD`: read a value from one of the four symbol-table classes onto the
//! component stack.

use super::super::Interpreter;
use crate::consts::WAIT_QUEUE_TAG;
use crate::error::{ExceptionTag, HaltReason, RuntimeError};
use crate::instruction::{load_symbol, Instruction};
use crate::intrinsics::IntrinsicTable;
use crate::repository::{EventSink, Repository};
use crate::task::ProcessorStatus;
use crate::value::{Reference, Value};

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    pub(crate) fn execute_load(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        let operand = instruction.operand() as usize;
        match instruction.modifier().bits() {
            load_symbol::VARIABLE => {
                let value = self.frame().variable(operand).cloned().ok_or(ExceptionTag::InvalidBytecode)?;
                self.task.component_stack.push(value);
                Ok(())
            }
            load_symbol::PARAMETER => {
                let value = self.frame().parameter(operand).cloned().ok_or(ExceptionTag::InvalidBytecode)?;
                self.task.component_stack.push(value);
                Ok(())
            }
            load_symbol::DOCUMENT => {
                let citation = self.citation_variable(operand)?;
                let document = if citation.is_draft() {
                    self.repository.retrieve_draft(&citation.tag, &citation.version)
                } else {
                    self.repository.retrieve_document(&citation)
                }
                .map_err(|e| RuntimeError::Halt(HaltReason::Repository(e.to_string())))?;
                self.task.component_stack.push(document);
                Ok(())
            }
            _ => {
                let queue = self.queue_name_variable(operand)?;
                match self
                    .repository
                    .receive_message(&queue)
                    .map_err(|e| RuntimeError::Halt(HaltReason::Repository(e.to_string())))?
                {
                    Some(message) => {
                        self.task.component_stack.push(message);
                        Ok(())
                    }
                    None => {
                        let task_tag = Value::Tag(self.task.task_tag.to_string());
                        self.repository
                            .queue_message(WAIT_QUEUE_TAG, task_tag)
                            .map_err(|e| RuntimeError::Halt(HaltReason::Repository(e.to_string())))?;
                        self.retry_current_instruction();
                        self.task.processor_status = ProcessorStatus::Waiting;
                        Ok(())
                    }
                }
            }
        }
    }

    /// Read variable `index` and require it hold a [`crate::value::Reference`].
    pub(super) fn citation_variable(&self, index: usize) -> Result<Reference, RuntimeError> {
        match self.frame().variable(index) {
            Some(Value::Reference(r)) => Ok(r.clone()),
            Some(_) => Err(ExceptionTag::NotAReference.into()),
            None => Err(ExceptionTag::InvalidBytecode.into()),
        }
    }

    /// Read variable `index` and require it hold a queue name (a symbol or
    /// tag), returning its name as a plain string.
    pub(super) fn queue_name_variable(&self, index: usize) -> Result<String, RuntimeError> {
        match self.frame().variable(index) {
            Some(Value::Symbol(s)) | Some(Value::Tag(s)) => Ok(s.clone()),
            Some(_) => Err(ExceptionTag::NotAReference.into()),
            None => Err(ExceptionTag::InvalidBytecode.into()),
        }
    }
}
