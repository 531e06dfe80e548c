//! The processor: drives a single task's fetch-dispatch-unwind loop and owns
//! its three collaborator seams. See §4.F/§9.

mod executors;
mod handlers;

use crate::document;
use crate::error::{Exception, ExceptionTag, HaltReason, RuntimeError};
use crate::frame::ProcedureContext;
use crate::intrinsics::IntrinsicTable;
use crate::limits::ProcessorLimits;
use crate::repository::{Event, EventSink, Repository};
use crate::task::{HandlerEntry, Outcome, ProcessorStatus, TaskContext};
use crate::value::{Reference, Value};
use tracing::{instrument, trace, warn};

/// The bytecode processor: couples a [`TaskContext`] to the document
/// repository, event sink, and intrinsic table it was constructed with, the
/// way `fuel_vm::Interpreter<S>` couples VM state to an `InterpreterStorage`
/// backend. Generic over all three collaborator traits so tests can swap in
/// the in-memory doubles from [`crate::repository`] and [`crate::intrinsics`].
#[derive(Debug)]
pub struct Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    task: TaskContext,
    repository: R,
    event_sink: E,
    intrinsics: I,
    limits: ProcessorLimits,
}

impl<R, E, I> Interpreter<R, E, I>
where
    R: Repository,
    E: EventSink,
    I: IntrinsicTable,
{
    /// Build a processor for the given task, using default runtime ceilings.
    pub fn new(task: TaskContext, repository: R, event_sink: E, intrinsics: I) -> Self {
        Self::with_limits(task, repository, event_sink, intrinsics, ProcessorLimits::default())
    }

    /// Build a processor for the given task with explicit runtime ceilings.
    pub fn with_limits(task: TaskContext, repository: R, event_sink: E, intrinsics: I, limits: ProcessorLimits) -> Self {
        Self {
            task,
            repository,
            event_sink,
            intrinsics,
            limits,
        }
    }

    /// The task's current state.
    pub fn task(&self) -> &TaskContext {
        &self.task
    }

    /// Mutable access to the task, e.g. to seed its component stack before a
    /// test run or to patch state after restoring a checkpoint document.
    pub fn task_mut(&mut self) -> &mut TaskContext {
        &mut self.task
    }

    /// Consume the processor, yielding back its task — e.g. to export it as a
    /// checkpoint document once it reaches [`ProcessorStatus::Waiting`].
    pub fn into_task(self) -> TaskContext {
        self.task
    }

    /// Run until the task stops being runnable, then publish the matching
    /// completion or suspension event. Returns the halt reason if dispatch
    /// raised an unrecoverable fault; the task's procedure stack is left
    /// exactly as it stood at the moment of the fault.
    #[instrument(skip(self), fields(task = %self.task.task_tag))]
    pub fn run(&mut self) -> Result<(), HaltReason> {
        while self.task.is_runnable() {
            self.step()?;
        }
        self.publish_termination()
    }

    /// Execute exactly one instruction: fetch, pre-advance the instruction
    /// pointer, charge one unit of gas, dispatch, and resolve any recoverable
    /// exception via `HANDLE EXCEPTION` unwinding.
    ///
    /// The dispatcher always precomputes `next := current + 1` before
    /// invoking the handler; a handler that branches (a taken `JUMP`, a
    /// blocked `LOAD MESSAGE`, an unwind) overwrites `next_address` itself.
    /// Handlers that fall through leave the pre-advance in place.
    #[instrument(skip(self), level = "trace")]
    pub fn step(&mut self) -> Result<(), HaltReason> {
        let frame = self.task.current_frame().expect("step called on a non-runnable task");
        let instruction = match frame.current_instruction() {
            Some(instruction) => instruction,
            None => return Err(HaltReason::ProgramRanOff),
        };
        trace!(address = frame.next_address, word = instruction.word(), "fetch");

        self.frame_mut().next_address += 1;
        self.task.account_balance = self.task.account_balance.saturating_sub(1);
        self.task.clock_cycles += 1;

        match self.dispatch(instruction) {
            Ok(()) => Ok(()),
            Err(RuntimeError::Recoverable(exception)) => self.unwind(exception),
            Err(RuntimeError::Halt(reason)) => Err(reason),
        }
    }

    /// The current frame. Panics if the procedure stack is empty, which
    /// cannot happen mid-`step` — the loop in [`Self::run`] only calls `step`
    /// while [`TaskContext::is_runnable`] holds.
    fn frame(&self) -> &ProcedureContext {
        self.task.current_frame().expect("interpreter invariant: current frame exists mid-step")
    }

    /// Mutable access to the current frame. See [`Self::frame`].
    fn frame_mut(&mut self) -> &mut ProcedureContext {
        self.task.current_frame_mut().expect("interpreter invariant: current frame exists mid-step")
    }

    /// Re-fetch the instruction just pre-advanced past, by winding
    /// `next_address` back by one. Used by `LOAD MESSAGE` to block on an
    /// empty queue without losing its place.
    fn retry_current_instruction(&mut self) {
        let frame = self.frame_mut();
        frame.next_address = frame.next_address.saturating_sub(1).max(1);
    }

    /// Pop the top of the component stack, raising `$stackUnderflow` if it is
    /// empty.
    fn pop_component(&mut self) -> Result<Value, RuntimeError> {
        self.task.component_stack.pop().ok_or_else(|| ExceptionTag::StackUnderflow.into())
    }

    /// Pop the top of the handler stack, raising `$stackUnderflow` if it is
    /// empty.
    fn pop_handler(&mut self) -> Result<HandlerEntry, RuntimeError> {
        self.task.handler_stack.pop().ok_or_else(|| ExceptionTag::StackUnderflow.into())
    }

    /// Resolve an exception by unwinding to the nearest installed handler, or
    /// terminating the task if none remains. The handler stack's frame-scoped,
    /// one-shot discipline (§4.E/§9) guarantees the topmost entry is always
    /// the nearest live handler: a frame cannot install one without it ending
    /// up above every handler installed by its caller.
    fn unwind(&mut self, exception: Exception) -> Result<(), HaltReason> {
        let value = exception.into_value();
        match self.task.handler_stack.pop() {
            Some(handler) => {
                self.task.procedure_stack.truncate(handler.frame_depth);
                self.task.component_stack.push(value);
                self.frame_mut().next_address = handler.address;
                Ok(())
            }
            None => {
                self.task.procedure_stack.clear();
                self.task.processor_status = ProcessorStatus::Done;
                self.task.outcome = Some(Outcome::Exception(value));
                Ok(())
            }
        }
    }

    /// `HANDLE RESULT`'s frame-popping half, shared with nothing else: pop
    /// the current frame, discard handlers installed at its depth that never
    /// fired, and either finish the task (bottom frame) or hand the result
    /// back to the caller on the component stack.
    fn return_result(&mut self, value: Value) {
        let popped_depth = self.task.current_depth();
        self.task.procedure_stack.pop();
        if self.task.procedure_stack.is_empty() {
            self.task.processor_status = ProcessorStatus::Done;
            self.task.outcome = Some(Outcome::Result(value));
        } else {
            self.task.handler_stack.retain(|h| h.frame_depth != popped_depth);
            self.task.component_stack.push(value);
        }
    }

    /// Resolve a `type_reference`'s procedure table and build the activation
    /// record for frame `index` (1-based), enforcing the procedure-stack
    /// depth ceiling.
    fn enter_procedure(
        &mut self,
        type_reference: Reference,
        index: u16,
        target_component: Value,
        parameter_values: Vec<Value>,
    ) -> Result<(), RuntimeError> {
        if self.task.procedure_stack.len() >= self.limits.max_procedure_stack_depth {
            return Err(HaltReason::ProcedureStackOverflow.into());
        }
        let type_document = if type_reference.is_draft() {
            self.repository.retrieve_draft(&type_reference.tag, &type_reference.version)
        } else {
            self.repository.retrieve_document(&type_reference)
        }
        .map_err(|e| RuntimeError::Halt(HaltReason::Repository(e.to_string())))?;

        let definition = document::procedure_definition(&type_document, index as usize)
            .ok_or(ExceptionTag::InvalidBytecode)?;
        let frame = ProcedureContext::new(type_reference, &definition, target_component, parameter_values);
        self.task.procedure_stack.push(frame);
        Ok(())
    }

    /// Publish the completion or suspension event matching the task's final
    /// state once `run` stops looping, per §4.F/§6.
    fn publish_termination(&mut self) -> Result<(), HaltReason> {
        let event = match self.task.processor_status {
            // Waiting already signaled itself by enqueueing onto the wait
            // queue in `execute_load`; publishing a suspension here too
            // would be a second, spurious signal for the same route.
            ProcessorStatus::Waiting => return Ok(()),
            ProcessorStatus::Active => Event::Suspension {
                task_tag: self.task.task_tag,
            },
            ProcessorStatus::Done => {
                let (result, exception) = match self.task.outcome.clone() {
                    Some(Outcome::Result(v)) => (Some(v), None),
                    Some(Outcome::Exception(v)) => (None, Some(v)),
                    None => {
                        warn!("task reached Done with no recorded outcome");
                        (None, None)
                    }
                };
                Event::Completion {
                    task_tag: self.task.task_tag,
                    account_tag: self.task.account_tag,
                    account_balance: self.task.account_balance,
                    clock_cycles: self.task.clock_cycles,
                    result,
                    exception,
                }
            }
        };
        self.event_sink
            .publish_event(event)
            .map_err(|e| HaltReason::EventSink(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ProcedureDefinition;
    use crate::instruction::{handle, jump, push, Instruction, Modifier, Operation};
    use crate::intrinsics::MemoryIntrinsicTable;
    use crate::repository::{MemoryEventSink, MemoryRepository};
    use crate::value::Reference;
    use uuid::Uuid;

    fn task_with(bytecode: Vec<Instruction>) -> TaskContext {
        let def = ProcedureDefinition {
            name: "main".to_string(),
            literal_values: vec![Value::symbol("hello")],
            variable_count: 1,
            bytecode,
        };
        let frame = ProcedureContext::new(Reference::draft("T", "v1"), &def, Value::none(), Vec::new());
        TaskContext::new(Uuid::nil(), Uuid::nil(), 100, frame)
    }

    fn interpreter(
        bytecode: Vec<Instruction>,
    ) -> Interpreter<MemoryRepository, MemoryEventSink, MemoryIntrinsicTable> {
        Interpreter::new(
            task_with(bytecode),
            MemoryRepository::new(),
            MemoryEventSink::new(),
            MemoryIntrinsicTable::new(),
        )
    }

    #[test]
    fn noop_advances_and_completes_with_no_handler() {
        let noop = Instruction::encode(Operation::Jump, Modifier::from_bits(jump::ALWAYS), 0);
        let result = Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0);
        let mut vm = interpreter(vec![noop, result]);
        vm.task.component_stack.push(Value::none());
        vm.run().unwrap();
        assert_eq!(vm.task().processor_status, ProcessorStatus::Done);
        assert_eq!(vm.task().outcome, Some(Outcome::Result(Value::none())));
        assert_eq!(vm.task().clock_cycles, 2);
    }

    #[test]
    fn push_element_then_handle_result_completes_with_literal() {
        let push_element = Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 1);
        let result = Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0);
        let mut vm = interpreter(vec![push_element, result]);
        vm.run().unwrap();
        assert_eq!(vm.task().outcome, Some(Outcome::Result(Value::symbol("hello"))));
    }

    #[test]
    fn gas_exhaustion_suspends_without_finishing() {
        let noop = Instruction::encode(Operation::Jump, Modifier::from_bits(jump::ALWAYS), 0);
        let mut vm = interpreter(vec![noop, noop, noop]);
        vm.task.account_balance = 2;
        vm.run().unwrap();
        assert_eq!(vm.task().processor_status, ProcessorStatus::Active);
        assert_eq!(vm.task().account_balance, 0);
        assert_eq!(vm.task().clock_cycles, 2);
    }
}
