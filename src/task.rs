//! Task context: the per-task state owned across the whole call stack. See
//! §3/§4.D.

use crate::frame::ProcedureContext;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three processor states a task can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorStatus {
    /// Runnable; `run()` will keep stepping it.
    #[serde(rename = "active")]
    Active,
    /// Blocked on an empty message queue; waiting to be resumed.
    #[serde(rename = "waiting")]
    Waiting,
    /// Terminated; `result` or `exception` is set.
    #[serde(rename = "done")]
    Done,
}

/// A handler address installed by `PUSH HANDLER`, tagged with the
/// procedure-stack depth it was installed at. Popping a frame discards
/// exactly the handlers whose `frame_depth` equals that frame's depth — the
/// frame-scoped, one-shot discipline described in §4.E/§9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerEntry {
    /// 1-based bytecode address to resume at.
    pub address: usize,
    /// Depth of `procedure_stack` (1 = bottom frame) at install time.
    pub frame_depth: usize,
}

/// The outcome recorded once a task reaches [`ProcessorStatus::Done`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// `HANDLE RESULT` off the bottom frame.
    Result(Value),
    /// An exception that unwound past the bottom frame unhandled.
    Exception(Value),
}

/// The per-task execution state: every stack the processor mutates, plus gas
/// accounting and identity. Owns the component and handler stacks directly
/// (not the frames) so that a procedure call shares them with its caller —
/// see §9.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    /// Opaque task identity.
    #[serde(rename = "$taskTag")]
    pub task_tag: Uuid,
    /// Opaque owning-account identity.
    #[serde(rename = "$accountTag")]
    pub account_tag: Uuid,
    /// Gas counter, decremented by one per executed instruction.
    #[serde(rename = "$accountBalance")]
    pub account_balance: u64,
    /// Monotonically increasing count of executed instructions.
    #[serde(rename = "$clockCycles")]
    pub clock_cycles: u64,
    /// The current processor state.
    #[serde(rename = "$processorStatus")]
    pub processor_status: ProcessorStatus,
    /// The shared operand stack.
    #[serde(rename = "$componentStack")]
    pub component_stack: Vec<Value>,
    /// The shared handler installation stack.
    #[serde(rename = "$handlerStack")]
    pub handler_stack: Vec<HandlerEntry>,
    /// The call stack; the last element is the current frame.
    #[serde(rename = "$procedureStack")]
    pub procedure_stack: Vec<ProcedureContext>,
    /// Set only once `processor_status` becomes `Done`.
    #[serde(rename = "$outcome")]
    pub outcome: Option<Outcome>,
}

impl TaskContext {
    /// Construct a freshly-born task from its initial procedure frame.
    pub fn new(task_tag: Uuid, account_tag: Uuid, account_balance: u64, entry_frame: ProcedureContext) -> Self {
        Self {
            task_tag,
            account_tag,
            account_balance,
            clock_cycles: 0,
            processor_status: ProcessorStatus::Active,
            component_stack: Vec::new(),
            handler_stack: Vec::new(),
            procedure_stack: vec![entry_frame],
            outcome: None,
        }
    }

    /// The currently executing frame, or `None` once the procedure stack has
    /// been fully unwound (status is then always `Done`, per invariant 2).
    pub fn current_frame(&self) -> Option<&ProcedureContext> {
        self.procedure_stack.last()
    }

    /// Mutable access to the currently executing frame.
    pub fn current_frame_mut(&mut self) -> Option<&mut ProcedureContext> {
        self.procedure_stack.last_mut()
    }

    /// 1-based depth of the current frame (bottom frame is depth 1).
    pub fn current_depth(&self) -> usize {
        self.procedure_stack.len()
    }

    /// `true` while the task is runnable: active, funded, and its top frame
    /// still has instructions to fetch.
    pub fn is_runnable(&self) -> bool {
        self.processor_status == ProcessorStatus::Active
            && self.account_balance > 0
            && self.current_frame().is_some_and(ProcedureContext::has_more_instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ProcedureDefinition;
    use crate::value::Reference;

    fn entry_frame() -> ProcedureContext {
        let def = ProcedureDefinition {
            name: "main".to_string(),
            literal_values: Vec::new(),
            variable_count: 0,
            bytecode: Vec::new(),
        };
        ProcedureContext::new(Reference::draft("T", "v1"), &def, Value::none(), Vec::new())
    }

    #[test]
    fn new_task_is_active_with_one_frame() {
        let task = TaskContext::new(Uuid::nil(), Uuid::nil(), 10, entry_frame());
        assert_eq!(task.processor_status, ProcessorStatus::Active);
        assert_eq!(task.current_depth(), 1);
        assert!(task.outcome.is_none());
    }

    #[test]
    fn not_runnable_once_balance_exhausted() {
        let mut task = TaskContext::new(Uuid::nil(), Uuid::nil(), 0, entry_frame());
        assert!(!task.is_runnable());
        task.account_balance = 1;
        // Still not runnable: the bottom frame has an empty bytecode array.
        assert!(!task.is_runnable());
    }
}
