//! The Bali virtual machine: a stack-based, 16-bit bytecode processor for a
//! document-oriented platform. A task's whole lifecycle — fetch, dispatch,
//! suspend on an empty message queue, resume from a checkpoint, unwind
//! through `HANDLE EXCEPTION` — is driven by [`interpreter::Interpreter`]
//! against three collaborator traits supplied by the embedder: a document
//! [`repository::Repository`], an [`repository::EventSink`], and an
//! [`intrinsics::IntrinsicTable`].
//!
//! <https://github.com/craterdog-bali/bali-nebula-virtual-machine/wiki>

pub mod consts;
pub mod document;
pub mod error;
pub mod frame;
pub mod instruction;
pub mod interpreter;
pub mod intrinsics;
pub mod limits;
pub mod repository;
pub mod task;
pub mod value;

/// Re-exports of the types most callers need to construct and drive a
/// processor.
pub mod prelude {
    pub use crate::error::{Exception, ExceptionTag, HaltReason, RuntimeError};
    pub use crate::frame::{ProcedureContext, ProcedureDefinition};
    pub use crate::instruction::{Instruction, Modifier, Operation};
    pub use crate::interpreter::Interpreter;
    pub use crate::intrinsics::{IntrinsicError, IntrinsicTable, MemoryIntrinsicTable};
    pub use crate::limits::ProcessorLimits;
    pub use crate::repository::{Event, EventSink, MemoryEventSink, MemoryRepository, Repository};
    pub use crate::task::{HandlerEntry, Outcome, ProcessorStatus, TaskContext};
    pub use crate::value::{Reference, Template, Value};
}
