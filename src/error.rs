//! Error taxonomy: recoverable exceptions routed through `HANDLE EXCEPTION`,
//! and halting faults that abort the processor entirely. See §7.

use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// A named exception tag, analogous to `fuel_asm::PanicReason`: every fatal
/// condition the processor itself can raise, each carrying the `$`-prefixed
/// symbol it is pushed onto the component stack as before unwinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ExceptionTag {
    /// An instruction word decoded to an undefined (operation, modifier,
    /// operand) combination.
    #[error("$invalidBytecode")]
    InvalidBytecode,
    /// A pop was attempted against an empty component or handler stack.
    #[error("$stackUnderflow")]
    StackUnderflow,
    /// `LOAD`/`STORE DOCUMENT`/`DRAFT` indexed a variable that does not hold
    /// a [`crate::value::Reference`].
    #[error("$notAReference")]
    NotAReference,
    /// A repository collaborator call returned an error.
    #[error("$repositoryFailure")]
    RepositoryFailure,
    /// An intrinsic function invocation returned an error.
    #[error("$intrinsicFailure")]
    IntrinsicFailure,
}

impl ExceptionTag {
    /// The `$`-prefixed symbol this tag is rendered as on the component
    /// stack.
    pub fn as_symbol(self) -> &'static str {
        match self {
            Self::InvalidBytecode => "$invalidBytecode",
            Self::StackUnderflow => "$stackUnderflow",
            Self::NotAReference => "$notAReference",
            Self::RepositoryFailure => "$repositoryFailure",
            Self::IntrinsicFailure => "$intrinsicFailure",
        }
    }

    /// Render this tag as a pushable [`Value`].
    pub fn as_value(self) -> Value {
        Value::symbol(self.as_symbol().trim_start_matches('$'))
    }
}

/// An exception value in flight during `HANDLE EXCEPTION` unwinding: either
/// one of the processor's own named tags, or an arbitrary value supplied by
/// an intrinsic.
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// One of the processor's own fatal conditions.
    Tagged(ExceptionTag),
    /// An intrinsic-supplied exception value.
    Value(Value),
}

impl Exception {
    /// Render this exception as the value pushed onto the component stack
    /// for a handler (or the task's final `exception` field) to observe.
    pub fn into_value(self) -> Value {
        match self {
            Self::Tagged(tag) => tag.as_value(),
            Self::Value(v) => v,
        }
    }
}

impl From<ExceptionTag> for Exception {
    fn from(tag: ExceptionTag) -> Self {
        Self::Tagged(tag)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tagged(tag) => write!(f, "{tag}"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

/// Runtime error description that either has a well-formed recovery strategy
/// (unwind via `HANDLE EXCEPTION`) or must halt the processor outright.
/// Mirrors `fuel_vm::error::RuntimeError`'s `Recoverable`/`Halt` split.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Specified exception with a well-formed unwind strategy. Converted
    /// into a pushed [`Exception`] and routed into `HANDLE EXCEPTION` before
    /// it ever reaches a caller of [`crate::interpreter::Interpreter::step`].
    #[error("recoverable exception: {0}")]
    Recoverable(Exception),
    /// A collaborator (repository, intrinsic table, event sink) or an
    /// internal bug condition that cannot be expressed as an in-VM
    /// exception. Propagates out of `step`/`run` and halts the processor.
    #[error("halt: {0}")]
    Halt(#[from] HaltReason),
}

impl RuntimeError {
    /// `true` if this error has a well-formed unwind strategy.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }
}

impl From<ExceptionTag> for RuntimeError {
    fn from(tag: ExceptionTag) -> Self {
        Self::Recoverable(Exception::Tagged(tag))
    }
}

/// Conditions that halt the processor rather than unwind through the VM's
/// own exception mechanism.
#[derive(Debug, Error)]
pub enum HaltReason {
    /// The document repository collaborator returned an error.
    #[error("repository collaborator failed: {0}")]
    Repository(String),
    /// The event sink collaborator returned an error.
    #[error("event sink collaborator failed: {0}")]
    EventSink(String),
    /// `procedure_stack` would exceed `ProcessorLimits::max_procedure_stack_depth`.
    #[error("procedure stack depth limit exceeded")]
    ProcedureStackOverflow,
    /// The processor was asked to fetch past the end of a well-formed
    /// program with no further instruction and no terminating `HANDLE`; this
    /// indicates a malformed procedure rather than a recoverable exception.
    #[error("fetched past end of bytecode with no terminating instruction")]
    ProgramRanOff,
}
