//! The intrinsic function library collaborator: opaque callable units
//! indexed by number, invoked by `INVOKE`. Deliberately out of scope per
//! §1 — this module only names the interface and ships a small in-memory
//! table used by tests.

use crate::value::Value;
use std::error::Error as StdError;
use std::fmt;

/// An error returned by an intrinsic invocation. Routed into
/// [`crate::error::ExceptionTag::IntrinsicFailure`] by the processor, unless
/// the intrinsic table chooses to surface a more specific exception value
/// via [`IntrinsicError::exception_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicError {
    message: String,
    exception_value: Option<Value>,
}

impl IntrinsicError {
    /// Construct an error carrying only a diagnostic message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exception_value: None,
        }
    }

    /// Construct an error that should unwind with a specific exception
    /// value rather than the generic `$intrinsicFailure` tag.
    pub fn with_exception(message: impl Into<String>, exception_value: Value) -> Self {
        Self {
            message: message.into(),
            exception_value: Some(exception_value),
        }
    }

    /// The exception value this error should unwind with, if one was
    /// supplied.
    pub fn exception_value(&self) -> Option<&Value> {
        self.exception_value.as_ref()
    }
}

impl fmt::Display for IntrinsicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for IntrinsicError {}

/// The intrinsic function table: callable units invoked by 1-based index
/// from `INVOKE`, each receiving exactly `arity` popped arguments in
/// parameter order (first pop is parameter 1).
pub trait IntrinsicTable {
    /// Invoke intrinsic `index` (1-based) with the given arguments,
    /// returning its single result value.
    fn invoke(&mut self, index: usize, arguments: Vec<Value>) -> Result<Value, IntrinsicError>;
}

/// An intrinsic table backed by a simple ordered list of Rust closures, used
/// by unit and scenario tests in place of the real compiled-in library.
#[derive(Default)]
pub struct MemoryIntrinsicTable {
    functions: Vec<Box<dyn FnMut(Vec<Value>) -> Result<Value, IntrinsicError>>>,
}

impl MemoryIntrinsicTable {
    /// An empty table.
    pub fn new() -> Self {
        Self { functions: Vec::new() }
    }

    /// Register a new intrinsic; its 1-based index is the registration
    /// order, i.e. the first registered function is intrinsic `1`.
    pub fn register(&mut self, f: impl FnMut(Vec<Value>) -> Result<Value, IntrinsicError> + 'static) -> &mut Self {
        self.functions.push(Box::new(f));
        self
    }
}

impl fmt::Debug for MemoryIntrinsicTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIntrinsicTable")
            .field("len", &self.functions.len())
            .finish()
    }
}

impl IntrinsicTable for MemoryIntrinsicTable {
    fn invoke(&mut self, index: usize, arguments: Vec<Value>) -> Result<Value, IntrinsicError> {
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.functions.get_mut(i))
            .ok_or_else(|| IntrinsicError::new(format!("no intrinsic registered at index {index}")))?;
        slot(arguments)
    }
}
