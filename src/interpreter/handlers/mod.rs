//! One module per operation family, each an `impl<R, E, I> Interpreter<R, E, I>`
//! block split out of `executors/instruction.rs`'s dispatch table. See §4.E.

mod execute;
mod handle;
mod invoke;
mod jump;
mod load;
mod pop;
mod push;
mod store;
