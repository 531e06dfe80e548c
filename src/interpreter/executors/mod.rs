//! Dispatch: routes a decoded instruction to its handler.

mod instruction;
