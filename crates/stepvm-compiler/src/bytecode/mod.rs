//! Bytecode types for the step machine.
//!
//! - [`Instruction`] - The instruction set
//! - [`BinaryOperator`] and [`UnaryOperator`] - Operator payloads
//! - [`Label`] - Symbolic jump target
//! - [`Tape`] and [`TapeEntry`] - A compiled program with its label table

mod instruction;
mod tape;

pub use instruction::{BinaryOperator, Instruction, Label, UnaryOperator};
pub use tape::{LabelTable, Tape, TapeEntry};
