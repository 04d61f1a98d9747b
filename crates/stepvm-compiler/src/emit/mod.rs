//! Tape emitter.
//!
//! The [`TapeEmitter`] appends instructions to a tape, hands out fresh
//! labels, records the address of every placed label and tags each entry
//! with the loop labels in force.
//!
//! # Example
//!
//! ```
//! use stepvm_compiler::bytecode::{BinaryOperator, Instruction};
//! use stepvm_compiler::emit::TapeEmitter;
//! use stepvm_core::Value;
//!
//! let mut emitter = TapeEmitter::new();
//! emitter.emit_const(Value::Int(2));
//! emitter.emit_const(Value::Int(1));
//! emitter.emit(Instruction::BinaryOp(BinaryOperator::Add));
//! emitter.emit(Instruction::Yield);
//!
//! let tape = emitter.finish().unwrap();
//! assert_eq!(tape.len(), 4);
//! ```

mod jumps;

use thiserror::Error;

use stepvm_core::{CompilationError, Value};

use crate::bytecode::{Instruction, Label, LabelTable, Tape, TapeEntry};
pub use jumps::{JumpManager, LoopContext};

/// Emits tape entries.
#[derive(Debug, Default)]
pub struct TapeEmitter {
    entries: Vec<TapeEntry>,
    labels: LabelTable,
    jumps: JumpManager,
    next_label: u32,
}

impl TapeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Instructions
    // ==========================================================================

    pub fn emit(&mut self, instruction: Instruction) {
        let (enclosing_end, enclosing_next) = match self.jumps.current() {
            Some(ctx) => (Some(ctx.end.clone()), Some(ctx.next.clone())),
            None => (None, None),
        };
        self.entries.push(TapeEntry {
            instruction,
            enclosing_end,
            enclosing_next,
        });
    }

    pub fn emit_const(&mut self, value: Value) {
        self.emit(Instruction::LoadConst(value));
    }

    pub fn emit_load(&mut self, name: &str) {
        self.emit(Instruction::LoadVar(name.to_string()));
    }

    pub fn emit_store(&mut self, name: &str) {
        self.emit(Instruction::StoreVar(name.to_string()));
    }

    pub fn emit_jump(&mut self, target: &Label) {
        self.emit(Instruction::Jump(target.clone()));
    }

    pub fn emit_jump_if_false(&mut self, target: &Label) {
        self.emit(Instruction::JumpIfFalse(target.clone()));
    }

    pub fn emit_yield(&mut self) {
        self.emit(Instruction::Yield);
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    /// A label name not handed out before, e.g. `else_3`.
    pub fn new_label(&mut self, kind: &str) -> Label {
        let label = Label::new(format!("{kind}_{}", self.next_label));
        self.next_label += 1;
        label
    }

    /// Emit a `LABEL` and record its address.
    pub fn place_label(&mut self, label: &Label) -> Result<(), CompilationError> {
        let address = self.entries.len();
        if !self.labels.define(label.clone(), address) {
            return Err(CompilationError::Internal {
                message: format!("label {label} placed twice"),
            });
        }
        self.emit(Instruction::Label(label.clone()));
        Ok(())
    }

    // ==========================================================================
    // Loop Control (Break/Continue)
    // ==========================================================================

    /// Enter a loop; entries emitted until [`exit_loop`](Self::exit_loop)
    /// carry these labels.
    pub fn enter_loop(&mut self, end: Label, next: Label) {
        self.jumps.enter_loop(end, next);
    }

    pub fn exit_loop(&mut self) {
        self.jumps.exit_loop();
    }

    pub fn emit_break(&mut self) -> Result<(), BreakError> {
        let target = self.jumps.break_target()?.clone();
        self.emit_jump(&target);
        Ok(())
    }

    pub fn emit_continue(&mut self) -> Result<(), BreakError> {
        let target = self.jumps.continue_target()?.clone();
        self.emit_jump(&target);
        Ok(())
    }

    pub fn in_loop(&self) -> bool {
        self.jumps.in_loop()
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Current tape length; the address of the next entry.
    pub fn code_size(&self) -> usize {
        self.entries.len()
    }

    pub fn finish(self) -> Result<Tape, CompilationError> {
        Tape::new(self.entries, self.labels)
    }
}

/// Error from break/continue statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakError {
    #[error("break statement not inside a loop")]
    BreakOutsideLoop,
    #[error("continue statement not inside a loop")]
    ContinueOutsideLoop,
}

impl From<BreakError> for CompilationError {
    fn from(err: BreakError) -> Self {
        let statement = match err {
            BreakError::BreakOutsideLoop => "break",
            BreakError::ContinueOutsideLoop => "continue",
        };
        CompilationError::BreakOutsideLoop { statement }
    }
}
