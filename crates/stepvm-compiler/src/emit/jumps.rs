//! Loop label tracking for break/continue.

use super::BreakError;
use crate::bytecode::Label;

/// Stack of enclosing loops, innermost last.
#[derive(Debug, Default)]
pub struct JumpManager {
    loops: Vec<LoopContext>,
}

/// Labels of one loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopContext {
    /// Placed after the loop; `break` jumps here.
    pub end: Label,
    /// Start of the next iteration; `continue` jumps here.
    pub next: Label,
}

impl JumpManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_loop(&mut self, end: Label, next: Label) {
        self.loops.push(LoopContext { end, next });
    }

    pub fn exit_loop(&mut self) -> Option<LoopContext> {
        self.loops.pop()
    }

    pub fn in_loop(&self) -> bool {
        !self.loops.is_empty()
    }

    pub fn current(&self) -> Option<&LoopContext> {
        self.loops.last()
    }

    pub fn break_target(&self) -> Result<&Label, BreakError> {
        self.current()
            .map(|ctx| &ctx.end)
            .ok_or(BreakError::BreakOutsideLoop)
    }

    pub fn continue_target(&self) -> Result<&Label, BreakError> {
        self.current()
            .map(|ctx| &ctx.next)
            .ok_or(BreakError::ContinueOutsideLoop)
    }

    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }
}
