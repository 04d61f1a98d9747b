//! Single-step stack machine.
//!
//! The [`Interpreter`] executes a [`Tape`] one statement at a time: each call
//! to [`step`](Interpreter::step) runs instructions until the next `YIELD`
//! (or the end of the tape) and reports a [`Snapshot`] of the frames.
//!
//! A fault discards all execution state and rewinds to the start of the
//! tape, so the next step begins a fresh run.

mod frame;
mod ops;

pub use frame::{Frame, FrameSnapshot, Snapshot};

use tracing::{debug, trace, warn};

use stepvm_compiler::{Instruction, Label, LabelTable, Tape};
use stepvm_core::{RuntimeError, Value};

/// Result of one [`Interpreter::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A statement completed.
    Yielded(Snapshot),
    /// The tape is exhausted.
    Finished,
}

/// Mutable execution state, kept apart from the tape it runs.
#[derive(Debug, Clone)]
struct Machine {
    pc: usize,
    stack: Vec<Value>,
    frames: Vec<Frame>,
}

enum Control {
    Continue,
    Yield(Option<Value>),
}

impl Machine {
    fn new(root_frame: &str) -> Self {
        Self {
            pc: 0,
            stack: Vec::new(),
            frames: vec![Frame::new(root_frame)],
        }
    }

    fn pop(&mut self, pc: usize) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow { pc })
    }

    /// Innermost binding of `name`.
    fn lookup(&self, name: &str) -> Option<Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    fn frame_mut(&mut self) -> &mut Frame {
        // The root frame is never popped.
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    fn jump(
        &mut self,
        label: &Label,
        labels: &LabelTable,
        pc: usize,
    ) -> Result<(), RuntimeError> {
        self.pc = labels
            .address(label)
            .ok_or_else(|| RuntimeError::UndefinedLabel {
                label: label.to_string(),
                pc,
            })?;
        Ok(())
    }

    /// Execute the instruction at `pc`; `self.pc` already points past it.
    fn execute(
        &mut self,
        instruction: &Instruction,
        labels: &LabelTable,
        pc: usize,
    ) -> Result<Control, RuntimeError> {
        match instruction {
            Instruction::LoadVar(name) => {
                let value = self
                    .lookup(name)
                    .ok_or_else(|| RuntimeError::UnresolvedSymbol {
                        name: name.clone(),
                        pc,
                    })?;
                self.stack.push(value);
            }
            Instruction::LoadConst(value) => self.stack.push(*value),
            Instruction::StoreVar(name) => {
                let value = self.pop(pc)?;
                self.frame_mut().set(name, value);
            }
            Instruction::BinaryOp(op) => {
                let left = self.pop(pc)?;
                let right = self.pop(pc)?;
                self.stack.push(ops::binary(*op, left, right, pc)?);
            }
            Instruction::UnaryOp { op, prefix, target } => {
                let operand = self.pop(pc)?;
                let result = ops::unary(*op, operand, pc)?;
                match target {
                    Some(name) => {
                        self.frame_mut().set(name, result);
                        self.stack.push(if *prefix { result } else { operand });
                    }
                    None => self.stack.push(result),
                }
            }
            Instruction::Jump(label) => self.jump(label, labels, pc)?,
            Instruction::JumpIfFalse(label) => {
                let condition = self.pop(pc)?;
                let Some(condition) = condition.as_bool() else {
                    return Err(RuntimeError::TypeMismatch {
                        op: "JUMP_IF_FALSE".to_string(),
                        operands: condition.type_name().to_string(),
                        pc,
                    });
                };
                if !condition {
                    self.jump(label, labels, pc)?;
                }
            }
            Instruction::Label(_) => {}
            Instruction::Yield => {
                let value = self.stack.last().copied();
                self.stack.clear();
                return Ok(Control::Yield(value));
            }
        }
        Ok(Control::Continue)
    }

    fn snapshot(&self, value: Option<Value>) -> Snapshot {
        Snapshot {
            pc: self.pc,
            frames: self.frames.iter().map(Frame::snapshot).collect(),
            value,
        }
    }
}

/// Runs a tape statement by statement.
#[derive(Debug, Clone)]
pub struct Interpreter {
    tape: Tape,
    machine: Machine,
    root_frame: String,
    step_budget: Option<usize>,
    last_value: Option<Value>,
    statements: usize,
}

impl Interpreter {
    pub fn new(tape: Tape) -> Self {
        let root_frame = "main".to_string();
        Self {
            tape,
            machine: Machine::new(&root_frame),
            root_frame,
            step_budget: None,
            last_value: None,
            statements: 0,
        }
    }

    /// Name of the frame bindings are stored in.
    pub fn with_root_frame(mut self, name: impl Into<String>) -> Self {
        self.root_frame = name.into();
        self.machine = Machine::new(&self.root_frame);
        self
    }

    /// Maximum instructions a single step may execute.
    pub fn with_step_budget(mut self, limit: Option<usize>) -> Self {
        self.step_budget = limit;
        self
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn pc(&self) -> usize {
        self.machine.pc
    }

    pub fn is_finished(&self) -> bool {
        self.machine.pc >= self.tape.len()
    }

    /// Statements completed since the last reset.
    pub fn statements_completed(&self) -> usize {
        self.statements
    }

    /// Current frames, as of the last completed instruction.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot(self.last_value)
    }

    /// Run until the next statement boundary.
    ///
    /// On error the machine is reset before the error is returned.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn step(&mut self) -> Result<StepOutcome, RuntimeError> {
        match self.run_to_yield() {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(error = %err, "runtime fault, resetting machine");
                self.reset();
                Err(err)
            }
        }
    }

    /// Discard execution state and rewind to the first instruction.
    pub fn reset(&mut self) {
        self.machine = Machine::new(&self.root_frame);
        self.last_value = None;
        self.statements = 0;
    }

    fn run_to_yield(&mut self) -> Result<StepOutcome, RuntimeError> {
        let mut executed = 0usize;
        while let Some(entry) = self.tape.get(self.machine.pc) {
            if let Some(limit) = self.step_budget {
                if executed >= limit {
                    return Err(RuntimeError::StepBudgetExceeded { limit });
                }
            }
            executed += 1;

            let pc = self.machine.pc;
            self.machine.pc += 1;
            trace!(pc, instruction = %entry.instruction, "execute");

            if let Control::Yield(value) =
                self.machine
                    .execute(&entry.instruction, self.tape.labels(), pc)?
            {
                self.last_value = value;
                self.statements += 1;
                debug!(pc, statements = self.statements, "statement completed");
                return Ok(StepOutcome::Yielded(self.machine.snapshot(value)));
            }
        }
        Ok(StepOutcome::Finished)
    }
}
