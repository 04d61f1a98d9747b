//! Compile / step / reset driver.
//!
//! A [`Session`] owns at most one compiled program. Compiling replaces it
//! only on success; a failed compile leaves the previous program (and its
//! execution state) untouched.

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use stepvm_compiler::{Compilation, Compiler, Tape};
use stepvm_core::ast::CompilationUnit;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::vm::{Interpreter, Snapshot, StepOutcome};

/// Counters describing a successful compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileSummary {
    pub classes: usize,
    pub constructors_added: usize,
    pub super_calls_added: usize,
    pub resolution_rounds: usize,
    pub captures_added: usize,
    pub delegations_added: usize,
    pub instructions: usize,
    /// Yield points on the tape.
    pub statements: usize,
}

impl CompileSummary {
    fn of(compilation: &Compilation) -> Self {
        let report = &compilation.report;
        Self {
            classes: compilation.scopes.class_count(),
            constructors_added: report.constructors.constructors_added,
            super_calls_added: report.super_calls.super_calls_added,
            resolution_rounds: report.resolution_rounds,
            captures_added: report.captures.captures_added,
            delegations_added: report.overrides.delegations_added,
            instructions: compilation.tape.len(),
            statements: compilation.tape.yield_count(),
        }
    }
}

#[derive(Debug)]
struct Program {
    unit: CompilationUnit,
    interpreter: Interpreter,
    summary: CompileSummary,
}

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    compiler: Compiler,
    program: Option<Program>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let compiler = Compiler::new(config.pipeline_options());
        Self {
            config,
            compiler,
            program: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Decode a JSON AST and compile it.
    pub fn compile(&mut self, source: &str) -> Result<CompileSummary> {
        let unit = CompilationUnit::from_json(source)?;
        self.compile_unit(unit)
    }

    /// Desugar and compile an already decoded unit.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_unit(&mut self, mut unit: CompilationUnit) -> Result<CompileSummary> {
        let _span = info_span!("compile", types = unit.types.len()).entered();

        let compilation = self.compiler.compile(&mut unit)?;
        let summary = CompileSummary::of(&compilation);
        let interpreter = Interpreter::new(compilation.tape)
            .with_root_frame(self.config.root_frame.clone())
            .with_step_budget(self.config.max_instructions_per_step);

        info!(
            instructions = summary.instructions,
            statements = summary.statements,
            "program loaded"
        );
        self.program = Some(Program {
            unit,
            interpreter,
            summary: summary.clone(),
        });
        Ok(summary)
    }

    pub fn is_loaded(&self) -> bool {
        self.program.is_some()
    }

    /// Execute one statement of the loaded program.
    ///
    /// A runtime fault resets the program; the next call starts over.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let program = self.program.as_mut().ok_or(SessionError::NoProgram)?;
        Ok(program.interpreter.step()?)
    }

    /// Step until the program finishes, returning the last snapshot.
    ///
    /// Gives up with [`SessionError::RunLimitExceeded`] once more statements
    /// than `maxStepsPerRun` complete; the program stays paused where it
    /// stopped.
    pub fn run(&mut self) -> Result<Snapshot> {
        let limit = self.config.max_steps_per_run;
        let mut steps = 0usize;
        loop {
            match self.step()? {
                StepOutcome::Finished => return self.snapshot(),
                StepOutcome::Yielded(_) if limit.is_some_and(|limit| steps >= limit) => {
                    warn!(steps, "run stopped before the program finished");
                    return Err(SessionError::RunLimitExceeded { steps });
                }
                StepOutcome::Yielded(_) => steps += 1,
            }
        }
    }

    /// Rewind the loaded program to its first instruction.
    pub fn reset(&mut self) -> Result<()> {
        let program = self.program.as_mut().ok_or(SessionError::NoProgram)?;
        program.interpreter.reset();
        debug!("program reset");
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        self.program
            .as_ref()
            .map(|program| program.interpreter.snapshot())
            .ok_or(SessionError::NoProgram)
    }

    /// The unit as rewritten by the desugaring passes.
    pub fn desugared(&self) -> Option<&CompilationUnit> {
        self.program.as_ref().map(|program| &program.unit)
    }

    pub fn tape(&self) -> Option<&Tape> {
        self.program.as_ref().map(|program| program.interpreter.tape())
    }

    pub fn summary(&self) -> Option<&CompileSummary> {
        self.program.as_ref().map(|program| &program.summary)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
