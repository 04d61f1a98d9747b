//! stepvm compiler
//!
//! Desugars a Java-like AST and lowers it to a flat instruction tape.
//!
//! ## Architecture
//!
//! - **Pass 1 (Constructors)**: every class gets a constructor
//! - **Pass 2 (Super calls)**: every constructor starts with `super()`
//! - **Pass 3 (Scopes)**: scope tree with resolved superclass links
//! - **Pass 4 (Captures)**: free variables of local classes become capture records
//! - **Pass 5 (Overrides)**: inherited methods become delegations
//! - **Code generation**: the desugared unit is compiled to a [`Tape`]
//!
//! ## Modules
//!
//! - [`bytecode`]: Instruction set and tape
//! - [`compile`]: Statement and expression compiler
//! - [`emit`]: Tape emitter with label and loop tracking
//! - [`passes`]: Desugaring passes
//! - [`scope`]: Scope tree and its builder
//!
//! # Example
//!
//! ```
//! use stepvm_compiler::{Compiler, PipelineOptions};
//! use stepvm_core::ast::CompilationUnit;
//!
//! let mut unit = CompilationUnit::from_json(r#"{
//!     "node": "CompilationUnit",
//!     "types": [{
//!         "node": "TypeDeclaration",
//!         "name": { "node": "SimpleName", "identifier": "Main" },
//!         "bodyDeclarations": []
//!     }]
//! }"#).unwrap();
//!
//! let compilation = Compiler::new(PipelineOptions::default()).compile(&mut unit).unwrap();
//! assert_eq!(compilation.report.constructors.constructors_added, 1);
//! assert!(compilation.tape.is_empty());
//! ```

pub mod bytecode;
pub mod compile;
pub mod emit;
pub mod passes;
pub mod scope;

#[cfg(test)]
mod test_support;

pub use bytecode::{BinaryOperator, Instruction, Label, LabelTable, Tape, TapeEntry, UnaryOperator};
pub use compile::BytecodeCompiler;
pub use emit::{BreakError, TapeEmitter};
pub use passes::{
    CaptureOutput, CapturePass, ConstructorOutput, ConstructorPass, OverrideOutput, OverridePass,
    SuperCallOutput, SuperCallPass,
};
pub use scope::{ScopeBuilder, ScopeTree};

// Re-export CompilationError from core for convenience
pub use stepvm_core::CompilationError;

use stepvm_core::ast::CompilationUnit;
use tracing::info;

/// Knobs for the desugaring pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Ceiling on superclass resolution rounds; `None` relies on the
    /// no-progress check alone.
    pub max_resolution_rounds: Option<usize>,
}

/// What each desugaring pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesugarReport {
    pub constructors: ConstructorOutput,
    pub super_calls: SuperCallOutput,
    pub resolution_rounds: usize,
    pub captures: CaptureOutput,
    pub overrides: OverrideOutput,
}

/// Result of a full compile.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub tape: Tape,
    pub scopes: ScopeTree,
    pub report: DesugarReport,
}

/// Runs the passes in order and then the bytecode compiler.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: PipelineOptions,
}

impl Compiler {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run passes 1-5, rewriting `unit` in place.
    ///
    /// Stops at the first error; the unit may then be partially desugared.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn desugar(
        &self,
        unit: &mut CompilationUnit,
    ) -> Result<(ScopeTree, DesugarReport), CompilationError> {
        let constructors = ConstructorPass::new(unit).run();
        let super_calls = SuperCallPass::new(unit).run();
        let scopes = ScopeBuilder::new()
            .with_max_rounds(self.options.max_resolution_rounds)
            .build(unit)?;
        let captures = CapturePass::new(unit, &scopes).run()?;
        let overrides = OverridePass::new(unit, &scopes).run()?;

        let report = DesugarReport {
            constructors,
            super_calls,
            resolution_rounds: scopes.resolution_rounds(),
            captures,
            overrides,
        };
        Ok((scopes, report))
    }

    /// Desugar `unit` and compile it to a tape.
    pub fn compile(&self, unit: &mut CompilationUnit) -> Result<Compilation, CompilationError> {
        let (scopes, report) = self.desugar(unit)?;
        let tape = BytecodeCompiler::compile(unit)?;
        info!(
            classes = scopes.class_count(),
            instructions = tape.len(),
            delegations = report.overrides.delegations_added,
            captures = report.captures.captures_added,
            "compilation finished"
        );
        Ok(Compilation {
            tape,
            scopes,
            report,
        })
    }
}
