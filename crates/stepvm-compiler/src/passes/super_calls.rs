//! Super Call Synthesis Pass - make the super-constructor call explicit.
//!
//! Every constructor must start with `super(...)`. Constructors that start
//! with anything else get an argument-less `super()` prepended; the rest of
//! the body is left in order.
//!
//! Runs after constructor synthesis so synthesized constructors are covered.

use tracing::{debug, warn};

use stepvm_core::ast::{Block, CompilationUnit, Stmt, TypeDeclaration};

/// Output of the super call synthesis pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuperCallOutput {
    pub constructors_visited: usize,
    pub super_calls_added: usize,
}

/// Super Call Synthesis Pass.
pub struct SuperCallPass<'a> {
    unit: &'a mut CompilationUnit,
}

impl<'a> SuperCallPass<'a> {
    pub fn new(unit: &'a mut CompilationUnit) -> Self {
        Self { unit }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> SuperCallOutput {
        let mut output = SuperCallOutput::default();
        for ty in &mut self.unit.types {
            visit_type(ty, &mut output);
        }
        debug!(
            constructors = output.constructors_visited,
            added = output.super_calls_added,
            "super call synthesis done"
        );
        output
    }
}

fn visit_type(ty: &mut TypeDeclaration, output: &mut SuperCallOutput) {
    let class_name = ty.name().to_string();
    for ctor in ty.constructors_mut() {
        output.constructors_visited += 1;
        let body = ctor.body.get_or_insert_with(Block::default);

        if body.statements.iter().skip(1).any(Stmt::is_super_call) {
            warn!(class = %class_name, "super constructor call is not the first statement");
        }

        if !body.statements.first().is_some_and(Stmt::is_super_call) {
            body.statements.insert(0, Stmt::super_call());
            output.super_calls_added += 1;
        }
    }

    for nested in ty.nested_types_mut() {
        visit_type(nested, output);
    }
}
