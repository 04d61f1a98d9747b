//! Constructor Synthesis Pass - give every class at least one constructor.
//!
//! A class (member and local classes included) that declares no constructor
//! receives the canonical `public Name() {}`. The pass only adds; running it
//! again finds a constructor everywhere and changes nothing.
//!
//! Interfaces are skipped.

use tracing::debug;

use stepvm_core::ast::{BodyDeclaration, CompilationUnit, MethodDeclaration, TypeDeclaration};
use stepvm_core::NodeId;

/// Output of the constructor synthesis pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorOutput {
    /// Classes visited, nested ones included.
    pub classes_visited: usize,
    /// Default constructors added.
    pub constructors_added: usize,
}

/// Constructor Synthesis Pass.
pub struct ConstructorPass<'a> {
    unit: &'a mut CompilationUnit,
}

impl<'a> ConstructorPass<'a> {
    pub fn new(unit: &'a mut CompilationUnit) -> Self {
        Self { unit }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> ConstructorOutput {
        let mut output = ConstructorOutput::default();
        for ty in &mut self.unit.types {
            complete_type(ty, &mut output);
        }
        if output.constructors_added > 0 {
            self.unit.assign_missing_ids();
        }
        debug!(
            classes = output.classes_visited,
            added = output.constructors_added,
            "constructor synthesis done"
        );
        output
    }
}

fn complete_type(ty: &mut TypeDeclaration, output: &mut ConstructorOutput) {
    output.classes_visited += 1;

    if !ty.interface && !ty.has_constructor() {
        let constructor = MethodDeclaration::default_constructor(ty.name(), NodeId::UNASSIGNED);
        // Ahead of the first method, after fields and member types.
        let at = ty
            .body_declarations
            .iter()
            .position(|decl| matches!(decl, BodyDeclaration::MethodDeclaration(_)))
            .unwrap_or(ty.body_declarations.len());
        ty.body_declarations
            .insert(at, BodyDeclaration::MethodDeclaration(constructor));
        output.constructors_added += 1;
    }

    for nested in ty.nested_types_mut() {
        complete_type(nested, output);
    }
}
