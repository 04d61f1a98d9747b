//! Bytecode compiler.
//!
//! The [`BytecodeCompiler`] lowers a desugared compilation unit to a single
//! flat [`Tape`]. Field initializers and method bodies of every top-level
//! class are laid out inline in declaration order; member classes, local
//! classes and delegations contribute no code. A `YIELD` follows every
//! statement of a block that produced code, so one interpreter step runs one
//! statement.
//!
//! Operands are evaluated right before left: after both are pushed the left
//! operand sits on top of the stack, which is what `BINARY_OP` pops first.
//!
//! ```text
//! 3 + (4 * 5);      LOAD_CONST 5
//!                   LOAD_CONST 4
//!                   BINARY_OP *
//!                   LOAD_CONST 3
//!                   BINARY_OP +
//!                   YIELD
//! ```

mod expr;
mod stmt;

use tracing::debug;

use stepvm_core::ast::{
    BodyDeclaration, CompilationUnit, FieldDeclaration, MethodDeclaration, Type, TypeDeclaration,
};
use stepvm_core::{CompilationError, Value};

use crate::bytecode::{Label, Tape};
use crate::emit::TapeEmitter;

type Result<T> = std::result::Result<T, CompilationError>;

/// Compiles a compilation unit to a tape.
#[derive(Debug, Default)]
pub struct BytecodeCompiler {
    emitter: TapeEmitter,
    /// Jump target of `return` in the current method, created on first use.
    method_end: Option<Label>,
    /// `Class.method` being compiled, for diagnostics.
    context: String,
}

impl BytecodeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every top-level class of the unit.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(unit: &CompilationUnit) -> Result<Tape> {
        let mut compiler = Self::new();
        for ty in &unit.types {
            compiler.compile_type(ty)?;
        }
        let tape = compiler.emitter.finish()?;
        debug!(
            instructions = tape.len(),
            labels = tape.labels().len(),
            statements = tape.yield_count(),
            "bytecode emitted"
        );
        Ok(tape)
    }

    fn compile_type(&mut self, ty: &TypeDeclaration) -> Result<()> {
        for decl in &ty.body_declarations {
            match decl {
                BodyDeclaration::FieldDeclaration(field) => {
                    self.context = ty.name().to_string();
                    self.compile_field(field)?;
                }
                BodyDeclaration::MethodDeclaration(method) => {
                    self.compile_method(ty.name(), method)?
                }
                // Not executed inline.
                BodyDeclaration::TypeDeclaration(_) | BodyDeclaration::Delegation(_) => {}
            }
        }
        Ok(())
    }

    /// Initialized fields store their initializer; primitive fields without
    /// one store the type's default. Each stored fragment is one statement.
    fn compile_field(&mut self, field: &FieldDeclaration) -> Result<()> {
        for fragment in &field.fragments {
            let name = fragment.name.as_str();
            match &fragment.initializer {
                Some(init) => {
                    self.compile_expr(init)?;
                    self.emitter.emit_store(name);
                    self.emitter.emit_yield();
                }
                None => {
                    let default = match &field.ty {
                        Type::PrimitiveType {
                            primitive_type_code,
                        } => Value::default_for(primitive_type_code),
                        _ => None,
                    };
                    if let Some(value) = default {
                        self.emitter.emit_const(value);
                        self.emitter.emit_store(name);
                        self.emitter.emit_yield();
                    }
                }
            }
        }
        Ok(())
    }

    fn compile_method(&mut self, class_name: &str, method: &MethodDeclaration) -> Result<()> {
        let Some(body) = &method.body else {
            return Ok(());
        };
        self.context = format!("{class_name}.{}", method.name());
        self.method_end = None;

        self.compile_block(body)?;

        if let Some(end) = self.method_end.take() {
            self.emitter.place_label(&end)?;
        }
        Ok(())
    }

    fn return_target(&mut self) -> Label {
        if let Some(label) = &self.method_end {
            return label.clone();
        }
        let label = self.emitter.new_label("return");
        self.method_end = Some(label.clone());
        label
    }
}
