//! Override Synthesis Pass - materialize inherited methods as delegations.
//!
//! For every class with a resolved superclass, each non-private, non-constructor
//! method found anywhere on the superclass chain that the class does not
//! already declare with the exact same signature (name, return type, ordered
//! parameter types) gets a [`Delegation`] in the class body. Delegations keep
//! the inherited visibility and name the class that declares the method.
//!
//! The nearest ancestor wins when several declare the same signature.
//!
//! ## Example
//!
//! ```text
//! class A { public int size(); private void secret(); }
//! class B extends A { }
//!
//! After synthesis:
//! - B: delegation size() -> A (secret() is private, not delegated)
//! ```

use tracing::debug;

use stepvm_core::ast::{
    BodyDeclaration, CompilationUnit, Delegation, Modifier, SimpleName, TypeDeclaration,
    Visibility,
};
use stepvm_core::CompilationError;

use crate::scope::{MethodSignature, ScopeTree};

/// Output of the override synthesis pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OverrideOutput {
    /// Classes with a resolved superclass.
    pub subclasses_visited: usize,
    pub delegations_added: usize,
}

/// Override Synthesis Pass.
pub struct OverridePass<'a> {
    unit: &'a mut CompilationUnit,
    scopes: &'a ScopeTree,
}

impl<'a> OverridePass<'a> {
    pub fn new(unit: &'a mut CompilationUnit, scopes: &'a ScopeTree) -> Self {
        Self { unit, scopes }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> Result<OverrideOutput, CompilationError> {
        let mut output = OverrideOutput::default();
        for ty in &mut self.unit.types {
            visit_type(ty, self.scopes, &mut output)?;
        }
        debug!(
            subclasses = output.subclasses_visited,
            added = output.delegations_added,
            "override synthesis done"
        );
        Ok(output)
    }
}

fn visit_type(
    ty: &mut TypeDeclaration,
    scopes: &ScopeTree,
    output: &mut OverrideOutput,
) -> Result<(), CompilationError> {
    let class_scope = scopes
        .scope_for(ty.id)
        .ok_or_else(|| CompilationError::Internal {
            message: format!("no scope recorded for class {}", ty.name()),
        })?;

    if scopes.superclass(class_scope).is_some() {
        output.subclasses_visited += 1;

        let mut declared: Vec<MethodSignature> = own_signatures(ty);
        let mut added = Vec::new();
        for ancestor in scopes.superclass_chain(class_scope) {
            let scope = scopes.get(ancestor);
            let Some(class) = scope.as_class() else {
                continue;
            };
            for inherited in &class.methods {
                if inherited.is_constructor || inherited.visibility == Visibility::Private {
                    continue;
                }
                if declared.iter().any(|own| own.same_signature(inherited)) {
                    continue;
                }
                declared.push(inherited.clone());
                added.push(delegation(inherited, &scope.name));
            }
        }

        output.delegations_added += added.len();
        ty.body_declarations
            .extend(added.into_iter().map(BodyDeclaration::Delegation));
    }

    for nested in ty.nested_types_mut() {
        visit_type(nested, scopes, output)?;
    }
    Ok(())
}

/// Signatures the class already provides, delegations included.
fn own_signatures(ty: &TypeDeclaration) -> Vec<MethodSignature> {
    ty.body_declarations
        .iter()
        .filter_map(|decl| match decl {
            BodyDeclaration::MethodDeclaration(method) if !method.constructor => {
                Some(MethodSignature::of(method))
            }
            BodyDeclaration::Delegation(existing) => Some(MethodSignature {
                name: existing.name().to_string(),
                visibility: Visibility::Package,
                return_type: existing.return_type2.clone(),
                parameter_types: existing.parameter_types.clone(),
                is_constructor: false,
            }),
            _ => None,
        })
        .collect()
}

fn delegation(inherited: &MethodSignature, declaring_class: &str) -> Delegation {
    Delegation {
        modifiers: inherited
            .visibility
            .keyword()
            .map(Modifier::keyword)
            .into_iter()
            .collect(),
        name: SimpleName::new(inherited.name.as_str()),
        return_type2: inherited.return_type.clone(),
        parameter_types: inherited.parameter_types.clone(),
        declaring_class: declaring_class.to_string(),
    }
}
