//! Capture Analysis Pass - find free variables of local classes.
//!
//! Every name read inside a method body (or a field initializer) is resolved
//! by walking the scope tree outward from the scope containing the read. If
//! the name is found as a local of an *enclosing* method, every class scope
//! crossed on the way captures it:
//!
//! - the variable's declaration is marked effectively final
//! - each crossed class gets a [`Capture`](stepvm_core::ast::Capture) record
//!   in every one of its constructors, once per name
//!
//! Names found as fields (including inherited ones) need no capture. A name
//! no scope declares is an error.
//!
//! The pass runs in two phases: an immutable analysis over the AST and the
//! [`ScopeTree`] produces a plan keyed by [`NodeId`], then a mutation walk
//! applies it.
//!
//! ```text
//! class Outer {
//!     void run() {
//!         int x = 1;            // marked effectively final
//!         class Local {
//!             Local() { super(); capture(x); }
//!             int get() { return x; }
//!         }
//!     }
//! }
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use stepvm_core::ast::{
    Block, BodyDeclaration, CompilationUnit, Expr, MethodDeclaration, Stmt, TypeDeclaration,
    VariableDeclarationFragment,
};
use stepvm_core::{CompilationError, NodeId};

use crate::scope::{Binding, ScopeId, ScopeKind, ScopeTree};

/// Output of the capture analysis pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutput {
    /// Name reads resolved.
    pub names_resolved: usize,
    /// Capture records added to constructors.
    pub captures_added: usize,
    /// Declarations newly marked effectively final.
    pub variables_finalized: usize,
}

#[derive(Debug, Default)]
struct CapturePlan {
    /// Class node -> captured names, in first-use order.
    captures: FxHashMap<NodeId, Vec<String>>,
    /// Method node -> names declared there that some class captures.
    finals: FxHashMap<NodeId, FxHashSet<String>>,
    reads: usize,
}

/// Capture Analysis Pass.
pub struct CapturePass<'a> {
    unit: &'a mut CompilationUnit,
    scopes: &'a ScopeTree,
}

impl<'a> CapturePass<'a> {
    pub fn new(unit: &'a mut CompilationUnit, scopes: &'a ScopeTree) -> Self {
        Self { unit, scopes }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> Result<CaptureOutput, CompilationError> {
        let mut analyzer = Analyzer {
            scopes: self.scopes,
            plan: CapturePlan::default(),
        };
        for ty in &self.unit.types {
            analyzer.visit_type(ty)?;
        }
        let plan = analyzer.plan;

        let mut output = CaptureOutput {
            names_resolved: plan.reads,
            ..CaptureOutput::default()
        };
        for ty in &mut self.unit.types {
            apply_type(ty, &plan, &mut output);
        }

        debug!(
            reads = output.names_resolved,
            captures = output.captures_added,
            finalized = output.variables_finalized,
            "capture analysis done"
        );
        Ok(output)
    }
}

// ============================================================================
// Analysis
// ============================================================================

struct Analyzer<'a> {
    scopes: &'a ScopeTree,
    plan: CapturePlan,
}

impl Analyzer<'_> {
    fn scope_of(&self, node: NodeId, what: &str) -> Result<ScopeId, CompilationError> {
        self.scopes
            .scope_for(node)
            .ok_or_else(|| CompilationError::Internal {
                message: format!("no scope recorded for {what} {node}"),
            })
    }

    fn visit_type(&mut self, ty: &TypeDeclaration) -> Result<(), CompilationError> {
        let class_scope = self.scope_of(ty.id, ty.name())?;
        for decl in &ty.body_declarations {
            match decl {
                BodyDeclaration::FieldDeclaration(field) => {
                    for fragment in &field.fragments {
                        if let Some(init) = &fragment.initializer {
                            self.visit_expr(init, class_scope)?;
                        }
                    }
                }
                BodyDeclaration::MethodDeclaration(method) => self.visit_method(method)?,
                BodyDeclaration::TypeDeclaration(member) => self.visit_type(member)?,
                BodyDeclaration::Delegation(_) => {}
            }
        }
        Ok(())
    }

    fn visit_method(&mut self, method: &MethodDeclaration) -> Result<(), CompilationError> {
        let scope = self.scope_of(method.id, method.name())?;
        for stmt in method.statements() {
            self.visit_stmt(stmt, scope)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<(), CompilationError> {
        match stmt {
            Stmt::Block(block) => {
                for stmt in &block.statements {
                    self.visit_stmt(stmt, scope)?;
                }
            }
            Stmt::VariableDeclarationStatement(decl) => {
                for fragment in &decl.fragments {
                    if let Some(init) = &fragment.initializer {
                        self.visit_expr(init, scope)?;
                    }
                }
            }
            Stmt::ExpressionStatement(stmt) => self.visit_expr(&stmt.expression, scope)?,
            Stmt::IfStatement(stmt) => {
                self.visit_expr(&stmt.expression, scope)?;
                self.visit_stmt(&stmt.then_statement, scope)?;
                if let Some(else_stmt) = &stmt.else_statement {
                    self.visit_stmt(else_stmt, scope)?;
                }
            }
            Stmt::ForStatement(stmt) => {
                for init in &stmt.initializers {
                    self.visit_expr(init, scope)?;
                }
                if let Some(cond) = &stmt.expression {
                    self.visit_expr(cond, scope)?;
                }
                for update in &stmt.updaters {
                    self.visit_expr(update, scope)?;
                }
                self.visit_stmt(&stmt.body, scope)?;
            }
            Stmt::WhileStatement(stmt) => {
                self.visit_expr(&stmt.expression, scope)?;
                self.visit_stmt(&stmt.body, scope)?;
            }
            Stmt::ReturnStatement(stmt) => {
                if let Some(expr) = &stmt.expression {
                    self.visit_expr(expr, scope)?;
                }
            }
            Stmt::SuperConstructorInvocation(call) => {
                for arg in &call.arguments {
                    self.visit_expr(arg, scope)?;
                }
            }
            Stmt::TypeDeclarationStatement(local) => self.visit_type(&local.declaration)?,
            Stmt::BreakStatement(_)
            | Stmt::ContinueStatement(_)
            | Stmt::EmptyStatement(_)
            | Stmt::Capture(_) => {}
        }
        Ok(())
    }

    fn visit_expr(&mut self, expr: &Expr, scope: ScopeId) -> Result<(), CompilationError> {
        match expr {
            Expr::SimpleName(name) => self.resolve(name.as_str(), scope)?,
            Expr::InfixExpression(infix) => {
                self.visit_expr(&infix.left_operand, scope)?;
                self.visit_expr(&infix.right_operand, scope)?;
                for operand in &infix.extended_operands {
                    self.visit_expr(operand, scope)?;
                }
            }
            Expr::PrefixExpression(prefix) => self.visit_expr(&prefix.operand, scope)?,
            Expr::PostfixExpression(postfix) => self.visit_expr(&postfix.operand, scope)?,
            Expr::Assignment(assign) => {
                // Plain `=` only writes its target; compound forms read it too.
                let plain_target =
                    assign.operator == "=" && matches!(*assign.left_hand_side, Expr::SimpleName(_));
                if !plain_target {
                    self.visit_expr(&assign.left_hand_side, scope)?;
                }
                self.visit_expr(&assign.right_hand_side, scope)?;
            }
            Expr::ParenthesizedExpression(paren) => self.visit_expr(&paren.expression, scope)?,
            Expr::VariableDeclarationExpression(decl) => {
                for fragment in &decl.fragments {
                    if let Some(init) = &fragment.initializer {
                        self.visit_expr(init, scope)?;
                    }
                }
            }
            // `this.f` names a member, only the qualifier is a read.
            Expr::FieldAccess(access) => self.visit_expr(&access.expression, scope)?,
            Expr::NumberLiteral(_) | Expr::BooleanLiteral(_) | Expr::ThisExpression(_) => {}
        }
        Ok(())
    }

    fn resolve(&mut self, name: &str, from: ScopeId) -> Result<(), CompilationError> {
        self.plan.reads += 1;

        let mut crossed: Vec<NodeId> = Vec::new();
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scopes.get(id);
            match self.scopes.binding_in(id, name) {
                Some(Binding::Field { .. }) => return Ok(()),
                Some(Binding::Variable) => {
                    if !crossed.is_empty() {
                        self.record_capture(name, &crossed, scope.node);
                    }
                    return Ok(());
                }
                None => {}
            }
            if let (ScopeKind::Class(_), Some(node)) = (&scope.kind, scope.node) {
                crossed.push(node);
            }
            cursor = scope.parent;
        }

        Err(CompilationError::UnresolvedSymbol {
            name: name.to_string(),
            scope: self.scopes.path(from),
        })
    }

    fn record_capture(&mut self, name: &str, crossed: &[NodeId], declaring_method: Option<NodeId>) {
        for class in crossed {
            let names = self.plan.captures.entry(*class).or_default();
            if !names.iter().any(|captured| captured == name) {
                names.push(name.to_string());
            }
        }
        if let Some(method) = declaring_method {
            self.plan
                .finals
                .entry(method)
                .or_default()
                .insert(name.to_string());
        }
    }
}

// ============================================================================
// Application
// ============================================================================

fn apply_type(ty: &mut TypeDeclaration, plan: &CapturePlan, output: &mut CaptureOutput) {
    if let Some(names) = plan.captures.get(&ty.id) {
        for ctor in ty.constructors_mut() {
            let body = ctor.body.get_or_insert_with(Block::default);
            for name in names {
                let present = body
                    .statements
                    .iter()
                    .any(|stmt| matches!(stmt, Stmt::Capture(c) if c.variable == *name));
                if present {
                    continue;
                }
                // After the super call and earlier captures.
                let at = body
                    .statements
                    .iter()
                    .take_while(|stmt| {
                        matches!(stmt, Stmt::SuperConstructorInvocation(_) | Stmt::Capture(_))
                    })
                    .count();
                body.statements.insert(at, Stmt::capture(name.as_str()));
                output.captures_added += 1;
            }
        }
    }

    for decl in &mut ty.body_declarations {
        if let BodyDeclaration::MethodDeclaration(method) = decl {
            if let Some(names) = plan.finals.get(&method.id) {
                finalize_method(method, names, output);
            }
        }
    }

    for nested in ty.nested_types_mut() {
        apply_type(nested, plan, output);
    }
}

fn finalize_method(
    method: &mut MethodDeclaration,
    names: &FxHashSet<String>,
    output: &mut CaptureOutput,
) {
    for param in &mut method.parameters {
        if names.contains(param.name.as_str()) && !param.effectively_final {
            param.effectively_final = true;
            output.variables_finalized += 1;
        }
    }
    if let Some(body) = &mut method.body {
        for stmt in &mut body.statements {
            finalize_stmt(stmt, names, output);
        }
    }
}

fn mark_fragments(
    fragments: &mut [VariableDeclarationFragment],
    names: &FxHashSet<String>,
    output: &mut CaptureOutput,
) {
    for fragment in fragments {
        if names.contains(fragment.name.as_str()) && !fragment.effectively_final {
            fragment.effectively_final = true;
            output.variables_finalized += 1;
        }
    }
}

fn finalize_stmt(stmt: &mut Stmt, names: &FxHashSet<String>, output: &mut CaptureOutput) {
    match stmt {
        Stmt::VariableDeclarationStatement(decl) => mark_fragments(&mut decl.fragments, names, output),
        Stmt::ForStatement(stmt) => {
            for init in &mut stmt.initializers {
                if let Expr::VariableDeclarationExpression(decl) = init {
                    mark_fragments(&mut decl.fragments, names, output);
                }
            }
            finalize_stmt(&mut stmt.body, names, output);
        }
        Stmt::Block(block) => {
            for stmt in &mut block.statements {
                finalize_stmt(stmt, names, output);
            }
        }
        Stmt::IfStatement(stmt) => {
            finalize_stmt(&mut stmt.then_statement, names, output);
            if let Some(else_stmt) = &mut stmt.else_statement {
                finalize_stmt(else_stmt, names, output);
            }
        }
        Stmt::WhileStatement(stmt) => finalize_stmt(&mut stmt.body, names, output),
        // Declarations inside local classes belong to their own methods.
        Stmt::TypeDeclarationStatement(_)
        | Stmt::ExpressionStatement(_)
        | Stmt::BreakStatement(_)
        | Stmt::ContinueStatement(_)
        | Stmt::ReturnStatement(_)
        | Stmt::EmptyStatement(_)
        | Stmt::SuperConstructorInvocation(_)
        | Stmt::Capture(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{ConstructorPass, SuperCallPass};
    use crate::scope::ScopeBuilder;
    use crate::test_support::*;

    fn analyze(mut unit: CompilationUnit) -> Result<(CompilationUnit, CaptureOutput), CompilationError> {
        ConstructorPass::new(&mut unit).run();
        SuperCallPass::new(&mut unit).run();
        let scopes = ScopeBuilder::new().build(&unit)?;
        let output = CapturePass::new(&mut unit, &scopes).run()?;
        Ok((unit, output))
    }

    fn captures_of(unit: &CompilationUnit, class_name: &str) -> Vec<Vec<String>> {
        find_type(unit, class_name)
            .constructors()
            .map(|ctor| {
                ctor.statements()
                    .iter()
                    .filter_map(|stmt| match stmt {
                        Stmt::Capture(c) => Some(c.variable.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    /// `class Outer { void run() { int x = 1; int y = 2; class Local { int get() { return x + x; } } } }`
    fn local_reading_x() -> CompilationUnit {
        unit(vec![class(
            "Outer",
            None,
            vec![method(
                "run",
                vec![],
                vec![
                    local("x", "int", Some(num("1"))),
                    local("y", "int", Some(num("2"))),
                    local_class(class(
                        "Local",
                        None,
                        vec![typed_method(
                            Some("public"),
                            "int",
                            "get",
                            vec![],
                            vec![return_stmt(Some(infix("+", name("x"), name("x"))))],
                        )],
                    )),
                ],
            )],
        )])
    }

    fn fragment_is_final(unit: &CompilationUnit, method_name: &str, var: &str) -> bool {
        let outer = &unit.types[0];
        let method = outer.methods().find(|m| m.name() == method_name).unwrap();
        method.statements().iter().any(|stmt| match stmt {
            Stmt::VariableDeclarationStatement(decl) => decl
                .fragments
                .iter()
                .any(|f| f.name.as_str() == var && f.effectively_final),
            _ => false,
        })
    }

    #[test]
    fn captures_enclosing_local_once() {
        let (unit, output) = analyze(local_reading_x()).unwrap();

        assert_eq!(captures_of(&unit, "Local"), vec![vec!["x".to_string()]]);
        assert_eq!(output.captures_added, 1);
        assert!(fragment_is_final(&unit, "run", "x"));
        assert!(!fragment_is_final(&unit, "run", "y"));
    }

    #[test]
    fn capture_follows_super_call() {
        let (unit, _) = analyze(local_reading_x()).unwrap();
        let ctor = find_type(&unit, "Local").constructors().next().unwrap();
        assert!(ctor.statements()[0].is_super_call());
        assert_eq!(ctor.statements()[1], Stmt::capture("x"));
    }

    #[test]
    fn same_method_locals_are_not_captured() {
        let unit = unit(vec![class(
            "Main",
            None,
            vec![method(
                "run",
                vec![],
                vec![
                    local("x", "int", Some(num("1"))),
                    expr_stmt(assign("=", "x", infix("+", name("x"), num("1")))),
                ],
            )],
        )]);
        let (unit, output) = analyze(unit).unwrap();

        assert_eq!(output.captures_added, 0);
        assert!(!fragment_is_final(&unit, "run", "x"));
    }

    #[test]
    fn fields_need_no_capture() {
        let unit = unit(vec![
            class("Base", None, vec![field("inherited", "int", None)]),
            class(
                "Outer",
                Some("Base"),
                vec![
                    field("own", "int", None),
                    method(
                        "run",
                        vec![],
                        vec![local_class(class(
                            "Local",
                            None,
                            vec![method(
                                "go",
                                vec![],
                                vec![expr_stmt(infix("+", name("own"), name("inherited")))],
                            )],
                        ))],
                    ),
                ],
            ),
        ]);
        let (unit, output) = analyze(unit).unwrap();

        assert_eq!(output.captures_added, 0);
        assert_eq!(captures_of(&unit, "Local"), vec![Vec::<String>::new()]);
    }

    #[test]
    fn captured_parameter_is_finalized() {
        let unit = unit(vec![class(
            "Outer",
            None,
            vec![method(
                "run",
                vec![param("limit", "int")],
                vec![local_class(class(
                    "Local",
                    None,
                    vec![method("go", vec![], vec![expr_stmt(name("limit"))])],
                ))],
            )],
        )]);
        let (unit, output) = analyze(unit).unwrap();

        let run = unit.types[0].methods().find(|m| m.name() == "run").unwrap();
        assert!(run.parameters[0].effectively_final);
        assert_eq!(output.variables_finalized, 1);
    }

    #[test]
    fn every_crossed_class_captures() {
        // Inner sits inside Local's method; both cross the boundary to `run`.
        let inner = class(
            "Inner",
            None,
            vec![method("go", vec![], vec![expr_stmt(name("x"))])],
        );
        let local_cls = class(
            "Local",
            None,
            vec![method("make", vec![], vec![local_class(inner)])],
        );
        let unit = unit(vec![class(
            "Outer",
            None,
            vec![method(
                "run",
                vec![],
                vec![local("x", "int", Some(num("1"))), local_class(local_cls)],
            )],
        )]);
        let (unit, _) = analyze(unit).unwrap();

        assert_eq!(captures_of(&unit, "Inner"), vec![vec!["x".to_string()]]);
        assert_eq!(captures_of(&unit, "Local"), vec![vec!["x".to_string()]]);
    }

    #[test]
    fn every_constructor_gets_the_record() {
        let local_cls = class(
            "Local",
            None,
            vec![
                constructor("Local", vec![], vec![]),
                constructor("Local", vec![param("n", "int")], vec![]),
                method("go", vec![], vec![expr_stmt(name("x"))]),
            ],
        );
        let unit = unit(vec![class(
            "Outer",
            None,
            vec![method(
                "run",
                vec![],
                vec![local("x", "int", Some(num("1"))), local_class(local_cls)],
            )],
        )]);
        let (unit, _) = analyze(unit).unwrap();

        assert_eq!(
            captures_of(&unit, "Local"),
            vec![vec!["x".to_string()], vec!["x".to_string()]]
        );
    }

    #[test]
    fn plain_assignment_target_is_not_a_read() {
        let local_cls = class(
            "Local",
            None,
            vec![
                field("copy", "int", None),
                method("go", vec![], vec![expr_stmt(assign("=", "copy", num("1")))]),
            ],
        );
        let unit = unit(vec![class(
            "Outer",
            None,
            vec![method(
                "run",
                vec![],
                vec![local("x", "int", None), local_class(local_cls)],
            )],
        )]);
        let (_, output) = analyze(unit).unwrap();
        assert_eq!(output.names_resolved, 0);
    }

    #[test]
    fn unresolved_name_is_an_error() {
        let unit = unit(vec![class(
            "Main",
            None,
            vec![method("run", vec![], vec![expr_stmt(name("ghost"))])],
        )]);
        let err = analyze(unit).unwrap_err();
        assert_eq!(
            err,
            CompilationError::UnresolvedSymbol {
                name: "ghost".into(),
                scope: "Main.run".into()
            }
        );
    }

    #[test]
    fn rerunning_adds_nothing() {
        let (mut unit, _) = analyze(local_reading_x()).unwrap();
        let scopes = ScopeBuilder::new().build(&unit).unwrap();
        let again = CapturePass::new(&mut unit, &scopes).run().unwrap();
        assert_eq!(again.captures_added, 0);
        assert_eq!(again.variables_finalized, 0);
        assert_eq!(captures_of(&unit, "Local"), vec![vec!["x".to_string()]]);
    }
}
