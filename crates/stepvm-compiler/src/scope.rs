//! Lexical scope tree for a compilation unit.
//!
//! The tree is rooted at a synthetic top-level scope. Each class declaration
//! contributes a class scope (fields, method signatures, superclass link) and
//! each method a method scope (parameters and locals). Local and member
//! classes hang below the scope that declares them.
//!
//! ## Superclass resolution
//!
//! Source order does not constrain inheritance order, so superclass links
//! are resolved from a worklist after all scopes exist. A class resolves once
//! its superclass scope exists *and* is itself resolved; every round resolves
//! at least one more class or the worklist is stuck. A stuck worklist is
//! either an `extends` of an undeclared class or a cycle, and both are
//! reported instead of looping.
//!
//! ```text
//! class C extends B {}      round 1: B resolves (A has no superclass)
//! class B extends A {}      round 2: C resolves
//! class A {}
//! ```

use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use stepvm_core::ast::{
    BodyDeclaration, CompilationUnit, Expr, MethodDeclaration, Modifiers, Stmt, Type,
    TypeDeclaration, Visibility,
};
use stepvm_core::{CompilationError, NodeId};

// ============================================================================
// Types
// ============================================================================

/// Index of a scope in its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A field binding of a class scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub is_static: bool,
}

/// A parameter or local variable binding of a method scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
}

/// Signature of a method as seen by subclasses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub visibility: Visibility,
    pub return_type: Option<Type>,
    pub parameter_types: Vec<Type>,
    pub is_constructor: bool,
}

impl MethodSignature {
    pub fn of(method: &MethodDeclaration) -> Self {
        Self {
            name: method.name().to_string(),
            visibility: method.visibility(),
            return_type: method.return_type2.clone(),
            parameter_types: method.parameter_types(),
            is_constructor: method.constructor,
        }
    }

    /// Exact match on name, return type and ordered parameter types.
    pub fn same_signature(&self, other: &MethodSignature) -> bool {
        self.name == other.name
            && self.return_type == other.return_type
            && self.parameter_types == other.parameter_types
    }
}

/// Bindings and links of a class.
#[derive(Debug, Clone, Default)]
pub struct ClassScope {
    pub fields: FxHashMap<String, Field>,
    pub methods: Vec<MethodSignature>,
    /// Name in the `extends` clause.
    pub superclass_name: Option<String>,
    /// Resolved superclass scope. A lookup relation, not ownership.
    pub superclass: Option<ScopeId>,
}

/// Bindings of a method.
#[derive(Debug, Clone, Default)]
pub struct MethodScope {
    pub variables: FxHashMap<String, Variable>,
}

#[derive(Debug, Clone)]
pub enum ScopeKind {
    Root,
    Class(ClassScope),
    Method(MethodScope),
}

/// One node of the scope tree.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Declaration that introduced this scope (none for the root).
    pub node: Option<NodeId>,
}

impl Scope {
    pub fn as_class(&self) -> Option<&ClassScope> {
        match &self.kind {
            ScopeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodScope> {
        match &self.kind {
            ScopeKind::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, ScopeKind::Method(_))
    }
}

/// How a name is bound in a particular scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Field of the class itself or of a class on its superclass chain.
    Field { is_static: bool },
    /// Parameter or local of a method.
    Variable,
}

// ============================================================================
// ScopeTree
// ============================================================================

/// Immutable scope tree produced by [`ScopeBuilder`].
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    by_node: FxHashMap<NodeId, ScopeId>,
    /// First declaration of each class name, in declaration order.
    classes: FxHashMap<String, ScopeId>,
    /// Every class scope, in declaration order.
    class_ids: Vec<ScopeId>,
    rounds: usize,
}

impl ScopeTree {
    fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: "<root>".to_string(),
                kind: ScopeKind::Root,
                parent: None,
                children: Vec::new(),
                node: None,
            }],
            by_node: FxHashMap::default(),
            classes: FxHashMap::default(),
            class_ids: Vec::new(),
            rounds: 0,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists.
        false
    }

    /// Scope introduced by a type or method declaration.
    pub fn scope_for(&self, node: NodeId) -> Option<ScopeId> {
        self.by_node.get(&node).copied()
    }

    /// First class declared under a simple name.
    pub fn class(&self, name: &str) -> Option<ScopeId> {
        self.classes.get(name).copied()
    }

    /// Class named `name` as seen from `from`.
    ///
    /// The nearest enclosing scope that declares a class of that name wins;
    /// otherwise the first declaration anywhere in the unit.
    pub fn resolve_class(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        let mut cursor = Some(from);
        while let Some(current) = cursor {
            if let Some(found) = self.class_child(current, name) {
                return Some(found);
            }
            cursor = self.get(current).parent;
        }
        self.class(name)
    }

    /// Number of class scopes.
    pub fn class_count(&self) -> usize {
        self.class_ids.len()
    }

    /// Worklist rounds needed to resolve every superclass link.
    pub fn resolution_rounds(&self) -> usize {
        self.rounds
    }

    /// Named child of a scope (first match).
    pub fn child(&self, id: ScopeId, name: &str) -> Option<ScopeId> {
        self.get(id)
            .children
            .iter()
            .copied()
            .find(|child| self.get(*child).name == name)
    }

    fn class_child(&self, id: ScopeId, name: &str) -> Option<ScopeId> {
        self.get(id).children.iter().copied().find(|child| {
            let scope = self.get(*child);
            scope.as_class().is_some() && scope.name == name
        })
    }

    /// Superclass a class names, looked up from its declaring scope.
    fn superclass_target(&self, id: ScopeId) -> Option<ScopeId> {
        let scope = self.get(id);
        let name = scope.as_class()?.superclass_name.as_deref()?;
        self.resolve_class(scope.parent?, name)
    }

    /// Resolved superclass of a class scope.
    pub fn superclass(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).as_class().and_then(|class| class.superclass)
    }

    /// Ancestors of a class, nearest first.
    pub fn superclass_chain(&self, id: ScopeId) -> SuperclassChain<'_> {
        SuperclassChain {
            tree: self,
            next: self.superclass(id),
        }
    }

    /// Binding for `name` declared directly by `id`, following the
    /// superclass chain for class scopes.
    pub fn binding_in(&self, id: ScopeId, name: &str) -> Option<Binding> {
        match &self.get(id).kind {
            ScopeKind::Root => None,
            ScopeKind::Method(method) => method
                .variables
                .contains_key(name)
                .then_some(Binding::Variable),
            ScopeKind::Class(_) => std::iter::once(id)
                .chain(self.superclass_chain(id))
                .find_map(|class_id| {
                    self.get(class_id)
                        .as_class()
                        .and_then(|class| class.fields.get(name))
                        .map(|field| Binding::Field {
                            is_static: field.is_static,
                        })
                }),
        }
    }

    /// Dotted path from the root, e.g. `Outer.run.Local`.
    pub fn path(&self, id: ScopeId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let scope = self.get(current);
            if scope.parent.is_some() {
                names.push(scope.name.as_str());
            }
            cursor = scope.parent;
        }
        names.reverse();
        if names.is_empty() {
            "<root>".to_string()
        } else {
            names.join(".")
        }
    }

    fn push(&mut self, parent: ScopeId, name: &str, kind: ScopeKind, node: NodeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            name: name.to_string(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
            node: Some(node),
        });
        self.scopes[parent.index()].children.push(id);
        self.by_node.insert(node, id);
        id
    }

    fn class_mut(&mut self, id: ScopeId) -> Option<&mut ClassScope> {
        match &mut self.scopes[id.index()].kind {
            ScopeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    fn method_mut(&mut self, id: ScopeId) -> Option<&mut MethodScope> {
        match &mut self.scopes[id.index()].kind {
            ScopeKind::Method(method) => Some(method),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_scope(
            tree: &ScopeTree,
            id: ScopeId,
            depth: usize,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            let scope = tree.get(id);
            let indent = "  ".repeat(depth);
            match &scope.kind {
                ScopeKind::Root => writeln!(f, "{indent}<root>")?,
                ScopeKind::Class(class) => {
                    let mut fields: Vec<_> = class.fields.keys().map(String::as_str).collect();
                    fields.sort_unstable();
                    write!(f, "{indent}class {}", scope.name)?;
                    if let Some(name) = &class.superclass_name {
                        write!(f, " extends {name}")?;
                    }
                    writeln!(f, " [{}]", fields.join(", "))?;
                }
                ScopeKind::Method(method) => {
                    let mut vars: Vec<_> = method.variables.keys().map(String::as_str).collect();
                    vars.sort_unstable();
                    writeln!(f, "{indent}method {} [{}]", scope.name, vars.join(", "))?;
                }
            }
            for child in &scope.children {
                write_scope(tree, *child, depth + 1, f)?;
            }
            Ok(())
        }
        write_scope(self, self.root(), 0, f)
    }
}

/// Iterator over a class's ancestors, nearest first.
pub struct SuperclassChain<'a> {
    tree: &'a ScopeTree,
    next: Option<ScopeId>,
}

impl Iterator for SuperclassChain<'_> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<ScopeId> {
        let current = self.next?;
        self.next = self.tree.superclass(current);
        Some(current)
    }
}

// ============================================================================
// ScopeBuilder
// ============================================================================

/// Builds the [`ScopeTree`] of a compilation unit.
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    max_rounds: Option<usize>,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hard ceiling on superclass resolution rounds.
    pub fn with_max_rounds(mut self, rounds: Option<usize>) -> Self {
        self.max_rounds = rounds;
        self
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&self, unit: &CompilationUnit) -> Result<ScopeTree, CompilationError> {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        for ty in &unit.types {
            add_class(&mut tree, root, ty)?;
        }
        self.resolve_superclasses(&mut tree)?;
        debug!(
            scopes = tree.len(),
            classes = tree.class_count(),
            rounds = tree.rounds,
            "scope tree built"
        );
        Ok(tree)
    }

    fn resolve_superclasses(&self, tree: &mut ScopeTree) -> Result<(), CompilationError> {
        let mut resolved: FxHashSet<ScopeId> = FxHashSet::default();
        let mut pending: Vec<ScopeId> = Vec::new();

        // Declaration order keeps rounds deterministic.
        for id in tree.class_ids.clone() {
            match tree.get(id).as_class() {
                Some(class) if class.superclass_name.is_some() => pending.push(id),
                _ => {
                    resolved.insert(id);
                }
            }
        }

        let mut rounds = 0;
        while !pending.is_empty() {
            if let Some(max) = self.max_rounds {
                if rounds >= max {
                    return Err(CompilationError::ResolutionLimitExceeded { rounds });
                }
            }
            rounds += 1;

            let mut blocked = Vec::new();
            let mut progressed = false;
            for id in pending {
                match tree.superclass_target(id) {
                    Some(superclass) if resolved.contains(&superclass) => {
                        if let Some(class) = tree.class_mut(id) {
                            class.superclass = Some(superclass);
                        }
                        resolved.insert(id);
                        progressed = true;
                    }
                    _ => blocked.push(id),
                }
            }

            if !progressed {
                return Err(diagnose_stuck(tree, &blocked));
            }
            pending = blocked;
        }

        tree.rounds = rounds;
        Ok(())
    }
}

/// Explain why the remaining classes can never resolve.
fn diagnose_stuck(tree: &ScopeTree, blocked: &[ScopeId]) -> CompilationError {
    for id in blocked {
        let scope = tree.get(*id);
        if let Some(name) = scope.as_class().and_then(|c| c.superclass_name.as_deref()) {
            if tree.superclass_target(*id).is_none() {
                return CompilationError::UnresolvedSuperclass {
                    class: scope.name.clone(),
                    superclass: name.to_string(),
                };
            }
        }
    }

    let mut graph: DiGraph<ScopeId, ()> = DiGraph::new();
    let mut nodes: FxHashMap<ScopeId, NodeIndex> = FxHashMap::default();
    for id in blocked {
        nodes.insert(*id, graph.add_node(*id));
    }
    for id in blocked {
        let target = tree
            .superclass_target(*id)
            .and_then(|superclass| nodes.get(&superclass));
        if let Some(target) = target {
            graph.add_edge(nodes[id], *target, ());
        }
    }

    let cycle = tarjan_scc(&graph)
        .into_iter()
        .find(|component| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        })
        .unwrap_or_default();

    let mut classes: Vec<String> = cycle
        .iter()
        .map(|index| tree.get(graph[*index]).name.clone())
        .collect();
    if classes.is_empty() {
        classes = blocked.iter().map(|id| tree.get(*id).name.clone()).collect();
    }
    classes.sort();
    CompilationError::CircularInheritance { classes }
}

fn add_class(
    tree: &mut ScopeTree,
    parent: ScopeId,
    ty: &TypeDeclaration,
) -> Result<ScopeId, CompilationError> {
    if tree.class_child(parent, ty.name()).is_some() {
        return Err(CompilationError::DuplicateClass {
            name: ty.name().to_string(),
        });
    }

    let class = ClassScope {
        superclass_name: ty.superclass_name(),
        ..ClassScope::default()
    };
    let id = tree.push(parent, ty.name(), ScopeKind::Class(class), ty.id);
    tree.classes.entry(ty.name().to_string()).or_insert(id);
    tree.class_ids.push(id);

    for decl in &ty.body_declarations {
        match decl {
            BodyDeclaration::FieldDeclaration(field) => {
                let is_static = field.is_static();
                if let Some(class) = tree.class_mut(id) {
                    for fragment in &field.fragments {
                        let name = fragment.name.identifier.clone();
                        class.fields.insert(name.clone(), Field { name, is_static });
                    }
                }
            }
            BodyDeclaration::MethodDeclaration(method) => {
                if let Some(class) = tree.class_mut(id) {
                    class.methods.push(MethodSignature::of(method));
                }
                add_method(tree, id, method)?;
            }
            BodyDeclaration::Delegation(delegation) => {
                if let Some(class) = tree.class_mut(id) {
                    class.methods.push(MethodSignature {
                        name: delegation.name().to_string(),
                        visibility: Modifiers::from_list(&delegation.modifiers).visibility(),
                        return_type: delegation.return_type2.clone(),
                        parameter_types: delegation.parameter_types.clone(),
                        is_constructor: false,
                    });
                }
            }
            BodyDeclaration::TypeDeclaration(member) => {
                add_class(tree, id, member)?;
            }
        }
    }

    Ok(id)
}

fn add_method(
    tree: &mut ScopeTree,
    class: ScopeId,
    method: &MethodDeclaration,
) -> Result<(), CompilationError> {
    let id = tree.push(
        class,
        method.name(),
        ScopeKind::Method(MethodScope::default()),
        method.id,
    );
    for param in &method.parameters {
        declare(tree, id, &param.name.identifier);
    }
    for stmt in method.statements() {
        add_statement(tree, id, stmt)?;
    }
    Ok(())
}

fn declare(tree: &mut ScopeTree, method: ScopeId, name: &str) {
    if let Some(scope) = tree.method_mut(method) {
        scope.variables.insert(
            name.to_string(),
            Variable {
                name: name.to_string(),
            },
        );
    }
}

fn add_statement(tree: &mut ScopeTree, method: ScopeId, stmt: &Stmt) -> Result<(), CompilationError> {
    match stmt {
        Stmt::Block(block) => {
            for stmt in &block.statements {
                add_statement(tree, method, stmt)?;
            }
        }
        Stmt::VariableDeclarationStatement(decl) => {
            for fragment in &decl.fragments {
                declare(tree, method, &fragment.name.identifier);
            }
        }
        Stmt::IfStatement(stmt) => {
            add_statement(tree, method, &stmt.then_statement)?;
            if let Some(else_stmt) = &stmt.else_statement {
                add_statement(tree, method, else_stmt)?;
            }
        }
        Stmt::ForStatement(stmt) => {
            for init in &stmt.initializers {
                if let Expr::VariableDeclarationExpression(decl) = init {
                    for fragment in &decl.fragments {
                        declare(tree, method, &fragment.name.identifier);
                    }
                }
            }
            add_statement(tree, method, &stmt.body)?;
        }
        Stmt::WhileStatement(stmt) => add_statement(tree, method, &stmt.body)?,
        Stmt::TypeDeclarationStatement(local) => {
            add_class(tree, method, &local.declaration)?;
        }
        Stmt::ExpressionStatement(_)
        | Stmt::BreakStatement(_)
        | Stmt::ContinueStatement(_)
        | Stmt::ReturnStatement(_)
        | Stmt::EmptyStatement(_)
        | Stmt::SuperConstructorInvocation(_)
        | Stmt::Capture(_) => {}
    }
    Ok(())
}
