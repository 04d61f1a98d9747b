//! AST for Java-like programs in the JSON exchange format.
//!
//! The external front-end emits every node as a JSON object whose `node`
//! field names its kind. Kinds are modelled as closed enums ([`Stmt`],
//! [`Expr`], [`BodyDeclaration`], [`Type`]) so every pass matches them
//! exhaustively; kinds outside the vocabulary are rejected while decoding,
//! with the JSON path of the offending node.
//!
//! # Example
//!
//! ```
//! use stepvm_core::ast::CompilationUnit;
//!
//! let unit = CompilationUnit::from_json(r#"{
//!     "node": "CompilationUnit",
//!     "types": [{
//!         "node": "TypeDeclaration",
//!         "name": { "node": "SimpleName", "identifier": "Main" },
//!         "bodyDeclarations": []
//!     }]
//! }"#).unwrap();
//! assert_eq!(unit.types[0].name(), "Main");
//! ```

mod decl;
mod expr;
mod stmt;
mod types;

pub use decl::*;
pub use expr::*;
pub use stmt::*;
pub use types::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::{AstError, NodeId};

/// Node kinds accepted in an input document.
pub const SUPPORTED_NODE_KINDS: &[&str] = &[
    "CompilationUnit",
    "TypeDeclaration",
    "MethodDeclaration",
    "FieldDeclaration",
    "Delegation",
    "SingleVariableDeclaration",
    "VariableDeclarationFragment",
    "Modifier",
    "MarkerAnnotation",
    "PrimitiveType",
    "SimpleType",
    "ArrayType",
    "SimpleName",
    "Block",
    "VariableDeclarationStatement",
    "ExpressionStatement",
    "IfStatement",
    "ForStatement",
    "WhileStatement",
    "BreakStatement",
    "ContinueStatement",
    "ReturnStatement",
    "EmptyStatement",
    "TypeDeclarationStatement",
    "SuperConstructorInvocation",
    "Capture",
    "NumberLiteral",
    "BooleanLiteral",
    "InfixExpression",
    "PrefixExpression",
    "PostfixExpression",
    "Assignment",
    "ParenthesizedExpression",
    "VariableDeclarationExpression",
    "ThisExpression",
    "FieldAccess",
];

/// Fields the front-end may emit that the model does not decode. Their
/// contents are skipped when checking node kinds.
pub const UNMODELLED_FIELDS: &[&str] = &[
    "javadoc",
    "package",
    "imports",
    "comments",
    "typeParameters",
    "typeArguments",
    "thrownExceptionTypes",
];

/// Root of one program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "node")]
pub struct CompilationUnit {
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
    /// Next free node identifier.
    #[serde(skip)]
    next_id: u32,
}

impl CompilationUnit {
    pub fn new(types: Vec<TypeDeclaration>) -> Self {
        let mut unit = Self { types, next_id: 0 };
        unit.assign_missing_ids();
        unit
    }

    /// Decode a JSON document and number its declarations.
    pub fn from_json(source: &str) -> Result<Self, AstError> {
        let json: Json = serde_json::from_str(source)?;
        Self::from_value(json)
    }

    /// Decode an already-parsed JSON document.
    pub fn from_value(json: Json) -> Result<Self, AstError> {
        match json.get("node").and_then(Json::as_str) {
            Some("CompilationUnit") => {}
            Some(other) => {
                return Err(AstError::NotACompilationUnit {
                    found: other.to_string(),
                });
            }
            None => {
                return Err(AstError::NotACompilationUnit {
                    found: "an untagged value".to_string(),
                });
            }
        }
        validate_node_kinds(&json, &mut String::from("$"))?;
        let mut unit: CompilationUnit = serde_json::from_value(json)?;
        unit.assign_missing_ids();
        Ok(unit)
    }

    pub fn to_json(&self) -> Result<String, AstError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find a top-level or nested class by simple name (first match, pre-order).
    pub fn find_type(&self, name: &str) -> Option<&TypeDeclaration> {
        fn search<'a>(ty: &'a TypeDeclaration, name: &str) -> Option<&'a TypeDeclaration> {
            if ty.name() == name {
                return Some(ty);
            }
            ty.nested_types().into_iter().find_map(|n| search(n, name))
        }
        self.types.iter().find_map(|ty| search(ty, name))
    }

    /// Assign identifiers to every type and method declaration lacking one.
    ///
    /// Passes that synthesize declarations call this once they are done.
    pub fn assign_missing_ids(&mut self) {
        let mut next = self.next_id;
        for ty in &mut self.types {
            number_type(ty, &mut next);
        }
        self.next_id = next;
    }
}

fn number_type(ty: &mut TypeDeclaration, next: &mut u32) {
    if !ty.id.is_assigned() {
        *next += 1;
        ty.id = NodeId::new(*next);
    }
    for method in ty.methods_mut() {
        if !method.id.is_assigned() {
            *next += 1;
            method.id = NodeId::new(*next);
        }
    }
    for nested in ty.nested_types_mut() {
        number_type(nested, next);
    }
}

fn validate_node_kinds(json: &Json, path: &mut String) -> Result<(), AstError> {
    match json {
        Json::Object(map) => {
            if let Some(kind) = map.get("node").and_then(Json::as_str) {
                if !SUPPORTED_NODE_KINDS.contains(&kind) {
                    return Err(AstError::UnsupportedNodeKind {
                        kind: kind.to_string(),
                        path: path.clone(),
                    });
                }
            }
            for (key, child) in map {
                if UNMODELLED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let len = path.len();
                path.push('.');
                path.push_str(key);
                validate_node_kinds(child, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        Json::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{index}]"));
                validate_node_kinds(child, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ============================================================================
// Traversal helpers
// ============================================================================

impl TypeDeclaration {
    /// Member classes followed by local classes of every method body.
    ///
    /// Only directly nested declarations are returned; callers recurse.
    pub fn nested_types(&self) -> Vec<&TypeDeclaration> {
        let mut out = Vec::new();
        for decl in &self.body_declarations {
            match decl {
                BodyDeclaration::TypeDeclaration(member) => out.push(member),
                BodyDeclaration::MethodDeclaration(method) => {
                    for stmt in method.statements() {
                        stmt.collect_local_types(&mut out);
                    }
                }
                BodyDeclaration::FieldDeclaration(_) | BodyDeclaration::Delegation(_) => {}
            }
        }
        out
    }

    pub fn nested_types_mut(&mut self) -> Vec<&mut TypeDeclaration> {
        let mut out = Vec::new();
        for decl in &mut self.body_declarations {
            match decl {
                BodyDeclaration::TypeDeclaration(member) => out.push(member),
                BodyDeclaration::MethodDeclaration(method) => {
                    if let Some(body) = &mut method.body {
                        for stmt in &mut body.statements {
                            stmt.collect_local_types_mut(&mut out);
                        }
                    }
                }
                BodyDeclaration::FieldDeclaration(_) | BodyDeclaration::Delegation(_) => {}
            }
        }
        out
    }
}

impl Stmt {
    /// Collect local class declarations reachable without entering another class.
    pub fn collect_local_types<'a>(&'a self, out: &mut Vec<&'a TypeDeclaration>) {
        match self {
            Stmt::Block(block) => {
                for stmt in &block.statements {
                    stmt.collect_local_types(out);
                }
            }
            Stmt::IfStatement(stmt) => {
                stmt.then_statement.collect_local_types(out);
                if let Some(else_stmt) = &stmt.else_statement {
                    else_stmt.collect_local_types(out);
                }
            }
            Stmt::ForStatement(stmt) => stmt.body.collect_local_types(out),
            Stmt::WhileStatement(stmt) => stmt.body.collect_local_types(out),
            Stmt::TypeDeclarationStatement(stmt) => out.push(&stmt.declaration),
            Stmt::VariableDeclarationStatement(_)
            | Stmt::ExpressionStatement(_)
            | Stmt::BreakStatement(_)
            | Stmt::ContinueStatement(_)
            | Stmt::ReturnStatement(_)
            | Stmt::EmptyStatement(_)
            | Stmt::SuperConstructorInvocation(_)
            | Stmt::Capture(_) => {}
        }
    }

    pub fn collect_local_types_mut<'a>(&'a mut self, out: &mut Vec<&'a mut TypeDeclaration>) {
        match self {
            Stmt::Block(block) => {
                for stmt in &mut block.statements {
                    stmt.collect_local_types_mut(out);
                }
            }
            Stmt::IfStatement(stmt) => {
                stmt.then_statement.collect_local_types_mut(out);
                if let Some(else_stmt) = &mut stmt.else_statement {
                    else_stmt.collect_local_types_mut(out);
                }
            }
            Stmt::ForStatement(stmt) => stmt.body.collect_local_types_mut(out),
            Stmt::WhileStatement(stmt) => stmt.body.collect_local_types_mut(out),
            Stmt::TypeDeclarationStatement(stmt) => out.push(&mut stmt.declaration),
            Stmt::VariableDeclarationStatement(_)
            | Stmt::ExpressionStatement(_)
            | Stmt::BreakStatement(_)
            | Stmt::ContinueStatement(_)
            | Stmt::ReturnStatement(_)
            | Stmt::EmptyStatement(_)
            | Stmt::SuperConstructorInvocation(_)
            | Stmt::Capture(_) => {}
        }
    }
}
