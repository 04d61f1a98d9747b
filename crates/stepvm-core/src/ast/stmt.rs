//! Statement nodes.
//!
//! Besides the statements the front-end produces, two synthetic statements
//! are introduced by desugaring: [`Stmt::Capture`] and (as a normalized
//! form) [`Stmt::SuperConstructorInvocation`] with no arguments.

use serde::{Deserialize, Serialize};

use super::decl::TypeDeclaration;
use super::expr::Expr;
use super::types::{Modifier, SimpleName, Type};

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum Stmt {
    Block(Block),
    VariableDeclarationStatement(VariableDeclarationStatement),
    ExpressionStatement(ExpressionStatement),
    IfStatement(IfStatement),
    ForStatement(ForStatement),
    WhileStatement(WhileStatement),
    BreakStatement(BreakStatement),
    ContinueStatement(ContinueStatement),
    ReturnStatement(ReturnStatement),
    EmptyStatement(EmptyStatement),
    /// A local class declaration.
    TypeDeclarationStatement(TypeDeclarationStatement),
    /// `super(...)` as the first statement of a constructor.
    SuperConstructorInvocation(SuperConstructorInvocation),
    /// Synthetic: initialize hidden state for a captured free variable.
    Capture(Capture),
}

impl Stmt {
    pub fn super_call() -> Self {
        Stmt::SuperConstructorInvocation(SuperConstructorInvocation::default())
    }

    pub fn capture(variable: impl Into<String>) -> Self {
        Stmt::Capture(Capture {
            variable: variable.into(),
        })
    }

    pub fn is_super_call(&self) -> bool {
        matches!(self, Stmt::SuperConstructorInvocation(_))
    }

    /// Node kind as spelled in the wire format.
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Block(_) => "Block",
            Stmt::VariableDeclarationStatement(_) => "VariableDeclarationStatement",
            Stmt::ExpressionStatement(_) => "ExpressionStatement",
            Stmt::IfStatement(_) => "IfStatement",
            Stmt::ForStatement(_) => "ForStatement",
            Stmt::WhileStatement(_) => "WhileStatement",
            Stmt::BreakStatement(_) => "BreakStatement",
            Stmt::ContinueStatement(_) => "ContinueStatement",
            Stmt::ReturnStatement(_) => "ReturnStatement",
            Stmt::EmptyStatement(_) => "EmptyStatement",
            Stmt::TypeDeclarationStatement(_) => "TypeDeclarationStatement",
            Stmt::SuperConstructorInvocation(_) => "SuperConstructorInvocation",
            Stmt::Capture(_) => "Capture",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// One declarator of a field, local or `for` initializer declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclarationFragment {
    pub name: SimpleName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<Expr>,
    /// Set when a nested class captures this variable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub effectively_final: bool,
}

impl VariableDeclarationFragment {
    pub fn new(name: impl Into<String>, initializer: Option<Expr>) -> Self {
        Self {
            name: SimpleName::new(name),
            initializer,
            effectively_final: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclarationStatement {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(rename = "type")]
    pub ty: Type,
    pub fragments: Vec<VariableDeclarationFragment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfStatement {
    pub expression: Expr,
    pub then_statement: Box<Stmt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_statement: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStatement {
    #[serde(default)]
    pub initializers: Vec<Expr>,
    /// Loop condition; absent means `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expr>,
    #[serde(default)]
    pub updaters: Vec<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub expression: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BreakStatement {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContinueStatement {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmptyStatement {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclarationStatement {
    pub declaration: TypeDeclaration,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuperConstructorInvocation {
    #[serde(default)]
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub variable: String,
}
