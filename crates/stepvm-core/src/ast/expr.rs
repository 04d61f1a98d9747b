//! Expression nodes.

use serde::{Deserialize, Serialize};

use super::stmt::VariableDeclarationFragment;
use super::types::{Modifier, SimpleName, Type};

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum Expr {
    /// Identifier read (or write, as an assignment target).
    SimpleName(SimpleName),
    /// Numeric literal, kept as its source token.
    NumberLiteral(NumberLiteral),
    BooleanLiteral(BooleanLiteral),
    /// `left op right [op extended...]`
    InfixExpression(InfixExpression),
    /// `op operand`
    PrefixExpression(PrefixExpression),
    /// `operand op`
    PostfixExpression(PostfixExpression),
    /// `target op= value`
    Assignment(Assignment),
    ParenthesizedExpression(ParenthesizedExpression),
    /// Declaration in expression position (`for (int i = 0; ...)`).
    VariableDeclarationExpression(VariableDeclarationExpression),
    ThisExpression(ThisExpression),
    /// `expression.name`; only `this.name` is executable.
    FieldAccess(FieldAccess),
}

impl Expr {
    pub fn name(identifier: impl Into<String>) -> Self {
        Expr::SimpleName(SimpleName::new(identifier))
    }

    pub fn number(token: impl Into<String>) -> Self {
        Expr::NumberLiteral(NumberLiteral {
            token: token.into(),
        })
    }

    /// Node kind as spelled in the wire format.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::SimpleName(_) => "SimpleName",
            Expr::NumberLiteral(_) => "NumberLiteral",
            Expr::BooleanLiteral(_) => "BooleanLiteral",
            Expr::InfixExpression(_) => "InfixExpression",
            Expr::PrefixExpression(_) => "PrefixExpression",
            Expr::PostfixExpression(_) => "PostfixExpression",
            Expr::Assignment(_) => "Assignment",
            Expr::ParenthesizedExpression(_) => "ParenthesizedExpression",
            Expr::VariableDeclarationExpression(_) => "VariableDeclarationExpression",
            Expr::ThisExpression(_) => "ThisExpression",
            Expr::FieldAccess(_) => "FieldAccess",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanLiteral {
    #[serde(rename = "booleanValue")]
    pub boolean_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfixExpression {
    pub operator: String,
    pub left_operand: Box<Expr>,
    pub right_operand: Box<Expr>,
    /// Further operands of a flattened left-associative chain (`a + b + c`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extended_operands: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixExpression {
    pub operator: String,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostfixExpression {
    pub operator: String,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default = "plain_assign")]
    pub operator: String,
    pub left_hand_side: Box<Expr>,
    pub right_hand_side: Box<Expr>,
}

fn plain_assign() -> String {
    "=".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParenthesizedExpression {
    pub expression: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclarationExpression {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(rename = "type")]
    pub ty: Type,
    pub fragments: Vec<VariableDeclarationFragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThisExpression {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAccess {
    pub expression: Box<Expr>,
    pub name: SimpleName,
}

impl FieldAccess {
    /// The field name when this is `this.name`.
    pub fn this_field(&self) -> Option<&str> {
        match self.expression.as_ref() {
            Expr::ThisExpression(_) => Some(self.name.as_str()),
            _ => None,
        }
    }
}
