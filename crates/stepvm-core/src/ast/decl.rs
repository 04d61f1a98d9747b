//! Declaration nodes: classes, methods, fields and synthesized delegations.

use serde::{Deserialize, Serialize};

use super::stmt::{Block, Stmt, VariableDeclarationFragment};
use super::types::{Modifier, Modifiers, SimpleName, Type, Visibility};
use crate::NodeId;

/// A member of a type body (or of the compilation unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum BodyDeclaration {
    TypeDeclaration(TypeDeclaration),
    MethodDeclaration(MethodDeclaration),
    FieldDeclaration(FieldDeclaration),
    /// Synthetic passthrough to an inherited method.
    Delegation(Delegation),
}

impl BodyDeclaration {
    /// Node kind as spelled in the wire format.
    pub fn kind(&self) -> &'static str {
        match self {
            BodyDeclaration::TypeDeclaration(_) => "TypeDeclaration",
            BodyDeclaration::MethodDeclaration(_) => "MethodDeclaration",
            BodyDeclaration::FieldDeclaration(_) => "FieldDeclaration",
            BodyDeclaration::Delegation(_) => "Delegation",
        }
    }
}

/// A class or interface declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclaration {
    #[serde(skip)]
    pub id: NodeId,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub interface: bool,
    pub name: SimpleName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass_type: Option<Type>,
    #[serde(default)]
    pub body_declarations: Vec<BodyDeclaration>,
}

impl TypeDeclaration {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Simple name of the `extends` clause, if any.
    pub fn superclass_name(&self) -> Option<String> {
        self.superclass_type.as_ref().map(|ty| match ty {
            Type::SimpleType { name } => name.identifier.clone(),
            other => other.to_string(),
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDeclaration> {
        self.body_declarations.iter().filter_map(|decl| match decl {
            BodyDeclaration::MethodDeclaration(method) => Some(method),
            _ => None,
        })
    }

    pub fn methods_mut(&mut self) -> impl Iterator<Item = &mut MethodDeclaration> {
        self.body_declarations.iter_mut().filter_map(|decl| match decl {
            BodyDeclaration::MethodDeclaration(method) => Some(method),
            _ => None,
        })
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDeclaration> {
        self.methods().filter(|m| m.constructor)
    }

    pub fn constructors_mut(&mut self) -> impl Iterator<Item = &mut MethodDeclaration> {
        self.methods_mut().filter(|m| m.constructor)
    }

    pub fn has_constructor(&self) -> bool {
        self.constructors().next().is_some()
    }
}

/// A method or constructor declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDeclaration {
    #[serde(skip)]
    pub id: NodeId,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub constructor: bool,
    pub name: SimpleName,
    /// Absent for constructors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type2: Option<Type>,
    #[serde(default)]
    pub parameters: Vec<SingleVariableDeclaration>,
    /// Absent for abstract and interface methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Block>,
}

impl MethodDeclaration {
    /// The canonical `public Name() {}` constructor.
    pub fn default_constructor(class_name: &str, id: NodeId) -> Self {
        Self {
            id,
            modifiers: vec![Modifier::keyword("public")],
            constructor: true,
            name: SimpleName::new(class_name),
            return_type2: None,
            parameters: Vec::new(),
            body: Some(Block::default()),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn flags(&self) -> Modifiers {
        Modifiers::from_list(&self.modifiers)
    }

    pub fn visibility(&self) -> Visibility {
        self.flags().visibility()
    }

    pub fn parameter_types(&self) -> Vec<Type> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }

    /// Body statements, empty for bodiless declarations.
    pub fn statements(&self) -> &[Stmt] {
        self.body.as_ref().map(|b| b.statements.as_slice()).unwrap_or(&[])
    }
}

/// A formal parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleVariableDeclaration {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(rename = "type")]
    pub ty: Type,
    pub name: SimpleName,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub effectively_final: bool,
}

impl SingleVariableDeclaration {
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Self {
            modifiers: Vec::new(),
            ty,
            name: SimpleName::new(name),
            effectively_final: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(rename = "type")]
    pub ty: Type,
    pub fragments: Vec<VariableDeclarationFragment>,
}

impl FieldDeclaration {
    pub fn is_static(&self) -> bool {
        Modifiers::from_list(&self.modifiers).contains(Modifiers::STATIC)
    }
}

/// Synthetic declaration forwarding an inherited method unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    pub name: SimpleName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type2: Option<Type>,
    #[serde(default)]
    pub parameter_types: Vec<Type>,
    /// Class that declares the forwarded method.
    pub declaring_class: String,
}

impl Delegation {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}
