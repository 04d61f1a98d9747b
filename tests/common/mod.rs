//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{Value as Json, json};
use stepvm::ast::CompilationUnit;

/// Load a program from the test_programs directory.
pub fn load_program(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_programs")
        .join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

pub fn load_unit(filename: &str) -> CompilationUnit {
    CompilationUnit::from_json(&load_program(filename))
        .unwrap_or_else(|e| panic!("Failed to decode {filename}: {e}"))
}

// =============================================================================
// JSON node builders
// =============================================================================

pub fn name(identifier: &str) -> Json {
    json!({ "node": "SimpleName", "identifier": identifier })
}

pub fn int_type() -> Json {
    json!({ "node": "PrimitiveType", "primitiveTypeCode": "int" })
}

pub fn num(token: &str) -> Json {
    json!({ "node": "NumberLiteral", "token": token })
}

pub fn infix(operator: &str, left: Json, right: Json) -> Json {
    json!({
        "node": "InfixExpression",
        "operator": operator,
        "leftOperand": left,
        "rightOperand": right
    })
}

pub fn assign(target: &str, value: Json) -> Json {
    json!({
        "node": "Assignment",
        "operator": "=",
        "leftHandSide": name(target),
        "rightHandSide": value
    })
}

pub fn postfix(operator: &str, operand: Json) -> Json {
    json!({ "node": "PostfixExpression", "operator": operator, "operand": operand })
}

pub fn expr_stmt(expression: Json) -> Json {
    json!({ "node": "ExpressionStatement", "expression": expression })
}

pub fn local(variable: &str, initializer: Option<Json>) -> Json {
    let mut fragment = json!({ "node": "VariableDeclarationFragment", "name": name(variable) });
    if let Some(init) = initializer {
        fragment["initializer"] = init;
    }
    json!({
        "node": "VariableDeclarationStatement",
        "type": int_type(),
        "fragments": [fragment]
    })
}

pub fn return_stmt(expression: Option<Json>) -> Json {
    let mut stmt = json!({ "node": "ReturnStatement" });
    if let Some(expression) = expression {
        stmt["expression"] = expression;
    }
    stmt
}

pub fn field(variable: &str, initializer: Option<Json>) -> Json {
    let mut fragment = json!({ "node": "VariableDeclarationFragment", "name": name(variable) });
    if let Some(init) = initializer {
        fragment["initializer"] = init;
    }
    json!({
        "node": "FieldDeclaration",
        "type": int_type(),
        "fragments": [fragment]
    })
}

pub fn method(method_name: &str, visibility: Option<&str>, statements: Vec<Json>) -> Json {
    let modifiers: Vec<Json> = visibility
        .map(|keyword| json!({ "node": "Modifier", "keyword": keyword }))
        .into_iter()
        .collect();
    json!({
        "node": "MethodDeclaration",
        "modifiers": modifiers,
        "name": name(method_name),
        "returnType2": int_type(),
        "parameters": [],
        "body": { "node": "Block", "statements": statements }
    })
}

pub fn constructor(class_name: &str, statements: Vec<Json>) -> Json {
    json!({
        "node": "MethodDeclaration",
        "constructor": true,
        "modifiers": [{ "node": "Modifier", "keyword": "public" }],
        "name": name(class_name),
        "parameters": [],
        "body": { "node": "Block", "statements": statements }
    })
}

pub fn class(class_name: &str, superclass: Option<&str>, body: Vec<Json>) -> Json {
    let mut decl = json!({
        "node": "TypeDeclaration",
        "name": name(class_name),
        "bodyDeclarations": body
    });
    if let Some(superclass) = superclass {
        decl["superclassType"] = json!({ "node": "SimpleType", "name": name(superclass) });
    }
    decl
}

pub fn local_class(declaration: Json) -> Json {
    json!({ "node": "TypeDeclarationStatement", "declaration": declaration })
}

pub fn unit(types: Vec<Json>) -> Json {
    json!({ "node": "CompilationUnit", "types": types })
}

/// A single `Main` class whose `run` method holds `statements`.
pub fn main_program(statements: Vec<Json>) -> String {
    unit(vec![class("Main", None, vec![method("run", None, statements)])]).to_string()
}
