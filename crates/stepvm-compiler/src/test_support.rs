//! AST builders for unit tests.

use stepvm_core::ast::*;
use stepvm_core::NodeId;

pub fn ty(name: &str) -> Type {
    match name {
        "boolean" | "byte" | "short" | "int" | "long" | "char" | "float" | "double" | "void" => {
            Type::primitive(name)
        }
        _ => Type::named(name),
    }
}

pub fn unit(types: Vec<TypeDeclaration>) -> CompilationUnit {
    CompilationUnit::new(types)
}

pub fn class(name: &str, superclass: Option<&str>, body: Vec<BodyDeclaration>) -> TypeDeclaration {
    TypeDeclaration {
        id: NodeId::UNASSIGNED,
        modifiers: Vec::new(),
        interface: false,
        name: SimpleName::new(name),
        superclass_type: superclass.map(Type::named),
        body_declarations: body,
    }
}

pub fn field(name: &str, type_name: &str, init: Option<Expr>) -> BodyDeclaration {
    BodyDeclaration::FieldDeclaration(FieldDeclaration {
        modifiers: Vec::new(),
        ty: ty(type_name),
        fragments: vec![VariableDeclarationFragment::new(name, init)],
    })
}

pub fn static_field(name: &str, type_name: &str) -> BodyDeclaration {
    BodyDeclaration::FieldDeclaration(FieldDeclaration {
        modifiers: vec![Modifier::keyword("static")],
        ty: ty(type_name),
        fragments: vec![VariableDeclarationFragment::new(name, None)],
    })
}

pub fn param(name: &str, type_name: &str) -> SingleVariableDeclaration {
    SingleVariableDeclaration::new(ty(type_name), name)
}

/// `public void name(params) { body }`
pub fn method(name: &str, params: Vec<SingleVariableDeclaration>, body: Vec<Stmt>) -> BodyDeclaration {
    typed_method(Some("public"), "void", name, params, body)
}

pub fn typed_method(
    visibility: Option<&str>,
    return_type: &str,
    name: &str,
    params: Vec<SingleVariableDeclaration>,
    body: Vec<Stmt>,
) -> BodyDeclaration {
    BodyDeclaration::MethodDeclaration(MethodDeclaration {
        id: NodeId::UNASSIGNED,
        modifiers: visibility.into_iter().map(Modifier::keyword).collect(),
        constructor: false,
        name: SimpleName::new(name),
        return_type2: Some(ty(return_type)),
        parameters: params,
        body: Some(Block::new(body)),
    })
}

pub fn constructor(class: &str, params: Vec<SingleVariableDeclaration>, body: Vec<Stmt>) -> BodyDeclaration {
    BodyDeclaration::MethodDeclaration(MethodDeclaration {
        id: NodeId::UNASSIGNED,
        modifiers: vec![Modifier::keyword("public")],
        constructor: true,
        name: SimpleName::new(class),
        return_type2: None,
        parameters: params,
        body: Some(Block::new(body)),
    })
}

pub fn member_class(decl: TypeDeclaration) -> BodyDeclaration {
    BodyDeclaration::TypeDeclaration(decl)
}

pub fn local(name: &str, type_name: &str, init: Option<Expr>) -> Stmt {
    Stmt::VariableDeclarationStatement(VariableDeclarationStatement {
        modifiers: Vec::new(),
        ty: ty(type_name),
        fragments: vec![VariableDeclarationFragment::new(name, init)],
    })
}

pub fn local_class(decl: TypeDeclaration) -> Stmt {
    Stmt::TypeDeclarationStatement(TypeDeclarationStatement { declaration: decl })
}

pub fn block(statements: Vec<Stmt>) -> Stmt {
    Stmt::Block(Block::new(statements))
}

pub fn expr_stmt(expression: Expr) -> Stmt {
    Stmt::ExpressionStatement(ExpressionStatement { expression })
}

pub fn if_stmt(cond: Expr, then: Stmt, otherwise: Option<Stmt>) -> Stmt {
    Stmt::IfStatement(IfStatement {
        expression: cond,
        then_statement: Box::new(then),
        else_statement: otherwise.map(Box::new),
    })
}

pub fn for_stmt(init: Vec<Expr>, cond: Option<Expr>, update: Vec<Expr>, body: Stmt) -> Stmt {
    Stmt::ForStatement(ForStatement {
        initializers: init,
        expression: cond,
        updaters: update,
        body: Box::new(body),
    })
}

pub fn while_stmt(cond: Expr, body: Stmt) -> Stmt {
    Stmt::WhileStatement(WhileStatement {
        expression: cond,
        body: Box::new(body),
    })
}

pub fn return_stmt(expression: Option<Expr>) -> Stmt {
    Stmt::ReturnStatement(ReturnStatement { expression })
}

pub fn name(identifier: &str) -> Expr {
    Expr::name(identifier)
}

pub fn num(token: &str) -> Expr {
    Expr::number(token)
}

pub fn boolean(value: bool) -> Expr {
    Expr::BooleanLiteral(BooleanLiteral {
        boolean_value: value,
    })
}

pub fn infix(operator: &str, left: Expr, right: Expr) -> Expr {
    Expr::InfixExpression(InfixExpression {
        operator: operator.to_string(),
        left_operand: Box::new(left),
        right_operand: Box::new(right),
        extended_operands: Vec::new(),
    })
}

pub fn paren(inner: Expr) -> Expr {
    Expr::ParenthesizedExpression(ParenthesizedExpression {
        expression: Box::new(inner),
    })
}

pub fn assign(operator: &str, target: &str, value: Expr) -> Expr {
    Expr::Assignment(Assignment {
        operator: operator.to_string(),
        left_hand_side: Box::new(name(target)),
        right_hand_side: Box::new(value),
    })
}

pub fn prefix(operator: &str, operand: Expr) -> Expr {
    Expr::PrefixExpression(PrefixExpression {
        operator: operator.to_string(),
        operand: Box::new(operand),
    })
}

pub fn postfix(operator: &str, operand: Expr) -> Expr {
    Expr::PostfixExpression(PostfixExpression {
        operator: operator.to_string(),
        operand: Box::new(operand),
    })
}

pub fn var_expr(name: &str, type_name: &str, init: Expr) -> Expr {
    Expr::VariableDeclarationExpression(VariableDeclarationExpression {
        modifiers: Vec::new(),
        ty: ty(type_name),
        fragments: vec![VariableDeclarationFragment::new(name, Some(init))],
    })
}

/// Find a (possibly nested) type declaration by name.
pub fn find_type<'a>(unit: &'a CompilationUnit, name: &str) -> &'a TypeDeclaration {
    fn search<'a>(ty: &'a TypeDeclaration, name: &str) -> Option<&'a TypeDeclaration> {
        if ty.name() == name {
            return Some(ty);
        }
        ty.nested_types().into_iter().find_map(|nested| search(nested, name))
    }
    unit.types
        .iter()
        .find_map(|ty| search(ty, name))
        .unwrap_or_else(|| panic!("no type named {name}"))
}
