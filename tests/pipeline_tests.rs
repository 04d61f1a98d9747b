//! Integration tests for the desugaring pipeline.
//!
//! Each test decodes a JSON AST, runs the passes through
//! [`Compiler::desugar`] and inspects the rewritten tree.

mod common;

use common::*;
use stepvm::ast::{BodyDeclaration, CompilationUnit, Stmt, TypeDeclaration};
use stepvm::compiler::{Compiler, PipelineOptions};
use stepvm::CompilationError;

fn decode(json: serde_json::Value) -> CompilationUnit {
    CompilationUnit::from_value(json).expect("Failed to decode unit")
}

fn find<'a>(unit: &'a CompilationUnit, class_name: &str) -> &'a TypeDeclaration {
    fn walk<'a>(ty: &'a TypeDeclaration, class_name: &str) -> Option<&'a TypeDeclaration> {
        if ty.name() == class_name {
            return Some(ty);
        }
        ty.nested_types().into_iter().find_map(|nested| walk(nested, class_name))
    }
    unit.types
        .iter()
        .find_map(|ty| walk(ty, class_name))
        .unwrap_or_else(|| panic!("no class {class_name}"))
}

fn constructor_body(ty: &TypeDeclaration) -> Vec<&'static str> {
    ty.constructors()
        .next()
        .expect("class has a constructor")
        .statements()
        .iter()
        .map(Stmt::kind)
        .collect()
}

// =============================================================================
// Constructors and super calls
// =============================================================================

#[test]
fn test_every_class_gets_a_constructor_with_super_call() {
    let mut unit = load_unit("shapes.json");
    let (_, report) = Compiler::default().desugar(&mut unit).unwrap();

    assert_eq!(report.constructors.constructors_added, 3);
    assert_eq!(report.super_calls.super_calls_added, 3);
    for class_name in ["Circle", "Shape", "Tag"] {
        let ty = find(&unit, class_name);
        assert_eq!(ty.constructors().count(), 1, "{class_name}");
        assert!(ty.constructors().all(|c| c.statements().first().is_some_and(Stmt::is_super_call)));
    }
}

#[test]
fn test_explicit_constructor_is_kept() {
    let mut unit = decode(unit(vec![class(
        "Point",
        None,
        vec![constructor(
            "Point",
            vec![local("origin", Some(num("0")))],
        )],
    )]));
    let (_, report) = Compiler::default().desugar(&mut unit).unwrap();

    assert_eq!(report.constructors.constructors_added, 0);
    assert_eq!(
        constructor_body(find(&unit, "Point")),
        ["SuperConstructorInvocation", "VariableDeclarationStatement"]
    );
}

#[test]
fn test_desugaring_is_idempotent() {
    let compiler = Compiler::default();
    let mut unit = load_unit("shapes.json");
    compiler.desugar(&mut unit).unwrap();
    let once = unit.clone();

    let (_, second) = compiler.desugar(&mut unit).unwrap();
    assert_eq!(second.constructors.constructors_added, 0);
    assert_eq!(second.super_calls.super_calls_added, 0);
    assert_eq!(second.captures.captures_added, 0);
    assert_eq!(second.overrides.delegations_added, 0);
    assert_eq!(unit, once);
}

// =============================================================================
// Superclass resolution
// =============================================================================

#[test]
fn test_forward_references_converge_within_depth() {
    // Most-derived first; depth 3.
    let mut unit = decode(unit(vec![
        class("D", Some("C"), vec![]),
        class("C", Some("B"), vec![]),
        class("B", Some("A"), vec![]),
        class("A", None, vec![]),
    ]));
    let (scopes, report) = Compiler::default().desugar(&mut unit).unwrap();

    assert!(report.resolution_rounds <= 3);
    let chain: Vec<&str> = scopes
        .superclass_chain(scopes.class("D").unwrap())
        .map(|id| scopes.get(id).name.as_str())
        .collect();
    assert_eq!(chain, ["C", "B", "A"]);
}

#[test]
fn test_cycle_is_reported() {
    let mut unit = decode(unit(vec![
        class("B", Some("A"), vec![]),
        class("A", Some("B"), vec![]),
        class("Free", None, vec![]),
    ]));
    let err = Compiler::default().desugar(&mut unit).unwrap_err();
    assert_eq!(
        err,
        CompilationError::CircularInheritance {
            classes: vec!["A".into(), "B".into()]
        }
    );
}

#[test]
fn test_unknown_superclass_is_reported() {
    let mut unit = decode(unit(vec![class("A", Some("Missing"), vec![])]));
    let err = Compiler::default().desugar(&mut unit).unwrap_err();
    assert_eq!(
        err,
        CompilationError::UnresolvedSuperclass {
            class: "A".into(),
            superclass: "Missing".into()
        }
    );
}

#[test]
fn test_round_cap() {
    let mut unit = decode(unit(vec![
        class("C", Some("B"), vec![]),
        class("B", Some("A"), vec![]),
        class("A", None, vec![]),
    ]));
    let compiler = Compiler::new(PipelineOptions {
        max_resolution_rounds: Some(1),
    });
    assert_eq!(
        compiler.desugar(&mut unit).unwrap_err(),
        CompilationError::ResolutionLimitExceeded { rounds: 1 }
    );
}

// =============================================================================
// Captures
// =============================================================================

#[test]
fn test_local_class_captures_enclosing_variable() {
    let mut unit = load_unit("shapes.json");
    let (_, report) = Compiler::default().desugar(&mut unit).unwrap();

    assert_eq!(report.captures.captures_added, 1);
    assert_eq!(
        constructor_body(find(&unit, "Tag")),
        ["SuperConstructorInvocation", "Capture"]
    );

    let json = unit.to_json().unwrap();
    assert!(json.contains(r#""variable": "n""#));
    assert!(json.contains(r#""effectivelyFinal": true"#));
}

#[test]
fn test_capture_is_recorded_once_per_constructor() {
    let helper = class(
        "Helper",
        None,
        vec![
            constructor("Helper", vec![]),
            constructor("Helper", vec![expr_stmt(infix("+", name("k"), num("1")))]),
            method("first", None, vec![expr_stmt(name("k"))]),
            method("second", None, vec![expr_stmt(infix("*", name("k"), name("k")))]),
        ],
    );
    let mut unit = decode(unit(vec![class(
        "Outer",
        None,
        vec![method(
            "run",
            None,
            vec![local("k", Some(num("3"))), local_class(helper)],
        )],
    )]));
    let (_, report) = Compiler::default().desugar(&mut unit).unwrap();

    let helper = find(&unit, "Helper");
    for ctor in helper.constructors() {
        let captures = ctor
            .statements()
            .iter()
            .filter(|stmt| matches!(stmt, Stmt::Capture(c) if c.variable == "k"))
            .count();
        assert_eq!(captures, 1);
    }
    assert_eq!(report.captures.captures_added, 2);
}

#[test]
fn test_inherited_field_is_not_captured() {
    let inner = class(
        "Inner",
        Some("Base"),
        vec![method("get", None, vec![expr_stmt(name("shared"))])],
    );
    let mut unit = decode(unit(vec![
        class("Base", None, vec![field("shared", None)]),
        class(
            "Outer",
            None,
            vec![method("run", None, vec![local("shared", Some(num("1"))), local_class(inner)])],
        ),
    ]));
    let (_, report) = Compiler::default().desugar(&mut unit).unwrap();
    assert_eq!(report.captures.captures_added, 0);
}

#[test]
fn test_same_local_class_name_in_two_methods() {
    let helper = |variable: &str| {
        local_class(class(
            "Helper",
            None,
            vec![method("get", None, vec![expr_stmt(name(variable))])],
        ))
    };
    let mut unit = decode(unit(vec![class(
        "Outer",
        None,
        vec![
            method("first", None, vec![local("a", Some(num("1"))), helper("a")]),
            method("second", None, vec![local("b", Some(num("2"))), helper("b")]),
        ],
    )]));
    let (scopes, report) = Compiler::default().desugar(&mut unit).unwrap();
    assert_eq!(scopes.class_count(), 3);
    assert_eq!(report.captures.captures_added, 2);

    let json = unit.to_json().unwrap();
    assert!(json.contains(r#""variable": "a""#));
    assert!(json.contains(r#""variable": "b""#));
}

#[test]
fn test_unresolved_read_names_scope() {
    let mut unit = decode(serde_json::from_str(&main_program(vec![expr_stmt(name("ghost"))])).unwrap());
    let err = Compiler::default().desugar(&mut unit).unwrap_err();
    assert_eq!(
        err,
        CompilationError::UnresolvedSymbol {
            name: "ghost".into(),
            scope: "Main.run".into()
        }
    );
}

// =============================================================================
// Overrides
// =============================================================================

#[test]
fn test_inherited_methods_are_delegated() {
    let mut unit = load_unit("shapes.json");
    let (_, report) = Compiler::default().desugar(&mut unit).unwrap();
    assert_eq!(report.overrides.delegations_added, 2);

    let circle = find(&unit, "Circle");
    let mut delegated: Vec<(&str, &str)> = circle
        .body_declarations
        .iter()
        .filter_map(|decl| match decl {
            BodyDeclaration::Delegation(d) => Some((d.name(), d.declaring_class.as_str())),
            _ => None,
        })
        .collect();
    delegated.sort();
    // secret() is private and stays behind.
    assert_eq!(delegated, [("area", "Shape"), ("describe", "Shape")]);
}

#[test]
fn test_declared_override_suppresses_delegation() {
    let mut unit = decode(unit(vec![
        class("Base", None, vec![method("size", Some("public"), vec![])]),
        class("Derived", Some("Base"), vec![method("size", Some("public"), vec![])]),
    ]));
    let (_, report) = Compiler::default().desugar(&mut unit).unwrap();
    assert_eq!(report.overrides.delegations_added, 0);
}

#[test]
fn test_nearest_ancestor_wins() {
    let mut unit = decode(unit(vec![
        class("Leaf", Some("Middle"), vec![]),
        class("Middle", Some("Root"), vec![method("size", Some("protected"), vec![])]),
        class("Root", None, vec![method("size", Some("protected"), vec![])]),
    ]));
    Compiler::default().desugar(&mut unit).unwrap();

    let leaf = find(&unit, "Leaf");
    let delegations: Vec<&str> = leaf
        .body_declarations
        .iter()
        .filter_map(|decl| match decl {
            BodyDeclaration::Delegation(d) => Some(d.declaring_class.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(delegations, ["Middle"]);
}
