//! Expression compilation.
//!
//! Every expression compiled through [`compile_expr`](BytecodeCompiler::compile_expr)
//! leaves exactly one value on the operand stack.

use stepvm_core::ast::{Assignment, Expr, InfixExpression};
use stepvm_core::{CompilationError, Value};

use crate::bytecode::{BinaryOperator, Instruction, UnaryOperator};

use super::{BytecodeCompiler, Result};

impl BytecodeCompiler {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::SimpleName(name) => {
                self.emitter.emit_load(name.as_str());
                Ok(())
            }
            Expr::NumberLiteral(literal) => {
                let value = Value::from_number_token(&literal.token).ok_or_else(|| {
                    CompilationError::InvalidNumberLiteral {
                        token: literal.token.clone(),
                    }
                })?;
                self.emitter.emit_const(value);
                Ok(())
            }
            Expr::BooleanLiteral(literal) => {
                self.emitter.emit_const(Value::Bool(literal.boolean_value));
                Ok(())
            }
            Expr::InfixExpression(infix) => self.compile_infix(infix),
            Expr::PrefixExpression(prefix) => {
                self.compile_unary(&prefix.operator, &prefix.operand, true)
            }
            Expr::PostfixExpression(postfix) => {
                self.compile_unary(&postfix.operator, &postfix.operand, false)
            }
            Expr::Assignment(assign) => self.compile_assignment(assign, true),
            Expr::ParenthesizedExpression(paren) => self.compile_expr(&paren.expression),
            Expr::FieldAccess(access) => match access.this_field() {
                Some(field) => {
                    self.emitter.emit_load(field);
                    Ok(())
                }
                None => Err(CompilationError::unsupported("FieldAccess", &self.context)),
            },
            Expr::VariableDeclarationExpression(_) | Expr::ThisExpression(_) => {
                Err(CompilationError::unsupported(expr.kind(), &self.context))
            }
        }
    }

    /// `a op b op c ...` folds left-associatively.
    fn compile_infix(&mut self, infix: &InfixExpression) -> Result<()> {
        let op = BinaryOperator::from_symbol(&infix.operator).ok_or_else(|| {
            CompilationError::UnsupportedOperator {
                operator: infix.operator.clone(),
                context: self.context.clone(),
            }
        })?;

        let mut operands: Vec<&Expr> = Vec::with_capacity(2 + infix.extended_operands.len());
        operands.push(&infix.left_operand);
        operands.push(&infix.right_operand);
        operands.extend(infix.extended_operands.iter());
        self.compile_operand_chain(op, &operands)
    }

    /// Push the rightmost operand, then the folded prefix, then apply `op`.
    fn compile_operand_chain(&mut self, op: BinaryOperator, operands: &[&Expr]) -> Result<()> {
        match operands {
            [] => Err(CompilationError::Internal {
                message: "infix expression without operands".to_string(),
            }),
            [single] => self.compile_expr(single),
            [rest @ .., last] => {
                self.compile_expr(last)?;
                self.compile_operand_chain(op, rest)?;
                self.emitter.emit(Instruction::BinaryOp(op));
                Ok(())
            }
        }
    }

    fn compile_unary(&mut self, symbol: &str, operand: &Expr, prefix: bool) -> Result<()> {
        let op = UnaryOperator::from_symbol(symbol)
            .filter(|op| prefix || op.writes_back())
            .ok_or_else(|| CompilationError::UnsupportedOperator {
                operator: symbol.to_string(),
                context: self.context.clone(),
            })?;

        if op.writes_back() {
            let target = assignment_target(operand)?.to_string();
            self.emitter.emit_load(&target);
            self.emitter.emit(Instruction::UnaryOp {
                op,
                prefix,
                target: Some(target),
            });
        } else {
            self.compile_expr(operand)?;
            self.emitter.emit(Instruction::UnaryOp {
                op,
                prefix: true,
                target: None,
            });
        }
        Ok(())
    }

    /// `x = e` stores `e`; `x op= e` stores `x op e`. In value position the
    /// stored value is reloaded.
    pub(super) fn compile_assignment(
        &mut self,
        assign: &Assignment,
        keep_value: bool,
    ) -> Result<()> {
        let target = assignment_target(&assign.left_hand_side)?;

        if assign.operator == "=" {
            self.compile_expr(&assign.right_hand_side)?;
        } else {
            let op = BinaryOperator::from_compound_assignment(&assign.operator).ok_or_else(|| {
                CompilationError::UnsupportedOperator {
                    operator: assign.operator.clone(),
                    context: self.context.clone(),
                }
            })?;
            self.compile_expr(&assign.right_hand_side)?;
            self.emitter.emit_load(target);
            self.emitter.emit(Instruction::BinaryOp(op));
        }

        self.emitter.emit_store(target);
        if keep_value {
            self.emitter.emit_load(target);
        }
        Ok(())
    }
}

/// Variable name written by an assignment or `++`/`--`.
fn assignment_target(expr: &Expr) -> Result<&str> {
    match expr {
        Expr::SimpleName(name) => Ok(name.as_str()),
        Expr::ParenthesizedExpression(paren) => assignment_target(&paren.expression),
        Expr::FieldAccess(access) => {
            access
                .this_field()
                .ok_or_else(|| CompilationError::NotAnLvalue {
                    kind: expr.kind().to_string(),
                })
        }
        _ => Err(CompilationError::NotAnLvalue {
            kind: expr.kind().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::compile::BytecodeCompiler;
    use crate::test_support::*;
    use stepvm_core::ast::{Expr, FieldAccess, InfixExpression, SimpleName, ThisExpression};
    use stepvm_core::CompilationError;

    fn compile_stmt_listing(expr: Expr) -> Result<Vec<String>, CompilationError> {
        let unit = unit(vec![class(
            "Main",
            None,
            vec![method("run", vec![], vec![expr_stmt(expr)])],
        )]);
        Ok(BytecodeCompiler::compile(&unit)?
            .instructions()
            .map(ToString::to_string)
            .collect())
    }

    fn this_field(name: &str) -> Expr {
        Expr::FieldAccess(FieldAccess {
            expression: Box::new(Expr::ThisExpression(ThisExpression {})),
            name: SimpleName::new(name),
        })
    }

    #[test]
    fn extended_operands_fold_left() {
        let expr = Expr::InfixExpression(InfixExpression {
            operator: "-".into(),
            left_operand: Box::new(num("10")),
            right_operand: Box::new(num("3")),
            extended_operands: vec![num("2")],
        });
        assert_eq!(
            compile_stmt_listing(expr).unwrap(),
            [
                "LOAD_CONST 2",
                "LOAD_CONST 3",
                "LOAD_CONST 10",
                "BINARY_OP -",
                "BINARY_OP -",
                "YIELD"
            ]
        );
    }

    #[test]
    fn compound_assignment_reads_target() {
        assert_eq!(
            compile_stmt_listing(assign("+=", "sum", name("i"))).unwrap(),
            [
                "LOAD_VAR i",
                "LOAD_VAR sum",
                "BINARY_OP +",
                "STORE_VAR sum",
                "YIELD"
            ]
        );
    }

    #[test]
    fn nested_assignment_reloads_value() {
        let expr = Expr::Assignment(stepvm_core::ast::Assignment {
            operator: "=".into(),
            left_hand_side: Box::new(name("a")),
            right_hand_side: Box::new(assign("=", "b", num("5"))),
        });
        assert_eq!(
            compile_stmt_listing(expr).unwrap(),
            [
                "LOAD_CONST 5",
                "STORE_VAR b",
                "LOAD_VAR b",
                "STORE_VAR a",
                "YIELD"
            ]
        );
    }

    #[test]
    fn prefix_and_postfix_forms() {
        assert_eq!(
            compile_stmt_listing(prefix("--", name("n"))).unwrap(),
            ["LOAD_VAR n", "UNARY_OP -- prefix -> n", "YIELD"]
        );
        assert_eq!(
            compile_stmt_listing(prefix("!", boolean(true))).unwrap(),
            ["LOAD_CONST true", "UNARY_OP ! prefix", "YIELD"]
        );
    }

    #[test]
    fn this_field_is_a_variable() {
        let expr = Expr::Assignment(stepvm_core::ast::Assignment {
            operator: "=".into(),
            left_hand_side: Box::new(this_field("count")),
            right_hand_side: Box::new(num("1")),
        });
        assert_eq!(
            compile_stmt_listing(expr).unwrap(),
            ["LOAD_CONST 1", "STORE_VAR count", "YIELD"]
        );
    }

    #[test]
    fn rejects_unknown_operators() {
        let err = compile_stmt_listing(infix("&&", boolean(true), boolean(false))).unwrap_err();
        assert_eq!(
            err,
            CompilationError::UnsupportedOperator {
                operator: "&&".into(),
                context: "Main.run".into()
            }
        );
        assert!(matches!(
            compile_stmt_listing(postfix("!", name("x"))),
            Err(CompilationError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn increment_needs_a_variable() {
        let err = compile_stmt_listing(prefix("++", num("1"))).unwrap_err();
        assert_eq!(
            err,
            CompilationError::NotAnLvalue {
                kind: "NumberLiteral".into()
            }
        );
    }

    #[test]
    fn invalid_number_literal() {
        let err = compile_stmt_listing(num("12abc")).unwrap_err();
        assert_eq!(
            err,
            CompilationError::InvalidNumberLiteral {
                token: "12abc".into()
            }
        );
    }
}
