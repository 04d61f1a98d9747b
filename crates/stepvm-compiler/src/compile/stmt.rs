//! Statement compilation.

use stepvm_core::ast::{
    Block, Expr, ForStatement, IfStatement, ReturnStatement, Stmt, VariableDeclarationFragment,
    WhileStatement,
};
use stepvm_core::Value;

use super::{BytecodeCompiler, Result};

impl BytecodeCompiler {
    /// Compile a block, yielding after each statement that emitted code.
    ///
    /// `return` places its own yield ahead of the jump out of the method.
    pub(super) fn compile_block(&mut self, block: &Block) -> Result<()> {
        for stmt in &block.statements {
            let start = self.emitter.code_size();
            self.compile_stmt(stmt)?;
            let yields_itself = matches!(stmt, Stmt::ReturnStatement(_));
            if self.emitter.code_size() > start && !yields_itself {
                self.emitter.emit_yield();
            }
        }
        Ok(())
    }

    pub(super) fn compile_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(block) => self.compile_block(block),
            Stmt::VariableDeclarationStatement(decl) => self.compile_fragments(&decl.fragments),
            Stmt::ExpressionStatement(stmt) => self.compile_effect(&stmt.expression),
            Stmt::IfStatement(stmt) => self.compile_if(stmt),
            Stmt::ForStatement(stmt) => self.compile_for(stmt),
            Stmt::WhileStatement(stmt) => self.compile_while(stmt),
            Stmt::BreakStatement(_) => Ok(self.emitter.emit_break()?),
            Stmt::ContinueStatement(_) => Ok(self.emitter.emit_continue()?),
            Stmt::ReturnStatement(stmt) => self.compile_return(stmt),
            // Desugaring artifacts and declarations carry no runtime effect.
            Stmt::EmptyStatement(_)
            | Stmt::TypeDeclarationStatement(_)
            | Stmt::SuperConstructorInvocation(_)
            | Stmt::Capture(_) => Ok(()),
        }
    }

    /// Store each initialized fragment. Uninitialized locals emit nothing.
    pub(super) fn compile_fragments(
        &mut self,
        fragments: &[VariableDeclarationFragment],
    ) -> Result<()> {
        for fragment in fragments {
            if let Some(init) = &fragment.initializer {
                self.compile_expr(init)?;
                self.emitter.emit_store(fragment.name.as_str());
            }
        }
        Ok(())
    }

    /// Compile an if statement.
    ///
    /// ```text
    /// [condition]
    /// JUMP_IF_FALSE else
    /// [then]
    /// JUMP end
    /// LABEL else
    /// [else]
    /// LABEL end
    /// ```
    fn compile_if(&mut self, stmt: &IfStatement) -> Result<()> {
        let else_label = self.emitter.new_label("else");
        let end_label = self.emitter.new_label("endif");

        self.compile_expr(&stmt.expression)?;
        self.emitter.emit_jump_if_false(&else_label);
        self.compile_stmt(&stmt.then_statement)?;
        self.emitter.emit_jump(&end_label);
        self.emitter.place_label(&else_label)?;
        if let Some(else_stmt) = &stmt.else_statement {
            self.compile_stmt(else_stmt)?;
        }
        self.emitter.place_label(&end_label)
    }

    /// Compile a for loop. A missing condition loops until `break`.
    ///
    /// ```text
    /// [initializers]
    /// LABEL top
    /// [condition]
    /// JUMP_IF_FALSE end
    /// [body]
    /// LABEL next
    /// [updaters]
    /// JUMP top
    /// LABEL end
    /// ```
    fn compile_for(&mut self, stmt: &ForStatement) -> Result<()> {
        for init in &stmt.initializers {
            self.compile_effect(init)?;
        }

        let top = self.emitter.new_label("for");
        let next = self.emitter.new_label("next");
        let end = self.emitter.new_label("endfor");

        self.emitter.place_label(&top)?;
        match &stmt.expression {
            Some(cond) => self.compile_expr(cond)?,
            None => self.emitter.emit_const(Value::Bool(true)),
        }
        self.emitter.emit_jump_if_false(&end);

        self.emitter.enter_loop(end.clone(), next.clone());
        let body = self.compile_stmt(&stmt.body).and_then(|()| {
            self.emitter.place_label(&next)?;
            stmt.updaters
                .iter()
                .try_for_each(|update| self.compile_effect(update))
        });
        self.emitter.exit_loop();
        body?;

        self.emitter.emit_jump(&top);
        self.emitter.place_label(&end)
    }

    /// Compile a while loop.
    ///
    /// ```text
    /// LABEL next
    /// [condition]
    /// JUMP_IF_FALSE end
    /// [body]
    /// JUMP next
    /// LABEL end
    /// ```
    fn compile_while(&mut self, stmt: &WhileStatement) -> Result<()> {
        let next = self.emitter.new_label("while");
        let end = self.emitter.new_label("endwhile");

        self.emitter.place_label(&next)?;
        self.compile_expr(&stmt.expression)?;
        self.emitter.emit_jump_if_false(&end);

        self.emitter.enter_loop(end.clone(), next.clone());
        let body = self.compile_stmt(&stmt.body);
        self.emitter.exit_loop();
        body?;

        self.emitter.emit_jump(&next);
        self.emitter.place_label(&end)
    }

    /// `return [expr]` completes as a statement with the returned value, then
    /// skips the rest of the method body.
    ///
    /// ```text
    /// [expr]
    /// YIELD
    /// JUMP return
    /// ```
    fn compile_return(&mut self, stmt: &ReturnStatement) -> Result<()> {
        if let Some(expr) = &stmt.expression {
            self.compile_expr(expr)?;
        }
        self.emitter.emit_yield();
        let target = self.return_target();
        self.emitter.emit_jump(&target);
        Ok(())
    }

    /// Compile an expression in statement position, where no value is needed.
    pub(super) fn compile_effect(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Assignment(assign) => self.compile_assignment(assign, false),
            Expr::VariableDeclarationExpression(decl) => self.compile_fragments(&decl.fragments),
            Expr::ParenthesizedExpression(paren) => self.compile_effect(&paren.expression),
            _ => self.compile_expr(expr),
        }
    }
}
