//! Statement checking.

use nqj_core::CompilationError;
use nqj_parser::ast::{AssignStmt, Block, Expr, IfStmt, ReturnStmt, Stmt, VarDecl, WhileStmt};

use super::Analyzer;
use crate::scope::MethodScope;
use crate::types::Type;

impl<'ast> Analyzer<'ast> {
    /// Check a block under a copy of `outer`; declarations become visible
    /// to the statements that follow them.
    pub(super) fn check_block(&mut self, block: &'ast Block<'ast>, outer: &MethodScope<'ast>) {
        let mut scope = outer.enter();
        for stmt in block.stmts {
            match stmt {
                Stmt::VarDecl(decl) => self.check_var_decl(decl, &mut scope),
                other => self.check_stmt(other, &scope),
            }
        }
    }

    fn check_var_decl(&mut self, decl: &'ast VarDecl<'ast>, scope: &mut MethodScope<'ast>) {
        if scope.lookup(decl.name.name).is_some() {
            self.report(CompilationError::DuplicateVariable {
                name: decl.name.name.to_string(),
                function: scope.function_name().to_string(),
                span: decl.name.span,
            });
        }
        let ty = self.resolve_type(decl.ty);
        scope.declare(decl, ty);
    }

    fn check_stmt(&mut self, stmt: &'ast Stmt<'ast>, scope: &MethodScope<'ast>) {
        match stmt {
            // Not produced outside blocks; the binding would be invisible anyway.
            Stmt::VarDecl(decl) => {
                let mut scratch = scope.enter();
                self.check_var_decl(decl, &mut scratch);
            }
            Stmt::Expr(expr) => {
                self.check_expr(expr, scope);
            }
            Stmt::Assign(assign) => self.check_assign(assign, scope),
            Stmt::If(if_stmt) => self.check_if(if_stmt, scope),
            Stmt::While(while_stmt) => self.check_while(while_stmt, scope),
            Stmt::Return(ret) => self.check_return(ret, scope),
            Stmt::Block(block) => self.check_block(block, scope),
        }
    }

    fn check_assign(&mut self, assign: &'ast AssignStmt<'ast>, scope: &MethodScope<'ast>) {
        let target = self.check_lvalue(assign.target, scope);
        let value = self.check_expr(assign.value, scope);
        if value == Type::Null && target.as_class().is_some() {
            return;
        }
        if !value.is_subtype_of(&target) {
            self.report(CompilationError::InvalidAssignment {
                target: target.to_string(),
                found: value.to_string(),
                span: assign.value.span,
            });
        }
    }

    fn check_if(&mut self, if_stmt: &'ast IfStmt<'ast>, scope: &MethodScope<'ast>) {
        self.check_condition("if", if_stmt.condition, scope);
        self.check_stmt(if_stmt.then_branch, scope);
        if let Some(else_branch) = if_stmt.else_branch {
            self.check_stmt(else_branch, scope);
        }
    }

    fn check_while(&mut self, while_stmt: &'ast WhileStmt<'ast>, scope: &MethodScope<'ast>) {
        self.check_condition("while", while_stmt.condition, scope);
        self.check_stmt(while_stmt.body, scope);
    }

    fn check_condition(
        &mut self,
        construct: &'static str,
        condition: &'ast Expr<'ast>,
        scope: &MethodScope<'ast>,
    ) {
        let ty = self.check_expr(condition, scope);
        if !ty.is_subtype_of(&Type::Bool) {
            self.report(CompilationError::InvalidCondition {
                construct,
                found: ty.to_string(),
                span: condition.span,
            });
        }
    }

    fn check_return(&mut self, ret: &'ast ReturnStmt<'ast>, scope: &MethodScope<'ast>) {
        let found = self.check_expr(ret.value, scope);
        let expected = scope.return_type();
        if !found.is_subtype_of(expected) {
            self.report(CompilationError::InvalidReturn {
                expected: expected.to_string(),
                found: found.to_string(),
                span: ret.span,
            });
        }
    }
}
