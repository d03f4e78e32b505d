//! Statement lowering.
//!
//! A statement either leaves exactly one open block for the next one or
//! ends in a terminator, after which nothing is emitted until the builder
//! is switched to a fresh block.

use nqj_ir::IrType;
use nqj_parser::ast::{AssignStmt, Block, IfStmt, ReturnStmt, Stmt, WhileStmt};

use super::FunctionTranslator;

impl<'ast> FunctionTranslator<'_, '_, 'ast> {
    pub(super) fn translate_block(&mut self, block: &'ast Block<'ast>) {
        for stmt in block.stmts {
            match stmt {
                // Slots for locals are created at procedure entry.
                Stmt::VarDecl(_) => {}
                other => self.translate_stmt(other),
            }
        }
    }

    fn translate_stmt(&mut self, stmt: &'ast Stmt<'ast>) {
        if self.cx.options.emit_comments {
            self.b
                .comment(format!("line {}: {}", stmt.span().line, describe(stmt)));
        }
        match stmt {
            Stmt::VarDecl(decl) => {
                panic!(
                    "internal compiler error: declaration of `{}` outside a block",
                    decl.name.name
                )
            }
            Stmt::Expr(expr) => {
                self.translate_expr(expr);
            }
            Stmt::Assign(assign) => self.translate_assign(assign),
            Stmt::If(if_stmt) => self.translate_if(if_stmt),
            Stmt::While(while_stmt) => self.translate_while(while_stmt),
            Stmt::Return(ret) => self.translate_return(ret),
            Stmt::Block(block) => self.translate_block(block),
        }
    }

    fn translate_assign(&mut self, assign: &'ast AssignStmt<'ast>) {
        let address = self.translate_lvalue(assign.target);
        let value = self.translate_expr(assign.value);
        let target = self
            .b
            .operand_type(&address)
            .pointee()
            .cloned()
            .unwrap_or(IrType::Void);
        let value = self.cast(value, &target);
        self.b.store(address, value);
    }

    fn translate_if(&mut self, if_stmt: &'ast IfStmt<'ast>) {
        let condition = self.translate_expr(if_stmt.condition);
        let then_block = self.b.new_block("if_true");
        let else_block = self.b.new_block("if_false");
        let end = self.b.new_block("if_end");
        self.b.branch(condition, then_block, else_block);

        self.b.switch_to(then_block);
        self.translate_stmt(if_stmt.then_branch);
        self.b.jump(end);

        self.b.switch_to(else_block);
        if let Some(else_branch) = if_stmt.else_branch {
            self.translate_stmt(else_branch);
        }
        self.b.jump(end);

        self.b.switch_to(end);
    }

    fn translate_while(&mut self, while_stmt: &'ast WhileStmt<'ast>) {
        let condition_block = self.b.new_block("while_cond");
        let body = self.b.new_block("while_body");
        let end = self.b.new_block("while_end");
        self.b.jump(condition_block);

        self.b.switch_to(condition_block);
        let condition = self.translate_expr(while_stmt.condition);
        self.b.branch(condition, body, end);

        self.b.switch_to(body);
        self.translate_stmt(while_stmt.body);
        self.b.jump(condition_block);

        self.b.switch_to(end);
    }

    fn translate_return(&mut self, ret: &'ast ReturnStmt<'ast>) {
        let value = self.translate_expr(ret.value);
        let return_type = self.b.procedure().return_type.clone();
        let value = self.cast(value, &return_type);
        self.b.ret(value);
    }
}

fn describe(stmt: &Stmt<'_>) -> &'static str {
    match stmt {
        Stmt::VarDecl(_) => "declaration",
        Stmt::Expr(_) => "expression",
        Stmt::Assign(_) => "assignment",
        Stmt::If(_) => "if",
        Stmt::While(_) => "while",
        Stmt::Return(_) => "return",
        Stmt::Block(_) => "block",
    }
}
