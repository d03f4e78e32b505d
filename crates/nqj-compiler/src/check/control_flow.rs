//! Return placement rules.
//!
//! - every function and method except the global `main` ends with `return`
//! - a statement after a `return` in the same block is unreachable; nested
//!   blocks and `if` arms are checked the same way, loop bodies are not

use nqj_core::{CompilationError, Diagnostics};
use nqj_parser::ast::{Block, FunctionDecl, Program, Stmt};

use crate::class_table::ClassTable;

pub(super) fn check(program: &Program<'_>, classes: &ClassTable, diagnostics: &mut Diagnostics) {
    for function in program.functions {
        check_function(function, function.name.name == "main", diagnostics);
    }
    for class in classes.classes() {
        for method in program.classes[class.decl_index()].methods {
            check_function(method, false, diagnostics);
        }
    }
}

fn check_function(function: &FunctionDecl<'_>, is_main: bool, diagnostics: &mut Diagnostics) {
    check_block(&function.body, diagnostics);
    if !is_main && !ends_with_return(&function.body) {
        diagnostics.push(CompilationError::MissingReturn {
            function: function.name.name.to_string(),
            span: function.name.span,
        });
    }
}

/// Whether the last statement of `block` is a `return`.
pub(super) fn ends_with_return(block: &Block<'_>) -> bool {
    matches!(block.stmts.last(), Some(Stmt::Return(_)))
}

fn check_block(block: &Block<'_>, diagnostics: &mut Diagnostics) {
    let mut returned = false;
    for stmt in block.stmts {
        if returned {
            diagnostics.push(CompilationError::UnreachableStatement { span: stmt.span() });
        }
        check_nested(stmt, diagnostics);
        if matches!(stmt, Stmt::Return(_)) {
            returned = true;
        }
    }
}

fn check_nested(stmt: &Stmt<'_>, diagnostics: &mut Diagnostics) {
    match stmt {
        Stmt::Block(block) => check_block(block, diagnostics),
        Stmt::If(if_stmt) => {
            check_nested(if_stmt.then_branch, diagnostics);
            if let Some(else_branch) = if_stmt.else_branch {
                check_nested(else_branch, diagnostics);
            }
        }
        Stmt::While(_) | Stmt::VarDecl(_) | Stmt::Expr(_) | Stmt::Assign(_) | Stmt::Return(_) => {}
    }
}
