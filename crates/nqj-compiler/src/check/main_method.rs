//! Shape of the entry point: `int main()` ending with `return`.

use nqj_core::{CompilationError, Diagnostics};
use nqj_parser::ast::{Program, TypeKind};

use super::control_flow::ends_with_return;

pub(super) fn check(program: &Program<'_>, diagnostics: &mut Diagnostics) {
    let Some(main) = program.function("main") else {
        diagnostics.push(CompilationError::MissingMain);
        return;
    };
    if !matches!(main.return_type.kind, TypeKind::Int) {
        diagnostics.push(CompilationError::MainReturnType {
            span: main.return_type.span,
        });
    }
    if let Some(first) = main.params.first() {
        diagnostics.push(CompilationError::MainParameters { span: first.span });
    }
    if !ends_with_return(&main.body) {
        diagnostics.push(CompilationError::MainMissingReturn {
            span: main.name.span,
        });
    }
}
