//! Expression checking.
//!
//! Every expression and assignable location gets its type recorded in the
//! annotations; variable uses and calls additionally get their resolved
//! declaration. An operand already typed `any` never causes a second
//! diagnostic.

use nqj_core::{CompilationError, Span};
use nqj_parser::ast::{BinaryOp, Expr, ExprKind, Ident, LValue, LValueKind, UnaryOp};

use super::Analyzer;
use crate::annotations::{CallTarget, VarBinding};
use crate::name_table::GlobalFunction;
use crate::scope::MethodScope;
use crate::types::{ClassType, Type};

impl<'ast> Analyzer<'ast> {
    pub(super) fn check_expr(&mut self, expr: &'ast Expr<'ast>, scope: &MethodScope<'ast>) -> Type {
        let ty = self.infer_expr(expr, scope);
        self.analysis.annotations.set_type(expr.id, ty.clone());
        ty
    }

    /// Check `expr` and require it to be a subtype of `expected`.
    fn expect(&mut self, expr: &'ast Expr<'ast>, expected: &Type, scope: &MethodScope<'ast>) {
        let found = self.check_expr(expr, scope);
        if found == Type::Null && expected.as_class().is_some() {
            return;
        }
        if !found.is_subtype_of(expected) {
            self.report(CompilationError::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
                span: expr.span,
            });
        }
    }

    fn infer_expr(&mut self, expr: &'ast Expr<'ast>, scope: &MethodScope<'ast>) -> Type {
        match expr.kind {
            ExprKind::Unary { op, operand } => {
                let ty = match op {
                    UnaryOp::Neg => Type::Int,
                    UnaryOp::Not => Type::Bool,
                };
                self.expect(operand, &ty, scope);
                ty
            }
            ExprKind::Binary { op, left, right } => self.check_binary(expr, op, left, right, scope),
            ExprKind::Number(_) => Type::Int,
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Null => Type::Null,
            ExprKind::This => match &self.current_class {
                Some(class) => Type::Class(class.clone()),
                None => {
                    self.report(CompilationError::ThisOutsideMethod { span: expr.span });
                    Type::Any
                }
            },
            ExprKind::Read(lvalue) => self.check_lvalue(lvalue, scope),
            ExprKind::ArrayLength(array) => {
                self.expect_array(array, scope);
                Type::Int
            }
            ExprKind::NewObject(name) => match self.analysis.classes.lookup(name.name) {
                Some(class) => Type::Class(class.clone()),
                None => {
                    self.report(CompilationError::UndeclaredClass {
                        name: name.name.to_string(),
                        span: name.span,
                    });
                    Type::Any
                }
            },
            ExprKind::NewArray { element, size } => {
                self.expect(size, &Type::Int, scope);
                let component = self.resolve_type(element);
                Type::Array(self.analysis.names.array_of(component))
            }
            ExprKind::Call { name, args } => self.check_call(expr, name, args, scope),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.check_method_call(expr, receiver, method, args, scope),
        }
    }

    fn check_binary(
        &mut self,
        expr: &'ast Expr<'ast>,
        op: BinaryOp,
        left: &'ast Expr<'ast>,
        right: &'ast Expr<'ast>,
        scope: &MethodScope<'ast>,
    ) -> Type {
        match op {
            BinaryOp::And => {
                self.expect(left, &Type::Bool, scope);
                self.expect(right, &Type::Bool, scope);
                Type::Bool
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                self.expect(left, &Type::Int, scope);
                self.expect(right, &Type::Int, scope);
                Type::Int
            }
            BinaryOp::Less => {
                self.expect(left, &Type::Int, scope);
                self.expect(right, &Type::Int, scope);
                Type::Bool
            }
            BinaryOp::Equal => {
                let l = self.check_expr(left, scope);
                let r = self.check_expr(right, scope);
                let null_vs_class = (l.as_class().is_some() && r == Type::Null)
                    || (l == Type::Null && r.as_class().is_some());
                if !null_vs_class && !l.is_subtype_of(&r) && !r.is_subtype_of(&l) {
                    self.report(CompilationError::IncomparableTypes {
                        left: l.to_string(),
                        right: r.to_string(),
                        span: expr.span,
                    });
                }
                Type::Bool
            }
        }
    }

    /// Check `expr` as an array; anything else degrades to `any`.
    fn expect_array(&mut self, expr: &'ast Expr<'ast>, scope: &MethodScope<'ast>) -> Type {
        let ty = self.check_expr(expr, scope);
        match ty {
            Type::Array(_) | Type::Any => ty,
            other => {
                self.report(CompilationError::NotAnArray {
                    found: other.to_string(),
                    span: expr.span,
                });
                Type::Any
            }
        }
    }

    /// Check `expr` as a call receiver or field owner.
    fn expect_class(&mut self, expr: &'ast Expr<'ast>, scope: &MethodScope<'ast>) -> Option<ClassType> {
        match self.check_expr(expr, scope) {
            Type::Class(class) => Some(class),
            Type::Any => None,
            other => {
                self.report(CompilationError::NotAClass {
                    found: other.to_string(),
                    span: expr.span,
                });
                None
            }
        }
    }

    // ==========================================================================
    // Locations
    // ==========================================================================

    pub(super) fn check_lvalue(&mut self, lvalue: &'ast LValue<'ast>, scope: &MethodScope<'ast>) -> Type {
        let ty = self.infer_lvalue(lvalue, scope);
        self.analysis.annotations.set_type(lvalue.id, ty.clone());
        ty
    }

    fn infer_lvalue(&mut self, lvalue: &'ast LValue<'ast>, scope: &MethodScope<'ast>) -> Type {
        match lvalue.kind {
            LValueKind::Var(name) => self.check_var_use(lvalue, name, scope),
            LValueKind::Field { receiver, field } => {
                let Some(class) = self.expect_class(receiver, scope) else {
                    return Type::Any;
                };
                match self.analysis.find_field(&class, field.name) {
                    Some((owner, info)) => {
                        self.analysis.annotations.bind(
                            lvalue.id,
                            VarBinding::Field {
                                class: owner,
                                decl: info.decl,
                            },
                        );
                        info.ty
                    }
                    None => {
                        self.report(CompilationError::UnknownField {
                            name: field.name.to_string(),
                            class: class.name().to_string(),
                            span: field.span,
                        });
                        Type::Any
                    }
                }
            }
            LValueKind::Index { array, index } => {
                let array_type = self.expect_array(array, scope);
                self.expect(index, &Type::Int, scope);
                match array_type {
                    Type::Array(array) => array.component().clone(),
                    _ => Type::Any,
                }
            }
        }
    }

    /// Locals and parameters shadow fields of the enclosing class chain.
    fn check_var_use(&mut self, lvalue: &'ast LValue<'ast>, name: Ident<'ast>, scope: &MethodScope<'ast>) -> Type {
        if let Some(local) = scope.lookup(name.name) {
            let ty = local.ty.clone();
            self.analysis
                .annotations
                .bind(lvalue.id, VarBinding::Local(local.decl));
            return ty;
        }
        let field = self
            .current_class
            .as_ref()
            .and_then(|class| self.analysis.find_field(class, name.name));
        match field {
            Some((owner, info)) => {
                self.analysis.annotations.bind(
                    lvalue.id,
                    VarBinding::Field {
                        class: owner,
                        decl: info.decl,
                    },
                );
                info.ty
            }
            None => {
                self.report(CompilationError::UnknownVariable {
                    name: name.name.to_string(),
                    span: name.span,
                });
                Type::Any
            }
        }
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Unqualified call: the enclosing class chain first, then global functions.
    fn check_call(
        &mut self,
        expr: &'ast Expr<'ast>,
        name: Ident<'ast>,
        args: &'ast [Expr<'ast>],
        scope: &MethodScope<'ast>,
    ) -> Type {
        let method = self
            .current_class
            .as_ref()
            .and_then(|class| self.analysis.find_method(class, name.name));
        if let Some((owner, sig)) = method {
            self.check_arguments(args, &sig.params, expr.span, scope);
            self.analysis.annotations.set_call_target(
                expr.id,
                CallTarget::Method {
                    class: owner,
                    decl: sig.decl,
                },
            );
            return sig.return_type;
        }

        match self.analysis.names.lookup_function(name.name) {
            Some(GlobalFunction::Print) => {
                self.check_arguments(args, &[Type::Int], expr.span, scope);
                self.analysis
                    .annotations
                    .set_call_target(expr.id, CallTarget::Print);
                Type::Int
            }
            Some(GlobalFunction::Declared(function)) => {
                let params: Vec<Type> = function.params.iter().map(|p| self.resolve_type(p.ty)).collect();
                let return_type = self.resolve_type(function.return_type);
                self.check_arguments(args, &params, expr.span, scope);
                self.analysis
                    .annotations
                    .set_call_target(expr.id, CallTarget::Function(function));
                return_type
            }
            None => {
                self.report(CompilationError::UnknownFunction {
                    name: name.name.to_string(),
                    span: name.span,
                });
                Type::Any
            }
        }
    }

    fn check_method_call(
        &mut self,
        expr: &'ast Expr<'ast>,
        receiver: &'ast Expr<'ast>,
        method: Ident<'ast>,
        args: &'ast [Expr<'ast>],
        scope: &MethodScope<'ast>,
    ) -> Type {
        let Some(class) = self.expect_class(receiver, scope) else {
            return Type::Any;
        };
        let Some((owner, sig)) = self.analysis.find_method(&class, method.name) else {
            self.report(CompilationError::UnknownMethod {
                name: method.name.to_string(),
                class: class.name().to_string(),
                span: method.span,
            });
            return Type::Any;
        };
        self.check_arguments(args, &sig.params, expr.span, scope);
        self.analysis.annotations.set_call_target(
            expr.id,
            CallTarget::Method {
                class: owner,
                decl: sig.decl,
            },
        );
        sig.return_type
    }

    /// Arity must match exactly; argument types are only checked when it does.
    fn check_arguments(
        &mut self,
        args: &'ast [Expr<'ast>],
        params: &[Type],
        span: Span,
        scope: &MethodScope<'ast>,
    ) {
        if args.len() > params.len() {
            self.report(CompilationError::TooManyArguments {
                expected: params.len(),
                found: args.len(),
                span,
            });
        } else if args.len() < params.len() {
            self.report(CompilationError::NotEnoughArguments {
                expected: params.len(),
                found: args.len(),
                span,
            });
        } else {
            for (arg, param) in args.iter().zip(params) {
                self.expect(arg, param, scope);
            }
        }
    }
}
