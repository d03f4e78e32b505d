//! Value lowering.
//!
//! Calls are fixed by analysis: a method call goes straight to the
//! procedure of the class that declares the method, with the receiver
//! reinterpreted as that class's struct. There is no runtime dispatch.

use nqj_ir::{BinOp, IrType, Operand};
use nqj_parser::ast::{BinaryOp, Expr, ExprKind, FunctionDecl, UnaryOp};

use super::{FunctionTranslator, known};
use crate::annotations::CallTarget;
use crate::types::ClassType;

impl<'ast> FunctionTranslator<'_, '_, 'ast> {
    pub(super) fn translate_expr(&mut self, expr: &'ast Expr<'ast>) -> Operand {
        match expr.kind {
            ExprKind::Unary { op, operand } => {
                let value = self.translate_expr(operand);
                match op {
                    UnaryOp::Neg => self.b.binary(BinOp::Sub, Operand::ConstInt(0), value),
                    UnaryOp::Not => self.b.binary(BinOp::Eq, Operand::ConstBool(false), value),
                }
            }
            ExprKind::Binary { op, left, right } => self.translate_binary(expr, op, left, right),
            // the parser admits `2147483648` only under unary minus, where it wraps to the minimum
            ExprKind::Number(value) => Operand::ConstInt(value as i32),
            ExprKind::Bool(value) => Operand::ConstBool(value),
            ExprKind::Null => Operand::Null,
            ExprKind::This => known(self.this, "receiver").into(),
            ExprKind::Read(lvalue) => {
                let address = self.translate_lvalue(lvalue);
                self.b.load(address)
            }
            ExprKind::ArrayLength(array) => {
                let base = self.translate_expr(array);
                self.null_check(&base, array.span);
                self.array_length(base)
            }
            ExprKind::NewObject(_) => {
                let class = known(self.type_of(expr.id).as_class().cloned(), "class of new object");
                let layout = self.class_layout(&class);
                let (constructor, ty) = (layout.constructor, layout.pointer_type());
                self.b.call(constructor, Vec::new(), ty)
            }
            ExprKind::NewArray { size, .. } => self.translate_new_array(expr, size),
            ExprKind::Call { args, .. } => self.translate_call(expr, args),
            ExprKind::MethodCall { receiver, args, .. } => self.translate_method_call(expr, receiver, args),
        }
    }

    // ==========================================================================
    // Operators
    // ==========================================================================

    fn translate_binary(
        &mut self,
        expr: &'ast Expr<'ast>,
        op: BinaryOp,
        left: &'ast Expr<'ast>,
        right: &'ast Expr<'ast>,
    ) -> Operand {
        match op {
            BinaryOp::And => self.translate_and(left, right),
            BinaryOp::Div => self.translate_div(expr, left, right),
            BinaryOp::Equal => self.translate_equal(left, right),
            BinaryOp::Add => self.simple_binary(BinOp::Add, left, right),
            BinaryOp::Sub => self.simple_binary(BinOp::Sub, left, right),
            BinaryOp::Mul => self.simple_binary(BinOp::Mul, left, right),
            BinaryOp::Less => self.simple_binary(BinOp::Slt, left, right),
        }
    }

    fn simple_binary(&mut self, op: BinOp, left: &'ast Expr<'ast>, right: &'ast Expr<'ast>) -> Operand {
        let left = self.translate_expr(left);
        let right = self.translate_expr(right);
        self.b.binary(op, left, right)
    }

    /// `left && right` through a stack slot; `right` only runs when `left`
    /// is true.
    fn translate_and(&mut self, left: &'ast Expr<'ast>, right: &'ast Expr<'ast>) -> Operand {
        let result = self.b.entry_slot(IrType::Bool);
        let left = self.translate_expr(left);
        self.b.store(result.into(), left.clone());

        let eval_right = self.b.new_block("and_right");
        let end = self.b.new_block("and_end");
        self.b.branch(left, eval_right, end);

        self.b.switch_to(eval_right);
        let right = self.translate_expr(right);
        self.b.store(result.into(), right);
        self.b.jump(end);

        self.b.switch_to(end);
        self.b.load(result.into())
    }

    /// Signed division. A zero divisor halts; `MIN / -1` yields `MIN`
    /// without dividing.
    fn translate_div(&mut self, expr: &'ast Expr<'ast>, left: &'ast Expr<'ast>, right: &'ast Expr<'ast>) -> Operand {
        let dividend = self.translate_expr(left);
        let divisor = self.translate_expr(right);

        let is_zero = self.b.binary(BinOp::Eq, divisor.clone(), Operand::ConstInt(0));
        let zero = self.b.new_block("div_by_zero");
        let non_zero = self.b.new_block("div_non_zero");
        self.b.branch(is_zero, zero, non_zero);
        self.b.switch_to(zero);
        self.b.halt(format!("Division by zero in line {}", expr.span.line));

        self.b.switch_to(non_zero);
        let result = self.b.entry_slot(IrType::Int);
        let minus_one = self.b.binary(BinOp::Eq, divisor.clone(), Operand::ConstInt(-1));
        let is_min = self.b.binary(BinOp::Eq, dividend.clone(), Operand::ConstInt(i32::MIN));
        let overflow = self.b.binary(BinOp::And, minus_one, is_min);
        self.b.store(result.into(), Operand::ConstInt(i32::MIN));
        let divide = self.b.new_block("div_no_overflow");
        let end = self.b.new_block("div_end");
        self.b.branch(overflow, end, divide);

        self.b.switch_to(divide);
        let quotient = self.b.binary(BinOp::Sdiv, dividend, divisor);
        self.b.store(result.into(), quotient);
        self.b.jump(end);

        self.b.switch_to(end);
        self.b.load(result.into())
    }

    /// `==` on values of one representation; differing class pointers are
    /// compared as the ancestor.
    fn translate_equal(&mut self, left: &'ast Expr<'ast>, right: &'ast Expr<'ast>) -> Operand {
        let left_value = self.translate_expr(left);
        let right_value = self.translate_expr(right);
        let left_ir = self.b.operand_type(&left_value);
        let right_ir = self.b.operand_type(&right_value);

        let left_type = self.type_of(left.id);
        let right_type = self.type_of(right.id);
        let right_is_narrower = match (left_type.as_class(), right_type.as_class()) {
            (Some(l), Some(r)) => r.is_subclass_of(l),
            _ => true,
        };
        let (left_value, right_value) = if right_is_narrower {
            let right_value = self.cast(right_value, &left_ir);
            (left_value, right_value)
        } else {
            let left_value = self.cast(left_value, &right_ir);
            (left_value, right_value)
        };
        self.b.binary(BinOp::Eq, left_value, right_value)
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    fn translate_call(&mut self, expr: &'ast Expr<'ast>, args: &'ast [Expr<'ast>]) -> Operand {
        let analysis = self.cx.analysis;
        match known(analysis.annotations.call_target(expr.id), "call target") {
            CallTarget::Print => {
                let value = self.translate_expr(known(args.first(), "print argument"));
                self.b.print(value);
                Operand::ConstInt(0)
            }
            CallTarget::Function(function) => {
                let sig = known(self.cx.layouts.function(function.name.name), "function skeleton").clone();
                let args = self.translate_args(args, &sig.params);
                self.b.call(sig.id, args, sig.return_type)
            }
            CallTarget::Method { class, decl } => {
                let receiver = self.this_as(class);
                self.call_method(receiver, class, decl, args)
            }
        }
    }

    fn translate_method_call(
        &mut self,
        expr: &'ast Expr<'ast>,
        receiver: &'ast Expr<'ast>,
        args: &'ast [Expr<'ast>],
    ) -> Operand {
        let analysis = self.cx.analysis;
        let object = self.translate_expr(receiver);
        self.null_check(&object, receiver.span);
        let CallTarget::Method { class, decl } = known(analysis.annotations.call_target(expr.id), "call target")
        else {
            panic!("internal compiler error: method call resolved to a global function");
        };
        let declaring = self.class_layout(class).pointer_type();
        let object = self.cast(object, &declaring);
        self.call_method(object, class, decl, args)
    }

    /// Call the procedure of `decl`, declared by `class`, on `receiver`.
    fn call_method(
        &mut self,
        receiver: Operand,
        class: &ClassType,
        decl: &FunctionDecl<'_>,
        args: &'ast [Expr<'ast>],
    ) -> Operand {
        let sig = known(self.class_layout(class).method(decl.name.name), "method skeleton").clone();
        let mut operands = vec![receiver];
        operands.extend(self.translate_args(args, &sig.params));
        self.b.call(sig.id, operands, sig.return_type)
    }

    /// Arguments left to right, each reinterpreted to its parameter type.
    fn translate_args(&mut self, args: &'ast [Expr<'ast>], params: &[IrType]) -> Vec<Operand> {
        args.iter()
            .zip(params)
            .map(|(arg, ty)| {
                let value = self.translate_expr(arg);
                self.cast(value, ty)
            })
            .collect()
    }
}
