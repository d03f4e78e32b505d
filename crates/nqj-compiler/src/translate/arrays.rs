//! Array length, bounds checks and allocators.
//!
//! `new T[n]` calls `newArray_<T>(n)`, created the first time an array of
//! that component type is requested. Its body is built after all user code:
//!
//! ```text
//! init:        n < 0 ? negative_size : good_size
//! good_size:   p = alloc(n * sizeof(T) + 4); p.length = n; i = 0
//! loop_cond:   i < n ? loop_body : done
//! loop_body:   p.data[i] = default(T); i = i + 1
//! done:        ret p
//! ```

use nqj_core::Span;
use nqj_ir::{BinOp, INT_SIZE, IrType, Operand, ProcId, Procedure};
use nqj_parser::ast::Expr;

use super::{FunctionTranslator, Translator, known, put_procedure, take_procedure};
use crate::emit::ProcBuilder;
use crate::layout::{ArrayLayout, default_value, mangle};
use crate::types::Type;

impl<'ast> FunctionTranslator<'_, '_, 'ast> {
    /// Load the length header of a non-null array.
    pub(super) fn array_length(&mut self, base: Operand) -> Operand {
        let address = self.b.element_ptr(
            base,
            vec![Operand::ConstInt(0), Operand::ConstInt(0)],
            IrType::Int,
        );
        self.b.load(address)
    }

    /// Halt unless `0 <= index < length`.
    pub(super) fn bounds_check(&mut self, base: &Operand, index: &Operand, span: Span) {
        let length = self.array_length(base.clone());
        let below_zero = self.b.binary(BinOp::Slt, index.clone(), Operand::ConstInt(0));
        let last = self.b.binary(BinOp::Sub, length, Operand::ConstInt(1));
        let past_end = self.b.binary(BinOp::Slt, last, index.clone());
        let out_of_bounds = self.b.binary(BinOp::Or, below_zero, past_end);

        let fail = self.b.new_block("out_of_bounds");
        let in_bounds = self.b.new_block("index_in_range");
        self.b.branch(out_of_bounds, fail, in_bounds);
        self.b.switch_to(fail);
        self.b.halt(format!("Index out of bounds error in line {}", span.line));
        self.b.switch_to(in_bounds);
    }

    pub(super) fn translate_new_array(&mut self, expr: &'ast Expr<'ast>, size: &'ast Expr<'ast>) -> Operand {
        let array_type = self.type_of(expr.id);
        let component = known(
            array_type.as_array().map(|array| array.component().clone()),
            "array type",
        );
        let allocator = self.cx.allocator(&component);
        let length = self.translate_expr(size);
        let ty = self.lower(&array_type);
        self.b.call(allocator, vec![length], ty)
    }
}

impl Translator<'_, '_> {
    /// The allocator for `component[]`; its body is built by
    /// [`finish_allocators`](Self::finish_allocators).
    fn allocator(&mut self, component: &Type) -> ProcId {
        if let Some(id) = self.allocators.get(component) {
            return *id;
        }
        let layout = self.layouts.array(&mut self.module, component);
        let mut proc = Procedure::new(format!("newArray_{}", mangle(component)), layout.pointer_type());
        proc.add_param("size", IrType::Int);
        let id = self.module.add_procedure(proc);
        tracing::trace!(%component, proc = %id, "array allocator requested");
        self.allocators.insert(component.clone(), id);
        self.pending.push((component.clone(), id));
        id
    }

    pub(super) fn finish_allocators(&mut self) {
        for (component, id) in std::mem::take(&mut self.pending) {
            let layout = self.layouts.array(&mut self.module, &component);
            let element_size = self.module.size_of(&layout.element);
            let proc = take_procedure(&mut self.module, id);
            let proc = build_allocator(proc, &layout, element_size);
            put_procedure(&mut self.module, id, proc);
        }
    }
}

fn build_allocator(proc: Procedure, layout: &ArrayLayout, element_size: u32) -> Procedure {
    let size: Operand = known(proc.params().first().copied(), "size parameter").into();
    let mut b = ProcBuilder::start(proc, "init");

    let negative = b.binary(BinOp::Slt, size.clone(), Operand::ConstInt(0));
    let fail = b.new_block("negative_size");
    let good = b.new_block("good_size");
    b.branch(negative, fail, good);
    b.switch_to(fail);
    b.halt("Array Size must be positive");

    b.switch_to(good);
    let bytes = b.binary(BinOp::Mul, size.clone(), Operand::ConstInt(element_size as i32));
    let total = b.binary(BinOp::Add, bytes, Operand::ConstInt(INT_SIZE as i32));
    let raw = b.alloc(total);
    let array = b.bitcast(raw, layout.pointer_type());
    let length = b.element_ptr(
        array.clone(),
        vec![Operand::ConstInt(0), Operand::ConstInt(0)],
        IrType::Int,
    );
    b.store(length, size.clone());
    let counter = b.entry_slot(IrType::Int);
    b.store(counter.into(), Operand::ConstInt(0));

    let condition = b.new_block("loop_cond");
    let body = b.new_block("loop_body");
    let done = b.new_block("done");
    b.jump(condition);

    b.switch_to(condition);
    let i = b.load(counter.into());
    let more = b.binary(BinOp::Slt, i, size);
    b.branch(more, body, done);

    b.switch_to(body);
    let i = b.load(counter.into());
    let element = b.element_ptr(
        array.clone(),
        vec![Operand::ConstInt(0), Operand::ConstInt(1), i.clone()],
        layout.element.clone(),
    );
    b.store(element, default_value(&layout.element));
    let next = b.binary(BinOp::Add, i, Operand::ConstInt(1));
    b.store(counter.into(), next);
    b.jump(condition);

    b.switch_to(done);
    b.ret(array);
    b.finish()
}
