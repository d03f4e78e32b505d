//! Addresses of assignable locations.

use nqj_ir::Operand;
use nqj_parser::ast::{Expr, LValue, LValueKind, VarDecl};

use super::{FunctionTranslator, known};
use crate::annotations::VarBinding;
use crate::types::ClassType;

impl<'ast> FunctionTranslator<'_, '_, 'ast> {
    /// Pointer to the storage `lvalue` denotes.
    pub(super) fn translate_lvalue(&mut self, lvalue: &'ast LValue<'ast>) -> Operand {
        let analysis = self.cx.analysis;
        match lvalue.kind {
            LValueKind::Var(_) => {
                let binding = known(analysis.annotations.binding(lvalue.id), "variable binding");
                match binding {
                    VarBinding::Local(decl) => self.slot(decl).into(),
                    VarBinding::Field { class, decl } => {
                        let receiver = self.this_as(class);
                        self.field_address(receiver, class, class, decl)
                    }
                }
            }
            LValueKind::Field { receiver, .. } => {
                let object = self.translate_expr(receiver);
                self.null_check(&object, receiver.span);
                let class = known(self.type_of(receiver.id).as_class().cloned(), "receiver class");
                let binding = known(analysis.annotations.binding(lvalue.id), "field binding");
                let VarBinding::Field { class: owner, decl } = binding else {
                    panic!("internal compiler error: field access bound to a local");
                };
                self.field_address(object, &class, owner, decl)
            }
            LValueKind::Index { array, index } => self.element_address(array, index, lvalue),
        }
    }

    /// Address of field `decl`, declared by `owner`, inside `object`, a
    /// pointer to `class`'s struct.
    fn field_address(
        &mut self,
        object: Operand,
        class: &ClassType,
        owner: &ClassType,
        decl: &VarDecl<'_>,
    ) -> Operand {
        let index = known(
            self.class_layout(class).field_index(owner.name(), decl.name.name),
            "field slot",
        );
        let ty = self.lower_type_expr(decl.ty);
        self.b.element_ptr(
            object,
            vec![Operand::ConstInt(0), Operand::ConstInt(index as i32)],
            ty,
        )
    }

    /// `array[index]` after the null and bounds checks.
    fn element_address(
        &mut self,
        array: &'ast Expr<'ast>,
        index: &'ast Expr<'ast>,
        lvalue: &'ast LValue<'ast>,
    ) -> Operand {
        let base = self.translate_expr(array);
        self.null_check(&base, array.span);
        let position = self.translate_expr(index);
        self.bounds_check(&base, &position, lvalue.span);

        let element = self.type_of(lvalue.id);
        let element = self.lower(&element);
        self.b.element_ptr(
            base,
            vec![Operand::ConstInt(0), Operand::ConstInt(1), position],
            element,
        )
    }
}
