//! Lowering of accepted programs to IR.
//!
//! Translation only runs after analysis produced no diagnostics and has no
//! error channel of its own: every fact it needs (types, bindings, call
//! targets, layouts) was recorded before, and a missing one is a compiler
//! bug.
//!
//! ## Phases
//!
//! 1. layouts: structs, constructors and every procedure skeleton
//! 2. global functions other than `main`
//! 3. methods, class by class
//! 4. `main`
//! 5. bodies of the array allocators requested along the way
//!
//! Each body is built by a [`FunctionTranslator`]; statements, locations,
//! values and array support live in [`stmt`], [`lvalue`], [`rvalue`] and
//! [`arrays`].

mod arrays;
mod lvalue;
mod rvalue;
mod stmt;

use nqj_core::Span;
use nqj_ir::{BinOp, IrType, Module, Operand, ProcId, Procedure, TempId};
use nqj_parser::NodeId;
use nqj_parser::ast::{Block, FunctionDecl, Program, Stmt, TypeExpr, VarDecl};
use rustc_hash::FxHashMap;

use crate::check::Analysis;
use crate::compiler::CompileOptions;
use crate::emit::ProcBuilder;
use crate::layout::{ClassLayout, Layouts, default_value};
use crate::types::{ClassType, Type};

/// Translate an accepted program.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn translate<'ast>(
    program: Program<'ast>,
    analysis: &Analysis<'ast>,
    options: &CompileOptions,
) -> Module {
    Translator::new(program, analysis, options).run()
}

/// Module-wide translation state.
pub(crate) struct Translator<'a, 'ast> {
    program: Program<'ast>,
    analysis: &'a Analysis<'ast>,
    options: &'a CompileOptions,
    module: Module,
    layouts: Layouts,
    /// Allocator procedure per array component type.
    allocators: FxHashMap<Type, ProcId>,
    /// Allocators whose bodies are still to be built.
    pending: Vec<(Type, ProcId)>,
}

impl<'a, 'ast> Translator<'a, 'ast> {
    fn new(program: Program<'ast>, analysis: &'a Analysis<'ast>, options: &'a CompileOptions) -> Self {
        let mut module = Module::new();
        let layouts = Layouts::build(&program, analysis, &mut module);
        Self {
            program,
            analysis,
            options,
            module,
            layouts,
            allocators: FxHashMap::default(),
            pending: Vec::new(),
        }
    }

    fn run(mut self) -> Module {
        let analysis = self.analysis;
        let program = self.program;

        for function in program.functions {
            if function.name.name == "main" || !analysis.names.is_registered(function) {
                continue;
            }
            let id = known(self.layouts.function(function.name.name), "function skeleton").id;
            self.translate_function(function, id, None);
        }

        for class in analysis.classes.classes() {
            for method in program.classes[class.decl_index()].methods {
                let registered = analysis
                    .context(class)
                    .and_then(|context| context.method(method.name.name))
                    .is_some_and(|sig| sig.decl.id == method.id);
                if !registered {
                    continue;
                }
                let layout = known(self.layouts.class(class.name()), "class layout");
                let id = known(layout.method(method.name.name), "method skeleton").id;
                self.translate_function(method, id, Some(class.clone()));
            }
        }

        if let Some(main) = program.function("main") {
            let id = known(self.layouts.function("main"), "main skeleton").id;
            self.translate_function(main, id, None);
        }

        self.finish_allocators();
        tracing::debug!(
            procedures = self.module.procedures().len(),
            allocators = self.allocators.len(),
            "translation finished"
        );
        self.module
    }

    fn translate_function(&mut self, function: &'ast FunctionDecl<'ast>, id: ProcId, class: Option<ClassType>) {
        let proc = take_procedure(&mut self.module, id);
        let mut translator = FunctionTranslator {
            b: ProcBuilder::start(proc, "entry"),
            cx: self,
            class,
            this: None,
            slots: FxHashMap::default(),
        };
        translator.translate_body(function);
        let proc = translator.b.finish();
        put_procedure(&mut self.module, id, proc);
    }
}

/// Translation of one function or method body.
pub(crate) struct FunctionTranslator<'t, 'a, 'ast> {
    cx: &'t mut Translator<'a, 'ast>,
    b: ProcBuilder,
    /// Class whose method is being translated.
    class: Option<ClassType>,
    /// Hidden receiver parameter of a method.
    this: Option<TempId>,
    /// Stack slot per parameter and local, keyed by declaration.
    slots: FxHashMap<NodeId, TempId>,
}

impl<'ast> FunctionTranslator<'_, '_, 'ast> {
    /// Copy parameters into slots, give every local of the body a slot
    /// holding its default, then translate the statements.
    fn translate_body(&mut self, function: &'ast FunctionDecl<'ast>) {
        let mut params = self.b.procedure().params().to_vec().into_iter();
        if self.class.is_some() {
            self.this = params.next();
        }
        for (decl, temp) in function.params.iter().zip(params) {
            let ty = self.b.operand_type(&Operand::from(temp));
            let slot = self.b.entry_slot(ty);
            self.b.store(slot.into(), temp.into());
            self.slots.insert(decl.id, slot);
        }

        let mut locals = Vec::new();
        collect_locals(&function.body, &mut locals);
        for decl in locals {
            let ty = self.lower_type_expr(decl.ty);
            let slot = self.b.entry_slot(ty.clone());
            self.b.store(slot.into(), default_value(&ty));
            self.slots.insert(decl.id, slot);
        }

        self.translate_block(&function.body);
    }

    // ==========================================================================
    // Analysis Facts
    // ==========================================================================

    fn type_of(&self, node: NodeId) -> Type {
        known(self.cx.analysis.annotations.type_of(node), "expression type").clone()
    }

    fn lower(&mut self, ty: &Type) -> IrType {
        let cx = &mut *self.cx;
        cx.layouts.lower(&mut cx.module, ty)
    }

    fn lower_type_expr(&mut self, ty: &TypeExpr<'_>) -> IrType {
        let resolved = known(self.cx.analysis.annotations.resolved_type(ty.id), "resolved type").clone();
        self.lower(&resolved)
    }

    fn class_layout(&self, class: &ClassType) -> &ClassLayout {
        known(self.cx.layouts.class(class.name()), "class layout")
    }

    fn slot(&self, decl: &VarDecl<'_>) -> TempId {
        *known(self.slots.get(&decl.id), "variable slot")
    }

    // ==========================================================================
    // Shared Lowering
    // ==========================================================================

    /// Reinterpret a pointer whose type differs from the pointer type
    /// `target`; everything else, `null` included, passes through.
    fn cast(&mut self, value: Operand, target: &IrType) -> Operand {
        let ty = self.b.operand_type(&value);
        if matches!(target, IrType::Pointer(_)) && matches!(ty, IrType::Pointer(_)) && ty != *target {
            self.b.bitcast(value, target.clone())
        } else {
            value
        }
    }

    /// The receiver reinterpreted as a pointer to `class`'s struct.
    fn this_as(&mut self, class: &ClassType) -> Operand {
        let this = known(self.this, "receiver");
        let target = self.class_layout(class).pointer_type();
        self.cast(this.into(), &target)
    }

    /// Halt with a null pointer message when `value` is null.
    fn null_check(&mut self, value: &Operand, span: Span) {
        let is_null = self.b.binary(BinOp::Eq, value.clone(), Operand::Null);
        let null_block = self.b.new_block("is_null");
        let not_null = self.b.new_block("not_null");
        self.b.branch(is_null, null_block, not_null);
        self.b.switch_to(null_block);
        self.b.halt(format!("Nullpointer exception in line {}", span.line));
        self.b.switch_to(not_null);
    }
}

/// Every local declared anywhere in `block`, in source order.
fn collect_locals<'ast>(block: &'ast Block<'ast>, out: &mut Vec<&'ast VarDecl<'ast>>) {
    for stmt in block.stmts {
        collect_stmt_locals(stmt, out);
    }
}

fn collect_stmt_locals<'ast>(stmt: &'ast Stmt<'ast>, out: &mut Vec<&'ast VarDecl<'ast>>) {
    match stmt {
        Stmt::VarDecl(decl) => out.push(decl),
        Stmt::Block(block) => collect_locals(block, out),
        Stmt::If(if_stmt) => {
            collect_stmt_locals(if_stmt.then_branch, out);
            if let Some(else_branch) = if_stmt.else_branch {
                collect_stmt_locals(else_branch, out);
            }
        }
        Stmt::While(while_stmt) => collect_stmt_locals(while_stmt.body, out),
        Stmt::Expr(_) | Stmt::Assign(_) | Stmt::Return(_) => {}
    }
}

/// Unwrap a fact analysis guarantees for accepted programs.
fn known<T>(fact: Option<T>, what: &str) -> T {
    match fact {
        Some(value) => value,
        None => panic!("internal compiler error: no {what} recorded for an accepted program"),
    }
}

fn take_procedure(module: &mut Module, id: ProcId) -> Procedure {
    let slot = known(module.procedure_mut(id), "procedure skeleton");
    std::mem::replace(slot, Procedure::new(String::new(), IrType::Void))
}

fn put_procedure(module: &mut Module, id: ProcId, proc: Procedure) {
    *known(module.procedure_mut(id), "procedure skeleton") = proc;
}
