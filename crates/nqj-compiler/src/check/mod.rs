//! Name and type analysis.
//!
//! The [`Analyzer`] runs over a whole program and never stops at the first
//! problem: each failed check is pushed onto the diagnostics and analysis
//! continues with a degraded value (`any`, a severed edge, a skipped
//! override check).
//!
//! ## Phases
//!
//! 1. class table (hierarchy, duplicates, cycles)
//! 2. name table (global functions)
//! 3. `main` shape and control-flow rules
//! 4. member declaration for every class, then override checks
//! 5. bodies: methods of every class, then global functions
//!
//! Statement and expression rules live in [`stmt`] and [`expr`].

mod control_flow;
mod expr;
mod main_method;
mod stmt;

use nqj_core::{CompilationError, Diagnostics};
use nqj_parser::ast::{ClassDecl, FunctionDecl, Program, TypeExpr, TypeKind};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::annotations::Annotations;
use crate::class_table::ClassTable;
use crate::name_table::NameTable;
use crate::scope::{ClassContext, FieldInfo, MethodScope, MethodSig};
use crate::types::{ClassType, Type};

/// Everything analysis learned about a program.
#[derive(Debug)]
pub struct Analysis<'ast> {
    pub classes: ClassTable,
    pub names: NameTable<'ast>,
    /// Declared members per class name.
    pub contexts: FxHashMap<String, ClassContext<'ast>>,
    pub annotations: Annotations<'ast>,
    pub diagnostics: Diagnostics,
}

impl<'ast> Analysis<'ast> {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn context(&self, class: &ClassType) -> Option<&ClassContext<'ast>> {
        self.contexts.get(class.name())
    }

    /// The nearest class from `class` upwards that declares field `name`.
    pub fn find_field(&self, class: &ClassType, name: &str) -> Option<(ClassType, FieldInfo<'ast>)> {
        class.ancestors().find_map(|ancestor| {
            self.context(ancestor)
                .and_then(|context| context.field(name))
                .map(|field| (ancestor.clone(), field.clone()))
        })
    }

    /// The nearest class from `class` upwards that declares method `name`.
    pub fn find_method(&self, class: &ClassType, name: &str) -> Option<(ClassType, MethodSig<'ast>)> {
        class.ancestors().find_map(|ancestor| {
            self.context(ancestor)
                .and_then(|context| context.method(name))
                .map(|method| (ancestor.clone(), method.clone()))
        })
    }
}

/// Drives analysis of one program.
pub struct Analyzer<'ast> {
    program: Program<'ast>,
    analysis: Analysis<'ast>,
    /// Class whose method is being checked.
    current_class: Option<ClassType>,
}

impl<'ast> Analyzer<'ast> {
    pub fn new(program: Program<'ast>, print_name: &str) -> Self {
        let mut diagnostics = Diagnostics::new();
        let classes = ClassTable::build(program.classes, &mut diagnostics);
        let names = NameTable::build(program.functions, print_name, &mut diagnostics);
        Self {
            program,
            analysis: Analysis {
                classes,
                names,
                contexts: FxHashMap::default(),
                annotations: Annotations::new(),
                diagnostics,
            },
            current_class: None,
        }
    }

    /// Analyze the whole program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Analysis<'ast> {
        main_method::check(&self.program, &mut self.analysis.diagnostics);
        control_flow::check(&self.program, &self.analysis.classes, &mut self.analysis.diagnostics);

        let classes: Vec<ClassType> = self.analysis.classes.classes().to_vec();
        for class in &classes {
            self.declare_members(class);
        }
        for class in &classes {
            self.check_overrides(class);
        }
        for class in &classes {
            let decl = self.class_decl(class);
            self.current_class = Some(class.clone());
            for method in decl.methods {
                self.check_function(method);
            }
            self.current_class = None;
        }
        for function in self.program.functions {
            self.check_function(function);
        }

        tracing::debug!(
            classes = self.analysis.classes.len(),
            diagnostics = self.analysis.diagnostics.len(),
            "analysis finished"
        );
        self.analysis
    }

    fn report(&mut self, error: CompilationError) {
        self.analysis.diagnostics.push(error);
    }

    fn class_decl(&self, class: &ClassType) -> &'ast ClassDecl<'ast> {
        &self.program.classes[class.decl_index()]
    }

    // ==========================================================================
    // Type Resolution
    // ==========================================================================

    /// Resolve a syntactic type, memoized per node so an undeclared class
    /// is reported once per occurrence.
    pub(crate) fn resolve_type(&mut self, ty: &'ast TypeExpr<'ast>) -> Type {
        if let Some(resolved) = self.analysis.annotations.resolved_type(ty.id) {
            return resolved.clone();
        }
        let resolved = match ty.kind {
            TypeKind::Int => Type::Int,
            TypeKind::Bool => Type::Bool,
            TypeKind::Class(name) => match self.analysis.classes.lookup(name.name) {
                Some(class) => Type::Class(class.clone()),
                None => {
                    self.report(CompilationError::UndeclaredClass {
                        name: name.name.to_string(),
                        span: name.span,
                    });
                    Type::Any
                }
            },
            TypeKind::Array(component) => {
                let component = self.resolve_type(component);
                Type::Array(self.analysis.names.array_of(component))
            }
        };
        self.analysis
            .annotations
            .set_resolved_type(ty.id, resolved.clone());
        resolved
    }

    // ==========================================================================
    // Class Members
    // ==========================================================================

    fn declare_members(&mut self, class: &ClassType) {
        let decl = self.class_decl(class);
        let mut context = ClassContext::new(class.clone());

        for field in decl.fields {
            let ty = self.resolve_type(field.ty);
            if !context.add_field(field, ty) {
                self.report(CompilationError::DuplicateField {
                    name: field.name.name.to_string(),
                    class: class.name().to_string(),
                    span: field.name.span,
                });
            }
        }

        for method in decl.methods {
            let params = method.params.iter().map(|p| self.resolve_type(p.ty)).collect();
            let return_type = self.resolve_type(method.return_type);
            let sig = MethodSig {
                decl: method,
                params,
                return_type,
            };
            if !context.add_method(sig) {
                self.report(CompilationError::DuplicateMethod {
                    name: method.name.name.to_string(),
                    class: class.name().to_string(),
                    span: method.name.span,
                });
            }
        }

        self.analysis
            .contexts
            .insert(class.name().to_string(), context);
    }

    /// Each method overriding an ancestor's must keep the parameter count,
    /// keep every parameter type exactly and may narrow the return type.
    fn check_overrides(&mut self, class: &ClassType) {
        let Some(superclass) = class.superclass() else {
            return;
        };
        let Some(context) = self.analysis.context(class) else {
            return;
        };
        let mut problems = Vec::new();
        let decl = self.class_decl(class);
        for method in decl.methods {
            // Only the registered declaration of a duplicated name is checked.
            let Some(sig) = context.method(method.name.name) else {
                continue;
            };
            if sig.decl.id != method.id {
                continue;
            }
            let Some((_, overridden)) = self.analysis.find_method(superclass, method.name.name) else {
                continue;
            };
            let name = method.name.name.to_string();

            if sig.params.len() != overridden.params.len() {
                problems.push(CompilationError::OverrideParameterCount {
                    method: name,
                    span: method.name.span,
                });
                continue;
            }
            for ((param, ty), expected) in method.params.iter().zip(&sig.params).zip(&overridden.params) {
                if !ty.is_equal_to(expected) {
                    problems.push(CompilationError::OverrideParameterType {
                        method: name.clone(),
                        span: param.span,
                    });
                }
            }
            if !sig.return_type.is_subtype_of(&overridden.return_type) {
                problems.push(CompilationError::OverrideReturnType {
                    method: name,
                    span: method.return_type.span,
                });
            }
        }
        for problem in problems {
            self.report(problem);
        }
    }

    // ==========================================================================
    // Bodies
    // ==========================================================================

    fn check_function(&mut self, function: &'ast FunctionDecl<'ast>) {
        let return_type = self.resolve_type(function.return_type);
        let mut scope = MethodScope::new(function.name.name, return_type);

        let mut seen = FxHashSet::default();
        for param in function.params {
            if !seen.insert(param.name.name) {
                self.report(CompilationError::DuplicateParameter {
                    name: param.name.name.to_string(),
                    span: param.name.span,
                });
            }
            let ty = self.resolve_type(param.ty);
            scope.declare(param, ty);
        }

        self.check_block(&function.body, &scope);
    }
}
