//! Side tables written by analysis and read by translation.
//!
//! The syntax tree is never mutated; everything analysis learns about a
//! node is keyed by its [`NodeId`].

use nqj_parser::NodeId;
use nqj_parser::ast::{FunctionDecl, VarDecl};
use rustc_hash::FxHashMap;

use crate::types::{ClassType, Type};

/// What a variable use or field access refers to.
#[derive(Debug, Clone)]
pub enum VarBinding<'ast> {
    /// A parameter or local of the enclosing function.
    Local(&'ast VarDecl<'ast>),
    /// A field together with the class that declares it.
    Field {
        class: ClassType,
        decl: &'ast VarDecl<'ast>,
    },
}

/// The statically resolved target of a call.
#[derive(Debug, Clone)]
pub enum CallTarget<'ast> {
    /// The builtin print function.
    Print,
    Function(&'ast FunctionDecl<'ast>),
    /// A method together with the class that declares it.
    Method {
        class: ClassType,
        decl: &'ast FunctionDecl<'ast>,
    },
}

#[derive(Debug, Default)]
pub struct Annotations<'ast> {
    /// Expressions and assignable locations.
    types: FxHashMap<NodeId, Type>,
    /// Syntactic type nodes.
    type_exprs: FxHashMap<NodeId, Type>,
    bindings: FxHashMap<NodeId, VarBinding<'ast>>,
    calls: FxHashMap<NodeId, CallTarget<'ast>>,
}

impl<'ast> Annotations<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    pub fn set_type(&mut self, node: NodeId, ty: Type) {
        self.types.insert(node, ty);
    }

    pub fn resolved_type(&self, type_expr: NodeId) -> Option<&Type> {
        self.type_exprs.get(&type_expr)
    }

    pub fn set_resolved_type(&mut self, type_expr: NodeId, ty: Type) {
        self.type_exprs.insert(type_expr, ty);
    }

    pub fn binding(&self, node: NodeId) -> Option<&VarBinding<'ast>> {
        self.bindings.get(&node)
    }

    pub fn bind(&mut self, node: NodeId, binding: VarBinding<'ast>) {
        self.bindings.insert(node, binding);
    }

    pub fn call_target(&self, node: NodeId) -> Option<&CallTarget<'ast>> {
        self.calls.get(&node)
    }

    pub fn set_call_target(&mut self, node: NodeId, target: CallTarget<'ast>) {
        self.calls.insert(node, target);
    }
}
