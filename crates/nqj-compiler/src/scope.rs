//! Symbol environments for analysis.
//!
//! - [`MethodScope`]: locals and parameters visible at a point of a body
//! - [`ClassContext`]: fields and method signatures declared by one class
//!
//! Method scopes are copied on entering a nested block, so a declaration is
//! visible to the statements after it in the same block and in nested
//! blocks, but never to siblings or enclosing blocks.

use nqj_parser::ast::{FunctionDecl, VarDecl};
use rustc_hash::FxHashMap;

use crate::types::{ClassType, Type};

// ============================================================================
// Method Scope
// ============================================================================

/// A visible local variable or parameter.
#[derive(Debug, Clone)]
pub struct LocalVar<'ast> {
    pub decl: &'ast VarDecl<'ast>,
    pub ty: Type,
}

/// Variables visible inside a function body plus its declared return type.
#[derive(Debug, Clone)]
pub struct MethodScope<'ast> {
    function: &'ast str,
    return_type: Type,
    vars: FxHashMap<&'ast str, LocalVar<'ast>>,
}

impl<'ast> MethodScope<'ast> {
    pub fn new(function: &'ast str, return_type: Type) -> Self {
        Self {
            function,
            return_type,
            vars: FxHashMap::default(),
        }
    }

    /// A copy for a nested block; bindings added to it stay there.
    pub fn enter(&self) -> Self {
        self.clone()
    }

    /// Bind `decl`, replacing any visible variable of the same name.
    pub fn declare(&mut self, decl: &'ast VarDecl<'ast>, ty: Type) {
        self.vars.insert(decl.name.name, LocalVar { decl, ty });
    }

    pub fn lookup(&self, name: &str) -> Option<&LocalVar<'ast>> {
        self.vars.get(name)
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn function_name(&self) -> &'ast str {
        self.function
    }
}

// ============================================================================
// Class Context
// ============================================================================

/// A field declared by a class.
#[derive(Debug, Clone)]
pub struct FieldInfo<'ast> {
    pub decl: &'ast VarDecl<'ast>,
    pub ty: Type,
}

/// A method declared by a class, with resolved signature types.
#[derive(Debug, Clone)]
pub struct MethodSig<'ast> {
    pub decl: &'ast FunctionDecl<'ast>,
    pub params: Vec<Type>,
    pub return_type: Type,
}

/// Members a class declares itself; inherited members live in the
/// contexts of its ancestors.
#[derive(Debug, Clone)]
pub struct ClassContext<'ast> {
    class: ClassType,
    fields: FxHashMap<&'ast str, FieldInfo<'ast>>,
    methods: FxHashMap<&'ast str, MethodSig<'ast>>,
}

impl<'ast> ClassContext<'ast> {
    pub fn new(class: ClassType) -> Self {
        Self {
            class,
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    pub fn class(&self) -> &ClassType {
        &self.class
    }

    /// Returns `false` if the name is already taken.
    pub fn add_field(&mut self, decl: &'ast VarDecl<'ast>, ty: Type) -> bool {
        if self.fields.contains_key(decl.name.name) {
            return false;
        }
        self.fields.insert(decl.name.name, FieldInfo { decl, ty });
        true
    }

    /// Returns `false` if the name is already taken.
    pub fn add_method(&mut self, sig: MethodSig<'ast>) -> bool {
        let name = sig.decl.name.name;
        if self.methods.contains_key(name) {
            return false;
        }
        self.methods.insert(name, sig);
        true
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo<'ast>> {
        self.fields.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSig<'ast>> {
        self.methods.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use nqj_parser::Parser;

    #[test]
    fn nested_bindings_do_not_leak() {
        let arena = Bump::new();
        let program = Parser::parse("int f(int a, boolean b) { return a; }", &arena).unwrap();
        let f = program.functions[0];

        let mut outer = MethodScope::new("f", Type::Int);
        outer.declare(&f.params[0], Type::Int);

        let mut inner = outer.enter();
        inner.declare(&f.params[1], Type::Bool);
        assert!(inner.lookup("a").is_some());
        assert!(inner.lookup("b").is_some());
        assert!(outer.lookup("b").is_none());
        assert_eq!(inner.return_type(), &Type::Int);
        assert_eq!(inner.function_name(), "f");
    }

    #[test]
    fn class_members_are_unique() {
        let arena = Bump::new();
        let program = Parser::parse("class A { int x; boolean x; int m() { return 0; } }", &arena).unwrap();
        let decl = program.classes[0];
        let mut context = ClassContext::new(ClassType::new("A", 0, None));

        assert!(context.add_field(&decl.fields[0], Type::Int));
        assert!(!context.add_field(&decl.fields[1], Type::Bool));
        assert_eq!(context.field("x").map(|f| f.ty.clone()), Some(Type::Int));

        let sig = MethodSig {
            decl: &decl.methods[0],
            params: Vec::new(),
            return_type: Type::Int,
        };
        assert!(context.add_method(sig.clone()));
        assert!(!context.add_method(sig));
        assert!(context.method("m").is_some());
        assert_eq!(context.class().name(), "A");
    }
}
