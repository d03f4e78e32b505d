//! Global functions and memoized array types.

use nqj_core::{CompilationError, Diagnostics};
use nqj_parser::ast::FunctionDecl;
use rustc_hash::FxHashMap;

use crate::types::{ArrayType, Type};

/// A callable global name.
#[derive(Debug, Clone, Copy)]
pub enum GlobalFunction<'ast> {
    /// The builtin `printInt(int) : int`.
    Print,
    Declared(&'ast FunctionDecl<'ast>),
}

/// Global function names and the array-type memo of one compilation.
#[derive(Debug)]
pub struct NameTable<'ast> {
    print_name: String,
    functions: FxHashMap<&'ast str, &'ast FunctionDecl<'ast>>,
    arrays: FxHashMap<Type, ArrayType>,
}

impl<'ast> NameTable<'ast> {
    /// Register `functions`; the first declaration of a name wins and every
    /// later one, including a redefinition of the builtin, is reported.
    pub fn build(
        functions: &'ast [FunctionDecl<'ast>],
        print_name: &str,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut table = Self {
            print_name: print_name.to_string(),
            functions: FxHashMap::default(),
            arrays: FxHashMap::default(),
        };
        for function in functions {
            let name = function.name.name;
            if name == table.print_name || table.functions.contains_key(name) {
                diagnostics.push(CompilationError::DuplicateFunction {
                    name: name.to_string(),
                    span: function.name.span,
                });
                continue;
            }
            table.functions.insert(name, function);
        }
        table
    }

    pub fn lookup_function(&self, name: &str) -> Option<GlobalFunction<'ast>> {
        if name == self.print_name {
            return Some(GlobalFunction::Print);
        }
        self.functions.get(name).copied().map(GlobalFunction::Declared)
    }

    /// Whether `decl` is the registered declaration of its name.
    pub fn is_registered(&self, decl: &FunctionDecl<'ast>) -> bool {
        self.functions
            .get(decl.name.name)
            .is_some_and(|registered| registered.id == decl.id)
    }

    pub fn print_name(&self) -> &str {
        &self.print_name
    }

    /// `component[]`, created once per component type.
    pub fn array_of(&mut self, component: Type) -> ArrayType {
        self.arrays
            .entry(component)
            .or_insert_with_key(|component| ArrayType::new(component.clone()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use nqj_parser::Parser;

    #[test]
    fn duplicates_and_builtin() {
        let arena = Bump::new();
        let source = "int f() { return 1; } int f() { return 2; } int printInt(int x) { return x; }";
        let program = Parser::parse(source, &arena).unwrap();
        let mut diagnostics = Diagnostics::new();
        let table = NameTable::build(program.functions, "printInt", &mut diagnostics);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|e| matches!(e, CompilationError::DuplicateFunction { .. })));
        assert!(matches!(table.lookup_function("printInt"), Some(GlobalFunction::Print)));
        let Some(GlobalFunction::Declared(f)) = table.lookup_function("f") else {
            panic!("f should be registered");
        };
        assert_eq!(f.id, program.functions[0].id);
        assert!(table.is_registered(&program.functions[0]));
        assert!(!table.is_registered(&program.functions[1]));
        assert!(table.lookup_function("g").is_none());
    }

    #[test]
    fn array_types_are_memoized() {
        let mut table = NameTable::build(&[], "printInt", &mut Diagnostics::new());
        let ints = table.array_of(Type::Int);
        assert!(ints == table.array_of(Type::Int));
        assert!(ints != table.array_of(Type::Bool));

        let nested = table.array_of(Type::Array(ints.clone()));
        let again = table.array_of(Type::Int);
        assert!(nested == table.array_of(Type::Array(again)));
        assert_eq!(nested.component(), &Type::Array(ints));
    }
}
