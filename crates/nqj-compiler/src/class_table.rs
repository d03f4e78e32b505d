//! Class table construction.
//!
//! Classes are registered in four steps:
//!
//! 1. collect names; a repeated name is reported and the later declaration ignored
//! 2. resolve `extends` against the collected names; unknown superclasses are
//!    reported and the edge is severed
//! 3. walk every superclass chain; a class seen twice closes a cycle, every
//!    member of that cycle is reported and loses its edge
//! 4. materialize one [`ClassType`] per class, superclass first, memoized by name

use nqj_core::{CompilationError, Diagnostics};
use nqj_parser::ast::ClassDecl;
use rustc_hash::FxHashMap;

use crate::types::ClassType;

/// Name → class for every accepted class declaration.
#[derive(Debug, Default)]
pub struct ClassTable {
    by_name: FxHashMap<String, ClassType>,
    /// Accepted classes in declaration order.
    classes: Vec<ClassType>,
}

impl ClassTable {
    /// Build the table for `decls`, reporting hierarchy problems.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(decls: &[ClassDecl<'_>], diagnostics: &mut Diagnostics) -> Self {
        // Step 1: names.
        let mut index_of: FxHashMap<&str, usize> = FxHashMap::default();
        let mut accepted = Vec::new();
        for (index, decl) in decls.iter().enumerate() {
            if index_of.contains_key(decl.name.name) {
                diagnostics.push(CompilationError::DuplicateClass {
                    name: decl.name.name.to_string(),
                    span: decl.name.span,
                });
            } else {
                index_of.insert(decl.name.name, index);
                accepted.push(index);
            }
        }

        // Step 2: extends edges, indexed by declaration.
        let mut edges: Vec<Option<usize>> = vec![None; decls.len()];
        for &index in &accepted {
            let decl = &decls[index];
            let Some(superclass) = decl.extends else {
                continue;
            };
            match index_of.get(superclass.name) {
                Some(&target) => edges[index] = Some(target),
                None => diagnostics.push(CompilationError::UndeclaredSuperclass {
                    class: decl.name.name.to_string(),
                    superclass: superclass.name.to_string(),
                    span: superclass.span,
                }),
            }
        }

        // Step 3: cycles.
        for &start in &accepted {
            let mut visited: Vec<usize> = Vec::new();
            let mut current = Some(start);
            while let Some(index) = current {
                if let Some(position) = visited.iter().position(|&v| v == index) {
                    let cycle = &visited[position..];
                    let names: Vec<String> = cycle
                        .iter()
                        .map(|&member| decls[member].name.name.to_string())
                        .collect();
                    for &member in cycle {
                        diagnostics.push(CompilationError::CyclicInheritance {
                            class: decls[member].name.name.to_string(),
                            cycle: names.clone(),
                            span: decls[member].name.span,
                        });
                        edges[member] = None;
                    }
                    break;
                }
                visited.push(index);
                current = edges[index];
            }
        }

        // Step 4: descriptors.
        let mut memo: Vec<Option<ClassType>> = vec![None; decls.len()];
        let mut table = ClassTable::default();
        for &index in &accepted {
            let class = materialize(index, decls, &edges, &mut memo);
            table.by_name.insert(class.name().to_string(), class.clone());
            table.classes.push(class);
        }
        table
    }

    pub fn lookup(&self, name: &str) -> Option<&ClassType> {
        self.by_name.get(name)
    }

    /// Accepted classes in declaration order.
    pub fn classes(&self) -> &[ClassType] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// The edges are acyclic here, so the recursion terminates.
fn materialize(
    index: usize,
    decls: &[ClassDecl<'_>],
    edges: &[Option<usize>],
    memo: &mut Vec<Option<ClassType>>,
) -> ClassType {
    if let Some(class) = &memo[index] {
        return class.clone();
    }
    let superclass = edges[index].map(|parent| materialize(parent, decls, edges, memo));
    let class = ClassType::new(decls[index].name.name, index, superclass);
    memo[index] = Some(class.clone());
    class
}
