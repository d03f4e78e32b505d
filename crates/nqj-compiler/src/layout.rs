//! Object layouts and procedure skeletons.
//!
//! Every class becomes one IR struct holding its flattened fields:
//! the superclass's fields first, in the superclass's order, then the
//! fields the class adds. A field redeclared in a subclass gets a slot of
//! its own and hides the inherited one, which stays in place for the
//! superclass's code. A subclass struct therefore always starts with
//! exactly its superclass struct and a pointer can be reinterpreted upwards.
//!
//! Arrays are `{ length: int, data: [elem x 0] }` structs, one per
//! component type, created on first use.
//!
//! [`Layouts::build`] also registers every procedure the translator may
//! call before any body exists: one `<Class>_Create_Default` constructor
//! per class (with its body), one `<Class>_<method>` skeleton per method
//! and one skeleton per global function.

use nqj_ir::{IrType, Module, Operand, ProcId, Procedure, StructField, StructId};
use nqj_parser::ast::{Program, TypeExpr};
use rustc_hash::FxHashMap;

use crate::check::Analysis;
use crate::emit::ProcBuilder;
use crate::types::{ClassType, Type};

/// A registered procedure and its IR signature. For methods `params`
/// excludes the hidden receiver.
#[derive(Debug, Clone)]
pub struct ProcSig {
    pub id: ProcId,
    pub params: Vec<IrType>,
    pub return_type: IrType,
}

/// One struct slot: a field and the class that declares it.
#[derive(Debug, Clone)]
struct FieldSlot {
    owner: String,
    name: String,
    ty: Type,
}

#[derive(Debug, Clone)]
pub struct ClassLayout {
    pub struct_id: StructId,
    /// Flattened fields; the position is the struct slot.
    fields: Vec<FieldSlot>,
    pub constructor: ProcId,
    methods: FxHashMap<String, ProcSig>,
}

impl ClassLayout {
    /// Slot of field `name` as declared by `owner`, this class or one of
    /// its ancestors.
    pub fn field_index(&self, owner: &str, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.owner == owner && field.name == name)
    }

    /// Procedure of a method this class declares itself.
    pub fn method(&self, name: &str) -> Option<&ProcSig> {
        self.methods.get(name)
    }

    /// `%Class*`, the IR type of a reference to this class.
    pub fn pointer_type(&self) -> IrType {
        IrType::pointer_to(IrType::Struct(self.struct_id))
    }
}

#[derive(Debug, Clone)]
pub struct ArrayLayout {
    pub struct_id: StructId,
    pub element: IrType,
}

impl ArrayLayout {
    pub fn pointer_type(&self) -> IrType {
        IrType::pointer_to(IrType::Struct(self.struct_id))
    }
}

/// Struct types and procedure signatures of one module.
#[derive(Debug, Default)]
pub struct Layouts {
    structs: FxHashMap<String, StructId>,
    classes: FxHashMap<String, ClassLayout>,
    functions: FxHashMap<String, ProcSig>,
    arrays: FxHashMap<Type, ArrayLayout>,
}

impl Layouts {
    /// Lay out every class of an accepted program and register all
    /// constructors and procedure skeletons in `module`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(program: &Program<'_>, analysis: &Analysis<'_>, module: &mut Module) -> Self {
        let mut layouts = Self::default();
        let classes = analysis.classes.classes();

        for class in classes {
            let id = module.add_struct(class.name());
            layouts.structs.insert(class.name().to_string(), id);
        }

        let mut flattened = FxHashMap::default();
        for class in classes {
            let fields = flatten(class, program, analysis, &mut flattened);
            let Some(struct_id) = layouts.struct_id(class.name()) else {
                continue;
            };
            let struct_fields = fields
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    let hides = fields[..index].iter().any(|other| other.name == field.name);
                    StructField {
                        name: if hides {
                            format!("{}.{}", field.owner, field.name)
                        } else {
                            field.name.clone()
                        },
                        ty: layouts.lower(module, &field.ty),
                    }
                })
                .collect();
            if let Some(struct_type) = module.struct_type_mut(struct_id) {
                struct_type.fields = struct_fields;
            }
            let constructor = build_constructor(module, class.name(), struct_id);
            layouts.classes.insert(
                class.name().to_string(),
                ClassLayout {
                    struct_id,
                    fields,
                    constructor,
                    methods: FxHashMap::default(),
                },
            );
        }

        for class in classes {
            layouts.register_methods(class, program, analysis, module);
        }

        for function in program.functions {
            if !analysis.names.is_registered(function) {
                continue;
            }
            let params: Vec<IrType> = function
                .params
                .iter()
                .map(|param| layouts.lower_resolved(module, analysis, param.ty))
                .collect();
            let return_type = layouts.lower_resolved(module, analysis, function.return_type);
            let mut proc = Procedure::new(function.name.name, return_type.clone());
            for (param, ty) in function.params.iter().zip(&params) {
                proc.add_param(param.name.name, ty.clone());
            }
            let id = module.add_procedure(proc);
            layouts.functions.insert(
                function.name.name.to_string(),
                ProcSig {
                    id,
                    params,
                    return_type,
                },
            );
        }

        tracing::debug!(
            structs = module.structs().len(),
            procedures = module.procedures().len(),
            "layouts built"
        );
        layouts
    }

    fn register_methods(
        &mut self,
        class: &ClassType,
        program: &Program<'_>,
        analysis: &Analysis<'_>,
        module: &mut Module,
    ) {
        let Some(context) = analysis.context(class) else {
            return;
        };
        let Some(receiver) = self.class(class.name()).map(ClassLayout::pointer_type) else {
            return;
        };
        let mut methods = FxHashMap::default();
        for method in program.classes[class.decl_index()].methods {
            // A duplicated name only gets its first declaration.
            if context
                .method(method.name.name)
                .is_none_or(|sig| sig.decl.id != method.id)
            {
                continue;
            }
            let params: Vec<IrType> = method
                .params
                .iter()
                .map(|param| self.lower_resolved(module, analysis, param.ty))
                .collect();
            let return_type = self.lower_resolved(module, analysis, method.return_type);

            let mut proc = Procedure::new(
                format!("{}_{}", class.name(), method.name.name),
                return_type.clone(),
            );
            proc.add_param("this", receiver.clone());
            for (param, ty) in method.params.iter().zip(&params) {
                proc.add_param(param.name.name, ty.clone());
            }
            let id = module.add_procedure(proc);
            methods.insert(
                method.name.name.to_string(),
                ProcSig {
                    id,
                    params,
                    return_type,
                },
            );
        }
        if let Some(layout) = self.classes.get_mut(class.name()) {
            layout.methods = methods;
        }
    }

    pub fn class(&self, name: &str) -> Option<&ClassLayout> {
        self.classes.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&ProcSig> {
        self.functions.get(name)
    }

    pub fn struct_id(&self, class: &str) -> Option<StructId> {
        self.structs.get(class).copied()
    }

    // ==========================================================================
    // Type Lowering
    // ==========================================================================

    /// IR representation of a value of type `ty`. Classes and arrays are
    /// pointers to their structs.
    pub fn lower(&mut self, module: &mut Module, ty: &Type) -> IrType {
        match ty {
            Type::Int => IrType::Int,
            Type::Bool => IrType::Bool,
            Type::Null => IrType::NullPointer,
            Type::Any => IrType::pointer_to(IrType::Byte),
            Type::Class(class) => match self.struct_id(class.name()) {
                Some(id) => IrType::pointer_to(IrType::Struct(id)),
                None => IrType::pointer_to(IrType::Byte),
            },
            Type::Array(array) => self.array(module, array.component()).pointer_type(),
        }
    }

    fn lower_resolved(&mut self, module: &mut Module, analysis: &Analysis<'_>, ty: &TypeExpr<'_>) -> IrType {
        let resolved = analysis
            .annotations
            .resolved_type(ty.id)
            .cloned()
            .unwrap_or(Type::Any);
        self.lower(module, &resolved)
    }

    /// Layout of `component[]`, created on first request.
    pub fn array(&mut self, module: &mut Module, component: &Type) -> ArrayLayout {
        if let Some(layout) = self.arrays.get(component) {
            return layout.clone();
        }
        let element = self.lower(module, component);
        let struct_id = module.add_struct(format!("array_{}", mangle(component)));
        if let Some(struct_type) = module.struct_type_mut(struct_id) {
            struct_type.fields = vec![
                StructField {
                    name: "length".into(),
                    ty: IrType::Int,
                },
                StructField {
                    name: "data".into(),
                    ty: IrType::Array {
                        element: Box::new(element.clone()),
                        len: 0,
                    },
                },
            ];
        }
        let layout = ArrayLayout { struct_id, element };
        self.arrays.insert(component.clone(), layout.clone());
        layout
    }
}

/// Name fragment for per-type struct and procedure names.
pub fn mangle(ty: &Type) -> String {
    match ty {
        Type::Int => "int".into(),
        Type::Bool => "boolean".into(),
        Type::Class(class) => class.name().into(),
        Type::Array(array) => format!("array_{}", mangle(array.component())),
        Type::Null | Type::Any => "any".into(),
    }
}

/// Runtime default of a field, array element or local: 0, false or null.
pub fn default_value(ty: &IrType) -> Operand {
    match ty {
        IrType::Int => Operand::ConstInt(0),
        IrType::Bool => Operand::ConstBool(false),
        _ => Operand::Null,
    }
}

/// Flattened fields of `class`, superclass first.
fn flatten(
    class: &ClassType,
    program: &Program<'_>,
    analysis: &Analysis<'_>,
    memo: &mut FxHashMap<String, Vec<FieldSlot>>,
) -> Vec<FieldSlot> {
    if let Some(done) = memo.get(class.name()) {
        return done.clone();
    }
    let mut fields = match class.superclass() {
        Some(superclass) => flatten(superclass, program, analysis, memo),
        None => Vec::new(),
    };
    for field in program.classes[class.decl_index()].fields {
        if fields
            .iter()
            .any(|slot| slot.owner == class.name() && slot.name == field.name.name)
        {
            continue;
        }
        let ty = analysis
            .annotations
            .resolved_type(field.ty.id)
            .cloned()
            .unwrap_or(Type::Any);
        fields.push(FieldSlot {
            owner: class.name().to_string(),
            name: field.name.name.to_string(),
            ty,
        });
    }
    memo.insert(class.name().to_string(), fields.clone());
    fields
}

/// `<Class>_Create_Default`: allocate, store every field's default, return.
fn build_constructor(module: &mut Module, class: &str, struct_id: StructId) -> ProcId {
    let object_type = IrType::pointer_to(IrType::Struct(struct_id));
    let mut b = ProcBuilder::start(
        Procedure::new(format!("{class}_Create_Default"), object_type.clone()),
        "entry",
    );
    let size = module.size_of(&IrType::Struct(struct_id));
    let raw = b.alloc(Operand::ConstInt(size as i32));
    let object = b.bitcast(raw, object_type);

    let fields = module
        .struct_type(struct_id)
        .map(|s| s.fields.clone())
        .unwrap_or_default();
    for (index, field) in fields.into_iter().enumerate() {
        let address = b.element_ptr(
            object.clone(),
            vec![Operand::ConstInt(0), Operand::ConstInt(index as i32)],
            field.ty.clone(),
        );
        b.store(address, default_value(&field.ty));
    }
    b.ret(object);
    module.add_procedure(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Analyzer;
    use bumpalo::Bump;
    use nqj_ir::{ExecOptions, Interpreter, Value};
    use nqj_parser::Parser;

    fn field_names(module: &Module, layouts: &Layouts, class: &str) -> Vec<String> {
        let id = layouts.struct_id(class).unwrap();
        module
            .struct_type(id)
            .unwrap()
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    #[test]
    fn superclass_fields_form_prefix() {
        let arena = Bump::new();
        let source = r#"
            class C extends B { int c; boolean a; }
            class A { int a; boolean b; }
            class B extends A { A next; int a; int d; }
            int main() { return 0; }
        "#;
        let program = Parser::parse(source, &arena).unwrap();
        let analysis = Analyzer::new(program, "printInt").run();
        assert!(analysis.is_success(), "{}", analysis.diagnostics);

        let mut module = Module::new();
        let layouts = Layouts::build(&program, &analysis, &mut module);

        let a = field_names(&module, &layouts, "A");
        let b = field_names(&module, &layouts, "B");
        let c = field_names(&module, &layouts, "C");
        assert_eq!(a, ["a", "b"]);
        assert_eq!(b, ["a", "b", "next", "B.a", "d"]);
        assert_eq!(c, ["a", "b", "next", "B.a", "d", "c", "C.a"]);

        let a_struct = &module.struct_type(layouts.struct_id("A").unwrap()).unwrap().fields;
        let c_struct = &module.struct_type(layouts.struct_id("C").unwrap()).unwrap().fields;
        assert_eq!(&c_struct[..a_struct.len()], &a_struct[..]);
        assert_eq!(c_struct[6].ty, IrType::Bool);

        let c_layout = layouts.class("C").unwrap();
        assert_eq!(c_layout.field_index("A", "a"), Some(0));
        assert_eq!(c_layout.field_index("B", "a"), Some(3));
        assert_eq!(c_layout.field_index("C", "a"), Some(6));
        assert_eq!(c_layout.field_index("C", "b"), None);
    }

    #[test]
    fn skeletons_registered() {
        let arena = Bump::new();
        let source = r#"
            class A { int f(int x) { return x; } }
            int g(boolean b) { return 1; }
            int main() { return 0; }
        "#;
        let program = Parser::parse(source, &arena).unwrap();
        let analysis = Analyzer::new(program, "printInt").run();
        let mut module = Module::new();
        let layouts = Layouts::build(&program, &analysis, &mut module);

        for name in ["A_Create_Default", "A_f", "g", "main"] {
            assert!(module.find_procedure(name).is_some(), "{name} missing");
        }
        let method = layouts.class("A").unwrap().method("f").unwrap();
        assert_eq!(method.params, [IrType::Int]);
        let proc = module.procedure(method.id).unwrap();
        assert_eq!(proc.params().len(), 2);
        assert_eq!(layouts.function("g").unwrap().params, [IrType::Bool]);
    }

    #[test]
    fn constructor_initializes_fields() {
        let arena = Bump::new();
        let source = r#"
            class P { int x; boolean flag; P next; }
            int main() { return 0; }
        "#;
        let program = Parser::parse(source, &arena).unwrap();
        let analysis = Analyzer::new(program, "printInt").run();
        let mut module = Module::new();
        let layouts = Layouts::build(&program, &analysis, &mut module);
        let constructor = layouts.class("P").unwrap().constructor;

        // Bodies other than the constructor are still empty skeletons.
        let mut interpreter = Interpreter::new(&module, ExecOptions::default());
        let object = interpreter.call(constructor, Vec::new()).unwrap();
        let Value::Pointer(Some(address)) = object else {
            panic!("expected object pointer, got {object:?}");
        };
        let memory = interpreter.memory();
        assert_eq!(memory.load(Some(address)).unwrap(), Value::Int(0));
        let flag = nqj_ir::interp::Address {
            offset: address.offset + 4,
            ..address
        };
        assert_eq!(memory.load(Some(flag)).unwrap(), Value::Bool(false));
        let next = nqj_ir::interp::Address {
            offset: address.offset + 5,
            ..address
        };
        assert_eq!(memory.load(Some(next)).unwrap(), Value::Pointer(None));
    }

    #[test]
    fn array_layouts_memoized() {
        let mut module = Module::new();
        let mut layouts = Layouts::default();
        let first = layouts.array(&mut module, &Type::Int);
        let again = layouts.array(&mut module, &Type::Int);
        assert_eq!(first.struct_id, again.struct_id);
        assert_eq!(module.structs().len(), 1);
        assert_eq!(module.structs()[0].name, "array_int");
        assert_eq!(module.size_of(&IrType::Struct(first.struct_id)), 4);
    }
}
