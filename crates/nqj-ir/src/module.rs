//! Module, struct types, procedures and basic blocks.

use rustc_hash::FxHashMap;

use crate::instruction::{Instruction, Operand, Terminator};
use crate::types::{BOOL_SIZE, BlockId, INT_SIZE, IrType, POINTER_SIZE, ProcId, StructId, TempId};

// ============================================================================
// Struct Types
// ============================================================================

/// A named field of a struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: IrType,
}

/// A nominal struct type. Created empty and filled in later so that
/// mutually referencing structs can be declared first.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

// ============================================================================
// Basic Blocks
// ============================================================================

/// A straight-line instruction sequence ending in one terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub name: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            terminator: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}

// ============================================================================
// Procedures
// ============================================================================

/// A typed temporary.
#[derive(Debug, Clone, PartialEq)]
pub struct Temp {
    pub ty: IrType,
    /// Source-level name, for printing only.
    pub name: Option<String>,
}

/// A procedure: parameters, typed temporaries and ordered basic blocks.
/// The first registered block is the entry block.
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub return_type: IrType,
    params: Vec<TempId>,
    temps: Vec<Temp>,
    blocks: Vec<BasicBlock>,
}

impl Procedure {
    pub fn new(name: impl Into<String>, return_type: IrType) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            temps: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Append a parameter; it is also a temporary of the procedure.
    pub fn add_param(&mut self, name: impl Into<String>, ty: IrType) -> TempId {
        let temp = self.new_named_temp(ty, name);
        self.params.push(temp);
        temp
    }

    pub fn params(&self) -> &[TempId] {
        &self.params
    }

    pub fn new_temp(&mut self, ty: IrType) -> TempId {
        let id = TempId(self.temps.len() as u32);
        self.temps.push(Temp { ty, name: None });
        id
    }

    pub fn new_named_temp(&mut self, ty: IrType, name: impl Into<String>) -> TempId {
        let id = TempId(self.temps.len() as u32);
        self.temps.push(Temp {
            ty,
            name: Some(name.into()),
        });
        id
    }

    pub fn temp(&self, id: TempId) -> Option<&Temp> {
        self.temps.get(id.index())
    }

    pub fn temps(&self) -> &[Temp] {
        &self.temps
    }

    /// Static type of an operand; `None` for an unknown temporary.
    pub fn operand_type(&self, operand: &Operand) -> Option<IrType> {
        match operand {
            Operand::ConstInt(_) => Some(IrType::Int),
            Operand::ConstBool(_) => Some(IrType::Bool),
            Operand::Null => Some(IrType::NullPointer),
            Operand::Temp(id) => self.temp(*id).map(|t| t.ty.clone()),
        }
    }

    /// Create and register a block. Blocks are never referenced before this.
    pub fn add_block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(name));
        id
    }

    pub fn entry(&self) -> Option<BlockId> {
        (!self.blocks.is_empty()).then_some(BlockId(0))
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(id.index())
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Reserve a stack slot in the entry block, after the slots already there.
    ///
    /// Returns `None` when the procedure has no entry block yet.
    pub fn entry_alloca(&mut self, ty: IrType) -> Option<TempId> {
        let pointer = IrType::pointer_to(ty.clone());
        let entry = self.blocks.first()?;
        let position = entry
            .instructions
            .iter()
            .position(|inst| !matches!(inst, Instruction::Alloca { .. }))
            .unwrap_or(entry.instructions.len());
        let dest = self.new_temp(pointer);
        self.blocks[0]
            .instructions
            .insert(position, Instruction::Alloca { dest, ty });
        Some(dest)
    }
}

// ============================================================================
// Module
// ============================================================================

/// A compiled program: struct types and procedures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    structs: Vec<StructType>,
    procedures: Vec<Procedure>,
    proc_names: FxHashMap<String, ProcId>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty struct type.
    pub fn add_struct(&mut self, name: impl Into<String>) -> StructId {
        let id = StructId(self.structs.len() as u32);
        self.structs.push(StructType {
            name: name.into(),
            fields: Vec::new(),
        });
        id
    }

    pub fn struct_type(&self, id: StructId) -> Option<&StructType> {
        self.structs.get(id.index())
    }

    pub fn struct_type_mut(&mut self, id: StructId) -> Option<&mut StructType> {
        self.structs.get_mut(id.index())
    }

    pub fn structs(&self) -> &[StructType] {
        &self.structs
    }

    /// Register a procedure. Names are expected to be unique.
    pub fn add_procedure(&mut self, procedure: Procedure) -> ProcId {
        let id = ProcId(self.procedures.len() as u32);
        self.proc_names.insert(procedure.name.clone(), id);
        self.procedures.push(procedure);
        id
    }

    pub fn procedure(&self, id: ProcId) -> Option<&Procedure> {
        self.procedures.get(id.index())
    }

    pub fn procedure_mut(&mut self, id: ProcId) -> Option<&mut Procedure> {
        self.procedures.get_mut(id.index())
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    pub fn find_procedure(&self, name: &str) -> Option<ProcId> {
        self.proc_names.get(name).copied()
    }

    /// Byte size of a value of type `ty`. Struct fields are packed.
    pub fn size_of(&self, ty: &IrType) -> u32 {
        match ty {
            IrType::Int => INT_SIZE,
            IrType::Bool | IrType::Byte => BOOL_SIZE,
            IrType::Pointer(_) | IrType::NullPointer => POINTER_SIZE,
            IrType::Struct(id) => self
                .struct_type(*id)
                .map(|s| s.fields.iter().map(|f| self.size_of(&f.ty)).sum())
                .unwrap_or(0),
            IrType::Array { element, len } => self.size_of(element) * len,
            IrType::Void => 0,
        }
    }

    /// Byte offset of field `index` within struct `id`.
    pub fn field_offset(&self, id: StructId, index: usize) -> Option<u32> {
        let fields = &self.struct_type(id)?.fields;
        if index >= fields.len() {
            return None;
        }
        Some(fields[..index].iter().map(|f| self.size_of(&f.ty)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_sizes_and_offsets() {
        let mut module = Module::new();
        let point = module.add_struct("Point");
        module.struct_type_mut(point).unwrap().fields = vec![
            StructField {
                name: "flag".into(),
                ty: IrType::Bool,
            },
            StructField {
                name: "next".into(),
                ty: IrType::pointer_to(IrType::Struct(point)),
            },
            StructField {
                name: "x".into(),
                ty: IrType::Int,
            },
        ];
        assert_eq!(module.size_of(&IrType::Struct(point)), 13);
        assert_eq!(module.field_offset(point, 0), Some(0));
        assert_eq!(module.field_offset(point, 1), Some(1));
        assert_eq!(module.field_offset(point, 2), Some(9));
        assert_eq!(module.field_offset(point, 3), None);
        assert_eq!(module.struct_type(point).unwrap().field_index("x"), Some(2));
    }

    #[test]
    fn flexible_array_has_no_size() {
        let module = Module::new();
        let ty = IrType::Array {
            element: Box::new(IrType::Int),
            len: 0,
        };
        assert_eq!(module.size_of(&ty), 0);
    }

    #[test]
    fn procedures_by_name() {
        let mut module = Module::new();
        let id = module.add_procedure(Procedure::new("main", IrType::Int));
        assert_eq!(module.find_procedure("main"), Some(id));
        assert_eq!(module.find_procedure("other"), None);
    }

    #[test]
    fn entry_alloca_groups_slots_first() {
        let mut proc = Procedure::new("f", IrType::Int);
        let entry = proc.add_block("entry");
        let first = proc.entry_alloca(IrType::Int).unwrap();
        proc.block_mut(entry).unwrap().instructions.push(Instruction::Print {
            value: Operand::ConstInt(1),
        });
        let second = proc.entry_alloca(IrType::Bool).unwrap();

        let instructions = &proc.block(entry).unwrap().instructions;
        assert!(matches!(instructions[0], Instruction::Alloca { dest, .. } if dest == first));
        assert!(matches!(instructions[1], Instruction::Alloca { dest, .. } if dest == second));
        assert!(matches!(instructions[2], Instruction::Print { .. }));
        assert_eq!(
            proc.operand_type(&Operand::Temp(second)),
            Some(IrType::pointer_to(IrType::Bool))
        );
    }

    #[test]
    fn entry_alloca_needs_entry() {
        let mut proc = Procedure::new("f", IrType::Int);
        assert_eq!(proc.entry_alloca(IrType::Int), None);
    }

    #[test]
    fn params_are_temps() {
        let mut proc = Procedure::new("f", IrType::Int);
        let p = proc.add_param("x", IrType::Int);
        assert_eq!(proc.params(), &[p]);
        assert_eq!(proc.temp(p).unwrap().name.as_deref(), Some("x"));
    }
}
