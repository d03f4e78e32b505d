//! Instructions, terminators and operands.

use crate::types::{BlockId, IrType, ProcId, TempId};

/// A value consumed by an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    ConstInt(i32),
    ConstBool(bool),
    Null,
    Temp(TempId),
}

impl From<TempId> for Operand {
    fn from(temp: TempId) -> Self {
        Operand::Temp(temp)
    }
}

/// Binary operations. Arithmetic wraps on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Signed division; the divisor must not be zero.
    Sdiv,
    /// Signed less-than, producing `i1`.
    Slt,
    /// Equality of ints, bools or pointers, producing `i1`.
    Eq,
    And,
    Or,
}

impl BinOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Sdiv => "sdiv",
            BinOp::Slt => "slt",
            BinOp::Eq => "eq",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    /// Result type of the operation.
    pub fn result_type(&self) -> IrType {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Sdiv => IrType::Int,
            BinOp::Slt | BinOp::Eq | BinOp::And | BinOp::Or => IrType::Bool,
        }
    }
}

/// A non-terminating instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Heap-allocate `size` bytes; `dest` is an `i8*`. Memory is never freed.
    Alloc { dest: TempId, size: Operand },
    /// Reserve a stack slot of type `ty`; `dest` is a `ty*`.
    Alloca { dest: TempId, ty: IrType },
    /// Reinterpret a pointer as `dest`'s type without changing it.
    Bitcast { dest: TempId, value: Operand },
    /// Address computation. The first index scales by the pointee size, each
    /// further index selects a struct field (constant) or an array element.
    GetElementPtr {
        dest: TempId,
        base: Operand,
        indices: Vec<Operand>,
    },
    Load { dest: TempId, address: Operand },
    Store { address: Operand, value: Operand },
    BinaryOp {
        dest: TempId,
        op: BinOp,
        left: Operand,
        right: Operand,
    },
    /// Direct call; `dest` receives the return value.
    Call {
        dest: TempId,
        proc: ProcId,
        args: Vec<Operand>,
    },
    /// Print an `i32` on its own line.
    Print { value: Operand },
    /// Annotation without effect.
    Comment(String),
}

impl Instruction {
    /// The temporary this instruction defines, if any.
    pub fn dest(&self) -> Option<TempId> {
        match self {
            Instruction::Alloc { dest, .. }
            | Instruction::Alloca { dest, .. }
            | Instruction::Bitcast { dest, .. }
            | Instruction::GetElementPtr { dest, .. }
            | Instruction::Load { dest, .. }
            | Instruction::BinaryOp { dest, .. }
            | Instruction::Call { dest, .. } => Some(*dest),
            Instruction::Store { .. } | Instruction::Print { .. } | Instruction::Comment(_) => {
                None
            }
        }
    }

    /// The operands this instruction reads.
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Instruction::Alloc { size, .. } => vec![size],
            Instruction::Alloca { .. } | Instruction::Comment(_) => Vec::new(),
            Instruction::Bitcast { value, .. } => vec![value],
            Instruction::GetElementPtr { base, indices, .. } => {
                std::iter::once(base).chain(indices.iter()).collect()
            }
            Instruction::Load { address, .. } => vec![address],
            Instruction::Store { address, value } => vec![address, value],
            Instruction::BinaryOp { left, right, .. } => vec![left, right],
            Instruction::Call { args, .. } => args.iter().collect(),
            Instruction::Print { value } => vec![value],
        }
    }
}

/// The final instruction of a basic block.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Jump(BlockId),
    Branch {
        condition: Operand,
        if_true: BlockId,
        if_false: BlockId,
    },
    Return(Operand),
    /// Abort execution with a message.
    HaltWithError(String),
}

impl Terminator {
    /// Blocks control may continue to.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump(target) => vec![*target],
            Terminator::Branch {
                if_true, if_false, ..
            } => vec![*if_true, *if_false],
            Terminator::Return(_) | Terminator::HaltWithError(_) => Vec::new(),
        }
    }
}
