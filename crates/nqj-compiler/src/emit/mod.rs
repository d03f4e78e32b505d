//! IR emitter for one procedure.
//!
//! The [`ProcBuilder`] owns the procedure under construction and tracks the
//! block instructions are appended to. Blocks are registered in the
//! procedure when created. A terminator closes the current block; until the
//! builder is switched to another block, emission is dropped, so code after
//! a `return` never reaches the procedure.
//!
//! # Example
//!
//! ```ignore
//! let mut b = ProcBuilder::start(Procedure::new("twice", IrType::Int), "entry");
//! let x = b.procedure().params()[0];
//! let doubled = b.binary(BinOp::Add, x.into(), x.into());
//! b.ret(doubled);
//! let procedure = b.finish();
//! ```

use nqj_ir::{BinOp, BlockId, Instruction, IrType, Operand, ProcId, Procedure, TempId, Terminator};

/// Emits instructions into the blocks of a single procedure.
#[derive(Debug)]
pub struct ProcBuilder {
    proc: Procedure,
    /// Open block; `None` after a terminator.
    current: Option<BlockId>,
}

impl ProcBuilder {
    /// Register the entry block of `proc` and make it current.
    pub fn start(mut proc: Procedure, entry: &str) -> Self {
        let entry = proc.add_block(entry);
        Self {
            proc,
            current: Some(entry),
        }
    }

    pub fn procedure(&self) -> &Procedure {
        &self.proc
    }

    pub fn finish(self) -> Procedure {
        self.proc
    }

    // ==========================================================================
    // Blocks
    // ==========================================================================

    pub fn new_block(&mut self, name: &str) -> BlockId {
        self.proc.add_block(name)
    }

    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Whether emitted code lands in a block.
    pub fn is_reachable(&self) -> bool {
        self.current.is_some()
    }

    /// Reserve an entry-block stack slot; returns the `ty*` temporary.
    pub fn entry_slot(&mut self, ty: IrType) -> TempId {
        match self.proc.entry_alloca(ty.clone()) {
            Some(slot) => slot,
            // The entry block is registered by `start`.
            None => unreachable!("procedure {} has no entry block", self.proc.name),
        }
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    pub fn emit(&mut self, inst: Instruction) {
        if let Some(block) = self.current.and_then(|id| self.proc.block_mut(id)) {
            block.instructions.push(inst);
        }
    }

    pub fn temp(&mut self, ty: IrType) -> TempId {
        self.proc.new_temp(ty)
    }

    /// Static IR type of `operand`.
    pub fn operand_type(&self, operand: &Operand) -> IrType {
        self.proc.operand_type(operand).unwrap_or(IrType::Void)
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.emit(Instruction::Comment(text.into()));
    }

    // ==========================================================================
    // Values
    // ==========================================================================

    pub fn binary(&mut self, op: BinOp, left: Operand, right: Operand) -> Operand {
        let dest = self.temp(op.result_type());
        self.emit(Instruction::BinaryOp {
            dest,
            op,
            left,
            right,
        });
        dest.into()
    }

    /// Load through `address`; the result has the pointee type.
    pub fn load(&mut self, address: Operand) -> Operand {
        let ty = self
            .operand_type(&address)
            .pointee()
            .cloned()
            .unwrap_or(IrType::Void);
        let dest = self.temp(ty);
        self.emit(Instruction::Load { dest, address });
        dest.into()
    }

    pub fn store(&mut self, address: Operand, value: Operand) {
        self.emit(Instruction::Store { address, value });
    }

    /// Address computation yielding a `pointee*`.
    pub fn element_ptr(&mut self, base: Operand, indices: Vec<Operand>, pointee: IrType) -> Operand {
        let dest = self.temp(IrType::pointer_to(pointee));
        self.emit(Instruction::GetElementPtr {
            dest,
            base,
            indices,
        });
        dest.into()
    }

    pub fn bitcast(&mut self, value: Operand, ty: IrType) -> Operand {
        let dest = self.temp(ty);
        self.emit(Instruction::Bitcast { dest, value });
        dest.into()
    }

    /// Heap-allocate `size` bytes as an `i8*`.
    pub fn alloc(&mut self, size: Operand) -> Operand {
        let dest = self.temp(IrType::pointer_to(IrType::Byte));
        self.emit(Instruction::Alloc { dest, size });
        dest.into()
    }

    pub fn call(&mut self, proc: ProcId, args: Vec<Operand>, return_type: IrType) -> Operand {
        let dest = self.temp(return_type);
        self.emit(Instruction::Call { dest, proc, args });
        dest.into()
    }

    pub fn print(&mut self, value: Operand) {
        self.emit(Instruction::Print { value });
    }

    // ==========================================================================
    // Terminators
    // ==========================================================================

    /// Close the current block with `terminator`.
    pub fn terminate(&mut self, terminator: Terminator) {
        if let Some(block) = self.current.take().and_then(|id| self.proc.block_mut(id)) {
            block.terminator = Some(terminator);
        }
    }

    pub fn jump(&mut self, target: BlockId) {
        self.terminate(Terminator::Jump(target));
    }

    pub fn branch(&mut self, condition: Operand, if_true: BlockId, if_false: BlockId) {
        self.terminate(Terminator::Branch {
            condition,
            if_true,
            if_false,
        });
    }

    pub fn ret(&mut self, value: Operand) {
        self.terminate(Terminator::Return(value));
    }

    pub fn halt(&mut self, message: impl Into<String>) {
        self.terminate(Terminator::HaltWithError(message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_closes_block() {
        let mut b = ProcBuilder::start(Procedure::new("f", IrType::Int), "entry");
        b.ret(Operand::ConstInt(1));
        assert!(!b.is_reachable());

        b.print(Operand::ConstInt(2));
        b.ret(Operand::ConstInt(3));

        let proc = b.finish();
        let entry = proc.block(BlockId(0)).unwrap();
        assert!(entry.instructions.is_empty());
        assert_eq!(entry.terminator, Some(Terminator::Return(Operand::ConstInt(1))));
    }

    #[test]
    fn blocks_registered_on_creation() {
        let mut b = ProcBuilder::start(Procedure::new("f", IrType::Int), "entry");
        let then_block = b.new_block("then");
        let else_block = b.new_block("else");
        assert_eq!(b.procedure().blocks().len(), 3);

        b.branch(Operand::ConstBool(true), then_block, else_block);
        b.switch_to(then_block);
        b.ret(Operand::ConstInt(1));
        b.switch_to(else_block);
        b.ret(Operand::ConstInt(2));

        let proc = b.finish();
        assert!(proc.blocks().iter().all(|block| block.is_terminated()));
    }

    #[test]
    fn entry_slots_precede_code() {
        let mut b = ProcBuilder::start(Procedure::new("f", IrType::Int), "entry");
        b.print(Operand::ConstInt(7));
        let slot = b.entry_slot(IrType::Int);
        b.store(slot.into(), Operand::ConstInt(1));
        let value = b.load(slot.into());
        assert_eq!(b.operand_type(&value), IrType::Int);
        b.ret(value);

        let proc = b.finish();
        let entry = proc.block(BlockId(0)).unwrap();
        assert!(matches!(entry.instructions[0], Instruction::Alloca { .. }));
        assert!(matches!(entry.instructions[1], Instruction::Print { .. }));
    }

    #[test]
    fn value_types() {
        let mut b = ProcBuilder::start(Procedure::new("f", IrType::Int), "entry");
        let less = b.binary(BinOp::Slt, Operand::ConstInt(1), Operand::ConstInt(2));
        assert_eq!(b.operand_type(&less), IrType::Bool);

        let raw = b.alloc(Operand::ConstInt(4));
        assert_eq!(b.operand_type(&raw), IrType::pointer_to(IrType::Byte));

        let cell = b.bitcast(raw, IrType::pointer_to(IrType::Int));
        let loaded = b.load(cell);
        assert_eq!(b.operand_type(&loaded), IrType::Int);
    }
}
