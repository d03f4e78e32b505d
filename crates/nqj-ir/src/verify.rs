//! Structural verification of generated modules.
//!
//! Checks the block discipline every producer must uphold: each registered
//! block ends in exactly one terminator, every jump target is a registered
//! block, every temporary read exists, and every call names a registered
//! procedure with the right number of arguments.

use thiserror::Error;

use crate::instruction::{Instruction, Operand, Terminator};
use crate::module::{Module, Procedure};
use crate::types::{BlockId, TempId};

/// A violated structural rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("procedure {procedure} has no blocks")]
    NoBlocks { procedure: String },

    #[error("block {block} ({name}) of {procedure} has no terminator")]
    Unterminated {
        procedure: String,
        block: BlockId,
        name: String,
    },

    #[error("block {block} of {procedure} jumps to unregistered block {target}")]
    UnknownTarget {
        procedure: String,
        block: BlockId,
        target: BlockId,
    },

    #[error("{procedure} uses undefined temporary {temp}")]
    UnknownTemp { procedure: String, temp: TempId },

    #[error("{procedure} calls an unregistered procedure")]
    UnknownCallee { procedure: String },

    #[error("{procedure} calls {callee} with {found} arguments, expected {expected}")]
    ArgumentCount {
        procedure: String,
        callee: String,
        expected: usize,
        found: usize,
    },
}

/// Verify every procedure of `module`, collecting all violations.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn verify(module: &Module) -> Result<(), Vec<VerifyError>> {
    let mut errors = Vec::new();
    for procedure in module.procedures() {
        verify_procedure(module, procedure, &mut errors);
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn verify_procedure(module: &Module, procedure: &Procedure, errors: &mut Vec<VerifyError>) {
    let name = &procedure.name;
    if procedure.blocks().is_empty() {
        errors.push(VerifyError::NoBlocks {
            procedure: name.clone(),
        });
        return;
    }

    let block_count = procedure.blocks().len() as u32;
    let check_operand = |operand: &Operand, errors: &mut Vec<VerifyError>| {
        if let Operand::Temp(temp) = operand
            && procedure.temp(*temp).is_none()
        {
            errors.push(VerifyError::UnknownTemp {
                procedure: name.clone(),
                temp: *temp,
            });
        }
    };

    for (index, block) in procedure.blocks().iter().enumerate() {
        let id = BlockId(index as u32);

        for inst in &block.instructions {
            for operand in inst.operands() {
                check_operand(operand, errors);
            }
            if let Instruction::Call { proc, args, .. } = inst {
                match module.procedure(*proc) {
                    None => errors.push(VerifyError::UnknownCallee {
                        procedure: name.clone(),
                    }),
                    Some(callee) if callee.params().len() != args.len() => {
                        errors.push(VerifyError::ArgumentCount {
                            procedure: name.clone(),
                            callee: callee.name.clone(),
                            expected: callee.params().len(),
                            found: args.len(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        match &block.terminator {
            None => errors.push(VerifyError::Unterminated {
                procedure: name.clone(),
                block: id,
                name: block.name.clone(),
            }),
            Some(terminator) => {
                if let Terminator::Branch { condition, .. } | Terminator::Return(condition) =
                    terminator
                {
                    check_operand(condition, errors);
                }
                for target in terminator.successors() {
                    if target.0 >= block_count {
                        errors.push(VerifyError::UnknownTarget {
                            procedure: name.clone(),
                            block: id,
                            target,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IrType, ProcId};

    fn returning(name: &str) -> Procedure {
        let mut proc = Procedure::new(name, IrType::Int);
        let entry = proc.add_block("entry");
        proc.block_mut(entry).unwrap().terminator = Some(Terminator::Return(Operand::ConstInt(0)));
        proc
    }

    #[test]
    fn well_formed_module() {
        let mut module = Module::new();
        module.add_procedure(returning("main"));
        assert_eq!(verify(&module), Ok(()));
    }

    #[test]
    fn unterminated_block() {
        let mut module = Module::new();
        let mut proc = returning("main");
        proc.add_block("dangling");
        module.add_procedure(proc);
        let errors = verify(&module).unwrap_err();
        assert!(matches!(errors[0], VerifyError::Unterminated { block: BlockId(1), .. }));
    }

    #[test]
    fn jump_to_unregistered_block() {
        let mut module = Module::new();
        let mut proc = Procedure::new("main", IrType::Int);
        let entry = proc.add_block("entry");
        proc.block_mut(entry).unwrap().terminator = Some(Terminator::Jump(BlockId(5)));
        module.add_procedure(proc);
        let errors = verify(&module).unwrap_err();
        assert!(matches!(errors[0], VerifyError::UnknownTarget { target: BlockId(5), .. }));
    }

    #[test]
    fn call_argument_count() {
        let mut module = Module::new();
        let mut callee = returning("f");
        callee.add_param("x", IrType::Int);
        let callee_id = module.add_procedure(callee);

        let mut caller = Procedure::new("main", IrType::Int);
        let entry = caller.add_block("entry");
        let dest = caller.new_temp(IrType::Int);
        let block = caller.block_mut(entry).unwrap();
        block.instructions.push(Instruction::Call {
            dest,
            proc: callee_id,
            args: vec![],
        });
        block.instructions.push(Instruction::Call {
            dest,
            proc: ProcId(9),
            args: vec![],
        });
        block.terminator = Some(Terminator::Return(Operand::Temp(TempId(42))));
        module.add_procedure(caller);

        let errors = verify(&module).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], VerifyError::ArgumentCount { expected: 1, found: 0, .. }));
        assert!(matches!(errors[1], VerifyError::UnknownCallee { .. }));
        assert!(matches!(errors[2], VerifyError::UnknownTemp { temp: TempId(42), .. }));
    }
}
