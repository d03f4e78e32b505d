//! Basic-block intermediate representation for NotQuiteJava.
//!
//! - [`Module`]: struct types and procedures
//! - [`Procedure`]: parameters, typed temporaries and registered [`BasicBlock`]s
//! - [`Instruction`] / [`Terminator`]: the instruction vocabulary
//! - [`verify`]: structural checks every generated module must pass
//! - [`interp`]: a reference interpreter to observe generated code
//!
//! # Example
//!
//! ```
//! use nqj_ir::{ExecOptions, IrType, Module, Operand, Procedure, Terminator};
//!
//! let mut module = Module::new();
//! let mut main = Procedure::new("main", IrType::Int);
//! let entry = main.add_block("entry");
//! main.block_mut(entry).unwrap().terminator = Some(Terminator::Return(Operand::ConstInt(0)));
//! module.add_procedure(main);
//!
//! assert!(nqj_ir::verify(&module).is_ok());
//! assert_eq!(nqj_ir::run(&module, "main", &ExecOptions::default()).result, Ok(0));
//! ```

mod display;
mod instruction;
pub mod interp;
mod module;
mod types;
mod verify;

pub use instruction::{BinOp, Instruction, Operand, Terminator};
pub use interp::{ExecOptions, Execution, Interpreter, Value, run};
pub use module::{BasicBlock, Module, Procedure, StructField, StructType, Temp};
pub use types::{
    BOOL_SIZE, BlockId, INT_SIZE, IrType, POINTER_SIZE, ProcId, StructId, TempId,
};
pub use verify::{VerifyError, verify};
