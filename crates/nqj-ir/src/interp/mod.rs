//! Reference interpreter for generated modules.
//!
//! Executes procedures block by block so tests can observe what generated
//! code does: printed values, return values and runtime halts.

mod memory;

pub use memory::{Address, Memory, Value};

use nqj_core::RuntimeError;

use crate::instruction::{BinOp, Instruction, Operand, Terminator};
use crate::module::{Module, Procedure};
use crate::types::{IrType, ProcId};

/// Interpreter configuration.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Maximum number of instructions and terminators executed before
    /// giving up with [`RuntimeError::StepLimitExceeded`].
    pub step_limit: u64,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            step_limit: 10_000_000,
        }
    }
}

/// Outcome of running a program: everything printed before it stopped and
/// either the entry procedure's return value or the error that stopped it.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub output: Vec<i32>,
    pub result: Result<i32, RuntimeError>,
}

impl Execution {
    /// The halt message, if generated code stopped at a runtime check.
    pub fn halt_message(&self) -> Option<&str> {
        self.result.as_ref().err().and_then(|e| e.halt_message())
    }
}

/// Run the zero-argument procedure named `entry`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn run(module: &Module, entry: &str, options: &ExecOptions) -> Execution {
    let mut interpreter = Interpreter::new(module, options.clone());
    let result = match module.find_procedure(entry) {
        Some(proc) => interpreter.call(proc, Vec::new()).and_then(|value| match value {
            Value::Int(code) => Ok(code),
            other => Err(RuntimeError::TypeError {
                procedure: entry.to_string(),
                message: format!("entry returned {other:?}, expected an int"),
            }),
        }),
        None => Err(RuntimeError::Malformed {
            message: format!("no procedure named {entry}"),
        }),
    };
    Execution {
        output: interpreter.output,
        result,
    }
}

/// Executes procedures of one module against a shared memory.
pub struct Interpreter<'m> {
    module: &'m Module,
    memory: Memory,
    output: Vec<i32>,
    steps: u64,
    options: ExecOptions,
}

/// Temporaries of one activation.
struct Frame<'m> {
    procedure: &'m Procedure,
    values: Vec<Option<Value>>,
}

impl<'m> Frame<'m> {
    fn error(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::TypeError {
            procedure: self.procedure.name.clone(),
            message: message.into(),
        }
    }

    fn eval(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match operand {
            Operand::ConstInt(value) => Ok(Value::Int(*value)),
            Operand::ConstBool(value) => Ok(Value::Bool(*value)),
            Operand::Null => Ok(Value::Pointer(None)),
            Operand::Temp(temp) => self
                .values
                .get(temp.index())
                .copied()
                .flatten()
                .ok_or_else(|| self.error(format!("read of undefined temporary {temp}"))),
        }
    }

    fn int(&self, operand: &Operand) -> Result<i32, RuntimeError> {
        match self.eval(operand)? {
            Value::Int(value) => Ok(value),
            other => Err(self.error(format!("expected int, found {other:?}"))),
        }
    }

    fn pointer(&self, operand: &Operand) -> Result<Option<Address>, RuntimeError> {
        match self.eval(operand)? {
            Value::Pointer(address) => Ok(address),
            other => Err(self.error(format!("expected pointer, found {other:?}"))),
        }
    }

    fn set(&mut self, temp: crate::TempId, value: Value) {
        if let Some(slot) = self.values.get_mut(temp.index()) {
            *slot = Some(value);
        }
    }
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module, options: ExecOptions) -> Self {
        Self {
            module,
            memory: Memory::new(),
            output: Vec::new(),
            steps: 0,
            options,
        }
    }

    /// Values printed so far.
    pub fn output(&self) -> &[i32] {
        &self.output
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Call a procedure with already evaluated arguments.
    pub fn call(&mut self, proc: ProcId, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let module = self.module;
        let procedure = module.procedure(proc).ok_or_else(|| RuntimeError::Malformed {
            message: format!("call to unregistered {proc}"),
        })?;
        if procedure.params().len() != args.len() {
            return Err(RuntimeError::Malformed {
                message: format!(
                    "{} expects {} arguments, got {}",
                    procedure.name,
                    procedure.params().len(),
                    args.len()
                ),
            });
        }

        let mut frame = Frame {
            procedure,
            values: vec![None; procedure.temps().len()],
        };
        for (param, value) in procedure.params().iter().zip(args) {
            frame.set(*param, value);
        }

        let mut current = procedure.entry().ok_or_else(|| RuntimeError::Malformed {
            message: format!("{} has no blocks", procedure.name),
        })?;

        loop {
            let block = procedure.block(current).ok_or_else(|| RuntimeError::Malformed {
                message: format!("{} has no block {current}", procedure.name),
            })?;
            for inst in &block.instructions {
                self.tick()?;
                self.execute(&mut frame, inst)?;
            }
            self.tick()?;
            match &block.terminator {
                Some(Terminator::Jump(target)) => current = *target,
                Some(Terminator::Branch {
                    condition,
                    if_true,
                    if_false,
                }) => {
                    current = match frame.eval(condition)? {
                        Value::Bool(true) => *if_true,
                        Value::Bool(false) => *if_false,
                        other => {
                            return Err(frame.error(format!("branch on non-bool {other:?}")));
                        }
                    }
                }
                Some(Terminator::Return(value)) => return frame.eval(value),
                Some(Terminator::HaltWithError(message)) => {
                    return Err(RuntimeError::Halt {
                        message: message.clone(),
                    });
                }
                None => {
                    return Err(RuntimeError::Malformed {
                        message: format!(
                            "fell off unterminated block {current} of {}",
                            procedure.name
                        ),
                    });
                }
            }
        }
    }

    fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.options.step_limit {
            return Err(RuntimeError::StepLimitExceeded {
                limit: self.options.step_limit,
            });
        }
        Ok(())
    }

    fn execute(&mut self, frame: &mut Frame<'m>, inst: &Instruction) -> Result<(), RuntimeError> {
        match inst {
            Instruction::Alloc { dest, size } => {
                let size = frame.int(size)?;
                let size = u32::try_from(size).map_err(|_| RuntimeError::InvalidMemoryAccess {
                    message: format!("allocation of negative size {size}"),
                })?;
                let address = self.memory.allocate(size);
                frame.set(*dest, Value::Pointer(Some(address)));
            }
            Instruction::Alloca { dest, ty } => {
                let address = self.memory.allocate(self.module.size_of(ty));
                frame.set(*dest, Value::Pointer(Some(address)));
            }
            Instruction::Bitcast { dest, value } => {
                let pointer = frame.pointer(value)?;
                frame.set(*dest, Value::Pointer(pointer));
            }
            Instruction::GetElementPtr {
                dest,
                base,
                indices,
            } => {
                let address = self.element_pointer(frame, base, indices)?;
                frame.set(*dest, Value::Pointer(Some(address)));
            }
            Instruction::Load { dest, address } => {
                let value = self.memory.load(frame.pointer(address)?)?;
                frame.set(*dest, value);
            }
            Instruction::Store { address, value } => {
                let target = frame.pointer(address)?;
                let value = frame.eval(value)?;
                self.memory.store(target, value)?;
            }
            Instruction::BinaryOp {
                dest,
                op,
                left,
                right,
            } => {
                let value = binary(frame, *op, left, right)?;
                frame.set(*dest, value);
            }
            Instruction::Call { dest, proc, args } => {
                let args = args
                    .iter()
                    .map(|a| frame.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let value = self.call(*proc, args)?;
                frame.set(*dest, value);
            }
            Instruction::Print { value } => {
                let value = frame.int(value)?;
                self.output.push(value);
            }
            Instruction::Comment(_) => {}
        }
        Ok(())
    }

    /// Compute a field or element address from the base pointer's static type.
    fn element_pointer(
        &self,
        frame: &Frame<'m>,
        base: &Operand,
        indices: &[Operand],
    ) -> Result<Address, RuntimeError> {
        let address = frame.pointer(base)?.ok_or_else(|| RuntimeError::InvalidMemoryAccess {
            message: "address computation on null pointer".into(),
        })?;
        let base_type = frame
            .procedure
            .operand_type(base)
            .ok_or_else(|| frame.error("untyped address base"))?;
        let mut ty = base_type
            .pointee()
            .cloned()
            .ok_or_else(|| frame.error(format!("address base of type {base_type} is not a pointer")))?;

        let mut offset = i64::from(address.offset);
        let mut indices = indices.iter();
        if let Some(first) = indices.next() {
            offset += i64::from(frame.int(first)?) * i64::from(self.module.size_of(&ty));
        }
        for index in indices {
            match ty {
                IrType::Struct(id) => {
                    let Operand::ConstInt(field) = index else {
                        return Err(frame.error("struct field index must be a constant"));
                    };
                    let field = *field as usize;
                    offset += i64::from(
                        self.module
                            .field_offset(id, field)
                            .ok_or_else(|| frame.error(format!("no field {field} in {id}")))?,
                    );
                    ty = self
                        .module
                        .struct_type(id)
                        .map(|s| s.fields[field].ty.clone())
                        .ok_or_else(|| frame.error(format!("unknown {id}")))?;
                }
                IrType::Array { element, .. } => {
                    offset += i64::from(frame.int(index)?) * i64::from(self.module.size_of(&element));
                    ty = *element;
                }
                other => {
                    return Err(frame.error(format!("cannot index into {other}")));
                }
            }
        }

        let offset = u32::try_from(offset).map_err(|_| RuntimeError::InvalidMemoryAccess {
            message: format!("address offset {offset} is negative"),
        })?;
        Ok(Address { offset, ..address })
    }
}

fn binary(frame: &Frame<'_>, op: BinOp, left: &Operand, right: &Operand) -> Result<Value, RuntimeError> {
    let value = match op {
        BinOp::Add => Value::Int(frame.int(left)?.wrapping_add(frame.int(right)?)),
        BinOp::Sub => Value::Int(frame.int(left)?.wrapping_sub(frame.int(right)?)),
        BinOp::Mul => Value::Int(frame.int(left)?.wrapping_mul(frame.int(right)?)),
        BinOp::Sdiv => {
            let divisor = frame.int(right)?;
            if divisor == 0 {
                return Err(frame.error("sdiv by zero"));
            }
            Value::Int(frame.int(left)?.wrapping_div(divisor))
        }
        BinOp::Slt => Value::Bool(frame.int(left)? < frame.int(right)?),
        BinOp::Eq => Value::Bool(frame.eval(left)? == frame.eval(right)?),
        BinOp::And | BinOp::Or => {
            let (Value::Bool(l), Value::Bool(r)) = (frame.eval(left)?, frame.eval(right)?) else {
                return Err(frame.error(format!("{} expects bool operands", op.mnemonic())));
            };
            Value::Bool(if op == BinOp::And { l && r } else { l || r })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::StructField;
    use crate::types::TempId;

    fn single_block(
        module: &mut Module,
        name: &str,
        build: impl FnOnce(&mut Procedure) -> (Vec<Instruction>, Terminator),
    ) -> ProcId {
        let mut proc = Procedure::new(name, IrType::Int);
        let entry = proc.add_block("entry");
        let (instructions, terminator) = build(&mut proc);
        let block = proc.block_mut(entry).unwrap();
        block.instructions = instructions;
        block.terminator = Some(terminator);
        module.add_procedure(proc)
    }

    #[test]
    fn arithmetic_wraps() {
        let mut module = Module::new();
        single_block(&mut module, "main", |proc| {
            let q = proc.new_temp(IrType::Int);
            (
                vec![
                    Instruction::BinaryOp {
                        dest: q,
                        op: BinOp::Sdiv,
                        left: Operand::ConstInt(i32::MIN),
                        right: Operand::ConstInt(-1),
                    },
                    Instruction::Print { value: q.into() },
                ],
                Terminator::Return(Operand::ConstInt(3)),
            )
        });
        let execution = run(&module, "main", &ExecOptions::default());
        assert_eq!(execution.output, vec![i32::MIN]);
        assert_eq!(execution.result, Ok(3));
    }

    #[test]
    fn struct_field_roundtrip_through_gep() {
        let mut module = Module::new();
        let pair = module.add_struct("Pair");
        module.struct_type_mut(pair).unwrap().fields = vec![
            StructField {
                name: "flag".into(),
                ty: IrType::Bool,
            },
            StructField {
                name: "value".into(),
                ty: IrType::Int,
            },
        ];
        single_block(&mut module, "main", |proc| {
            let slot = proc.new_temp(IrType::pointer_to(IrType::Struct(pair)));
            let field = proc.new_temp(IrType::pointer_to(IrType::Int));
            let loaded = proc.new_temp(IrType::Int);
            let gep = Instruction::GetElementPtr {
                dest: field,
                base: slot.into(),
                indices: vec![Operand::ConstInt(0), Operand::ConstInt(1)],
            };
            (
                vec![
                    Instruction::Alloca {
                        dest: slot,
                        ty: IrType::Struct(pair),
                    },
                    gep,
                    Instruction::Store {
                        address: field.into(),
                        value: Operand::ConstInt(41),
                    },
                    Instruction::Load {
                        dest: loaded,
                        address: field.into(),
                    },
                ],
                Terminator::Return(loaded.into()),
            )
        });
        assert_eq!(run(&module, "main", &ExecOptions::default()).result, Ok(41));
    }

    #[test]
    fn branches_and_calls() {
        let mut module = Module::new();
        let mut twice = Procedure::new("twice", IrType::Int);
        let x = twice.add_param("x", IrType::Int);
        let entry = twice.add_block("entry");
        let doubled = twice.new_temp(IrType::Int);
        let block = twice.block_mut(entry).unwrap();
        block.instructions.push(Instruction::BinaryOp {
            dest: doubled,
            op: BinOp::Add,
            left: x.into(),
            right: x.into(),
        });
        block.terminator = Some(Terminator::Return(doubled.into()));
        let twice = module.add_procedure(twice);

        let mut main = Procedure::new("main", IrType::Int);
        let entry = main.add_block("entry");
        let yes = main.add_block("yes");
        let no = main.add_block("no");
        let result = main.new_temp(IrType::Int);
        let cond = main.new_temp(IrType::Bool);
        let b = main.block_mut(entry).unwrap();
        b.instructions.push(Instruction::Call {
            dest: result,
            proc: twice,
            args: vec![Operand::ConstInt(21)],
        });
        b.instructions.push(Instruction::BinaryOp {
            dest: cond,
            op: BinOp::Eq,
            left: result.into(),
            right: Operand::ConstInt(42),
        });
        b.terminator = Some(Terminator::Branch {
            condition: cond.into(),
            if_true: yes,
            if_false: no,
        });
        main.block_mut(yes).unwrap().terminator = Some(Terminator::Return(Operand::ConstInt(1)));
        main.block_mut(no).unwrap().terminator =
            Some(Terminator::HaltWithError("wrong".into()));
        module.add_procedure(main);

        assert_eq!(run(&module, "main", &ExecOptions::default()).result, Ok(1));
    }

    #[test]
    fn halt_keeps_output() {
        let mut module = Module::new();
        single_block(&mut module, "main", |_| {
            (
                vec![Instruction::Print {
                    value: Operand::ConstInt(5),
                }],
                Terminator::HaltWithError("Division by zero in line 3".into()),
            )
        });
        let execution = run(&module, "main", &ExecOptions::default());
        assert_eq!(execution.output, vec![5]);
        assert_eq!(execution.halt_message(), Some("Division by zero in line 3"));
    }

    #[test]
    fn step_limit_stops_loops() {
        let mut module = Module::new();
        let mut proc = Procedure::new("main", IrType::Int);
        let entry = proc.add_block("entry");
        proc.block_mut(entry).unwrap().terminator = Some(Terminator::Jump(entry));
        module.add_procedure(proc);
        let execution = run(&module, "main", &ExecOptions { step_limit: 100 });
        assert_eq!(
            execution.result,
            Err(RuntimeError::StepLimitExceeded { limit: 100 })
        );
    }

    #[test]
    fn undefined_temp_is_type_error() {
        let mut module = Module::new();
        single_block(&mut module, "main", |_| {
            (Vec::new(), Terminator::Return(Operand::Temp(TempId(0))))
        });
        assert!(matches!(
            run(&module, "main", &ExecOptions::default()).result,
            Err(RuntimeError::TypeError { .. })
        ));
    }

    #[test]
    fn missing_entry() {
        let module = Module::new();
        assert!(matches!(
            run(&module, "main", &ExecOptions::default()).result,
            Err(RuntimeError::Malformed { .. })
        ));
    }
}
