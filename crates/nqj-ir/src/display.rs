//! Textual rendering of a module, for debugging and snapshot-style tests.

use std::fmt::{self, Display, Write};

use crate::instruction::{Instruction, Operand, Terminator};
use crate::module::{Module, Procedure};
use crate::types::IrType;

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::ConstInt(value) => write!(f, "{value}"),
            Operand::ConstBool(value) => write!(f, "{value}"),
            Operand::Null => f.write_str("null"),
            Operand::Temp(id) => write!(f, "{id}"),
        }
    }
}

/// Type display resolving struct ids to names.
struct TypeName<'a>(&'a Module, &'a IrType);

impl Display for TypeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let TypeName(module, ty) = *self;
        match ty {
            IrType::Struct(id) => match module.struct_type(*id) {
                Some(s) => write!(f, "%{}", s.name),
                None => write!(f, "%{id}"),
            },
            IrType::Pointer(inner) => write!(f, "{}*", TypeName(module, inner)),
            IrType::Array { element, len } => {
                write!(f, "[{len} x {}]", TypeName(module, element))
            }
            other => write!(f, "{other}"),
        }
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in self.structs() {
            let fields = s
                .fields
                .iter()
                .map(|field| TypeName(self, &field.ty).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "%{} = type {{ {fields} }}", s.name)?;
        }
        for procedure in self.procedures() {
            writeln!(f)?;
            write_procedure(self, procedure, f)?;
        }
        Ok(())
    }
}

fn write_procedure(module: &Module, procedure: &Procedure, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let type_of = |op: &Operand| {
        procedure
            .operand_type(op)
            .map(|ty| TypeName(module, &ty).to_string())
            .unwrap_or_else(|| "?".to_string())
    };

    let mut params = String::new();
    for (i, param) in procedure.params().iter().enumerate() {
        if i > 0 {
            params.push_str(", ");
        }
        let _ = write!(params, "{} {param}", type_of(&Operand::Temp(*param)));
    }
    writeln!(
        f,
        "define {} @{}({params}) {{",
        TypeName(module, &procedure.return_type),
        procedure.name
    )?;

    for (index, block) in procedure.blocks().iter().enumerate() {
        writeln!(f, "bb{index}: ; {}", block.name)?;
        for inst in &block.instructions {
            f.write_str("  ")?;
            match inst {
                Instruction::Alloc { dest, size } => writeln!(f, "{dest} = alloc {size}")?,
                Instruction::Alloca { dest, ty } => {
                    writeln!(f, "{dest} = alloca {}", TypeName(module, ty))?
                }
                Instruction::Bitcast { dest, value } => writeln!(
                    f,
                    "{dest} = bitcast {} {value} to {}",
                    type_of(value),
                    type_of(&Operand::Temp(*dest))
                )?,
                Instruction::GetElementPtr {
                    dest,
                    base,
                    indices,
                } => {
                    let indices = indices
                        .iter()
                        .map(|i| i.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(f, "{dest} = getelementptr {} {base}, {indices}", type_of(base))?
                }
                Instruction::Load { dest, address } => {
                    writeln!(f, "{dest} = load {} {address}", type_of(address))?
                }
                Instruction::Store { address, value } => writeln!(
                    f,
                    "store {} {value}, {} {address}",
                    type_of(value),
                    type_of(address)
                )?,
                Instruction::BinaryOp {
                    dest,
                    op,
                    left,
                    right,
                } => writeln!(f, "{dest} = {} {} {left}, {right}", op.mnemonic(), type_of(left))?,
                Instruction::Call { dest, proc, args } => {
                    let name = module
                        .procedure(*proc)
                        .map(|p| p.name.as_str())
                        .unwrap_or("?");
                    let args = args
                        .iter()
                        .map(|a| format!("{} {a}", type_of(a)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(f, "{dest} = call @{name}({args})")?
                }
                Instruction::Print { value } => writeln!(f, "print {value}")?,
                Instruction::Comment(text) => writeln!(f, "; {text}")?,
            }
        }
        f.write_str("  ")?;
        match &block.terminator {
            Some(Terminator::Jump(target)) => writeln!(f, "br {target}")?,
            Some(Terminator::Branch {
                condition,
                if_true,
                if_false,
            }) => writeln!(f, "br {condition}, {if_true}, {if_false}")?,
            Some(Terminator::Return(value)) => writeln!(f, "ret {} {value}", type_of(value))?,
            Some(Terminator::HaltWithError(message)) => writeln!(f, "halt {message:?}")?,
            None => writeln!(f, "<unterminated>")?,
        }
    }
    writeln!(f, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TempId;

    #[test]
    fn render_small_procedure() {
        let mut module = Module::new();
        let mut proc = Procedure::new("main", IrType::Int);
        let entry = proc.add_block("entry");
        let slot = proc.entry_alloca(IrType::Int).unwrap();
        let block = proc.block_mut(entry).unwrap();
        block.instructions.push(Instruction::Store {
            address: Operand::Temp(slot),
            value: Operand::ConstInt(7),
        });
        block.terminator = Some(Terminator::Return(Operand::ConstInt(0)));
        module.add_procedure(proc);

        let text = module.to_string();
        assert!(text.contains("define i32 @main() {"));
        assert!(text.contains("%t0 = alloca i32"));
        assert!(text.contains("store i32 7, i32* %t0"));
        assert!(text.contains("ret i32 0"));
        assert_eq!(TempId(0).to_string(), "%t0");
    }

    #[test]
    fn render_struct_names() {
        let mut module = Module::new();
        let id = module.add_struct("A");
        module.struct_type_mut(id).unwrap().fields.push(crate::StructField {
            name: "next".into(),
            ty: IrType::pointer_to(IrType::Struct(id)),
        });
        assert!(module.to_string().contains("%A = type { %A* }"));
    }
}
