//! Textual form of the IR.
//!
//! LLVM-flavoured and meant for humans and tests, not for round-tripping.
//! Named instructions print as `%name`; unnamed ones as `%<arena index>`,
//! which stays stable when other instructions are erased.

use std::fmt::{self, Write as _};

use crate::function::Function;
use crate::instr::{InstId, InstKind, Type, Value};

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "define @{}() {{", self.name())?;
        for block in self.block_ids() {
            writeln!(f, "{}:", self.block(block).name())?;
            for &inst in self.block(block).insts() {
                writeln!(f, "  {}", self.display_inst(inst))?;
            }
        }
        writeln!(f, "}}")
    }
}

impl Function {
    /// Render a single instruction the way the function printer does.
    pub fn display_inst(&self, inst: InstId) -> String {
        let mut out = String::new();
        // Writing into a `String` cannot fail.
        let _ = self.write_inst(&mut out, inst);
        out
    }

    /// Render an operand without its type: `%name`, `%3`, `42`, `undef`.
    pub fn display_value(&self, value: Value) -> String {
        match value {
            Value::Const { value, .. } => value.to_string(),
            Value::Undef(_) => "undef".to_owned(),
            Value::Inst(id) => match self.inst(id).name() {
                Some(name) => format!("%{name}"),
                None => format!("%{}", id.raw()),
            },
        }
    }

    fn typed_value(&self, value: Value) -> String {
        format!("{} {}", self.value_type(value), self.display_value(value))
    }

    fn write_inst(&self, out: &mut String, inst: InstId) -> fmt::Result {
        let data = self.inst(inst);
        let ops = data.operands();
        if data.ty() != Type::Void {
            write!(out, "{} = ", self.display_value(Value::Inst(inst)))?;
        }
        match data.kind() {
            InstKind::Alloca { allocated } => write!(out, "alloca {allocated}"),
            InstKind::Load => write!(
                out,
                "load {}, {}",
                data.ty(),
                self.typed_value(ops[0])
            ),
            InstKind::Store => write!(
                out,
                "store {}, {}",
                self.typed_value(ops[0]),
                self.typed_value(ops[1])
            ),
            InstKind::Call { callee } => {
                let args: Vec<String> = ops.iter().map(|&v| self.typed_value(v)).collect();
                write!(out, "call {} @{callee}({})", data.ty(), args.join(", "))
            }
            InstKind::Binary(op) => write!(
                out,
                "{} {}, {}",
                op.mnemonic(),
                self.typed_value(ops[0]),
                self.display_value(ops[1])
            ),
            InstKind::Cmp(op) => write!(
                out,
                "icmp {} {}, {}",
                op.mnemonic(),
                self.typed_value(ops[0]),
                self.display_value(ops[1])
            ),
            InstKind::Cast => write!(out, "cast {} to {}", self.typed_value(ops[0]), data.ty()),
            InstKind::Br { target } => write!(out, "br label %{}", self.block(*target).name()),
            InstKind::CondBr {
                then_block,
                else_block,
            } => write!(
                out,
                "br {}, label %{}, label %{}",
                self.typed_value(ops[0]),
                self.block(*then_block).name(),
                self.block(*else_block).name()
            ),
            InstKind::Ret => match ops.first() {
                Some(&value) => write!(out, "ret {}", self.typed_value(value)),
                None => write!(out, "ret void"),
            },
        }
    }
}
