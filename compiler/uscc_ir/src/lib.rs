//! Basic-block IR for the USCC middle end.
//!
//! This crate provides the control-flow graph the optimizer works on:
//!
//! - **[`Function`]**: ordered basic blocks over an instruction arena.
//!   Instructions are addressed by stable [`InstId`]s; each records its
//!   containing block and a use-list of the operand slots referring to it.
//! - **[`InstKind`] / [`Opcode`]**: a closed set of instruction kinds and
//!   the coarse classification passes dispatch on (alloca, load, store,
//!   call, other).
//! - **[`FunctionBuilder`]**: appends instructions block by block, keeping
//!   use-lists consistent.
//! - **[`verify`]**: structural checks, reported as [`IrProblem`]s.
//!
//! The textual form (`Display` for [`Function`]) is LLVM-flavoured and
//! intended for tests and debugging.

mod builder;
mod function;
mod instr;
mod print;
mod verify;

pub use builder::FunctionBuilder;
pub use function::{BlockData, Function};
pub use instr::{
    BinOp, BlockId, CmpOp, InstData, InstId, InstKind, Opcode, Type, Use, Value,
};
pub use verify::{verify, IrProblem};
