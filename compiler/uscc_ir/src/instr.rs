//! Instructions, values and types of the USCC IR.
//!
//! An instruction is an [`InstKind`] plus a uniform operand list of
//! [`Value`]s. Keeping operands in one list (instead of inside each kind)
//! is what lets the function maintain use-lists generically: a [`Use`] is
//! simply "operand `n` of instruction `user`".

use std::fmt;

use smallvec::SmallVec;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Instruction ID within a [`Function`](crate::Function).
///
/// IDs index the function's instruction arena and are never reused: an
/// erased instruction keeps its slot, so a stale `InstId` can never alias
/// a newer instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct InstId(u32);

impl InstId {
    /// Create a new instruction ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block ID within a [`Function`](crate::Function).
///
/// Blocks are never removed or reordered by the middle end, so a block's
/// ID is also its position in layout order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Create a new block ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Types ───────────────────────────────────────────────────────────

/// First-class value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    /// No value (stores, branches, `ret void`, void calls).
    Void,
    I1,
    I8,
    I32,
    I64,
    /// Opaque pointer (the result of an `alloca`).
    Ptr,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Void => "void",
            Type::I1 => "i1",
            Type::I8 => "i8",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::Ptr => "ptr",
        };
        f.write_str(s)
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// An instruction operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Compile-time integer constant.
    Const { ty: Type, value: i64 },
    /// The result of another instruction.
    Inst(InstId),
    /// Undefined value of the given type. Used as the placeholder when a
    /// removed instruction's remaining uses have to be rewired.
    Undef(Type),
}

impl Value {
    /// An `i1` constant.
    pub fn bool(value: bool) -> Self {
        Value::Const {
            ty: Type::I1,
            value: i64::from(value),
        }
    }

    /// An `i32` constant.
    pub fn i32(value: i32) -> Self {
        Value::Const {
            ty: Type::I32,
            value: i64::from(value),
        }
    }

    /// An `i64` constant.
    pub fn i64(value: i64) -> Self {
        Value::Const {
            ty: Type::I64,
            value,
        }
    }

    /// The producing instruction, if this operand refers to one.
    #[inline]
    pub fn as_inst(self) -> Option<InstId> {
        match self {
            Value::Inst(id) => Some(id),
            Value::Const { .. } | Value::Undef(_) => None,
        }
    }
}

impl From<InstId> for Value {
    fn from(id: InstId) -> Self {
        Value::Inst(id)
    }
}

// ── Operators ───────────────────────────────────────────────────────

/// Two-operand arithmetic and bitwise operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
        }
    }
}

/// Integer comparison predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Lt => "slt",
            CmpOp::Le => "sle",
            CmpOp::Gt => "sgt",
            CmpOp::Ge => "sge",
        }
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// What an instruction does. Operands live in [`InstData::operands`].
///
/// Operand layout per kind:
///
/// | Kind      | Operands                 |
/// |-----------|--------------------------|
/// | `Alloca`  | none                     |
/// | `Load`    | `[ptr]`                  |
/// | `Store`   | `[value, ptr]`           |
/// | `Call`    | arguments                |
/// | `Binary`  | `[lhs, rhs]`             |
/// | `Cmp`     | `[lhs, rhs]`             |
/// | `Cast`    | `[value]`                |
/// | `Br`      | none                     |
/// | `CondBr`  | `[cond]`                 |
/// | `Ret`     | none or `[value]`        |
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstKind {
    /// Stack slot declaration. The result is a pointer to the slot.
    Alloca { allocated: Type },
    Load,
    Store,
    Call { callee: Box<str> },
    Binary(BinOp),
    Cmp(CmpOp),
    /// Integer width conversion to the instruction's result type.
    Cast,
    Br { target: BlockId },
    CondBr {
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret,
}

impl InstKind {
    /// The coarse opcode classification analyses dispatch on.
    pub fn opcode(&self) -> Opcode {
        match self {
            InstKind::Alloca { .. } => Opcode::Alloca,
            InstKind::Load => Opcode::Load,
            InstKind::Store => Opcode::Store,
            InstKind::Call { .. } => Opcode::Call,
            InstKind::Binary(_)
            | InstKind::Cmp(_)
            | InstKind::Cast
            | InstKind::Br { .. }
            | InstKind::CondBr { .. }
            | InstKind::Ret => Opcode::Other,
        }
    }

    /// Returns `true` for instructions that end a basic block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Br { .. } | InstKind::CondBr { .. } | InstKind::Ret
        )
    }

    /// Successor blocks named by a terminator, in operand order.
    ///
    /// Empty for non-terminators and `ret`. A conditional branch whose
    /// arms target the same block reports that block once.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            InstKind::Br { target } => smallvec::smallvec![*target],
            InstKind::CondBr {
                then_block,
                else_block,
            } => {
                if then_block == else_block {
                    smallvec::smallvec![*then_block]
                } else {
                    smallvec::smallvec![*then_block, *else_block]
                }
            }
            _ => SmallVec::new(),
        }
    }
}

/// Opcode classification: the only instruction property the liveness
/// analysis and dead-code elimination look at besides operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Alloca,
    Load,
    Store,
    Call,
    Other,
}

/// One entry of a use-list: operand `operand` of instruction `user`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Use {
    pub user: InstId,
    pub operand: u32,
}

/// An instruction slot in the function's arena.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstData {
    pub(crate) kind: InstKind,
    pub(crate) ty: Type,
    pub(crate) operands: SmallVec<[Value; 2]>,
    pub(crate) name: Option<Box<str>>,
    pub(crate) block: Option<BlockId>,
    pub(crate) uses: Vec<Use>,
    pub(crate) erased: bool,
}

impl InstData {
    pub fn kind(&self) -> &InstKind {
        &self.kind
    }

    pub fn opcode(&self) -> Opcode {
        self.kind.opcode()
    }

    /// Result type (`Void` for instructions that produce no value).
    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The containing block, or `None` once the instruction was erased.
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Every operand slot that currently refers to this instruction.
    pub fn uses(&self) -> &[Use] {
        &self.uses
    }

    pub fn has_one_use(&self) -> bool {
        self.uses.len() == 1
    }

    pub fn use_empty(&self) -> bool {
        self.uses.is_empty()
    }

    pub fn is_erased(&self) -> bool {
        self.erased
    }

    /// The address operand of a load or store.
    pub fn pointer_operand(&self) -> Option<Value> {
        match self.kind {
            InstKind::Load => self.operands.first().copied(),
            InstKind::Store => self.operands.get(1).copied(),
            _ => None,
        }
    }
}
