//! Incremental construction of [`Function`]s.
//!
//! The builder appends instructions at the end of a current block, the way
//! a front end lowering statements one at a time would. Result types are
//! derived from operands where the instruction kind determines them.

use smallvec::{smallvec, SmallVec};

use crate::function::Function;
use crate::instr::{BinOp, BlockId, CmpOp, InstId, InstKind, Type, Value};

/// Builds a [`Function`] block by block.
pub struct FunctionBuilder {
    func: Function,
    current: Option<BlockId>,
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            func: Function::new(name),
            current: None,
        }
    }

    /// Append a block to the layout. Does not change the insertion point.
    pub fn create_block(&mut self, name: &str) -> BlockId {
        self.func.push_block(name)
    }

    /// Set the block subsequent instructions are appended to.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// The function built so far.
    pub fn func(&self) -> &Function {
        &self.func
    }

    pub fn finish(self) -> Function {
        self.func
    }

    /// Declare a named stack slot.
    pub fn alloca(&mut self, name: &str, allocated: Type) -> InstId {
        self.push(
            InstKind::Alloca { allocated },
            Type::Ptr,
            SmallVec::new(),
            Some(name),
        )
    }

    /// Declare a stack slot without a name (never tracked by liveness).
    pub fn unnamed_alloca(&mut self, allocated: Type) -> InstId {
        self.push(InstKind::Alloca { allocated }, Type::Ptr, SmallVec::new(), None)
    }

    pub fn load(&mut self, ty: Type, ptr: impl Into<Value>) -> InstId {
        self.push(InstKind::Load, ty, smallvec![ptr.into()], None)
    }

    pub fn store(&mut self, value: impl Into<Value>, ptr: impl Into<Value>) -> InstId {
        self.push(
            InstKind::Store,
            Type::Void,
            smallvec![value.into(), ptr.into()],
            None,
        )
    }

    pub fn call(&mut self, callee: &str, ret: Type, args: &[Value]) -> InstId {
        self.push(
            InstKind::Call {
                callee: callee.into(),
            },
            ret,
            args.iter().copied().collect(),
            None,
        )
    }

    /// Arithmetic; the result has the type of `lhs`.
    pub fn binary(&mut self, op: BinOp, lhs: impl Into<Value>, rhs: impl Into<Value>) -> InstId {
        let lhs = lhs.into();
        let ty = self.func.value_type(lhs);
        self.push(InstKind::Binary(op), ty, smallvec![lhs, rhs.into()], None)
    }

    pub fn cmp(&mut self, op: CmpOp, lhs: impl Into<Value>, rhs: impl Into<Value>) -> InstId {
        self.push(
            InstKind::Cmp(op),
            Type::I1,
            smallvec![lhs.into(), rhs.into()],
            None,
        )
    }

    pub fn cast(&mut self, value: impl Into<Value>, to: Type) -> InstId {
        self.push(InstKind::Cast, to, smallvec![value.into()], None)
    }

    pub fn br(&mut self, target: BlockId) -> InstId {
        self.push(InstKind::Br { target }, Type::Void, SmallVec::new(), None)
    }

    pub fn cond_br(
        &mut self,
        cond: impl Into<Value>,
        then_block: BlockId,
        else_block: BlockId,
    ) -> InstId {
        self.push(
            InstKind::CondBr {
                then_block,
                else_block,
            },
            Type::Void,
            smallvec![cond.into()],
            None,
        )
    }

    /// `ret <value>` or, with `None`, `ret void`.
    pub fn ret(&mut self, value: Option<Value>) -> InstId {
        let operands = value.into_iter().collect();
        self.push(InstKind::Ret, Type::Void, operands, None)
    }

    fn push(
        &mut self,
        kind: InstKind,
        ty: Type,
        operands: SmallVec<[Value; 2]>,
        name: Option<&str>,
    ) -> InstId {
        let Some(block) = self.current else {
            panic!("FunctionBuilder: no current block; call switch_to first");
        };
        debug_assert!(
            self.func.terminator(block).is_none(),
            "appending to block `{}` after its terminator",
            self.func.block(block).name(),
        );
        self.func.append_inst(block, kind, ty, operands, name)
    }
}
