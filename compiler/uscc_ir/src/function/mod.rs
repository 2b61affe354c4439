//! Function bodies: an ordered list of basic blocks over an instruction arena.
//!
//! The function owns every instruction. Blocks hold ordered lists of
//! [`InstId`]s into the arena. Every mutation goes through `Function` so
//! that operand lists and use-lists never disagree:
//!
//! - appending an instruction registers a [`Use`] on each instruction operand;
//! - [`replace_all_uses_with`](Function::replace_all_uses_with) moves uses;
//! - [`erase`](Function::erase) detaches an instruction and drops the uses
//!   its operands recorded.
//!
//! Each mutation bumps [`epoch`](Function::epoch), which analysis results
//! record so a stale result can be caught before it is queried.

use smallvec::SmallVec;

use crate::instr::{BlockId, InstData, InstId, InstKind, Type, Use, Value};

/// A basic block: a name for diagnostics and the ordered instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockData {
    name: Box<str>,
    insts: Vec<InstId>,
}

impl BlockData {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instructions in program order. The terminator, if any, is last.
    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }
}

/// A function body.
///
/// `blocks[0]` is the entry block. Block order is layout order and is
/// never changed once blocks are created.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    name: Box<str>,
    blocks: Vec<BlockData>,
    insts: Vec<InstData>,
    #[cfg_attr(feature = "serde", serde(skip))]
    epoch: u64,
}

impl Function {
    /// Create an empty function (no blocks).
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            insts: Vec::new(),
            epoch: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Blocks ──────────────────────────────────────────────────

    /// Returns `true` if the function has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Block IDs in layout order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        (0..self.blocks.len()).map(block_id_at)
    }

    /// The entry block, or `None` for an empty function.
    pub fn entry(&self) -> Option<BlockId> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(BlockId::new(0))
        }
    }

    /// The last block in layout order.
    pub fn last_block(&self) -> Option<BlockId> {
        self.block_ids().last()
    }

    /// Look up a block.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn block(&self, id: BlockId) -> &BlockData {
        &self.blocks[id.index()]
    }

    /// Append a new, empty block at the end of the layout.
    pub fn push_block(&mut self, name: &str) -> BlockId {
        let id = block_id_at(self.blocks.len());
        self.blocks.push(BlockData {
            name: name.into(),
            insts: Vec::new(),
        });
        self.epoch += 1;
        id
    }

    /// The block's terminator: its last instruction, if that is one.
    pub fn terminator(&self, block: BlockId) -> Option<InstId> {
        let last = *self.block(block).insts.last()?;
        self.inst(last).kind.is_terminator().then_some(last)
    }

    /// Successor blocks, derived from the terminator.
    pub fn successors(&self, block: BlockId) -> SmallVec<[BlockId; 2]> {
        match self.terminator(block) {
            Some(term) => self.inst(term).kind.successors(),
            None => SmallVec::new(),
        }
    }

    // ── Instructions ────────────────────────────────────────────

    /// Look up an instruction slot (erased instructions included).
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this function.
    #[inline]
    pub fn inst(&self, id: InstId) -> &InstData {
        &self.insts[id.index()]
    }

    /// Number of arena slots, erased instructions included.
    pub fn inst_capacity(&self) -> usize {
        self.insts.len()
    }

    /// Number of instructions currently placed in a block.
    pub fn num_insts(&self) -> usize {
        self.blocks.iter().map(|b| b.insts.len()).sum()
    }

    /// All placed instructions in layout order.
    pub fn insts(&self) -> impl Iterator<Item = InstId> + '_ {
        self.blocks.iter().flat_map(|b| b.insts.iter().copied())
    }

    /// Index of `inst` within its block.
    pub fn position(&self, inst: InstId) -> Option<usize> {
        let block = self.inst(inst).block?;
        self.block(block).insts.iter().position(|&i| i == inst)
    }

    /// Type of an operand value.
    pub fn value_type(&self, value: Value) -> Type {
        match value {
            Value::Const { ty, .. } | Value::Undef(ty) => ty,
            Value::Inst(id) => self.inst(id).ty,
        }
    }

    /// Mutation counter. Changes whenever blocks or instructions do.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Append an instruction to the end of `block`.
    ///
    /// Registers a use on every instruction operand.
    pub(crate) fn append_inst(
        &mut self,
        block: BlockId,
        kind: InstKind,
        ty: Type,
        operands: SmallVec<[Value; 2]>,
        name: Option<&str>,
    ) -> InstId {
        debug_assert!(
            block.index() < self.blocks.len(),
            "block {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len(),
        );
        let id = InstId::new(
            u32::try_from(self.insts.len())
                .unwrap_or_else(|_| panic!("instruction count exceeds u32::MAX")),
        );
        for (operand, value) in operands.iter().enumerate() {
            if let Value::Inst(producer) = *value {
                debug_assert!(
                    !self.inst(producer).erased,
                    "operand refers to erased instruction {}",
                    producer.raw(),
                );
                self.insts[producer.index()].uses.push(Use {
                    user: id,
                    operand: operand_index(operand),
                });
            }
        }
        self.insts.push(InstData {
            kind,
            ty,
            operands,
            name: name.map(Into::into),
            block: Some(block),
            uses: Vec::new(),
            erased: false,
        });
        self.blocks[block.index()].insts.push(id);
        self.epoch += 1;
        id
    }

    /// Rewrite every use of `inst` to refer to `replacement` instead.
    ///
    /// Afterwards `inst` has no uses. If `replacement` is itself an
    /// instruction, it inherits the moved uses.
    pub fn replace_all_uses_with(&mut self, inst: InstId, replacement: Value) {
        debug_assert_ne!(
            replacement,
            Value::Inst(inst),
            "cannot replace instruction {} with itself",
            inst.raw(),
        );
        let uses = std::mem::take(&mut self.insts[inst.index()].uses);
        if uses.is_empty() {
            return;
        }
        for u in &uses {
            self.insts[u.user.index()].operands[u.operand as usize] = replacement;
        }
        if let Value::Inst(new_producer) = replacement {
            self.insts[new_producer.index()].uses.extend_from_slice(&uses);
        }
        self.epoch += 1;
    }

    /// Detach `inst` from its block and destroy it.
    ///
    /// The instruction's operands stop counting as uses of their
    /// producers. The arena slot stays behind marked as erased, with no
    /// block, so a stale `InstId` still resolves to something inert.
    ///
    /// The instruction must have no remaining uses; rewire them first with
    /// [`replace_all_uses_with`](Self::replace_all_uses_with).
    pub fn erase(&mut self, inst: InstId) {
        let data = &self.insts[inst.index()];
        debug_assert!(!data.erased, "instruction {} erased twice", inst.raw());
        debug_assert!(
            data.uses.is_empty(),
            "erasing instruction {} which still has {} uses",
            inst.raw(),
            data.uses.len(),
        );
        if data.erased {
            return;
        }

        if let Some(block) = data.block {
            self.blocks[block.index()].insts.retain(|&i| i != inst);
        }

        let operands = std::mem::take(&mut self.insts[inst.index()].operands);
        for value in &operands {
            if let Value::Inst(producer) = *value {
                self.insts[producer.index()].uses.retain(|u| u.user != inst);
            }
        }

        let data = &mut self.insts[inst.index()];
        data.block = None;
        data.erased = true;
        self.epoch += 1;
    }
}

/// Block ID for a layout position.
fn block_id_at(idx: usize) -> BlockId {
    BlockId::new(u32::try_from(idx).unwrap_or_else(|_| panic!("block count exceeds u32::MAX")))
}

/// Convert an operand position to the `u32` stored in a [`Use`].
fn operand_index(operand: usize) -> u32 {
    u32::try_from(operand).unwrap_or_else(|_| panic!("operand count exceeds u32::MAX"))
}
