//! Structural verification of a [`Function`].
//!
//! Checks the invariants the middle end relies on: every block ends in
//! exactly one terminator, operands refer to live instructions, branch
//! targets exist, parent links agree with block contents, and use-lists
//! match the operand lists they mirror.
//!
//! Passes run the verifier in tests after every transformation; a failure
//! points at the pass that broke the IR rather than at whichever later
//! pass trips over it.

use rustc_hash::FxHashMap;

use crate::function::Function;
use crate::instr::{BlockId, InstId, Use, Value};

/// A violated IR invariant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IrProblem {
    #[error("block `{block}` is empty")]
    EmptyBlock { block: String },

    #[error("block `{block}` does not end in a terminator")]
    MissingTerminator { block: String },

    #[error("block `{block}` has terminator %{inst} before its last instruction")]
    EarlyTerminator { block: String, inst: u32 },

    #[error("instruction %{inst} in block `{block}` records block {recorded:?} as its parent")]
    WrongParent {
        block: String,
        inst: u32,
        recorded: Option<u32>,
    },

    #[error("instruction %{inst} in block `{block}` uses erased instruction %{operand}")]
    DanglingOperand {
        block: String,
        inst: u32,
        operand: u32,
    },

    #[error("instruction %{inst} in block `{block}` branches to missing block {target}")]
    BadBranchTarget {
        block: String,
        inst: u32,
        target: u32,
    },

    #[error("use-list of instruction %{inst} does not match the operands referring to it")]
    UseListMismatch { inst: u32 },
}

/// Verify `func`, collecting every problem found.
///
/// An empty function (no blocks) is valid.
pub fn verify(func: &Function) -> Result<(), Vec<IrProblem>> {
    let mut problems = Vec::new();
    // Expected use-lists, rebuilt from operands.
    let mut expected: FxHashMap<InstId, Vec<Use>> = FxHashMap::default();

    for block in func.block_ids() {
        verify_block(func, block, &mut expected, &mut problems);
    }

    for idx in 0..func.inst_capacity() {
        let id = InstId::new(u32::try_from(idx).unwrap_or(u32::MAX));
        let data = func.inst(id);
        let mut actual = data.uses().to_vec();
        actual.sort_unstable();
        let mut want = expected.remove(&id).unwrap_or_default();
        want.sort_unstable();
        if actual != want {
            problems.push(IrProblem::UseListMismatch { inst: id.raw() });
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

fn verify_block(
    func: &Function,
    block: BlockId,
    expected: &mut FxHashMap<InstId, Vec<Use>>,
    problems: &mut Vec<IrProblem>,
) {
    let data = func.block(block);
    let name = || data.name().to_owned();
    let insts = data.insts();

    if insts.is_empty() {
        problems.push(IrProblem::EmptyBlock { block: name() });
        return;
    }

    for (pos, &inst) in insts.iter().enumerate() {
        let inst_data = func.inst(inst);

        if inst_data.block() != Some(block) {
            problems.push(IrProblem::WrongParent {
                block: name(),
                inst: inst.raw(),
                recorded: inst_data.block().map(BlockId::raw),
            });
        }

        if inst_data.kind().is_terminator() && pos + 1 != insts.len() {
            problems.push(IrProblem::EarlyTerminator {
                block: name(),
                inst: inst.raw(),
            });
        }

        for target in inst_data.kind().successors() {
            if target.index() >= func.num_blocks() {
                problems.push(IrProblem::BadBranchTarget {
                    block: name(),
                    inst: inst.raw(),
                    target: target.raw(),
                });
            }
        }

        for (operand, value) in inst_data.operands().iter().enumerate() {
            let Value::Inst(producer) = *value else {
                continue;
            };
            if producer.index() >= func.inst_capacity() || func.inst(producer).is_erased() {
                problems.push(IrProblem::DanglingOperand {
                    block: name(),
                    inst: inst.raw(),
                    operand: producer.raw(),
                });
                continue;
            }
            expected.entry(producer).or_default().push(Use {
                user: inst,
                operand: u32::try_from(operand).unwrap_or(u32::MAX),
            });
        }
    }

    if func.terminator(block).is_none() {
        problems.push(IrProblem::MissingTerminator { block: name() });
    }
}
