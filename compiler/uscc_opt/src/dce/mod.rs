//! Dead-store elimination driven by stack-slot liveness.
//!
//! Removes stores whose value is never read, together with the
//! computations that exist only to feed them, then drops stack slots that
//! nothing refers to any more.
//!
//! # Algorithm
//!
//! Each round:
//!
//! 1. Compute liveness from scratch.
//! 2. Collect every store the analysis reports dead. From each, walk the
//!    operand graph with an explicit stack: an operand produced by an
//!    instruction with exactly one use (this one) that is not a call is
//!    dead too.
//! 3. Remove the whole dead set. Nothing is mutated until the set is
//!    complete, so the liveness result is never queried on a changed
//!    function.
//!
//! Rounds repeat until one finds nothing: deleting a load can make an
//! earlier store dead. A final sweep erases every `alloca` without uses.
//!
//! Blocks and terminators are never touched, so the CFG is preserved.

use rustc_hash::FxHashSet;
use uscc_ir::{Function, InstId, Opcode, Value};

use crate::liveness::{compute_liveness_with, LivenessResult};
use crate::OptConfig;

/// What a DCE run removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DceStats {
    /// Dead stores.
    pub stores: usize,
    /// Non-store, non-alloca instructions that only fed dead stores.
    pub producers: usize,
    /// Stack slots left without uses.
    pub allocas: usize,
    /// Liveness rounds run, the final empty one included.
    pub rounds: usize,
}

impl DceStats {
    /// Did the run remove anything?
    pub fn changed(&self) -> bool {
        self.stores + self.producers + self.allocas > 0
    }

    fn record(&mut self, opcode: Opcode) {
        match opcode {
            Opcode::Store => self.stores += 1,
            Opcode::Alloca => self.allocas += 1,
            Opcode::Load | Opcode::Call | Opcode::Other => self.producers += 1,
        }
    }
}

/// Remove dead stores, their single-use producers, and unused allocas.
///
/// Returns `true` if anything was removed. An empty function is left
/// alone.
pub fn eliminate_dead_code(func: &mut Function) -> bool {
    eliminate_dead_code_with(func, &OptConfig::default()).changed()
}

/// [`eliminate_dead_code`] with explicit options, reporting what was
/// removed.
///
/// `config.dump_liveness` dumps every liveness result computed along the
/// way.
pub fn eliminate_dead_code_with(func: &mut Function, config: &OptConfig) -> DceStats {
    let mut stats = DceStats::default();
    if func.is_empty() {
        return stats;
    }

    loop {
        stats.rounds += 1;
        let liveness = compute_liveness_with(func, config);
        let dead = collect_dead(func, &liveness);
        if dead.is_empty() {
            break;
        }

        tracing::debug!(
            function = func.name(),
            round = stats.rounds,
            dead = dead.len(),
            "removing dead instructions"
        );
        for inst in dead {
            stats.record(func.inst(inst).opcode());
            remove(func, inst);
        }
    }

    let unused: Vec<InstId> = func
        .insts()
        .filter(|&inst| {
            let data = func.inst(inst);
            data.opcode() == Opcode::Alloca && data.use_empty()
        })
        .collect();
    for inst in unused {
        stats.record(Opcode::Alloca);
        remove(func, inst);
    }

    if stats.changed() {
        tracing::debug!(
            function = func.name(),
            stores = stats.stores,
            producers = stats.producers,
            allocas = stats.allocas,
            rounds = stats.rounds,
            "eliminated dead code"
        );
    }

    stats
}

/// Every dead store plus the producer chains feeding only them, in
/// discovery order. A user is always discovered before its producers.
fn collect_dead(func: &Function, liveness: &LivenessResult) -> Vec<InstId> {
    let mut dead = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stack = Vec::new();

    for store in func.insts() {
        if func.inst(store).opcode() != Opcode::Store || !liveness.is_dead(func, store) {
            continue;
        }
        if !seen.insert(store) {
            continue;
        }
        dead.push(store);
        stack.push(store);

        while let Some(user) = stack.pop() {
            for &operand in func.inst(user).operands() {
                let Value::Inst(producer) = operand else {
                    continue;
                };
                let data = func.inst(producer);
                if data.has_one_use() && data.opcode() != Opcode::Call && seen.insert(producer) {
                    dead.push(producer);
                    stack.push(producer);
                }
            }
        }
    }

    dead
}

/// Erase `inst`, first rewiring any remaining uses to `undef`.
fn remove(func: &mut Function, inst: InstId) {
    let data = func.inst(inst);
    if data.is_erased() {
        return;
    }
    if !data.use_empty() {
        let ty = data.ty();
        func.replace_all_uses_with(inst, Value::Undef(ty));
    }
    tracing::trace!(inst = inst.raw(), "erasing");
    func.erase(inst);
}
