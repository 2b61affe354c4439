//! Backward dataflow liveness of named stack slots.
//!
//! Computes which stack slots are **live** (may still be read before being
//! overwritten) at every basic block boundary. Dead-code elimination uses
//! it to find stores whose value nobody observes.
//!
//! # Algorithm
//!
//! Standard backward dataflow with fixed-point iteration:
//!
//! 1. **Tracked slots**: every `alloca` that carries a name. Unnamed
//!    allocas and SSA values are ignored entirely.
//! 2. **Precompute DEF/USE** for each block (reverse scan).
//!    - `use(B)` = slots loaded before any store to them in B.
//!    - `def(B)` = slots stored to before any load of them in B.
//! 3. **Postorder iteration** for convergence:
//!    - `live_out(B) = ∪ live_in(S)` for each successor S.
//!    - `live_in(B) = (live_out(B) ∪ use(B)) - def(B)`.
//! 4. Repeat full passes until no `live_in` set changes.
//!
//! Blocks without successors end up with an empty `live_out`, whichever
//! of them is last in layout order.
//!
//! # References
//!
//! - Appel: "Modern Compiler Implementation" §10.1 (dataflow analysis)
//! - Cooper & Torczon: "Engineering a Compiler" §8.6 (live variables)

use std::fmt;

use rustc_hash::FxHashSet;
use uscc_ir::{BlockId, Function, InstId, Opcode, Value};

use crate::graph::backward_order;
use crate::OptConfig;

/// Set of live stack slots, each identified by its `alloca`.
///
/// Uses `FxHashSet` for simplicity. A bitset indexed by a dense slot
/// numbering would be faster for functions with many slots.
pub type LiveSet = FxHashSet<InstId>;

/// Suffix front ends append to the allocas backing named locals.
const SLOT_SUFFIX: &str = ".addr";

/// How an instruction touches a tracked slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotAccess {
    Load(InstId),
    Store(InstId),
}

/// Liveness information for every basic block in a function.
///
/// `live_in[b]` is the set of slots live at the *entry* of block `b`.
/// `live_out[b]` is the set of slots live at the *exit* of block `b`.
/// Both are indexed by `BlockId::index()`.
///
/// A result describes the function exactly as it was when computed. Any
/// mutation of the function invalidates it.
#[derive(Clone, Debug)]
pub struct LivenessResult {
    /// Slots live at block entry, indexed by `BlockId::index()`.
    pub live_in: Vec<LiveSet>,
    /// Slots live at block exit, indexed by `BlockId::index()`.
    pub live_out: Vec<LiveSet>,
    def: Vec<LiveSet>,
    used: Vec<LiveSet>,
    tracked: LiveSet,
    iterations: u32,
    epoch: u64,
}

/// Compute liveness for all blocks of `func`.
///
/// Pure with respect to `func`. An empty function yields an empty result.
///
/// # Panics
///
/// Panics if the first or last block is empty; front ends never produce
/// such a CFG.
pub fn compute_liveness(func: &Function) -> LivenessResult {
    let num_blocks = func.num_blocks();
    let (Some(first), Some(last)) = (func.entry(), func.last_block()) else {
        return LivenessResult::empty(func.epoch());
    };
    assert!(
        !func.block(first).is_empty() && !func.block(last).is_empty(),
        "the first and last blocks of `{}` must not be empty",
        func.name(),
    );

    tracing::debug!(function = func.name(), num_blocks, "computing liveness");

    // Step 1: tracked slots.
    let tracked = collect_tracked_slots(func);

    // Step 2: DEF/USE for each block.
    let mut def = Vec::with_capacity(num_blocks);
    let mut used = Vec::with_capacity(num_blocks);
    for block in func.block_ids() {
        let (block_def, block_use) = compute_def_use(func, block, &tracked);
        def.push(block_def);
        used.push(block_use);
    }

    // Step 3: processing order.
    let order = backward_order(func);

    // Step 4: fixed-point iteration.
    let mut live_in: Vec<LiveSet> = (0..num_blocks).map(|_| LiveSet::default()).collect();
    let mut live_out: Vec<LiveSet> = (0..num_blocks).map(|_| LiveSet::default()).collect();

    let mut iterations = 0u32;
    loop {
        iterations += 1;
        let mut changed = false;

        for &block in &order {
            let idx = block.index();

            // live_out(B) = ∪ live_in(S) for each successor S.
            let mut new_live_out = LiveSet::default();
            for succ in func.successors(block) {
                if let Some(succ_in) = live_in.get(succ.index()) {
                    new_live_out.extend(succ_in.iter().copied());
                }
            }

            // live_in(B) = (live_out(B) ∪ use(B)) - def(B)
            let mut new_live_in = new_live_out.clone();
            new_live_in.extend(used[idx].iter().copied());
            new_live_in.retain(|slot| !def[idx].contains(slot));

            if new_live_in != live_in[idx] {
                changed = true;
                live_in[idx] = new_live_in;
            }
            live_out[idx] = new_live_out;
        }

        if !changed {
            break;
        }
    }

    tracing::debug!(
        function = func.name(),
        iterations,
        tracked = tracked.len(),
        "liveness converged"
    );

    LivenessResult {
        live_in,
        live_out,
        def,
        used,
        tracked,
        iterations,
        epoch: func.epoch(),
    }
}

/// [`compute_liveness`], printing the IN/OUT dump to stdout when
/// `config.dump_liveness` is set.
pub fn compute_liveness_with(func: &Function, config: &OptConfig) -> LivenessResult {
    let result = compute_liveness(func);
    if config.dump_liveness && !func.is_empty() {
        print!("{}", result.display(func));
    }
    result
}

/// Every named `alloca` in the function.
fn collect_tracked_slots(func: &Function) -> LiveSet {
    func.insts()
        .filter(|&inst| {
            let data = func.inst(inst);
            data.opcode() == Opcode::Alloca && data.name().is_some()
        })
        .collect()
}

/// Compute DEF and USE for one block with a single reverse scan.
///
/// Walking backward, a load makes its slot used (and no longer defined:
/// the read happens before any store seen so far), and a store makes its
/// slot defined (and no longer used).
fn compute_def_use(func: &Function, block: BlockId, tracked: &LiveSet) -> (LiveSet, LiveSet) {
    let mut def = LiveSet::default();
    let mut used = LiveSet::default();

    for &inst in func.block(block).insts().iter().rev() {
        match slot_access(func, inst, tracked) {
            Some(SlotAccess::Load(slot)) => {
                used.insert(slot);
                def.remove(&slot);
            }
            Some(SlotAccess::Store(slot)) => {
                def.insert(slot);
                used.remove(&slot);
            }
            None => {}
        }
    }

    (def, used)
}

/// Classify `inst` as a load from or store to a tracked slot.
fn slot_access(func: &Function, inst: InstId, tracked: &LiveSet) -> Option<SlotAccess> {
    let data = func.inst(inst);
    let Some(Value::Inst(slot)) = data.pointer_operand() else {
        return None;
    };
    if !tracked.contains(&slot) {
        return None;
    }
    match data.opcode() {
        Opcode::Load => Some(SlotAccess::Load(slot)),
        Opcode::Store => Some(SlotAccess::Store(slot)),
        Opcode::Alloca | Opcode::Call | Opcode::Other => None,
    }
}

impl LivenessResult {
    fn empty(epoch: u64) -> Self {
        Self {
            live_in: Vec::new(),
            live_out: Vec::new(),
            def: Vec::new(),
            used: Vec::new(),
            tracked: LiveSet::default(),
            iterations: 0,
            epoch,
        }
    }

    /// Is the value written by `inst` never read?
    ///
    /// Rebuilds the live set holding immediately after `inst` by starting
    /// from its block's `live_out` and walking the instructions after it
    /// backward. The store is dead when its slot is absent from that set:
    /// no later load in this block or any successor observes the value
    /// before it is overwritten or the function returns.
    ///
    /// Only stores to tracked slots can be dead. An instruction that is no
    /// longer in a block (already erased) is reported dead.
    pub fn is_dead(&self, func: &Function, inst: InstId) -> bool {
        let Some(block) = func.inst(inst).block() else {
            return true;
        };
        debug_assert_eq!(
            self.epoch,
            func.epoch(),
            "liveness result queried after `{}` was mutated",
            func.name(),
        );
        let Some(SlotAccess::Store(slot)) = slot_access(func, inst, &self.tracked) else {
            return false;
        };
        let Some(live_out) = self.live_out.get(block.index()) else {
            return true;
        };

        let Some(pos) = func.position(inst) else {
            return true;
        };

        let mut live = live_out.clone();
        for &later in func.block(block).insts()[pos + 1..].iter().rev() {
            match slot_access(func, later, &self.tracked) {
                Some(SlotAccess::Load(s)) => {
                    live.insert(s);
                }
                Some(SlotAccess::Store(s)) => {
                    live.remove(&s);
                }
                None => {}
            }
        }

        !live.contains(&slot)
    }

    /// Slots live at the entry of `block`.
    pub fn live_in(&self, block: BlockId) -> &LiveSet {
        &self.live_in[block.index()]
    }

    /// Slots live at the exit of `block`.
    pub fn live_out(&self, block: BlockId) -> &LiveSet {
        &self.live_out[block.index()]
    }

    /// Slots `block` stores to before reading them.
    pub fn def_set(&self, block: BlockId) -> &LiveSet {
        &self.def[block.index()]
    }

    /// Slots `block` reads before storing to them.
    pub fn use_set(&self, block: BlockId) -> &LiveSet {
        &self.used[block.index()]
    }

    /// Every tracked (named) slot.
    pub fn tracked(&self) -> &LiveSet {
        &self.tracked
    }

    pub fn is_tracked(&self, slot: InstId) -> bool {
        self.tracked.contains(&slot)
    }

    /// Number of full passes the fixed point took, the last (unchanged)
    /// pass included.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// The textual IN/OUT dump for `func`.
    pub fn display<'a>(&'a self, func: &'a Function) -> LivenessDump<'a> {
        LivenessDump { result: self, func }
    }
}

/// Textual IN/OUT report, one entry per block in layout order.
///
/// ```text
/// ********** Live-in/Live-out information **********
/// ********** Function: f, analysis iterates 2 times
/// entry:
///   IN:
///   OUT: x
/// ```
pub struct LivenessDump<'a> {
    result: &'a LivenessResult,
    func: &'a Function,
}

impl LivenessDump<'_> {
    fn write_set(&self, f: &mut fmt::Formatter<'_>, label: &str, set: &LiveSet) -> fmt::Result {
        let mut names: Vec<&str> = set.iter().map(|&slot| slot_name(self.func, slot)).collect();
        names.sort_unstable();
        write!(f, "  {label}:")?;
        for name in names {
            write!(f, " {name}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for LivenessDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "********** Live-in/Live-out information **********")?;
        writeln!(
            f,
            "********** Function: {}, analysis iterates {} times",
            self.func.name(),
            self.result.iterations
        )?;
        let empty = LiveSet::default();
        for block in self.func.block_ids() {
            let idx = block.index();
            writeln!(f, "{}:", self.func.block(block).name())?;
            self.write_set(f, "IN", self.result.live_in.get(idx).unwrap_or(&empty))?;
            self.write_set(f, "OUT", self.result.live_out.get(idx).unwrap_or(&empty))?;
        }
        Ok(())
    }
}

/// Source-level name of a tracked slot: the alloca name without the
/// `.addr` suffix.
fn slot_name(func: &Function, slot: InstId) -> &str {
    let name = func.inst(slot).name().unwrap_or_default();
    name.strip_suffix(SLOT_SUFFIX).unwrap_or(name)
}
