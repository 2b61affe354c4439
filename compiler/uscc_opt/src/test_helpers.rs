//! Shared test utilities for the optimizer passes.
//!
//! Factory functions used across `graph`, `liveness`, `dce`, `pass`, and
//! pipeline tests. Only compiled in test builds.

use uscc_ir::{BlockId, Function, FunctionBuilder, InstId, Opcode, Type, Value};

use crate::LiveSet;

/// Block names for a sequence of block IDs.
pub(crate) fn block_names<'a>(func: &'a Function, blocks: &[BlockId]) -> Vec<&'a str> {
    blocks.iter().map(|&b| func.block(b).name()).collect()
}

/// Sorted alloca names of a live set.
pub(crate) fn slot_names<'a>(func: &'a Function, set: &LiveSet) -> Vec<&'a str> {
    let mut names: Vec<&str> = set
        .iter()
        .map(|&slot| func.inst(slot).name().unwrap_or_default())
        .collect();
    names.sort_unstable();
    names
}

/// Number of placed instructions with the given opcode.
pub(crate) fn count_opcode(func: &Function, opcode: Opcode) -> usize {
    func.insts()
        .filter(|&inst| func.inst(inst).opcode() == opcode)
        .count()
}

/// Handles into the function built by [`diamond`].
pub(crate) struct Diamond {
    pub entry: BlockId,
    pub left: BlockId,
    pub right: BlockId,
    pub merge: BlockId,
    /// `y.addr`
    pub slot: InstId,
    /// The only store to `y`, in `left`.
    pub store: InstId,
}

/// Diamond CFG where only one arm writes the variable the merge reads.
///
/// ```text
/// entry:  %y.addr = alloca i32
///         br i1 true, label %left, label %right
/// left:   store i32 1, ptr %y.addr
///         br label %merge
/// right:  br label %merge
/// merge:  %v = load i32, ptr %y.addr
///         ret i32 %v
/// ```
pub(crate) fn diamond() -> (Function, Diamond) {
    let mut fb = FunctionBuilder::new("diamond");
    let entry = fb.create_block("entry");
    let left = fb.create_block("left");
    let right = fb.create_block("right");
    let merge = fb.create_block("merge");

    fb.switch_to(entry);
    let slot = fb.alloca("y.addr", Type::I32);
    fb.cond_br(Value::bool(true), left, right);

    fb.switch_to(left);
    let store = fb.store(Value::i32(1), slot);
    fb.br(merge);

    fb.switch_to(right);
    fb.br(merge);

    fb.switch_to(merge);
    let v = fb.load(Type::I32, slot);
    fb.ret(Some(v.into()));

    let ids = Diamond {
        entry,
        left,
        right,
        merge,
        slot,
        store,
    };
    (fb.finish(), ids)
}

/// Two blocks; `entry` stores to `x` and nothing ever reads it.
///
/// ```text
/// entry:  %x.addr = alloca i32
///         store i32 5, ptr %x.addr
///         br label %exit
/// exit:   ret void
/// ```
///
/// Returns the function, the alloca, and the store.
pub(crate) fn unread_store() -> (Function, InstId, InstId) {
    let mut fb = FunctionBuilder::new("unread");
    let entry = fb.create_block("entry");
    let exit = fb.create_block("exit");
    fb.switch_to(entry);
    let slot = fb.alloca("x.addr", Type::I32);
    let store = fb.store(Value::i32(5), slot);
    fb.br(exit);
    fb.switch_to(exit);
    fb.ret(None);
    (fb.finish(), slot, store)
}

/// One block; the stored value is read straight back and returned.
///
/// ```text
/// entry:  %x.addr = alloca i32
///         store i32 7, ptr %x.addr
///         %v = load i32, ptr %x.addr
///         ret i32 %v
/// ```
///
/// Returns the function, the alloca, and the store.
pub(crate) fn store_then_load() -> (Function, InstId, InstId) {
    let mut fb = FunctionBuilder::new("roundtrip");
    let entry = fb.create_block("entry");
    fb.switch_to(entry);
    let slot = fb.alloca("x.addr", Type::I32);
    let store = fb.store(Value::i32(7), slot);
    let v = fb.load(Type::I32, slot);
    fb.ret(Some(v.into()));
    (fb.finish(), slot, store)
}

/// Handles into the function built by [`counting_loop`].
pub(crate) struct CountingLoop {
    pub entry: BlockId,
    pub header: BlockId,
    pub body: BlockId,
    pub exit: BlockId,
    pub slot: InstId,
    pub init: InstId,
    pub increment: InstId,
}

/// `i = 0; while (i < 10) i = i + 1; return i;`
///
/// ```text
/// entry:   %i.addr = alloca i32
///          store i32 0, ptr %i.addr
///          br label %header
/// header:  %0 = load i32, ptr %i.addr
///          %1 = icmp slt i32 %0, 10
///          br i1 %1, label %body, label %exit
/// body:    %2 = load i32, ptr %i.addr
///          %3 = add i32 %2, 1
///          store i32 %3, ptr %i.addr
///          br label %header
/// exit:    %4 = load i32, ptr %i.addr
///          ret i32 %4
/// ```
pub(crate) fn counting_loop() -> (Function, CountingLoop) {
    use uscc_ir::{BinOp, CmpOp};

    let mut fb = FunctionBuilder::new("count");
    let entry = fb.create_block("entry");
    let header = fb.create_block("header");
    let body = fb.create_block("body");
    let exit = fb.create_block("exit");

    fb.switch_to(entry);
    let slot = fb.alloca("i.addr", Type::I32);
    let init = fb.store(Value::i32(0), slot);
    fb.br(header);

    fb.switch_to(header);
    let cur = fb.load(Type::I32, slot);
    let cond = fb.cmp(CmpOp::Lt, cur, Value::i32(10));
    fb.cond_br(cond, body, exit);

    fb.switch_to(body);
    let old = fb.load(Type::I32, slot);
    let next = fb.binary(BinOp::Add, old, Value::i32(1));
    let increment = fb.store(next, slot);
    fb.br(header);

    fb.switch_to(exit);
    let result = fb.load(Type::I32, slot);
    fb.ret(Some(result.into()));

    let ids = CountingLoop {
        entry,
        header,
        body,
        exit,
        slot,
        init,
        increment,
    };
    (fb.finish(), ids)
}
