//! Shared CFG traversal utilities for the optimizer.
//!
//! Kept apart from the passes so that passes never import from each
//! other: liveness and dead-code elimination both depend on `graph`,
//! neither depends on the other's internals.

use uscc_ir::{BlockId, Function};

/// Compute a postorder traversal of the CFG starting from the entry block.
///
/// Uses an iterative DFS with an explicit stack to avoid recursion depth
/// issues on deeply nested CFGs. Only visits reachable blocks.
pub(crate) fn compute_postorder(func: &Function) -> Vec<BlockId> {
    let Some(entry) = func.entry() else {
        return Vec::new();
    };
    let num_blocks = func.num_blocks();
    let mut visited = vec![false; num_blocks];
    let mut postorder = Vec::with_capacity(num_blocks);

    // Stack entries: (block, children_processed).
    // When children_processed is false, we push successors.
    // When true, we emit the block to postorder.
    let mut stack: Vec<(BlockId, bool)> = vec![(entry, false)];

    while let Some(&mut (block, ref mut children_done)) = stack.last_mut() {
        if *children_done {
            postorder.push(block);
            stack.pop();
            continue;
        }

        *children_done = true;

        if block.index() >= num_blocks || visited[block.index()] {
            stack.pop();
            continue;
        }
        visited[block.index()] = true;

        for succ in func.successors(block) {
            if succ.index() < num_blocks && !visited[succ.index()] {
                stack.push((succ, false));
            }
        }
    }

    postorder
}

/// Block processing order for backward dataflow problems.
///
/// Postorder from the entry (successors before predecessors), followed by
/// any blocks unreachable from the entry in layout order, so that every
/// block receives a solution.
pub(crate) fn backward_order(func: &Function) -> Vec<BlockId> {
    let mut order = compute_postorder(func);
    if order.len() < func.num_blocks() {
        let mut seen = vec![false; func.num_blocks()];
        for block in &order {
            seen[block.index()] = true;
        }
        order.extend(func.block_ids().filter(|b| !seen[b.index()]));
    }
    order
}
