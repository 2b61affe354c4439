//! Stack-slot liveness and dead-store elimination for the USCC middle end.
//!
//! This crate provides:
//!
//! - **Liveness analysis** ([`compute_liveness`], [`LivenessResult`]): a
//!   backward dataflow fixed point computing, for every basic block, the
//!   named stack slots live on entry and exit, plus a point query
//!   ([`LivenessResult::is_dead`]) telling whether a store's value can
//!   ever be read.
//!
//! - **Dead-code elimination** ([`eliminate_dead_code`]): deletes dead
//!   stores together with the single-use computations feeding only them,
//!   re-running liveness after every round, and finally drops allocas
//!   nothing refers to.
//!
//! - **Pass contract** ([`FunctionPass`], [`AnalysisUsage`]): what each
//!   pass requires and preserves, for whatever schedules them.
//!
//! # Design
//!
//! Only *named* allocas are tracked. SSA values never enter a live set;
//! the analysis reasons purely about load/store traffic through stack
//! slots, and treats each slot as its own storage location.
//!
//! Liveness results are tied to the function's mutation epoch. DCE throws
//! its result away and recomputes after every round of deletions.
//!
//! # Crate Dependencies
//!
//! `uscc_opt` depends only on `uscc_ir` for the CFG and instruction
//! representation.

pub mod config;
pub mod dce;
mod graph;
pub mod liveness;
pub mod pass;

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod tests;

use std::sync::Once;

pub use config::OptConfig;
pub use dce::{eliminate_dead_code, eliminate_dead_code_with, DceStats};
pub use liveness::{compute_liveness, compute_liveness_with, LiveSet, LivenessResult};
pub use pass::{AnalysisId, AnalysisUsage, DeadCodeEliminationPass, FunctionPass, LivenessPass};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=uscc_opt=debug` or `RUST_LOG=uscc_opt=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
