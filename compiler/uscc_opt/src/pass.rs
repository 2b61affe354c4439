//! Pass registration contract.
//!
//! Each pass declares which analyses it needs and which it leaves valid,
//! so whatever schedules passes can decide what to recompute. This module
//! only describes passes; it does not schedule them.

use smallvec::SmallVec;
use uscc_ir::Function;

use crate::dce::{eliminate_dead_code_with, DceStats};
use crate::liveness::{compute_liveness_with, LivenessResult};
use crate::OptConfig;

/// Analyses a pass can depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalysisId {
    Liveness,
}

/// What a pass requires before it runs and what stays valid after.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisUsage {
    pub required: SmallVec<[AnalysisId; 2]>,
    pub preserved: SmallVec<[AnalysisId; 2]>,
    /// Every analysis stays valid (the pass does not mutate the function).
    pub preserves_all: bool,
    /// Blocks and terminators are left as they were.
    pub preserves_cfg: bool,
}

impl AnalysisUsage {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_required(mut self, id: AnalysisId) -> Self {
        if !self.required.contains(&id) {
            self.required.push(id);
        }
        self
    }

    #[must_use]
    pub fn add_preserved(mut self, id: AnalysisId) -> Self {
        if !self.preserved.contains(&id) {
            self.preserved.push(id);
        }
        self
    }

    #[must_use]
    pub fn set_preserves_all(mut self) -> Self {
        self.preserves_all = true;
        self.preserves_cfg = true;
        self
    }

    #[must_use]
    pub fn set_preserves_cfg(mut self) -> Self {
        self.preserves_cfg = true;
        self
    }

    pub fn requires(&self, id: AnalysisId) -> bool {
        self.required.contains(&id)
    }

    pub fn preserves(&self, id: AnalysisId) -> bool {
        self.preserves_all || self.preserved.contains(&id)
    }
}

/// A pass over one function at a time.
pub trait FunctionPass {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn usage(&self) -> AnalysisUsage;

    /// Run on `func`, returning `true` if the function changed.
    fn run_on_function(&mut self, func: &mut Function) -> bool;
}

/// Computes [`LivenessResult`] and keeps the most recent one.
#[derive(Debug, Default)]
pub struct LivenessPass {
    config: OptConfig,
    result: Option<LivenessResult>,
}

impl LivenessPass {
    pub fn new(config: OptConfig) -> Self {
        Self {
            config,
            result: None,
        }
    }

    /// Result of the last run, if any.
    pub fn result(&self) -> Option<&LivenessResult> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<LivenessResult> {
        self.result.take()
    }
}

impl FunctionPass for LivenessPass {
    fn name(&self) -> &'static str {
        "liveness"
    }

    fn usage(&self) -> AnalysisUsage {
        AnalysisUsage::new().set_preserves_all()
    }

    fn run_on_function(&mut self, func: &mut Function) -> bool {
        self.result = Some(compute_liveness_with(func, &self.config));
        false
    }
}

/// Dead-store elimination; see [`crate::dce`].
///
/// Recomputes liveness itself after every round, so the analysis is
/// still valid for the function it leaves behind.
#[derive(Debug, Default)]
pub struct DeadCodeEliminationPass {
    config: OptConfig,
    stats: DceStats,
}

impl DeadCodeEliminationPass {
    pub fn new(config: OptConfig) -> Self {
        Self {
            config,
            stats: DceStats::default(),
        }
    }

    /// What the last run removed.
    pub fn stats(&self) -> DceStats {
        self.stats
    }
}

impl FunctionPass for DeadCodeEliminationPass {
    fn name(&self) -> &'static str {
        "dce"
    }

    fn usage(&self) -> AnalysisUsage {
        AnalysisUsage::new()
            .add_required(AnalysisId::Liveness)
            .add_preserved(AnalysisId::Liveness)
            .set_preserves_cfg()
    }

    fn run_on_function(&mut self, func: &mut Function) -> bool {
        self.stats = eliminate_dead_code_with(func, &self.config);
        tracing::debug!(
            pass = self.name(),
            function = func.name(),
            changed = self.stats.changed(),
            "pass finished"
        );
        self.stats.changed()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test_helpers::{diamond, unread_store};
    use crate::OptConfig;

    use super::*;

    #[test]
    fn liveness_pass_preserves_everything() {
        let usage = LivenessPass::default().usage();
        assert!(usage.required.is_empty());
        assert!(usage.preserves(AnalysisId::Liveness));
        assert!(usage.preserves_cfg);
    }

    #[test]
    fn dce_pass_usage() {
        let usage = DeadCodeEliminationPass::default().usage();
        assert!(usage.requires(AnalysisId::Liveness));
        assert!(usage.preserves(AnalysisId::Liveness));
        assert!(usage.preserves_cfg);
        assert!(!usage.preserves_all);
    }

    #[test]
    fn usage_builders_deduplicate() {
        let usage = AnalysisUsage::new()
            .add_required(AnalysisId::Liveness)
            .add_required(AnalysisId::Liveness)
            .add_preserved(AnalysisId::Liveness)
            .add_preserved(AnalysisId::Liveness);
        assert_eq!(usage.required.len(), 1);
        assert_eq!(usage.preserved.len(), 1);
        assert!(!usage.preserves_cfg);
    }

    #[test]
    fn liveness_pass_keeps_result_and_never_changes() {
        let (mut func, ids) = diamond();
        let before = func.clone();
        let mut pass = LivenessPass::new(OptConfig::default());

        assert!(pass.result().is_none());
        assert!(!pass.run_on_function(&mut func));
        assert_eq!(func, before);

        let Some(result) = pass.take_result() else {
            panic!("liveness pass stores its result");
        };
        assert!(!result.is_dead(&func, ids.store));
        assert!(pass.result().is_none());
    }

    #[test]
    fn dce_pass_reports_change_and_stats() {
        let (mut func, _, _) = unread_store();
        let mut pass = DeadCodeEliminationPass::new(OptConfig::default());

        assert_eq!(pass.name(), "dce");
        assert!(pass.run_on_function(&mut func));
        assert_eq!(pass.stats().stores, 1);
        assert!(!pass.run_on_function(&mut func));
        assert!(!pass.stats().changed());
    }

    #[test]
    fn passes_are_object_safe() {
        let mut passes: Vec<Box<dyn FunctionPass>> = vec![
            Box::new(LivenessPass::default()),
            Box::new(DeadCodeEliminationPass::default()),
        ];
        let names: Vec<&str> = passes.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["liveness", "dce"]);

        let (mut func, _, _) = unread_store();
        let changed: Vec<bool> = passes
            .iter_mut()
            .map(|p| p.run_on_function(&mut func))
            .collect();
        assert_eq!(changed, [false, true]);
    }
}
