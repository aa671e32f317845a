use tracing::debug;

use super::{FuserError, FuserRuntime, FusionGroup, Stack};
use crate::runtime::guard::{GuardChain, GuardValue, GuardVerdict};

/// Which implementation handled a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    Specialized,
    Fallback,
}

/// A cached compiled path and the guards that gate its reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecializedPath {
    group: FusionGroup,
    guards: GuardChain,
}

impl SpecializedPath {
    pub fn new(group: FusionGroup, guards: GuardChain) -> Self {
        Self { group, guards }
    }

    pub fn group(&self) -> &FusionGroup {
        &self.group
    }

    pub fn guards(&self) -> &GuardChain {
        &self.guards
    }

    /// Whether the cached path may run for `args`. With the fuser disabled
    /// no guard is evaluated and the path is always admitted.
    pub fn admits(&self, runtime: &FuserRuntime, args: &[GuardValue]) -> Result<bool, FuserError> {
        if !runtime.is_enabled()? {
            return Ok(true);
        }
        match self.guards.evaluate(runtime, args)? {
            GuardVerdict::Pass => Ok(true),
            GuardVerdict::Fail { index, guard } => {
                debug!(group = %self.group.name, index, %guard, "guard rejected cached path");
                Ok(false)
            }
        }
    }

    /// Runs the cached path when its guards pass, `fallback` otherwise.
    /// Both consume their inputs from `stack` and push their outputs.
    pub fn execute<F>(
        &self,
        runtime: &FuserRuntime,
        stack: &mut Stack,
        fallback: F,
    ) -> Result<ExecutionPath, FuserError>
    where
        F: FnOnce(&mut Stack) -> anyhow::Result<()>,
    {
        if self.admits(runtime, stack)? {
            runtime.run_fusion_group(&self.group, stack)?;
            runtime.metrics().record_specialized_run();
            return Ok(ExecutionPath::Specialized);
        }
        runtime.metrics().record_fallback();
        fallback(stack).map_err(FuserError::Fallback)?;
        Ok(ExecutionPath::Fallback)
    }
}
