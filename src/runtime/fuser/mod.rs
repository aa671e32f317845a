//! Fuser runtime: enablement, guard mode, fusion flags and the hooks into
//! the host's compilation backend.

mod backend;
mod capability;
mod dispatch;
mod enabler;
mod error;
mod flags;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

pub use backend::{FusionBackend, FusionGroup, FusionNode, Stack};
pub use capability::{Capability, HostCapabilities};
pub use dispatch::{ExecutionPath, SpecializedPath};
pub use enabler::{ENABLE_ENV_VAR, FORCE_DISABLE_ENV_VAR, FuserEnabler};
pub use error::FuserError;
pub use flags::FusionFlags;

use crate::config::FuserConfig;
use crate::runtime::guard::GuardMetrics;

/// Everything a guard evaluation or a specialized-path dispatch consults.
///
/// Hosts own one and pass it by reference to whatever invokes guards;
/// [`FuserRuntime::global`] is available for hosts that want a single
/// process-wide instance.
pub struct FuserRuntime {
    enabler: FuserEnabler,
    guard_mode: AtomicBool,
    flags: FusionFlags,
    backend: RwLock<Option<Arc<dyn FusionBackend>>>,
    metrics: GuardMetrics,
}

impl FuserRuntime {
    /// Runtime configured from the process environment.
    pub fn new(capability: Arc<dyn Capability>) -> Self {
        Self::with_config(FuserEnabler::new(capability), FuserConfig::from_env())
    }

    pub fn with_config(enabler: FuserEnabler, config: FuserConfig) -> Self {
        Self {
            enabler,
            guard_mode: AtomicBool::new(config.guard_mode),
            flags: FusionFlags::new(config.singleton_fusion, config.horizontal_fusion),
            backend: RwLock::new(None),
            metrics: GuardMetrics::new(),
        }
    }

    /// Process-wide runtime backed by [`HostCapabilities::global`].
    pub fn global() -> &'static FuserRuntime {
        static GLOBAL: Lazy<FuserRuntime> = Lazy::new(|| {
            let capability: Arc<dyn Capability> = HostCapabilities::global().clone();
            FuserRuntime::new(capability)
        });
        &GLOBAL
    }

    pub fn enabler(&self) -> &FuserEnabler {
        &self.enabler
    }

    pub fn is_enabled(&self) -> Result<bool, FuserError> {
        self.enabler.is_enabled()
    }

    /// Returns the previous effective value.
    pub fn set_enabled(&self, enabled: bool) -> Result<bool, FuserError> {
        self.enabler.set_enabled(enabled)
    }

    /// Whether guards actually check their inputs.
    pub fn guard_mode(&self) -> bool {
        self.guard_mode.load(Ordering::SeqCst)
    }

    /// Returns the previous guard mode.
    pub fn set_guard_mode(&self, enabled: bool) -> bool {
        let previous = self.guard_mode.swap(enabled, Ordering::SeqCst);
        debug!(enabled, previous, "guard mode changed");
        previous
    }

    pub fn flags(&self) -> &FusionFlags {
        &self.flags
    }

    pub fn metrics(&self) -> &GuardMetrics {
        &self.metrics
    }

    /// Installs the host backend, returning the one it replaces.
    pub fn install_backend(
        &self,
        backend: Arc<dyn FusionBackend>,
    ) -> Option<Arc<dyn FusionBackend>> {
        self.backend.write().replace(backend)
    }

    pub fn remove_backend(&self) -> Option<Arc<dyn FusionBackend>> {
        self.backend.write().take()
    }

    pub fn has_backend(&self) -> bool {
        self.backend.read().is_some()
    }

    pub fn compile_fusion_group(&self, group: &FusionGroup) -> Result<(), FuserError> {
        let backend = self.require_backend("compiling a fusion group")?;
        backend
            .compile(group)
            .map_err(|source| FuserError::Backend {
                operation: "compile a fusion group",
                source,
            })
    }

    pub fn run_fusion_group(
        &self,
        group: &FusionGroup,
        stack: &mut Stack,
    ) -> Result<(), FuserError> {
        let backend = self.require_backend("running a fusion group")?;
        backend
            .run(group, stack)
            .map_err(|source| FuserError::Backend {
                operation: "run a fusion group",
                source,
            })
    }

    pub fn can_fuse_node(&self, node: &FusionNode) -> bool {
        self.backend
            .read()
            .as_ref()
            .is_some_and(|backend| backend.can_fuse(node))
    }

    pub fn profile_node(&self, node: &FusionNode) -> bool {
        self.backend
            .read()
            .as_ref()
            .is_some_and(|backend| backend.profile(node))
    }

    pub fn skip_node(&self, symbol: &str, flip: bool) -> bool {
        self.backend
            .read()
            .as_ref()
            .is_some_and(|backend| backend.skip(symbol, flip))
    }

    fn require_backend(
        &self,
        operation: &'static str,
    ) -> Result<Arc<dyn FusionBackend>, FuserError> {
        self.backend
            .read()
            .clone()
            .ok_or(FuserError::BackendUnavailable { operation })
    }
}

impl std::fmt::Debug for FuserRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuserRuntime")
            .field("enabler", &self.enabler)
            .field("guard_mode", &self.guard_mode())
            .field("flags", &self.flags)
            .field("has_backend", &self.has_backend())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct EchoBackend;

    impl FusionBackend for EchoBackend {
        fn compile(&self, group: &FusionGroup) -> anyhow::Result<()> {
            anyhow::ensure!(group.id != 0, "group 0 is reserved");
            Ok(())
        }

        fn run(&self, _group: &FusionGroup, _stack: &mut Stack) -> anyhow::Result<()> {
            Ok(())
        }

        fn can_fuse(&self, node: &FusionNode) -> bool {
            node.symbol.starts_with("aten::")
        }
    }

    fn runtime() -> FuserRuntime {
        let enabler = FuserEnabler::with_env(
            Arc::new(HostCapabilities::available()),
            Arc::new(HashMap::<String, String>::new()),
        );
        FuserRuntime::with_config(enabler, FuserConfig::default())
    }

    #[test]
    fn hooks_without_backend() {
        let runtime = runtime();
        let group = FusionGroup::new(1, "fused");
        assert!(matches!(
            runtime.compile_fusion_group(&group),
            Err(FuserError::BackendUnavailable { .. })
        ));
        assert!(matches!(
            runtime.run_fusion_group(&group, &mut Vec::new()),
            Err(FuserError::BackendUnavailable { .. })
        ));
        assert!(!runtime.can_fuse_node(&FusionNode::new("aten::add")));
        assert!(!runtime.profile_node(&FusionNode::new("aten::add")));
        assert!(!runtime.skip_node("aten::add", false));
    }

    #[test]
    fn hooks_delegate_to_backend() {
        let runtime = runtime();
        assert!(runtime.install_backend(Arc::new(EchoBackend)).is_none());
        let group = FusionGroup::new(1, "fused");
        assert!(runtime.compile_fusion_group(&group).is_ok());
        assert!(matches!(
            runtime.compile_fusion_group(&FusionGroup::new(0, "reserved")),
            Err(FuserError::Backend { .. })
        ));
        assert!(runtime.can_fuse_node(&FusionNode::new("aten::relu")));
        assert!(!runtime.can_fuse_node(&FusionNode::new("prim::If")));
        assert!(runtime.remove_backend().is_some());
        assert!(!runtime.has_backend());
    }

    #[test]
    fn guard_mode_setter_returns_previous() {
        let runtime = runtime();
        assert!(runtime.guard_mode());
        assert!(runtime.set_guard_mode(false));
        assert!(!runtime.set_guard_mode(true));
    }
}
