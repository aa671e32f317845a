use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;

/// Whether accelerated specialization is possible at all. Evaluated afresh
/// on every query since the host's state may change.
pub trait Capability: Send + Sync {
    /// An accelerator is present and usable.
    fn accelerator_available(&self) -> bool;
    /// A compiled-path manager has registered its passes.
    fn pass_manager_registered(&self) -> bool;
    /// The host runs the profiling executor.
    fn executor_mode(&self) -> bool;

    fn can_be_enabled(&self) -> bool {
        self.accelerator_available() && self.pass_manager_registered() && self.executor_mode()
    }
}

/// Capability state the host updates as it changes.
#[derive(Debug, Default)]
pub struct HostCapabilities {
    accelerator: AtomicBool,
    pass_manager: AtomicBool,
    executor_mode: AtomicBool,
}

impl HostCapabilities {
    pub fn new(accelerator: bool, pass_manager: bool, executor_mode: bool) -> Self {
        Self {
            accelerator: AtomicBool::new(accelerator),
            pass_manager: AtomicBool::new(pass_manager),
            executor_mode: AtomicBool::new(executor_mode),
        }
    }

    /// Every capability present.
    pub fn available() -> Self {
        Self::new(true, true, true)
    }

    /// No capability present.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Capabilities backing [`FuserRuntime::global`](super::FuserRuntime::global).
    pub fn global() -> &'static Arc<HostCapabilities> {
        static GLOBAL: Lazy<Arc<HostCapabilities>> =
            Lazy::new(|| Arc::new(HostCapabilities::default()));
        &GLOBAL
    }

    pub fn set_accelerator_available(&self, value: bool) {
        self.accelerator.store(value, Ordering::SeqCst);
    }

    pub fn set_pass_manager_registered(&self, value: bool) {
        self.pass_manager.store(value, Ordering::SeqCst);
    }

    /// Returns the previous executor mode.
    pub fn set_executor_mode(&self, value: bool) -> bool {
        self.executor_mode.swap(value, Ordering::SeqCst)
    }
}

impl Capability for HostCapabilities {
    fn accelerator_available(&self) -> bool {
        self.accelerator.load(Ordering::SeqCst)
    }

    fn pass_manager_registered(&self) -> bool {
        self.pass_manager.load(Ordering::SeqCst)
    }

    fn executor_mode(&self) -> bool {
        self.executor_mode.load(Ordering::SeqCst)
    }
}
