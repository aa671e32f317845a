use std::sync::atomic::{AtomicBool, Ordering};

/// Fusion strategy switches consulted by the graph partitioner.
#[derive(Debug)]
pub struct FusionFlags {
    singleton_fusion: AtomicBool,
    horizontal_fusion: AtomicBool,
}

impl FusionFlags {
    pub fn new(singleton_fusion: bool, horizontal_fusion: bool) -> Self {
        Self {
            singleton_fusion: AtomicBool::new(singleton_fusion),
            horizontal_fusion: AtomicBool::new(horizontal_fusion),
        }
    }

    /// Whether a lone fusible node forms its own group.
    pub fn singleton_fusion(&self) -> bool {
        self.singleton_fusion.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_singleton_fusion(&self, value: bool) -> bool {
        self.singleton_fusion.swap(value, Ordering::SeqCst)
    }

    /// Whether independent nodes sharing inputs may be fused side by side.
    pub fn horizontal_fusion(&self) -> bool {
        self.horizontal_fusion.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_horizontal_fusion(&self, value: bool) -> bool {
        self.horizontal_fusion.swap(value, Ordering::SeqCst)
    }
}

impl Default for FusionFlags {
    fn default() -> Self {
        Self::new(false, true)
    }
}
