use serde::{Deserialize, Serialize};

use crate::runtime::guard::GuardValue;

/// Operand stack shared with the execution backend.
pub type Stack = Vec<GuardValue>;

/// Handle to a compiled fusion group owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FusionGroup {
    pub id: u64,
    pub name: String,
}

impl FusionGroup {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A graph node offered to the backend, identified by its operator symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FusionNode {
    pub symbol: String,
}

impl FusionNode {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

/// Kernel compilation and execution, provided by the host.
pub trait FusionBackend: Send + Sync {
    fn compile(&self, group: &FusionGroup) -> anyhow::Result<()>;

    /// Pops the group's inputs from `stack` and pushes its outputs.
    fn run(&self, group: &FusionGroup, stack: &mut Stack) -> anyhow::Result<()>;

    fn can_fuse(&self, _node: &FusionNode) -> bool {
        false
    }

    /// Whether the node needs profiling instrumentation.
    fn profile(&self, _node: &FusionNode) -> bool {
        false
    }

    /// Whether fusion should skip nodes with this symbol. `flip` toggles the
    /// symbol's membership in the skip set.
    fn skip(&self, _symbol: &str, _flip: bool) -> bool {
        false
    }
}
