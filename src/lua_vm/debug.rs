// Debug controller: out-of-band suspension for breakpoints

use crate::lua_vm::activation::ActivationRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugStatus {
    Running,
    /// A pause request is propagating up the activation chain.
    Suspending,
    /// Paused activations are being restored.
    Resuming,
}

/// Process-wide debugger state, owned by the `Vm`. When a native requests a
/// pause, every activation up the chain parks itself here and unwinds; the
/// host later restores them LIFO.
pub struct DebugController {
    pub status: DebugStatus,
    pub(crate) resume_stack: Vec<ActivationRef>,
}

impl DebugController {
    pub fn new() -> Self {
        DebugController {
            status: DebugStatus::Running,
            resume_stack: Vec::new(),
        }
    }

    pub fn is_suspending(&self) -> bool {
        self.status == DebugStatus::Suspending
    }

    pub fn suspended_depth(&self) -> usize {
        self.resume_stack.len()
    }
}

impl Default for DebugController {
    fn default() -> Self {
        Self::new()
    }
}
