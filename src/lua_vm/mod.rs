// Lua Virtual Machine
// Executes compiled bytecode with register-based, per-activation frames

pub mod activation;
pub mod coroutine;
pub mod debug;
pub mod execute;
mod lua_error;
pub mod opcode;
mod register_file;

use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::{Chunk, LuaClosure, LuaTable, LuaTableRef, MultiValue};
use crate::LuaValue;

pub use activation::{Activation, ActivationRef};
pub use coroutine::{Coroutine, CoroutineStatus};
pub use debug::{DebugController, DebugStatus};
pub use execute::TmKind;
pub use lua_error::{LuaError, LuaErrorKind, TraceFrame};
pub use opcode::{rk_const, Instruction, OpCode, RK_CONSTANT_BIAS};
pub use register_file::RegisterFile;

pub type LuaResult<T> = Result<T, LuaError>;

/// Native function type - Rust function callable from Lua.
pub type NativeFn = fn(&mut Vm, &[LuaValue]) -> LuaResult<MultiValue>;

/// Maximum Rust recursion depth for nested calls.
pub const MAX_CALL_DEPTH: usize = 200;

/// Tunable execution limits.
#[derive(Debug, Clone)]
pub struct VmOptions {
    /// Call-nesting guard; exceeding it raises "stack overflow".
    pub max_call_depth: usize,
}

impl Default for VmOptions {
    fn default() -> Self {
        VmOptions {
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

/// Execution context shared by every activation: the global environment,
/// the coroutine/debug controllers, and the string library consulted when
/// a string value is indexed.
pub struct Vm {
    pub(crate) globals: LuaTableRef,
    pub(crate) string_lib: LuaTableRef,
    pub(crate) current_coroutine: Option<Rc<RefCell<Coroutine>>>,
    pub(crate) debug: DebugController,
    pub(crate) options: VmOptions,
    call_depth: usize,
}

impl Vm {
    pub fn new(options: VmOptions) -> Self {
        Vm {
            globals: Rc::new(RefCell::new(LuaTable::new())),
            string_lib: Rc::new(RefCell::new(LuaTable::new())),
            current_coroutine: None,
            debug: DebugController::new(),
            options,
            call_depth: 0,
        }
    }

    /// Install the standard library surface (basic, string, coroutine).
    pub fn open_libs(&mut self) {
        crate::stdlib::open_all(self);
    }

    /// Run a top-level chunk with no upvalues and no arguments.
    pub fn execute(&mut self, chunk: Rc<Chunk>) -> LuaResult<Vec<LuaValue>> {
        let func = LuaValue::Function(Rc::new(LuaClosure::new(chunk, Vec::new())));
        self.call(func, Vec::new())
    }

    /// Invoke any callable value.
    pub fn call(&mut self, func: LuaValue, args: Vec<LuaValue>) -> LuaResult<Vec<LuaValue>> {
        execute::call::call_value(self, &func, args).map(MultiValue::all_values)
    }

    pub fn get_global(&self, name: &str) -> Option<LuaValue> {
        self.globals.borrow().get_str(name)
    }

    pub fn set_global(&mut self, name: &str, value: LuaValue) {
        self.globals.borrow_mut().raw_set(LuaValue::str(name), value);
    }

    pub fn globals(&self) -> LuaTableRef {
        self.globals.clone()
    }

    pub(crate) fn enter_call(&mut self) -> LuaResult<()> {
        if self.call_depth >= self.options.max_call_depth {
            return Err(LuaError::runtime("stack overflow"));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// True while a yield or debugger pause is propagating up the chain.
    pub(crate) fn suspension_pending(&self) -> bool {
        self.coroutine_suspending() || self.debug.is_suspending()
    }

    fn coroutine_suspending(&self) -> bool {
        self.current_coroutine
            .as_ref()
            .map_or(false, |co| co.borrow().status == CoroutineStatus::Suspending)
    }

    // ===== Debugger surface =====

    /// Request a pause: the running activation chain parks itself on the
    /// debug resume stack at the next call boundary and unwinds.
    pub fn debug_break(&mut self) {
        self.debug.status = DebugStatus::Suspending;
    }

    pub fn debug_suspended(&self) -> bool {
        self.debug.is_suspending() && self.debug.suspended_depth() > 0
    }

    /// Restore the parked activations LIFO and continue execution; returns
    /// the values of the last activation to complete.
    pub fn debug_resume(&mut self) -> LuaResult<Vec<LuaValue>> {
        self.debug.status = DebugStatus::Resuming;
        let mut last = MultiValue::empty();
        while let Some(act) = self.debug.resume_stack.pop() {
            last = execute::resume(act, self, false)?;
            if self.debug.is_suspending() {
                return Ok(last.all_values());
            }
        }
        self.debug.status = DebugStatus::Running;
        Ok(last.all_values())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new(VmOptions::default())
    }
}
