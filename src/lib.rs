// Lua 5.1 interpreter core
// A compact register-based bytecode engine: activations, upvalue cells,
// metamethod dispatch, and cooperatively suspendable coroutines.

#[cfg(test)]
mod test;

pub mod lua_value;
pub mod lua_vm;
pub mod stdlib;

pub use lua_value::{
    Chunk, LuaClosure, LuaString, LuaTable, LuaTableRef, LuaUpvalue, LuaValue, LuaValueKind,
    MultiValue, COMPAT_VARARG,
};
pub use lua_vm::{
    Coroutine, CoroutineStatus, Instruction, LuaError, LuaErrorKind, LuaResult, NativeFn, OpCode,
    TraceFrame, Vm, VmOptions,
};

use std::rc::Rc;

/// Execute a chunk in a fresh VM with the standard libraries installed.
pub fn execute(chunk: Chunk) -> LuaResult<Vec<LuaValue>> {
    let mut vm = Vm::new(VmOptions::default());
    vm.open_libs();
    vm.execute(Rc::new(chunk))
}
