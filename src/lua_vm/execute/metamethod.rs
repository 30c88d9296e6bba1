// Metamethod lookup and invocation

use crate::lua_vm::execute::call;
use crate::lua_vm::{LuaResult, Vm};
use crate::LuaValue;

/// Metamethod (tag method) kinds the interpreter dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Unm,
    Concat,
    Eq,
    Le,
}

impl TmKind {
    pub fn event_name(self) -> &'static str {
        match self {
            TmKind::Add => "__add",
            TmKind::Sub => "__sub",
            TmKind::Mul => "__mul",
            TmKind::Div => "__div",
            TmKind::Mod => "__mod",
            TmKind::Pow => "__pow",
            TmKind::Unm => "__unm",
            TmKind::Concat => "__concat",
            TmKind::Eq => "__eq",
            TmKind::Le => "__le",
        }
    }
}

/// Look up `kind`'s handler on the value's metatable. Only tables carry
/// metatables in this core.
pub(crate) fn get_metamethod(value: &LuaValue, kind: TmKind) -> Option<LuaValue> {
    let table = value.as_table()?;
    let mt = table.borrow().get_metatable()?;
    let mt_table = mt.as_table()?;
    let handler = mt_table.borrow().get_str(kind.event_name())?;
    if handler.is_nil() {
        None
    } else {
        Some(handler)
    }
}

/// Invoke a metamethod and take its first return value.
pub(crate) fn call_metamethod(
    vm: &mut Vm,
    handler: &LuaValue,
    args: Vec<LuaValue>,
) -> LuaResult<LuaValue> {
    Ok(call::call_value(vm, handler, args)?.first())
}
