// Concatenation: right fold from R(C) down to R(B)

use crate::lua_value::number_to_string;
use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::metamethod::{self, TmKind};
use crate::lua_vm::execute::Flow;
use crate::lua_vm::{Instruction, LuaError, LuaErrorKind, LuaResult, Vm};
use crate::LuaValue;

fn concat_text(value: &LuaValue) -> Option<String> {
    match value {
        LuaValue::String(s) => Some(s.as_str().to_string()),
        LuaValue::Number(n) => Some(number_to_string(*n)),
        _ => None,
    }
}

pub(crate) fn exec_concat(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;
    let c = Instruction::get_c(instr) as usize;

    let mut acc = act.borrow().reg_get(c);
    for i in (b..c).rev() {
        let left = act.borrow().reg_get(i);
        if let Some(handler) = metamethod::get_metamethod(&left, TmKind::Concat) {
            acc = metamethod::call_metamethod(vm, &handler, vec![left, acc])?;
            continue;
        }

        let lhs = concat_text(&left)
            .ok_or_else(|| LuaError::from_kind(LuaErrorKind::ConcatOnNonStringNumber))?;
        let rhs = concat_text(&acc)
            .ok_or_else(|| LuaError::from_kind(LuaErrorKind::ConcatOnNonStringNumber))?;
        acc = LuaValue::string_owned(format!("{}{}", lhs, rhs));
    }

    act.borrow().reg_set(a, acc);
    Ok(Flow::Continue)
}
