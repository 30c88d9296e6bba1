// Table creation, indexing, assignment, SELF, SETLIST and length

use crate::lua_value::new_table;
use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::Flow;
use crate::lua_vm::{Instruction, LuaError, LuaErrorKind, LuaResult, Vm};
use crate::LuaValue;

/// Batch size for SETLIST index blocks.
const FIELDS_PER_FLUSH: usize = 50;

/// Indexing semantics shared by GETTABLE and SELF: tables answer from their
/// members, strings answer from the string library, nil fails, and any
/// other value has no indexable properties.
fn index_value(vm: &Vm, target: &LuaValue, key: &LuaValue) -> LuaResult<LuaValue> {
    match target {
        LuaValue::Nil => Err(LuaError::from_kind(LuaErrorKind::IndexNil)),
        LuaValue::Table(t) => Ok(t.borrow().raw_get(key).unwrap_or(LuaValue::Nil)),
        LuaValue::String(_) => Ok(vm.string_lib.borrow().raw_get(key).unwrap_or(LuaValue::Nil)),
        _ => Ok(LuaValue::Nil),
    }
}

pub(crate) fn exec_newtable(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    act.borrow().reg_set(a, new_table());
    Ok(Flow::Continue)
}

pub(crate) fn exec_gettable(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;
    let c = Instruction::get_c(instr);

    let frame = act.borrow();
    let target = frame.reg_get(b);
    let key = frame.rk(c);
    let value = index_value(vm, &target, &key)?;
    frame.reg_set(a, value);
    Ok(Flow::Continue)
}

pub(crate) fn exec_settable(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr);
    let c = Instruction::get_c(instr);

    let frame = act.borrow();
    let target = frame.reg_get(a);
    let key = frame.rk(b);
    let value = frame.rk(c);
    match target {
        LuaValue::Table(t) => {
            t.borrow_mut().raw_set(key, value);
            Ok(Flow::Continue)
        }
        LuaValue::Nil => Err(LuaError::new(
            LuaErrorKind::IndexNil,
            "attempt to index missing field",
        )),
        // Property writes on other raw values have nowhere to land
        _ => Ok(Flow::Continue),
    }
}

pub(crate) fn exec_self(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;
    let c = Instruction::get_c(instr);

    let frame = act.borrow();
    let receiver = frame.reg_get(b);
    frame.reg_set(a + 1, receiver.clone());
    let key = frame.rk(c);
    let method = index_value(vm, &receiver, &key)?;
    frame.reg_set(a, method);
    Ok(Flow::Continue)
}

pub(crate) fn exec_setlist(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;
    let c = Instruction::get_c(instr) as usize;

    let frame = act.borrow();
    let count = if b == 0 {
        frame.reg_len().saturating_sub(a + 1)
    } else {
        b
    };
    let base = FIELDS_PER_FLUSH * c.saturating_sub(1);

    let LuaValue::Table(table) = frame.reg_get(a) else {
        return Err(LuaError::runtime("SETLIST target is not a table"));
    };
    let mut table = table.borrow_mut();
    for i in 1..=count {
        table.set_int((base + i) as i64, frame.reg_get(a + i));
    }
    Ok(Flow::Continue)
}

pub(crate) fn exec_len(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let frame = act.borrow();
    let length = match frame.reg_get(b) {
        LuaValue::String(s) => s.as_str().chars().count(),
        LuaValue::Table(t) => t.borrow().length(),
        LuaValue::Nil => return Err(LuaError::from_kind(LuaErrorKind::LengthOfNil)),
        // Other values expose no countable members
        _ => 0,
    };
    frame.reg_set(a, LuaValue::number(length as f64));
    Ok(Flow::Continue)
}
