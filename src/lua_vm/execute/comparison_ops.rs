// Comparisons and conditional skips
//
// Two behaviours are carried over verbatim from the source runtime: LT
// consults the `__le` metamethod, and LE only does so for two distinct
// tables. Fixing either would change observable bytecode behaviour.

use std::rc::Rc;

use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::metamethod::{self, TmKind};
use crate::lua_vm::execute::Flow;
use crate::lua_vm::{Instruction, LuaResult, Vm};
use crate::LuaValue;

/// Plain `<` when no metamethod applies: strings lexicographically, numeric
/// operands numerically, anything else is simply not less.
fn raw_less_than(lhs: &LuaValue, rhs: &LuaValue) -> bool {
    if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
        return a < b;
    }
    if lhs.is_numeric() && rhs.is_numeric() {
        let a = lhs.to_number().unwrap_or(f64::NAN);
        let b = rhs.to_number().unwrap_or(f64::NAN);
        return a < b;
    }
    false
}

fn raw_less_equal(lhs: &LuaValue, rhs: &LuaValue) -> bool {
    if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
        return a <= b;
    }
    if lhs.is_numeric() && rhs.is_numeric() {
        let a = lhs.to_number().unwrap_or(f64::NAN);
        let b = rhs.to_number().unwrap_or(f64::NAN);
        return a <= b;
    }
    false
}

fn skip_if(act: &ActivationRef, condition: bool) {
    if condition {
        act.borrow_mut().pc += 1;
    }
}

pub(crate) fn exec_eq(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a_flag = Instruction::get_a(instr) != 0;
    let b = Instruction::get_b(instr);
    let c = Instruction::get_c(instr);

    let (lhs, rhs) = {
        let frame = act.borrow();
        (frame.rk(b), frame.rk(c))
    };

    let handler = match (lhs.as_table(), rhs.as_table()) {
        (Some(lt), Some(rt)) if !Rc::ptr_eq(lt, rt) => {
            metamethod::get_metamethod(&lhs, TmKind::Eq)
        }
        _ => None,
    };

    let result = match handler {
        Some(h) => metamethod::call_metamethod(vm, &h, vec![lhs.clone(), rhs.clone()])?.truthy(),
        None => lhs.raw_equals(&rhs),
    };

    skip_if(act, result != a_flag);
    Ok(Flow::Continue)
}

pub(crate) fn exec_lt(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a_flag = Instruction::get_a(instr) != 0;
    let b = Instruction::get_b(instr);
    let c = Instruction::get_c(instr);

    let (lhs, rhs) = {
        let frame = act.borrow();
        (frame.rk(b), frame.rk(c))
    };

    let result = match metamethod::get_metamethod(&lhs, TmKind::Le) {
        Some(h) => metamethod::call_metamethod(vm, &h, vec![lhs.clone(), rhs.clone()])?.truthy(),
        None => raw_less_than(&lhs, &rhs),
    };

    skip_if(act, result != a_flag);
    Ok(Flow::Continue)
}

pub(crate) fn exec_le(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a_flag = Instruction::get_a(instr) != 0;
    let b = Instruction::get_b(instr);
    let c = Instruction::get_c(instr);

    let (lhs, rhs) = {
        let frame = act.borrow();
        (frame.rk(b), frame.rk(c))
    };

    let handler = match (lhs.as_table(), rhs.as_table()) {
        (Some(lt), Some(rt)) if !Rc::ptr_eq(lt, rt) => {
            metamethod::get_metamethod(&lhs, TmKind::Le)
        }
        _ => None,
    };

    let result = match handler {
        Some(h) => metamethod::call_metamethod(vm, &h, vec![lhs.clone(), rhs.clone()])?.truthy(),
        None => raw_less_equal(&lhs, &rhs),
    };

    skip_if(act, result != a_flag);
    Ok(Flow::Continue)
}

pub(crate) fn exec_test(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let c_flag = Instruction::get_c(instr) != 0;

    let truth = act.borrow().reg_get(a).truthy();
    skip_if(act, truth != c_flag);
    Ok(Flow::Continue)
}

pub(crate) fn exec_testset(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;
    let c_flag = Instruction::get_c(instr) != 0;

    let value = act.borrow().reg_get(b);
    if value.truthy() == c_flag {
        act.borrow().reg_set(a, value);
    } else {
        act.borrow_mut().pc += 1;
    }
    Ok(Flow::Continue)
}
