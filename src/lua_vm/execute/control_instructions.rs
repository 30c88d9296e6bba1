// Jumps, calls, returns and varargs

use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::{call, jump, Flow};
use crate::lua_vm::{Instruction, LuaResult, Vm};
use crate::LuaValue;

pub(crate) fn exec_jmp(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let sbx = Instruction::get_sbx(instr);
    jump(&mut act.borrow_mut(), sbx)?;
    Ok(Flow::Continue)
}

pub(crate) fn exec_call(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;
    let c = Instruction::get_c(instr) as usize;
    do_call(act, vm, a, b, c)
}

/// Tail calls execute as ordinary calls splicing every return (C = 0);
/// there is no frame reuse in this core.
pub(crate) fn exec_tailcall(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;
    do_call(act, vm, a, b, 0)
}

fn do_call(
    act: &ActivationRef,
    vm: &mut Vm,
    a: usize,
    b: usize,
    c: usize,
) -> LuaResult<Flow> {
    let (func, args) = {
        let frame = act.borrow();
        let func = frame.reg_get(a);
        let args: Vec<LuaValue> = if b > 0 {
            (1..b).map(|i| frame.reg_get(a + i)).collect()
        } else {
            (a + 1..frame.reg_len()).map(|i| frame.reg_get(i)).collect()
        };
        (func, args)
    };

    let results = call::call_value(vm, &func, args)?;

    // A suspension inside the callee leaves the results unspliced; the
    // resume path rewinds the pc so this CALL runs again with the yielded
    // values flowing back through the re-entered callee.
    if vm.suspension_pending() {
        return Ok(Flow::Continue);
    }

    let results = results.all_values();
    let frame = act.borrow();
    if c == 0 {
        for (i, value) in results.iter().enumerate() {
            frame.reg_set(a + i, value.clone());
        }
        frame.registers.borrow_mut().truncate(a + results.len());
    } else {
        for i in 0..(c - 1) {
            frame.reg_set(a + i, results.get(i).cloned().unwrap_or(LuaValue::Nil));
        }
    }
    Ok(Flow::Continue)
}

pub(crate) fn exec_return(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let values: Vec<LuaValue> = {
        let frame = act.borrow();
        let count = if b > 0 {
            b - 1
        } else {
            frame.reg_len().saturating_sub(a)
        };
        (0..count).map(|i| frame.reg_get(a + i)).collect()
    };

    // Captured locals outlive this activation through their closed cells
    act.borrow_mut().close_upvalues_from(0);
    Ok(Flow::Return(values))
}

pub(crate) fn exec_vararg(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let frame = act.borrow();
    let extras: Vec<LuaValue> = frame
        .varargs
        .get(frame.chunk.param_count..)
        .unwrap_or(&[])
        .to_vec();

    let limit = if b > 0 { b - 1 } else { extras.len() };
    for i in 0..limit {
        frame.reg_set(a + i, extras.get(i).cloned().unwrap_or(LuaValue::Nil));
    }

    // Stale slots above the copied range are deleted, not nil-stored
    let len = frame.reg_len();
    let mut regs = frame.registers.borrow_mut();
    for i in a + limit..len {
        regs.delete(i);
    }
    Ok(Flow::Continue)
}
