// Numeric and generic for loops

use crate::lua_value::exact_number_from_str;
use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::{call, jump, Flow};
use crate::lua_vm::{Instruction, LuaResult, Vm};
use crate::LuaValue;

// Loop arithmetic mirrors the host's: a non-numeric control value becomes
// NaN and every limit comparison on it is false, so the loop just exits.
fn to_number_or_nan(value: &LuaValue) -> f64 {
    value.to_number().unwrap_or(f64::NAN)
}

pub(crate) fn exec_forprep(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let sbx = Instruction::get_sbx(instr);

    let mut frame = act.borrow_mut();
    let init = to_number_or_nan(&frame.reg_get(a));
    let step = to_number_or_nan(&frame.reg_get(a + 2));
    frame.reg_set(a, LuaValue::number(init - step));
    jump(&mut frame, sbx)?;
    Ok(Flow::Continue)
}

pub(crate) fn exec_forloop(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let sbx = Instruction::get_sbx(instr);

    let mut frame = act.borrow_mut();
    let step = to_number_or_nan(&frame.reg_get(a + 2));
    let limit = to_number_or_nan(&frame.reg_get(a + 1));
    let next = to_number_or_nan(&frame.reg_get(a)) + step;
    frame.reg_set(a, LuaValue::number(next));

    let continuing = if step > 0.0 { next <= limit } else { next >= limit };
    if continuing {
        frame.reg_set(a + 3, LuaValue::number(next));
        jump(&mut frame, sbx)?;
    }
    Ok(Flow::Continue)
}

pub(crate) fn exec_tforloop(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let c = Instruction::get_c(instr) as usize;

    let (iterator, state, control) = {
        let frame = act.borrow();
        (frame.reg_get(a), frame.reg_get(a + 1), frame.reg_get(a + 2))
    };

    let mut results = call::call_value(vm, &iterator, vec![state, control])?.all_values();

    // Only the first iterator result is coerced, and only when its text is
    // exactly a number's canonical form.
    if let Some(first) = results.first_mut() {
        if let LuaValue::String(s) = first {
            if let Some(n) = exact_number_from_str(s.as_str()) {
                *first = LuaValue::number(n);
            }
        }
    }

    {
        let frame = act.borrow();
        for i in 0..c {
            frame.reg_set(a + 3 + i, results.get(i).cloned().unwrap_or(LuaValue::Nil));
        }
    }

    let first = act.borrow().reg_get(a + 3);
    if first.is_nil() {
        // Loop exit: skip the back-jump that follows
        act.borrow_mut().pc += 1;
    } else {
        act.borrow().reg_set(a + 2, first);
    }
    Ok(Flow::Continue)
}
