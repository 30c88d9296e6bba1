// Upvalue reads/writes, closing, and closure construction

use std::rc::Rc;

use crate::lua_value::{LuaClosure, LuaUpvalue};
use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::Flow;
use crate::lua_vm::{Instruction, LuaError, LuaResult, OpCode};
use crate::LuaValue;

fn upvalue_at(act: &ActivationRef, index: usize) -> LuaResult<Rc<LuaUpvalue>> {
    act.borrow()
        .upvalues
        .get(index)
        .cloned()
        .ok_or_else(|| LuaError::runtime(format!("invalid upvalue index {}", index)))
}

pub(crate) fn exec_getupval(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let cell = upvalue_at(act, b)?;
    let value = cell.get();
    act.borrow().reg_set(a, value);
    Ok(Flow::Continue)
}

pub(crate) fn exec_setupval(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let cell = upvalue_at(act, b)?;
    let value = act.borrow().reg_get(a);
    cell.set(value);
    Ok(Flow::Continue)
}

pub(crate) fn exec_close(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    act.borrow_mut().close_upvalues_from(a);
    Ok(Flow::Continue)
}

/// CLOSURE builds a function value from a child prototype and consumes one
/// capture pseudo-instruction per upvalue: MOVE captures a parent local
/// (reusing the open cell if that register is already captured), GETUPVAL
/// shares one of the parent's own upvalue cells.
pub(crate) fn exec_closure(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let bx = Instruction::get_bx(instr) as usize;

    let mut frame = act.borrow_mut();
    let proto = frame
        .chunk
        .child_protos
        .get(bx)
        .cloned()
        .ok_or_else(|| LuaError::runtime(format!("invalid prototype index {}", bx)))?;

    let count = proto.upvalue_count();
    let mut upvalues = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(&word) = frame.chunk.code.get(frame.pc) else {
            return Err(LuaError::runtime("truncated closure capture sequence"));
        };
        frame.pc += 1;

        let b = Instruction::get_b(word) as usize;
        match OpCode::from_u8(Instruction::opcode_byte(word)) {
            Some(OpCode::Move) => upvalues.push(frame.capture_local(b)),
            Some(OpCode::GetUpval) => upvalues.push(
                frame
                    .upvalues
                    .get(b)
                    .cloned()
                    .ok_or_else(|| LuaError::runtime(format!("invalid upvalue index {}", b)))?,
            ),
            _ => return Err(LuaError::runtime("malformed closure capture sequence")),
        }
    }

    let closure = LuaClosure::new(proto, upvalues);
    frame.reg_set(a, LuaValue::Function(Rc::new(closure)));
    Ok(Flow::Continue)
}
