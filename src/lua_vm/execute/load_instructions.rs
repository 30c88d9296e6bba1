// Register loads and global access

use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::Flow;
use crate::lua_vm::{Instruction, LuaResult, Vm};
use crate::LuaValue;

pub(crate) fn exec_move(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let frame = act.borrow();
    frame.reg_set(a, frame.reg_get(b));
    Ok(Flow::Continue)
}

pub(crate) fn exec_loadk(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let bx = Instruction::get_bx(instr) as usize;

    let frame = act.borrow();
    // A nil-sentinel constant decodes to nil via the constant pool itself
    frame.reg_set(a, frame.constant(bx));
    Ok(Flow::Continue)
}

pub(crate) fn exec_loadbool(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr);
    let c = Instruction::get_c(instr);

    let mut frame = act.borrow_mut();
    frame.reg_set(a, LuaValue::boolean(b != 0));
    if c != 0 {
        frame.pc += 1;
    }
    Ok(Flow::Continue)
}

pub(crate) fn exec_loadnil(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let frame = act.borrow();
    for i in a..=b {
        frame.reg_set(i, LuaValue::Nil);
    }
    Ok(Flow::Continue)
}

pub(crate) fn exec_getglobal(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let bx = Instruction::get_bx(instr) as usize;

    let frame = act.borrow();
    let name = frame.constant(bx);
    // `_G` names the globals mapping itself
    let value = if name.as_str() == Some("_G") {
        LuaValue::Table(vm.globals.clone())
    } else {
        vm.globals.borrow().raw_get(&name).unwrap_or(LuaValue::Nil)
    };
    frame.reg_set(a, value);
    Ok(Flow::Continue)
}

pub(crate) fn exec_setglobal(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let bx = Instruction::get_bx(instr) as usize;

    let frame = act.borrow();
    let name = frame.constant(bx);
    vm.globals.borrow_mut().raw_set(name, frame.reg_get(a));
    Ok(Flow::Continue)
}
