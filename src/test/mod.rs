// Scenario tests over hand-assembled chunks

mod test_coroutine;
mod test_operators;

use std::rc::Rc;

use crate::lua_vm::{rk_const, Instruction};
pub(crate) use crate::{Chunk, LuaClosure, LuaResult, LuaValue, OpCode, Vm, VmOptions};

pub(crate) fn new_vm() -> Vm {
    let mut vm = Vm::new(VmOptions::default());
    vm.open_libs();
    vm
}

pub(crate) fn abc(op: OpCode, a: u32, b: u32, c: u32) -> u32 {
    Instruction::encode_abc(op, a, b, c)
}

pub(crate) fn abx(op: OpCode, a: u32, bx: u32) -> u32 {
    Instruction::encode_abx(op, a, bx)
}

pub(crate) fn asbx(op: OpCode, a: u32, sbx: i32) -> u32 {
    Instruction::encode_asbx(op, a, sbx)
}

/// RK operand naming constant `i`.
pub(crate) fn k(i: u32) -> u32 {
    rk_const(i)
}

pub(crate) fn num(n: f64) -> LuaValue {
    LuaValue::number(n)
}

/// A chunk named "test" whose instructions sit on lines 1, 2, 3, ...
pub(crate) fn chunk(code: Vec<u32>, constants: Vec<LuaValue>) -> Chunk {
    let line_info = (1..=code.len() as u32).collect();
    Chunk {
        line_info,
        code,
        constants,
        source_name: Some("test".to_string()),
        ..Chunk::new()
    }
}

pub(crate) fn closure_value(chunk: Chunk) -> LuaValue {
    LuaValue::Function(Rc::new(LuaClosure::new(Rc::new(chunk), Vec::new())))
}

pub(crate) fn run(chunk: Chunk) -> LuaResult<Vec<LuaValue>> {
    new_vm().execute(Rc::new(chunk))
}
