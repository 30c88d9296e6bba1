// Arithmetic over RK operands with the left-operand metamethod path

use crate::lua_vm::activation::ActivationRef;
use crate::lua_vm::execute::metamethod::{self, TmKind};
use crate::lua_vm::execute::Flow;
use crate::lua_vm::{Instruction, LuaError, LuaErrorKind, LuaResult, Vm};
use crate::LuaValue;

#[derive(Debug, Clone, Copy)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl ArithOp {
    fn event(self) -> TmKind {
        match self {
            ArithOp::Add => TmKind::Add,
            ArithOp::Sub => TmKind::Sub,
            ArithOp::Mul => TmKind::Mul,
            ArithOp::Div => TmKind::Div,
            ArithOp::Mod => TmKind::Mod,
            ArithOp::Pow => TmKind::Pow,
        }
    }

    fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            ArithOp::Add => x + y,
            ArithOp::Sub => x - y,
            ArithOp::Mul => x * y,
            ArithOp::Div => x / y,
            // Remainder keeps the dividend's sign
            ArithOp::Mod => x % y,
            ArithOp::Pow => x.powf(y),
        }
    }
}

pub(crate) fn exec_arith(
    act: &ActivationRef,
    vm: &mut Vm,
    instr: u32,
    op: ArithOp,
) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr);
    let c = Instruction::get_c(instr);

    let (lhs, rhs) = {
        let frame = act.borrow();
        (frame.rk(b), frame.rk(c))
    };

    // Only the left operand's metatable is consulted
    if let Some(handler) = metamethod::get_metamethod(&lhs, op.event()) {
        let result = metamethod::call_metamethod(vm, &handler, vec![lhs, rhs])?;
        act.borrow().reg_set(a, result);
        return Ok(Flow::Continue);
    }

    if !lhs.is_numeric() || !rhs.is_numeric() {
        return Err(LuaError::from_kind(LuaErrorKind::ArithOnNonNumeric));
    }

    let x = lhs.to_number().unwrap_or(f64::NAN);
    let y = rhs.to_number().unwrap_or(f64::NAN);
    act.borrow().reg_set(a, LuaValue::number(op.apply(x, y)));
    Ok(Flow::Continue)
}

pub(crate) fn exec_unm(act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr);

    let operand = act.borrow().rk(b);

    if let Some(handler) = metamethod::get_metamethod(&operand, TmKind::Unm) {
        let result =
            metamethod::call_metamethod(vm, &handler, vec![operand.clone(), operand])?;
        act.borrow().reg_set(a, result);
        return Ok(Flow::Continue);
    }

    if !operand.is_numeric() {
        return Err(LuaError::from_kind(LuaErrorKind::ArithOnNonNumeric));
    }

    let x = operand.to_number().unwrap_or(f64::NAN);
    act.borrow().reg_set(a, LuaValue::number(-x));
    Ok(Flow::Continue)
}

pub(crate) fn exec_not(act: &ActivationRef, instr: u32) -> LuaResult<Flow> {
    let a = Instruction::get_a(instr) as usize;
    let b = Instruction::get_b(instr) as usize;

    let frame = act.borrow();
    let value = !frame.reg_get(b).truthy();
    frame.reg_set(a, LuaValue::boolean(value));
    Ok(Flow::Continue)
}
