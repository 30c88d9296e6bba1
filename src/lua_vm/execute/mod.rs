// Bytecode execution driver
// Fetch/decode/execute over one activation, with the suspension protocol
// layered between instructions:
//   1. a running coroutine turned "suspending" parks this activation and
//      unwinds (the entry activation hands back the yield vector),
//   2. a suspending debugger parks this activation when the instruction
//      produced no return vector,
//   3. a return vector terminates the activation.

pub(crate) mod arithmetic_instructions;
pub(crate) mod call;
pub(crate) mod comparison_ops;
pub(crate) mod concat;
pub(crate) mod control_instructions;
pub(crate) mod load_instructions;
pub(crate) mod loop_instructions;
pub(crate) mod metamethod;
pub(crate) mod table_instructions;
pub(crate) mod upvalue_instructions;

use std::rc::Rc;

use tracing::debug;

use crate::lua_value::MultiValue;
use crate::lua_vm::activation::{Activation, ActivationRef};
use crate::lua_vm::coroutine::CoroutineStatus;
use crate::lua_vm::{Instruction, LuaError, LuaResult, OpCode, Vm};
use crate::LuaValue;

pub use metamethod::TmKind;

/// What an instruction handler produced.
pub(crate) enum Flow {
    Continue,
    Return(Vec<LuaValue>),
}

/// Run an activation until it returns or suspends. A language error picks
/// up one synthetic stack frame naming this prototype and the faulting line.
pub(crate) fn run(act: &ActivationRef, vm: &mut Vm) -> LuaResult<MultiValue> {
    match step_loop(act, vm) {
        Ok(values) => Ok(values),
        Err(mut e) => {
            let a = act.borrow();
            e.push_frame(a.chunk.source(), a.chunk.line_at(a.pc.saturating_sub(1)));
            Err(e)
        }
    }
}

/// Re-enter a suspended activation. With a yield vector in flight the pc is
/// rewound one instruction so the paused CALL re-runs its splicing phase.
pub(crate) fn resume(act: ActivationRef, vm: &mut Vm, rewind: bool) -> LuaResult<MultiValue> {
    if rewind {
        let mut a = act.borrow_mut();
        a.pc = a.pc.saturating_sub(1);
    }
    run(&act, vm)
}

fn step_loop(act: &ActivationRef, vm: &mut Vm) -> LuaResult<MultiValue> {
    loop {
        let instr = {
            let mut a = act.borrow_mut();
            let Some(&word) = a.chunk.code.get(a.pc) else {
                return Err(LuaError::runtime("program counter out of range"));
            };
            a.pc += 1;
            word
        };

        let byte = Instruction::opcode_byte(instr);
        let op = OpCode::from_u8(byte).ok_or_else(|| LuaError::unknown_opcode(byte))?;
        let flow = dispatch(op, act, vm, instr)?;

        // 1. Yield propagation: park this activation; only the coroutine's
        //    entry activation carries the yield vector outward.
        if let Some(co_rc) = vm.current_coroutine.clone() {
            if co_rc.borrow().status == CoroutineStatus::Suspending {
                let is_entry = {
                    let co = co_rc.borrow();
                    co.entry.as_ref().map_or(false, |entry| Rc::ptr_eq(entry, act))
                };
                co_rc.borrow_mut().resume_stack.push(act.clone());
                if is_entry {
                    let mut co = co_rc.borrow_mut();
                    co.status = CoroutineStatus::Suspended;
                    debug!("yield reached coroutine entry");
                    return Ok(MultiValue::multiple(co.yield_vals.clone()));
                }
                return Ok(MultiValue::empty());
            }
        }

        // 2. Debugger pause, unless the instruction just returned.
        if vm.debug.is_suspending() && !matches!(flow, Flow::Return(_)) {
            debug!("debugger pause; parking activation");
            vm.debug.resume_stack.push(act.clone());
            return Ok(MultiValue::empty());
        }

        // 3. Normal completion.
        if let Flow::Return(values) = flow {
            act.borrow_mut().terminated = true;
            return Ok(MultiValue::multiple(values));
        }
    }
}

fn dispatch(op: OpCode, act: &ActivationRef, vm: &mut Vm, instr: u32) -> LuaResult<Flow> {
    match op {
        OpCode::Move => load_instructions::exec_move(act, instr),
        OpCode::LoadK => load_instructions::exec_loadk(act, instr),
        OpCode::LoadBool => load_instructions::exec_loadbool(act, instr),
        OpCode::LoadNil => load_instructions::exec_loadnil(act, instr),
        OpCode::GetUpval => upvalue_instructions::exec_getupval(act, instr),
        OpCode::GetGlobal => load_instructions::exec_getglobal(act, vm, instr),
        OpCode::GetTable => table_instructions::exec_gettable(act, vm, instr),
        OpCode::SetGlobal => load_instructions::exec_setglobal(act, vm, instr),
        OpCode::SetUpval => upvalue_instructions::exec_setupval(act, instr),
        OpCode::SetTable => table_instructions::exec_settable(act, instr),
        OpCode::NewTable => table_instructions::exec_newtable(act, instr),
        OpCode::Self_ => table_instructions::exec_self(act, vm, instr),
        OpCode::Add => arithmetic_instructions::exec_arith(act, vm, instr, ArithOp::Add),
        OpCode::Sub => arithmetic_instructions::exec_arith(act, vm, instr, ArithOp::Sub),
        OpCode::Mul => arithmetic_instructions::exec_arith(act, vm, instr, ArithOp::Mul),
        OpCode::Div => arithmetic_instructions::exec_arith(act, vm, instr, ArithOp::Div),
        OpCode::Mod => arithmetic_instructions::exec_arith(act, vm, instr, ArithOp::Mod),
        OpCode::Pow => arithmetic_instructions::exec_arith(act, vm, instr, ArithOp::Pow),
        OpCode::Unm => arithmetic_instructions::exec_unm(act, vm, instr),
        OpCode::Not => arithmetic_instructions::exec_not(act, instr),
        OpCode::Len => table_instructions::exec_len(act, instr),
        OpCode::Concat => concat::exec_concat(act, vm, instr),
        OpCode::Jmp => control_instructions::exec_jmp(act, instr),
        OpCode::Eq => comparison_ops::exec_eq(act, vm, instr),
        OpCode::Lt => comparison_ops::exec_lt(act, vm, instr),
        OpCode::Le => comparison_ops::exec_le(act, vm, instr),
        OpCode::Test => comparison_ops::exec_test(act, instr),
        OpCode::TestSet => comparison_ops::exec_testset(act, instr),
        OpCode::Call => control_instructions::exec_call(act, vm, instr),
        OpCode::TailCall => control_instructions::exec_tailcall(act, vm, instr),
        OpCode::Return => control_instructions::exec_return(act, instr),
        OpCode::ForLoop => loop_instructions::exec_forloop(act, instr),
        OpCode::ForPrep => loop_instructions::exec_forprep(act, instr),
        OpCode::TForLoop => loop_instructions::exec_tforloop(act, vm, instr),
        OpCode::SetList => table_instructions::exec_setlist(act, instr),
        OpCode::Close => upvalue_instructions::exec_close(act, instr),
        OpCode::Closure => upvalue_instructions::exec_closure(act, instr),
        OpCode::Vararg => control_instructions::exec_vararg(act, instr),
    }
}

pub(crate) use arithmetic_instructions::ArithOp;

/// Relative jump with bounds validation; `pc == code.len()` is allowed
/// transiently (the next fetch reports the fall-off).
pub(crate) fn jump(a: &mut Activation, sbx: i32) -> LuaResult<()> {
    let target = a.pc as i64 + sbx as i64;
    if target < 0 || target as usize > a.chunk.code.len() {
        return Err(LuaError::runtime(format!("jump target {} out of range", target)));
    }
    a.pc = target as usize;
    Ok(())
}
