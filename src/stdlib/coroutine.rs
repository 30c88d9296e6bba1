// Coroutine library
// Implements: create, resume, yield, status, running

use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::MultiValue;
use crate::lua_vm::coroutine::{self, Coroutine};
use crate::lua_vm::{LuaError, LuaResult, Vm};
use crate::stdlib::{arg, LibraryModule};
use crate::LuaValue;

pub fn create_coroutine_lib() -> LibraryModule {
    crate::lib_module!("coroutine", {
        "create" => coroutine_create,
        "resume" => coroutine_resume,
        "yield" => coroutine_yield,
        "status" => coroutine_status,
        "running" => coroutine_running,
    })
}

fn coroutine_create(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let func = arg(args, 0);
    if !matches!(func, LuaValue::Function(_)) {
        return Err(LuaError::runtime(
            "bad argument #1 to 'coroutine.create' (function expected)",
        ));
    }
    let co = Coroutine::new(func);
    Ok(MultiValue::single(LuaValue::Thread(Rc::new(RefCell::new(
        co,
    )))))
}

fn coroutine_resume(vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let LuaValue::Thread(co) = arg(args, 0) else {
        return Err(LuaError::runtime(
            "bad argument #1 to 'coroutine.resume' (coroutine expected)",
        ));
    };
    let rest = args.get(1..).unwrap_or(&[]).to_vec();
    coroutine::resume(vm, &co, rest)
}

fn coroutine_yield(vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    coroutine::yield_values(vm, args)
}

fn coroutine_status(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let LuaValue::Thread(co) = arg(args, 0) else {
        return Err(LuaError::runtime(
            "bad argument #1 to 'coroutine.status' (coroutine expected)",
        ));
    };
    let name = co.borrow().status_name();
    Ok(MultiValue::single(LuaValue::str(name)))
}

fn coroutine_running(vm: &mut Vm, _args: &[LuaValue]) -> LuaResult<MultiValue> {
    match &vm.current_coroutine {
        Some(co) => Ok(MultiValue::single(LuaValue::Thread(co.clone()))),
        None => Ok(MultiValue::single(LuaValue::Nil)),
    }
}
