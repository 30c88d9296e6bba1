// Basic library
// Implements: print, type, tostring, assert, error

use crate::lua_value::MultiValue;
use crate::lua_vm::{LuaError, LuaResult, Vm};
use crate::stdlib::{arg, LibraryModule};
use crate::LuaValue;

pub fn create_basic_lib() -> LibraryModule {
    crate::lib_module!("_G", {
        "print" => basic_print,
        "type" => basic_type,
        "tostring" => basic_tostring,
        "assert" => basic_assert,
        "error" => basic_error,
    })
}

fn basic_print(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let line = args
        .iter()
        .map(|v| v.to_display_string())
        .collect::<Vec<_>>()
        .join("\t");
    println!("{}", line);
    Ok(MultiValue::empty())
}

fn basic_type(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    Ok(MultiValue::single(LuaValue::str(arg(args, 0).type_name())))
}

fn basic_tostring(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    Ok(MultiValue::single(LuaValue::string_owned(
        arg(args, 0).to_display_string(),
    )))
}

fn basic_assert(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    if arg(args, 0).truthy() {
        return Ok(MultiValue::multiple(args.to_vec()));
    }
    let message = match args.get(1) {
        Some(m) => m.to_display_string(),
        None => "assertion failed!".to_string(),
    };
    Err(LuaError::runtime(message))
}

fn basic_error(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    Err(LuaError::runtime(arg(args, 0).to_display_string()))
}
