// Library registration for the standard library surface

mod basic;
mod coroutine;
mod string;

use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::LuaTable;
use crate::lua_vm::{LuaError, LuaErrorKind, LuaResult, NativeFn, Vm};
use crate::LuaValue;

/// A library module containing multiple native functions.
pub struct LibraryModule {
    pub name: &'static str,
    pub functions: Vec<(&'static str, NativeFn)>,
}

impl LibraryModule {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            functions: Vec::new(),
        }
    }
}

/// Builder for library modules.
#[macro_export]
macro_rules! lib_module {
    ($name:expr, {
        $($func_name:expr => $func:expr),* $(,)?
    }) => {{
        let mut module = $crate::stdlib::LibraryModule::new($name);
        $(
            module.functions.push(($func_name, $func));
        )*
        module
    }};
}

/// Install the basic, string and coroutine libraries into a VM. The string
/// module table doubles as the lookup consulted when a string is indexed.
pub fn open_all(vm: &mut Vm) {
    for module in [
        basic::create_basic_lib(),
        string::create_string_lib(),
        coroutine::create_coroutine_lib(),
    ] {
        load_module(vm, module);
    }
}

fn load_module(vm: &mut Vm, module: LibraryModule) {
    // Basic functions live directly in the global environment
    if module.name == "_G" {
        for (name, func) in module.functions {
            vm.set_global(name, LuaValue::Native(func));
        }
        return;
    }

    let table_rc = Rc::new(RefCell::new(LuaTable::new()));
    {
        let mut table = table_rc.borrow_mut();
        for (name, func) in &module.functions {
            table.raw_set(LuaValue::str(name), LuaValue::Native(*func));
        }
    }

    // String indexing resolves method names against the string module table
    if module.name == "string" {
        vm.string_lib = table_rc.clone();
    }

    vm.set_global(module.name, LuaValue::Table(table_rc));
}

// ===== Argument helpers =====

pub(crate) fn arg(args: &[LuaValue], i: usize) -> LuaValue {
    args.get(i).cloned().unwrap_or(LuaValue::Nil)
}

pub(crate) fn check_str(args: &[LuaValue], i: usize, fname: &str) -> LuaResult<String> {
    match arg(args, i) {
        LuaValue::String(s) => Ok(s.as_str().to_string()),
        LuaValue::Number(n) => Ok(crate::lua_value::number_to_string(n)),
        other => Err(LuaError::new(
            LuaErrorKind::Runtime,
            format!(
                "bad argument #{} to '{}' (string expected, got {})",
                i + 1,
                fname,
                other.type_name()
            ),
        )),
    }
}

pub(crate) fn check_number(args: &[LuaValue], i: usize, fname: &str) -> LuaResult<f64> {
    let value = arg(args, i);
    if value.is_numeric() {
        Ok(value.to_number().unwrap_or(f64::NAN))
    } else {
        Err(LuaError::new(
            LuaErrorKind::Runtime,
            format!(
                "bad argument #{} to '{}' (number expected, got {})",
                i + 1,
                fname,
                value.type_name()
            ),
        ))
    }
}

pub(crate) fn opt_number(args: &[LuaValue], i: usize, default: f64) -> f64 {
    args.get(i)
        .and_then(|v| v.to_number())
        .unwrap_or(default)
}
