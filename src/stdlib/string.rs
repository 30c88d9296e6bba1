// String library
// Implements: byte, len, lower, rep, reverse, sub, upper
// This table is also what string indexing resolves method names against.

use crate::lua_value::MultiValue;
use crate::lua_vm::{LuaResult, Vm};
use crate::stdlib::{check_number, check_str, opt_number, LibraryModule};
use crate::LuaValue;

pub fn create_string_lib() -> LibraryModule {
    crate::lib_module!("string", {
        "byte" => string_byte,
        "len" => string_len,
        "lower" => string_lower,
        "rep" => string_rep,
        "reverse" => string_reverse,
        "sub" => string_sub,
        "upper" => string_upper,
    })
}

fn string_len(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_str(args, 0, "string.len")?;
    Ok(MultiValue::single(LuaValue::number(
        s.chars().count() as f64
    )))
}

fn string_upper(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_str(args, 0, "string.upper")?;
    Ok(MultiValue::single(LuaValue::string_owned(s.to_uppercase())))
}

fn string_lower(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_str(args, 0, "string.lower")?;
    Ok(MultiValue::single(LuaValue::string_owned(s.to_lowercase())))
}

fn string_reverse(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_str(args, 0, "string.reverse")?;
    Ok(MultiValue::single(LuaValue::string_owned(
        s.chars().rev().collect(),
    )))
}

fn string_rep(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_str(args, 0, "string.rep")?;
    let n = check_number(args, 1, "string.rep")?;
    let n = if n.is_finite() && n > 0.0 { n as usize } else { 0 };
    Ok(MultiValue::single(LuaValue::string_owned(s.repeat(n))))
}

/// string.sub(s, i [, j]) - 1-based inclusive slice, negatives count from
/// the end.
fn string_sub(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_str(args, 0, "string.sub")?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;

    let i = check_number(args, 1, "string.sub")? as i64;
    let j = opt_number(args, 2, -1.0) as i64;

    let start = if i < 0 { (len + i + 1).max(1) } else { i.max(1) };
    let end = if j < 0 { len + j + 1 } else { j.min(len) };

    if start > end {
        return Ok(MultiValue::single(LuaValue::str("")));
    }
    let slice: String = chars[(start - 1) as usize..end as usize].iter().collect();
    Ok(MultiValue::single(LuaValue::string_owned(slice)))
}

fn string_byte(_vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_str(args, 0, "string.byte")?;
    let bytes = s.as_bytes();
    let len = bytes.len() as i64;

    let i = opt_number(args, 1, 1.0) as i64;
    let index = if i < 0 { len + i + 1 } else { i };
    if index < 1 || index > len {
        return Ok(MultiValue::empty());
    }
    Ok(MultiValue::single(LuaValue::number(
        bytes[(index - 1) as usize] as f64,
    )))
}
