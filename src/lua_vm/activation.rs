// Function activation record: registers, upvalues, program counter

use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::{Chunk, LuaClosure, LuaTable, LuaUpvalue, COMPAT_VARARG};
use crate::lua_vm::{RegisterFile, RK_CONSTANT_BIAS};
use crate::LuaValue;

/// Shared handle to an activation; controllers park these on resume stacks.
pub type ActivationRef = Rc<RefCell<Activation>>;

/// A single invocation record of a function prototype.
///
/// Created per call, mutated only by its own driver, and discarded on final
/// return - unless a controller keeps it alive across a suspension.
pub struct Activation {
    pub chunk: Rc<Chunk>,
    /// The closure this activation runs; used to reconnect a re-executed
    /// CALL with its suspended activation during coroutine resumption.
    pub closure: Rc<LuaClosure>,
    pub upvalues: Vec<Rc<LuaUpvalue>>,
    pub registers: Rc<RefCell<RegisterFile>>,
    pub pc: usize,
    /// Which live locals have been captured as open upvalue cells, as
    /// `(register index, cell)` pairs. No two entries share an index.
    pub open_cells: Vec<(usize, Rc<LuaUpvalue>)>,
    /// The full original argument vector, kept for VARARG.
    pub varargs: Vec<LuaValue>,
    pub terminated: bool,
}

impl Activation {
    /// Bind arguments into a fresh register file and stage compat varargs
    /// when the prototype asks for them.
    pub fn new(closure: Rc<LuaClosure>, args: Vec<LuaValue>) -> ActivationRef {
        let chunk = closure.chunk.clone();
        let registers = Rc::new(RefCell::new(RegisterFile::new()));

        {
            let mut regs = registers.borrow_mut();
            for i in 0..chunk.param_count {
                regs.set(i, args.get(i).cloned().unwrap_or(LuaValue::Nil));
            }

            if chunk.is_vararg == COMPAT_VARARG {
                let mut arg_table = LuaTable::new();
                let extras = args.get(chunk.param_count..).unwrap_or(&[]);
                for (i, v) in extras.iter().enumerate() {
                    arg_table.set_int(i as i64 + 1, v.clone());
                }
                arg_table.raw_set(LuaValue::str("n"), LuaValue::number(extras.len() as f64));
                regs.set(
                    chunk.param_count,
                    LuaValue::Table(Rc::new(RefCell::new(arg_table))),
                );
            }
        }

        let upvalues = closure.upvalues.clone();
        Rc::new(RefCell::new(Activation {
            chunk,
            closure,
            upvalues,
            registers,
            pc: 0,
            open_cells: Vec::new(),
            varargs: args,
            terminated: false,
        }))
    }

    #[inline]
    pub fn reg_get(&self, i: usize) -> LuaValue {
        self.registers.borrow().get(i)
    }

    #[inline]
    pub fn reg_set(&self, i: usize, value: LuaValue) {
        self.registers.borrow_mut().set(i, value);
    }

    #[inline]
    pub fn reg_len(&self) -> usize {
        self.registers.borrow().len()
    }

    /// RK operand decoding: `x >= 256` names constant `x - 256`, otherwise
    /// register `x`.
    pub fn rk(&self, x: u32) -> LuaValue {
        if x >= RK_CONSTANT_BIAS {
            self.chunk
                .constants
                .get((x - RK_CONSTANT_BIAS) as usize)
                .cloned()
                .unwrap_or(LuaValue::Nil)
        } else {
            self.reg_get(x as usize)
        }
    }

    pub fn constant(&self, index: usize) -> LuaValue {
        self.chunk.constants.get(index).cloned().unwrap_or(LuaValue::Nil)
    }

    /// Find the open cell already covering `register`, or capture a new one
    /// and record it. Sharing the cell is what lets sibling closures observe
    /// each other's writes to the same parent local.
    pub fn capture_local(&mut self, register: usize) -> Rc<LuaUpvalue> {
        if let Some((_, cell)) = self.open_cells.iter().find(|(i, _)| *i == register) {
            return cell.clone();
        }

        // Keep the captured slot inside the register file's length.
        if register >= self.reg_len() {
            self.reg_set(register, LuaValue::Nil);
        }

        let cell = LuaUpvalue::new_open(self.registers.clone(), register);
        self.open_cells.push((register, cell.clone()));
        cell
    }

    /// Close every captured local at or above `start`: the cell takes the
    /// current register value and the register slot is removed.
    pub fn close_upvalues_from(&mut self, start: usize) {
        let mut kept = Vec::new();
        for (index, cell) in self.open_cells.drain(..) {
            if index >= start {
                let value = self.registers.borrow().get(index);
                cell.close(value);
                self.registers.borrow_mut().delete(index);
            } else {
                kept.push((index, cell));
            }
        }
        self.open_cells = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua_value::LuaClosure;

    fn closure_with(param_count: usize, is_vararg: u8) -> Rc<LuaClosure> {
        let chunk = Chunk {
            param_count,
            is_vararg,
            ..Chunk::new()
        };
        Rc::new(LuaClosure::new(Rc::new(chunk), Vec::new()))
    }

    #[test]
    fn test_argument_binding_nil_fills_missing() {
        let act = Activation::new(closure_with(2, 0), vec![LuaValue::number(1.0)]);
        let act = act.borrow();
        assert_eq!(act.reg_get(0), LuaValue::number(1.0));
        assert!(act.reg_get(1).is_nil());
    }

    #[test]
    fn test_compat_vararg_staging() {
        let args = vec![
            LuaValue::number(10.0),
            LuaValue::number(20.0),
            LuaValue::number(30.0),
        ];
        let act = Activation::new(closure_with(1, COMPAT_VARARG), args);
        let act = act.borrow();
        let staged = act.reg_get(1);
        let table = staged.as_table().expect("vararg table").borrow();
        assert_eq!(table.get_int(1), Some(LuaValue::number(20.0)));
        assert_eq!(table.get_int(2), Some(LuaValue::number(30.0)));
        assert_eq!(table.get_str("n"), Some(LuaValue::number(2.0)));
    }

    #[test]
    fn test_capture_local_shares_cells() {
        let act = Activation::new(closure_with(1, 0), vec![LuaValue::number(5.0)]);
        let mut act = act.borrow_mut();
        let first = act.capture_local(0);
        let second = act.capture_local(0);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(act.open_cells.len(), 1);
    }

    #[test]
    fn test_close_upvalues_removes_slots() {
        let act = Activation::new(closure_with(2, 0), vec![
            LuaValue::number(1.0),
            LuaValue::number(2.0),
        ]);
        let mut act = act.borrow_mut();
        let low = act.capture_local(0);
        let high = act.capture_local(1);
        act.close_upvalues_from(1);
        assert!(low.is_open());
        assert!(!high.is_open());
        assert_eq!(high.get(), LuaValue::number(2.0));
        assert_eq!(act.open_cells.len(), 1);
        // The closed register slot became a hole
        assert!(act.reg_get(1).is_nil());
        // Closed cells keep working after the register is gone
        high.set(LuaValue::number(9.0));
        assert_eq!(high.get(), LuaValue::number(9.0));
    }
}
