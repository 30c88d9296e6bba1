// Coroutine controller: suspension state, resume stack, value transfer

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::lua_value::MultiValue;
use crate::lua_vm::activation::{Activation, ActivationRef};
use crate::lua_vm::execute;
use crate::lua_vm::{LuaResult, Vm};
use crate::LuaValue;

/// Coroutine status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineStatus {
    /// Created or yielded.
    Suspended,
    /// Currently executing.
    Running,
    /// A yield is propagating up the activation chain.
    Suspending,
    /// A resume is rebuilding the activation chain.
    Resuming,
    /// Finished or errored.
    Dead,
}

/// One coroutine: the entry function, the suspended activation chain, and
/// the value buffer carrying yields outward and resume values inward.
pub struct Coroutine {
    pub status: CoroutineStatus,
    pub(crate) entry_func: LuaValue,
    /// The activation created for the entry call; identifies where yield
    /// propagation stops.
    pub(crate) entry: Option<ActivationRef>,
    /// Suspended activations, outermost on top; restored LIFO on resume.
    pub(crate) resume_stack: Vec<ActivationRef>,
    /// Yielded values on the way out, resume arguments on the way back in.
    pub(crate) yield_vals: Vec<LuaValue>,
}

impl Coroutine {
    pub fn new(entry_func: LuaValue) -> Self {
        Coroutine {
            status: CoroutineStatus::Suspended,
            entry_func,
            entry: None,
            resume_stack: Vec::new(),
            yield_vals: Vec::new(),
        }
    }

    pub fn status_name(&self) -> &'static str {
        match self.status {
            CoroutineStatus::Suspended | CoroutineStatus::Suspending => "suspended",
            CoroutineStatus::Running | CoroutineStatus::Resuming => "running",
            CoroutineStatus::Dead => "dead",
        }
    }

    /// Drop all bookkeeping after the coroutine completes or errors.
    fn teardown(&mut self) {
        self.status = CoroutineStatus::Dead;
        self.entry = None;
        self.resume_stack.clear();
        self.yield_vals.clear();
    }
}

/// Resume a coroutine. Returns `(true, values...)` where the values are the
/// next yield vector or the final returns, or `(false, message)` when the
/// coroutine cannot be resumed or its body raised an error.
pub fn resume(
    vm: &mut Vm,
    co_rc: &Rc<RefCell<Coroutine>>,
    args: Vec<LuaValue>,
) -> LuaResult<MultiValue> {
    {
        let co = co_rc.borrow();
        match co.status {
            CoroutineStatus::Suspended => {}
            CoroutineStatus::Dead => {
                return Ok(MultiValue::multiple(vec![
                    LuaValue::boolean(false),
                    LuaValue::str("cannot resume dead coroutine"),
                ]))
            }
            _ => {
                return Ok(MultiValue::multiple(vec![
                    LuaValue::boolean(false),
                    LuaValue::str("cannot resume non-suspended coroutine"),
                ]))
            }
        }
    }

    let previous = vm.current_coroutine.replace(co_rc.clone());

    let first_resume = co_rc.borrow().entry.is_none();
    let result = if first_resume {
        let entry_func = co_rc.borrow().entry_func.clone();
        let LuaValue::Function(closure) = entry_func else {
            vm.current_coroutine = previous;
            co_rc.borrow_mut().teardown();
            return Ok(MultiValue::multiple(vec![
                LuaValue::boolean(false),
                LuaValue::str("cannot resume a non-function coroutine"),
            ]));
        };
        debug!("starting coroutine body");
        co_rc.borrow_mut().status = CoroutineStatus::Running;
        let act = Activation::new(closure, args);
        co_rc.borrow_mut().entry = Some(act.clone());
        execute::run(&act, vm)
    } else {
        // Restore LIFO: the outermost suspended activation re-executes its
        // paused CALL, which reconnects inward frame by frame until yield
        // hands the resume values back.
        debug!("resuming suspended coroutine");
        {
            let mut co = co_rc.borrow_mut();
            co.status = CoroutineStatus::Resuming;
            co.yield_vals = args;
        }
        let outermost = co_rc.borrow_mut().resume_stack.pop();
        match outermost {
            Some(act) => execute::resume(act, vm, true),
            None => Err(crate::lua_vm::LuaError::runtime(
                "coroutine resume stack is empty",
            )),
        }
    };

    vm.current_coroutine = previous;

    match result {
        Ok(values) => {
            let mut out = vec![LuaValue::boolean(true)];
            out.extend(values.all_values());
            let mut co = co_rc.borrow_mut();
            if co.status == CoroutineStatus::Suspended {
                // Yielded; the returned values are the yield vector.
            } else {
                co.teardown();
            }
            Ok(MultiValue::multiple(out))
        }
        Err(e) => {
            co_rc.borrow_mut().teardown();
            Ok(MultiValue::multiple(vec![
                LuaValue::boolean(false),
                LuaValue::string_owned(e.message),
            ]))
        }
    }
}

/// The `yield` entry point, called as a native from coroutine bodies.
///
/// While the coroutine runs normally a yield flips it into `Suspending` and
/// stashes the yielded values; while it is `Resuming`, the re-executed CALL
/// lands here again and the resume values come back as yield's returns.
pub fn yield_values(vm: &mut Vm, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let Some(co_rc) = vm.current_coroutine.clone() else {
        return Err(crate::lua_vm::LuaError::runtime(
            "attempt to yield from outside a coroutine",
        ));
    };

    let mut co = co_rc.borrow_mut();
    match co.status {
        CoroutineStatus::Running => {
            debug!("coroutine yielding {} value(s)", args.len());
            co.status = CoroutineStatus::Suspending;
            co.yield_vals = args.to_vec();
            Ok(MultiValue::empty())
        }
        CoroutineStatus::Resuming => {
            co.status = CoroutineStatus::Running;
            Ok(MultiValue::multiple(std::mem::take(&mut co.yield_vals)))
        }
        _ => Err(crate::lua_vm::LuaError::runtime(
            "attempt to yield from a non-running coroutine",
        )),
    }
}
