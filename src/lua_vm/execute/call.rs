// Callable dispatch: closures, natives, and coroutine reconnection

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::lua_value::{LuaClosure, MultiValue};
use crate::lua_vm::activation::{Activation, ActivationRef};
use crate::lua_vm::coroutine::CoroutineStatus;
use crate::lua_vm::execute;
use crate::lua_vm::{LuaError, LuaErrorKind, LuaResult, Vm};
use crate::LuaValue;

/// Invoke any callable value with a positional argument vector.
///
/// While the current coroutine is `Resuming`, a re-executed CALL whose
/// callee owns the suspended activation on top of the resume stack
/// continues that activation instead of starting a fresh one; that is how
/// the paused call chain is rebuilt frame by frame.
pub(crate) fn call_value(
    vm: &mut Vm,
    func: &LuaValue,
    args: Vec<LuaValue>,
) -> LuaResult<MultiValue> {
    match func {
        LuaValue::Function(closure) => {
            if let Some(act) = suspended_activation_for(vm, closure) {
                debug!("reconnecting re-executed call to suspended activation");
                return execute::resume(act, vm, true);
            }

            trace!("calling closure {}", closure.chunk.source());
            vm.enter_call()?;
            let act = Activation::new(closure.clone(), args);
            let result = execute::run(&act, vm);
            vm.exit_call();
            result
        }
        LuaValue::Native(f) => {
            vm.enter_call()?;
            let outcome = catch_unwind(AssertUnwindSafe(|| f(vm, &args)));
            vm.exit_call();
            match outcome {
                Ok(result) => result,
                Err(payload) => Err(LuaError::host(panic_message(payload))),
            }
        }
        _ => Err(LuaError::from_kind(LuaErrorKind::CallNonCallable)),
    }
}

fn suspended_activation_for(vm: &mut Vm, closure: &Rc<LuaClosure>) -> Option<ActivationRef> {
    let co_rc = vm.current_coroutine.clone()?;
    let mut co = co_rc.borrow_mut();
    if co.status != CoroutineStatus::Resuming {
        return None;
    }
    let top_matches = co
        .resume_stack
        .last()
        .map_or(false, |act| Rc::ptr_eq(&act.borrow().closure, closure));
    if top_matches {
        co.resume_stack.pop()
    } else {
        None
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
