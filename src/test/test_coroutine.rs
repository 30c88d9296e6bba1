// Cooperative suspension: yield propagation, pc rewind, CALL re-entry

use super::*;
use crate::lua_vm::coroutine::{self, Coroutine};
use crate::CoroutineStatus;
use crate::OpCode::*;
use std::cell::RefCell;
use std::rc::Rc;

fn co_handle(func: LuaValue) -> Rc<RefCell<Coroutine>> {
    Rc::new(RefCell::new(Coroutine::new(func)))
}

fn yield_call_chunk() -> Chunk {
    // function() return coroutine.yield(7, 8) end
    let mut c = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(GetTable, 0, 0, k(1)),
            abx(LoadK, 1, 2),
            abx(LoadK, 2, 3),
            abc(Call, 0, 3, 2),        // R0 = yield(7, 8)
            abc(Return, 0, 2, 0),
        ],
        vec![
            LuaValue::str("coroutine"),
            LuaValue::str("yield"),
            num(7.0),
            num(8.0),
        ],
    );
    c.source_name = Some("g".to_string());
    c
}

#[test]
fn test_yield_inside_nested_call_resumes_through_splice() {
    // The entry function calls g; g yields (7, 8); resuming with 9 splices
    // 9 into g's paused CALL and the program returns it.
    let entry = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(Call, 0, 1, 2),        // R0 = g()
            abc(Return, 0, 2, 0),
        ],
        vec![LuaValue::str("g")],
    );

    let mut vm = new_vm();
    vm.set_global("g", closure_value(yield_call_chunk()));
    let co = co_handle(closure_value(entry));

    let first = coroutine::resume(&mut vm, &co, vec![]).unwrap().all_values();
    assert_eq!(
        first,
        vec![LuaValue::boolean(true), num(7.0), num(8.0)]
    );
    assert_eq!(co.borrow().status, CoroutineStatus::Suspended);

    let second = coroutine::resume(&mut vm, &co, vec![num(9.0)])
        .unwrap()
        .all_values();
    assert_eq!(second, vec![LuaValue::boolean(true), num(9.0)]);
    assert_eq!(co.borrow().status, CoroutineStatus::Dead);
}

#[test]
fn test_yield_sequence_and_death() {
    // yield(1); yield(2); return 3
    let body = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(GetTable, 0, 0, k(1)),
            abx(LoadK, 1, 2),
            abc(Call, 0, 2, 1),        // yield(1)
            abx(GetGlobal, 0, 0),
            abc(GetTable, 0, 0, k(1)),
            abx(LoadK, 1, 3),
            abc(Call, 0, 2, 1),        // yield(2)
            abx(LoadK, 0, 4),
            abc(Return, 0, 2, 0),      // return 3
        ],
        vec![
            LuaValue::str("coroutine"),
            LuaValue::str("yield"),
            num(1.0),
            num(2.0),
            num(3.0),
        ],
    );

    let mut vm = new_vm();
    let co = co_handle(closure_value(body));

    for expected in [1.0, 2.0, 3.0] {
        let out = coroutine::resume(&mut vm, &co, vec![]).unwrap().all_values();
        assert_eq!(out, vec![LuaValue::boolean(true), num(expected)]);
    }
    assert_eq!(co.borrow().status, CoroutineStatus::Dead);

    let out = coroutine::resume(&mut vm, &co, vec![]).unwrap().all_values();
    assert_eq!(out[0], LuaValue::boolean(false));
    assert_eq!(out[1], LuaValue::str("cannot resume dead coroutine"));
}

#[test]
fn test_first_resume_arguments_become_body_arguments() {
    let mut body = chunk(vec![abc(Return, 0, 2, 0)], vec![]);
    body.param_count = 1;

    let mut vm = new_vm();
    let co = co_handle(closure_value(body));
    let out = coroutine::resume(&mut vm, &co, vec![num(5.0)])
        .unwrap()
        .all_values();
    assert_eq!(out, vec![LuaValue::boolean(true), num(5.0)]);
}

#[test]
fn test_error_in_body_reports_failure() {
    // nil + nil inside the coroutine body
    let body = chunk(
        vec![abc(Add, 0, 0, 0), abc(Return, 0, 2, 0)],
        vec![],
    );

    let mut vm = new_vm();
    let co = co_handle(closure_value(body));
    let out = coroutine::resume(&mut vm, &co, vec![]).unwrap().all_values();
    assert_eq!(out[0], LuaValue::boolean(false));
    assert_eq!(
        out[1].as_str(),
        Some("attempt to perform arithmetic on a non-numeric value")
    );
    assert_eq!(co.borrow().status, CoroutineStatus::Dead);
}

#[test]
fn test_yield_outside_coroutine_raises() {
    let c = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(GetTable, 0, 0, k(1)),
            abc(Call, 0, 1, 1),
            abc(Return, 0, 1, 0),
        ],
        vec![LuaValue::str("coroutine"), LuaValue::str("yield")],
    );
    let e = run(c).unwrap_err();
    assert!(e.message.contains("yield from outside a coroutine"));
}

#[test]
fn test_status_surfaces_through_library() {
    // coroutine.create / status / resume via the installed library surface
    let body = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(GetTable, 0, 0, k(1)),
            abc(Call, 0, 1, 1),        // yield()
            abc(Return, 0, 1, 0),
        ],
        vec![LuaValue::str("coroutine"), LuaValue::str("yield")],
    );

    let mut vm = new_vm();
    vm.set_global("body", closure_value(body));

    // local co = coroutine.create(body); return coroutine.status(co)
    let script = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(GetTable, 0, 0, k(1)),     // coroutine.create
            abx(GetGlobal, 1, 2),          // body
            abc(Call, 0, 2, 2),            // R0 = create(body)
            abx(SetGlobal, 0, 3),          // co = R0
            abx(GetGlobal, 1, 0),
            abc(GetTable, 1, 1, k(4)),     // coroutine.status
            abc(Move, 2, 0, 0),
            abc(Call, 1, 2, 2),            // R1 = status(co)
            abc(Return, 1, 2, 0),
        ],
        vec![
            LuaValue::str("coroutine"),
            LuaValue::str("create"),
            LuaValue::str("body"),
            LuaValue::str("co"),
            LuaValue::str("status"),
        ],
    );
    let results = vm.execute(Rc::new(script)).unwrap();
    assert_eq!(results, vec![LuaValue::str("suspended")]);

    // Drive it to completion through the library resume
    let co = vm.get_global("co").expect("stored handle");
    let LuaValue::Thread(handle) = co.clone() else {
        panic!("expected thread value");
    };
    let out = coroutine::resume(&mut vm, &handle, vec![]).unwrap().all_values();
    assert_eq!(out[0], LuaValue::boolean(true));
    assert_eq!(handle.borrow().status, CoroutineStatus::Suspended);
    let out = coroutine::resume(&mut vm, &handle, vec![]).unwrap().all_values();
    assert_eq!(out[0], LuaValue::boolean(true));
    assert_eq!(handle.borrow().status_name(), "dead");
}

#[test]
fn test_suspension_is_transparent_to_the_caller_program() {
    // A run that yields and is resumed with the value the callee would have
    // returned matches a run with no suspension at all.
    let entry = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(Call, 0, 1, 2),
            abc(Add, 0, 0, k(1)),
            abc(Return, 0, 2, 0),
        ],
        vec![LuaValue::str("g"), num(1.0)],
    );

    // Direct version: g returns 41 without yielding
    let direct_g = chunk(
        vec![abx(LoadK, 0, 0), abc(Return, 0, 2, 0)],
        vec![num(41.0)],
    );
    let mut vm = new_vm();
    vm.set_global("g", closure_value(direct_g));
    let co = co_handle(closure_value(chunk(
        entry.code.clone(),
        entry.constants.clone(),
    )));
    let direct = coroutine::resume(&mut vm, &co, vec![]).unwrap().all_values();

    // Suspending version: g yields once, then the resume feeds 41 back
    let mut vm = new_vm();
    let yielding_g = chunk(
        vec![
            abx(GetGlobal, 0, 0),
            abc(GetTable, 0, 0, k(1)),
            abc(Call, 0, 1, 2),        // R0 = yield()
            abc(Return, 0, 2, 0),
        ],
        vec![LuaValue::str("coroutine"), LuaValue::str("yield")],
    );
    vm.set_global("g", closure_value(yielding_g));
    let co = co_handle(closure_value(entry));
    let paused = coroutine::resume(&mut vm, &co, vec![]).unwrap().all_values();
    assert_eq!(paused, vec![LuaValue::boolean(true)]);
    let resumed = coroutine::resume(&mut vm, &co, vec![num(41.0)])
        .unwrap()
        .all_values();

    assert_eq!(direct, resumed);
    assert_eq!(resumed, vec![LuaValue::boolean(true), num(42.0)]);
}
