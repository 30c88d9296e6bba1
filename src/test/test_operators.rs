// Arithmetic, truthiness, comparisons and conditional skips

use super::*;
use crate::LuaErrorKind;
use crate::OpCode::*;

#[test]
fn test_arith_on_numeric_strings() {
    // "10" + "2.5": both operands pass the numeric predicate
    let c = chunk(
        vec![abc(Add, 0, k(0), k(1)), abc(Return, 0, 2, 0)],
        vec![LuaValue::str("10"), LuaValue::str("2.5")],
    );
    assert_eq!(run(c).unwrap(), vec![num(12.5)]);
}

#[test]
fn test_arith_operator_results() {
    let c = chunk(
        vec![
            abc(Sub, 0, k(0), k(1)),   // 7 - 2 = 5
            abc(Mul, 1, k(0), k(1)),   // 14
            abc(Div, 2, k(0), k(1)),   // 3.5
            abc(Mod, 3, k(0), k(2)),   // 7 % -2 = 1 (dividend's sign)
            abc(Pow, 4, k(1), k(3)),   // 2 ^ 10 = 1024
            abc(Unm, 5, k(0), 0),      // -7
            abc(Return, 0, 7, 0),
        ],
        vec![num(7.0), num(2.0), num(-2.0), num(10.0)],
    );
    assert_eq!(
        run(c).unwrap(),
        vec![num(5.0), num(14.0), num(3.5), num(1.0), num(1024.0), num(-7.0)]
    );
}

#[test]
fn test_mod_sign_follows_dividend() {
    let c = chunk(
        vec![
            abc(Mod, 0, k(0), k(1)),   // -7 % 2
            abc(Return, 0, 2, 0),
        ],
        vec![num(-7.0), num(2.0)],
    );
    assert_eq!(run(c).unwrap(), vec![num(-1.0)]);
}

#[test]
fn test_not_operator() {
    let c = chunk(
        vec![
            abc(LoadNil, 0, 0, 0),
            abc(Not, 1, 0, 0),         // not nil = true
            abx(LoadK, 0, 0),
            abc(Not, 2, 0, 0),         // not 0 = false
            abc(Return, 1, 3, 0),
        ],
        vec![num(0.0)],
    );
    assert_eq!(
        run(c).unwrap(),
        vec![LuaValue::boolean(true), LuaValue::boolean(false)]
    );
}

fn test_flag_chunk(constant: LuaValue) -> Chunk {
    // R1 = whether truthy(R0) matched C=1
    chunk(
        vec![
            abx(LoadK, 0, 0),
            abc(Test, 0, 0, 1),
            abc(LoadBool, 1, 1, 1),
            abc(LoadBool, 1, 0, 0),
            abc(Return, 1, 2, 0),
        ],
        vec![constant],
    )
}

#[test]
fn test_test_treats_zero_and_empty_string_as_truthy() {
    assert_eq!(
        run(test_flag_chunk(num(0.0))).unwrap(),
        vec![LuaValue::boolean(true)]
    );
    assert_eq!(
        run(test_flag_chunk(LuaValue::str(""))).unwrap(),
        vec![LuaValue::boolean(true)]
    );
    assert_eq!(
        run(test_flag_chunk(LuaValue::Nil)).unwrap(),
        vec![LuaValue::boolean(false)]
    );
    assert_eq!(
        run(test_flag_chunk(LuaValue::boolean(false))).unwrap(),
        vec![LuaValue::boolean(false)]
    );
}

#[test]
fn test_testset_assigns_on_match() {
    let c = chunk(
        vec![
            abx(LoadK, 0, 0),          // ""
            abc(TestSet, 1, 0, 1),     // truthy("") == true → R1 = ""
            abc(Return, 1, 2, 0),
        ],
        vec![LuaValue::str("")],
    );
    assert_eq!(run(c).unwrap(), vec![LuaValue::str("")]);
}

#[test]
fn test_testset_skips_on_mismatch() {
    let c = chunk(
        vec![
            abx(LoadK, 0, 0),          // false
            abx(LoadK, 1, 1),          // "untouched"
            abc(TestSet, 1, 0, 1),     // mismatch → skip the overwrite
            abx(LoadK, 1, 2),          // "overwritten" (skipped)
            abc(Return, 1, 2, 0),
        ],
        vec![
            LuaValue::boolean(false),
            LuaValue::str("untouched"),
            LuaValue::str("overwritten"),
        ],
    );
    assert_eq!(run(c).unwrap(), vec![LuaValue::str("untouched")]);
}

fn lt_chunk(lhs: LuaValue, rhs: LuaValue) -> Chunk {
    chunk(
        vec![
            abc(Lt, 1, k(0), k(1)),
            abc(LoadBool, 0, 1, 1),
            abc(LoadBool, 0, 0, 0),
            abc(Return, 0, 2, 0),
        ],
        vec![lhs, rhs],
    )
}

#[test]
fn test_lt_numbers_and_strings() {
    assert_eq!(
        run(lt_chunk(num(10.0), num(9.0))).unwrap(),
        vec![LuaValue::boolean(false)]
    );
    // Two strings compare lexicographically even when both look numeric
    assert_eq!(
        run(lt_chunk(LuaValue::str("10"), LuaValue::str("9"))).unwrap(),
        vec![LuaValue::boolean(true)]
    );
    // Mixed numeric string and number compare numerically
    assert_eq!(
        run(lt_chunk(LuaValue::str("10"), num(9.0))).unwrap(),
        vec![LuaValue::boolean(false)]
    );
    // Incomparable operands are simply not less
    assert_eq!(
        run(lt_chunk(LuaValue::boolean(true), num(9.0))).unwrap(),
        vec![LuaValue::boolean(false)]
    );
}

#[test]
fn test_eq_skip_contract() {
    // EQ with A=0: skip when the values ARE equal
    let c = chunk(
        vec![
            abc(Eq, 0, k(0), k(0)),    // equal != false → skip
            abc(LoadBool, 0, 1, 1),    // skipped
            abc(LoadBool, 0, 0, 0),
            abc(Return, 0, 2, 0),
        ],
        vec![num(1.0)],
    );
    assert_eq!(run(c).unwrap(), vec![LuaValue::boolean(false)]);
}

#[test]
fn test_concat_numbers_and_strings() {
    let c = chunk(
        vec![
            abx(LoadK, 0, 0),          // "v="
            abx(LoadK, 1, 1),          // 1
            abx(LoadK, 2, 2),          // ".5px"
            abc(Concat, 3, 0, 2),
            abc(Return, 3, 2, 0),
        ],
        vec![LuaValue::str("v="), num(1.0), LuaValue::str(".5px")],
    );
    assert_eq!(run(c).unwrap(), vec![LuaValue::str("v=1.5px")]);
}

#[test]
fn test_concat_rejects_nil() {
    let c = chunk(
        vec![
            abx(LoadK, 0, 0),
            abc(LoadNil, 1, 1, 0),
            abc(Concat, 2, 0, 1),
            abc(Return, 2, 2, 0),
        ],
        vec![LuaValue::str("a")],
    );
    assert_eq!(run(c).unwrap_err().kind, LuaErrorKind::ConcatOnNonStringNumber);
}

#[test]
fn test_arith_totality_on_numeric_pairs() {
    // Every operator completes for numeric-string operand pairs
    for op in [Add, Sub, Mul, Div, Mod, Pow] {
        let c = chunk(
            vec![abc(op, 0, k(0), k(1)), abc(Return, 0, 2, 0)],
            vec![LuaValue::str("6"), LuaValue::str("3")],
        );
        let results = run(c).unwrap();
        assert!(results[0].is_number(), "{:?} result", op);
    }
}
