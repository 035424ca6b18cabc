//! Integration tests for the LUX object model
//!
//! Exercises the symbol table through its public API and whole scripts
//! through the interpreter:
//! - Ownership cascades and idempotent deletion
//! - Checkpoint/rollback of temporaries
//! - Context-exact name resolution
//! - Arena exhaustion
//! - Nested includes

use lux::config::{ArenaConfig, Config};
use lux::convert::ConvertMode;
use lux::interp::error::ErrorKind;
use lux::symbol::{
    Class, Context, ElementType, MarkKind, Namespace, Number, Payload, Pending, RangeKind,
    RoutineKind,
};
use lux::{CompileError, Handle, Interpreter, SymbolTable};
use std::path::PathBuf;

fn table() -> SymbolTable {
    SymbolTable::new(&Config::default())
}

/// Runs `source` and returns what it printed
fn run(source: &str) -> Vec<String> {
    let mut interp = Interpreter::capturing(&Config::default());
    interp.run_source(source).unwrap();
    interp.take_output()
}

/// Live temporaries that nothing owns
fn free_temps(symbols: &SymbolTable) -> usize {
    [RangeKind::TempVariable, RangeKind::TempExecutable]
        .into_iter()
        .flat_map(|range| symbols.arena().live(range).collect::<Vec<_>>())
        .filter(|&h| symbols.is_free_temp(h))
        .count()
}

/// Whether `owner` is reached by following `h`'s chain of owners
fn owned_by(symbols: &SymbolTable, mut h: Handle, owner: Handle) -> bool {
    while let Some(Context::Owner(next)) = symbols.context_of(h) {
        if next == owner {
            return true;
        }
        h = next;
    }
    false
}

/// Scratch directory unique to this test process
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lux-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ============================================
// Ownership
// ============================================

#[test]
fn test_list_owns_arrays_and_scalar() {
    let mut st = table();
    let a = st.new_array(ElementType::Int32, vec![3]).unwrap();
    let b = st.new_array(ElementType::Double, vec![2, 2]).unwrap();
    let s = st.new_scalar(Number::Float(2.5)).unwrap();
    for value in [a, b, s] {
        st.push_pending(Pending { key: None, value });
    }
    let list = st.new_list(3).unwrap();

    for child in [a, b, s] {
        assert_eq!(st.context_of(child), Some(Context::Owner(list)));
    }

    st.zap(list).unwrap();
    for h in [a, b, s, list] {
        assert_eq!(st.class_of(h), Class::Unused, "{h} still live");
    }
}

#[test]
fn test_embed_keeps_first_owner() {
    let mut st = table();
    let child = st.new_scalar(Number::Int32(1)).unwrap();
    let first = st.new_string("first".into()).unwrap();
    let second = st.new_string("second".into()).unwrap();

    assert!(st.embed(child, first));
    assert!(!st.embed(child, second));
    assert_eq!(st.context_of(child), Some(Context::Owner(first)));
}

#[test]
fn test_embed_refuses_named_and_constant() {
    let mut st = table();
    let owner = st.new_string("owner".into()).unwrap();
    let named = st.install_variable("N").unwrap();
    let pi = st.constants().pi;

    assert!(!st.embed(named, owner));
    assert!(!st.embed(pi, owner));
    assert_eq!(st.context_of(named), Some(Context::TopLevel));
}

#[test]
fn test_nested_cascade_reaches_grandchildren() {
    let mut st = table();
    let leaf = st.new_scalar(Number::Int16(4)).unwrap();
    st.push_pending(Pending { key: Some("leaf".into()), value: leaf });
    let inner = st.new_list(1).unwrap();
    st.push_pending(Pending { key: None, value: inner });
    let outer = st.new_compact_list(1).unwrap();

    st.zap(outer).unwrap();
    for h in [leaf, inner, outer] {
        assert_eq!(st.class_of(h), Class::Unused);
    }
}

#[test]
fn test_zap_twice_is_harmless() {
    let mut st = table();
    let h = st.new_scalar(Number::Int32(9)).unwrap();
    st.zap(h).unwrap();
    assert_eq!(st.class_of(h), Class::Unused);
    st.zap(h).unwrap();
    assert_eq!(st.class_of(h), Class::Unused);
}

#[test]
fn test_constants_are_protected() {
    let mut st = table();
    let one = st.constants().one;
    let err = st.zap(one).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ProtectedHandle);
    assert_eq!(st.payload(one).unwrap(), &Payload::Scalar(Number::Int32(1)));
}

#[test]
fn test_undefine_keeps_handle_and_name() {
    let mut st = table();
    let x = st.install_variable("X").unwrap();
    let v = st.new_array(ElementType::Int8, vec![4]).unwrap();
    st.replace(x, v).unwrap();
    assert_eq!(st.class_of(x), Class::Array);

    st.undefine(x).unwrap();
    assert_eq!(st.class_of(x), Class::Undefined);
    assert_eq!(st.find_variable("x"), Some(x));
}

// ============================================
// Checkpoint / rollback
// ============================================

#[test]
fn test_rollback_reclaims_window_only() {
    let mut st = table();
    let before = st.new_scalar(Number::Int32(1)).unwrap();

    st.checkpoint(MarkKind::Statement);
    let scratch: Vec<_> = (0..3)
        .map(|i| st.new_scalar(Number::Int32(i)).unwrap())
        .collect();
    let reclaimed = st.rollback();

    assert_eq!(reclaimed, 3);
    for h in scratch {
        assert_eq!(st.class_of(h), Class::Unused);
    }
    assert_eq!(st.class_of(before), Class::Scalar);
}

#[test]
fn test_rollback_skips_embedded_temporaries() {
    let mut st = table();
    st.checkpoint(MarkKind::Statement);
    let v = st.new_scalar(Number::Int32(3)).unwrap();
    st.push_pending(Pending { key: None, value: v });
    let list = st.new_list(1).unwrap();
    let x = st.install_variable("KEEP").unwrap();
    st.replace(x, list).unwrap();
    st.rollback();

    // The list moved into KEEP; its element survives with it
    assert_eq!(st.class_of(x), Class::List);
    assert_eq!(st.display(x), "{3}");
}

#[test]
fn test_statement_rollback_stops_at_compile_sentinel() {
    let mut st = table();
    st.checkpoint(MarkKind::Statement);
    let outer = st.new_scalar(Number::Int32(1)).unwrap();
    st.enter_compile();
    let inner = st.new_scalar(Number::Int32(2)).unwrap();
    assert_eq!(st.context_of(inner), Some(Context::Compile(1)));

    st.rollback_to(MarkKind::Statement);
    assert_eq!(st.class_of(inner), Class::Scalar);
    assert_eq!(st.class_of(outer), Class::Scalar);

    st.leave_compile();
    assert_eq!(st.class_of(inner), Class::Unused);
    st.rollback_to(MarkKind::Statement);
    assert_eq!(st.class_of(outer), Class::Unused);
}

// ============================================
// Names
// ============================================

#[test]
fn test_same_name_in_two_contexts() {
    let mut st = table();
    let routine = st.declare_routine(RoutineKind::Function, "F", &[]).unwrap();
    let top = st.install(Namespace::Variable, "X", Context::TopLevel).unwrap();
    let local = st
        .install(Namespace::Variable, "X", Context::Owner(routine))
        .unwrap();

    assert_ne!(top, local);
    assert_eq!(st.lookup(Namespace::Variable, "x", Context::TopLevel), Some(top));
    assert_eq!(
        st.lookup(Namespace::Variable, "X", Context::Owner(routine)),
        Some(local)
    );
}

#[test]
fn test_routine_namespaces_are_separate() {
    let mut st = table();
    let f = st.declare_routine(RoutineKind::Function, "TWIN", &[]).unwrap();
    let s = st.declare_routine(RoutineKind::Subroutine, "TWIN", &[]).unwrap();
    assert_ne!(f, s);
    assert_eq!(st.find_routine(RoutineKind::Function, "twin"), Some(f));
    assert_eq!(st.find_routine(RoutineKind::Subroutine, "twin"), Some(s));
}

#[test]
fn test_zap_unlinks_name() {
    let mut st = table();
    let x = st.install_variable("GONE").unwrap();
    st.zap(x).unwrap();
    assert_eq!(st.find_variable("GONE"), None);
    assert_eq!(st.name_of(x), None);
}

// ============================================
// Conversion
// ============================================

#[test]
fn test_int32_through_double_is_exact() {
    let mut st = table();
    let v = st.new_scalar(Number::Int32(123_456_789)).unwrap();
    let d = st.convert(v, ElementType::Double, ConvertMode::Functional).unwrap();
    let back = st.convert(d, ElementType::Int32, ConvertMode::Functional).unwrap();
    assert_eq!(st.payload(back).unwrap(), &Payload::Scalar(Number::Int32(123_456_789)));
}

#[test]
fn test_int32_through_int8_truncates() {
    let mut st = table();
    let v = st.new_scalar(Number::Int32(300)).unwrap();
    let b = st.convert(v, ElementType::Int8, ConvertMode::Functional).unwrap();
    assert_eq!(st.payload(b).unwrap(), &Payload::Scalar(Number::Int8(44)));
    let back = st.convert(b, ElementType::Int32, ConvertMode::Functional).unwrap();
    assert_eq!(st.payload(back).unwrap(), &Payload::Scalar(Number::Int32(44)));
}

#[test]
fn test_in_place_conversion_of_named_value_fails() {
    let mut st = table();
    let x = st.install_variable("X").unwrap();
    let v = st.new_scalar(Number::Int32(5)).unwrap();
    st.replace(x, v).unwrap();
    let err = st.convert(x, ElementType::Float, ConvertMode::InPlace).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotTemporary);
}

// ============================================
// Exhaustion
// ============================================

#[test]
fn test_temp_range_exhaustion() {
    let config = Config {
        arena: ArenaConfig { temp_variables: 8, ..ArenaConfig::default() },
        ..Config::default()
    };
    let mut st = SymbolTable::new(&config);
    let free = 8 - st.arena().live(RangeKind::TempVariable).count();
    for i in 0..free {
        st.new_scalar(Number::Int64(i as i64)).unwrap();
    }

    let err = st.new_scalar(Number::Int64(-1)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AllocationExhausted(RangeKind::TempVariable));
    assert_eq!(st.arena().live(RangeKind::TempVariable).count(), 8);
}

#[test]
fn test_exhaustion_aborts_statement_only() {
    let config = Config {
        arena: ArenaConfig { temp_variables: 4, ..ArenaConfig::default() },
        ..Config::default()
    };
    let mut interp = Interpreter::capturing(&config);
    let err = interp.run_source("x = {1, 2, 3, 4, 5, 6}").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Runtime(ref e) if e.kind == ErrorKind::AllocationExhausted(RangeKind::TempVariable)
    ));

    interp.run_source("y = 2\nprint, y").unwrap();
    assert_eq!(interp.take_output(), vec!["2"]);
}

// ============================================
// Includes
// ============================================

#[test]
fn test_nested_include() {
    let dir = scratch_dir("include");
    std::fs::write(dir.join("leaf.lux"), "depth = 2\nprint, 'leaf'\n").unwrap();
    std::fs::write(dir.join("middle.lux"), "print, 'middle'\n@leaf\nprint, depth + 1\n").unwrap();

    let mut interp = Interpreter::capturing(&Config::default());
    interp.set_base_dir(&dir);
    interp.run_source("@middle\nprint, depth").unwrap();

    assert_eq!(interp.take_output(), vec!["middle", "leaf", "3", "2"]);
    let symbols = interp.symbols();
    assert_eq!(symbols.compile_depth(), 0);
    assert_eq!(free_temps(symbols), 0);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_include_is_io_error() {
    let mut interp = Interpreter::capturing(&Config::default());
    interp.set_base_dir(scratch_dir("missing"));
    let err = interp.run_source("@nowhere").unwrap_err();
    assert!(matches!(err, CompileError::Runtime(ref e) if e.kind == ErrorKind::IoError));
}

// ============================================
// Scripts
// ============================================

#[test]
fn test_script_arrays_and_routines() {
    let source = r#"
; running totals
func total(v)
  s = 0
  for i = 0, num_elem(v) - 1 do s = s + v(i)
  return, s
endfunc

x = indgen(5)
print, x * 2
print, total(x)
print, x(1:3)
"#;
    insta::assert_snapshot!(run(source).join("\n"), @r"
    [0, 2, 4, 6, 8]
    10
    [1, 2, 3]
    ");
}

#[test]
fn test_script_lists_and_strings() {
    let source = r#"
name = 'lux'
info = {lang: name, version: 1}
print, info
print, 'hello, ' + name
print, [1, 2] + 0.5
"#;
    insta::assert_snapshot!(run(source).join("\n"), @r"
    {LANG: lux, VERSION: 1}
    hello, lux
    [1.5, 2.5]
    ");
}

#[test]
fn test_script_leaves_no_temporaries() {
    let mut interp = Interpreter::capturing(&Config::default());
    interp
        .run_source("func f(n)\n  return, [n, n * 2]\nendfunc\nfor k = 1, 20 do y = f(k)\nprint, y")
        .unwrap();
    assert_eq!(interp.take_output(), vec!["[20, 40]"]);

    let symbols = interp.symbols();
    assert_eq!(free_temps(symbols), 0);
    assert_eq!(symbols.marks().len(), 0);

    // What is left belongs to the routine body
    let f = symbols.find_routine(RoutineKind::Function, "F").unwrap();
    for range in [RangeKind::TempVariable, RangeKind::TempExecutable] {
        for h in symbols.arena().live(range) {
            assert!(owned_by(symbols, h, f), "{h} is not part of F");
        }
    }
}
