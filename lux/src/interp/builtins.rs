//! Built-in routines.
//!
//! Each entry receives its arguments already evaluated (named variables are
//! passed as themselves) and returns a handle. Subroutines return the shared
//! zero constant. A built-in that writes into a named slot goes through
//! `replace`; temporaries it creates and does not return are zapped.

use super::Interpreter;
use super::error::{InterpResult, RuntimeError};
use crate::convert::{Arg, ConvertMode, sprintf};
use crate::symbol::{
    ArrayValue, Buffer, Class, ElementType, Elements, Handle, Number, Payload, normalize,
};

/// Builtin function type
pub type BuiltinFn = fn(&mut Interpreter, &[Handle]) -> InterpResult<Handle>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Subroutine,
    Function,
}

pub struct Builtin {
    pub name: &'static str,
    pub kind: BuiltinKind,
    pub func: BuiltinFn,
}

static BUILTINS: &[Builtin] = &[
    Builtin { name: "PRINT", kind: BuiltinKind::Subroutine, func: builtin_print },
    Builtin { name: "TYPE", kind: BuiltinKind::Subroutine, func: builtin_type },
    Builtin { name: "DELETE", kind: BuiltinKind::Subroutine, func: builtin_delete },
    Builtin { name: "INT8", kind: BuiltinKind::Function, func: builtin_int8 },
    Builtin { name: "INT16", kind: BuiltinKind::Function, func: builtin_int16 },
    Builtin { name: "INT32", kind: BuiltinKind::Function, func: builtin_int32 },
    Builtin { name: "INT64", kind: BuiltinKind::Function, func: builtin_int64 },
    Builtin { name: "FLOAT", kind: BuiltinKind::Function, func: builtin_float },
    Builtin { name: "DOUBLE", kind: BuiltinKind::Function, func: builtin_double },
    Builtin { name: "CFLOAT", kind: BuiltinKind::Function, func: builtin_cfloat },
    Builtin { name: "CDOUBLE", kind: BuiltinKind::Function, func: builtin_cdouble },
    Builtin { name: "STRING", kind: BuiltinKind::Function, func: builtin_string },
    Builtin { name: "NUM_ELEM", kind: BuiltinKind::Function, func: builtin_num_elem },
    Builtin { name: "CONCAT", kind: BuiltinKind::Function, func: builtin_concat },
    Builtin { name: "INDGEN", kind: BuiltinKind::Function, func: builtin_indgen },
];

/// Index of the built-in `name` of the given kind
pub fn find(name: &str, kind: BuiltinKind) -> Option<usize> {
    let key = normalize(name);
    BUILTINS.iter().position(|b| b.kind == kind && b.name == key)
}

pub fn name(index: usize) -> &'static str {
    BUILTINS.get(index).map_or("<builtin?>", |b| b.name)
}

pub fn call(interp: &mut Interpreter, index: usize, args: &[Handle]) -> InterpResult<Handle> {
    match BUILTINS.get(index) {
        Some(builtin) => (builtin.func)(interp, args),
        None => Err(RuntimeError::undefined_function(&format!("builtin {index}"))),
    }
}

/// `value` itself, or an error naming it when it holds nothing
fn defined(interp: &Interpreter, value: Handle) -> InterpResult<Handle> {
    let symbols = interp.symbols();
    match symbols.class_of(value) {
        Class::Undefined => Err(RuntimeError::undefined_variable(
            symbols.name_of(value).unwrap_or("<anonymous>"),
        )),
        Class::Unused => Err(RuntimeError::invalid_handle(value)),
        _ => Ok(value),
    }
}

fn zero(interp: &Interpreter) -> Handle {
    interp.symbols().constants().zero
}

fn expect_args(name: &str, args: &[Handle], min: usize, max: usize) -> InterpResult<()> {
    if args.len() < min || args.len() > max {
        return Err(RuntimeError::arity_mismatch(name, max, args.len()));
    }
    Ok(())
}

// ============================================================================
// Subroutines
// ============================================================================

fn builtin_print(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    let mut parts = Vec::with_capacity(args.len());
    for &arg in args {
        let value = defined(interp, arg)?;
        parts.push(interp.symbols().display(value));
    }
    interp.emit(parts.join(" "));
    Ok(zero(interp))
}

/// Describes each argument: handle, name, class, type and value
fn builtin_type(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    for &arg in args {
        let line = interp.symbols().describe(arg);
        interp.emit(line);
    }
    Ok(zero(interp))
}

fn builtin_delete(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    for &arg in args {
        let symbols = interp.symbols_mut();
        if !symbols.is_named(arg) && !symbols.is_constant(arg) {
            return Err(RuntimeError::type_error(
                "named variable",
                symbols.class_of(arg).name(),
            ));
        }
        symbols.undefine(arg)?;
    }
    Ok(zero(interp))
}

// ============================================================================
// Conversion functions
// ============================================================================

fn to_type(interp: &mut Interpreter, args: &[Handle], ty: ElementType) -> InterpResult<Handle> {
    expect_args(ty.name(), args, 1, 1)?;
    let value = defined(interp, args[0])?;
    interp.symbols_mut().convert(value, ty, ConvertMode::Functional)
}

fn builtin_int8(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::Int8)
}

fn builtin_int16(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::Int16)
}

fn builtin_int32(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::Int32)
}

fn builtin_int64(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::Int64)
}

fn builtin_float(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::Float)
}

fn builtin_double(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::Double)
}

fn builtin_cfloat(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::CFloat)
}

fn builtin_cdouble(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    to_type(interp, args, ElementType::CDouble)
}

/// string(x) uses the configured patterns; string(x, pattern) formats each
/// element with a printf pattern
fn builtin_string(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    expect_args("STRING", args, 1, 2)?;
    let value = defined(interp, args[0])?;
    let Some(&pattern) = args.get(1) else {
        return to_type(interp, &args[..1], ElementType::String);
    };
    let pattern = match interp.symbols().payload(defined(interp, pattern)?)? {
        Payload::String(p) => p.clone(),
        other => return Err(RuntimeError::type_error("format string", other.class().name())),
    };

    let symbols = interp.symbols_mut();
    match symbols.payload(value)? {
        Payload::Scalar(n) | Payload::ComplexScalar(n) => {
            let text = sprintf(&pattern, number_arg(*n));
            symbols.new_string(text)
        }
        Payload::String(s) => {
            let text = sprintf(&pattern, Arg::Str(s));
            symbols.new_string(text)
        }
        Payload::Array(a) | Payload::ComplexArray(a) => {
            let items: Vec<String> = match &a.elements {
                Elements::Numeric(b) => b.iter().map(|n| sprintf(&pattern, number_arg(n))).collect(),
                Elements::Text(t) => t.iter().map(|s| sprintf(&pattern, Arg::Str(s))).collect(),
            };
            let dims = a.dims.clone();
            symbols.new_text_array(dims, items)
        }
        other => Err(RuntimeError::type_error("numeric or string value", other.class().name())),
    }
}

fn number_arg(n: Number) -> Arg<'static> {
    if n.element_type().is_integer() {
        Arg::Int(n.to_i64())
    } else {
        Arg::Float(n.to_f64())
    }
}

// ============================================================================
// Array functions
// ============================================================================

/// Element count; zero for an undefined variable
fn builtin_num_elem(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    expect_args("NUM_ELEM", args, 1, 1)?;
    let count = match interp.symbols().get(args[0]).map(|r| &r.payload) {
        None | Some(Payload::Undefined) => 0,
        Some(Payload::Array(a) | Payload::ComplexArray(a)) => a.len(),
        Some(Payload::List(entries)) => entries.len(),
        Some(Payload::CompactList(items)) => items.len(),
        Some(Payload::Struct(fields)) => fields.len(),
        Some(_) => 1,
    };
    let count = i32::try_from(count).map_or(Number::Int64(count as i64), Number::Int32);
    interp.symbols_mut().new_scalar(count)
}

/// `[a, b, ...]`: flattens scalars and arrays into one 1-D array of the
/// combined element type
fn builtin_concat(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    let mut numbers = Vec::new();
    let mut texts = Vec::new();
    let mut ty: Option<ElementType> = None;

    for &arg in args {
        let value = defined(interp, arg)?;
        match interp.symbols().payload(value)? {
            Payload::Scalar(n) | Payload::ComplexScalar(n) => {
                ty = Some(ty.map_or(n.element_type(), |t| t.combine(n.element_type())));
                numbers.push(*n);
            }
            Payload::String(s) => texts.push(s.clone()),
            Payload::Array(a) | Payload::ComplexArray(a) => match &a.elements {
                Elements::Numeric(b) => {
                    let t = b.element_type();
                    ty = Some(ty.map_or(t, |acc| acc.combine(t)));
                    numbers.extend(b.iter());
                }
                Elements::Text(t) => texts.extend(t.iter().cloned()),
            },
            other => return Err(RuntimeError::type_error("scalar or array", other.class().name())),
        }
    }

    let symbols = interp.symbols_mut();
    match (ty, texts.is_empty()) {
        (Some(_), false) => Err(RuntimeError::type_error("elements of one kind", "strings and numbers")),
        (Some(ty), true) => {
            let values: Vec<Number> = numbers.into_iter().map(|n| n.cast(ty)).collect();
            symbols.new_array_from(ArrayValue {
                dims: vec![values.len()],
                elements: Elements::Numeric(Buffer::from_numbers(ty, &values)),
            })
        }
        (None, false) => symbols.new_text_array(vec![texts.len()], texts),
        (None, true) => Err(RuntimeError::type_error("array elements", "nothing")),
    }
}

/// indgen(n): int32 array 0, 1, ..., n-1
fn builtin_indgen(interp: &mut Interpreter, args: &[Handle]) -> InterpResult<Handle> {
    expect_args("INDGEN", args, 1, 1)?;
    let value = defined(interp, args[0])?;
    let n = match interp.symbols().payload(value)? {
        Payload::Scalar(n) => n.to_i64(),
        other => return Err(RuntimeError::type_error("scalar", other.class().name())),
    };
    let len = usize::try_from(n).map_err(|_| RuntimeError::index_out_of_bounds(n, 0))?;
    let values: Vec<Number> = (0..len).map(|i| Number::Int64(i as i64).cast(ElementType::Int32)).collect();
    interp.symbols_mut().new_array_from(ArrayValue {
        dims: vec![len],
        elements: Elements::Numeric(Buffer::from_numbers(ElementType::Int32, &values)),
    })
}
