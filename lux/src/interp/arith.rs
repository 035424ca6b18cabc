//! Binary operators on evaluated values.
//!
//! Both operands are converted to the combined element type, scalars are
//! broadcast against arrays, and the operator is applied element-wise.
//! Comparisons yield int32 0 or 1.

use super::error::{InterpResult, RuntimeError};
use crate::convert::ConvertMode;
use crate::symbol::{
    ArrayValue, BinOp, Buffer, Class, Complex, ElementType, Elements, Handle, Number, Payload,
    SymbolTable,
};

/// Numeric operand after conversion
enum Operand {
    Scalar(Number),
    Array(Vec<usize>, Vec<Number>),
}

pub fn binary(st: &mut SymbolTable, op: BinOp, lhs: Handle, rhs: Handle) -> InterpResult<Handle> {
    let (lc, rc) = (st.class_of(lhs), st.class_of(rhs));
    if lc == Class::String || rc == Class::String {
        return text_binary(st, op, lhs, rhs);
    }

    let lt = numeric_type(st, lhs)?;
    let rt = numeric_type(st, rhs)?;
    let ty = lt.combine(rt);

    let l = st.convert(lhs, ty, ConvertMode::Functional)?;
    let r = st.convert(rhs, ty, ConvertMode::Functional)?;
    let left = operand(st, l)?;
    let right = operand(st, r)?;
    release(st, l, lhs);
    release(st, r, rhs);

    let out_ty = if op.is_comparison() { ElementType::Int32 } else { ty };
    match (left, right) {
        (Operand::Scalar(a), Operand::Scalar(b)) => st.new_scalar(apply(op, ty, a, b)?),
        (Operand::Array(dims, a), Operand::Scalar(b)) => {
            let values = a.into_iter().map(|x| apply(op, ty, x, b)).collect::<InterpResult<Vec<_>>>()?;
            new_numeric_array(st, out_ty, dims, &values)
        }
        (Operand::Scalar(a), Operand::Array(dims, b)) => {
            let values = b.into_iter().map(|y| apply(op, ty, a, y)).collect::<InterpResult<Vec<_>>>()?;
            new_numeric_array(st, out_ty, dims, &values)
        }
        (Operand::Array(dims, a), Operand::Array(_, b)) => {
            if a.len() != b.len() {
                return Err(RuntimeError::type_error(
                    &format!("array of {} elements", a.len()),
                    &format!("array of {} elements", b.len()),
                ));
            }
            let values = a
                .into_iter()
                .zip(b)
                .map(|(x, y)| apply(op, ty, x, y))
                .collect::<InterpResult<Vec<_>>>()?;
            new_numeric_array(st, out_ty, dims, &values)
        }
    }
}

/// Zaps a conversion copy once its numbers have been read
fn release(st: &mut SymbolTable, converted: Handle, original: Handle) {
    if converted != original {
        if let Err(e) = st.zap(converted) {
            log::warn!("could not release operand copy: {e}");
        }
    }
}

fn numeric_type(st: &SymbolTable, h: Handle) -> InterpResult<ElementType> {
    let record = st.record(h)?;
    match record.class() {
        Class::Scalar | Class::ComplexScalar | Class::Array | Class::ComplexArray => {
            match record.element_type() {
                Some(ty) if ty.is_numeric() => Ok(ty),
                _ => Err(RuntimeError::type_error("numeric value", "string array")),
            }
        }
        other => Err(RuntimeError::type_error("numeric value", other.name())),
    }
}

fn operand(st: &SymbolTable, h: Handle) -> InterpResult<Operand> {
    match st.payload(h)? {
        Payload::Scalar(n) | Payload::ComplexScalar(n) => Ok(Operand::Scalar(*n)),
        Payload::Array(a) | Payload::ComplexArray(a) => match &a.elements {
            Elements::Numeric(b) => Ok(Operand::Array(a.dims.clone(), b.iter().collect())),
            Elements::Text(_) => Err(RuntimeError::type_error("numeric value", "string array")),
        },
        other => Err(RuntimeError::type_error("numeric value", other.class().name())),
    }
}

fn new_numeric_array(
    st: &mut SymbolTable,
    ty: ElementType,
    dims: Vec<usize>,
    values: &[Number],
) -> InterpResult<Handle> {
    st.new_array_from(ArrayValue {
        dims,
        elements: Elements::Numeric(Buffer::from_numbers(ty, values)),
    })
}

/// String concatenation and comparison
fn text_binary(st: &mut SymbolTable, op: BinOp, lhs: Handle, rhs: Handle) -> InterpResult<Handle> {
    for h in [lhs, rhs] {
        let class = st.class_of(h);
        if !matches!(class, Class::String | Class::Scalar | Class::ComplexScalar) {
            return Err(RuntimeError::type_error("string or scalar", class.name()));
        }
    }
    let (a, b) = (st.display(lhs), st.display(rhs));
    match op {
        BinOp::Add => st.new_string(a + &b),
        BinOp::Eq => st.new_scalar(Number::Int32(i32::from(a == b))),
        BinOp::Ne => st.new_scalar(Number::Int32(i32::from(a != b))),
        BinOp::Lt => st.new_scalar(Number::Int32(i32::from(a < b))),
        BinOp::Le => st.new_scalar(Number::Int32(i32::from(a <= b))),
        BinOp::Gt => st.new_scalar(Number::Int32(i32::from(a > b))),
        BinOp::Ge => st.new_scalar(Number::Int32(i32::from(a >= b))),
        BinOp::Sub | BinOp::Mul | BinOp::Div => {
            Err(RuntimeError::type_error("numeric value", Class::String.name()))
        }
    }
}

/// One element: `a op b` with both already of type `ty`
fn apply(op: BinOp, ty: ElementType, a: Number, b: Number) -> InterpResult<Number> {
    if op.is_comparison() {
        return Ok(Number::Int32(i32::from(compare(op, ty, a, b))));
    }
    if ty.is_complex() {
        let x = (a.to_f64(), a.imaginary());
        let y = (b.to_f64(), b.imaginary());
        let (re, im) = match op {
            BinOp::Add => (x.0 + y.0, x.1 + y.1),
            BinOp::Sub => (x.0 - y.0, x.1 - y.1),
            BinOp::Mul => (x.0 * y.0 - x.1 * y.1, x.0 * y.1 + x.1 * y.0),
            _ => {
                let denom = y.0 * y.0 + y.1 * y.1;
                ((x.0 * y.0 + x.1 * y.1) / denom, (x.1 * y.0 - x.0 * y.1) / denom)
            }
        };
        return Ok(Number::CDouble(Complex::new(re, im)).cast(ty));
    }
    if ty.is_integer() {
        let (x, y) = (a.to_i64(), b.to_i64());
        let v = match op {
            BinOp::Add => x.wrapping_add(y),
            BinOp::Sub => x.wrapping_sub(y),
            BinOp::Mul => x.wrapping_mul(y),
            _ => {
                if y == 0 {
                    return Err(RuntimeError::division_by_zero());
                }
                x.wrapping_div(y)
            }
        };
        return Ok(Number::Int64(v).cast(ty));
    }
    let (x, y) = (a.to_f64(), b.to_f64());
    let v = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        _ => x / y,
    };
    Ok(Number::Double(v).cast(ty))
}

/// Ordering uses real parts; equality looks at both parts
fn compare(op: BinOp, ty: ElementType, a: Number, b: Number) -> bool {
    if ty.is_integer() {
        let (x, y) = (a.to_i64(), b.to_i64());
        return match op {
            BinOp::Eq => x == y,
            BinOp::Ne => x != y,
            BinOp::Lt => x < y,
            BinOp::Le => x <= y,
            BinOp::Gt => x > y,
            _ => x >= y,
        };
    }
    let (x, y) = (a.to_f64(), b.to_f64());
    let same_imaginary = a.imaginary() == b.imaginary();
    match op {
        BinOp::Eq => x == y && same_imaginary,
        BinOp::Ne => x != y || !same_imaginary,
        BinOp::Lt => x < y,
        BinOp::Le => x <= y,
        BinOp::Gt => x > y,
        _ => x >= y,
    }
}
