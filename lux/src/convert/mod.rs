//! Type conversion engine
//!
//! Converts scalar, string and array payloads between the numeric element
//! types and text. Numeric arrays are converted inside their own byte
//! allocation whenever the target element is no wider than the source.

pub mod format;
pub mod literal;

pub use format::{Arg, format_number, format_text, sprintf};
pub use literal::parse_literal;

use crate::config::FormatConfig;
use crate::interp::error::{InterpResult, RuntimeError};
use crate::symbol::{ArrayValue, Buffer, ElementType, Elements, Handle, Payload, Reuse, SymbolTable};

/// How [`SymbolTable::convert`] treats its operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertMode {
    /// Convert the operand itself; named values are refused
    InPlace,
    /// Convert a free temporary in place, otherwise convert a copy
    Functional,
}

impl SymbolTable {
    /// Converts `handle` to `target` and returns the handle holding the result
    pub fn convert(
        &mut self,
        handle: Handle,
        target: ElementType,
        mode: ConvertMode,
    ) -> InterpResult<Handle> {
        let class = self.record(handle)?.class();
        if !class.is_numeric_or_text() {
            return Err(RuntimeError::type_error("numeric or string value", class.name()));
        }

        let subject = match mode {
            ConvertMode::InPlace => {
                if !self.range_of(handle).is_some_and(|r| r.is_temporary()) {
                    return Err(RuntimeError::not_temporary(handle));
                }
                handle
            }
            ConvertMode::Functional if self.is_free_temp(handle) => handle,
            ConvertMode::Functional => self.copy(handle)?,
        };

        let formats = self.formats().clone();
        let record = self
            .get_mut(subject)
            .ok_or_else(|| RuntimeError::invalid_handle(subject))?;
        let payload = std::mem::replace(&mut record.payload, Payload::Undefined);
        let (payload, reuse) = convert_payload(payload, target, &formats);
        record.payload = payload;
        if let Some(reuse) = reuse {
            log::trace!("converted {subject} to {target} ({reuse:?})");
        }
        Ok(subject)
    }
}

/// Converts a numeric or text payload; other payloads come back unchanged.
/// Reports how a numeric array buffer was treated.
pub fn convert_payload(
    payload: Payload,
    target: ElementType,
    formats: &FormatConfig,
) -> (Payload, Option<Reuse>) {
    match payload {
        Payload::Scalar(n) | Payload::ComplexScalar(n) => {
            let converted = if target == ElementType::String {
                Payload::String(format_number(n, formats))
            } else {
                Payload::scalar(n.cast(target))
            };
            (converted, None)
        }
        Payload::String(text) => {
            let converted = if target == ElementType::String {
                Payload::String(format_text(&text, formats))
            } else {
                Payload::scalar(parse_literal(&text).cast(target))
            };
            (converted, None)
        }
        Payload::Array(array) | Payload::ComplexArray(array) => {
            let (array, reuse) = convert_array(array, target, formats);
            (Payload::array(array), reuse)
        }
        other => (other, None),
    }
}

fn convert_array(
    array: ArrayValue,
    target: ElementType,
    formats: &FormatConfig,
) -> (ArrayValue, Option<Reuse>) {
    let ArrayValue { dims, elements } = array;
    let (elements, reuse) = match (elements, target) {
        (Elements::Numeric(buffer), ElementType::String) => {
            let text = buffer.iter().map(|n| format_number(n, formats)).collect();
            (Elements::Text(text), None)
        }
        (Elements::Numeric(mut buffer), _) => {
            let reuse = buffer.convert(target);
            (Elements::Numeric(buffer), Some(reuse))
        }
        (Elements::Text(text), ElementType::String) => {
            let text = text.iter().map(|s| format_text(s, formats)).collect();
            (Elements::Text(text), None)
        }
        (Elements::Text(text), _) => {
            let values: Vec<_> = text.iter().map(|s| parse_literal(s)).collect();
            (Elements::Numeric(Buffer::from_numbers(target, &values)), None)
        }
    };
    (ArrayValue { dims, elements }, reuse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::interp::error::ErrorKind;
    use crate::symbol::{Class, Complex, Number};

    fn table() -> SymbolTable {
        SymbolTable::new(&Config::default())
    }

    #[test]
    fn test_scalar_truncation() {
        let mut st = table();
        let h = st.new_scalar(Number::Double(-3.9)).unwrap();
        let out = st.convert(h, ElementType::Int32, ConvertMode::Functional).unwrap();
        assert_eq!(out, h);
        assert_eq!(st.payload(h).unwrap(), &Payload::Scalar(Number::Int32(-3)));
    }

    #[test]
    fn test_named_source_is_copied_in_functional_mode() {
        let mut st = table();
        let x = st.install_variable("X").unwrap();
        let v = st.new_scalar(Number::Int32(300)).unwrap();
        st.replace(x, v).unwrap();
        let out = st.convert(x, ElementType::Int8, ConvertMode::Functional).unwrap();
        assert_ne!(out, x);
        assert_eq!(st.payload(out).unwrap(), &Payload::Scalar(Number::Int8(44)));
        assert_eq!(st.payload(x).unwrap(), &Payload::Scalar(Number::Int32(300)));
    }

    #[test]
    fn test_string_target_applies_string_pattern() {
        let mut st = table();
        st.set_formats(FormatConfig { string: "<%s>".into(), ..FormatConfig::default() });
        let s = st.new_string("ab".into()).unwrap();
        let out = st.convert(s, ElementType::String, ConvertMode::Functional).unwrap();
        assert_eq!(st.payload(out).unwrap(), &Payload::String("<ab>".into()));

        let arr = st.new_text_array(vec![2], vec!["x".into(), "y".into()]).unwrap();
        let out = st.convert(arr, ElementType::String, ConvertMode::Functional).unwrap();
        assert_eq!(st.display(out), "[<x>, <y>]");
    }

    #[test]
    fn test_in_place_refuses_named() {
        let mut st = table();
        let x = st.install_variable("X").unwrap();
        let v = st.new_scalar(Number::Int32(1)).unwrap();
        st.replace(x, v).unwrap();
        let err = st.convert(x, ElementType::Float, ConvertMode::InPlace).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotTemporary);
    }

    #[test]
    fn test_string_round_trip_through_literal_grammar() {
        let mut st = table();
        let s = st.new_string("1.5D3".into()).unwrap();
        st.convert(s, ElementType::Double, ConvertMode::InPlace).unwrap();
        assert_eq!(st.payload(s).unwrap(), &Payload::Scalar(Number::Double(1500.0)));
        st.convert(s, ElementType::String, ConvertMode::InPlace).unwrap();
        assert_eq!(st.payload(s).unwrap(), &Payload::String("1500".into()));
    }

    #[test]
    fn test_complex_to_real_and_back() {
        let mut st = table();
        let c = st.new_scalar(Number::CFloat(Complex::new(2.0, 5.0))).unwrap();
        st.convert(c, ElementType::Float, ConvertMode::InPlace).unwrap();
        assert_eq!(st.class_of(c), Class::Scalar);
        st.convert(c, ElementType::CDouble, ConvertMode::InPlace).unwrap();
        assert_eq!(
            st.payload(c).unwrap(),
            &Payload::ComplexScalar(Number::CDouble(Complex::new(2.0, 0.0)))
        );
    }

    #[test]
    fn test_array_to_string_and_class_change() {
        let mut st = table();
        let buffer = Buffer::from_numbers(ElementType::Int16, &[Number::Int16(1), Number::Int16(-2)]);
        let a = st
            .new_array_from(ArrayValue { dims: vec![2], elements: Elements::Numeric(buffer) })
            .unwrap();
        let text = st.convert(a, ElementType::String, ConvertMode::Functional).unwrap();
        let Payload::Array(value) = st.payload(text).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(value.elements, Elements::Text(vec!["1".into(), "-2".into()]));

        let c = st.convert(a, ElementType::CFloat, ConvertMode::Functional).unwrap();
        assert_eq!(st.class_of(c), Class::ComplexArray);
    }

    #[test]
    fn test_routines_are_not_convertible() {
        let mut st = table();
        let f = st
            .declare_routine(crate::symbol::RoutineKind::Function, "F", &[])
            .unwrap();
        let err = st.convert(f, ElementType::Int32, ConvertMode::Functional).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
    }
}
