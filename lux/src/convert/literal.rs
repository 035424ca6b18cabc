//! Numeric literal grammar
//!
//! ```text
//! literal   := sign? body imag?
//! body      := sexagesimal | float | integer
//! integer   := ("0x" hex | hex "X" | "0o" oct | oct "O" | dec) width?
//! width     := "B" | "W" | "L" | "Q"
//! float     := mantissa (("E" | "D") sign? digits)? "D"?
//! sexagesimal := number (":" number)+ "H"?
//! imag      := "I" | "J"
//! ```
//!
//! Letters are case-insensitive. Unsuffixed integers are int32 and promote
//! to int64 when they do not fit. A `D` anywhere in a float makes it double.
//! Text that does not match converts to zero.

use crate::symbol::{Complex, ElementType, Number};

/// Parses `text` with the literal grammar; malformed input yields int32 zero
pub fn parse_literal(text: &str) -> Number {
    parse(text.trim()).unwrap_or(Number::Int32(0))
}

fn parse(text: &str) -> Option<Number> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let upper = rest.to_ascii_uppercase();

    let (body, imaginary) = match upper.strip_suffix(['I', 'J']) {
        Some(body) => (body, true),
        None => (upper.as_str(), false),
    };
    if body.is_empty() {
        return None;
    }

    let value = if body.contains(':') {
        sexagesimal(body, negative)?
    } else if is_float(body) {
        float(body, negative)?
    } else {
        integer(body, negative)?
    };

    Some(if imaginary {
        let ty = value.element_type().complex_of();
        let magnitude = value.to_f64();
        match ty {
            ElementType::CDouble => Number::CDouble(Complex::new(0.0, magnitude)),
            _ => Number::CFloat(Complex::new(0.0, magnitude as f32)),
        }
    } else {
        value
    })
}

fn is_float(body: &str) -> bool {
    let stem = body.trim_end_matches(['B', 'W', 'L', 'Q']);
    if body.starts_with("0X") || body.starts_with("0O") || stem.ends_with(['X', 'O']) {
        return false;
    }
    let exponent = body.find('E').is_some_and(|i| {
        i > 0
            && body[i + 1..]
                .trim_start_matches(['+', '-'])
                .bytes()
                .all(|b| b.is_ascii_digit())
    });
    body.contains('.') || body.contains('D') || exponent
}

fn sexagesimal(body: &str, negative: bool) -> Option<Number> {
    let (body, hours) = match body.strip_suffix('H') {
        Some(b) => (b, true),
        None => (body, false),
    };
    let mut total = 0.0;
    let mut scale = 1.0;
    for part in body.split(':') {
        let v: f64 = part.parse().ok()?;
        total += v / scale;
        scale *= 60.0;
    }
    if hours {
        total *= 15.0;
    }
    Some(Number::Double(if negative { -total } else { total }))
}

fn float(body: &str, negative: bool) -> Option<Number> {
    let double = body.contains('D');
    let mut text = body.replace('D', "E");
    if text.ends_with('E') {
        text.pop();
    }
    let v: f64 = text.parse().ok()?;
    let v = if negative { -v } else { v };
    Some(if double {
        Number::Double(v)
    } else {
        Number::Float(v as f32)
    })
}

fn integer(body: &str, negative: bool) -> Option<Number> {
    let (digits, radix, width) = split_integer(body)?;
    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    let value = if negative {
        (magnitude as i64).wrapping_neg()
    } else {
        magnitude as i64
    };

    Some(match width {
        Some(ty) => Number::Int64(value).cast(ty),
        None => match i32::try_from(value) {
            Ok(v) => Number::Int32(v),
            Err(_) => Number::Int64(value),
        },
    })
}

/// Digits, radix and explicit width of an integer body
fn split_integer(body: &str) -> Option<(&str, u32, Option<ElementType>)> {
    let width_of = |c: char| match c {
        'B' => Some(ElementType::Int8),
        'W' => Some(ElementType::Int16),
        'L' => Some(ElementType::Int32),
        'Q' => Some(ElementType::Int64),
        _ => None,
    };

    if let Some(hex) = body.strip_prefix("0X") {
        // B is a hex digit, so the byte suffix is not available here
        return match hex.chars().last().filter(|&c| c != 'B').and_then(width_of) {
            Some(ty) => Some((&hex[..hex.len() - 1], 16, Some(ty))),
            None => Some((hex, 16, None)),
        };
    }
    if let Some(oct) = body.strip_prefix("0O") {
        return match oct.chars().last().and_then(width_of) {
            Some(ty) => Some((&oct[..oct.len() - 1], 8, Some(ty))),
            None => Some((oct, 8, None)),
        };
    }

    let (stem, width) = match body.chars().last().and_then(width_of) {
        Some(ty) => (&body[..body.len() - 1], Some(ty)),
        None => (body, None),
    };
    if let Some(hex) = stem.strip_suffix('X') {
        return Some((hex, 16, width));
    }
    if let Some(oct) = stem.strip_suffix('O') {
        return Some((oct, 8, width));
    }
    if stem.bytes().all(|b| b.is_ascii_digit()) {
        Some((stem, 10, width))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_integers() {
        assert_eq!(parse_literal("42"), Number::Int32(42));
        assert_eq!(parse_literal("-7"), Number::Int32(-7));
        assert_eq!(parse_literal("3000000000"), Number::Int64(3_000_000_000));
    }

    #[test]
    fn test_width_suffixes() {
        assert_eq!(parse_literal("300b"), Number::Int8(44));
        assert_eq!(parse_literal("12W"), Number::Int16(12));
        assert_eq!(parse_literal("5L"), Number::Int32(5));
        assert_eq!(parse_literal("5q"), Number::Int64(5));
    }

    #[test]
    fn test_radix_forms() {
        assert_eq!(parse_literal("0x1F"), Number::Int32(31));
        assert_eq!(parse_literal("1FX"), Number::Int32(31));
        assert_eq!(parse_literal("0xFFW"), Number::Int16(255));
        assert_eq!(parse_literal("17O"), Number::Int32(15));
        assert_eq!(parse_literal("0o17"), Number::Int32(15));
        assert_eq!(parse_literal("0x1B"), Number::Int32(27));
        assert_eq!(parse_literal("1DXB"), Number::Int8(29));
    }

    #[test]
    fn test_floats() {
        assert_eq!(parse_literal("1.5"), Number::Float(1.5));
        assert_eq!(parse_literal("2e3"), Number::Float(2000.0));
        assert_eq!(parse_literal("1.5D3"), Number::Double(1500.0));
        assert_eq!(parse_literal("1.5d"), Number::Double(1.5));
        assert_eq!(parse_literal(".25"), Number::Float(0.25));
    }

    #[test]
    fn test_sexagesimal() {
        assert_eq!(parse_literal("10:30"), Number::Double(10.5));
        assert_eq!(parse_literal("-2:15:00"), Number::Double(-2.25));
        assert_eq!(parse_literal("1:00:00H"), Number::Double(15.0));
    }

    #[test]
    fn test_imaginary() {
        assert_eq!(parse_literal("2i"), Number::CFloat(Complex::new(0.0, 2.0)));
        assert_eq!(parse_literal("1.5DJ"), Number::CDouble(Complex::new(0.0, 1.5)));
    }

    #[test]
    fn test_malformed_is_zero() {
        assert_eq!(parse_literal("abc"), Number::Int32(0));
        assert_eq!(parse_literal(""), Number::Int32(0));
        assert_eq!(parse_literal("1.2.3"), Number::Int32(0));
        assert_eq!(parse_literal("12Z"), Number::Int32(0));
    }
}
