//! printf-style formatting of numbers and strings

use crate::config::FormatConfig;
use crate::symbol::Number;

/// Widest field width or precision a directive may ask for
const MAX_FIELD: usize = 512;

/// Value handed to a conversion directive
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Int(i64),
    Float(f64),
    Str(&'a str),
}

impl Arg<'_> {
    fn as_i64(self) -> i64 {
        match self {
            Arg::Int(v) => v,
            Arg::Float(v) => v as i64,
            Arg::Str(_) => 0,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Arg::Int(v) => v as f64,
            Arg::Float(v) => v,
            Arg::Str(_) => 0.0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Directive {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: usize,
    precision: Option<usize>,
}

/// Expands every directive in `pattern` with `arg`. `%%` is a literal
/// percent; unknown directives are copied through.
pub fn sprintf(pattern: &str, arg: Arg<'_>) -> String {
    let mut out = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '%'))) {
            chars.next();
            out.push('%');
            continue;
        }

        let mut directive = Directive::default();
        while let Some(&(_, flag)) = chars.peek() {
            match flag {
                '-' => directive.left = true,
                '+' => directive.plus = true,
                ' ' => directive.space = true,
                '0' => directive.zero = true,
                '#' => directive.alt = true,
                _ => break,
            }
            chars.next();
        }
        directive.width = digits(&mut chars);
        if matches!(chars.peek(), Some((_, '.'))) {
            chars.next();
            directive.precision = Some(digits(&mut chars));
        }
        // Length modifiers carry no meaning here
        while matches!(chars.peek(), Some((_, 'l' | 'h' | 'L' | 'q'))) {
            chars.next();
        }

        let rendered = chars
            .peek()
            .copied()
            .and_then(|(_, conv)| render(conv, directive, arg));
        match rendered {
            Some(text) => {
                chars.next();
                out.push_str(&text);
            }
            None => {
                // Unknown or missing conversion: copy the directive through
                let end = match chars.next() {
                    Some((i, conv)) => i + conv.len_utf8(),
                    None => pattern.len(),
                };
                out.push_str(&pattern[at..end]);
            }
        }
    }
    out
}

/// Decimal digits at the cursor; saturates instead of overflowing
fn digits(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> usize {
    let mut value: usize = 0;
    while let Some(d) = chars.peek().and_then(|&(_, c)| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(d as usize);
        chars.next();
    }
    value.min(MAX_FIELD)
}

fn render(conv: char, directive: Directive, arg: Arg<'_>) -> Option<String> {
    let text = match conv {
        'd' | 'i' | 'u' => {
            let v = arg.as_i64();
            let mut digits = v.unsigned_abs().to_string();
            if let Some(p) = directive.precision {
                digits = format!("{digits:0>p$}");
            }
            return Some(pad_number(sign(v < 0, directive), &digits, directive, directive.precision.is_none()));
        }
        'o' => {
            let digits = format!("{:o}", arg.as_i64());
            let prefix = if directive.alt { "0" } else { "" };
            return Some(pad_number(prefix, &digits, directive, true));
        }
        'x' | 'X' => {
            let mut digits = format!("{:x}", arg.as_i64());
            if conv == 'X' {
                digits = digits.to_uppercase();
            }
            let prefix = match (directive.alt, conv) {
                (true, 'x') => "0x",
                (true, _) => "0X",
                _ => "",
            };
            return Some(pad_number(prefix, &digits, directive, true));
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let v = arg.as_f64();
            let body = if v.is_finite() {
                let precision = directive.precision.unwrap_or(6);
                match conv {
                    'f' | 'F' => format!("{:.*}", precision, v.abs()),
                    'e' | 'E' => exponential(v.abs(), precision, conv == 'E'),
                    _ => general(v.abs(), precision, conv == 'G', directive.alt),
                }
            } else if v.is_nan() {
                "nan".to_string()
            } else {
                "inf".to_string()
            };
            let negative = v.is_sign_negative() && !v.is_nan();
            return Some(pad_number(sign(negative, directive), &body, directive, v.is_finite()));
        }
        's' => {
            let s = match arg {
                Arg::Str(s) => s.to_string(),
                Arg::Int(v) => v.to_string(),
                Arg::Float(v) => general(v, 6, false, false),
            };
            match directive.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            }
        }
        'c' => match arg {
            Arg::Str(s) => s.chars().next().map(String::from).unwrap_or_default(),
            other => char::from_u32(other.as_i64() as u32)
                .map(String::from)
                .unwrap_or_default(),
        },
        _ => return None,
    };
    Some(pad(text, directive))
}

fn sign(negative: bool, directive: Directive) -> &'static str {
    if negative {
        "-"
    } else if directive.plus {
        "+"
    } else if directive.space {
        " "
    } else {
        ""
    }
}

/// Pads a signed numeric body; zero padding goes between sign and digits
fn pad_number(prefix: &str, body: &str, directive: Directive, zero_ok: bool) -> String {
    let len = prefix.len() + body.chars().count();
    if directive.zero && !directive.left && zero_ok && len < directive.width {
        format!("{prefix}{}{body}", "0".repeat(directive.width - len))
    } else {
        pad(format!("{prefix}{body}"), directive)
    }
}

fn pad(text: String, directive: Directive) -> String {
    let len = text.chars().count();
    if len >= directive.width {
        text
    } else if directive.left {
        format!("{text}{}", " ".repeat(directive.width - len))
    } else {
        format!("{}{text}", " ".repeat(directive.width - len))
    }
}

/// `%e` body for a non-negative finite value: mantissa, `e`, sign, two or
/// more exponent digits
fn exponential(v: f64, precision: usize, upper: bool) -> String {
    let rust = format!("{:.*e}", precision, v);
    let (mantissa, exp) = rust.split_once('e').unwrap_or((rust.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{exp:+03}")
}

/// `%g` body for a non-negative finite value
fn general(v: f64, precision: usize, upper: bool, keep_zeros: bool) -> String {
    let p = precision.max(1);
    let exp = if v == 0.0 {
        0
    } else {
        let rust = format!("{:.*e}", p - 1, v);
        rust.split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };

    if exp < -4 || exp >= p as i32 {
        let s = exponential(v, p - 1, upper);
        if keep_zeros {
            s
        } else {
            let (mantissa, tail) = s.split_at(s.find(['e', 'E']).unwrap_or(s.len()));
            format!("{}{tail}", strip_zeros(mantissa))
        }
    } else {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        let s = format!("{:.*}", decimals, v);
        if keep_zeros { s } else { strip_zeros(&s).to_string() }
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Text of one number using the configured family pattern
pub fn format_number(value: Number, formats: &FormatConfig) -> String {
    match value {
        Number::Int8(_) | Number::Int16(_) | Number::Int32(_) | Number::Int64(_) => {
            sprintf(&formats.integer, Arg::Int(value.to_i64()))
        }
        Number::Float(_) | Number::Double(_) => sprintf(&formats.float, Arg::Float(value.to_f64())),
        Number::CFloat(_) | Number::CDouble(_) => {
            let re = sprintf(&formats.complex, Arg::Float(value.to_f64()));
            let im = value.imaginary();
            let sign = if im < 0.0 { '-' } else { '+' };
            let im = sprintf(&formats.complex, Arg::Float(im.abs()));
            format!("{re}{sign}{}i", im.trim_start())
        }
    }
}

/// Text through the configured string pattern
pub fn format_text(text: &str, formats: &FormatConfig) -> String {
    sprintf(&formats.string, Arg::Str(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_directives() {
        assert_eq!(sprintf("%d", Arg::Int(42)), "42");
        assert_eq!(sprintf("%5d|", Arg::Int(-42)), "  -42|");
        assert_eq!(sprintf("%-5d|", Arg::Int(7)), "7    |");
        assert_eq!(sprintf("%05d", Arg::Int(-42)), "-0042");
        assert_eq!(sprintf("%+d", Arg::Int(3)), "+3");
        assert_eq!(sprintf("%x %X %o", Arg::Int(255)), "ff FF 377");
        assert_eq!(sprintf("%#x", Arg::Int(255)), "0xff");
    }

    #[test]
    fn test_float_directives() {
        assert_eq!(sprintf("%f", Arg::Float(1.5)), "1.500000");
        assert_eq!(sprintf("%.2f", Arg::Float(-3.14159)), "-3.14");
        assert_eq!(sprintf("%e", Arg::Float(1500.0)), "1.500000e+03");
        assert_eq!(sprintf("%.2E", Arg::Float(0.000123)), "1.23E-04");
    }

    #[test]
    fn test_general_directive() {
        assert_eq!(sprintf("%g", Arg::Float(100000.0)), "100000");
        assert_eq!(sprintf("%g", Arg::Float(1000000.0)), "1e+06");
        assert_eq!(sprintf("%g", Arg::Float(0.0001)), "0.0001");
        assert_eq!(sprintf("%g", Arg::Float(0.00001)), "1e-05");
        assert_eq!(sprintf("%.7g", Arg::Float(3.5)), "3.5");
        assert_eq!(sprintf("%.7g", Arg::Float(f64::from(0.1f32))), "0.1");
        assert_eq!(sprintf("%g", Arg::Float(0.0)), "0");
        assert_eq!(sprintf("%g", Arg::Float(-2.5)), "-2.5");
    }

    #[test]
    fn test_literal_text_and_percent() {
        assert_eq!(sprintf("x=%d%%", Arg::Int(5)), "x=5%");
        assert_eq!(sprintf("[%s]", Arg::Str("abc")), "[abc]");
        assert_eq!(sprintf("%.2s", Arg::Str("abc")), "ab");
        assert_eq!(sprintf("%q", Arg::Int(1)), "%q");
        assert_eq!(sprintf("%5lq!", Arg::Int(1)), "%5lq!");
        assert_eq!(sprintf("n=%l", Arg::Int(1)), "n=%l");
        assert_eq!(sprintf("%y", Arg::Int(1)), "%y");
        assert_eq!(sprintf("%ld", Arg::Int(3)), "3");
    }

    #[test]
    fn test_huge_width_is_capped() {
        let text = sprintf("%99999999999999999999999d", Arg::Int(1));
        assert_eq!(text.len(), MAX_FIELD);
        assert!(text.ends_with('1'));
        assert_eq!(sprintf("%.99999999999999999999999s", Arg::Str("ab")), "ab");
    }

    #[test]
    fn test_format_number_families() {
        let f = FormatConfig::default();
        assert_eq!(format_number(Number::Int8(200), &f), "200");
        assert_eq!(format_number(Number::Int32(-7), &f), "-7");
        assert_eq!(format_number(Number::Double(2.25), &f), "2.25");
        let c = Number::CFloat(crate::symbol::Complex::new(1.0, -2.0));
        assert_eq!(format_number(c, &f), "1-2i");
    }
}
