//! Inline numeric values and element casts
//!
//! Casting follows the truncation model: integer targets truncate toward
//! zero from floating sources and keep the low bits from wider integer
//! sources; floating targets use the platform conversion.

use super::class::ElementType;
use num_traits::AsPrimitive;

/// Complex number stored as real and imaginary parts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Complex { re, im }
    }
}

/// One numeric element of any supported type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int8(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    CFloat(Complex<f32>),
    CDouble(Complex<f64>),
}

impl Number {
    pub fn element_type(&self) -> ElementType {
        match self {
            Number::Int8(_) => ElementType::Int8,
            Number::Int16(_) => ElementType::Int16,
            Number::Int32(_) => ElementType::Int32,
            Number::Int64(_) => ElementType::Int64,
            Number::Float(_) => ElementType::Float,
            Number::Double(_) => ElementType::Double,
            Number::CFloat(_) => ElementType::CFloat,
            Number::CDouble(_) => ElementType::CDouble,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Number::CFloat(_) | Number::CDouble(_))
    }

    /// Zero of the given numeric type
    pub fn zero(ty: ElementType) -> Number {
        Number::Int32(0).cast(ty)
    }

    /// Real part as a primitive of type `T`, using `as` semantics
    fn real_as<T>(self) -> T
    where
        T: Copy + 'static,
        u8: AsPrimitive<T>,
        i16: AsPrimitive<T>,
        i32: AsPrimitive<T>,
        i64: AsPrimitive<T>,
        f32: AsPrimitive<T>,
        f64: AsPrimitive<T>,
    {
        match self {
            Number::Int8(v) => v.as_(),
            Number::Int16(v) => v.as_(),
            Number::Int32(v) => v.as_(),
            Number::Int64(v) => v.as_(),
            Number::Float(v) => v.as_(),
            Number::Double(v) => v.as_(),
            Number::CFloat(c) => c.re.as_(),
            Number::CDouble(c) => c.re.as_(),
        }
    }

    /// Imaginary part; zero for real values
    pub fn imaginary(self) -> f64 {
        match self {
            Number::CFloat(c) => f64::from(c.im),
            Number::CDouble(c) => c.im,
            _ => 0.0,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.real_as()
    }

    pub fn to_i64(self) -> i64 {
        self.real_as()
    }

    /// Converts to `ty`. Complex to real keeps the real part; real to complex
    /// gets a zero imaginary part. String is not a numeric target and leaves
    /// the value unchanged.
    pub fn cast(self, ty: ElementType) -> Number {
        match ty {
            ElementType::Int8 => Number::Int8(self.real_as()),
            ElementType::Int16 => Number::Int16(self.real_as()),
            ElementType::Int32 => Number::Int32(self.real_as()),
            ElementType::Int64 => Number::Int64(self.real_as()),
            ElementType::Float => Number::Float(self.real_as()),
            ElementType::Double => Number::Double(self.real_as()),
            ElementType::CFloat => {
                Number::CFloat(Complex::new(self.real_as(), self.imaginary() as f32))
            }
            ElementType::CDouble => Number::CDouble(Complex::new(self.real_as(), self.imaginary())),
            ElementType::String => self,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int8(v) => v == 0,
            Number::Int16(v) => v == 0,
            Number::Int32(v) => v == 0,
            Number::Int64(v) => v == 0,
            Number::Float(v) => v == 0.0,
            Number::Double(v) => v == 0.0,
            Number::CFloat(c) => c.re == 0.0 && c.im == 0.0,
            Number::CDouble(c) => c.re == 0.0 && c.im == 0.0,
        }
    }

    /// Encodes into `out`, which must be exactly `element_type().width()` bytes
    pub(crate) fn write_bytes(self, out: &mut [u8]) {
        match self {
            Number::Int8(v) => out.copy_from_slice(&[v]),
            Number::Int16(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Number::Int32(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Number::Int64(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Number::Float(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Number::Double(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Number::CFloat(c) => {
                out[..4].copy_from_slice(&c.re.to_ne_bytes());
                out[4..].copy_from_slice(&c.im.to_ne_bytes());
            }
            Number::CDouble(c) => {
                out[..8].copy_from_slice(&c.re.to_ne_bytes());
                out[8..].copy_from_slice(&c.im.to_ne_bytes());
            }
        }
    }

    /// Decodes one element of type `ty` from `bytes` (at least `ty.width()` long)
    pub(crate) fn read_bytes(ty: ElementType, bytes: &[u8]) -> Number {
        fn take<const N: usize>(bytes: &[u8]) -> [u8; N] {
            let mut out = [0u8; N];
            out.copy_from_slice(&bytes[..N]);
            out
        }
        match ty {
            ElementType::Int8 => Number::Int8(bytes[0]),
            ElementType::Int16 => Number::Int16(i16::from_ne_bytes(take(bytes))),
            ElementType::Int32 => Number::Int32(i32::from_ne_bytes(take(bytes))),
            ElementType::Int64 => Number::Int64(i64::from_ne_bytes(take(bytes))),
            ElementType::Float => Number::Float(f32::from_ne_bytes(take(bytes))),
            ElementType::Double => Number::Double(f64::from_ne_bytes(take(bytes))),
            ElementType::CFloat => Number::CFloat(Complex::new(
                f32::from_ne_bytes(take(bytes)),
                f32::from_ne_bytes(take(&bytes[4..])),
            )),
            ElementType::CDouble => Number::CDouble(Complex::new(
                f64::from_ne_bytes(take(bytes)),
                f64::from_ne_bytes(take(&bytes[8..])),
            )),
            ElementType::String => Number::Int32(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_narrowing_keeps_low_bits() {
        assert_eq!(Number::Int32(300).cast(ElementType::Int8), Number::Int8(44));
        assert_eq!(Number::Int32(-1).cast(ElementType::Int8), Number::Int8(255));
        assert_eq!(Number::Int64(70000).cast(ElementType::Int16), Number::Int16(4464));
    }

    #[test]
    fn test_float_to_integer_truncates() {
        assert_eq!(Number::Double(3.9).cast(ElementType::Int32), Number::Int32(3));
        assert_eq!(Number::Double(-3.9).cast(ElementType::Int32), Number::Int32(-3));
        assert_eq!(Number::Float(2.5).cast(ElementType::Int16), Number::Int16(2));
    }

    #[test]
    fn test_complex_casts() {
        let c = Number::CDouble(Complex::new(1.5, -2.0));
        assert_eq!(c.cast(ElementType::Double), Number::Double(1.5));
        assert_eq!(
            Number::Int32(4).cast(ElementType::CFloat),
            Number::CFloat(Complex::new(4.0, 0.0))
        );
        assert_eq!(c.imaginary(), -2.0);
    }

    #[test]
    fn test_complex_layout_is_real_then_imaginary() {
        let mut bytes = [0u8; 8];
        Number::CFloat(Complex::new(1.0, 2.0)).write_bytes(&mut bytes);
        assert_eq!(&bytes[..4], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[4..], &2.0f32.to_ne_bytes());
        assert_eq!(Number::read_bytes(ElementType::Float, &bytes[4..]), Number::Float(2.0));
    }

    #[test]
    fn test_zero() {
        assert!(Number::zero(ElementType::CDouble).is_zero());
        assert_eq!(Number::zero(ElementType::Int8), Number::Int8(0));
    }
}
