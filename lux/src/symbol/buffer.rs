//! Byte-packed element storage for array payloads.
//!
//! A [`Buffer`] is the out-of-band allocation behind numeric arrays: an
//! element type plus a raw native-endian byte vector. Collaborators doing
//! binary file I/O read and write [`Buffer::as_bytes`] directly.

use super::class::ElementType;
use super::value::Number;

/// How a type conversion treated the existing allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reuse {
    /// The existing bytes were overwritten in place
    InPlace,
    /// The allocation had to grow
    Grown,
}

/// Numeric elements of one type
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    ty: ElementType,
    bytes: Vec<u8>,
}

impl Buffer {
    /// A zero-filled buffer of `len` elements
    pub fn zeroed(ty: ElementType, len: usize) -> Self {
        debug_assert!(ty.is_numeric(), "buffers hold numeric elements only");
        Buffer {
            ty,
            bytes: vec![0; len * ty.width()],
        }
    }

    /// Builds a buffer from values, casting each to `ty`
    pub fn from_numbers(ty: ElementType, values: &[Number]) -> Self {
        let mut buffer = Buffer::zeroed(ty, values.len());
        for (i, v) in values.iter().enumerate() {
            buffer.set(i, *v);
        }
        buffer
    }

    /// Wraps raw bytes; the length must be a multiple of the element width
    pub fn from_bytes(ty: ElementType, bytes: Vec<u8>) -> Option<Self> {
        if !ty.is_numeric() || bytes.len() % ty.width() != 0 {
            return None;
        }
        Some(Buffer { ty, bytes })
    }

    pub fn element_type(&self) -> ElementType {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.ty.width()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Capacity of the underlying allocation in bytes
    pub fn byte_capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn get(&self, index: usize) -> Option<Number> {
        let w = self.ty.width();
        let bytes = self.bytes.get(index * w..(index + 1) * w)?;
        Some(Number::read_bytes(self.ty, bytes))
    }

    /// Stores `value` (cast to the buffer type) at `index`; out of range is ignored
    pub fn set(&mut self, index: usize, value: Number) {
        let w = self.ty.width();
        if let Some(slot) = self.bytes.get_mut(index * w..(index + 1) * w) {
            value.cast(self.ty).write_bytes(slot);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Number> + '_ {
        let ty = self.ty;
        self.bytes
            .chunks_exact(ty.width())
            .map(move |chunk| Number::read_bytes(ty, chunk))
    }

    /// Appends one element
    pub fn push(&mut self, value: Number) {
        let w = self.ty.width();
        let start = self.bytes.len();
        self.bytes.resize(start + w, 0);
        value.cast(self.ty).write_bytes(&mut self.bytes[start..]);
    }

    /// Re-types the buffer to `target`, element by element.
    ///
    /// Narrowing (or equal width) reuses the allocation with a front-to-back
    /// pass: element `i` is written at or below where it was read. Widening
    /// grows the allocation and runs back-to-front so no unread source element
    /// is overwritten.
    pub fn convert(&mut self, target: ElementType) -> Reuse {
        debug_assert!(target.is_numeric(), "buffers hold numeric elements only");
        let source = self.ty;
        let (sw, tw) = (source.width(), target.width());
        let n = self.len();

        if tw <= sw {
            for i in 0..n {
                let value = Number::read_bytes(source, &self.bytes[i * sw..]).cast(target);
                value.write_bytes(&mut self.bytes[i * tw..(i + 1) * tw]);
            }
            self.bytes.truncate(n * tw);
            self.ty = target;
            Reuse::InPlace
        } else {
            self.bytes.resize(n * tw, 0);
            for i in (0..n).rev() {
                let value = Number::read_bytes(source, &self.bytes[i * sw..]).cast(target);
                value.write_bytes(&mut self.bytes[i * tw..(i + 1) * tw]);
            }
            self.ty = target;
            Reuse::Grown
        }
    }
}
