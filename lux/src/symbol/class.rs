//! Symbol classes and element types

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Variant tag of a symbol record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Class {
    Unused,
    Undefined,
    Scalar,
    ComplexScalar,
    String,
    Array,
    ComplexArray,
    Range,
    List,
    CompactList,
    Struct,
    ListPointer,
    Keyword,
    /// Pointer to another variable
    Transfer,
    FunctionPointer,
    ScalarPointer,
    SubscriptPointer,
    AssociatedFile,
    Subroutine,
    Function,
    BlockRoutine,
    ExecutableNode,
    BinaryOp,
    FunctionCall,
    Extract,
}

impl Class {
    pub fn name(self) -> &'static str {
        match self {
            Class::Unused => "UNUSED",
            Class::Undefined => "UNDEFINED",
            Class::Scalar => "SCALAR",
            Class::ComplexScalar => "CSCALAR",
            Class::String => "STRING",
            Class::Array => "ARRAY",
            Class::ComplexArray => "CARRAY",
            Class::Range => "RANGE",
            Class::List => "LIST",
            Class::CompactList => "CLIST",
            Class::Struct => "STRUCT",
            Class::ListPointer => "LIST_PTR",
            Class::Keyword => "KEYWORD",
            Class::Transfer => "TRANSFER",
            Class::FunctionPointer => "FUNC_PTR",
            Class::ScalarPointer => "SCAL_PTR",
            Class::SubscriptPointer => "SUBSC_PTR",
            Class::AssociatedFile => "FILEMAP",
            Class::Subroutine => "SUBROUTINE",
            Class::Function => "FUNCTION",
            Class::BlockRoutine => "BLOCKROUTINE",
            Class::ExecutableNode => "EVB",
            Class::BinaryOp => "BIN_OP",
            Class::FunctionCall => "INT_FUNC",
            Class::Extract => "EXTRACT",
        }
    }

    pub fn is_routine(self) -> bool {
        matches!(self, Class::Subroutine | Class::Function | Class::BlockRoutine)
    }

    /// Classes that live in the executable sub-ranges
    pub fn is_executable(self) -> bool {
        self.is_routine()
            || matches!(
                self,
                Class::ExecutableNode | Class::BinaryOp | Class::FunctionCall | Class::Extract
            )
    }

    /// Classes the conversion engine accepts
    pub fn is_numeric_or_text(self) -> bool {
        matches!(
            self,
            Class::Scalar | Class::ComplexScalar | Class::String | Class::Array | Class::ComplexArray
        )
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type of numeric and text payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ElementType {
    /// Unsigned byte
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    CFloat,
    CDouble,
}

impl ElementType {
    pub const NUMERIC: [ElementType; 8] = [
        ElementType::Int8,
        ElementType::Int16,
        ElementType::Int32,
        ElementType::Int64,
        ElementType::Float,
        ElementType::Double,
        ElementType::CFloat,
        ElementType::CDouble,
    ];

    /// Size in bytes of one element; zero for strings, which are not byte-packed
    pub fn width(self) -> usize {
        match self {
            ElementType::Int8 => 1,
            ElementType::Int16 => 2,
            ElementType::Int32 | ElementType::Float => 4,
            ElementType::Int64 | ElementType::Double | ElementType::CFloat => 8,
            ElementType::CDouble => 16,
            ElementType::String => 0,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ElementType::Int8 | ElementType::Int16 | ElementType::Int32 | ElementType::Int64
        )
    }

    pub fn is_complex(self) -> bool {
        matches!(self, ElementType::CFloat | ElementType::CDouble)
    }

    pub fn is_numeric(self) -> bool {
        self != ElementType::String
    }

    /// The real type backing a complex type; identity for real types
    pub fn real_part(self) -> ElementType {
        match self {
            ElementType::CFloat => ElementType::Float,
            ElementType::CDouble => ElementType::Double,
            other => other,
        }
    }

    /// The complex type able to hold this type's values
    pub fn complex_of(self) -> ElementType {
        match self {
            ElementType::Double | ElementType::Int64 | ElementType::CDouble => ElementType::CDouble,
            _ => ElementType::CFloat,
        }
    }

    /// Result type of a binary operation on operands of these types
    pub fn combine(self, other: ElementType) -> ElementType {
        if self == ElementType::String || other == ElementType::String {
            return ElementType::String;
        }
        if self.is_complex() || other.is_complex() {
            let real = self.real_part().max(other.real_part());
            return if real == ElementType::Double || real == ElementType::Int64 {
                ElementType::CDouble
            } else {
                ElementType::CFloat
            };
        }
        self.max(other)
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::Int16 => "int16",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Float => "float",
            ElementType::Double => "double",
            ElementType::String => "string",
            ElementType::CFloat => "cfloat",
            ElementType::CDouble => "cdouble",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int8" | "byte" => Ok(ElementType::Int8),
            "int16" | "word" => Ok(ElementType::Int16),
            "int32" | "long" => Ok(ElementType::Int32),
            "int64" => Ok(ElementType::Int64),
            "float" => Ok(ElementType::Float),
            "double" => Ok(ElementType::Double),
            "string" => Ok(ElementType::String),
            "cfloat" => Ok(ElementType::CFloat),
            "cdouble" => Ok(ElementType::CDouble),
            other => Err(format!("unknown element type: {other}")),
        }
    }
}
