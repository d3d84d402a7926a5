//! Mapping from schema dtypes to C++ value types.

use nwbgen_schema::{Dtype, PrimitiveDtype, RefKind};
use std::fmt;

/// C++ value type of an attribute or dataset parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CppScalar {
    /// `std::string`
    String,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `int8_t`
    Int8,
    /// `int16_t`
    Int16,
    /// `int32_t`
    Int32,
    /// `int64_t`
    Int64,
    /// `uint8_t`
    UInt8,
    /// `uint16_t`
    UInt16,
    /// `uint32_t`
    UInt32,
    /// `uint64_t`
    UInt64,
    /// `bool`
    Bool,
    /// `std::any`, used for compound and unsupported dtypes.
    Opaque,
}

/// A dtype with no C++ mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedDtype {
    /// Description of the dtype.
    pub dtype: String,
}

impl CppScalar {
    /// Maps a dtype to its value type.
    ///
    /// `array of X` maps to the element type of X. A missing dtype and
    /// compound dtypes map to [`CppScalar::Opaque`].
    ///
    /// # Errors
    /// Returns [`UnsupportedDtype`] for region references, unknown names and
    /// object references (which are handles, not values).
    pub fn from_dtype(dtype: &Dtype) -> Result<Self, UnsupportedDtype> {
        match dtype {
            Dtype::Unspecified | Dtype::Compound(_) => Ok(Self::Opaque),
            Dtype::Primitive(p) => Ok(Self::from_primitive(*p)),
            Dtype::ArrayOf(inner) => Self::from_dtype(inner),
            Dtype::Reference {
                kind: RefKind::Object,
                ..
            }
            | Dtype::Reference {
                kind: RefKind::Region,
                ..
            }
            | Dtype::Unknown(_) => Err(UnsupportedDtype {
                dtype: dtype.to_string(),
            }),
        }
    }

    /// Maps a primitive dtype.
    #[must_use]
    pub const fn from_primitive(p: PrimitiveDtype) -> Self {
        match p {
            PrimitiveDtype::Text | PrimitiveDtype::Ascii | PrimitiveDtype::IsoDatetime => {
                Self::String
            }
            PrimitiveDtype::Float32 => Self::Float,
            PrimitiveDtype::Float64 | PrimitiveDtype::Numeric => Self::Double,
            PrimitiveDtype::Int8 => Self::Int8,
            PrimitiveDtype::Int16 => Self::Int16,
            PrimitiveDtype::Int32 => Self::Int32,
            PrimitiveDtype::Int64 => Self::Int64,
            PrimitiveDtype::Uint8 => Self::UInt8,
            PrimitiveDtype::Uint16 => Self::UInt16,
            PrimitiveDtype::Uint32 => Self::UInt32,
            PrimitiveDtype::Uint64 => Self::UInt64,
            PrimitiveDtype::Bool => Self::Bool,
        }
    }

    /// Returns the C++ spelling.
    #[must_use]
    pub const fn cpp_name(&self) -> &'static str {
        match self {
            Self::String => "std::string",
            Self::Float => "float",
            Self::Double => "double",
            Self::Int8 => "int8_t",
            Self::Int16 => "int16_t",
            Self::Int32 => "int32_t",
            Self::Int64 => "int64_t",
            Self::UInt8 => "uint8_t",
            Self::UInt16 => "uint16_t",
            Self::UInt32 => "uint32_t",
            Self::UInt64 => "uint64_t",
            Self::Bool => "bool",
            Self::Opaque => "std::any",
        }
    }

    /// Returns the AqNWB storage type used when creating the value.
    #[must_use]
    pub const fn base_data_type(&self) -> Option<&'static str> {
        let name = match self {
            Self::String => "AQNWB::IO::BaseDataType::DSTR",
            Self::Float => "AQNWB::IO::BaseDataType::F32",
            Self::Double => "AQNWB::IO::BaseDataType::F64",
            // AqNWB has no boolean storage type.
            Self::Int8 | Self::Bool => "AQNWB::IO::BaseDataType::I8",
            Self::Int16 => "AQNWB::IO::BaseDataType::I16",
            Self::Int32 => "AQNWB::IO::BaseDataType::I32",
            Self::Int64 => "AQNWB::IO::BaseDataType::I64",
            Self::UInt8 => "AQNWB::IO::BaseDataType::U8",
            Self::UInt16 => "AQNWB::IO::BaseDataType::U16",
            Self::UInt32 => "AQNWB::IO::BaseDataType::U32",
            Self::UInt64 => "AQNWB::IO::BaseDataType::U64",
            Self::Opaque => return None,
        };
        Some(name)
    }

    /// Returns true for `std::string`.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Returns true for the floating point types.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

impl fmt::Display for CppScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cpp_name())
    }
}
