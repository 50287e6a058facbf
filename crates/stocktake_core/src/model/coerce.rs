//! Coercion kernel for raw storage values.
//!
//! # Responsibility
//! - Represent every storage value the entity layer accepts as a closed enum.
//! - Convert a raw value into a target scalar under a fixed null/overflow policy.
//!
//! # Invariants
//! - Conversion is pure: the same raw value always yields the same result.
//! - NULL converts to the target zero value with `is_null = true`; it is never
//!   confused with a stored zero.
//! - Integer narrowing never wraps and never panics: out-of-range values are
//!   clamped to the target bound and reported as `CoercionError::Lossy`.
//! - Pairs without a defined conversion report `CoercionError::InvalidType`.

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw value as read from, or bound to, the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl RawValue {
    /// Short representation name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Widens any integer representation to `i128`.
    fn as_integer(&self) -> Option<i128> {
        match self {
            Self::I8(v) => Some(i128::from(*v)),
            Self::I16(v) => Some(i128::from(*v)),
            Self::I32(v) => Some(i128::from(*v)),
            Self::I64(v) => Some(i128::from(*v)),
            Self::U8(v) => Some(i128::from(*v)),
            Self::U16(v) => Some(i128::from(*v)),
            Self::U32(v) => Some(i128::from(*v)),
            Self::U64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for RawValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::I64(v),
            ValueRef::Real(v) => Self::F64(v),
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Self::Text(text.to_string()),
                Err(_) => Self::Blob(bytes.to_vec()),
            },
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

macro_rules! raw_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for RawValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }
    )*};
}

raw_from!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Text,
    Vec<u8> => Blob,
);

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl ToSql for RawValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Self::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Self::Bool(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Self::I8(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Self::I16(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Self::I32(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Self::I64(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Self::U8(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Self::U16(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Self::U32(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Self::U64(v) => {
                let narrowed = i64::try_from(*v)
                    .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
                ToSqlOutput::Owned(Value::Integer(narrowed))
            }
            Self::F32(v) => ToSqlOutput::Owned(Value::Real(f64::from(*v))),
            Self::F64(v) => ToSqlOutput::Owned(Value::Real(*v)),
            Self::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Self::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        };
        Ok(output)
    }
}

/// Error raised when a raw value cannot be represented exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    /// No conversion is defined from `from` to `to`.
    InvalidType {
        from: &'static str,
        to: &'static str,
    },
    /// The value was clamped or truncated to fit `to`.
    Lossy {
        from: &'static str,
        to: &'static str,
        clamped: String,
    },
}

impl Display for CoercionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidType { from, to } => {
                write!(f, "cannot coerce {from} value into {to}")
            }
            Self::Lossy { from, to, clamped } => {
                write!(f, "{from} value does not fit {to}; clamped to {clamped}")
            }
        }
    }
}

impl Error for CoercionError {}

/// Successful coercion result with explicit null flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced<T> {
    /// Converted value; the target zero value when `is_null` is set.
    pub value: T,
    /// `true` when the raw value was NULL.
    pub is_null: bool,
}

impl<T> Coerced<T> {
    /// Returns `None` for NULL, `Some(value)` otherwise.
    pub fn into_option(self) -> Option<T> {
        if self.is_null {
            None
        } else {
            Some(self.value)
        }
    }
}

/// Outcome of one scalar conversion before policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion<T> {
    Exact(T),
    Clamped(T),
    Unsupported,
}

/// Target scalar type accepted by the kernel.
pub trait Scalar: Sized + Display {
    const TYPE_NAME: &'static str;

    fn zero() -> Self;

    /// Converts a non-null raw value.
    fn convert(raw: &RawValue) -> Conversion<Self>;
}

/// Coerces `raw` into `T`.
///
/// # Errors
/// - `InvalidType` when no conversion exists for the pair.
/// - `Lossy` when the value had to be clamped or truncated.
pub fn coerce<T: Scalar>(raw: &RawValue) -> Result<Coerced<T>, CoercionError> {
    match coerce_saturating::<T>(raw)? {
        (coerced, None) => Ok(coerced),
        (_, Some(err)) => Err(err),
    }
}

/// Coerces `raw` into `T`, returning the clamped value next to the lossy report.
///
/// For callers that can work with a clamped value but must still surface it.
pub fn coerce_saturating<T: Scalar>(
    raw: &RawValue,
) -> Result<(Coerced<T>, Option<CoercionError>), CoercionError> {
    if raw.is_null() {
        return Ok((
            Coerced {
                value: T::zero(),
                is_null: true,
            },
            None,
        ));
    }

    match T::convert(raw) {
        Conversion::Exact(value) => Ok((
            Coerced {
                value,
                is_null: false,
            },
            None,
        )),
        Conversion::Clamped(value) => {
            let lossy = CoercionError::Lossy {
                from: raw.type_name(),
                to: T::TYPE_NAME,
                clamped: value.to_string(),
            };
            Ok((
                Coerced {
                    value,
                    is_null: false,
                },
                Some(lossy),
            ))
        }
        Conversion::Unsupported => Err(CoercionError::InvalidType {
            from: raw.type_name(),
            to: T::TYPE_NAME,
        }),
    }
}

trait IntBounds: Sized + Copy + TryFrom<i128> {
    const MIN_VALUE: Self;
    const MAX_VALUE: Self;
}

fn from_wide<T: IntBounds>(value: i128) -> Conversion<T> {
    match T::try_from(value) {
        Ok(narrowed) => Conversion::Exact(narrowed),
        Err(_) if value < 0 => Conversion::Clamped(T::MIN_VALUE),
        Err(_) => Conversion::Clamped(T::MAX_VALUE),
    }
}

fn from_float<T: IntBounds>(value: f64) -> Conversion<T> {
    if value.is_nan() {
        return Conversion::Unsupported;
    }
    let truncated = value.trunc();
    // `as` saturates at the i128 bounds, which every target is narrower than.
    match from_wide::<T>(truncated as i128) {
        Conversion::Exact(narrowed) if truncated != value => Conversion::Clamped(narrowed),
        other => other,
    }
}

macro_rules! integer_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl IntBounds for $ty {
            const MIN_VALUE: Self = <$ty>::MIN;
            const MAX_VALUE: Self = <$ty>::MAX;
        }

        impl Scalar for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn zero() -> Self {
                0
            }

            fn convert(raw: &RawValue) -> Conversion<Self> {
                match raw {
                    RawValue::Bool(v) => Conversion::Exact(<$ty>::from(*v)),
                    RawValue::F32(v) => from_float(f64::from(*v)),
                    RawValue::F64(v) => from_float(*v),
                    other => other.as_integer().map_or(Conversion::Unsupported, from_wide),
                }
            }
        }
    )*};
}

integer_scalar!(i32, i64, isize, u32, u64, usize);

impl Scalar for bool {
    const TYPE_NAME: &'static str = "bool";

    fn zero() -> Self {
        false
    }

    fn convert(raw: &RawValue) -> Conversion<Self> {
        match raw {
            RawValue::Bool(v) => Conversion::Exact(*v),
            other => other
                .as_integer()
                .map_or(Conversion::Unsupported, |v| Conversion::Exact(v != 0)),
        }
    }
}

impl Scalar for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn zero() -> Self {
        0.0
    }

    fn convert(raw: &RawValue) -> Conversion<Self> {
        match raw {
            RawValue::F32(v) => Conversion::Exact(f64::from(*v)),
            RawValue::F64(v) => Conversion::Exact(*v),
            other => match other.as_integer() {
                Some(v) => {
                    let widened = v as f64;
                    if widened as i128 == v {
                        Conversion::Exact(widened)
                    } else {
                        Conversion::Clamped(widened)
                    }
                }
                None => Conversion::Unsupported,
            },
        }
    }
}

impl Scalar for String {
    const TYPE_NAME: &'static str = "string";

    fn zero() -> Self {
        String::new()
    }

    fn convert(raw: &RawValue) -> Conversion<Self> {
        match raw {
            RawValue::Text(v) => Conversion::Exact(v.clone()),
            RawValue::F32(v) => Conversion::Exact(v.to_string()),
            RawValue::F64(v) => Conversion::Exact(v.to_string()),
            other => other
                .as_integer()
                .map_or(Conversion::Unsupported, |v| Conversion::Exact(v.to_string())),
        }
    }
}
