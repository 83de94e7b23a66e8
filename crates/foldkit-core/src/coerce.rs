//! Conversions performed by the host before a value reaches an aggregator.
//!
//! Aggregators never see a [Value]; they work on plain scalars. The functions in here
//! turn a nullable [Value] into `Option<T>` and fail only when a non-null value cannot be
//! represented in the requested type.

use crate::{
    error::{Error, Result},
    types::Value,
};

/// Strict conversion to `f64`.
///
/// Strings must parse as a number, timestamps become fractional seconds since the epoch.
pub fn to_double(value: &Value) -> Result<Option<f64>> {
    let v = match value {
        Value::Null => return Ok(None),
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::Byte(v) => f64::from(*v),
        Value::Short(v) => f64::from(*v),
        Value::Int(v) => f64::from(*v),
        Value::Long(v) => *v as f64,
        Value::Float(v) => f64::from(*v),
        Value::Double(v) => *v,
        Value::Decimal(d) => d.to_f64(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::coercion(value, "double"))?,
        Value::Timestamp(micros) => *micros as f64 / 1_000_000.0,
        Value::Date(_) | Value::Struct(_) => return Err(Error::coercion(value, "double")),
    };
    Ok(Some(v))
}

/// Lenient conversion to `f64` where anything that does not convert becomes NULL
pub fn to_double_lenient(value: &Value) -> Option<f64> {
    to_double(value).ok().flatten()
}

/// Strict conversion of integral values to `i64`
pub fn to_long(value: &Value) -> Result<Option<i64>> {
    let v = match value {
        Value::Null => return Ok(None),
        Value::Byte(v) => i64::from(*v),
        Value::Short(v) => i64::from(*v),
        Value::Int(v) => i64::from(*v),
        Value::Long(v) => *v,
        _ => return Err(Error::coercion(value, "bigint")),
    };
    Ok(Some(v))
}

/// A scalar type an aggregator can consume directly
pub trait FromValue: Sized {
    /// Name of the target type used in error messages
    const TARGET: &'static str;

    /// Converts a nullable value, widening narrower types of the same family
    fn from_value(value: &Value) -> Result<Option<Self>>;
}

macro_rules! from_value_impl {
    ($type:ty, $target:literal, $($variant:ident),+) => {
        impl FromValue for $type {
            const TARGET: &'static str = $target;

            fn from_value(value: &Value) -> Result<Option<Self>> {
                match value {
                    Value::Null => Ok(None),
                    $(Value::$variant(v) => Ok(Some(<$type>::from(*v))),)+
                    _ => Err(Error::coercion(value, Self::TARGET)),
                }
            }
        }
    };
}

from_value_impl!(i16, "smallint", Byte, Short);
from_value_impl!(i32, "int", Byte, Short, Int);
from_value_impl!(i64, "bigint", Byte, Short, Int, Long);
from_value_impl!(f32, "float", Float);
from_value_impl!(f64, "double", Float, Double);

impl FromValue for String {
    const TARGET: &'static str = "string";

    fn from_value(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            _ => Err(Error::coercion(value, Self::TARGET)),
        }
    }
}
