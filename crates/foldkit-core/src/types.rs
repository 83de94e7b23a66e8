use core::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// A named field inside a [DataType::Struct]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type
    pub data_type: DataType,
}

impl Field {
    /// Creates a new field
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Declared type of a function argument, result or partial snapshot
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// true / false
    Boolean,
    /// 8-bit signed integer (`tinyint`)
    Byte,
    /// 16-bit signed integer (`smallint`)
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer (`bigint`)
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Fixed point decimal
    Decimal {
        /// Total number of digits
        precision: u8,
        /// Digits after the decimal point
        scale: u8,
    },
    /// Unbounded string
    String,
    /// Bounded string
    Varchar(u32),
    /// Fixed length string
    Char(u32),
    /// Days since the unix epoch
    Date,
    /// Microseconds since the unix epoch
    Timestamp,
    /// A record with named fields
    Struct(Vec<Field>),
}

impl DataType {
    /// Returns `true` for every type except [DataType::Struct]
    pub fn is_primitive(&self) -> bool {
        !matches!(self, DataType::Struct(_))
    }

    /// Returns `true` for the string family (string, varchar, char)
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::String | DataType::Varchar(_) | DataType::Char(_)
        )
    }

    /// Returns the field with the given name if this is a struct type
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            DataType::Struct(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "boolean"),
            DataType::Byte => write!(f, "tinyint"),
            DataType::Short => write!(f, "smallint"),
            DataType::Int => write!(f, "int"),
            DataType::Long => write!(f, "bigint"),
            DataType::Float => write!(f, "float"),
            DataType::Double => write!(f, "double"),
            DataType::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            DataType::String => write!(f, "string"),
            DataType::Varchar(len) => write!(f, "varchar({len})"),
            DataType::Char(len) => write!(f, "char({len})"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", field.name, field.data_type)?;
                }
                write!(f, ">")
            }
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parses the primitive type names understood by the command line driver
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let data_type = match name.as_str() {
            "boolean" => DataType::Boolean,
            "tinyint" | "byte" => DataType::Byte,
            "smallint" | "short" => DataType::Short,
            "int" | "integer" => DataType::Int,
            "bigint" | "long" => DataType::Long,
            "float" => DataType::Float,
            "double" => DataType::Double,
            "decimal" => DataType::Decimal {
                precision: 10,
                scale: 0,
            },
            "string" => DataType::String,
            "date" => DataType::Date,
            "timestamp" => DataType::Timestamp,
            _ => {
                return Err(Error::Coercion {
                    value: s.to_string(),
                    target: "type name",
                });
            }
        };
        Ok(data_type)
    }
}

/// A fixed point decimal represented as `unscaled * 10^-scale`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    unscaled: i128,
    scale: u8,
}

impl Decimal {
    /// Largest scale a parsed decimal may carry
    pub const MAX_SCALE: u8 = 38;

    /// Creates a decimal from its unscaled value and scale
    pub fn new(unscaled: i128, scale: u8) -> Self {
        Self { unscaled, scale }
    }

    /// Returns the nearest double
    pub fn to_f64(&self) -> f64 {
        self.unscaled as f64 / 10f64.powi(i32::from(self.scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = usize::from(self.scale);
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let digits = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

/// A nullable value flowing between the host and a function
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL NULL
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// tinyint value
    Byte(i8),
    /// smallint value
    Short(i16),
    /// int value
    Int(i32),
    /// bigint value
    Long(i64),
    /// float value
    Float(f32),
    /// double value
    Double(f64),
    /// decimal value
    Decimal(Decimal),
    /// string, varchar or char value
    String(String),
    /// Days since the unix epoch
    Date(i32),
    /// Microseconds since the unix epoch
    Timestamp(i64),
    /// Record with named fields in declaration order
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Returns `true` if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Builds a struct value from `(name, value)` pairs
    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, Value)>) -> Self {
        Value::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Looks up a struct field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the string payload if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Parses textual input of the given type.
    ///
    /// `\N` is NULL for every type, empty input only for non-string types.
    pub fn parse(input: &str, data_type: &DataType) -> Result<Self> {
        if input == "\\N" || (input.is_empty() && !data_type.is_string()) {
            return Ok(Value::Null);
        }
        let raw = Value::String(input.to_string());
        let err = || Error::coercion(&raw, "typed value");
        let trimmed = input.trim();
        let value = match data_type {
            DataType::Boolean => Value::Boolean(trimmed.parse().map_err(|_| err())?),
            DataType::Byte => Value::Byte(trimmed.parse().map_err(|_| err())?),
            DataType::Short => Value::Short(trimmed.parse().map_err(|_| err())?),
            DataType::Int => Value::Int(trimmed.parse().map_err(|_| err())?),
            DataType::Long => Value::Long(trimmed.parse().map_err(|_| err())?),
            DataType::Float => Value::Float(trimmed.parse().map_err(|_| err())?),
            DataType::Double => Value::Double(trimmed.parse().map_err(|_| err())?),
            DataType::Decimal { .. } => Value::Decimal(parse_decimal(trimmed).ok_or_else(err)?),
            DataType::String | DataType::Varchar(_) | DataType::Char(_) => raw.clone(),
            DataType::Date => Value::Date(trimmed.parse().map_err(|_| err())?),
            DataType::Timestamp => Value::Timestamp(trimmed.parse().map_err(|_| err())?),
            DataType::Struct(_) => return Err(err()),
        };
        Ok(value)
    }
}

fn parse_decimal(input: &str) -> Option<Decimal> {
    let (int_part, frac_part) = match input.split_once('.') {
        Some((i, f)) => (i, f),
        None => (input, ""),
    };
    let scale = u8::try_from(frac_part.len())
        .ok()
        .filter(|scale| *scale <= Decimal::MAX_SCALE)?;
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let unscaled: i128 = format!("{int_part}{frac_part}").parse().ok()?;
    Some(Decimal::new(unscaled, scale))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "\"{name}\":{value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_type_display() {
        let dt = DataType::Struct(vec![
            Field::new("count", DataType::Long),
            Field::new("sum", DataType::Double),
        ]);
        assert_eq!(dt.to_string(), "struct<count:bigint,sum:double>");
        assert_eq!(
            dt.field("sum").map(|f| &f.data_type),
            Some(&DataType::Double)
        );
        assert!(!dt.is_primitive());
    }

    #[test]
    fn decimal_conversion() {
        let d = Decimal::new(-12345, 2);
        assert_eq!(d.to_f64(), -123.45);
        assert_eq!(d.to_string(), "-123.45");
        assert_eq!(Decimal::new(5, 3).to_string(), "0.005");
        assert_eq!(Decimal::new(-7, 0).to_string(), "-7");
        assert_eq!(
            Decimal::new(1, 40).to_string(),
            format!("0.{}1", "0".repeat(39))
        );
        assert_eq!(
            Decimal::new(i128::MIN, 38).to_string(),
            "-1.70141183460469231731687303715884105728"
        );
    }

    #[test]
    fn decimal_scale_is_bounded() {
        let decimal = DataType::Decimal {
            precision: 38,
            scale: 38,
        };
        let tiny = format!("0.{}1", "0".repeat(39));
        assert!(Value::parse(&tiny, &decimal).is_err());
        let smallest = format!("0.{}1", "0".repeat(37));
        assert_eq!(
            Value::parse(&smallest, &decimal).unwrap(),
            Value::Decimal(Decimal::new(1, 38))
        );
    }

    #[test]
    fn parse_values() {
        assert_eq!(Value::parse("", &DataType::Int).unwrap(), Value::Null);
        assert_eq!(Value::parse("\\N", &DataType::String).unwrap(), Value::Null);
        let long = Value::parse(" 42", &DataType::Long).unwrap();
        assert_eq!(long, Value::Long(42));
        let decimal = DataType::Decimal {
            precision: 4,
            scale: 2,
        };
        assert_eq!(
            Value::parse("1.50", &decimal).unwrap(),
            Value::Decimal(Decimal::new(150, 2))
        );
        assert!(Value::parse("abc", &DataType::Double).is_err());
    }

    #[test]
    fn empty_string_is_a_value() {
        assert_eq!(
            Value::parse("", &DataType::String).unwrap(),
            Value::String(String::new())
        );
        assert_eq!(
            Value::parse("", &DataType::Varchar(4)).unwrap(),
            Value::String(String::new())
        );
        let null = Value::parse("\\N", &DataType::Char(2)).unwrap();
        assert_eq!(null, Value::Null);
        assert_eq!(Value::parse("", &DataType::Double).unwrap(), Value::Null);
    }

    #[test]
    fn data_type_from_str() {
        assert_eq!("BIGINT".parse::<DataType>().unwrap(), DataType::Long);
        assert_eq!("string".parse::<DataType>().unwrap(), DataType::String);
        assert!("map".parse::<DataType>().is_err());
    }
}
