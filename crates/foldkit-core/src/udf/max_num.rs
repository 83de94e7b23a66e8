use crate::{
    coerce,
    error::{Error, Result},
    registry::Description,
    types::{DataType, Value},
    udf::{ScalarEvaluator, ScalarFunction},
};

const MAX_NUM_EXAMPLE: &str = "Example:\n  > SELECT _FUNC_(1, 5) FROM table;\n  5\n  \
> SELECT _FUNC_(-123, 789, 0) FROM table;\n  789";

const GET_MAX_NUM: Description = Description {
    name: "get_max_num",
    value: "_FUNC_(x, y, ...) - return the maximum value in x,y,...",
    extended: Some(MAX_NUM_EXAMPLE),
};

const GENERIC_ARGUMENTS: &str =
    "only SHORT/BYTE/INT/LONG/DOUBLE/FLOAT/STRING/DECIMAL types are accepted";

const GET_MAX_NUM_GEN: Description = Description {
    name: "get_max_num_gen",
    value: "_FUNC_(x, y, ...) - return the maximum value in x,y,...",
    extended: Some(MAX_NUM_EXAMPLE),
};

fn check_arity(function: &'static str, arguments: &[DataType]) -> Result<()> {
    if arguments.len() < 2 {
        return Err(Error::ArgumentCount {
            function,
            expected: "at least 2",
            actual: arguments.len(),
        });
    }
    Ok(())
}

fn check_row(function: &'static str, expected: usize, row: &[Value]) -> Result<()> {
    if row.len() != expected {
        return Err(Error::ArgumentCount {
            function,
            expected: "as many values as resolved arguments",
            actual: row.len(),
        });
    }
    Ok(())
}

/// `get_max_num`: maximum of two or more integral arguments as a bigint
#[derive(Debug, Default, Clone, Copy)]
pub struct GetMaxNum;

impl ScalarFunction for GetMaxNum {
    fn description(&self) -> &Description {
        &GET_MAX_NUM
    }

    fn resolve(&self, arguments: &[DataType]) -> Result<Box<dyn ScalarEvaluator>> {
        check_arity(GET_MAX_NUM.name, arguments)?;
        for (position, argument) in arguments.iter().enumerate() {
            if !matches!(
                argument,
                DataType::Byte | DataType::Short | DataType::Int | DataType::Long
            ) {
                return Err(Error::ArgumentType {
                    function: GET_MAX_NUM.name,
                    position,
                    actual: argument.clone(),
                    message: "only integral types are accepted",
                });
            }
        }
        Ok(Box::new(MaxNumEvaluator {
            arity: arguments.len(),
        }))
    }
}

#[derive(Debug)]
struct MaxNumEvaluator {
    arity: usize,
}

impl ScalarEvaluator for MaxNumEvaluator {
    fn return_type(&self) -> DataType {
        DataType::Long
    }

    fn evaluate(&self, arguments: &[Value]) -> Result<Value> {
        check_row(GET_MAX_NUM.name, self.arity, arguments)?;
        let mut max: Option<i64> = None;
        for argument in arguments {
            if let Some(v) = coerce::to_long(argument)? {
                max = Some(max.map_or(v, |m| m.max(v)));
            }
        }
        Ok(max.map_or(Value::Null, Value::Long))
    }
}

/// How a declared argument type is widened before comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Widening {
    /// tinyint, smallint and int
    Int,
    Long,
    /// float, double and numeric strings; unparseable strings become NULL
    Double,
    /// decimals compare through their double value
    Decimal,
}

/// `get_max_num_gen`: maximum of two or more numeric-like arguments as a double
#[derive(Debug, Default, Clone, Copy)]
pub struct GetMaxNumGeneric;

impl ScalarFunction for GetMaxNumGeneric {
    fn description(&self) -> &Description {
        &GET_MAX_NUM_GEN
    }

    fn resolve(&self, arguments: &[DataType]) -> Result<Box<dyn ScalarEvaluator>> {
        check_arity(GET_MAX_NUM_GEN.name, arguments)?;
        let widenings = arguments
            .iter()
            .enumerate()
            .map(|(position, argument)| {
                let widening = match argument {
                    DataType::Byte | DataType::Short | DataType::Int => Widening::Int,
                    DataType::Long => Widening::Long,
                    DataType::Float | DataType::Double | DataType::String => Widening::Double,
                    DataType::Decimal { .. } => Widening::Decimal,
                    other => {
                        return Err(Error::ArgumentType {
                            function: GET_MAX_NUM_GEN.name,
                            position,
                            actual: other.clone(),
                            message: GENERIC_ARGUMENTS,
                        });
                    }
                };
                Ok(widening)
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "resolved {} with widenings {widenings:?}",
            GET_MAX_NUM_GEN.name
        );
        Ok(Box::new(MaxNumGenericEvaluator { widenings }))
    }
}

#[derive(Debug)]
struct MaxNumGenericEvaluator {
    widenings: Vec<Widening>,
}

impl MaxNumGenericEvaluator {
    fn widen(widening: Widening, value: &Value) -> Result<Option<f64>> {
        match widening {
            Widening::Int | Widening::Long => Ok(coerce::to_long(value)?.map(|v| v as f64)),
            Widening::Double => Ok(coerce::to_double_lenient(value)),
            Widening::Decimal => match value {
                Value::Decimal(d) => Ok(Some(d.to_f64())),
                Value::Null => Ok(None),
                other => Err(Error::coercion(other, "decimal")),
            },
        }
    }
}

impl ScalarEvaluator for MaxNumGenericEvaluator {
    fn return_type(&self) -> DataType {
        DataType::Double
    }

    fn evaluate(&self, arguments: &[Value]) -> Result<Value> {
        check_row(GET_MAX_NUM_GEN.name, self.widenings.len(), arguments)?;
        let mut result: Option<f64> = None;
        for (widening, argument) in self.widenings.iter().zip(arguments) {
            let Some(v) = Self::widen(*widening, argument)? else {
                continue;
            };
            if result.is_none_or(|r| v > r) {
                result = Some(v);
            }
        }
        Ok(result.map_or(Value::Null, Value::Double))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Decimal;

    fn eval(function: &dyn ScalarFunction, row: Vec<Value>) -> Value {
        let types = row
            .iter()
            .map(|v| match v {
                Value::Int(_) | Value::Null => DataType::Int,
                Value::Long(_) => DataType::Long,
                Value::Double(_) => DataType::Double,
                Value::String(_) => DataType::String,
                Value::Decimal(_) => DataType::Decimal {
                    precision: 10,
                    scale: 2,
                },
                other => panic!("unexpected {other}"),
            })
            .collect::<Vec<_>>();
        function.resolve(&types).unwrap().evaluate(&row).unwrap()
    }

    #[test]
    fn generic_max() {
        let f = GetMaxNumGeneric;
        let ints = vec![Value::Int(1), Value::Int(5)];
        assert_eq!(eval(&f, ints), Value::Double(5.0));
        assert_eq!(
            eval(&f, vec![Value::Int(-123), Value::Int(789), Value::Int(0)]),
            Value::Double(789.0)
        );
        assert_eq!(eval(&f, vec![Value::Null, Value::Null]), Value::Null);
        assert_eq!(
            eval(
                &f,
                vec![
                    Value::String("2.5".into()),
                    Value::Decimal(Decimal::new(300, 2)),
                    Value::Long(-4)
                ]
            ),
            Value::Double(3.0)
        );
        assert_eq!(
            eval(&f, vec![Value::String("n/a".into()), Value::Double(-1.0)]),
            Value::Double(-1.0)
        );
    }

    #[test]
    fn generic_rejects_early() {
        let f = GetMaxNumGeneric;
        assert!(matches!(
            f.resolve(&[DataType::Int]),
            Err(Error::ArgumentCount { actual: 1, .. })
        ));
        assert!(matches!(
            f.resolve(&[DataType::Int, DataType::Boolean]),
            Err(Error::ArgumentType { position: 1, .. })
        ));
        let e = f.resolve(&[DataType::Int, DataType::Int]).unwrap();
        assert_eq!(e.return_type(), DataType::Double);
        assert!(e.evaluate(&[Value::Int(1)]).is_err());
    }

    #[test]
    fn legacy_max() {
        let f = GetMaxNum;
        let ints = vec![Value::Int(1), Value::Int(5)];
        assert_eq!(eval(&f, ints), Value::Long(5));
        let with_null = vec![Value::Null, Value::Long(-2)];
        assert_eq!(eval(&f, with_null), Value::Long(-2));
        assert_eq!(eval(&f, vec![Value::Null, Value::Null]), Value::Null);
        let resolved = f.resolve(&[DataType::Double, DataType::Int]);
        assert!(resolved.is_err());
    }
}
