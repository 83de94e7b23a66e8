use crate::{
    aggregator::avg::{AvgAggregator, LegacyAvgAggregator},
    error::{Error, Result},
    mode::Mode,
    registry::Description,
    types::DataType,
    udaf::{AggregateFunction, Evaluator, single_argument},
};

const AVG_GEN: Description = Description {
    name: "avg_udaf_gen",
    value: "_FUNC_(x) - Returns the mean of a set of numbers",
    extended: Some("Example:\n  > SELECT _FUNC_(age) FROM table GROUP BY class;"),
};

const AVG_LEGACY: Description = Description {
    name: "avg_udaf",
    value: "_FUNC_(x) - Returns the mean of a set of numbers",
    extended: Some("Example:\n  > SELECT _FUNC_(age) FROM table GROUP BY class;"),
};

/// `avg_udaf_gen`: mean of a numeric, string or timestamp column
///
/// Partials are `struct<count:bigint,sum:double>`; an empty group still ships `(0, 0.0)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvgFunction;

impl AggregateFunction for AvgFunction {
    fn description(&self) -> &Description {
        &AVG_GEN
    }

    fn resolve(&self, arguments: &[DataType], mode: Mode) -> Result<Evaluator> {
        let argument = single_argument(AVG_GEN.name, arguments)?;
        match argument {
            DataType::Byte
            | DataType::Short
            | DataType::Int
            | DataType::Long
            | DataType::Float
            | DataType::Double
            | DataType::String
            | DataType::Varchar(_)
            | DataType::Char(_)
            | DataType::Timestamp => Ok(Evaluator::new::<AvgAggregator>(
                AVG_GEN.name,
                mode,
                argument,
            )),
            other => Err(Error::ArgumentType {
                function: AVG_GEN.name,
                position: 0,
                actual: other.clone(),
                message: "only numeric or string type arguments are accepted",
            }),
        }
    }
}

/// `avg_udaf`: mean of a column through the legacy simple-aggregation interface
///
/// Arguments are bridged to double; an empty group ships a NULL partial.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyAvgFunction;

impl AggregateFunction for LegacyAvgFunction {
    fn description(&self) -> &Description {
        &AVG_LEGACY
    }

    fn resolve(&self, arguments: &[DataType], mode: Mode) -> Result<Evaluator> {
        let argument = single_argument(AVG_LEGACY.name, arguments)?;
        match argument {
            DataType::Byte
            | DataType::Short
            | DataType::Int
            | DataType::Long
            | DataType::Float
            | DataType::Double
            | DataType::Decimal { .. }
            | DataType::String
            | DataType::Varchar(_)
            | DataType::Char(_) => Ok(Evaluator::new::<LegacyAvgAggregator>(
                AVG_LEGACY.name,
                mode,
                argument,
            )),
            other => Err(Error::ArgumentType {
                function: AVG_LEGACY.name,
                position: 0,
                actual: other.clone(),
                message: "argument must be convertible to double",
            }),
        }
    }
}
