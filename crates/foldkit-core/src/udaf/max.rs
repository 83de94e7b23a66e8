use crate::{
    aggregator::max::{
        F32MaxAggregator,
        F64MaxAggregator,
        I16MaxAggregator,
        I32MaxAggregator,
        I64MaxAggregator,
        StringMaxAggregator,
    },
    error::{Error, Result},
    mode::Mode,
    registry::Description,
    types::DataType,
    udaf::{AggregateFunction, Evaluator, single_argument},
};

const MAX: Description = Description {
    name: "max_udaf",
    value: "_FUNC_(expr) - Returns the maximum value of expr",
    extended: None,
};

/// `max_udaf`: running maximum over a smallint, int, bigint, float, double or string column
///
/// Partials carry the plain maximum, NULL standing for an empty group.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxFunction;

impl AggregateFunction for MaxFunction {
    fn description(&self) -> &Description {
        &MAX
    }

    fn resolve(&self, arguments: &[DataType], mode: Mode) -> Result<Evaluator> {
        let argument = single_argument(MAX.name, arguments)?;
        let evaluator = match argument {
            DataType::Byte | DataType::Short => {
                Evaluator::new::<I16MaxAggregator>(MAX.name, mode, argument)
            }
            DataType::Int => Evaluator::new::<I32MaxAggregator>(MAX.name, mode, argument),
            DataType::Long => Evaluator::new::<I64MaxAggregator>(MAX.name, mode, argument),
            DataType::Float => Evaluator::new::<F32MaxAggregator>(MAX.name, mode, argument),
            DataType::Double => Evaluator::new::<F64MaxAggregator>(MAX.name, mode, argument),
            DataType::String | DataType::Varchar(_) | DataType::Char(_) => {
                Evaluator::new::<StringMaxAggregator>(MAX.name, mode, argument)
            }
            other => {
                return Err(Error::ArgumentType {
                    function: MAX.name,
                    position: 0,
                    actual: other.clone(),
                    message: "expected smallint, int, bigint, float, double or string",
                });
            }
        };
        Ok(evaluator)
    }
}
