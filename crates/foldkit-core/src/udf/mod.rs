use core::fmt::Debug;

use crate::{
    error::Result,
    registry::Description,
    types::{DataType, Value},
};

mod max_num;

pub use max_num::{GetMaxNum, GetMaxNumGeneric};

/// A user-defined scalar function
pub trait ScalarFunction: Debug + Send + Sync {
    /// Name and usage of the function
    fn description(&self) -> &Description;

    /// Validates the declared argument types once, before any row is evaluated
    fn resolve(&self, arguments: &[DataType]) -> Result<Box<dyn ScalarEvaluator>>;
}

/// A scalar function bound to its argument types
pub trait ScalarEvaluator: Debug + Send + Sync {
    /// Type of the value returned by [Self::evaluate]
    fn return_type(&self) -> DataType;

    /// Evaluates one row
    fn evaluate(&self, arguments: &[Value]) -> Result<Value>;
}
