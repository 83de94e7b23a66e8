use core::fmt::Debug;

use crate::{
    error::Result,
    registry::Description,
    types::{DataType, Field, Value},
};

mod split;

pub use split::{SplitExplode, SplitPieces};

/// Lazily produced output rows of a table-generating function
pub type Rows<'a> = Box<dyn Iterator<Item = Vec<Value>> + 'a>;

/// A user-defined table-generating function
pub trait TableFunction: Debug + Send + Sync {
    /// Name and usage of the function
    fn description(&self) -> &Description;

    /// Validates the declared argument types and returns the output schema
    fn initialize(&self, arguments: &[DataType]) -> Result<Vec<Field>>;

    /// Produces the output rows for one input row.
    ///
    /// Every call returns a fresh iterator; rows are generated on demand.
    fn process<'a>(&self, arguments: &'a [Value]) -> Result<Rows<'a>>;
}
