use core::fmt::Debug;

use crate::{
    error::Result,
    types::{DataType, Value},
};

/// Incremental AVG aggregation
pub mod avg;
/// Incremental MAX aggregation
pub mod max;

/// Partial aggregation interface shared by every aggregate function in foldkit.
///
/// A distributed grouped aggregation drives an aggregator per grouping key through
/// the following calls:
///
/// 1. [Self::new_accumulator] once per key and stage.
/// 2. [Self::fold] for every raw input row (first stage), or
///    [Self::merge] for every partial snapshot shipped from an upstream stage.
/// 3. [Self::snapshot] if another stage follows, otherwise [Self::finalize].
///
/// An accumulator is consumed by exactly one of the two terminal calls.
///
/// # Example
///
/// Here is a simple example showing how to create a COUNT aggregator.
/// ```
/// use foldkit_core::Aggregator;
///
/// #[derive(Default, Debug, Clone)]
/// struct CountAggregator;
///
/// impl Aggregator for CountAggregator {
///     type Input = u64;
///     type Accumulator = u64;
///     type PartialAggregate = u64;
///     type Aggregate = u64;
///
///     fn new_accumulator() -> Self::Accumulator {
///         0
///     }
///
///     fn fold(acc: &mut Self::Accumulator, _input: Self::Input) {
///         *acc += 1;
///     }
///
///     fn snapshot(acc: Self::Accumulator) -> Self::PartialAggregate {
///         acc
///     }
///
///     fn merge(acc: &mut Self::Accumulator, partial: Self::PartialAggregate) {
///         *acc += partial;
///     }
///
///     fn finalize(acc: Self::Accumulator) -> Option<Self::Aggregate> {
///         Some(acc)
///     }
/// }
///
/// let mut acc = CountAggregator::new_accumulator();
/// CountAggregator::fold_nullable(&mut acc, Some(10));
/// CountAggregator::fold_nullable(&mut acc, None);
/// assert_eq!(CountAggregator::finalize(acc), Some(1));
/// ```
pub trait Aggregator: Default + Debug + Clone + 'static {
    /// Non-null raw input that can be folded into a [Self::Accumulator].
    type Input: InputBounds;

    /// Mutable state private to one grouping key during one stage.
    type Accumulator: AccumulatorType;

    /// Transportable projection of an accumulator.
    ///
    /// Must carry exactly the fields needed to rebuild equivalent state on merge.
    type PartialAggregate: PartialAggregateType;

    /// Final result type.
    ///
    /// In many cases the [Self::PartialAggregate] carries more than the final result.
    /// An AVG function for example ships a `(count, sum)` pair and lowers it into
    /// `sum / count` only at the very end.
    type Aggregate: Debug + Send;

    /// Returns a fresh accumulator that has seen no input.
    fn new_accumulator() -> Self::Accumulator;

    /// Folds one raw input into the accumulator.
    fn fold(acc: &mut Self::Accumulator, input: Self::Input);

    /// Consumes the accumulator and emits its partial snapshot.
    fn snapshot(acc: Self::Accumulator) -> Self::PartialAggregate;

    /// Merges a partial snapshot from another stage into the accumulator.
    ///
    /// This is not necessarily the same as [Self::fold]: for AVG a snapshot is a
    /// pre-aggregated pair while the input is a single scalar.
    fn merge(acc: &mut Self::Accumulator, partial: Self::PartialAggregate);

    /// Consumes the accumulator and emits the final result, `None` meaning NULL.
    fn finalize(acc: Self::Accumulator) -> Option<Self::Aggregate>;

    /// Folds a nullable input where NULL leaves the accumulator untouched.
    #[inline]
    fn fold_nullable(acc: &mut Self::Accumulator, input: Option<Self::Input>) {
        if let Some(input) = input {
            Self::fold(acc, input);
        }
    }

    /// Folds a sequence of nullable inputs into a new accumulator.
    fn fold_all<I>(inputs: I) -> Self::Accumulator
    where
        I: IntoIterator<Item = Option<Self::Input>>,
    {
        let mut acc = Self::new_accumulator();
        for input in inputs {
            Self::fold_nullable(&mut acc, input);
        }
        acc
    }
}

/// Bridges an [Aggregator] to the dynamic [Value] model used by the host.
pub trait ValueAggregator: Aggregator {
    /// Converts a raw argument into an aggregator input, `None` meaning NULL
    fn input_from_value(value: &Value) -> Result<Option<Self::Input>>;

    /// Type of the partial snapshot given the declared argument type
    fn partial_type(argument: &DataType) -> DataType;

    /// Type of the final result given the declared argument type
    fn output_type(argument: &DataType) -> DataType;

    /// Converts a partial snapshot into its host representation
    fn partial_into_value(partial: Self::PartialAggregate) -> Value;

    /// Reads a partial snapshot shipped by an upstream stage, `None` meaning NULL
    fn partial_from_value(value: &Value) -> Result<Option<Self::PartialAggregate>>;

    /// Converts a final result into its host representation
    fn aggregate_into_value(aggregate: Option<Self::Aggregate>) -> Value;
}

/// Bounds for Aggregator Input
pub trait InputBounds: Debug + Clone + Send {}
impl<T> InputBounds for T where T: Debug + Clone + Send {}

/// An accumulator type
#[cfg(not(feature = "serde"))]
pub trait AccumulatorType: Debug + Clone + Send {}
/// An accumulator type
#[cfg(feature = "serde")]
pub trait AccumulatorType:
    Debug + Clone + Send + serde::Serialize + for<'a> serde::Deserialize<'a>
{
}

#[cfg(not(feature = "serde"))]
impl<T> AccumulatorType for T where T: Debug + Clone + Send {}

#[cfg(feature = "serde")]
impl<T> AccumulatorType for T where
    T: Debug + Clone + Send + serde::Serialize + for<'a> serde::Deserialize<'a> + 'static
{
}

/// Trait bounds for a partial aggregate type
#[cfg(not(feature = "serde"))]
pub trait PartialAggregateBounds: Default + Debug + Clone + Send {}

/// Trait bounds for a partial aggregate type
#[cfg(feature = "serde")]
pub trait PartialAggregateBounds:
    Default + Debug + Clone + Send + serde::Serialize + for<'a> serde::Deserialize<'a>
{
}

#[cfg(not(feature = "serde"))]
impl<T> PartialAggregateBounds for T where T: Default + Debug + Clone + Send {}

#[cfg(feature = "serde")]
impl<T> PartialAggregateBounds for T where
    T: Default + Debug + Clone + Send + serde::Serialize + for<'a> serde::Deserialize<'a>
{
}

/// An immutable partial aggregate type
pub trait PartialAggregateType: PartialAggregateBounds {}

macro_rules! primitive_partial {
    ($type:ty) => {
        impl PartialAggregateType for $type {}
    };
}

primitive_partial!(i16);
primitive_partial!(i32);
primitive_partial!(i64);
primitive_partial!(u64);
primitive_partial!(f32);
primitive_partial!(f64);
primitive_partial!(String);

impl<T: PartialAggregateType> PartialAggregateType for Option<T> {}
