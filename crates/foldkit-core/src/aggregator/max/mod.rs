use core::cmp::Ordering;

use crate::{
    aggregator::{Aggregator, ValueAggregator},
    coerce::FromValue,
    error::Result,
    types::{DataType, Value},
};

/// Running state of a MAX aggregation
///
/// `current` is `None` until the first non-null input arrives.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MaxState<T> {
    current: Option<T>,
}

impl<T> Default for MaxState<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T> MaxState<T> {
    /// Returns `true` if no non-null input has been folded in yet
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the current maximum if any
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    #[inline]
    fn offer(&mut self, input: T, cmp: impl Fn(&T, &T) -> Ordering) {
        match &self.current {
            Some(current) if cmp(current, &input) != Ordering::Less => {}
            _ => self.current = Some(input),
        }
    }
}

// total order where every NaN, whatever its sign, ranks above all numbers
macro_rules! nan_greatest {
    ($name:ident, $type:ty) => {
        fn $name(a: &$type, b: &$type) -> Ordering {
            a.is_nan().cmp(&b.is_nan()).then_with(|| a.total_cmp(b))
        }
    };
}

nan_greatest!(f32_cmp, f32);
nan_greatest!(f64_cmp, f64);

macro_rules! max_impl {
    ($struct:tt, $type:ty, $cmp:expr, $variant:ident, $data_type:expr) => {
        #[derive(Default, Debug, Clone, Copy)]
        #[allow(missing_docs)]
        pub struct $struct;

        impl Aggregator for $struct {
            type Input = $type;
            type Accumulator = MaxState<$type>;
            type PartialAggregate = Option<$type>;
            type Aggregate = $type;

            fn new_accumulator() -> Self::Accumulator {
                MaxState::default()
            }

            #[inline]
            fn fold(acc: &mut Self::Accumulator, input: Self::Input) {
                acc.offer(input, $cmp);
            }

            fn snapshot(acc: Self::Accumulator) -> Self::PartialAggregate {
                acc.current
            }

            // merging a snapshot is folding its value
            #[inline]
            fn merge(acc: &mut Self::Accumulator, partial: Self::PartialAggregate) {
                Self::fold_nullable(acc, partial);
            }

            fn finalize(acc: Self::Accumulator) -> Option<Self::Aggregate> {
                acc.current
            }
        }

        impl ValueAggregator for $struct {
            fn input_from_value(value: &Value) -> Result<Option<Self::Input>> {
                <$type>::from_value(value)
            }

            fn partial_type(_argument: &DataType) -> DataType {
                $data_type
            }

            fn output_type(_argument: &DataType) -> DataType {
                $data_type
            }

            fn partial_into_value(partial: Self::PartialAggregate) -> Value {
                partial.map_or(Value::Null, Value::$variant)
            }

            fn partial_from_value(value: &Value) -> Result<Option<Self::PartialAggregate>> {
                <$type>::from_value(value).map(|v| v.map(Some))
            }

            fn aggregate_into_value(aggregate: Option<Self::Aggregate>) -> Value {
                aggregate.map_or(Value::Null, Value::$variant)
            }
        }
    };
}

max_impl!(I16MaxAggregator, i16, Ord::cmp, Short, DataType::Short);
max_impl!(I32MaxAggregator, i32, Ord::cmp, Int, DataType::Int);
max_impl!(I64MaxAggregator, i64, Ord::cmp, Long, DataType::Long);
max_impl!(F32MaxAggregator, f32, f32_cmp, Float, DataType::Float);
max_impl!(F64MaxAggregator, f64, f64_cmp, Double, DataType::Double);
max_impl!(
    StringMaxAggregator,
    String,
    Ord::cmp,
    String,
    DataType::String
);
