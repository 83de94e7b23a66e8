use crate::{
    aggregator::{Aggregator, PartialAggregateType, ValueAggregator},
    coerce,
    error::{Error, Result},
    types::{DataType, Field, Value},
};

/// Running state of an AVG aggregation
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct AvgState {
    /// Number of non-null inputs seen
    pub count: u64,
    /// Sum of all non-null inputs seen
    pub sum: f64,
}

/// Partial snapshot of an AVG aggregation
///
/// Field names are part of the host contract, a downstream stage looks them up by name.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct AvgPartial {
    /// Number of non-null inputs behind this partial
    pub count: u64,
    /// Sum of the inputs behind this partial
    pub sum: f64,
}

impl PartialAggregateType for AvgPartial {}

impl AvgPartial {
    /// Host type of the partial snapshot
    pub fn data_type() -> DataType {
        DataType::Struct(vec![
            Field::new("count", DataType::Long),
            Field::new("sum", DataType::Double),
        ])
    }

    fn into_value(self) -> Value {
        // saturates at the largest bigint
        let count = i64::try_from(self.count).unwrap_or(i64::MAX);
        Value::record([
            ("count", Value::Long(count)),
            ("sum", Value::Double(self.sum)),
        ])
    }

    fn from_value(value: &Value) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }
        let unexpected = || Error::UnexpectedPartial {
            expected: Self::data_type(),
            actual: value.to_string(),
        };
        let count = match value.field("count") {
            Some(Value::Long(c)) => u64::try_from(*c).map_err(|_| unexpected())?,
            _ => return Err(unexpected()),
        };
        let sum = match value.field("sum") {
            Some(Value::Double(s)) => *s,
            _ => return Err(unexpected()),
        };
        Ok(Some(Self { count, sum }))
    }
}

/// AVG over doubles using the generic partial/merge interface
///
/// The empty snapshot is `(0, 0.0)` rather than NULL.
#[derive(Default, Debug, Clone, Copy)]
pub struct AvgAggregator;

impl Aggregator for AvgAggregator {
    type Input = f64;
    type Accumulator = AvgState;
    type PartialAggregate = AvgPartial;
    type Aggregate = f64;

    fn new_accumulator() -> Self::Accumulator {
        AvgState::default()
    }

    #[inline]
    fn fold(acc: &mut Self::Accumulator, input: Self::Input) {
        acc.count += 1;
        acc.sum += input;
    }

    fn snapshot(acc: Self::Accumulator) -> Self::PartialAggregate {
        AvgPartial {
            count: acc.count,
            sum: acc.sum,
        }
    }

    #[inline]
    fn merge(acc: &mut Self::Accumulator, partial: Self::PartialAggregate) {
        acc.count += partial.count;
        acc.sum += partial.sum;
    }

    fn finalize(acc: Self::Accumulator) -> Option<Self::Aggregate> {
        if acc.count == 0 {
            None
        } else {
            Some(acc.sum / acc.count as f64)
        }
    }
}

impl ValueAggregator for AvgAggregator {
    fn input_from_value(value: &Value) -> Result<Option<Self::Input>> {
        coerce::to_double(value)
    }

    fn partial_type(_argument: &DataType) -> DataType {
        AvgPartial::data_type()
    }

    fn output_type(_argument: &DataType) -> DataType {
        DataType::Double
    }

    fn partial_into_value(partial: Self::PartialAggregate) -> Value {
        partial.into_value()
    }

    fn partial_from_value(value: &Value) -> Result<Option<Self::PartialAggregate>> {
        AvgPartial::from_value(value)
    }

    fn aggregate_into_value(aggregate: Option<Self::Aggregate>) -> Value {
        aggregate.map_or(Value::Null, Value::Double)
    }
}

/// AVG over doubles using the legacy simple-aggregation interface
///
/// Identical to [AvgAggregator] except that an accumulator which has seen no input
/// emits a NULL snapshot.
#[derive(Default, Debug, Clone, Copy)]
pub struct LegacyAvgAggregator;

impl Aggregator for LegacyAvgAggregator {
    type Input = f64;
    type Accumulator = AvgState;
    type PartialAggregate = Option<AvgPartial>;
    type Aggregate = f64;

    fn new_accumulator() -> Self::Accumulator {
        AvgAggregator::new_accumulator()
    }

    #[inline]
    fn fold(acc: &mut Self::Accumulator, input: Self::Input) {
        AvgAggregator::fold(acc, input)
    }

    fn snapshot(acc: Self::Accumulator) -> Self::PartialAggregate {
        (acc.count > 0).then(|| AvgAggregator::snapshot(acc))
    }

    fn merge(acc: &mut Self::Accumulator, partial: Self::PartialAggregate) {
        if let Some(partial) = partial {
            AvgAggregator::merge(acc, partial);
        }
    }

    fn finalize(acc: Self::Accumulator) -> Option<Self::Aggregate> {
        AvgAggregator::finalize(acc)
    }
}

impl ValueAggregator for LegacyAvgAggregator {
    fn input_from_value(value: &Value) -> Result<Option<Self::Input>> {
        coerce::to_double(value)
    }

    fn partial_type(_argument: &DataType) -> DataType {
        AvgPartial::data_type()
    }

    fn output_type(_argument: &DataType) -> DataType {
        DataType::Double
    }

    fn partial_into_value(partial: Self::PartialAggregate) -> Value {
        partial.map_or(Value::Null, AvgPartial::into_value)
    }

    fn partial_from_value(value: &Value) -> Result<Option<Self::PartialAggregate>> {
        // a NULL row and a NULL snapshot are both no-ops on merge
        AvgPartial::from_value(value).map(|p| p.map(Some))
    }

    fn aggregate_into_value(aggregate: Option<Self::Aggregate>) -> Value {
        aggregate.map_or(Value::Null, Value::Double)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn avg_of(values: &[Option<f64>]) -> Option<f64> {
        let acc = AvgAggregator::fold_all(values.iter().copied());
        AvgAggregator::finalize(acc)
    }

    #[test]
    fn avg_test() {
        assert_eq!(avg_of(&[Some(1.0), Some(2.0), Some(6.0)]), Some(3.0));
        assert_eq!(avg_of(&[Some(1.0), None, Some(2.0)]), Some(1.5));
        assert_eq!(avg_of(&[]), None);
        assert_eq!(avg_of(&[None, None]), None);
    }

    #[test]
    fn empty_snapshot() {
        let partial = AvgAggregator::snapshot(AvgAggregator::new_accumulator());
        assert_eq!(partial, AvgPartial { count: 0, sum: 0.0 });

        let mut acc = AvgAggregator::fold_all([Some(4.0)]);
        AvgAggregator::merge(&mut acc, partial);
        assert_eq!(acc, AvgState { count: 1, sum: 4.0 });

        assert_eq!(
            LegacyAvgAggregator::snapshot(LegacyAvgAggregator::new_accumulator()),
            None
        );
    }

    #[test]
    fn partial_value_roundtrip() {
        let partial = AvgPartial { count: 3, sum: 7.5 };
        let value = AvgAggregator::partial_into_value(partial);
        assert_eq!(value.field("count"), Some(&Value::Long(3)));
        assert_eq!(value.field("sum"), Some(&Value::Double(7.5)));
        let decoded = AvgAggregator::partial_from_value(&value).unwrap();
        assert_eq!(decoded, Some(partial));
        let null = AvgAggregator::partial_from_value(&Value::Null).unwrap();
        assert_eq!(null, None);
        assert!(AvgAggregator::partial_from_value(&Value::Long(1)).is_err());

        let negative = Value::record([
            ("count", Value::Long(-1)),
            ("sum", Value::Double(0.0)),
        ]);
        assert!(AvgAggregator::partial_from_value(&negative).is_err());
    }

    #[test]
    fn partial_count_saturates() {
        let partial = AvgPartial {
            count: u64::MAX,
            sum: 1.0,
        };
        let value = partial.into_value();
        assert_eq!(value.field("count"), Some(&Value::Long(i64::MAX)));
    }

    #[test]
    fn legacy_partial_values() {
        assert_eq!(LegacyAvgAggregator::partial_into_value(None), Value::Null);
        assert_eq!(
            LegacyAvgAggregator::partial_from_value(&Value::Null).unwrap(),
            None
        );
    }

    fn snapshot_of(values: &[f64]) -> AvgPartial {
        let acc = AvgAggregator::fold_all(values.iter().copied().map(Some));
        AvgAggregator::snapshot(acc)
    }

    proptest! {
        #[test]
        fn matches_mean(xs in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
            let expected = xs.iter().sum::<f64>() / xs.len() as f64;
            let inputs = xs.iter().copied().map(Some).collect::<Vec<_>>();
            let got = avg_of(&inputs).unwrap();
            prop_assert!((got - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }

        #[test]
        fn merge_equals_fold(
            xs in prop::collection::vec(-1.0e3f64..1.0e3, 0..64),
            split in 0usize..64,
        ) {
            let (a, b) = xs.split_at(split.min(xs.len()));
            let mut merged = AvgAggregator::new_accumulator();
            AvgAggregator::merge(&mut merged, snapshot_of(a));
            AvgAggregator::merge(&mut merged, snapshot_of(b));
            let direct = AvgAggregator::fold_all(xs.iter().copied().map(Some));

            prop_assert_eq!(merged.count, direct.count);
            prop_assert!((merged.sum - direct.sum).abs() <= 1e-6);
        }

        #[test]
        fn nulls_are_skipped(
            xs in prop::collection::vec(prop::option::of(-1.0e3f64..1.0e3), 0..64),
        ) {
            let with_nulls = AvgAggregator::fold_all(xs.iter().copied());
            let present = xs.iter().flatten().copied().map(Some);
            prop_assert_eq!(with_nulls, AvgAggregator::fold_all(present));
        }
    }
}
