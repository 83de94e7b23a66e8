//! Partial snapshots crossing a process boundary.
//!
//! Encoding uses postcard, so both sides must agree on the snapshot type.

use crate::{error::Result, types::Value};

/// Encodes a host value (typically a partial snapshot) into bytes
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(value)?)
}

/// Decodes a host value previously produced by [encode]
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Ok(postcard::from_bytes(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{
        Aggregator,
        ValueAggregator,
        avg::{AvgAggregator, AvgPartial},
        max::StringMaxAggregator,
    };

    #[test]
    fn partials_survive_the_wire() {
        let acc = AvgAggregator::fold_all([Some(1.0), Some(2.0)]);
        let value = AvgAggregator::partial_into_value(AvgAggregator::snapshot(acc));
        let decoded = decode(&encode(&value).unwrap()).unwrap();
        let partial = AvgAggregator::partial_from_value(&decoded).unwrap();
        assert_eq!(partial, Some(AvgPartial { count: 2, sum: 3.0 }));

        let mut other = AvgAggregator::fold_all([Some(6.0)]);
        AvgAggregator::merge(&mut other, partial.unwrap());
        assert_eq!(AvgAggregator::finalize(other), Some(3.0));

        let empty = StringMaxAggregator::partial_into_value(None);
        let decoded = decode(&encode(&empty).unwrap()).unwrap();
        let partial = StringMaxAggregator::partial_from_value(&decoded).unwrap();
        assert_eq!(partial, None);
    }

    #[test]
    fn struct_values_keep_field_names() {
        let value = Value::record([
            ("count", Value::Long(2)),
            ("sum", Value::Double(1.5)),
        ]);
        let decoded = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(decoded.field("count"), Some(&Value::Long(2)));
        assert_eq!(decoded, value);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode(&[0xff, 0xff, 0xff]).is_err());
    }
}
