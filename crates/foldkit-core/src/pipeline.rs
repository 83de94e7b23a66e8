use core::{hash::Hash, num::NonZeroUsize};

use hashbrown::HashMap;

use crate::{
    error::Result,
    mode::Mode,
    types::{DataType, Value},
    udaf::{AggregateFunction, DynAccumulator, Evaluator},
};

/// Configuration for a [Pipeline]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PipelineConf {
    /// Number of input splits aggregated independently in the first stage
    pub partitions: NonZeroUsize,
    /// Number of intermediate stages merging partials pairwise
    pub merge_stages: usize,
    /// Whether partials are encoded and decoded between stages
    #[cfg(feature = "serde")]
    pub ship_partials: bool,
}

impl Default for PipelineConf {
    fn default() -> Self {
        Self {
            partitions: NonZeroUsize::MIN,
            merge_stages: 0,
            #[cfg(feature = "serde")]
            ship_partials: false,
        }
    }
}

impl PipelineConf {
    /// Sets the number of first-stage partitions
    pub fn with_partitions(mut self, partitions: NonZeroUsize) -> Self {
        self.partitions = partitions;
        self
    }

    /// Sets the number of intermediate merge stages
    pub fn with_merge_stages(mut self, merge_stages: usize) -> Self {
        self.merge_stages = merge_stages;
        self
    }

    /// Ships partials through the wire codec between stages
    #[cfg(feature = "serde")]
    pub fn with_ship_partials(mut self, ship_partials: bool) -> Self {
        self.ship_partials = ship_partials;
        self
    }

    /// Returns `true` if raw rows are folded straight into final results
    pub fn is_single_stage(&self) -> bool {
        self.partitions.get() == 1 && self.merge_stages == 0
    }
}

/// In-process grouped aggregation driving evaluators the way a distributed engine would.
///
/// With a single partition and no merge stages rows go through one
/// [Mode::SingleStage] evaluator. Otherwise rows are spread round-robin over the
/// configured partitions, each aggregated by a [Mode::PartialCollect] evaluator, then
/// merged pairwise by [Mode::Merge] evaluators and finished by a [Mode::Final] one.
#[derive(Debug, Default, Clone)]
pub struct Pipeline {
    conf: PipelineConf,
}

type Partition<K> = Vec<(K, Value)>;
type Groups<K> = HashMap<K, Box<dyn DynAccumulator>>;

impl Pipeline {
    /// Creates a pipeline with the given configuration
    pub fn new(conf: PipelineConf) -> Self {
        Self { conf }
    }

    /// Returns the pipeline configuration
    pub fn conf(&self) -> &PipelineConf {
        &self.conf
    }

    /// Aggregates `(key, value)` rows per key and returns the results ordered by key
    pub fn run<K, I>(
        &self,
        function: &dyn AggregateFunction,
        arguments: &[DataType],
        rows: I,
    ) -> Result<Vec<(K, Value)>>
    where
        K: Hash + Eq + Ord,
        I: IntoIterator<Item = (K, Value)>,
    {
        if self.conf.is_single_stage() {
            let evaluator = function.resolve(arguments, Mode::SingleStage)?;
            let groups = aggregate(&evaluator, rows)?;
            return Ok(emit(&evaluator, groups));
        }

        let first = function.resolve(arguments, Mode::PartialCollect)?;
        let merge = function.resolve(arguments, Mode::Merge)?;
        let last = function.resolve(arguments, Mode::Final)?;
        if self.conf.merge_stages > 0 {
            merge.accepts(&first)?;
            last.accepts(&merge)?;
        } else {
            last.accepts(&first)?;
        }

        let n = self.conf.partitions.get();
        let mut splits: Vec<Partition<K>> = (0..n).map(|_| Vec::new()).collect();
        for (i, row) in rows.into_iter().enumerate() {
            splits[i % n].push(row);
        }

        let mut partials = splits
            .into_iter()
            .map(|split| {
                let groups = aggregate(&first, split)?;
                Ok(emit(&first, groups))
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "{}: {} partial stage(s) emitted {} partial(s)",
            first.function(),
            partials.len(),
            partials.iter().map(Vec::len).sum::<usize>()
        );

        for stage in 0..self.conf.merge_stages {
            partials = self.ship(partials)?;
            let mut next = Vec::with_capacity(partials.len().div_ceil(2));
            let mut inputs = partials.into_iter();
            while let Some(left) = inputs.next() {
                let right = inputs.next().unwrap_or_default();
                let groups = aggregate(&merge, left.into_iter().chain(right))?;
                next.push(emit(&merge, groups));
            }
            log::debug!(
                "{}: merge stage {stage} produced {} partition(s)",
                merge.function(),
                next.len()
            );
            partials = next;
        }

        let partials = self.ship(partials)?;
        let groups = aggregate(&last, partials.into_iter().flatten())?;
        Ok(emit(&last, groups))
    }

    #[cfg(feature = "serde")]
    fn ship<K>(&self, partitions: Vec<Partition<K>>) -> Result<Vec<Partition<K>>> {
        if !self.conf.ship_partials {
            return Ok(partitions);
        }
        let mut bytes = 0;
        let shipped = partitions
            .into_iter()
            .map(|partition| {
                partition
                    .into_iter()
                    .map(|(key, value)| {
                        let encoded = crate::wire::encode(&value)?;
                        bytes += encoded.len();
                        Ok((key, crate::wire::decode(&encoded)?))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        log::trace!("shipped {bytes} bytes of partials");
        Ok(shipped)
    }

    #[cfg(not(feature = "serde"))]
    fn ship<K>(&self, partitions: Vec<Partition<K>>) -> Result<Vec<Partition<K>>> {
        Ok(partitions)
    }
}

fn aggregate<K, I>(evaluator: &Evaluator, rows: I) -> Result<Groups<K>>
where
    K: Hash + Eq,
    I: IntoIterator<Item = (K, Value)>,
{
    let mut groups: Groups<K> = HashMap::new();
    let mut count = 0usize;
    for (key, value) in rows {
        let acc = groups
            .entry(key)
            .or_insert_with(|| evaluator.new_accumulator());
        evaluator.update(acc.as_mut(), &value)?;
        count += 1;
    }
    log::trace!(
        "{} ({}): {count} row(s) into {} group(s)",
        evaluator.function(),
        evaluator.mode(),
        groups.len()
    );
    Ok(groups)
}

fn emit<K: Ord>(evaluator: &Evaluator, groups: Groups<K>) -> Partition<K> {
    let mut out = groups
        .into_iter()
        .map(|(key, acc)| (key, evaluator.emit(acc)))
        .collect::<Vec<_>>();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udaf::{AvgFunction, LegacyAvgFunction, MaxFunction};

    fn rows() -> Vec<(&'static str, Value)> {
        vec![
            ("a", Value::Int(1)),
            ("b", Value::Int(10)),
            ("a", Value::Int(2)),
            ("c", Value::Null),
            ("a", Value::Null),
            ("b", Value::Int(-4)),
            ("a", Value::Int(6)),
        ]
    }

    fn confs() -> Vec<PipelineConf> {
        let mut confs = Vec::new();
        for partitions in [1, 2, 3, 7] {
            for merge_stages in [0, 1, 3] {
                confs.push(
                    PipelineConf::default()
                        .with_partitions(NonZeroUsize::new(partitions).unwrap())
                        .with_merge_stages(merge_stages),
                );
            }
        }
        confs
    }

    #[test]
    fn single_stage_avg() {
        let out = Pipeline::default()
            .run(&AvgFunction, &[DataType::Int], rows())
            .unwrap();
        assert_eq!(
            out,
            vec![
                ("a", Value::Double(3.0)),
                ("b", Value::Double(3.0)),
                ("c", Value::Null)
            ]
        );
    }

    #[test]
    fn every_shape_matches_single_stage() {
        let functions: [&dyn AggregateFunction; 3] =
            [&AvgFunction, &LegacyAvgFunction, &MaxFunction];
        for function in functions {
            let expected = Pipeline::default()
                .run(function, &[DataType::Int], rows())
                .unwrap();
            for conf in confs() {
                let out = Pipeline::new(conf)
                    .run(function, &[DataType::Int], rows())
                    .unwrap();
                assert_eq!(out, expected, "{conf:?}");
            }
        }
    }

    #[test]
    fn conf_builder() {
        let conf = PipelineConf::default()
            .with_partitions(NonZeroUsize::new(4).unwrap())
            .with_merge_stages(2);
        let pipeline = Pipeline::new(conf);
        assert_eq!(pipeline.conf().partitions.get(), 4);
        assert_eq!(pipeline.conf().merge_stages, 2);
        assert!(!pipeline.conf().is_single_stage());
        assert!(Pipeline::default().conf().is_single_stage());
    }

    #[test]
    fn resolve_errors_surface_before_rows() {
        let err = Pipeline::default()
            .run(&MaxFunction, &[DataType::Boolean], rows())
            .unwrap_err();
        assert!(err.is_argument_error());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn shipped_partials() {
        let conf = PipelineConf::default()
            .with_partitions(NonZeroUsize::new(3).unwrap())
            .with_merge_stages(1)
            .with_ship_partials(true);
        let out = Pipeline::new(conf)
            .run(&MaxFunction, &[DataType::Int], rows())
            .unwrap();
        assert_eq!(
            out,
            vec![
                ("a", Value::Int(6)),
                ("b", Value::Int(10)),
                ("c", Value::Null)
            ]
        );
    }
}
