//! Host-facing aggregate functions.
//!
//! An [AggregateFunction] validates its arguments once in [AggregateFunction::resolve]
//! and hands back an [Evaluator] bound to a [Mode]. The evaluator then routes every
//! incoming row to either `fold` or `merge` and every emit to either `snapshot` or
//! `finalize`, depending on that mode alone.

use core::{fmt::Debug, marker::PhantomData};

use crate::{
    aggregator::ValueAggregator,
    error::{Error, Result},
    mode::Mode,
    registry::Description,
    types::{DataType, Field, Value},
};

mod avg;
mod max;

pub use avg::{AvgFunction, LegacyAvgFunction};
pub use max::MaxFunction;

/// A user-defined aggregate function
pub trait AggregateFunction: Debug + Send + Sync {
    /// Name and usage of the function
    fn description(&self) -> &Description;

    /// Validates the declared argument types and returns an evaluator for `mode`.
    ///
    /// `arguments` are always the function's original argument types, whatever the
    /// mode. Any violation is reported here, before a single row is processed.
    fn resolve(&self, arguments: &[DataType], mode: Mode) -> Result<Evaluator>;
}

/// Type-erased accumulator as seen by the host
pub trait DynAccumulator: Debug + Send {
    /// Folds one raw argument value
    fn fold_value(&mut self, value: &Value) -> Result<()>;
    /// Merges one partial snapshot value
    fn merge_value(&mut self, partial: &Value) -> Result<()>;
    /// Consumes the accumulator into its partial snapshot value
    fn snapshot_value(self: Box<Self>) -> Value;
    /// Consumes the accumulator into its final value
    fn finalize_value(self: Box<Self>) -> Value;
}

struct TypedAccumulator<A: ValueAggregator> {
    state: A::Accumulator,
    _marker: PhantomData<fn() -> A>,
}

impl<A: ValueAggregator> Debug for TypedAccumulator<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypedAccumulator")
            .field("state", &self.state)
            .finish()
    }
}

impl<A: ValueAggregator> TypedAccumulator<A> {
    fn new() -> Self {
        Self {
            state: A::new_accumulator(),
            _marker: PhantomData,
        }
    }
}

fn boxed_accumulator<A: ValueAggregator>() -> Box<dyn DynAccumulator> {
    Box::new(TypedAccumulator::<A>::new())
}

impl<A: ValueAggregator> DynAccumulator for TypedAccumulator<A> {
    fn fold_value(&mut self, value: &Value) -> Result<()> {
        let input = A::input_from_value(value)?;
        A::fold_nullable(&mut self.state, input);
        Ok(())
    }

    fn merge_value(&mut self, partial: &Value) -> Result<()> {
        if let Some(partial) = A::partial_from_value(partial)? {
            A::merge(&mut self.state, partial);
        }
        Ok(())
    }

    fn snapshot_value(self: Box<Self>) -> Value {
        A::partial_into_value(A::snapshot(self.state))
    }

    fn finalize_value(self: Box<Self>) -> Value {
        A::aggregate_into_value(A::finalize(self.state))
    }
}

/// An aggregate function bound to argument types and a [Mode]
#[derive(Debug, Clone)]
pub struct Evaluator {
    function: &'static str,
    mode: Mode,
    input_type: DataType,
    output_type: DataType,
    factory: fn() -> Box<dyn DynAccumulator>,
}

impl Evaluator {
    /// Creates an evaluator backed by the aggregator `A`
    pub fn new<A: ValueAggregator>(
        function: &'static str,
        mode: Mode,
        argument: &DataType,
    ) -> Self {
        let partial = A::partial_type(argument);
        let input_type = if mode.consumes_raw() {
            argument.clone()
        } else {
            partial.clone()
        };
        let output_type = if mode.emits_partial() {
            partial
        } else {
            A::output_type(argument)
        };
        log::debug!(
            "resolved {function}({argument}) in {mode} mode: {input_type} -> {output_type}"
        );
        Self {
            function,
            mode,
            input_type,
            output_type,
            factory: boxed_accumulator::<A>,
        }
    }

    /// Name of the function this evaluator belongs to
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// The mode this evaluator runs in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Type of the rows this evaluator consumes
    pub fn input_type(&self) -> &DataType {
        &self.input_type
    }

    /// Type of the values this evaluator emits
    pub fn output_type(&self) -> &DataType {
        &self.output_type
    }

    /// Checks that rows emitted by `upstream` can be consumed by this evaluator.
    ///
    /// Struct partials are matched by field name and field type.
    pub fn accepts(&self, upstream: &Evaluator) -> Result<()> {
        if self.mode.consumes_raw() || !upstream.mode.emits_partial() {
            return Err(Error::InvalidConf(
                "a merging stage must follow a stage that emits partials",
            ));
        }
        if compatible(&self.input_type, &upstream.output_type) {
            Ok(())
        } else {
            Err(Error::UnexpectedPartial {
                expected: self.input_type.clone(),
                actual: upstream.output_type.to_string(),
            })
        }
    }

    /// Returns a fresh accumulator
    pub fn new_accumulator(&self) -> Box<dyn DynAccumulator> {
        (self.factory)()
    }

    /// Feeds one row into `acc`, folding raw rows and merging partial ones
    pub fn update(&self, acc: &mut dyn DynAccumulator, row: &Value) -> Result<()> {
        match self.mode {
            Mode::SingleStage | Mode::PartialCollect => acc.fold_value(row),
            Mode::Merge | Mode::Final => acc.merge_value(row),
        }
    }

    /// Consumes `acc` into a partial snapshot or the final result
    pub fn emit(&self, acc: Box<dyn DynAccumulator>) -> Value {
        match self.mode {
            Mode::PartialCollect | Mode::Merge => acc.snapshot_value(),
            Mode::SingleStage | Mode::Final => acc.finalize_value(),
        }
    }
}

fn compatible(expected: &DataType, actual: &DataType) -> bool {
    match (expected, actual) {
        (DataType::Struct(expected), DataType::Struct(actual)) => {
            expected.iter().all(|field| has_field(actual, field))
        }
        (expected, actual) => expected == actual,
    }
}

fn has_field(fields: &[Field], wanted: &Field) -> bool {
    fields
        .iter()
        .filter(|f| f.name == wanted.name)
        .any(|f| compatible(&wanted.data_type, &f.data_type))
}

/// Checks that exactly one primitive argument was passed and returns it
pub(crate) fn single_argument<'a>(
    function: &'static str,
    arguments: &'a [DataType],
) -> Result<&'a DataType> {
    match arguments {
        [argument] if argument.is_primitive() => Ok(argument),
        [argument] => Err(Error::ArgumentType {
            function,
            position: 0,
            actual: argument.clone(),
            message: "only primitive type arguments are accepted",
        }),
        _ => Err(Error::ArgumentCount {
            function,
            expected: "exactly 1",
            actual: arguments.len(),
        }),
    }
}
