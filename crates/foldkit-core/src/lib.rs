//! foldkit-core contains the partial aggregation contract and the query functions built on it
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

/// Aggregator trait and its pre-defined implementations
pub mod aggregator;
/// Coercion of dynamic values into the scalar types aggregators work on
pub mod coerce;
mod error;
/// Aggregation stage modes
pub mod mode;
/// In-process driver that plays the host engine's role
pub mod pipeline;
/// Named function registration
pub mod registry;
/// Dynamic value and type model used at the host boundary
pub mod types;
/// User-defined aggregate functions
pub mod udaf;
/// User-defined scalar functions
pub mod udf;
/// User-defined table-generating functions
pub mod udtf;
/// Wire encoding of partial snapshots
#[cfg(feature = "serde")]
pub mod wire;

pub use aggregator::Aggregator;
pub use error::{Error, Result};
pub use mode::Mode;
pub use pipeline::{Pipeline, PipelineConf};
pub use registry::{Description, FunctionRegistry};
pub use types::{DataType, Decimal, Field, Value};
