//! foldkit provides Hive-style user-defined functions on top of a partial aggregation contract
//!
//! The [Aggregator] trait captures the four operations a distributed grouped aggregation
//! needs: fold raw rows, emit a transportable partial snapshot, merge snapshots and
//! finalize. [udaf], [udf] and [udtf] expose the built-in functions to a host, and
//! [FunctionRegistry] looks them up by name.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub use foldkit_core::*;
