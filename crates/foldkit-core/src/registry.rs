use std::sync::Arc;

use hashbrown::HashMap;

use crate::{
    error::{Error, Result},
    udaf::{AggregateFunction, AvgFunction, LegacyAvgFunction, MaxFunction},
    udf::{GetMaxNum, GetMaxNumGeneric, ScalarFunction},
    udtf::{SplitExplode, TableFunction},
};

/// Name and usage text of a registered function
///
/// `_FUNC_` inside `value` and `extended` stands for the function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Description {
    /// Registered name
    pub name: &'static str,
    /// One line usage
    pub value: &'static str,
    /// Optional longer help with examples
    pub extended: Option<&'static str>,
}

impl Description {
    /// Returns the usage line with `_FUNC_` replaced by the function name
    pub fn usage(&self) -> String {
        self.value.replace("_FUNC_", self.name)
    }

    /// Returns the extended help with `_FUNC_` replaced by the function name
    pub fn extended_usage(&self) -> Option<String> {
        self.extended.map(|e| e.replace("_FUNC_", self.name))
    }
}

/// Kinds of functions the registry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FunctionKind {
    /// One value per row
    Scalar,
    /// One value per group
    Aggregate,
    /// Zero or more rows per row
    Table,
}

impl FunctionKind {
    fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Scalar => "scalar",
            FunctionKind::Aggregate => "aggregate",
            FunctionKind::Table => "table",
        }
    }
}

/// Named function registration.
///
/// Lookups are case-insensitive.
#[derive(Debug, Default, Clone)]
pub struct FunctionRegistry {
    scalars: HashMap<String, Arc<dyn ScalarFunction>>,
    aggregates: HashMap<String, Arc<dyn AggregateFunction>>,
    tables: HashMap<String, Arc<dyn TableFunction>>,
}

impl FunctionRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in function
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_scalar(GetMaxNum);
        registry.register_scalar(GetMaxNumGeneric);
        registry.register_aggregate(LegacyAvgFunction);
        registry.register_aggregate(AvgFunction);
        registry.register_aggregate(MaxFunction);
        registry.register_table(SplitExplode::new());
        registry
    }

    /// Registers a scalar function under its description name, replacing any previous one
    pub fn register_scalar(&mut self, function: impl ScalarFunction + 'static) {
        let name = function.description().name.to_ascii_lowercase();
        log::debug!("registering scalar function {name}");
        self.scalars.insert(name, Arc::new(function));
    }

    /// Registers an aggregate function under its description name, replacing any previous one
    pub fn register_aggregate(&mut self, function: impl AggregateFunction + 'static) {
        let name = function.description().name.to_ascii_lowercase();
        log::debug!("registering aggregate function {name}");
        self.aggregates.insert(name, Arc::new(function));
    }

    /// Registers a table function under its description name, replacing any previous one
    pub fn register_table(&mut self, function: impl TableFunction + 'static) {
        let name = function.description().name.to_ascii_lowercase();
        log::debug!("registering table function {name}");
        self.tables.insert(name, Arc::new(function));
    }

    /// Looks up a scalar function
    pub fn scalar(&self, name: &str) -> Result<Arc<dyn ScalarFunction>> {
        lookup(&self.scalars, FunctionKind::Scalar, name)
    }

    /// Looks up an aggregate function
    pub fn aggregate(&self, name: &str) -> Result<Arc<dyn AggregateFunction>> {
        lookup(&self.aggregates, FunctionKind::Aggregate, name)
    }

    /// Looks up a table function
    pub fn table(&self, name: &str) -> Result<Arc<dyn TableFunction>> {
        lookup(&self.tables, FunctionKind::Table, name)
    }

    /// Returns all registered functions ordered by kind and name
    pub fn descriptions(&self) -> Vec<(FunctionKind, Description)> {
        let mut all = self
            .scalars
            .values()
            .map(|f| (FunctionKind::Scalar, *f.description()))
            .chain(
                self.aggregates
                    .values()
                    .map(|f| (FunctionKind::Aggregate, *f.description())),
            )
            .chain(
                self.tables
                    .values()
                    .map(|f| (FunctionKind::Table, *f.description())),
            )
            .collect::<Vec<_>>();
        all.sort_by_key(|(kind, description)| (*kind, description.name));
        all
    }
}

fn lookup<F: ?Sized>(
    functions: &HashMap<String, Arc<F>>,
    kind: FunctionKind,
    name: &str,
) -> Result<Arc<F>> {
    functions
        .get(&name.to_ascii_lowercase())
        .cloned()
        .ok_or_else(|| Error::UnknownFunction {
            kind: kind.as_str(),
            name: name.to_string(),
        })
}
