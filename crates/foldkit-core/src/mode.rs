use core::fmt;

/// Stage an aggregate evaluator is running in.
///
/// The mode decides both what a stage consumes (raw rows or partial snapshots) and
/// what it emits (a partial snapshot or the final result).
///
/// | Mode             | Consumes | Emits   |
/// |------------------|----------|---------|
/// | `SingleStage`    | raw      | final   |
/// | `PartialCollect` | raw      | partial |
/// | `Merge`          | partial  | partial |
/// | `Final`          | partial  | final   |
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Raw rows folded straight into the final result
    #[default]
    SingleStage,
    /// First stage of a distributed aggregation
    PartialCollect,
    /// Intermediate stage combining partial snapshots
    Merge,
    /// Last stage turning partial snapshots into the final result
    Final,
}

impl Mode {
    /// Returns `true` if rows entering this stage are raw function arguments
    pub fn consumes_raw(&self) -> bool {
        matches!(self, Mode::SingleStage | Mode::PartialCollect)
    }

    /// Returns `true` if this stage emits partial snapshots
    pub fn emits_partial(&self) -> bool {
        matches!(self, Mode::PartialCollect | Mode::Merge)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::SingleStage => "single-stage",
            Mode::PartialCollect => "partial-collect",
            Mode::Merge => "merge",
            Mode::Final => "final",
        };
        f.write_str(name)
    }
}
