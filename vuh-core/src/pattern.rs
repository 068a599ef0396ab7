//! File patterns with optional per-simulator restrictions.

use serde::Deserialize;
use std::fmt::Display;

/// Which simulators a [FilePattern] applies to.
///
/// The allow list and the deny list are mutually exclusive. A deny list is
/// only ever checked against the names it denies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Restriction {
    /// The pattern is evaluated for every simulator.
    #[default]
    Unrestricted,

    /// The pattern is only evaluated for the listed simulators.
    Only(Vec<String>),

    /// The pattern is evaluated for every simulator except the listed ones.
    Except(Vec<String>),
}

impl Restriction {
    /// Does a pattern with this restriction apply when `context` is the
    /// active simulator?
    pub fn applies_to(&self, context: &str) -> bool {
        match self {
            Restriction::Unrestricted => true,
            Restriction::Only(names) => names.iter().any(|n| n == context),
            Restriction::Except(names) => !names.iter().any(|n| n == context),
        }
    }
}

impl Display for Restriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Restriction::Unrestricted => write!(f, "any simulator"),
            Restriction::Only(names) => {
                write!(f, "when simulator is {}", names.join(" | "))
            }
            Restriction::Except(names) => {
                write!(f, "when simulator is not {}", names.join(" | "))
            }
        }
    }
}

/// A single simulator name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for OneOrMany {
    fn from(value: Vec<S>) -> Self {
        OneOrMany::Many(value.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for OneOrMany {
    fn from(value: [S; N]) -> Self {
        OneOrMany::Many(value.into_iter().map(Into::into).collect())
    }
}

/// A glob pattern plus the simulators it is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawFilePattern")]
pub struct FilePattern {
    pub pattern: String,
    pub restriction: Restriction,
}

impl FilePattern {
    /// An unrestricted pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            restriction: Restriction::Unrestricted,
        }
    }

    /// Only evaluate this pattern for the given simulators. Replaces any
    /// earlier restriction.
    pub fn when_simulator_is(mut self, names: impl Into<OneOrMany>) -> Self {
        self.restriction = Restriction::Only(names.into().into());
        self
    }

    /// Evaluate this pattern for every simulator except the given ones.
    /// Replaces any earlier restriction.
    pub fn when_simulator_is_not(
        mut self,
        names: impl Into<OneOrMany>,
    ) -> Self {
        self.restriction = Restriction::Except(names.into().into());
        self
    }

    /// Is this pattern evaluated when `context` is the active simulator?
    pub fn applies_to(&self, context: &str) -> bool {
        self.restriction.applies_to(context)
    }
}

impl From<&str> for FilePattern {
    fn from(value: &str) -> Self {
        FilePattern::new(value)
    }
}

impl Display for FilePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.restriction {
            Restriction::Unrestricted => write!(f, "{}", self.pattern),
            _ => write!(f, "{} ({})", self.pattern, self.restriction),
        }
    }
}

/// The on-disk form of a pattern: either a bare glob or a table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilePattern {
    Bare(String),
    Table {
        pattern: String,
        when_simulator_is: Option<OneOrMany>,
        when_simulator_is_not: Option<OneOrMany>,
    },
}

impl TryFrom<RawFilePattern> for FilePattern {
    type Error = String;

    fn try_from(raw: RawFilePattern) -> Result<Self, Self::Error> {
        match raw {
            RawFilePattern::Bare(pattern) => Ok(FilePattern::new(pattern)),
            RawFilePattern::Table {
                pattern,
                when_simulator_is,
                when_simulator_is_not,
            } => match (when_simulator_is, when_simulator_is_not) {
                (Some(_), Some(_)) => Err(format!(
                    "pattern `{pattern}` sets both `when_simulator_is` and `when_simulator_is_not`"
                )),
                (Some(only), None) => {
                    Ok(FilePattern::new(pattern).when_simulator_is(only))
                }
                (None, Some(except)) => {
                    Ok(FilePattern::new(pattern).when_simulator_is_not(except))
                }
                (None, None) => Ok(FilePattern::new(pattern)),
            },
        }
    }
}
