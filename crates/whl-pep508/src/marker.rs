//! Environment markers, as they appear after the `;` of a requirement.
//!
//! Markers are parsed into a [`MarkerTree`] and evaluated against a [`MarkerEnvironment`]. Only
//! the variables bound in the environment constrain the result: a comparison against a variable
//! without a value is satisfied, so that a wheel's dependencies are the union across all
//! platforms. The `extra` variable is always bound, either to the extra being resolved or to
//! nothing.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pep440_rs::{Version, VersionSpecifier};
use tracing::warn;

use whl_normalize::{ExtraName, InvalidNameError};

use crate::environment::MarkerEnvironment;
use crate::{ParseError, parser};

/// A variable of the marker environment, other than `extra`.
///
/// <https://packaging.python.org/en/latest/specifications/dependency-specifiers/#environment-markers>
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MarkerVariable {
    ImplementationName,
    ImplementationVersion,
    OsName,
    PlatformMachine,
    PlatformPythonImplementation,
    PlatformRelease,
    PlatformSystem,
    PlatformVersion,
    PythonFullVersion,
    PythonVersion,
    SysPlatform,
}

impl MarkerVariable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImplementationName => "implementation_name",
            Self::ImplementationVersion => "implementation_version",
            Self::OsName => "os_name",
            Self::PlatformMachine => "platform_machine",
            Self::PlatformPythonImplementation => "platform_python_implementation",
            Self::PlatformRelease => "platform_release",
            Self::PlatformSystem => "platform_system",
            Self::PlatformVersion => "platform_version",
            Self::PythonFullVersion => "python_full_version",
            Self::PythonVersion => "python_version",
            Self::SysPlatform => "sys_platform",
        }
    }

    /// Whether the values of the variable are PEP 440 versions.
    pub fn is_version(self) -> bool {
        matches!(
            self,
            Self::ImplementationVersion | Self::PythonFullVersion | Self::PythonVersion
        )
    }
}

impl FromStr for MarkerVariable {
    type Err = UnknownMarkerVariable;

    /// Accepts the PEP 508 names, as well as the dotted names of PEP 345 and
    /// `python_implementation`, which are read as their PEP 508 counterpart.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "implementation_name" => Self::ImplementationName,
            "implementation_version" => Self::ImplementationVersion,
            "os_name" | "os.name" => Self::OsName,
            "platform_machine" | "platform.machine" => Self::PlatformMachine,
            "platform_python_implementation"
            | "platform.python_implementation"
            | "python_implementation" => Self::PlatformPythonImplementation,
            "platform_release" => Self::PlatformRelease,
            "platform_system" => Self::PlatformSystem,
            "platform_version" | "platform.version" => Self::PlatformVersion,
            "python_full_version" => Self::PythonFullVersion,
            "python_version" => Self::PythonVersion,
            "sys_platform" | "sys.platform" => Self::SysPlatform,
            _ => return Err(UnknownMarkerVariable(name.to_string())),
        })
    }
}

impl Display for MarkerVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown marker variable `{0}`")]
pub struct UnknownMarkerVariable(String);

/// One side of a marker comparison.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MarkerOperand {
    Variable(MarkerVariable),
    /// `extra`, which is bound to the extra being resolved rather than to the platform.
    Extra,
    /// A quoted string such as `'3.8'` or `"win32"`, without its quotes.
    Literal(String),
}

impl Display for MarkerOperand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable(variable) => variable.fmt(f),
            Self::Extra => f.write_str("extra"),
            Self::Literal(value) if value.contains('\'') => write!(f, "\"{value}\""),
            Self::Literal(value) => write!(f, "'{value}'"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MarkerOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    TildeEqual,
    In,
    NotIn,
}

impl MarkerOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterEqual => ">=",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::TildeEqual => "~=",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }

    fn is_containment(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl Display for MarkerOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comparison such as `python_version > "3.8"`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MarkerExpression {
    pub left: MarkerOperand,
    pub operator: MarkerOperator,
    pub right: MarkerOperand,
}

impl MarkerExpression {
    /// Whether the comparison holds in the given environment.
    ///
    /// A comparison against an unbound variable holds. Comparing `extra` with anything but a
    /// literal, or comparing two variables or two literals, is an error.
    pub fn evaluate(&self, env: &MarkerEnvironment) -> Result<bool, MarkerEvaluationError> {
        use MarkerOperand::{Extra, Literal, Variable};

        match (&self.left, &self.right) {
            (Extra, Literal(value)) | (Literal(value), Extra) => self.evaluate_extra(value, env),
            (Variable(variable), Literal(value)) => env
                .get(*variable)
                .map_or(Ok(true), |actual| self.compare(*variable, actual, value)),
            (Literal(value), Variable(variable)) => env
                .get(*variable)
                .map_or(Ok(true), |actual| self.compare(*variable, value, actual)),
            (Extra, _) | (_, Extra) => Err(MarkerEvaluationError::ExtraComparison(self.clone())),
            (Variable(_), Variable(_)) => {
                Err(MarkerEvaluationError::VariableComparison(self.clone()))
            }
            (Literal(_), Literal(_)) => Err(MarkerEvaluationError::LiteralComparison(self.clone())),
        }
    }

    /// `extra == '...'` and `extra != '...'`, on normalized names.
    fn evaluate_extra(
        &self,
        value: &str,
        env: &MarkerEnvironment,
    ) -> Result<bool, MarkerEvaluationError> {
        let literal =
            ExtraName::from_str(value).map_err(|source| MarkerEvaluationError::InvalidExtra {
                expression: self.clone(),
                source,
            })?;
        let selected = env.extra() == Some(&literal);
        match self.operator {
            MarkerOperator::Equal => Ok(selected),
            MarkerOperator::NotEqual => Ok(!selected),
            _ => Err(MarkerEvaluationError::ExtraComparison(self.clone())),
        }
    }

    fn compare(
        &self,
        variable: MarkerVariable,
        left: &str,
        right: &str,
    ) -> Result<bool, MarkerEvaluationError> {
        if variable.is_version() && !self.operator.is_containment() {
            if let Some(result) = self.compare_versions(left, right) {
                return Ok(result);
            }
            warn!(
                "`{left}` and `{right}` aren't comparable as versions; comparing `{self}` as strings"
            );
        }
        self.compare_strings(left, right)
    }

    fn compare_versions(&self, left: &str, right: &str) -> Option<bool> {
        let version = Version::from_str(left).ok()?;
        let specifier = VersionSpecifier::from_str(&format!("{}{right}", self.operator)).ok()?;
        Some(specifier.contains(&version))
    }

    /// Compare as Python compares two `str`.
    fn compare_strings(&self, left: &str, right: &str) -> Result<bool, MarkerEvaluationError> {
        Ok(match self.operator {
            MarkerOperator::Equal => left == right,
            MarkerOperator::NotEqual => left != right,
            MarkerOperator::GreaterThan => left > right,
            MarkerOperator::GreaterEqual => left >= right,
            MarkerOperator::LessThan => left < right,
            MarkerOperator::LessEqual => left <= right,
            MarkerOperator::In => right.contains(left),
            MarkerOperator::NotIn => !right.contains(left),
            MarkerOperator::TildeEqual => {
                return Err(MarkerEvaluationError::UnsupportedOperator(self.clone()));
            }
        })
    }
}

impl Display for MarkerExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

/// A marker: comparisons joined by `and` and `or`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MarkerTree {
    Expression(MarkerExpression),
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
}

impl FromStr for MarkerTree {
    type Err = ParseError;

    fn from_str(marker: &str) -> Result<Self, Self::Err> {
        parser::parse_marker(marker)
    }
}

impl MarkerTree {
    /// `a and b and ...`, or the single tree itself.
    pub(crate) fn all(mut trees: Vec<Self>) -> Self {
        if trees.len() == 1 {
            trees.swap_remove(0)
        } else {
            Self::And(trees)
        }
    }

    /// `a or b or ...`, or the single tree itself.
    pub(crate) fn any(mut trees: Vec<Self>) -> Self {
        if trees.len() == 1 {
            trees.swap_remove(0)
        } else {
            Self::Or(trees)
        }
    }

    /// Whether the marker holds in the given environment.
    ///
    /// `and` and `or` short-circuit from left to right, so an invalid comparison behind a decided
    /// branch is never evaluated.
    pub fn evaluate(&self, env: &MarkerEnvironment) -> Result<bool, MarkerEvaluationError> {
        match self {
            Self::Expression(expression) => expression.evaluate(env),
            Self::And(trees) => {
                for tree in trees {
                    if !tree.evaluate(env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(trees) => {
                for tree in trees {
                    if tree.evaluate(env)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// The extra the marker is gated on, if its right-most comparison is exactly
    /// `extra == '<name>'`.
    ///
    /// Wheel builders fold an extra into `Requires-Dist` this way, e.g.
    /// `pysocks ; python_version >= "3" and extra == 'socks'`. The name is returned as written.
    pub fn governing_extra(&self) -> Option<&str> {
        match self {
            Self::Expression(MarkerExpression {
                left: MarkerOperand::Extra,
                operator: MarkerOperator::Equal,
                right: MarkerOperand::Literal(value),
            }) => Some(value),
            Self::Expression(_) => None,
            Self::And(trees) | Self::Or(trees) => trees.last()?.governing_extra(),
        }
    }

    /// Whether any comparison in the tree involves `extra`.
    pub fn mentions_extra(&self) -> bool {
        match self {
            Self::Expression(expression) => {
                expression.left == MarkerOperand::Extra || expression.right == MarkerOperand::Extra
            }
            Self::And(trees) | Self::Or(trees) => trees.iter().any(Self::mentions_extra),
        }
    }
}

impl Display for MarkerTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (trees, junction) = match self {
            Self::Expression(expression) => return expression.fmt(f),
            Self::And(trees) => (trees, " and "),
            Self::Or(trees) => (trees, " or "),
        };
        for (index, tree) in trees.iter().enumerate() {
            if index > 0 {
                f.write_str(junction)?;
            }
            if let Self::Expression(expression) = tree {
                write!(f, "{expression}")?;
            } else {
                write!(f, "({tree})")?;
            }
        }
        Ok(())
    }
}

/// A marker that parsed, but can't be evaluated.
#[derive(Debug, thiserror::Error)]
pub enum MarkerEvaluationError {
    #[error("`extra` can only be compared to a quoted name with `==` or `!=`: `{0}`")]
    ExtraComparison(MarkerExpression),
    #[error("Invalid extra name in marker `{expression}`")]
    InvalidExtra {
        expression: MarkerExpression,
        #[source]
        source: InvalidNameError,
    },
    #[error("Can't compare two marker variables with each other: `{0}`")]
    VariableComparison(MarkerExpression),
    #[error("Can't compare two quoted strings with each other: `{0}`")]
    LiteralComparison(MarkerExpression),
    #[error("The `~=` operator requires versions on both sides: `{0}`")]
    UnsupportedOperator(MarkerExpression),
}
