//! Dependency specifiers, as found in the `Requires-Dist` field of wheel metadata.
//!
//! ```text
//! requests [security,tests] >= 2.8.1, == 2.8.* ; python_version > "3.8"
//! ```
//!
//! A [`Requirement`] is parsed into its name, extras, version specifiers or URL, and
//! [`MarkerTree`]. Markers are evaluated against a partial [`MarkerEnvironment`], in which a
//! comparison against a variable without a value holds.
//!
//! See: <https://packaging.python.org/en/latest/specifications/dependency-specifiers/>

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pep440_rs::VersionSpecifiers;

use whl_normalize::{ExtraName, PackageName};

pub use environment::{MarkerEnvironment, MarkerEnvironmentError};
pub use error::ParseError;
pub use marker::{
    MarkerEvaluationError, MarkerExpression, MarkerOperand, MarkerOperator, MarkerTree,
    MarkerVariable, UnknownMarkerVariable,
};

mod environment;
mod error;
mod marker;
mod parser;
mod scanner;

/// A single dependency declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Requirement {
    /// The name of the dependency, keeping the spelling it was declared with.
    pub name: PackageName,
    /// The extras requested in brackets, e.g. `security` in `requests[security]`.
    pub extras: Vec<ExtraName>,
    pub version_or_url: Option<VersionOrUrl>,
    /// The marker after the `;`, if any.
    pub marker: Option<MarkerTree>,
}

impl Requirement {
    /// Returns `true` if the requirement applies in the given environment.
    ///
    /// A requirement without a marker always applies.
    pub fn evaluate_markers(&self, env: &MarkerEnvironment) -> Result<bool, MarkerEvaluationError> {
        self.marker
            .as_ref()
            .map_or(Ok(true), |marker| marker.evaluate(env))
    }

    /// Adds an extra to the requirement, unless it's already present.
    pub fn add_extra(&mut self, extra: ExtraName) {
        if !self.extras.contains(&extra) {
            self.extras.push(extra);
        }
    }
}

impl FromStr for Requirement {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parser::parse_requirement(input)
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some((first, rest)) = self.extras.split_first() {
            write!(f, "[{first}")?;
            for extra in rest {
                write!(f, ",{extra}")?;
            }
            f.write_str("]")?;
        }
        match &self.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => write!(f, "{specifiers}")?,
            Some(VersionOrUrl::Url(url)) => write!(f, " @ {url}")?,
            None => {}
        }
        if let Some(marker) = &self.marker {
            write!(f, " ; {marker}")?;
        }
        Ok(())
    }
}

/// The version specifiers or the URL of a requirement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VersionOrUrl {
    VersionSpecifier(VersionSpecifiers),
    /// A direct reference, kept as written.
    Url(String),
}
