use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{InvalidNameError, normalize, validate};

/// The normalized name of an extra, i.e. an optional feature set of a distribution.
///
/// Extras are compared in this form wherever they appear: in brackets, in `extra == '...'`
/// markers, in `Provides-Extra` and on the command line.
///
/// See: <https://peps.python.org/pep-0685/#specification>
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtraName(String);

impl ExtraName {
    pub fn new(name: String) -> Result<Self, InvalidNameError> {
        Self::from_str(&name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExtraName {
    type Err = InvalidNameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        validate(name)?;
        Ok(Self(normalize(name)))
    }
}

impl Display for ExtraName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
