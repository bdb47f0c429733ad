use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::{InvalidNameError, normalize, validate};

/// The name of a distribution.
///
/// Holds two spellings of the name:
/// - the project name, which keeps the case and the `.` of the declared name and turns each run
///   of `-` and `_` into a single `-` (`Zope.Interface`, `typing-extensions`);
/// - the normalized name (`zope-interface`, `typing-extensions`).
///
/// Equality, ordering and hashing only look at the normalized name, so `PySocks` and `pysocks`
/// are the same package. A set of names keeps whichever spelling it saw first.
///
/// See: <https://packaging.python.org/en/latest/specifications/name-normalization/>
#[derive(Debug, Clone)]
pub struct PackageName {
    project: String,
    normalized: String,
}

impl PackageName {
    /// Validate a declared distribution name.
    pub fn new(name: String) -> Result<Self, InvalidNameError> {
        Self::from_str(&name)
    }

    /// The project name, as dependents refer to the package.
    pub fn as_str(&self) -> &str {
        &self.project
    }

    /// The normalized name.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Keep letters, digits and `.`; a run of anything else becomes one `-`.
fn project_name(name: &str) -> String {
    let mut project = String::with_capacity(name.len());
    for char in name.chars() {
        if char.is_ascii_alphanumeric() || char == '.' {
            project.push(char);
        } else if !project.ends_with('-') {
            project.push('-');
        }
    }
    project
}

impl FromStr for PackageName {
    type Err = InvalidNameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        validate(name)?;
        Ok(Self {
            project: project_name(name),
            normalized: normalize(name),
        })
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for PackageName {}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl Display for PackageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.project)
    }
}
