//! Distribution and extra names.
//!
//! Names are compared in their normalized form: lowercase, with every run of `-`, `_` and `.`
//! replaced by a single `-` (PEP 503, PEP 685). A [`PackageName`] additionally remembers the
//! spelling it was declared with, since that's the spelling dependents are referred to by.

pub use extra_name::ExtraName;
pub use package_name::PackageName;

mod extra_name;
mod package_name;

/// A string that is neither a valid distribution name nor a valid extra name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error(
    "Invalid name `{0}`: names may only contain ASCII letters, digits, `-`, `_` and `.`, and must start and end with a letter or digit"
)]
pub struct InvalidNameError(String);

impl InvalidNameError {
    /// The rejected name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_separator(byte: u8) -> bool {
    matches!(byte, b'-' | b'_' | b'.')
}

/// Check the name against `^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$`.
pub(crate) fn validate(name: &str) -> Result<(), InvalidNameError> {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return Err(InvalidNameError(name.to_string()));
    };
    if first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|byte| byte.is_ascii_alphanumeric() || is_separator(*byte))
    {
        Ok(())
    } else {
        Err(InvalidNameError(name.to_string()))
    }
}

/// Lowercase a valid name and collapse each run of separators into a single `-`.
pub(crate) fn normalize(name: &str) -> String {
    name.split(['-', '_', '.'])
        .filter(|segment| !segment.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests;
