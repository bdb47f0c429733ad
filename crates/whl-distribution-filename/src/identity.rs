use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// The distribution name and version of a wheel, as spelled in its filename.
///
/// Only the first two `-`-delimited components of the filename are load-bearing; the tags that
/// follow are ignored. Both components are kept verbatim (not normalized), since they name the
/// `.dist-info` directory inside the archive.
///
/// See: <https://packaging.python.org/en/latest/specifications/binary-distribution-format/#file-name-convention>
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PackageIdentity {
    distribution_name: String,
    version: String,
}

impl PackageIdentity {
    /// Parse the identity from a path to a wheel; only the filename is considered.
    pub fn from_path(path: &Path) -> Result<Self, PackageIdentityError> {
        let Some(filename) = path.file_name() else {
            return Err(PackageIdentityError::MissingFilename(
                path.display().to_string(),
            ));
        };
        let Some(filename) = filename.to_str() else {
            return Err(PackageIdentityError::InvalidFilename(
                filename.to_string_lossy().to_string(),
                "Must be valid UTF-8".to_string(),
            ));
        };
        Self::from_str(filename)
    }

    fn parse(stem: &str, filename: &str) -> Result<Self, PackageIdentityError> {
        let mut splitter = memchr::Memchr::new(b'-', stem.as_bytes());

        let Some(name_end) = splitter.next() else {
            return Err(PackageIdentityError::InvalidFilename(
                filename.to_string(),
                "Must have a version".to_string(),
            ));
        };
        let version_end = splitter.next().unwrap_or(stem.len());

        let distribution_name = &stem[..name_end];
        let version = &stem[name_end + 1..version_end];

        if distribution_name.is_empty() {
            return Err(PackageIdentityError::InvalidFilename(
                filename.to_string(),
                "Must have a distribution name".to_string(),
            ));
        }
        if version.is_empty() {
            return Err(PackageIdentityError::InvalidFilename(
                filename.to_string(),
                "Must have a version".to_string(),
            ));
        }

        Ok(Self {
            distribution_name: distribution_name.to_string(),
            version: version.to_string(),
        })
    }

    /// The distribution name, e.g. `google_cloud` for `google_cloud-0.27.0-py2.py3-none-any.whl`.
    pub fn distribution_name(&self) -> &str {
        &self.distribution_name
    }

    /// The version, e.g. `0.27.0` for `google_cloud-0.27.0-py2.py3-none-any.whl`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The name of the repository that holds this package, e.g. `pypi__google_cloud_0_27_0`.
    ///
    /// `-`, `.` and `+` are not valid in repository names and are replaced with `_`.
    pub fn repository_key(&self) -> String {
        format!("pypi__{}_{}", self.distribution_name, self.version)
            .chars()
            .map(|char| match char {
                '-' | '.' | '+' => '_',
                char => char,
            })
            .collect()
    }

    /// The name of the `.dist-info` directory in the archive, e.g. `google_cloud-0.27.0.dist-info`.
    pub fn dist_info_directory_name(&self) -> String {
        format!("{}-{}.dist-info", self.distribution_name, self.version)
    }

    /// The path of the core metadata file in the archive.
    pub fn metadata_path(&self) -> String {
        format!("{}/METADATA", self.dist_info_directory_name())
    }
}

impl FromStr for PackageIdentity {
    type Err = PackageIdentityError;

    /// Parse a filename, with or without the `.whl` extension.
    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let stem = filename.strip_suffix(".whl").unwrap_or(filename);
        Self::parse(stem, filename)
    }
}

impl Display for PackageIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.distribution_name, self.version)
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum PackageIdentityError {
    #[error("The archive filename \"{0}\" is invalid: {1}")]
    InvalidFilename(String, String),
    #[error("The archive path \"{0}\" has no filename")]
    MissingFilename(String),
}
