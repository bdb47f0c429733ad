use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, instrument};

use whl_metadata::ResolvedDependencies;
use whl_normalize::PackageName;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The `BUILD` file for an unpacked wheel.
///
/// Declares a `pkg` target for the package itself, and one target per requested extra that
/// depends on `pkg` and on the dependencies of that extra. Dependencies are referenced through
/// the `requirement` macro loaded from `requirements`.
#[derive(Debug)]
pub struct BuildFile<'a> {
    requirements: &'a str,
    resolved: &'a ResolvedDependencies,
}

impl<'a> BuildFile<'a> {
    /// `requirements` is the label of the `.bzl` file that defines the `requirement` macro, used
    /// verbatim.
    pub fn new(requirements: &'a str, resolved: &'a ResolvedDependencies) -> Self {
        Self {
            requirements,
            resolved,
        }
    }

    /// Write the `BUILD` file into `directory`, returning its path.
    #[instrument(skip_all, fields(directory = %directory.display()))]
    pub fn write(&self, directory: &Path) -> Result<PathBuf, Error> {
        let path = directory.join("BUILD");
        fs_err::write(&path, self.to_string())?;
        debug!("Wrote `{}`", path.display());
        Ok(path)
    }
}

fn requirements(dependencies: &BTreeSet<PackageName>) -> String {
    dependencies
        .iter()
        .map(|dependency| format!("requirement(\"{dependency}\")"))
        .join(",")
}

impl Display for BuildFile<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            r#"
package(default_visibility = ["//visibility:public"])

load("@rules_python//python:defs.bzl", "py_library")
load("{requirements}", "requirement")

py_library(
    name = "pkg",
    srcs = glob(["**/*.py"]),
    data = glob(["**/*"], exclude=["**/*.py", "**/* *", "BUILD", "WORKSPACE"]),
    # This makes this directory a top-level in the python import
    # search path for anything that depends on this.
    imports = ["."],
    deps = [{dependencies}],
)
"#,
            requirements = self.requirements,
            dependencies = requirements(&self.resolved.base),
        )?;

        let extras = self.resolved.extras.iter().map(|extra| {
            format!(
                r#"py_library(
    name = "{name}",
    deps = [
        ":pkg",{dependencies}
    ],
)"#,
                name = extra.extra.requested(),
                dependencies = requirements(&extra.dependencies),
            )
        });
        write!(f, "{}", extras.format("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use whl_distribution_filename::PackageIdentity;
    use whl_metadata::{RequestedExtra, ResolvedDependencies, ResolvedExtra};
    use whl_normalize::PackageName;

    use crate::BuildFile;

    fn names(names: &[&str]) -> BTreeSet<PackageName> {
        names
            .iter()
            .map(|name| PackageName::from_str(name).unwrap())
            .collect()
    }

    fn resolved(extras: Vec<ResolvedExtra>) -> ResolvedDependencies {
        ResolvedDependencies {
            identity: PackageIdentity::from_str("requests-2.31.0-py3-none-any.whl").unwrap(),
            base: names(&["urllib3", "charset-normalizer", "idna"]),
            extras,
        }
    }

    #[test]
    fn without_extras() {
        let resolved = resolved(vec![]);
        let build_file = BuildFile::new("@pip//:requirements.bzl", &resolved).to_string();
        assert!(build_file.starts_with('\n'));
        insta::assert_snapshot!(build_file.trim_start(), @r#"
        package(default_visibility = ["//visibility:public"])

        load("@rules_python//python:defs.bzl", "py_library")
        load("@pip//:requirements.bzl", "requirement")

        py_library(
            name = "pkg",
            srcs = glob(["**/*.py"]),
            data = glob(["**/*"], exclude=["**/*.py", "**/* *", "BUILD", "WORKSPACE"]),
            # This makes this directory a top-level in the python import
            # search path for anything that depends on this.
            imports = ["."],
            deps = [requirement("charset-normalizer"),requirement("idna"),requirement("urllib3")],
        )
        "#);
    }

    #[test]
    fn with_extras() {
        let resolved = resolved(vec![
            ResolvedExtra {
                extra: RequestedExtra::from_str("socks").unwrap(),
                declared: true,
                dependencies: names(&["urllib3", "PySocks", "charset-normalizer", "idna"]),
            },
            ResolvedExtra {
                extra: RequestedExtra::from_str("Use_Chardet_On_Py3").unwrap(),
                declared: true,
                dependencies: names(&["chardet"]),
            },
        ]);
        let build_file = BuildFile::new("@pip//:requirements.bzl", &resolved).to_string();
        assert!(build_file.starts_with('\n'));
        assert!(build_file.ends_with(")\npy_library(\n    name = \"socks\",\n    deps = [\n        \":pkg\",requirement(\"charset-normalizer\"),requirement(\"idna\"),requirement(\"PySocks\"),requirement(\"urllib3\")\n    ],\n)\n\npy_library(\n    name = \"Use_Chardet_On_Py3\",\n    deps = [\n        \":pkg\",requirement(\"chardet\")\n    ],\n)"));
    }

    #[test]
    fn empty_dependencies() {
        let resolved = ResolvedDependencies {
            identity: PackageIdentity::from_str("six-1.16.0-py2.py3-none-any.whl").unwrap(),
            base: BTreeSet::new(),
            extras: vec![ResolvedExtra {
                extra: RequestedExtra::from_str("docs").unwrap(),
                declared: false,
                dependencies: BTreeSet::new(),
            }],
        };
        let build_file = BuildFile::new("//:requirements.bzl", &resolved).to_string();
        assert!(build_file.contains("    deps = [],\n)\n"));
        assert!(build_file.ends_with("    deps = [\n        \":pkg\",\n    ],\n)"));
    }

    #[test]
    fn write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let resolved = resolved(vec![]);
        let build_file = BuildFile::new("@pip//:requirements.bzl", &resolved);
        let path = build_file.write(temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join("BUILD"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            build_file.to_string()
        );
    }
}
