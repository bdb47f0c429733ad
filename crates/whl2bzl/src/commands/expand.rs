use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use tracing::debug;

use whl_build_file::BuildFile;
use whl_distribution_filename::PackageIdentity;
use whl_extract::WheelArchive;
use whl_metadata::{DependencyResolver, MetadataRecord, RequestedExtra};
use whl_normalize::{ExtraName, PackageName};
use whl_pep508::MarkerEnvironment;
use whl_warnings::warn_user;

use crate::commands::{ExitStatus, elapsed};
use crate::printer::Printer;

/// A `KEY=VALUE` pair fixing the value of a marker variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkerBinding {
    key: String,
    value: String,
}

impl FromStr for MarkerBinding {
    type Err = String;

    fn from_str(binding: &str) -> Result<Self, Self::Err> {
        let Some((key, value)) = binding.split_once('=') else {
            return Err(format!("Expected `KEY=VALUE`, found `{binding}`"));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Missing marker variable in `{binding}`"));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Unpack a wheel into `directory` and write a `BUILD` file describing it next to its contents.
pub(crate) fn expand(
    whl: &Path,
    requirements: &str,
    directory: &Path,
    extras: &[RequestedExtra],
    marker_env: &[MarkerBinding],
    mut printer: Printer,
) -> Result<ExitStatus> {
    let start = Instant::now();

    let mut env = MarkerEnvironment::default();
    for MarkerBinding { key, value } in marker_env {
        env = env
            .with_binding(key, value.as_str())
            .with_context(|| format!("Invalid marker environment entry `{key}={value}`"))?;
    }

    let identity = PackageIdentity::from_path(whl)?;
    debug!("Expanding `{identity}` as `{}`", identity.repository_key());

    let mut archive = WheelArchive::open(whl)
        .with_context(|| format!("Failed to open archive `{}`", whl.display()))?;

    let metadata = archive
        .read_metadata(&identity)
        .with_context(|| format!("Failed to read the metadata of `{identity}`"))?;
    let record = MetadataRecord::parse(&metadata)
        .with_context(|| format!("Failed to parse the metadata of `{identity}`"))?;
    debug!(
        "Read metadata version {} of `{}`",
        record.metadata_version.as_deref().unwrap_or("unknown"),
        record.name
    );
    let same_name = PackageName::from_str(identity.distribution_name())
        .ok()
        .zip(PackageName::from_str(&record.name).ok())
        .is_some_and(|(filename, metadata)| filename == metadata);
    if !same_name {
        debug!(
            "The metadata names the package `{}`, the archive filename `{}`",
            record.name,
            identity.distribution_name()
        );
    }
    if let Some(version) = record
        .version
        .as_deref()
        .filter(|version| *version != identity.version())
    {
        debug!(
            "The metadata gives the version `{version}`, the archive filename `{}`",
            identity.version()
        );
    }

    if env.is_open() {
        debug!("No marker variables are bound; keeping requirements for every platform");
    }
    let resolver = DependencyResolver::new(&record, env);
    let resolved = resolver
        .resolve_all(identity.clone(), extras)
        .with_context(|| format!("Failed to resolve the dependencies of `{identity}`"))?;
    for extra in resolved.extras.iter().filter(|extra| !extra.declared) {
        warn_user!(
            "`{identity}` doesn't declare the extra `{}`; its target only depends on `{}`",
            extra.extra,
            ":pkg".cyan()
        );
    }
    if resolved.extras.iter().any(|extra| !extra.declared) {
        let available = resolver
            .list_extras()
            .iter()
            .chain(&record.provides_extras)
            .map(ExtraName::as_str)
            .collect::<BTreeSet<_>>();
        if available.is_empty() {
            debug!("`{identity}` declares no extras");
        } else {
            debug!(
                "`{identity}` declares the extras: {}",
                available.into_iter().collect::<Vec<_>>().join(", ")
            );
        }
    }

    if directory.is_file() {
        bail!("`{}` is a file, not a directory", directory.display());
    }
    let extracted = archive.extract_all(directory).with_context(|| {
        format!(
            "Failed to extract `{}` into `{}`",
            archive.path().display(),
            directory.display()
        )
    })?;

    BuildFile::new(requirements, &resolved)
        .write(directory)
        .with_context(|| format!("Failed to write the `BUILD` file into `{}`", directory.display()))?;

    let s = if extracted == 1 { "" } else { "s" };
    writeln!(
        printer,
        "{}",
        format!(
            "Expanded {} into {} ({} in {})",
            identity.bold(),
            directory.display().cyan(),
            format!("{extracted} file{s}").bold(),
            elapsed(start.elapsed())
        )
        .dimmed()
    )?;

    Ok(ExitStatus::Success)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::MarkerBinding;

    #[test]
    fn parse_marker_binding() {
        assert_eq!(
            MarkerBinding::from_str("python_version=3.11").unwrap(),
            MarkerBinding {
                key: "python_version".to_string(),
                value: "3.11".to_string(),
            }
        );
        // Only the first `=` separates the key.
        assert_eq!(
            MarkerBinding::from_str("platform_version = #1 SMP=x").unwrap(),
            MarkerBinding {
                key: "platform_version".to_string(),
                value: "#1 SMP=x".to_string(),
            }
        );
        assert_eq!(
            MarkerBinding::from_str("sys_platform").unwrap_err(),
            "Expected `KEY=VALUE`, found `sys_platform`"
        );
        assert_eq!(
            MarkerBinding::from_str("=linux").unwrap_err(),
            "Missing marker variable in `=linux`"
        );
    }
}
