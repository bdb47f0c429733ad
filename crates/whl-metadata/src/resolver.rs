use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, instrument};

use whl_distribution_filename::PackageIdentity;
use whl_normalize::{ExtraName, InvalidNameError, PackageName};
use whl_pep508::{MarkerEnvironment, MarkerEvaluationError};

use crate::MetadataRecord;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Failed to evaluate the marker of `{requirement}`")]
    Marker {
        requirement: String,
        #[source]
        source: MarkerEvaluationError,
    },
}

/// An extra requested by the user, keeping the spelling it was requested with.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RequestedExtra {
    requested: String,
    name: ExtraName,
}

impl RequestedExtra {
    /// The extra as the user spelled it.
    pub fn requested(&self) -> &str {
        &self.requested
    }

    /// The normalized extra name.
    pub fn name(&self) -> &ExtraName {
        &self.name
    }
}

impl FromStr for RequestedExtra {
    type Err = InvalidNameError;

    fn from_str(requested: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            requested: requested.to_string(),
            name: ExtraName::from_str(requested)?,
        })
    }
}

impl Display for RequestedExtra {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.requested)
    }
}

/// The dependencies of a requested extra.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedExtra {
    pub extra: RequestedExtra,
    /// Whether the package declares this extra, either through `Provides-Extra` or through a
    /// requirement gated on it.
    pub declared: bool,
    pub dependencies: BTreeSet<PackageName>,
}

/// Everything needed to describe a wheel as a build target: its identity, the dependencies of the
/// package itself, and the dependencies of each requested extra, in the order requested.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedDependencies {
    pub identity: PackageIdentity,
    pub base: BTreeSet<PackageName>,
    pub extras: Vec<ResolvedExtra>,
}

/// Selects the requirements of a [`MetadataRecord`] that apply to the package itself or to one of
/// its extras.
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    record: &'a MetadataRecord,
    env: MarkerEnvironment,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver that evaluates markers in the given environment. The `extra` of the
    /// environment is replaced on every [`DependencyResolver::resolve`].
    pub fn new(record: &'a MetadataRecord, env: MarkerEnvironment) -> Self {
        Self { record, env }
    }

    /// The names of the dependencies visible when `extra` is selected, or of the package itself
    /// if no extra is selected.
    ///
    /// Names are de-duplicated on their normalized form and keep the spelling of the first
    /// requirement that names them.
    ///
    /// Without an extra, every requirement that carries an extra is excluded. With an extra,
    /// requirements carrying other extras are excluded, while those carrying none are kept. In
    /// both cases, a requirement whose marker doesn't hold is excluded.
    #[instrument(skip_all, fields(package = %self.record.name, extra = ?extra.map(ExtraName::as_str)))]
    pub fn resolve(
        &self,
        extra: Option<&ExtraName>,
    ) -> Result<BTreeSet<PackageName>, ResolveError> {
        let env = self.env.with_extra(extra.cloned());
        let mut dependencies = BTreeSet::new();

        for requirement in &self.record.requirements {
            match extra {
                None if !requirement.extras.is_empty() => continue,
                Some(extra)
                    if !requirement.extras.is_empty() && !requirement.extras.contains(extra) =>
                {
                    continue;
                }
                _ => {}
            }

            let applies =
                requirement
                    .evaluate_markers(&env)
                    .map_err(|err| ResolveError::Marker {
                        requirement: requirement.to_string(),
                        source: err,
                    })?;
            if !applies {
                debug!("Skipping `{requirement}`: marker doesn't apply");
                continue;
            }

            dependencies.insert(requirement.name.clone());
        }

        Ok(dependencies)
    }

    /// The extras a consumer may request.
    pub fn list_extras(&self) -> &'a BTreeSet<ExtraName> {
        &self.record.extras
    }

    /// Resolve the package and each of the requested extras.
    ///
    /// An extra requested twice (after normalization) is resolved once, under its first spelling.
    /// An extra that the package never declares resolves like any other, to the dependencies of
    /// the package itself, and is flagged as undeclared.
    pub fn resolve_all(
        &self,
        identity: PackageIdentity,
        requested: &[RequestedExtra],
    ) -> Result<ResolvedDependencies, ResolveError> {
        let base = self.resolve(None)?;

        let mut extras: Vec<ResolvedExtra> = Vec::with_capacity(requested.len());
        for extra in requested {
            if extras
                .iter()
                .any(|resolved| resolved.extra.name() == extra.name())
            {
                continue;
            }
            let dependencies = self.resolve(Some(extra.name()))?;
            extras.push(ResolvedExtra {
                extra: extra.clone(),
                declared: self.record.extras.contains(extra.name())
                    || self.record.provides_extras.contains(extra.name()),
                dependencies,
            });
        }

        Ok(ResolvedDependencies {
            identity,
            base,
            extras,
        })
    }
}
