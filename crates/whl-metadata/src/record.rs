use std::collections::BTreeSet;
use std::str::FromStr;

use tracing::{debug, trace};

use whl_normalize::ExtraName;
use whl_pep508::{MarkerTree, Requirement};

use crate::{Headers, MetadataError};

/// The subset of the core metadata of a wheel that determines its dependencies.
///
/// Covers the fields of metadata versions 1.0 through 2.4 that matter here: the legacy `Requires`
/// field of PEP 314 as well as `Requires-Dist` from PEP 345 onwards.
///
/// See: <https://packaging.python.org/specifications/core-metadata/>
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MetadataRecord {
    /// The `Name` field as written, which may differ from the distribution name in the archive
    /// filename.
    pub name: String,
    pub version: Option<String>,
    pub metadata_version: Option<String>,
    /// `Requires` entries followed by `Requires-Dist` entries, in document order.
    ///
    /// A requirement whose marker ends in `extra == '<name>'` carries `<name>` in its extras, in
    /// addition to any extras it lists in brackets.
    pub requirements: Vec<Requirement>,
    /// The union of the extras of all requirements.
    pub extras: BTreeSet<ExtraName>,
    /// The `Provides-Extra` entries, as declared.
    pub provides_extras: Vec<ExtraName>,
}

impl MetadataRecord {
    /// Parse the contents of a `METADATA` file.
    ///
    /// A single malformed requirement fails the entire parse.
    pub fn parse(content: &[u8]) -> Result<Self, MetadataError> {
        let headers = Headers::parse(content)?;

        let name = headers
            .first("Name")
            .ok_or(MetadataError::FieldNotFound("Name"))?;
        let version = headers.first("Version");
        let metadata_version = headers.first("Metadata-Version");

        let requirements = headers
            .all("Requires")
            .map(|value| ("Requires", value))
            .chain(
                headers
                    .all("Requires-Dist")
                    .map(|value| ("Requires-Dist", value)),
            )
            .map(|(field, value)| parse_requirement(field, value))
            .collect::<Result<Vec<_>, _>>()?;

        let extras = requirements
            .iter()
            .flat_map(|requirement| requirement.extras.iter().cloned())
            .collect::<BTreeSet<_>>();

        let provides_extras = headers
            .all("Provides-Extra")
            .map(|value| {
                ExtraName::from_str(&value)
                    .map_err(|err| MetadataError::InvalidProvidesExtra(value, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if provides_extras.iter().any(|extra| !extras.contains(extra)) {
            debug!(
                "`{name}` declares extras that no requirement is gated on: {}",
                provides_extras
                    .iter()
                    .filter(|extra| !extras.contains(*extra))
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(Self {
            name,
            version,
            metadata_version,
            requirements,
            extras,
            provides_extras,
        })
    }
}

/// Parse a single `Requires` or `Requires-Dist` value, attaching the extra its marker is gated on.
fn parse_requirement(field: &'static str, value: String) -> Result<Requirement, MetadataError> {
    let mut requirement = match Requirement::from_str(&value) {
        Ok(requirement) => requirement,
        Err(err) => {
            return Err(MetadataError::Requirement {
                field,
                value,
                source: Box::new(err),
            });
        }
    };

    // Wheel builders fold extras into the marker, e.g. `pysocks ; extra == 'socks'`.
    let implicit_extra = requirement
        .marker
        .as_ref()
        .and_then(|marker| marker.governing_extra())
        .map(ExtraName::from_str);
    match implicit_extra {
        Some(Ok(extra)) => requirement.add_extra(extra),
        Some(Err(err)) => {
            return Err(MetadataError::InvalidImplicitExtra {
                field,
                value,
                source: err,
            });
        }
        None => {
            if requirement
                .marker
                .as_ref()
                .is_some_and(MarkerTree::mentions_extra)
            {
                debug!("`{requirement}` refers to `extra`, but isn't gated on a single extra");
            }
        }
    }

    trace!("{field}: {requirement}");
    Ok(requirement)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use indoc::indoc;

    use whl_normalize::ExtraName;

    use crate::{MetadataError, MetadataRecord};

    fn extras(names: &[&str]) -> BTreeSet<ExtraName> {
        names
            .iter()
            .map(|name| ExtraName::from_str(name).unwrap())
            .collect()
    }

    #[test]
    fn requires_dist() {
        let metadata = indoc! {r#"
            Metadata-Version: 2.1
            Name: requests
            Version: 2.31.0
            Requires-Python: >=3.7
            Requires-Dist: charset-normalizer (<4,>=2)
            Requires-Dist: idna (<4,>=2.5)
            Requires-Dist: urllib3 (<3,>=1.21.1)
            Provides-Extra: socks
            Requires-Dist: PySocks (!=1.5.7,>=1.5.6) ; extra == 'socks'
            Provides-Extra: use_chardet_on_py3
            Requires-Dist: chardet (<6,>=3.0.2) ; extra == 'use_chardet_on_py3'

            Python HTTP for Humans.
        "#};
        let record = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert_eq!(record.name, "requests");
        assert_eq!(record.version.as_deref(), Some("2.31.0"));
        assert_eq!(record.metadata_version.as_deref(), Some("2.1"));
        assert_eq!(
            record
                .requirements
                .iter()
                .map(|requirement| requirement.name.as_str())
                .collect::<Vec<_>>(),
            vec!["charset-normalizer", "idna", "urllib3", "PySocks", "chardet"]
        );
        assert_eq!(record.extras, extras(&["socks", "use-chardet-on-py3"]));
        assert_eq!(
            record.provides_extras,
            vec![
                ExtraName::from_str("socks").unwrap(),
                ExtraName::from_str("use_chardet_on_py3").unwrap(),
            ]
        );
    }

    #[test]
    fn requires_before_requires_dist() {
        let metadata = indoc! {"
            Metadata-Version: 1.2
            Name: legacy
            Requires-Dist: second
            Requires: first (>=1.0)
        "};
        let record = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert_eq!(
            record
                .requirements
                .iter()
                .map(|requirement| requirement.name.as_str())
                .collect::<Vec<_>>(),
            vec!["first", "second"]
        );
    }

    #[test]
    fn implicit_and_explicit_extras() {
        let metadata = indoc! {r#"
            Metadata-Version: 2.1
            Name: example
            Requires-Dist: six
            Requires-Dist: mock; extra == "test"
            Requires-Dist: requests[security]; extra == "security"
            Requires-Dist: pysocks; python_version >= "3" and extra == "socks"
            Requires-Dist: colorama; extra == "cli" and sys_platform == "win32"
        "#};
        let record = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert_eq!(record.extras, extras(&["security", "socks", "test"]));

        let requests = &record.requirements[2];
        assert_eq!(requests.extras, vec![ExtraName::from_str("security").unwrap()]);

        // The gating extra isn't the right-most expression, so it isn't attached.
        let colorama = &record.requirements[4];
        assert!(colorama.extras.is_empty());
    }

    #[test]
    fn implicit_extra_is_normalized() {
        let metadata = indoc! {r#"
            Name: example
            Requires-Dist: sphinx; extra == "Docs_Build"
        "#};
        let record = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert_eq!(record.extras, extras(&["docs-build"]));
    }

    #[test]
    fn name_is_kept_verbatim() {
        let metadata = indoc! {"
            Metadata-Version: 2.1
            Name: Zope.Interface
            Version: 6.1
            Requires-Dist: setuptools
        "};
        let record = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert_eq!(record.name, "Zope.Interface");
    }

    #[test]
    fn parsing_is_deterministic() {
        let metadata = indoc! {r#"
            Metadata-Version: 2.1
            Name: requests
            Requires-Dist: charset-normalizer (<4,>=2)
            Requires-Dist: urllib3 (<3,>=1.21.1)
            Requires-Dist: PySocks (!=1.5.7,>=1.5.6) ; extra == 'socks'
            Requires-Dist: chardet (<6,>=3.0.2) ; extra == 'use_chardet_on_py3'
            Requires-Dist: win-inet-pton ; sys_platform == "win32" and extra == 'socks'
        "#};
        let first = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        let second = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_is_ignored() {
        let metadata = indoc! {"
            Metadata-Version: 1.0
            Name: example
            Version: UNKNOWN
            Requires: UNKNOWN
        "};
        let record = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert_eq!(record.version, None);
        assert!(record.requirements.is_empty());
    }

    #[test]
    fn no_requirements() {
        let metadata = indoc! {"
            Metadata-Version: 2.1
            Name: six
            Version: 1.16.0
        "};
        let record = MetadataRecord::parse(metadata.as_bytes()).unwrap();
        assert!(record.requirements.is_empty());
        assert!(record.extras.is_empty());
    }

    #[test]
    fn missing_name() {
        let metadata = indoc! {"
            Metadata-Version: 2.1
            Version: 1.0
        "};
        let err = MetadataRecord::parse(metadata.as_bytes()).unwrap_err();
        insta::assert_snapshot!(err, @"Metadata field Name not found");
    }

    #[test]
    fn invalid_requirement() {
        let metadata = indoc! {"
            Name: example
            Requires-Dist: six
            Requires-Dist: mock[test
        "};
        let err = MetadataRecord::parse(metadata.as_bytes()).unwrap_err();
        insta::assert_snapshot!(err, @"Failed to parse `Requires-Dist` entry: `mock[test`");
        let MetadataError::Requirement { source, .. } = err else {
            panic!("expected a requirement error");
        };
        insta::assert_snapshot!(source, @r"
        Missing closing `]` for the extras
        mock[test
            ^
        ");
    }

    #[test]
    fn invalid_implicit_extra() {
        let metadata = indoc! {r#"
            Name: example
            Requires-Dist: mock; extra == "not valid"
        "#};
        let err = MetadataRecord::parse(metadata.as_bytes()).unwrap_err();
        insta::assert_snapshot!(err, @r#"The `Requires-Dist` entry `mock; extra == "not valid"` is gated on an invalid extra"#);
    }
}
