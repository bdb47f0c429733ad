use std::collections::BTreeSet;
use std::str::FromStr;

use crate::{ExtraName, InvalidNameError, PackageName, normalize, validate};

#[test]
fn normalized_form() {
    for input in [
        "friendly-bard",
        "Friendly-Bard",
        "FRIENDLY-BARD",
        "friendly.bard",
        "friendly_bard",
        "friendly--bard",
        "friendly-.bard",
        "FrIeNdLy-._.-bArD",
    ] {
        validate(input).unwrap();
        assert_eq!(normalize(input), "friendly-bard", "{input}");
    }
}

#[test]
fn invalid_names() {
    for input in [
        "",
        " starts-with-space",
        "-starts-with-dash",
        "ends-with-dash-",
        "ends.with.dot.",
        "includes!invalid-char",
        "space in middle",
        "alpha-α",
    ] {
        assert_eq!(
            validate(input),
            Err(InvalidNameError(input.to_string())),
            "{input:?}"
        );
    }

    let err = PackageName::from_str("name_").unwrap_err();
    insta::assert_snapshot!(err, @"Invalid name `name_`: names may only contain ASCII letters, digits, `-`, `_` and `.`, and must start and end with a letter or digit");
}

#[test]
fn project_name_keeps_case_and_dots() {
    let cases = [
        ("zope.interface", "zope.interface", "zope-interface"),
        ("PySocks", "PySocks", "pysocks"),
        ("ruamel.yaml", "ruamel.yaml", "ruamel-yaml"),
        ("typing_extensions", "typing-extensions", "typing-extensions"),
        ("backports.zoneinfo", "backports.zoneinfo", "backports-zoneinfo"),
        ("Foo__-Bar", "Foo-Bar", "foo-bar"),
    ];
    for (input, project, normalized) in cases {
        let name = PackageName::from_str(input).unwrap();
        assert_eq!(name.as_str(), project, "{input}");
        assert_eq!(name.normalized(), normalized, "{input}");
        assert_eq!(name.to_string(), project, "{input}");
    }
}

#[test]
fn package_names_compare_normalized() {
    let dotted = PackageName::from_str("Zope.Interface").unwrap();
    let dashed = PackageName::new("zope_interface".to_string()).unwrap();
    assert_eq!(dotted, dashed);

    // A set keeps the spelling it saw first.
    let names: BTreeSet<_> = [dotted, dashed, PackageName::from_str("acme").unwrap()]
        .into_iter()
        .collect();
    assert_eq!(
        names.iter().map(PackageName::as_str).collect::<Vec<_>>(),
        vec!["acme", "Zope.Interface"]
    );
}

#[test]
fn extra_names_compare_normalized() {
    assert_eq!(
        ExtraName::from_str("Dev_Tools").unwrap(),
        ExtraName::from_str("dev.tools").unwrap()
    );
    assert_eq!(
        ExtraName::new("Security".to_string()).unwrap().as_str(),
        "security"
    );
    assert!(ExtraName::from_str("not valid").is_err());
}
