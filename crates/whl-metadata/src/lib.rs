use mailparse::{MailHeaderMap, MailParseError};
use thiserror::Error;

use whl_normalize::InvalidNameError;
use whl_pep508::ParseError;

pub use record::MetadataRecord;
pub use resolver::{
    DependencyResolver, RequestedExtra, ResolveError, ResolvedDependencies, ResolvedExtra,
};

mod record;
mod resolver;

/// An error while parsing the core metadata of a wheel.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    MailParse(#[from] MailParseError),
    #[error("Metadata field {0} not found")]
    FieldNotFound(&'static str),
    #[error("Failed to parse `{field}` entry: `{value}`")]
    Requirement {
        field: &'static str,
        value: String,
        #[source]
        source: Box<ParseError>,
    },
    #[error("The `{field}` entry `{value}` is gated on an invalid extra")]
    InvalidImplicitExtra {
        field: &'static str,
        value: String,
        #[source]
        source: InvalidNameError,
    },
    #[error("Invalid `Provides-Extra` entry: `{0}`")]
    InvalidProvidesExtra(String, #[source] InvalidNameError),
}

/// The `Key: value` header block of a `METADATA` file.
///
/// A value of `UNKNOWN`, written by old versions of setuptools for unset fields, counts as
/// absent.
#[derive(Debug)]
struct Headers<'a>(Vec<mailparse::MailHeader<'a>>);

impl<'a> Headers<'a> {
    fn parse(content: &'a [u8]) -> Result<Self, MailParseError> {
        mailparse::parse_headers(content).map(|(headers, _body)| Self(headers))
    }

    fn first(&self, field: &str) -> Option<String> {
        self.0
            .get_first_value(field)
            .filter(|value| value != "UNKNOWN")
    }

    fn all(&self, field: &str) -> impl Iterator<Item = String> {
        let values = self.0.get_all_values(field);
        values.into_iter().filter(|value| value != "UNKNOWN")
    }
}
