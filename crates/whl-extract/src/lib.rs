//! Reading wheel archives and unpacking them into a directory.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

pub use archive::WheelArchive;
pub use error::Error;

mod archive;
mod error;

/// Any Unicode "Other" character: controls, format characters, surrogates and unassigned code
/// points.
static NON_PRINTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{C}").expect("`\\p{C}` is a valid regex"));

/// Reject member names that are empty or contain non-printable characters.
///
/// Traversal outside the target directory is ruled out separately, through
/// `ZipFile::enclosed_name`. The error shows the name with every offending character replaced
/// by U+FFFD.
pub(crate) fn check_member_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::EmptyFilename);
    }
    match NON_PRINTABLE.replace_all(name, "\u{FFFD}") {
        Cow::Borrowed(_) => Ok(()),
        Cow::Owned(filename) => Err(Error::UnacceptableFilename { filename }),
    }
}
