use zip::result::ZipError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Failed to read `{0}` from the archive")]
    Zip(String, #[source] ZipError),
    #[error("The archive doesn't contain `{0}`")]
    EntryNotFound(String),
    #[error("The archive contains multiple `.dist-info` directories for `{0}`: {1}")]
    MultipleDistInfo(String, String),
    #[error("Archive member has an empty name")]
    EmptyFilename,
    #[error("Archive member name contains control characters: {filename}")]
    UnacceptableFilename { filename: String },
}

impl Error {
    /// Surface I/O failures as such, and missing entries by name.
    pub(crate) fn from_zip_error(file: String, err: ZipError) -> Self {
        match err {
            ZipError::Io(err) => Self::Io(err),
            ZipError::FileNotFound => Self::EntryNotFound(file),
            err => Self::Zip(file, err),
        }
    }
}
