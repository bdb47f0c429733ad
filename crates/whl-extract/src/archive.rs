use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use tracing::{debug, instrument, trace, warn};
use zip::ZipArchive;

use whl_distribution_filename::PackageIdentity;

use crate::{Error, check_member_name};

/// An open wheel archive.
pub struct WheelArchive {
    path: PathBuf,
    archive: ZipArchive<BufReader<fs_err::File>>,
}

impl WheelArchive {
    /// Open the archive at the given path and read its central directory.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = fs_err::File::open(path)?;
        let archive = ZipArchive::new(BufReader::new(file))
            .map_err(|err| Error::from_zip_error(path.display().to_string(), err))?;
        debug!("Opened archive with {} entries", archive.len());
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// The path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the entry with the given name into memory.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, Error> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|err| Error::from_zip_error(name.to_string(), err))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Read the `METADATA` file of the `.dist-info` directory named after the identity.
    ///
    /// Some build tools don't preserve the casing of the filename in the `.dist-info` directory,
    /// so if the exact path is missing, a case-insensitive match is accepted.
    pub fn read_metadata(&mut self, identity: &PackageIdentity) -> Result<Vec<u8>, Error> {
        let metadata_path = identity.metadata_path();
        if self.archive.index_for_name(&metadata_path).is_some() {
            return self.read_entry(&metadata_path);
        }

        let dist_info = self.find_dist_info(identity)?;
        debug!("Reading metadata from `{dist_info}.dist-info` instead of `{metadata_path}`");
        self.read_entry(&format!("{dist_info}.dist-info/METADATA"))
    }

    /// Find the prefix of the `.dist-info` directory matching the identity, ignoring case.
    fn find_dist_info(&self, identity: &PackageIdentity) -> Result<String, Error> {
        let dist_info_matcher = format!(
            "{}-{}",
            identity.distribution_name(),
            identity.version()
        )
        .to_lowercase();
        let dist_infos: Vec<_> = self
            .archive
            .file_names()
            .filter_map(|name| name.split_once('/'))
            .filter_map(|(dir, file)| Some((dir.strip_suffix(".dist-info")?, file)))
            .filter(|(dir, file)| dir.to_lowercase() == dist_info_matcher && *file == "METADATA")
            .map(|(dir, _file)| dir)
            .collect();
        match dist_infos.as_slice() {
            [] => Err(Error::EntryNotFound(identity.metadata_path())),
            [dist_info] => Ok((*dist_info).to_string()),
            _ => Err(Error::MultipleDistInfo(
                identity.to_string(),
                dist_infos.join(", "),
            )),
        }
    }

    /// Unpack every entry of the archive into `target`, creating it if necessary.
    ///
    /// Entries whose name would escape `target` are skipped. Returns the number of files written.
    #[instrument(skip_all, fields(target = %target.display()))]
    pub fn extract_all(&mut self, target: &Path) -> Result<usize, Error> {
        fs_err::create_dir_all(target)?;

        // Cache the created parent dirs to avoid io calls
        let mut created_dirs = FxHashSet::default();
        let mut extracted = 0;
        for index in 0..self.archive.len() {
            let mut file = self
                .archive
                .by_index(index)
                .map_err(|err| Error::from_zip_error(format!("(index {index})"), err))?;

            check_member_name(file.name())?;

            // enclosed_name takes care of evil zip paths
            let Some(relative) = file.enclosed_name() else {
                warn!("Skipping unsafe archive member: `{}`", file.name());
                continue;
            };
            let out_path = target.join(&relative);

            if file.is_dir() {
                if created_dirs.insert(out_path.clone()) {
                    fs_err::create_dir_all(&out_path)?;
                }
                continue;
            }

            if let Some(parent) = out_path.parent() {
                if created_dirs.insert(parent.to_path_buf()) {
                    fs_err::create_dir_all(parent)?;
                }
            }

            let mut outfile = BufWriter::new(fs_err::File::create(&out_path)?);
            std::io::copy(&mut file, &mut outfile)?;
            outfile.flush()?;
            trace!("Extracted `{}`", relative.display());

            // Preserve the executable bit; the remaining mode bits follow the umask.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;

                if file.unix_mode().is_some_and(|mode| mode & 0o111 != 0) {
                    let mut permissions = fs_err::metadata(&out_path)?.permissions();
                    permissions.set_mode(permissions.mode() | 0o111);
                    fs_err::set_permissions(&out_path, permissions)?;
                }
            }

            extracted += 1;
        }

        debug!("Extracted {extracted} files");
        Ok(extracted)
    }
}
