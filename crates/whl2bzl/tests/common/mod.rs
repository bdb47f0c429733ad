#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) const REQUIREMENTS: &str = "@pip//:requirements.bzl";

/// A `whl2bzl` command isolated from the environment of the test runner.
pub(crate) fn whl2bzl() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_whl2bzl"));
    command
        .env_remove("WHL2BZL_DIRECTORY")
        .env_remove("WHL2BZL_REQUIREMENTS")
        .env_remove("WHL2BZL_LOG_CONTEXT")
        .env_remove("RUST_LOG")
        .arg("--color")
        .arg("never");
    command
}

/// Write a wheel named `filename` into `temp_dir`, containing `files` and, if given, a `METADATA`
/// file in the `.dist-info` directory derived from the filename.
pub(crate) fn build_wheel(
    temp_dir: &TempDir,
    filename: &str,
    metadata: Option<&str>,
    files: &[(&str, &str)],
) -> PathBuf {
    let path = temp_dir.child(filename).to_path_buf();
    let mut parts = filename.splitn(3, '-');
    let name = parts.next().unwrap();
    let version = parts.next().unwrap();
    let dist_info = format!("{name}-{version}.dist-info");

    let mut writer = ZipWriter::new(std::fs::File::create(&path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    if let Some(metadata) = metadata {
        writer
            .start_file(format!("{dist_info}/METADATA"), options)
            .unwrap();
        writer.write_all(metadata.as_bytes()).unwrap();
    }
    writer
        .start_file(format!("{dist_info}/WHEEL"), options)
        .unwrap();
    writer
        .write_all(b"Wheel-Version: 1.0\nRoot-Is-Purelib: true\nTag: py3-none-any\n")
        .unwrap();
    writer.finish().unwrap();
    path
}
