//! Zip archive of the report directory.

use crate::result::{ShopError, ShopResult};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn report_error(message: impl std::fmt::Display) -> ShopError {
    ShopError::Report {
        message: message.to_string(),
    }
}

/// Zip everything under `source` into `dest`. Entry names are relative to
/// `source` and use `/`. Returns the number of files written.
pub fn zip_dir(source: &Path, dest: &Path) -> ShopResult<usize> {
    if !source.is_dir() {
        return Err(report_error(format!(
            "report directory {} does not exist",
            source.display()
        )));
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut zip = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(report_error)?;
        let path = entry.path();
        if path == dest {
            continue;
        }
        let relative = path.strip_prefix(source).map_err(report_error)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options).map_err(report_error)?;
        } else {
            zip.start_file(name, options).map_err(report_error)?;
            io::copy(&mut File::open(path)?, &mut zip)?;
            files += 1;
        }
    }
    zip.finish().map_err(report_error)?;
    info!(source = %source.display(), dest = %dest.display(), files, "report zipped");
    Ok(files)
}
