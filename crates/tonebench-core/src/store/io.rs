//! File IO helpers for the result store

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, TonebenchError};

const TEMP_SUFFIX: &str = ".tmp";

/// True for in-progress temp files left behind by an interrupted write
pub(crate) fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(TEMP_SUFFIX))
}

/// Uniquely named hidden sibling of `path`, `.<name>.<random>.tmp`
fn temp_file_for(path: &Path, dir: &Path) -> std::io::Result<NamedTempFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(&format!(".{}.", name))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
}

/// Replace `path` with whatever `fill` writes, via temp file and rename.
///
/// Every call writes its own temp file, so concurrent writers of the same
/// path never share one; the last rename wins. A crash before the rename
/// leaves the previous content intact.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> std::io::Result<()>,
{
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|e| {
                TonebenchError::io_operation("create directory", parent.display(), e)
            })?;
            parent
        }
        None => Path::new("."),
    };

    let temp = temp_file_for(path, dir)
        .map_err(|e| TonebenchError::io_operation("create temp file for", path.display(), e))?;

    // The temp file is removed on drop if anything below fails
    let written = {
        let mut writer = BufWriter::new(temp.as_file());
        fill(&mut writer).and_then(|()| writer.flush())
    }
    .and_then(|()| temp.as_file().sync_all());

    if let Err(e) = written {
        return Err(TonebenchError::io_operation("write", temp.path().display(), e));
    }

    temp.persist(path)
        .map(|_| ())
        .map_err(|e| TonebenchError::io_operation("replace", path.display(), e.error))
}
