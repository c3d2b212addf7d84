use std::fs::{self, DirEntry, ReadDir};
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;
use crate::File;

pub fn read_data_dir(data_path: &Path) -> Result<ReadDir> {
    let data_path = fs::canonicalize(data_path)?;
    let entries = fs::read_dir(data_path)?;

    Ok(entries)
}

/// Reads every regular file of a directory as a `File`, sorted by name.
pub fn read_files(data_path: &Path) -> Result<Vec<File>> {
    let mut files = read_data_dir(data_path)?
        .map(|dir_entry| read_dir_entry_file(dir_entry?))
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>>>()?;

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(files)
}

fn read_dir_entry_file(dir_entry: DirEntry) -> Result<Option<File>> {
    if dir_entry.file_type()?.is_dir() {
        return Ok(None);
    }

    let file_name = dir_entry.file_name().to_string_lossy().into_owned();
    let code = fs::read_to_string(dir_entry.path())?;

    Ok(Some(File::new(file_name, code)))
}

/// Reads a file, treating a missing file as absent data.
pub fn read_data(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub fn write_data(path: &Path, data: String) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = path.with_extension("tmp");
    fs::write(&staging, format!("{data}\n"))?;
    fs::rename(staging, path)?;

    Ok(())
}
