//! File System Utilities

use std::fs::File;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::system::{self, Error};

/// Check if `path` names an existing regular file
pub fn file_exists<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref().is_file()
}

/// Check if `path` names an existing directory
pub fn dir_exists<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref().is_dir()
}

/// Convenience wrapper for std::fs::remove_dir_all
pub fn remove_directory<P>(path: P) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    system::verboseln!("Removing", "{}", path.display());
    std::fs::remove_dir_all(path).map_err(|e| Error::RemoveDirectory(path.display().to_string(), e))
}

/// Convenience wrapper for std::fs::create_dir_all
pub fn ensure_directory<P>(path: P) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    system::verboseln!("Creating", "{}", path.display());
    std::fs::create_dir_all(path).map_err(|e| Error::CreateDirectory(path.display().to_string(), e))
}

/// Convenience wrapper for std::fs::remove_file
pub fn remove_file<P>(path: P) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    system::verboseln!("Removing", "{}", path.display());
    std::fs::remove_file(path).map_err(|e| Error::RemoveFile(path.display().to_string(), e))
}

/// Convenience wrapper for std::fs::rename
pub fn rename_file<P, Q>(from: P, to: Q) -> Result<(), Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let from = from.as_ref();
    let to = to.as_ref();
    system::verboseln!("Renaming", "{} --> {}", from.display(), to.display());
    std::fs::rename(from, to)
        .map_err(|e| Error::RenameFile(from.display().to_string(), to.display().to_string(), e))
}

/// Convenience wrapper for std::fs::write
pub fn write_file<P, S>(path: P, content: S) -> Result<(), Error>
where
    P: AsRef<Path>,
    S: AsRef<[u8]>,
{
    let path = path.as_ref();
    std::fs::write(path, content).map_err(|e| Error::WriteFile(path.display().to_string(), e))
}

/// Wrapper for File::create
pub fn create<P>(path: P) -> Result<File, Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    File::create(path).map_err(|e| Error::WriteFile(path.display().to_string(), e))
}

/// Get the current working directory
pub fn current_dir() -> Result<PathBuf, Error> {
    std::env::current_dir().map_err(|e| Error::InvalidPath(".".to_string(), e))
}

/// Get the modified time for a file.
///
/// Errors if the file does not exist or cannot be stat'ed
pub fn modified_time<P>(path: P) -> Result<FileTime, Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    path.metadata()
        .map(|x| FileTime::from_last_modification_time(&x))
        .map_err(|e| Error::ReadFile(path.display().to_string(), e))
}

/// Set the modified time for a file
pub fn set_modified_time<P>(path: P, time: FileTime) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    filetime::set_file_mtime(path, time)
        .map_err(|e| Error::SetModifiedTime(path.display().to_string(), e))
}

/// Number of logical CPUs, at least 1
pub fn cpu_count() -> usize {
    num_cpus::get().max(1)
}

/// Locate an executable in PATH
pub fn find_executable<S>(name: S) -> Option<PathBuf>
where
    S: AsRef<std::ffi::OsStr>,
{
    which::which(name).ok()
}

pub trait PathExt {
    /// Wrapper for std::path::canonicalize, but maps the error to our own
    fn canonicalize2(&self) -> Result<PathBuf, Error>;
}

impl<P> PathExt for P
where
    P: AsRef<Path>,
{
    fn canonicalize2(&self) -> Result<PathBuf, Error> {
        dunce::canonicalize(self)
            .map_err(|x| Error::InvalidPath(self.as_ref().display().to_string(), x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existence_predicates_distinguish_files_and_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        std::fs::write(&file, "").unwrap();
        assert!(file_exists(&file));
        assert!(!dir_exists(&file));
        assert!(dir_exists(tmp.path()));
        assert!(!file_exists(tmp.path()));
        assert!(!file_exists(tmp.path().join("missing")));
    }

    #[test]
    fn removing_missing_paths_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(remove_file(tmp.path().join("missing")).is_ok());
        assert!(remove_directory(tmp.path().join("missing")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn finds_executables_in_path() {
        assert!(find_executable("sh").is_some());
        assert!(find_executable("definitely-not-a-real-tool-0x0").is_none());
    }

    #[test]
    fn cpu_count_is_positive() {
        assert!(cpu_count() >= 1);
    }
}
