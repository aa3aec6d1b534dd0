//! Thin wrappers over `std::fs`/`std::path`, isolating the rest of the crate
//! from direct filesystem calls.

use std::path::{Path, PathBuf};

use crate::error::CompileError;

#[must_use]
pub fn exists_file(path: &Path) -> bool {
    path.is_file()
}

#[must_use]
pub fn exists_dir(path: &Path) -> bool {
    path.is_dir()
}

/// Canonical absolute form, or an empty path on failure.
#[must_use]
pub fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_default()
}

pub fn read_all(path: &Path) -> Result<String, CompileError> {
    std::fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_all(path: &Path, contents: &str) -> Result<(), CompileError> {
    std::fs::write(path, contents).map_err(|source| CompileError::IoWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_of_missing_path_is_empty() {
        assert_eq!(absolute(Path::new("/definitely/does/not/exist")), PathBuf::new());
    }

    #[test]
    fn round_trips_through_write_and_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("f.txt");
        write_all(&path, "hello").expect("write");
        assert!(exists_file(&path));
        assert_eq!(read_all(&path).expect("read"), "hello");
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let err = read_all(Path::new("/definitely/does/not/exist")).unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
    }
}
