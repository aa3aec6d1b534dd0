// Shared test helpers. Each test binary compiles its own copy of this
// module, so not every function is used by every binary.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Writes `contents` to `dir/name`, creating parent directories as needed.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture parent dir");
    }
    std::fs::write(&path, contents).expect("write fixture");
    path
}
