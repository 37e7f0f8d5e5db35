//! Library search path resolution.
//!
//! Native libraries shipped next to the installed executable have to be found
//! before the driver is loaded. Instead of prepending directories to the
//! process environment, the directories are collected once into a
//! [`LibrarySearchPath`] that the loader is handed explicitly.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{debug, info};

/// Environment variable the platform loader consults.
#[cfg(target_os = "windows")]
pub const SEARCH_PATH_VAR: &str = "PATH";
#[cfg(target_os = "macos")]
pub const SEARCH_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const SEARCH_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Directories relative to the executable that may hold bundled libraries.
const INSTALL_DIRS: &[&str] = &["", "lib", "../lib", "Library/bin", "DLLs"];

/// Ordered, de-duplicated list of directories to load native libraries from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySearchPath {
    dirs: Vec<PathBuf>,
}

impl LibrarySearchPath {
    /// Resolve the search path for the running process.
    pub fn from_env() -> Self {
        let exe = std::env::current_exe().ok();
        let inherited = std::env::var_os(SEARCH_PATH_VAR);
        Self::resolve(exe.as_deref(), inherited.as_deref())
    }

    /// Install directories of `exe` that exist come first, followed by the
    /// entries of the inherited search variable.
    pub fn resolve(exe: Option<&Path>, inherited: Option<&OsStr>) -> Self {
        let inherited: Vec<PathBuf> = inherited
            .map(|value| {
                std::env::split_paths(value)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let mut dirs: Vec<PathBuf> = Vec::new();
        if let Some(base) = exe.and_then(Path::parent) {
            for rel in INSTALL_DIRS {
                let dir = if rel.is_empty() {
                    base.to_path_buf()
                } else {
                    base.join(rel)
                };
                if !dir.is_dir() || inherited.contains(&dir) || dirs.contains(&dir) {
                    continue;
                }
                info!("Added {} to library search path", dir.display());
                dirs.push(dir);
            }
        }

        for dir in inherited {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }

        debug!("Library search path: {:?}", dirs);
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Paths to try when loading `file_name`: every search directory that
    /// holds it, then the bare name for the system loader.
    pub fn candidates(&self, file_name: &str) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = self
            .dirs
            .iter()
            .map(|dir| dir.join(file_name))
            .filter(|path| path.is_file())
            .collect();
        found.push(PathBuf::from(file_name));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Lay out `<root>/bin/app` plus the requested subdirectories.
    fn install_tree(subdirs: &[&str]) -> (TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        for sub in subdirs {
            fs::create_dir_all(root.path().join(sub)).unwrap();
        }
        let exe = bin.join("app");
        fs::write(&exe, b"").unwrap();
        (root, exe)
    }

    #[test]
    fn test_install_dirs_precede_inherited() {
        let (root, exe) = install_tree(&["bin/lib", "lib"]);
        let inherited = std::env::join_paths(["/opt/sdr/lib"]).unwrap();

        let path = LibrarySearchPath::resolve(Some(&exe), Some(&inherited));

        let bin = root.path().join("bin");
        assert_eq!(
            path.dirs(),
            &[
                bin.clone(),
                bin.join("lib"),
                bin.join("../lib"),
                PathBuf::from("/opt/sdr/lib"),
            ]
        );
    }

    #[test]
    fn test_missing_install_dirs_are_skipped() {
        let (root, exe) = install_tree(&[]);

        let path = LibrarySearchPath::resolve(Some(&exe), None);

        assert_eq!(path.dirs(), &[root.path().join("bin")]);
    }

    #[test]
    fn test_inherited_entries_not_repeated() {
        let (root, exe) = install_tree(&["bin/lib"]);
        let lib = root.path().join("bin").join("lib");
        let inherited = std::env::join_paths([lib.clone(), lib.clone()]).unwrap();

        let path = LibrarySearchPath::resolve(Some(&exe), Some(&inherited));

        assert_eq!(path.dirs().iter().filter(|d| **d == lib).count(), 1);
    }

    #[test]
    fn test_candidates_end_with_bare_name() {
        let (root, exe) = install_tree(&["bin/lib"]);
        let lib = root.path().join("bin").join("lib").join("librtlsdr.so.0");
        fs::write(&lib, b"").unwrap();

        let path = LibrarySearchPath::resolve(Some(&exe), None);

        assert_eq!(
            path.candidates("librtlsdr.so.0"),
            vec![lib, PathBuf::from("librtlsdr.so.0")]
        );
    }

    #[test]
    fn test_no_executable_uses_inherited_only() {
        let inherited = std::env::join_paths(["/a", "", "/b"]).unwrap();

        let path = LibrarySearchPath::resolve(None, Some(&inherited));

        assert_eq!(path.dirs(), &[PathBuf::from("/a"), PathBuf::from("/b")]);
    }
}
