use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::ExecutionError;

/// Exclusive scratch directory for one execution
///
/// The directory and everything in it is removed when the value is dropped,
/// whichever way the execution ends.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create(root: &Path) -> Result<Self, ExecutionError> {
        fs::create_dir_all(root).map_err(|e| {
            ExecutionError::System(format!(
                "unable to create workspace root {}: {e}",
                root.display()
            ))
        })?;
        let dir = tempfile::Builder::new()
            .prefix("judge-")
            .tempdir_in(root)
            .map_err(|e| ExecutionError::System(format!("unable to create workspace: {e}")))?;

        log::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the submission under `file_name`, returning its path
    pub fn write_source(&self, file_name: &str, code: &str) -> Result<PathBuf, ExecutionError> {
        let path = self.path().join(file_name);
        fs::write(&path, format!("{code}\n"))?;
        Ok(path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        log::debug!("Removing workspace {}", self.dir.path().display());
    }
}

/// Finds `program` the way a shell would, using `search_path` instead of `PATH`
///
/// A program given with a directory component is only checked in place.
pub fn locate_executable(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    std::env::split_paths(search_path?)
        .flat_map(|dir| {
            let plain = dir.join(program);
            let exe = cfg!(windows).then(|| plain.with_extension("exe"));
            std::iter::once(plain).chain(exe)
        })
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// `search_path` with `dir` in front, so a portable toolchain finds its own helpers
pub fn prepend_to_path(dir: &Path, search_path: Option<&OsStr>) -> Option<OsString> {
    let rest = search_path.map(std::env::split_paths).into_iter().flatten();
    std::env::join_paths(std::iter::once(dir.to_path_buf()).chain(rest)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_workspace_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();
        let source = workspace.write_source("solution.cpp", "int main() {}").unwrap();
        let dir = workspace.path().to_path_buf();

        assert!(source.starts_with(&dir));
        assert_eq!(fs::read_to_string(&source).unwrap(), "int main() {}\n");

        drop(workspace);
        assert!(!dir.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let first = Workspace::create(root.path()).unwrap();
        let second = Workspace::create(root.path()).unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn test_locate_executable_searches_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let expected = make_executable(second.path(), "fakecc");
        fs::write(first.path().join("fakecc"), "not executable").unwrap();

        let search_path =
            std::env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(
            locate_executable("fakecc", Some(&search_path)),
            Some(expected)
        );
        assert_eq!(locate_executable("missingcc", Some(&search_path)), None);
        assert_eq!(locate_executable("fakecc", None), None);
    }

    #[test]
    fn test_locate_executable_with_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = make_executable(dir.path(), "cc");
        let explicit = compiler.to_string_lossy().to_string();
        assert_eq!(locate_executable(&explicit, None), Some(compiler));
    }

    #[test]
    fn test_prepend_to_path() {
        let joined = prepend_to_path(Path::new("/opt/tools/bin"), Some(OsStr::new("/usr/bin")))
            .unwrap();
        let parts: Vec<PathBuf> = std::env::split_paths(&joined).collect();
        assert_eq!(
            parts,
            vec![PathBuf::from("/opt/tools/bin"), PathBuf::from("/usr/bin")]
        );
    }
}
