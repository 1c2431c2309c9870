#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

use codejudge::config::{JudgeConfig, MilliSecond};

/// `g++` stand-in: the "C++" source is a shell script, compiling prepends a shebang
const FAKE_GXX: &str = r#"#!/bin/sh
if /bin/grep -q COMPILE_FAIL "$1"; then
    echo "solution.cpp:1:1: error: expected unqualified-id" >&2
    exit 1
fi
{ echo '#!/bin/sh'; /bin/cat "$1"; } > "$3"
/bin/chmod +x "$3"
"#;

/// `javac` stand-in: copies `X.java` to `X.class`
const FAKE_JAVAC: &str = r#"#!/bin/sh
src="$3"
if /bin/grep -q COMPILE_FAIL "$src"; then
    echo "$src:1: error: ';' expected" >&2
    exit 1
fi
/bin/cp "$src" "${src%.java}.class"
"#;

/// `java` stand-in: `java -cp DIR CLASS` runs `DIR/CLASS.class` with sh
const FAKE_JAVA: &str = r#"#!/bin/sh
exec /bin/sh "$2/$3.class"
"#;

fn write_tool(dir: &Path, name: &str, script: &str) {
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Directory holding the fake toolchains, created once per test binary
pub fn fake_toolchain_dir() -> &'static Path {
    static DIR: OnceLock<TempDir> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        write_tool(dir.path(), "g++", FAKE_GXX);
        write_tool(dir.path(), "javac", FAKE_JAVAC);
        write_tool(dir.path(), "java", FAKE_JAVA);
        dir
    })
    .path()
}

/// A config that only sees the fake toolchains and keeps workspaces under `root`
pub fn fake_config(root: &Path) -> JudgeConfig {
    let mut config = JudgeConfig {
        compile_timeout: MilliSecond(5_000),
        run_timeout: MilliSecond(1_000),
        workspace_root: Some(root.to_path_buf()),
        search_path: Some(fake_toolchain_dir().to_string_lossy().into_owned()),
        ..JudgeConfig::default()
    };
    config.toolchains.native.fallback = None;
    config
}

/// A config whose search path finds nothing at all
pub fn empty_config(root: &Path, empty: &Path) -> JudgeConfig {
    let mut config = fake_config(root);
    config.search_path = Some(empty.to_string_lossy().into_owned());
    config
}

/// A config using the real `PATH`, with workspaces under `root`
pub fn system_config(root: &Path) -> JudgeConfig {
    JudgeConfig {
        workspace_root: Some(root.to_path_buf()),
        ..JudgeConfig::default()
    }
}

pub fn python3_available() -> bool {
    let config = JudgeConfig::default();
    config
        .search_path()
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join("python3").is_file()))
        .unwrap_or(false)
}

/// Entries left behind under a workspace root
pub fn leftovers(root: &Path) -> Vec<PathBuf> {
    match fs::read_dir(root) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
