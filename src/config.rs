use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "codejudge", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<PathBuf>,

    /// Report which toolchains can be found, then exit
    #[arg(long = "check-toolchains", default_value_t = false)]
    pub check_toolchains: bool,

    /// Submission files to judge
    pub submissions: Vec<PathBuf>,
}

impl CliArgs {
    /// Load the configuration from the given file, the per-user config file, or defaults
    pub fn to_config(&self) -> Result<JudgeConfig> {
        if let Some(path) = &self.config_path {
            return JudgeConfig::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                log::info!("Using configuration at {}", path.display());
                JudgeConfig::from_file(&path)
            }
            _ => Ok(JudgeConfig::default()),
        }
    }
}

/// Location of the per-user configuration file, if the platform has one
pub fn default_config_path() -> Option<PathBuf> {
    use directories::ProjectDirs;

    ProjectDirs::from("", "", "codejudge").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Everything the runners need from the environment, resolved once and passed in
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct JudgeConfig {
    pub compile_timeout: MilliSecond,
    pub run_timeout: MilliSecond,
    /// Parent of the per-execution workspaces
    pub workspace_root: Option<PathBuf>,
    /// Replaces `PATH` when looking up toolchains
    pub search_path: Option<String>,
    pub toolchains: ToolchainsConfig,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            compile_timeout: MilliSecond(10_000),
            run_timeout: MilliSecond(2_000),
            workspace_root: None,
            search_path: None,
            toolchains: ToolchainsConfig::default(),
        }
    }
}

impl JudgeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow!("Unable to open config {}: {e}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| anyhow!("Invalid config {}: {e}", path.display()))
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("codejudge"))
    }

    pub fn search_path(&self) -> Option<OsString> {
        match &self.search_path {
            Some(path) => Some(OsString::from(path)),
            None => std::env::var_os("PATH"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MilliSecond(pub u64);

impl From<MilliSecond> for Duration {
    fn from(value: MilliSecond) -> Self {
        Duration::from_millis(value.0)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ToolchainsConfig {
    pub native: NativeToolchain,
    pub managed: ManagedToolchain,
    pub interpreted: InterpretedToolchain,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct NativeToolchain {
    pub compiler: String,
    /// Portable installation, relative paths are taken from the running executable's directory
    pub fallback: Option<PathBuf>,
}

impl Default for NativeToolchain {
    fn default() -> Self {
        let compiler_file = if cfg!(windows) { "g++.exe" } else { "g++" };
        Self {
            compiler: "g++".to_string(),
            fallback: Some(
                Path::new("tools")
                    .join("w64devkit")
                    .join("bin")
                    .join(compiler_file),
            ),
        }
    }
}

impl NativeToolchain {
    pub fn fallback_path(&self) -> Option<PathBuf> {
        let fallback = self.fallback.as_ref()?;
        if fallback.is_absolute() {
            return Some(fallback.clone());
        }
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join(fallback))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ManagedToolchain {
    pub compiler: String,
    pub launcher: String,
}

impl Default for ManagedToolchain {
    fn default() -> Self {
        Self {
            compiler: "javac".to_string(),
            launcher: "java".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct InterpretedToolchain {
    pub interpreter: String,
}

impl Default for InterpretedToolchain {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let config: JudgeConfig = serde_json::from_str(
            r#"{
                "run_timeout": 1500,
                "workspace_root": "/var/tmp/judge",
                "toolchains": { "managed": { "compiler": "/opt/jdk/bin/javac" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.run_timeout, MilliSecond(1500));
        assert_eq!(config.compile_timeout, MilliSecond(10_000));
        assert_eq!(config.workspace_root(), PathBuf::from("/var/tmp/judge"));
        assert_eq!(config.toolchains.managed.compiler, "/opt/jdk/bin/javac");
        assert_eq!(config.toolchains.managed.launcher, "java");
        assert_eq!(config.toolchains.interpreted.interpreter, "python3");
    }

    #[test]
    fn test_default_timeouts() {
        let config = JudgeConfig::default();
        assert_eq!(Duration::from(config.compile_timeout), Duration::from_secs(10));
        assert_eq!(Duration::from(config.run_timeout), Duration::from_secs(2));
    }

    #[test]
    fn test_explicit_search_path_wins() {
        let config = JudgeConfig {
            search_path: Some("/nowhere".to_string()),
            ..JudgeConfig::default()
        };
        assert_eq!(config.search_path(), Some(OsString::from("/nowhere")));
    }

    #[test]
    fn test_absolute_fallback_is_kept() {
        let toolchain = NativeToolchain {
            compiler: "g++".to_string(),
            fallback: Some(PathBuf::from("/opt/gcc/bin/g++")),
        };
        assert_eq!(
            toolchain.fallback_path(),
            Some(PathBuf::from("/opt/gcc/bin/g++"))
        );
    }
}
