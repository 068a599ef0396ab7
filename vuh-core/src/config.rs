use crate::git;
use crate::pattern::FilePattern;
use crate::project::{OptionValue, SourceOptions};
use camino::{Utf8Path, Utf8PathBuf};
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The environment variable VUnit reads the simulator name from.
pub const SIMULATOR_ENV: &str = "VUNIT_SIMULATOR";

/// The default name of the project description.
pub const DEFAULT_CONFIG: &str = "vuh.toml";

#[derive(Debug, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// The simulator the project is configured for.
    pub simulator: String,

    /// Enable verbose output.
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            simulator: "ghdl".to_string(),
            verbose: false,
        }
    }
}

/// UVVM libraries to make available to the project.
#[derive(Debug, Clone, Deserialize)]
pub struct UvvmConfig {
    /// The UVVM checkout, relative to the project root.
    pub root: Utf8PathBuf,

    /// Library names, e.g. `uvvm_util` or `bitvis_vip_scoreboard`.
    pub libraries: Vec<String>,

    /// Reference precompiled libraries instead of compiling from source.
    #[serde(default)]
    pub precompiled: bool,

    /// Add the GHDL flags UVVM needs when the simulator is GHDL.
    #[serde(default = "default_true")]
    pub ghdl_flags: bool,
}

fn default_true() -> bool {
    true
}

/// A library compiled from the files its patterns select.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    pub name: String,

    pub include: Vec<FilePattern>,

    #[serde(default)]
    pub exclude: Vec<FilePattern>,

    #[serde(flatten)]
    pub options: SourceOptions,
}

/// The project description, usually read from `vuh.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// The directory patterns are relative to. Defaults to the git
    /// repository root.
    pub root: Option<Utf8PathBuf>,

    /// Where to write the `vhdl_ls.toml`.
    pub vhdl_ls: Option<Utf8PathBuf>,

    /// Where to write the JSON manifest.
    pub manifest: Option<Utf8PathBuf>,

    pub uvvm: Option<UvvmConfig>,

    #[serde(rename = "library")]
    pub libraries: Vec<LibraryConfig>,

    pub compile_options: BTreeMap<String, OptionValue>,

    pub sim_options: BTreeMap<String, OptionValue>,
}

impl ProjectConfig {
    /// Find the project root for a project described in `config_dir`.
    ///
    /// An explicit `root` is relative to `config_dir`. Otherwise the git
    /// repository root is used, falling back to `config_dir` itself.
    pub fn root_dir(
        &self,
        config_dir: &Utf8Path,
    ) -> anyhow::Result<Utf8PathBuf> {
        if let Some(root) = &self.root {
            return Ok(config_dir.join(root));
        }
        match git::repo_root(Some(config_dir))? {
            Some(root) => Ok(root),
            None => {
                log::warn!("no project root configured, using {config_dir}");
                Ok(config_dir.to_path_buf())
            }
        }
    }
}

/// Load configuration data from the project description at `path`: the
/// defaults overridden by the file.
pub fn load_config(path: &Utf8Path) -> Figment {
    Figment::from(Serialized::defaults(GlobalConfig::default()))
        .merge(Toml::file(path))
}

/// Let the simulator named by `VUNIT_SIMULATOR` (passed in as `env`)
/// override the one in `config`.
pub fn with_simulator_env(config: Figment, env: Option<String>) -> Figment {
    match env {
        Some(sim) => config.merge(Serialized::default("simulator", sim)),
        None => config,
    }
}

/// Parse a project description from a string, without consulting the
/// environment.
pub fn config_from_str(src: &str) -> Figment {
    Figment::from(Serialized::defaults(GlobalConfig::default()))
        .merge(Toml::string(src))
}
