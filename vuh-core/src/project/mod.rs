//! The capability interface the helpers use to register libraries, files and
//! options with a simulation project.

mod manifest;

pub use manifest::Manifest;

use camino::{Utf8Path, Utf8PathBuf};
use cranelift_entity::entity_impl;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// A reference to a library registered with a [Project].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryRef(u32);
entity_impl!(LibraryRef, "lib");

/// The value of a compile or simulation option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
    Flags(Vec<String>),
}

impl OptionValue {
    /// A flag list from anything that yields strings.
    pub fn flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OptionValue::Flags(flags.into_iter().map(Into::into).collect())
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

/// VHDL language revisions understood by the simulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VhdlStandard {
    #[serde(rename = "93")]
    Vhdl93,
    #[serde(rename = "2002")]
    Vhdl2002,
    #[serde(rename = "2008")]
    Vhdl2008,
    #[serde(rename = "2019")]
    Vhdl2019,
}

impl FromStr for VhdlStandard {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "93" | "1993" => Ok(VhdlStandard::Vhdl93),
            "2002" => Ok(VhdlStandard::Vhdl2002),
            "2008" | "08" => Ok(VhdlStandard::Vhdl2008),
            "2019" | "19" => Ok(VhdlStandard::Vhdl2019),
            _ => Err(format!("unknown VHDL standard `{s}`")),
        }
    }
}

impl Display for VhdlStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VhdlStandard::Vhdl93 => write!(f, "93"),
            VhdlStandard::Vhdl2002 => write!(f, "2002"),
            VhdlStandard::Vhdl2008 => write!(f, "2008"),
            VhdlStandard::Vhdl2019 => write!(f, "2019"),
        }
    }
}

/// The language of a source file when it can't be guessed from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Vhdl,
    Verilog,
    SystemVerilog,
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vhdl" => Ok(FileType::Vhdl),
            "verilog" => Ok(FileType::Verilog),
            "systemverilog" => Ok(FileType::SystemVerilog),
            _ => Err(format!("unknown file type `{s}`")),
        }
    }
}

/// Options passed through unchanged with every batch of source files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Names of the preprocessors to run on the files.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preprocessors: Vec<String>,

    /// Verilog include directories.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_dirs: Vec<Utf8PathBuf>,

    /// Verilog macro definitions.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub defines: BTreeMap<String, String>,

    /// Accept an empty file list instead of failing.
    pub allow_empty: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vhdl_standard: Option<VhdlStandard>,

    /// Don't scan the files for dependencies.
    pub no_parse: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
}

/// An error raised by a [Project] while registering libraries, files or
/// options, or while expanding file patterns for it.
#[derive(Debug)]
pub enum ProjectError {
    /// An IO error while reading the filesystem.
    Io(std::io::Error),

    /// A glob pattern could not be parsed.
    Pattern {
        pattern: String,
        error: glob::PatternError,
    },

    /// A directory could not be read during glob expansion.
    Glob(glob::GlobError),

    /// A path contains non-UTF-8 characters.
    NonUtf8Path(std::path::PathBuf),

    /// A library with this name already exists with a different kind.
    DuplicateLibrary(String),

    /// The library reference does not belong to this project.
    UnknownLibrary(LibraryRef),

    /// Source files were added to a precompiled library.
    ExternalLibrary(String),

    /// No files were given and empty lists were not allowed.
    NoFiles(String),

    /// The option name is not known to any supported simulator.
    UnknownOption { kind: OptionKind, key: String },
}

/// Compile options and simulation options live in separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Compile,
    Sim,
}

impl Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionKind::Compile => write!(f, "compile"),
            OptionKind::Sim => write!(f, "simulation"),
        }
    }
}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<glob::GlobError> for ProjectError {
    fn from(e: glob::GlobError) -> Self {
        Self::Glob(e)
    }
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            ProjectError::Io(e) => write!(f, "{}", e),
            ProjectError::Pattern { pattern, error } => {
                write!(f, "invalid file pattern `{}`: {}", pattern, error)
            }
            ProjectError::Glob(e) => write!(f, "{}", e),
            ProjectError::NonUtf8Path(p) => {
                write!(f, "path is not valid UTF-8: {}", p.display())
            }
            ProjectError::DuplicateLibrary(name) => {
                write!(f, "library {} has already been added", name)
            }
            ProjectError::UnknownLibrary(lib) => {
                write!(f, "unknown library {}", lib)
            }
            ProjectError::ExternalLibrary(name) => write!(
                f,
                "cannot add source files to external library {}",
                name
            ),
            ProjectError::NoFiles(name) => write!(
                f,
                "no source files were added to library {} (use allow_empty to permit this)",
                name
            ),
            ProjectError::UnknownOption { kind, key } => {
                write!(f, "unknown {} option `{}`", kind, key)
            }
        }
    }
}

impl std::error::Error for ProjectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectError::Io(e) => Some(e),
            ProjectError::Pattern { error, .. } => Some(error),
            ProjectError::Glob(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectError>;

/// A simulation project that libraries, source files and options are
/// registered with.
///
/// The helpers in this crate only ever talk to a project through this trait.
pub trait Project {
    /// The name of the simulator the project is configured for.
    fn simulator_name(&self) -> &str;

    /// Add a library compiled from sources. Adding a source library that
    /// already exists returns the existing library.
    fn add_library(&mut self, name: &str) -> Result<LibraryRef>;

    /// Add a precompiled library located at `path`.
    fn add_external_library(
        &mut self,
        name: &str,
        path: &Utf8Path,
    ) -> Result<LibraryRef>;

    /// All libraries, in the order they were added.
    fn libraries(&self) -> Vec<LibraryRef>;

    /// The name of `lib`.
    ///
    /// Panics if `lib` was not returned by this project.
    fn library_name(&self, lib: LibraryRef) -> &str;

    /// Is this a precompiled library?
    ///
    /// Panics if `lib` was not returned by this project.
    fn is_external(&self, lib: LibraryRef) -> bool;

    /// Append to a compile option for all files.
    fn add_compile_option(&mut self, key: &str, value: OptionValue)
    -> Result<()>;

    /// Set a simulation option. Without `overwrite`, flag lists are extended.
    fn set_sim_option(
        &mut self,
        key: &str,
        value: OptionValue,
        overwrite: bool,
    ) -> Result<()>;

    /// Register `files` with `lib`.
    fn add_source_files(
        &mut self,
        lib: LibraryRef,
        files: &[Utf8PathBuf],
        options: &SourceOptions,
    ) -> Result<()>;

    /// The files registered with `lib`. Fails if there are none, unless
    /// `allow_empty` is set.
    fn source_files(
        &self,
        lib: LibraryRef,
        allow_empty: bool,
    ) -> Result<Vec<Utf8PathBuf>>;
}
