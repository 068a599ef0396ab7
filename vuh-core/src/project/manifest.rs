use super::{
    LibraryRef, OptionKind, OptionValue, Project, ProjectError, Result,
    SourceOptions,
};
use camino::{Utf8Path, Utf8PathBuf};
use cranelift_entity::PrimaryMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Compile options understood by VUnit's simulator interfaces.
const COMPILE_OPTIONS: &[&str] = &[
    "enable_coverage",
    "activehdl.vcom_flags",
    "activehdl.vlog_flags",
    "ghdl.a_flags",
    "ghdl.flags",
    "incisive.irun_vhdl_flags",
    "incisive.irun_verilog_flags",
    "modelsim.vcom_flags",
    "modelsim.vlog_flags",
    "nvc.a_flags",
    "rivierapro.vcom_flags",
    "rivierapro.vlog_flags",
];

/// Simulation options understood by VUnit's simulator interfaces.
const SIM_OPTIONS: &[&str] = &[
    "enable_coverage",
    "pli",
    "disable_ieee_warnings",
    "vhdl_assert_stop_level",
    "activehdl.vsim_flags",
    "activehdl.vsim_flags.gui",
    "ghdl.elab_e",
    "ghdl.elab_flags",
    "ghdl.gtkwave_script.gui",
    "ghdl.sim_flags",
    "ghdl.viewer_script.gui",
    "incisive.irun_sim_flags",
    "modelsim.init_file.gui",
    "modelsim.init_files.after_load",
    "modelsim.init_files.before_run",
    "modelsim.three_step_flow",
    "modelsim.vopt_flags",
    "modelsim.vsim_flags",
    "modelsim.vsim_flags.gui",
    "nvc.elab_flags",
    "nvc.global_flags",
    "nvc.heap_size",
    "nvc.sim_flags",
    "rivierapro.init_file.gui",
    "rivierapro.vsim_flags",
    "rivierapro.vsim_flags.gui",
];

/// A batch of files registered together with the same options.
#[derive(Debug, Serialize)]
struct SourceBatch {
    files: Vec<Utf8PathBuf>,
    #[serde(flatten)]
    options: SourceOptions,
}

#[derive(Debug, Serialize)]
struct Library {
    name: String,

    /// The location of a precompiled library.
    #[serde(skip_serializing_if = "Option::is_none")]
    external: Option<Utf8PathBuf>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<SourceBatch>,
}

impl Library {
    fn files(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.sources.iter().flat_map(|b| b.files.iter())
    }
}

/// The serialized form of a manifest.
#[derive(Serialize)]
struct ManifestData<'a> {
    simulator: &'a str,
    libraries: Vec<&'a Library>,
    compile_options: &'a BTreeMap<String, OptionValue>,
    sim_options: &'a BTreeMap<String, OptionValue>,
}

/// A [Project] that records every registration so that it can be replayed
/// against a VUnit object from a `run.py` script.
#[derive(Debug)]
pub struct Manifest {
    simulator: String,
    libraries: PrimaryMap<LibraryRef, Library>,
    compile_options: BTreeMap<String, OptionValue>,
    sim_options: BTreeMap<String, OptionValue>,
}

impl Manifest {
    pub fn new(simulator: impl Into<String>) -> Self {
        Self {
            simulator: simulator.into(),
            libraries: PrimaryMap::new(),
            compile_options: BTreeMap::new(),
            sim_options: BTreeMap::new(),
        }
    }

    /// Find a library by name.
    pub fn get_library(&self, name: &str) -> Option<LibraryRef> {
        self.libraries
            .iter()
            .find(|(_, lib)| lib.name == name)
            .map(|(r, _)| r)
    }

    /// The location of a precompiled library.
    pub fn external_path(&self, lib: LibraryRef) -> Option<&Utf8Path> {
        self.libraries
            .get(lib)
            .and_then(|l| l.external.as_deref())
    }

    pub fn compile_option(&self, key: &str) -> Option<&OptionValue> {
        self.compile_options.get(key)
    }

    pub fn sim_option(&self, key: &str) -> Option<&OptionValue> {
        self.sim_options.get(key)
    }

    fn library(&self, lib: LibraryRef) -> Result<&Library> {
        self.libraries
            .get(lib)
            .ok_or(ProjectError::UnknownLibrary(lib))
    }

    fn data(&self) -> ManifestData<'_> {
        ManifestData {
            simulator: &self.simulator,
            libraries: self.libraries.values().collect(),
            compile_options: &self.compile_options,
            sim_options: &self.sim_options,
        }
    }

    /// Render the manifest as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.data())
    }

    /// Write the manifest as JSON to `out`.
    pub fn write_json(&self, out: &mut impl Write) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.data())?;
        writeln!(out)?;
        Ok(())
    }
}

fn check_option(kind: OptionKind, key: &str) -> Result<()> {
    let known = match kind {
        OptionKind::Compile => COMPILE_OPTIONS,
        OptionKind::Sim => SIM_OPTIONS,
    };
    if known.contains(&key) {
        Ok(())
    } else {
        Err(ProjectError::UnknownOption {
            kind,
            key: key.to_string(),
        })
    }
}

/// Store `value` under `key`, extending an existing flag list unless
/// `overwrite` is set.
fn merge_option(
    options: &mut BTreeMap<String, OptionValue>,
    key: &str,
    value: OptionValue,
    overwrite: bool,
) {
    if !overwrite {
        if let (Some(OptionValue::Flags(old)), OptionValue::Flags(new)) =
            (options.get_mut(key), &value)
        {
            old.extend(new.iter().cloned());
            return;
        }
    }
    options.insert(key.to_string(), value);
}

impl Project for Manifest {
    fn simulator_name(&self) -> &str {
        &self.simulator
    }

    fn add_library(&mut self, name: &str) -> Result<LibraryRef> {
        if let Some(lib) = self.get_library(name) {
            if self.libraries[lib].external.is_some() {
                return Err(ProjectError::DuplicateLibrary(name.to_string()));
            }
            log::debug!("library {name} already exists");
            return Ok(lib);
        }
        log::debug!("adding library {name}");
        Ok(self.libraries.push(Library {
            name: name.to_string(),
            external: None,
            sources: vec![],
        }))
    }

    fn add_external_library(
        &mut self,
        name: &str,
        path: &Utf8Path,
    ) -> Result<LibraryRef> {
        if self.get_library(name).is_some() {
            return Err(ProjectError::DuplicateLibrary(name.to_string()));
        }
        log::debug!("adding library {name} from {path}");
        Ok(self.libraries.push(Library {
            name: name.to_string(),
            external: Some(path.to_path_buf()),
            sources: vec![],
        }))
    }

    fn libraries(&self) -> Vec<LibraryRef> {
        self.libraries.keys().collect()
    }

    fn library_name(&self, lib: LibraryRef) -> &str {
        &self.libraries[lib].name
    }

    fn is_external(&self, lib: LibraryRef) -> bool {
        self.libraries[lib].external.is_some()
    }

    fn add_compile_option(
        &mut self,
        key: &str,
        value: OptionValue,
    ) -> Result<()> {
        check_option(OptionKind::Compile, key)?;
        merge_option(&mut self.compile_options, key, value, false);
        Ok(())
    }

    fn set_sim_option(
        &mut self,
        key: &str,
        value: OptionValue,
        overwrite: bool,
    ) -> Result<()> {
        check_option(OptionKind::Sim, key)?;
        merge_option(&mut self.sim_options, key, value, overwrite);
        Ok(())
    }

    fn add_source_files(
        &mut self,
        lib: LibraryRef,
        files: &[Utf8PathBuf],
        options: &SourceOptions,
    ) -> Result<()> {
        let library = self.library(lib)?;
        if library.external.is_some() {
            return Err(ProjectError::ExternalLibrary(library.name.clone()));
        }
        if files.is_empty() && !options.allow_empty {
            return Err(ProjectError::NoFiles(library.name.clone()));
        }

        let mut fresh = vec![];
        for file in files {
            if library.files().any(|f| f == file) || fresh.contains(file) {
                log::debug!("{file} is already part of {}", library.name);
            } else {
                fresh.push(file.clone());
            }
        }
        if fresh.is_empty() {
            return Ok(());
        }

        self.libraries[lib].sources.push(SourceBatch {
            files: fresh,
            options: options.clone(),
        });
        Ok(())
    }

    fn source_files(
        &self,
        lib: LibraryRef,
        allow_empty: bool,
    ) -> Result<Vec<Utf8PathBuf>> {
        let library = self.library(lib)?;
        let files: Vec<_> = library.files().cloned().collect();
        if files.is_empty() && !allow_empty {
            return Err(ProjectError::NoFiles(library.name.clone()));
        }
        Ok(files)
    }
}
