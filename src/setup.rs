use crate::uvvm;
use anyhow::Context;
use camino::Utf8Path;
use vuh_core::config::ProjectConfig;
use vuh_core::{FilePattern, Project, add_source_files, glob_in};

/// Resolve a pattern against the project root. Absolute patterns are kept.
pub(crate) fn rooted(root: &Utf8Path, pattern: &FilePattern) -> FilePattern {
    FilePattern {
        pattern: glob_in(root, &pattern.pattern),
        restriction: pattern.restriction.clone(),
    }
}

/// Set up UVVM, the configured libraries and the extra options of `config`
/// on `project`. Relative paths are resolved against `root`.
pub fn build_project<P: Project + ?Sized>(
    project: &mut P,
    config: &ProjectConfig,
    root: &Utf8Path,
) -> anyhow::Result<()> {
    if let Some(uvvm_config) = &config.uvvm {
        let uvvm_root = root.join(&uvvm_config.root);
        if uvvm_config.precompiled {
            uvvm::add_precompiled_uvvm_libraries(
                project,
                &uvvm_config.libraries,
                &uvvm_root,
            )?;
        } else {
            uvvm::add_uvvm_sources(project, &uvvm_config.libraries, &uvvm_root)
                .context("failed to add UVVM sources")?;
        }
        if uvvm_config.ghdl_flags && project.simulator_name() == "ghdl" {
            uvvm::set_ghdl_flags_for_uvvm(project)?;
        }
    }

    for lib_config in &config.libraries {
        let lib = project.add_library(&lib_config.name)?;
        let include: Vec<_> =
            lib_config.include.iter().map(|p| rooted(root, p)).collect();
        let exclude: Vec<_> =
            lib_config.exclude.iter().map(|p| rooted(root, p)).collect();
        let mut options = lib_config.options.clone();
        options.include_dirs =
            options.include_dirs.iter().map(|d| root.join(d)).collect();
        add_source_files(project, lib, &include, &exclude, &options)
            .with_context(|| {
                format!("failed to add sources to library {}", lib_config.name)
            })?;
    }

    for (key, value) in &config.compile_options {
        project.add_compile_option(key, value.clone())?;
    }
    for (key, value) in &config.sim_options {
        project.set_sim_option(key, value.clone(), true)?;
    }
    Ok(())
}
