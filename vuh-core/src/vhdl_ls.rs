//! Configuration for the `vhdl_ls` language server.
//!
//! The language server reads a `vhdl_ls.toml` that maps every library to its
//! source files:
//!
//! ```toml
//! [libraries.design]
//! files = ["../src/top.vhd"]
//! ```
//!
//! Precompiled libraries can't be read by the language server, so they are
//! left out.

use crate::project::Project;
use crate::utils::relative_path;
use anyhow::Context;
use camino::Utf8Path;
use toml_edit::{Array, DocumentMut, Item, Table, value};

/// Build the `vhdl_ls.toml` document for `project`. File paths are made
/// relative to `base`, the directory the document will be written to.
pub fn vhdl_ls_document<P: Project + ?Sized>(
    project: &P,
    base: &Utf8Path,
) -> anyhow::Result<DocumentMut> {
    let mut libraries = Table::new();
    libraries.set_implicit(true);

    for lib in project.libraries() {
        let name = project.library_name(lib);
        if project.is_external(lib) {
            log::debug!("skipping precompiled library {name}");
            continue;
        }
        let files = project
            .source_files(lib, true)?
            .iter()
            .map(|f| relative_path(f, base).map(|p| p.to_string()))
            .collect::<std::io::Result<Array>>()
            .with_context(|| format!("failed to resolve files of {name}"))?;

        let mut table = Table::new();
        table.insert("files", value(files));
        libraries.insert(name, Item::Table(table));
    }

    let mut doc = DocumentMut::new();
    doc.insert("libraries", Item::Table(libraries));
    Ok(doc)
}

/// Write the `vhdl_ls.toml` for `project` to `output`.
///
/// Call this after all sources have been added to the project.
pub fn write_vhdl_ls_toml<P: Project + ?Sized>(
    project: &P,
    output: &Utf8Path,
) -> anyhow::Result<()> {
    let base = match output.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let doc = vhdl_ls_document(project, base)?;
    std::fs::write(output, doc.to_string())
        .with_context(|| format!("failed to write {output}"))?;
    log::debug!("vhdl_ls configuration was written to {output}");
    Ok(())
}
