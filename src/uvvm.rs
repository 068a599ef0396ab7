//! Presets for the UVVM verification libraries.

use camino::{Utf8Path, Utf8PathBuf};
use vuh_core::project::{OptionValue, Result};
use vuh_core::{
    FilePattern, Project, SourceOptions, add_source_files, glob_in,
};

/// UVVM libraries that don't depend on the target-dependent VVC framework
/// sources.
const FRAMEWORK_LIBRARIES: &[&str] =
    &["uvvm_vvc_framework", "uvvm_util", "bitvis_vip_scoreboard"];

/// Flags UVVM needs for both analysis and elaboration with GHDL.
const GHDL_FLAGS: &[&str] = &[
    "-Wno-hide",
    "-fexplicit",
    "-Wbinding",
    "-Wno-shared",
    "--ieee=synopsys",
    "--no-vital-checks",
    "--std=08",
    "-frelaxed",
    "-frelaxed-rules",
];

/// Add UVVM libraries to the project as sources, so the project works out the
/// compile order and no precompilation of UVVM is needed.
///
/// `uvvm_root` is the UVVM checkout, e.g. `<repo>/verification/uvvm`.
pub fn add_uvvm_sources<P: Project + ?Sized>(
    project: &mut P,
    used_libraries: &[String],
    uvvm_root: &Utf8Path,
) -> Result<()> {
    let options = SourceOptions::default();
    for libname in used_libraries {
        let lib = project.add_library(libname)?;
        let sources =
            FilePattern::new(glob_in(&uvvm_root.join(libname), "src/*.vhd"));
        add_source_files(project, lib, &[sources], &[], &options)?;
        if !FRAMEWORK_LIBRARIES.contains(&libname.as_str()) {
            let target_dependent = FilePattern::new(glob_in(
                uvvm_root,
                "uvvm_vvc_framework/src_target_dependent/*.vhd",
            ));
            add_source_files(project, lib, &[target_dependent], &[], &options)?;
        }
    }
    Ok(())
}

/// Add precompiled UVVM libraries to the project.
///
/// With ModelSim, compile UVVM with `script/compile_all.do` from the UVVM
/// checkout. With GHDL, use the `compile-uvvm` vendor script shipped with
/// GHDL. Other simulators are not supported; an error is logged and nothing
/// is added.
pub fn add_precompiled_uvvm_libraries<P: Project + ?Sized>(
    project: &mut P,
    used_libraries: &[String],
    uvvm_root: &Utf8Path,
) -> Result<()> {
    let simulator = project.simulator_name().to_string();
    log::debug!("Active simulator={simulator}");

    let location: fn(&Utf8Path, &str) -> Utf8PathBuf = match simulator.as_str()
    {
        "modelsim" => |root, lib| root.join(lib).join("sim").join(lib),
        "ghdl" => |root, lib| root.join(lib).join("v08"),
        _ => {
            log::error!(
                "Adding precompiled UVVM libraries for simulator {simulator} is not supported. You can use add_uvvm_sources() instead"
            );
            return Ok(());
        }
    };

    for libname in used_libraries {
        let location = location(uvvm_root, libname);
        project.add_external_library(libname, &location)?;
        log::debug!("adding library {libname} from {location}");
    }
    Ok(())
}

/// Set the GHDL analysis and elaboration flags needed to compile UVVM.
pub fn set_ghdl_flags_for_uvvm<P: Project + ?Sized>(
    project: &mut P,
) -> Result<()> {
    project.add_compile_option(
        "ghdl.a_flags",
        OptionValue::flags(GHDL_FLAGS.iter().copied()),
    )?;
    project.set_sim_option(
        "ghdl.elab_flags",
        OptionValue::flags(GHDL_FLAGS.iter().copied()),
        true,
    )?;
    project.set_sim_option("ghdl.elab_e", true.into(), true)?;
    log::debug!("GHDL flags for UVVM were set");
    Ok(())
}
