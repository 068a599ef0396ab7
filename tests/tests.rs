use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use vuh::uvvm::{
    add_precompiled_uvvm_libraries, add_uvvm_sources, set_ghdl_flags_for_uvvm,
};
use vuh_core::config::{ProjectConfig, config_from_str};
use vuh_core::project::{OptionValue, ProjectError};
use vuh_core::{Manifest, Project};

const UVVM_FILES: &[&str] = &[
    "uvvm/uvvm_util/src/types_pkg.vhd",
    "uvvm/uvvm_util/src/uvvm_util_context.vhd",
    "uvvm/uvvm_vvc_framework/src/ti_vvc_framework_support_pkg.vhd",
    "uvvm/uvvm_vvc_framework/src_target_dependent/td_target_support_pkg.vhd",
    "uvvm/bitvis_vip_scoreboard/src/generic_sb_pkg.vhd",
    "uvvm/bitvis_vip_clock_generator/src/clock_generator_vvc.vhd",
];

fn scratch(files: &[&str]) -> (tempfile::TempDir, Utf8PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    for f in files {
        let path = root.join(f);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
    }
    (tmp, root)
}

fn libs(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// The files of library `name`, relative to `root`, one per line.
fn files_of(project: &Manifest, name: &str, root: &Utf8Path) -> String {
    let lib = project.get_library(name).unwrap();
    project
        .source_files(lib, true)
        .unwrap()
        .iter()
        .map(|f| f.strip_prefix(root).unwrap().to_string())
        .join("\n")
}

#[test]
fn uvvm_sources_with_target_dependent_files() {
    let (_tmp, root) = scratch(UVVM_FILES);
    let mut project = Manifest::new("ghdl");
    add_uvvm_sources(
        &mut project,
        &libs(&[
            "uvvm_util",
            "uvvm_vvc_framework",
            "bitvis_vip_scoreboard",
            "bitvis_vip_clock_generator",
        ]),
        &root.join("uvvm"),
    )
    .unwrap();

    assert_eq!(project.libraries().len(), 4);
    insta::assert_snapshot!(files_of(&project, "uvvm_util", &root), @r"
    uvvm/uvvm_util/src/types_pkg.vhd
    uvvm/uvvm_util/src/uvvm_util_context.vhd
    ");
    assert_eq!(
        files_of(&project, "uvvm_vvc_framework", &root),
        "uvvm/uvvm_vvc_framework/src/ti_vvc_framework_support_pkg.vhd"
    );
    assert_eq!(
        files_of(&project, "bitvis_vip_scoreboard", &root),
        "uvvm/bitvis_vip_scoreboard/src/generic_sb_pkg.vhd"
    );
    let clock_generator =
        files_of(&project, "bitvis_vip_clock_generator", &root);
    insta::assert_snapshot!(clock_generator, @r"
    uvvm/bitvis_vip_clock_generator/src/clock_generator_vvc.vhd
    uvvm/uvvm_vvc_framework/src_target_dependent/td_target_support_pkg.vhd
    ");
}

#[test]
fn uvvm_sources_need_library_sources() {
    // The target-dependent framework files alone don't make a library.
    let (_tmp, root) = scratch(&[
        "uvvm/uvvm_vvc_framework/src_target_dependent/td_target_support_pkg.vhd",
        "uvvm/bitvis_vip_clock_generator/doc/readme.txt",
    ]);
    let mut project = Manifest::new("ghdl");
    let err = add_uvvm_sources(
        &mut project,
        &libs(&["bitvis_vip_clock_generator"]),
        &root.join("uvvm"),
    )
    .unwrap_err();
    assert!(
        matches!(
            err,
            ProjectError::NoFiles(ref n) if n == "bitvis_vip_clock_generator"
        ),
        "{err}"
    );
}

#[test]
fn uvvm_root_with_glob_metacharacters() {
    let files: Vec<String> =
        UVVM_FILES.iter().map(|f| format!("deps[1]/{f}")).collect();
    let files: Vec<&str> = files.iter().map(String::as_str).collect();
    let (_tmp, root) = scratch(&files);
    let mut project = Manifest::new("ghdl");
    add_uvvm_sources(
        &mut project,
        &libs(&["uvvm_util", "bitvis_vip_clock_generator"]),
        &root.join("deps[1]/uvvm"),
    )
    .unwrap();
    let clock_generator =
        files_of(&project, "bitvis_vip_clock_generator", &root);
    insta::assert_snapshot!(clock_generator, @r"
    deps[1]/uvvm/bitvis_vip_clock_generator/src/clock_generator_vvc.vhd
    deps[1]/uvvm/uvvm_vvc_framework/src_target_dependent/td_target_support_pkg.vhd
    ");
}

#[test]
fn uvvm_sources_missing_library_fails() {
    // Only `uvvm_util` is checked out.
    let (_tmp, root) = scratch(&UVVM_FILES[..2]);
    let mut project = Manifest::new("ghdl");
    let err = add_uvvm_sources(
        &mut project,
        &libs(&["uvvm_util", "uvvm_vvc_framework"]),
        &root.join("uvvm"),
    )
    .unwrap_err();
    assert!(
        matches!(
            err,
            ProjectError::NoFiles(ref n) if n == "uvvm_vvc_framework"
        ),
        "{err}"
    );
}

#[test]
fn precompiled_uvvm_locations() {
    let root = Utf8Path::new("/repo/verification/uvvm");
    let used = libs(&["uvvm_util", "bitvis_vip_scoreboard"]);

    let mut modelsim = Manifest::new("modelsim");
    add_precompiled_uvvm_libraries(&mut modelsim, &used, root).unwrap();
    let lib = modelsim.get_library("uvvm_util").unwrap();
    assert!(modelsim.is_external(lib));
    assert_eq!(
        modelsim.external_path(lib).unwrap().as_str(),
        "/repo/verification/uvvm/uvvm_util/sim/uvvm_util"
    );

    let mut ghdl = Manifest::new("ghdl");
    add_precompiled_uvvm_libraries(&mut ghdl, &used, root).unwrap();
    let lib = ghdl.get_library("bitvis_vip_scoreboard").unwrap();
    assert_eq!(
        ghdl.external_path(lib).unwrap().as_str(),
        "/repo/verification/uvvm/bitvis_vip_scoreboard/v08"
    );
}

#[test]
fn precompiled_uvvm_unsupported_simulator_does_nothing() {
    let mut project = Manifest::new("rivierapro");
    add_precompiled_uvvm_libraries(
        &mut project,
        &libs(&["uvvm_util"]),
        Utf8Path::new("/uvvm"),
    )
    .unwrap();
    assert!(project.libraries().is_empty());
}

#[test]
fn ghdl_flags_for_uvvm() {
    let mut project = Manifest::new("ghdl");
    set_ghdl_flags_for_uvvm(&mut project).unwrap();

    let Some(OptionValue::Flags(a_flags)) =
        project.compile_option("ghdl.a_flags")
    else {
        panic!("ghdl.a_flags is not a flag list");
    };
    assert!(a_flags.contains(&"--std=08".to_string()));
    assert!(a_flags.contains(&"-frelaxed-rules".to_string()));
    assert_eq!(a_flags.len(), 9);
    assert_eq!(
        project.sim_option("ghdl.elab_flags"),
        project.compile_option("ghdl.a_flags")
    );
    assert_eq!(
        project.sim_option("ghdl.elab_e"),
        Some(&OptionValue::Bool(true))
    );

    // Setting the flags twice doesn't duplicate the elaboration flags.
    set_ghdl_flags_for_uvvm(&mut project).unwrap();
    let Some(OptionValue::Flags(elab)) = project.sim_option("ghdl.elab_flags")
    else {
        panic!("ghdl.elab_flags is not a flag list");
    };
    assert_eq!(elab.len(), 9);
}

const PROJECT: &str = r#"
[uvvm]
root = "uvvm"
libraries = ["uvvm_util"]

[[library]]
name = "design"
include = ["src/**/*.vhd"]
exclude = [{ pattern = "src/sim/*.vhd", when_simulator_is_not = "modelsim" }]
vhdl_standard = "2008"

[[library]]
name = "tb"
include = [
    "tb/tb_*.vhd",
    { pattern = "tb/ghdl/*.vhd", when_simulator_is = "ghdl" },
]

[compile_options]
"modelsim.vcom_flags" = ["-2008"]
"#;

const PROJECT_FILES: &[&str] = &[
    "src/top.vhd",
    "src/sim/model.vhd",
    "tb/tb_top.vhd",
    "tb/ghdl/workaround.vhd",
];

fn build(simulator: &str) -> (tempfile::TempDir, Utf8PathBuf, Manifest) {
    let files: Vec<&str> =
        PROJECT_FILES.iter().chain(UVVM_FILES).copied().collect();
    let (tmp, root) = scratch(&files);
    let config: ProjectConfig = config_from_str(PROJECT).extract().unwrap();
    let mut project = Manifest::new(simulator);
    vuh::build_project(&mut project, &config, &root).unwrap();
    (tmp, root, project)
}

#[test]
fn build_project_for_ghdl() {
    let (_tmp, root, project) = build("ghdl");
    let names = project
        .libraries()
        .into_iter()
        .map(|l| project.library_name(l))
        .collect::<Vec<_>>();
    assert_eq!(names, ["uvvm_util", "design", "tb"]);

    assert_eq!(files_of(&project, "design", &root), "src/top.vhd");
    insta::assert_snapshot!(files_of(&project, "tb", &root), @r"
    tb/tb_top.vhd
    tb/ghdl/workaround.vhd
    ");
    assert!(project.compile_option("ghdl.a_flags").is_some());
    assert_eq!(
        project.compile_option("modelsim.vcom_flags"),
        Some(&OptionValue::flags(["-2008"]))
    );
}

#[test]
fn build_project_for_modelsim() {
    let (_tmp, root, project) = build("modelsim");
    let mut design = files_of(&project, "design", &root)
        .lines()
        .map(String::from)
        .collect::<Vec<_>>();
    design.sort();
    assert_eq!(design, ["src/sim/model.vhd", "src/top.vhd"]);
    assert_eq!(files_of(&project, "tb", &root), "tb/tb_top.vhd");
    assert!(project.compile_option("ghdl.a_flags").is_none());
}

#[test]
fn build_project_under_bracketed_root() {
    let files: Vec<String> =
        PROJECT_FILES.iter().map(|f| format!("proj[v2]/{f}")).collect();
    let files: Vec<&str> = files.iter().map(String::as_str).collect();
    let (_tmp, tmp_root) = scratch(&files);
    let root = tmp_root.join("proj[v2]");
    let config: ProjectConfig = config_from_str(
        r#"
        [[library]]
        name = "design"
        include = ["src/**/*.vhd"]
        exclude = ["src/sim/*.vhd"]
        "#,
    )
    .extract()
    .unwrap();
    let mut project = Manifest::new("ghdl");
    vuh::build_project(&mut project, &config, &root).unwrap();
    assert_eq!(files_of(&project, "design", &root), "src/top.vhd");
}

#[test]
fn build_project_reports_library_name() {
    let (_tmp, root) = scratch(&[]);
    let config: ProjectConfig = config_from_str(
        r#"
        [[library]]
        name = "empty"
        include = ["nothing/*.vhd"]
        "#,
    )
    .extract()
    .unwrap();
    let mut project = Manifest::new("ghdl");
    let err = vuh::build_project(&mut project, &config, &root).unwrap_err();
    assert_eq!(err.to_string(), "failed to add sources to library empty");
}
