use crate::setup::{build_project, rooted};
use anyhow::{Context, anyhow, bail};
use argh::FromArgs;
use camino::{Utf8Path, Utf8PathBuf};
use figment::{Figment, providers::Serialized};
use itertools::Itertools;
use vuh_core::config::{self, GlobalConfig, ProjectConfig};
use vuh_core::utils::absolute;
use vuh_core::{Manifest, Project, git, select, vhdl_ls};

/// print the files selected for a library
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "files")]
pub struct FilesCommand {
    /// the library to show
    #[argh(positional)]
    library: String,
}

/// write the project manifest as JSON
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "emit")]
pub struct EmitCommand {
    /// destination for the manifest (default: configured path or stdout)
    #[argh(option, short = 'o')]
    output: Option<Utf8PathBuf>,
}

/// write the vhdl_ls configuration
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "vhdl-ls")]
pub struct VhdlLsCommand {
    /// destination for the configuration (default: configured path)
    #[argh(option, short = 'o')]
    output: Option<Utf8PathBuf>,
}

/// print the root of the enclosing git repository
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "root")]
pub struct RootCommand {}

/// supported subcommands
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum Subcommand {
    Files(FilesCommand),
    Emit(EmitCommand),
    VhdlLs(VhdlLsCommand),
    Root(RootCommand),
}

#[derive(FromArgs)]
/// Configure the sources of a VUnit project.
pub struct VuhArgs {
    #[argh(subcommand)]
    pub sub: Option<Subcommand>,

    /// the project description (default: vuh.toml)
    #[argh(option, short = 'c')]
    config: Option<Utf8PathBuf>,

    /// the simulator to configure the project for
    #[argh(option)]
    simulator: Option<String>,

    /// set a configuration variable (key=value)
    #[argh(option, short = 's')]
    set: Vec<String>,

    /// verbose output
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// log level for debugging
    #[argh(option, long = "log", default = "log::LevelFilter::Warn")]
    pub log_level: log::LevelFilter,
}

/// A loaded project description.
pub struct Loaded {
    pub global: GlobalConfig,
    pub project: ProjectConfig,

    /// The project description that was read.
    pub path: Utf8PathBuf,

    /// The directory holding the project description.
    pub config_dir: Utf8PathBuf,
}

/// Layer the overrides on top of the configuration read from the project
/// description: `env` (the value of `VUNIT_SIMULATOR`), then every `--set`
/// in order, then `--simulator`.
fn layered_config(
    file: Figment,
    env: Option<String>,
    set: &[String],
    simulator: Option<&str>,
) -> anyhow::Result<Figment> {
    let mut figment = config::with_simulator_env(file, env);

    // Use `--set` arguments to override configuration values.
    for assignment in set {
        let (key, value) = assignment
            .split_once('=')
            .ok_or(anyhow!("--set arguments must be in key=value form"))?;
        let dict = figment::util::nest(key, value.into());
        figment = figment.merge(Serialized::defaults(dict));
    }
    if let Some(sim) = simulator {
        figment = figment.merge(Serialized::default("simulator", sim));
    }
    Ok(figment)
}

/// Load the project description named by the arguments, applying the
/// environment, `--set` and `--simulator` overrides.
pub fn config_from_cli(args: &VuhArgs) -> anyhow::Result<Loaded> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| config::DEFAULT_CONFIG.into());
    if !path.exists() {
        bail!("project description {path} not found");
    }
    let figment = layered_config(
        config::load_config(&path),
        std::env::var(config::SIMULATOR_ENV).ok(),
        &args.set,
        args.simulator.as_deref(),
    )?;

    let global: GlobalConfig = figment
        .extract()
        .with_context(|| format!("invalid configuration in {path}"))?;
    let project: ProjectConfig = figment
        .extract()
        .with_context(|| format!("invalid project description in {path}"))?;
    let config_dir = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => absolute(dir)?,
        _ => absolute(Utf8Path::new("."))?,
    };
    Ok(Loaded {
        global,
        project,
        path,
        config_dir,
    })
}

fn show_root() -> anyhow::Result<()> {
    match git::repo_root(None)? {
        Some(root) => {
            println!("{root}");
            Ok(())
        }
        None => bail!("not inside a git repository"),
    }
}

fn show_files(loaded: &Loaded, cmd: FilesCommand) -> anyhow::Result<()> {
    let lib = loaded
        .project
        .libraries
        .iter()
        .find(|l| l.name == cmd.library)
        .ok_or_else(|| anyhow!("unknown library {}", cmd.library))?;
    let root = loaded.project.root_dir(&loaded.config_dir)?;
    let include: Vec<_> =
        lib.include.iter().map(|p| rooted(&root, p)).collect();
    let exclude: Vec<_> =
        lib.exclude.iter().map(|p| rooted(&root, p)).collect();
    let selection = select(&include, &exclude, &loaded.global.simulator)?;
    for file in &selection.files {
        println!("{}", file.strip_prefix(&root).unwrap_or(file.as_path()));
    }
    Ok(())
}

fn emit_manifest(
    manifest: &Manifest,
    output: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {path}"))?;
            manifest.write_json(&mut file)?;
            log::info!("manifest was written to {path}");
        }
        None => manifest.write_json(&mut std::io::stdout().lock())?,
    }
    Ok(())
}

fn init_logging(verbose: bool, level: log::LevelFilter) {
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(if verbose { log::LevelFilter::Debug } else { level })
        .target(env_logger::Target::Stderr)
        .init();
}

/// Configure a [Manifest] from the loaded project description.
fn build_manifest(loaded: &Loaded) -> anyhow::Result<Manifest> {
    let root = loaded.project.root_dir(&loaded.config_dir)?;
    log::debug!("project root: {root}");
    let mut manifest = Manifest::new(&loaded.global.simulator);
    build_project(&mut manifest, &loaded.project, &root)?;
    Ok(manifest)
}

/// Run the command line interface.
pub fn cli() -> anyhow::Result<()> {
    let args: VuhArgs = argh::from_env();
    if let Some(Subcommand::Root(_)) = &args.sub {
        init_logging(args.verbose, args.log_level);
        return show_root();
    }

    let loaded = config_from_cli(&args)?;
    init_logging(args.verbose || loaded.global.verbose, args.log_level);
    log::info!("loaded config from {}", loaded.path);

    let configured = |path: &Option<Utf8PathBuf>| {
        path.as_ref().map(|p| loaded.config_dir.join(p))
    };
    match args.sub {
        Some(Subcommand::Root(_)) => show_root(),
        Some(Subcommand::Files(cmd)) => show_files(&loaded, cmd),
        Some(Subcommand::Emit(cmd)) => {
            let manifest = build_manifest(&loaded)?;
            let output =
                cmd.output.or_else(|| configured(&loaded.project.manifest));
            emit_manifest(&manifest, output.as_deref())
        }
        Some(Subcommand::VhdlLs(cmd)) => {
            let output = cmd
                .output
                .or_else(|| configured(&loaded.project.vhdl_ls))
                .ok_or(anyhow!(
                    "no vhdl_ls output configured. Use -o or set `vhdl_ls`"
                ))?;
            let manifest = build_manifest(&loaded)?;
            vhdl_ls::write_vhdl_ls_toml(&manifest, &output)
        }
        None => {
            let manifest = build_manifest(&loaded)?;
            let output = configured(&loaded.project.manifest);
            emit_manifest(&manifest, output.as_deref())?;
            if let Some(output) = configured(&loaded.project.vhdl_ls) {
                vhdl_ls::write_vhdl_ls_toml(&manifest, &output)?;
            }
            let libraries = manifest
                .libraries()
                .into_iter()
                .map(|l| manifest.library_name(l))
                .join(", ");
            log::info!("configured libraries: {libraries}");
            Ok(())
        }
    }
}
