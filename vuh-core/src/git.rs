use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::process::{Command, Stdio};

/// Get the root of the git repository containing `dir`, or the current
/// directory when `dir` is `None`.
///
/// Returns `Ok(None)` when the directory is not inside a git repository. An
/// error means `git` itself could not be run. The `git` calls block without a
/// timeout.
pub fn repo_root(
    dir: Option<&Utf8Path>,
) -> anyhow::Result<Option<Utf8PathBuf>> {
    let git = |args: &[&str]| {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd
    };

    let status = git(&["branch"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("failed to execute git")?;
    if !status.success() {
        log::warn!("This is not a git repository!");
        return Ok(None);
    }

    let output = git(&["rev-parse", "--show-toplevel"])
        .stderr(Stdio::inherit())
        .output()
        .context("failed to execute git")?;
    if !output.status.success() {
        bail!("git rev-parse exited with {}", output.status);
    }
    let root = String::from_utf8(output.stdout)
        .context("git repository path is not valid UTF-8")?;
    let root = Utf8PathBuf::from(root.trim_end());
    log::debug!("git repo path: {root}");
    Ok(Some(root))
}
