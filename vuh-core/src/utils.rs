use camino::{Utf8Path, Utf8PathBuf};
use pathdiff::diff_utf8_paths;

/// Make `path` absolute by joining it onto the current directory.
pub fn absolute(path: &Utf8Path) -> std::io::Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("current directory is not valid UTF-8: {}", p.display()),
        )
    })?;
    Ok(cwd.join(path))
}

/// Get a version of `path` that works when the working directory is `base`.
/// This is opportunistically a relative path, but we fall back to an absolute
/// path when no relative one exists.
pub fn relative_path(
    path: &Utf8Path,
    base: &Utf8Path,
) -> std::io::Result<Utf8PathBuf> {
    let path = absolute(path)?;
    let base = absolute(base)?;
    Ok(diff_utf8_paths(&path, &base).unwrap_or(path))
}
