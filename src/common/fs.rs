use crate::common::logging::error;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::{env, fs};

#[cfg(target_os = "android")]
use crate::common::android_util::AndroidUtil;

pub(crate) const DATA_DIR_NAME: &str = "zenith-installer";

/// Directory holding the version record and the downloaded installer.
///
/// On linux this is `$HOME/.config/zenith-installer` (or the current directory without `HOME`),
/// on android the app private files directory.
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    #[cfg(not(target_os = "android"))]
    return Ok(get_data_dir_desktop());
    #[cfg(target_os = "android")]
    return AndroidUtil::create()?.get_conf_dir();
}

#[cfg(not(target_os = "android"))]
fn get_data_dir_desktop() -> PathBuf {
    match (env::var("HOME"), env::current_dir()) {
        (Ok(home_dir), _) => PathBuf::from(home_dir).join(".config").join(DATA_DIR_NAME),
        (_, Ok(current_dir)) => current_dir,
        (_, _) => PathBuf::from("."),
    }
}

pub(crate) fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let mut full_path = match env::current_dir() {
        Ok(p) => p,
        Err(e) => {
            error(format!("Could not get current directory: {e}"));
            return path.to_path_buf();
        }
    };
    full_path.push(path);
    match fs::canonicalize(&full_path) {
        Ok(p) => p,
        Err(e) => {
            error(format!("Could not canonicalize {:?}: {e}", &full_path));
            full_path
        }
    }
}

pub(crate) fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Could not create directory {path:?}"))
}

#[cfg(unix)]
pub(crate) fn set_permissions(path: &Path, permissions_mode: u32) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = fs::metadata(path).with_context(|| format!("Could not get {path:?} meta data"))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions_mode);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Could not set file permissions for {path:?}"))
}

#[cfg(not(unix))]
pub(crate) fn set_permissions(_path: &Path, _permissions_mode: u32) -> anyhow::Result<()> {
    Ok(())
}
