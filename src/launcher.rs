//! Hands a downloaded installer to the operating system

use anyhow::bail;
#[cfg(not(target_os = "android"))]
use anyhow::Context;
use std::path::Path;
#[cfg(not(target_os = "android"))]
use std::process::Command;

pub const APK_MIME_TYPE: &str = "application/vnd.android.package-archive";

pub trait Launcher: Send + Sync {
    fn launch(&self, artifact: &Path) -> anyhow::Result<()>;
}

/// Opens the system package installer through an `ACTION_VIEW` intent
#[cfg(target_os = "android")]
#[derive(Debug, Default)]
pub struct AndroidLauncher {}

#[cfg(target_os = "android")]
impl Launcher for AndroidLauncher {
    fn launch(&self, artifact: &Path) -> anyhow::Result<()> {
        if !artifact.is_file() {
            bail!("Installer {artifact:?} does not exist");
        }
        crate::common::android_util::AndroidUtil::create()?
            .open_package_archive(artifact, APK_MIME_TYPE)
    }
}

/// Sideloads the APK onto the device attached to `adb`
#[cfg(not(target_os = "android"))]
#[derive(Debug)]
pub struct AdbLauncher {
    program: String,
}

#[cfg(not(target_os = "android"))]
impl Default for AdbLauncher {
    fn default() -> Self {
        AdbLauncher { program: "adb".to_string() }
    }
}

#[cfg(not(target_os = "android"))]
impl AdbLauncher {
    pub fn with_program(program: impl Into<String>) -> Self {
        AdbLauncher { program: program.into() }
    }
}

#[cfg(not(target_os = "android"))]
impl Launcher for AdbLauncher {
    fn launch(&self, artifact: &Path) -> anyhow::Result<()> {
        if !artifact.is_file() {
            bail!("Installer {artifact:?} does not exist");
        }

        let output = Command::new(&self.program)
            .arg("install")
            .arg("-r")
            .arg(artifact)
            .output()
            .with_context(|| format!("Could not run {}", self.program))?;

        if !output.status.success() {
            bail!(
                "{} install failed ({}): {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// The launcher of the platform the binary runs on
pub fn platform_launcher() -> Box<dyn Launcher> {
    #[cfg(target_os = "android")]
    return Box::new(AndroidLauncher::default());
    #[cfg(not(target_os = "android"))]
    return Box::new(AdbLauncher::default());
}

#[cfg(all(test, unix, not(target_os = "android")))]
mod tests {
    use crate::launcher::{AdbLauncher, Launcher};
    use std::fs;

    #[test]
    fn test_adb_launcher_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = AdbLauncher::default().launch(&dir.path().join("nope.apk")).unwrap_err();
        assert!(err.to_string().contains("does not exist"), "unexpected error: {err}");
    }

    #[test]
    fn test_adb_launcher_program_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("zenith_app.apk");
        fs::write(&apk, b"apk").unwrap();
        assert!(AdbLauncher::with_program("true").launch(&apk).is_ok());
    }

    #[test]
    fn test_adb_launcher_program_fails() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("zenith_app.apk");
        fs::write(&apk, b"apk").unwrap();
        let err = AdbLauncher::with_program("false").launch(&apk).unwrap_err();
        assert!(err.to_string().starts_with("false install failed"), "unexpected error: {err}");
    }

    #[test]
    fn test_adb_launcher_program_missing() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("zenith_app.apk");
        fs::write(&apk, b"apk").unwrap();
        let err = AdbLauncher::with_program("no_such_adb_binary_xyz").launch(&apk).unwrap_err();
        assert!(err.to_string().contains("Could not run"), "unexpected error: {err}");
    }
}
