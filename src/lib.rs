//! Checks the latest GitHub release of the Zenith app against the locally recorded version and
//! installs its APK

/// logging, paths and android helpers
pub mod common;
/// repository coordinates, credential and CLI arguments
pub mod config;
/// failures surfaced to the screen and the CLI
pub mod error;
/// hands the downloaded APK to the operating system
pub mod launcher;
/// release metadata and the GitHub client
pub mod release;
#[cfg(test)]
mod test_util;
/// the installer screen
pub mod ui;
/// check and install coordination
pub mod updater;
/// the persisted installed version
pub mod version_store;
/// push and periodic wake triggers
pub mod wake;
