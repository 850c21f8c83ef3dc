//! Functionality shared by the updater core, the CLI and the UI

#[cfg(target_os = "android")]
pub mod android_util;
pub mod fs;
pub mod logging;

pub use logging::{error, info};
