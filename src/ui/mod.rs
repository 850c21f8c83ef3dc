/// contains the entry points of the android apk
#[cfg(target_os = "android")]
pub mod android;

/// used to import everything that is slint related
pub mod rust_slint_bridge;

/// screen state derived from the updater, independent of slint
pub mod view_model;

use crate::common::fs::get_data_dir;
use crate::common::{error, info};
use crate::config::Config;
use crate::ui::rust_slint_bridge::RustSlintBridge;
use crate::updater::Updater;
use crate::wake::{WakeSender, WakeSession, WakeSignal};
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

static ACTIVE_WAKE: Mutex<Option<WakeSender>> = Mutex::new(None);

pub fn run_ui() -> Result<(), Box<dyn Error>> {
    let config = match Config::from_env(get_data_dir()?) {
        Ok(config) => config,
        Err(e) => {
            error(format!("Could not load configuration: {e}"));
            RustSlintBridge::show_configuration_error(&e)?;
            return Ok(());
        }
    };
    info(format!("Starting installer with {config:?}"));

    let updater = Arc::new(Updater::from_config(&config)?);
    let bridge = RustSlintBridge::create(Arc::clone(&updater))?;
    let subscription = bridge.add_view_listener();
    bridge.add_on_check_updates();
    bridge.add_on_install();

    let wake = WakeSession::start(Arc::clone(&updater), config.wake_interval, |signal, result| {
        info(format!("{signal:?} wake finished with {result:?}"))
    })?;
    *ACTIVE_WAKE.lock().unwrap_or_else(PoisonError::into_inner) = Some(wake.sender());

    bridge.check_on_start();
    let result = bridge.run();

    *ACTIVE_WAKE.lock().unwrap_or_else(PoisonError::into_inner) = None;
    wake.stop();
    updater.unsubscribe(subscription);
    Ok(result?)
}

/// Hands a push notification event to the running screen session.
///
/// Returns `false` if no session is running.
pub fn forward_wake(signal: WakeSignal) -> bool {
    match ACTIVE_WAKE.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
        Some(sender) => sender.wake(signal),
        None => {
            info(format!("Ignoring {signal:?}, no session running"));
            false
        }
    }
}
