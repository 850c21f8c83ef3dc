#![cfg(target_os = "android")]

use crate::common::error;
use crate::ui::{forward_wake, run_ui};
use crate::wake::WakeSignal;
use jni::objects::JClass;
use jni::JNIEnv;

#[no_mangle]
fn android_main(app: slint::android::AndroidApp) {
    if let Err(e) = slint::android::init(app) {
        return error(format!("Could not init slint: {e}"));
    }

    run_ui().unwrap_or_else(|e| error(format!("Could not run ui: {e}")));
}

/// Called by the messaging service when a push notification arrives
#[no_mangle]
pub extern "system" fn Java_app_zenith_installer_PushBridge_onPushReceived(
    _env: JNIEnv,
    _class: JClass,
) {
    forward_wake(WakeSignal::PushReceived);
}

/// Called when the user opens the app through a push notification
#[no_mangle]
pub extern "system" fn Java_app_zenith_installer_PushBridge_onPushTapped(
    _env: JNIEnv,
    _class: JClass,
) {
    forward_wake(WakeSignal::PushTapped);
}
