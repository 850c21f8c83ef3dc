use crate::common::{error, info};
use crate::error::UpdateError;
use crate::ui::view_model::ScreenView;
use crate::updater::{Phase, SubscriptionId, UpdateEvent, Updater};
use slint::{ComponentHandle, SharedString};
use std::sync::{Arc, Weak};
use std::thread;

slint::include_modules!();

pub struct RustSlintBridge {
    app: App,
    updater: Arc<Updater>,
}

impl RustSlintBridge {
    pub fn create(updater: Arc<Updater>) -> Result<Self, slint::PlatformError> {
        let app = App::new()?;
        apply_view(&app, &ScreenView::from_snapshot(&updater.snapshot()));
        Ok(RustSlintBridge { app, updater })
    }

    /// Shows the configuration problem; nothing else is wired up.
    pub fn show_configuration_error(err: &UpdateError) -> Result<(), slint::PlatformError> {
        let app = App::new()?;
        apply_view(&app, &ScreenView::configuration_error(err));
        app.global::<SlintRustBridge>().set_alert(SharedString::from(err.to_string()));
        app.run()
    }

    pub fn run(&self) -> Result<(), slint::PlatformError> {
        self.app.run()
    }

    /// Re-renders the screen after every updater event. Install failures are also shown as an
    /// alert until the next operation starts.
    pub fn add_view_listener(&self) -> SubscriptionId {
        let app_weak = self.app.as_weak();
        let updater: Weak<Updater> = Arc::downgrade(&self.updater);

        self.updater.subscribe(move |event| {
            let Some(updater) = updater.upgrade() else {
                return;
            };
            let view = ScreenView::from_snapshot(&updater.snapshot());
            let alert = match event {
                UpdateEvent::Failed(UpdateError::Busy(_)) => None,
                UpdateEvent::Failed(err) => Some(err.to_string()),
                UpdateEvent::PhaseChanged(Phase::Checking | Phase::Downloading) => {
                    Some(String::new())
                }
                _ => None,
            };

            let result = app_weak.upgrade_in_event_loop(move |app| {
                apply_view(&app, &view);
                if let Some(alert) = alert {
                    app.global::<SlintRustBridge>().set_alert(SharedString::from(alert));
                }
            });
            if let Err(e) = result {
                error(format!("Could not update screen: {e}"));
            }
        })
    }

    pub fn add_on_check_updates(&self) {
        let updater = Arc::clone(&self.updater);
        self.app.global::<SlintRustBridge>().on_check_updates(move || {
            info("Checking for updates");
            spawn_check(Arc::clone(&updater));
        });
    }

    pub fn add_on_install(&self) {
        let updater = Arc::clone(&self.updater);
        self.app.global::<SlintRustBridge>().on_install(move || {
            info("Installing latest release");
            let updater = Arc::clone(&updater);
            thread::spawn(move || {
                if let Err(e) = updater.install_latest() {
                    error(format!("Error when installing application: {e}"));
                }
            });
        });
    }

    pub fn check_on_start(&self) {
        spawn_check(Arc::clone(&self.updater));
    }
}

fn spawn_check(updater: Arc<Updater>) {
    thread::spawn(move || {
        if let Err(e) = updater.check() {
            info(format!("Check not started: {e}"));
        }
    });
}

fn apply_view(app: &App, view: &ScreenView) {
    let bridge = app.global::<SlintRustBridge>();
    bridge.set_stored_version(SharedString::from(view.stored_version.as_str()));
    bridge.set_latest_version(SharedString::from(view.latest_version.as_str()));
    bridge.set_status(SharedString::from(view.status.as_str()));
    bridge.set_checking(view.checking);
    bridge.set_downloading(view.downloading);
    bridge.set_progress(i32::from(view.progress));
    bridge.set_primary_visible(view.primary_action.is_some());
    bridge.set_primary_label(SharedString::from(view.primary_label().unwrap_or_default()));
    bridge.set_recheck_enabled(view.recheck_enabled);
}
