use clap::Parser;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use zenith_installer::common::{error, info};
use zenith_installer::config::{CliInstaller, CommandsInstaller};
use zenith_installer::error::UpdateError;
use zenith_installer::updater::reconcile::{CheckReport, ReconciliationState};
use zenith_installer::updater::{UpdateEvent, Updater};
use zenith_installer::wake::WakeSession;

fn main() -> Result<(), String> {
    let cli = CliInstaller::parse();
    let config = cli.config().map_err(|e| e.to_string())?;
    let updater = Arc::new(Updater::from_config(&config).map_err(|e| format!("{e:#}"))?);

    match cli.command {
        CommandsInstaller::Check(_) => check(&updater).map(|_| ()),
        CommandsInstaller::Install(install_command) => install(&updater, install_command.force),
        CommandsInstaller::Watch(watch_command) => {
            watch(updater, Duration::from_secs(watch_command.interval))
        }
    }
}

fn check(updater: &Updater) -> Result<CheckReport, String> {
    let report = updater.check().map_err(|e| e.to_string())?;
    let stored = report.stored.as_ref().map_or("none".to_string(), |t| t.to_string());
    let latest = report.latest_tag().map_or("unknown".to_string(), |t| t.to_string());
    info(format!("registered version: {stored}, latest version: {latest}"));

    match report.failure {
        Some(UpdateError::FetchFailed(reason)) => Err(format!("Could not reach GitHub: {reason}")),
        Some(_) => Err(report.message),
        None => {
            info(&report.message);
            Ok(report)
        }
    }
}

fn install(updater: &Updater, force: bool) -> Result<(), String> {
    let report = check(updater)?;
    if report.state == ReconciliationState::UpToDate && !force {
        info("Already using the latest version, use --force to reinstall");
        return Ok(());
    }

    let subscription = updater.subscribe(|event| match event {
        UpdateEvent::Progress(percent) => info(format!("downloading... {percent}%")),
        UpdateEvent::Failed(e) => error(e),
        _ => {}
    });
    let result = updater.install_latest();
    updater.unsubscribe(subscription);

    let path = result.map_err(|e| e.to_string())?;
    info(format!("installer {path:?} opened"));
    Ok(())
}

fn watch(updater: Arc<Updater>, interval: Duration) -> Result<(), String> {
    let _session = WakeSession::start(Arc::clone(&updater), interval, |signal, result| {
        info(format!("{signal:?} check finished with {result:?}"))
    })
    .map_err(|e| format!("{e:#}"))?;

    info(format!("initial check finished with {:?}", updater.background_check()));
    loop {
        thread::park();
    }
}
