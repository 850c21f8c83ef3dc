//! Wake triggers: push notifications and the periodic background check.
//!
//! A `WakeSession` is owned by whoever owns the screen session. It is started with the session,
//! and stopping (or dropping) it unsubscribes from all wake sources.

use crate::common::{error, info};
use crate::config::MIN_WAKE_INTERVAL;
use crate::updater::{BackgroundFetchResult, Updater};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeSignal {
    /// a push notification arrived while the app is open
    PushReceived,
    /// the user tapped a push notification
    PushTapped,
    Periodic,
}

enum Message {
    Wake(WakeSignal),
    Stop,
}

/// Forwards external wake events into a running `WakeSession`
#[derive(Clone)]
pub struct WakeSender {
    tx: Sender<Message>,
}

impl WakeSender {
    /// Returns `false` once the session is gone.
    pub fn wake(&self, signal: WakeSignal) -> bool {
        self.tx.send(Message::Wake(signal)).is_ok()
    }
}

pub struct WakeSession {
    tx: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl WakeSession {
    /// `interval` is raised to the 15 minute minimum.
    pub fn start<F>(updater: Arc<Updater>, interval: Duration, on_result: F) -> anyhow::Result<Self>
    where
        F: Fn(WakeSignal, BackgroundFetchResult) + Send + 'static,
    {
        Self::start_unclamped(updater, interval.max(MIN_WAKE_INTERVAL), on_result)
    }

    pub(crate) fn start_unclamped<F>(
        updater: Arc<Updater>,
        interval: Duration,
        on_result: F,
    ) -> anyhow::Result<Self>
    where
        F: Fn(WakeSignal, BackgroundFetchResult) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Message>();
        info(format!("starting wake session, periodic check every {}s", interval.as_secs()));

        let worker = thread::Builder::new().name("wake".to_string()).spawn(move || {
            // pushes do not move the periodic deadline
            let mut next_tick = Instant::now() + interval;
            loop {
                let timeout = next_tick.saturating_duration_since(Instant::now());
                let signal = match rx.recv_timeout(timeout) {
                    Ok(Message::Wake(signal)) => signal,
                    Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        next_tick = Instant::now() + interval;
                        WakeSignal::Periodic
                    }
                };

                info(format!("wake signal {signal:?}"));
                on_result(signal, updater.background_check());
            }
        })?;

        Ok(WakeSession { tx, worker: Some(worker) })
    }

    pub fn sender(&self) -> WakeSender {
        WakeSender { tx: self.tx.clone() }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(Message::Stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error("Wake worker panicked");
            }
        }
    }
}

impl Drop for WakeSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
