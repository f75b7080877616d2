// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::time::Duration;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Default time between two caret blink phases.
pub const DEFAULT_BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Supplies the caret blink interval.
pub trait CaretBlinkSettings {
    /// Time between two blink phases, or `None` for a caret that does not
    /// blink.
    fn blink_interval(&self) -> Option<Duration>;
}

/// Blinks every [`DEFAULT_BLINK_INTERVAL`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultBlinkSettings;

impl CaretBlinkSettings for DefaultBlinkSettings {
    fn blink_interval(&self) -> Option<Duration> {
        Some(DEFAULT_BLINK_INTERVAL)
    }
}

/// A caret that never blinks.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoBlink;

impl CaretBlinkSettings for NoBlink {
    fn blink_interval(&self) -> Option<Duration> {
        None
    }
}

/// Message from the timer thread: one blink phase elapsed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct BlinkTick;

#[derive(Debug)]
enum Control {
    Reset(Duration),
}

#[derive(Debug)]
struct Worker {
    control: Sender<Control>,
    handle: JoinHandle<()>,
}

/// Drives caret blinking from a background thread.
///
/// The thread owns nothing but the sending half of the tick channel. Ticks
/// queue up until the owner drains them with [`BlinkTimer::take_ticks`].
#[derive(Debug)]
pub(crate) struct BlinkTimer {
    ticks: Receiver<BlinkTick>,
    sender: Sender<BlinkTick>,
    worker: Option<Worker>,
}

impl BlinkTimer {
    pub(crate) fn new() -> Self {
        let (sender, ticks) = crossbeam_channel::unbounded();
        Self {
            ticks,
            sender,
            worker: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Starts the timer, or restarts the current phase if it is running.
    /// Ticks that were not taken yet are dropped.
    pub(crate) fn restart(&mut self, interval: Duration) {
        self.drain();
        if let Some(worker) = &self.worker {
            if worker.control.send(Control::Reset(interval)).is_ok() {
                return;
            }
            self.stop();
        }
        let (control, commands) = crossbeam_channel::bounded(4);
        let sender = self.sender.clone();
        let spawned = thread::Builder::new()
            .name("caret-blink".into())
            .spawn(move || run(interval, &commands, &sender));
        match spawned {
            Ok(handle) => self.worker = Some(Worker { control, handle }),
            Err(err) => log::warn!("caret blink timer could not start: {err}"),
        }
    }

    /// Stops the timer thread and drops pending ticks.
    pub(crate) fn stop(&mut self) {
        if let Some(Worker { control, handle }) = self.worker.take() {
            drop(control);
            if handle.join().is_err() {
                log::warn!("caret blink timer thread panicked");
            }
        }
        self.drain();
    }

    /// Number of ticks received since the last call.
    pub(crate) fn take_ticks(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.ticks.try_recv() {
                Ok(BlinkTick) => count += 1,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return count,
            }
        }
    }

    fn drain(&mut self) {
        let dropped = self.take_ticks();
        if dropped > 0 {
            log::trace!("dropped {dropped} stale blink ticks");
        }
    }
}

impl Drop for BlinkTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut interval: Duration, commands: &Receiver<Control>, ticks: &Sender<BlinkTick>) {
    loop {
        match commands.recv_timeout(interval) {
            Ok(Control::Reset(next)) => interval = next,
            Err(RecvTimeoutError::Timeout) => {
                if ticks.send(BlinkTick).is_err() {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
